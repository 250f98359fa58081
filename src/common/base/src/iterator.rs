/// TryIterator is an iterator whose advance may fail, e.g. on a corrupt encoding.
pub trait TryIterator {
    type Item;
    fn try_next(&mut self) -> anyhow::Result<Option<Self::Item>>;

    /// try_collect drains the iterator, stopping at the first error.
    fn try_collect(&mut self) -> anyhow::Result<Vec<Self::Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.try_next()? {
            items.push(item);
        }
        Ok(items)
    }
}
