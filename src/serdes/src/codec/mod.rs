pub mod numeric;

pub use numeric::{NumericLongArrayDecoder, WindowDecoder};
