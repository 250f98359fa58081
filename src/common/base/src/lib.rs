#[macro_use]
extern crate anyhow;

pub mod id;
pub mod iterator;
pub mod memory;
pub mod partial;
pub mod series;
pub mod timestamp;
pub mod types;
