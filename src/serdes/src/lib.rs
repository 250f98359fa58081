#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate tracing;

pub mod bulk;
pub mod codec;
pub mod context;
pub mod document;
pub mod encoder;
pub mod error;
pub mod json;
pub mod options;
pub mod partial;
pub mod serdes;

pub use error::{Result, SerdesError};
pub use options::SerdesOptions;
pub use serdes::{QuerySerdes, SerdesStats};
