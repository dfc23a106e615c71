pub mod bootstrap;
pub mod cache;
pub mod classpath;
pub mod config;
pub mod error;
pub mod index;
pub mod linemap;
pub mod logging;
pub mod lookup;

pub use error::{BytescopeError, Result};
