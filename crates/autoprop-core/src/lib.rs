pub mod config;
pub mod error;
pub mod types;

pub use config::AutopropConfig;
pub use error::{AutopropError, Result};
pub use types::*;
