pub mod config;
pub mod error;

pub use config::FolioConfig;
pub use error::{FolioError, Result};
