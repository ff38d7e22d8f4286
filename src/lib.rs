pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod stores;
pub mod utils;

pub use api::ApiService;
pub use config::ClientConfig;
pub use error::{Error, Result};
