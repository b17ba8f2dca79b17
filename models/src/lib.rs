pub mod config;
pub mod endpoint;
pub mod error;

pub use config::{AppConfig, CaConfig};
pub use endpoint::ProxyEndpoint;
pub use error::PlatformError;
