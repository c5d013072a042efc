//! rpcdns Domain Layer
pub mod address;
pub mod config;
pub mod errors;
pub mod result;
pub mod service_config;
pub mod srv_record;
pub mod status;
pub mod target;

pub use address::{AddressAttributes, BalancerAddresses, EndpointAddress};
pub use config::{
    BackoffConfig, CliOverrides, Config, ConfigError, LogFormat, LoggingConfig, ResolverConfig,
};
pub use errors::DomainError;
pub use result::ResolverResult;
pub use service_config::ServiceConfig;
pub use srv_record::SrvRecord;
pub use status::{Status, StatusCode};
pub use target::{ResolverTarget, DEFAULT_PORT};
