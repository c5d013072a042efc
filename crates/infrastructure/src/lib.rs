pub mod dns;
pub mod service_config;

pub use dns::HickoryDnsLookup;
pub use service_config::JsonServiceConfigParser;
