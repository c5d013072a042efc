mod dns_lookup;
mod result_handler;
mod service_config_parser;

pub use dns_lookup::DnsLookup;
pub use result_handler::ResultHandler;
pub use service_config_parser::ServiceConfigParser;

// Re-export for convenience
pub use rpcdns_domain::{ResolverResult, SrvRecord};
