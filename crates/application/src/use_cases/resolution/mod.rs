mod address_sorting;
mod attempt;
mod lookup_errors;
mod result_builder;
mod txt_record;

pub use address_sorting::{precedence, scope, sort_addresses};
pub use attempt::{AttemptContext, ResolutionAttempt};
pub use lookup_errors::{
    balancer_field, LookupErrors, HOSTNAME_FIELD, NO_RESULTS_MESSAGE, SRV_FIELD, TXT_FIELD,
};
pub use result_builder::{build_result, CollectedLookups};
pub use txt_record::{select_service_config_record, SERVICE_CONFIG_ATTRIBUTE_PREFIX};
