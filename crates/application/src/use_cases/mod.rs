pub mod resolution;

pub use resolution::{
    build_result, select_service_config_record, AttemptContext, CollectedLookups, LookupErrors,
    ResolutionAttempt,
};
