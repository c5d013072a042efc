use super::address_sorting::sort_addresses;
use super::lookup_errors::LookupErrors;
use crate::ports::ServiceConfigParser;
use rpcdns_domain::{EndpointAddress, ResolverResult, Status};

/// Everything an attempt gathered by the time all of its lookups settled.
#[derive(Debug, Default)]
pub struct CollectedLookups {
    pub addresses: Vec<EndpointAddress>,
    pub balancer_addresses: Vec<EndpointAddress>,
    pub errors: LookupErrors,
    /// `None` when no TXT lookup was issued.
    pub service_config_text: Option<Result<String, Status>>,
}

/// Applies the aggregation policy: no address from any source is a total
/// failure; otherwise the result succeeds, both address lists are sorted
/// into preferred order and lookup errors become a note.
/// Service config is best-effort and never fails the result.
pub fn build_result(
    name: &str,
    collected: CollectedLookups,
    parser: &dyn ServiceConfigParser,
) -> ResolverResult {
    let CollectedLookups {
        mut addresses,
        mut balancer_addresses,
        errors,
        service_config_text,
    } = collected;

    if addresses.is_empty() && balancer_addresses.is_empty() {
        return ResolverResult::failure(errors.to_status(name));
    }

    sort_addresses(&mut addresses);
    sort_addresses(&mut balancer_addresses);

    let mut result = ResolverResult {
        addresses: Some(Ok(addresses)),
        resolution_note: errors.summary(name),
        ..Default::default()
    };

    if let Some(Ok(payload)) = service_config_text {
        result.service_config = match parser.parse(&payload) {
            Ok(Some(config)) => Some(Ok(config)),
            Ok(None) => None,
            Err(e) => Some(Err(Status::unavailable(format!(
                "failed to parse service config: {}",
                e
            )))),
        };
    }

    result.set_balancer_addresses(balancer_addresses);
    result
}
