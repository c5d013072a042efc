use rpcdns_application::ports::ResultHandler;
use rpcdns_domain::{ResolverResult, Status};
use tracing::{info, warn};

/// Stands in for a channel: logs every result and hands failures back so
/// the driver backs off.
pub struct LogResultHandler;

pub fn log_result(result: &ResolverResult) {
    match &result.addresses {
        Some(Ok(addresses)) => {
            for address in addresses {
                info!(address = %address, "Backend address");
            }
        }
        Some(Err(status)) => warn!(error = %status, "No addresses"),
        None => {}
    }

    if let Some(balancers) = &result.balancer_addresses {
        for address in balancers.iter() {
            info!(address = %address, "Balancer address");
        }
    }

    match &result.service_config {
        Some(Ok(config)) => info!(service_config = %config.json(), "Service config"),
        Some(Err(status)) if result.is_success() => {
            warn!(error = %status, "Service config rejected")
        }
        _ => {}
    }

    if let Some(note) = &result.resolution_note {
        info!(note = %note, "Resolution note");
    }
}

impl ResultHandler for LogResultHandler {
    fn report_result(&self, result: ResolverResult) -> Result<(), Status> {
        log_result(&result);
        match result.addresses {
            Some(Err(status)) => Err(status),
            _ => Ok(()),
        }
    }
}
