use rpcdns_domain::{ResolverResult, Status};

pub trait ResultHandler: Send + Sync {
    /// Returning `Err` tells the resolver the channel could not use the
    /// result; the next attempt is then scheduled with backoff.
    fn report_result(&self, result: ResolverResult) -> Result<(), Status>;
}
