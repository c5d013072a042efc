use super::lookup_errors::{balancer_field, LookupErrors, HOSTNAME_FIELD, SRV_FIELD, TXT_FIELD};
use super::result_builder::{build_result, CollectedLookups};
use super::txt_record::select_service_config_record;
use crate::ports::{DnsLookup, ServiceConfigParser};
use rpcdns_domain::{
    DomainError, EndpointAddress, ResolverConfig, ResolverResult, ResolverTarget, SrvRecord,
    Status,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

/// Collaborators and settings shared by every attempt of one driver.
#[derive(Clone)]
pub struct AttemptContext {
    pub target: Arc<ResolverTarget>,
    pub lookup: Arc<dyn DnsLookup>,
    pub service_config_parser: Arc<dyn ServiceConfigParser>,
    pub enable_srv_queries: bool,
    pub request_service_config: bool,
    pub query_timeout: Option<Duration>,
}

impl AttemptContext {
    pub fn new(
        target: Arc<ResolverTarget>,
        lookup: Arc<dyn DnsLookup>,
        service_config_parser: Arc<dyn ServiceConfigParser>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            target,
            lookup,
            service_config_parser,
            enable_srv_queries: config.enable_srv_queries,
            request_service_config: config.request_service_config,
            query_timeout: config.query_timeout(),
        }
    }
}

/// One resolution cycle: fans out the hostname, SRV and TXT lookups (plus a
/// hostname lookup per SRV record), joins them behind a single lock and
/// yields at most one [`ResolverResult`].
///
/// Dropping the attempt cancels it.
pub struct ResolutionAttempt {
    inner: Arc<AttemptInner>,
}

struct AttemptInner {
    id: u64,
    ctx: AttemptContext,
    cancelled: AtomicBool,
    state: Mutex<AttemptState>,
}

#[derive(Default)]
struct AttemptState {
    hostname_inflight: bool,
    srv_inflight: bool,
    txt_inflight: bool,
    balancer_hostnames_initiated: usize,
    balancer_hostnames_resolved: usize,
    /// Balancer lookups not yet settled, keyed by issue order.
    pending_balancers: BTreeMap<usize, Arc<str>>,
    addresses: Vec<EndpointAddress>,
    balancer_addresses: Vec<EndpointAddress>,
    errors: LookupErrors,
    service_config_text: Option<Result<String, Status>>,
    timeout: Option<AbortHandle>,
    timed_out: bool,
    queries: Vec<AbortHandle>,
    completion: Option<oneshot::Sender<ResolverResult>>,
    finished: bool,
}

type Completion = (oneshot::Sender<ResolverResult>, ResolverResult);

impl ResolutionAttempt {
    /// Issues the lookups and arms the attempt timeout. Must be called from
    /// within a tokio runtime.
    pub fn start(id: u64, ctx: AttemptContext) -> (Self, oneshot::Receiver<ResolverResult>) {
        let (tx, rx) = oneshot::channel();
        let inner = Arc::new(AttemptInner {
            id,
            ctx,
            cancelled: AtomicBool::new(false),
            state: Mutex::new(AttemptState {
                completion: Some(tx),
                ..Default::default()
            }),
        });

        {
            let mut state = inner.lock_state();
            inner.start_locked(&mut state);
        }

        (Self { inner }, rx)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// `(resolved, initiated)` counters of the SRV-triggered balancer lookups.
    pub fn balancer_progress(&self) -> (usize, usize) {
        let state = self.inner.lock_state();
        (
            state.balancer_hostnames_resolved,
            state.balancer_hostnames_initiated,
        )
    }

    /// Stops the attempt. Lookups still running are abandoned and their
    /// completions become no-ops; no result is produced afterwards.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut state = self.inner.lock_state();
        if let Some(timeout) = state.timeout.take() {
            timeout.abort();
        }
        for query in state.queries.drain(..) {
            query.abort();
        }
        state.pending_balancers.clear();
        let had_result = state.completion.take().is_none();

        debug!(
            attempt = self.inner.id,
            target_name = %self.inner.ctx.target,
            finished = had_result,
            "Resolution attempt cancelled"
        );
    }
}

impl Drop for ResolutionAttempt {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl AttemptInner {
    fn lock_state(&self) -> MutexGuard<'_, AttemptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Takes the lock unless the attempt is cancelled, checking both before
    /// and after acquiring it.
    fn lock_live(&self) -> Option<MutexGuard<'_, AttemptState>> {
        if self.is_cancelled() {
            return None;
        }
        let state = self.lock_state();
        if self.is_cancelled() {
            return None;
        }
        Some(state)
    }

    fn start_locked(self: &Arc<Self>, state: &mut AttemptState) {
        let target = Arc::clone(&self.ctx.target);

        debug!(
            attempt = self.id,
            target_name = %target,
            srv = self.ctx.enable_srv_queries,
            txt = self.ctx.request_service_config,
            timeout_ms = self.ctx.query_timeout.map(|t| t.as_millis() as u64),
            "Starting resolution attempt"
        );

        state.hostname_inflight = true;
        let lookup = Arc::clone(&self.ctx.lookup);
        let host = target.host().to_string();
        let port = target.port_or_default();
        self.spawn_query(
            state,
            async move { lookup.lookup_hostname(&host, port).await },
            |this, result| this.on_hostname_resolved(result),
        );

        let localhost = target.is_localhost();
        if localhost && (self.ctx.enable_srv_queries || self.ctx.request_service_config) {
            debug!(attempt = self.id, "Target is localhost, skipping SRV and TXT lookups");
        }

        if self.ctx.enable_srv_queries && !localhost {
            state.srv_inflight = true;
            let lookup = Arc::clone(&self.ctx.lookup);
            let name = target.srv_query_name();
            self.spawn_query(
                state,
                async move { lookup.lookup_srv(&name).await },
                |this, result| this.on_srv_resolved(result),
            );
        }

        if self.ctx.request_service_config && !localhost {
            state.txt_inflight = true;
            let lookup = Arc::clone(&self.ctx.lookup);
            let name = target.txt_query_name();
            self.spawn_query(
                state,
                async move { lookup.lookup_txt(&name).await },
                |this, result| this.on_txt_resolved(result),
            );
        }

        if let Some(timeout) = self.ctx.query_timeout {
            let weak = Arc::downgrade(self);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(this) = weak.upgrade() {
                    this.on_timeout();
                }
            });
            state.timeout = Some(handle.abort_handle());
        }
    }

    /// Runs `query` on its own task. The task only keeps a weak reference to
    /// the attempt, so completions after the owner dropped it go nowhere.
    fn spawn_query<T, Q, C>(self: &Arc<Self>, state: &mut AttemptState, query: Q, complete: C)
    where
        T: Send + 'static,
        Q: Future<Output = T> + Send + 'static,
        C: FnOnce(&Arc<AttemptInner>, T) + Send + 'static,
    {
        let weak: Weak<AttemptInner> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let output = query.await;
            if let Some(this) = weak.upgrade() {
                complete(&this, output);
            }
        });
        state.queries.push(handle.abort_handle());
    }

    fn on_hostname_resolved(&self, result: Result<Vec<SocketAddr>, DomainError>) {
        let completion = {
            let Some(mut state) = self.lock_live() else {
                return;
            };
            if !state.hostname_inflight {
                return;
            }
            self.complete_hostname(&mut state, result);
            self.check_join(&mut state)
        };
        self.dispatch(completion);
    }

    fn on_srv_resolved(self: &Arc<Self>, result: Result<Vec<SrvRecord>, DomainError>) {
        let completion = {
            let Some(mut state) = self.lock_live() else {
                return;
            };
            if !state.srv_inflight {
                return;
            }
            self.complete_srv(&mut state, result);
            self.check_join(&mut state)
        };
        self.dispatch(completion);
    }

    fn on_balancer_resolved(&self, index: usize, result: Result<Vec<SocketAddr>, DomainError>) {
        let completion = {
            let Some(mut state) = self.lock_live() else {
                return;
            };
            let Some(host) = state.pending_balancers.remove(&index) else {
                return;
            };
            self.complete_balancer(&mut state, &host, result);
            self.check_join(&mut state)
        };
        self.dispatch(completion);
    }

    fn on_txt_resolved(&self, result: Result<Vec<String>, DomainError>) {
        let completion = {
            let Some(mut state) = self.lock_live() else {
                return;
            };
            if !state.txt_inflight {
                return;
            }
            self.complete_txt(&mut state, result);
            self.check_join(&mut state)
        };
        self.dispatch(completion);
    }

    fn on_timeout(self: &Arc<Self>) {
        let completion = {
            let Some(mut state) = self.lock_live() else {
                return;
            };
            state.timeout = None;
            if state.finished {
                return;
            }

            state.timed_out = true;
            for query in state.queries.drain(..) {
                query.abort();
            }

            warn!(
                attempt = self.id,
                target_name = %self.ctx.target,
                hostname = state.hostname_inflight,
                srv = state.srv_inflight,
                txt = state.txt_inflight,
                balancers = state.pending_balancers.len(),
                "Resolution attempt timed out, abandoning pending lookups"
            );

            if state.hostname_inflight {
                self.complete_hostname(&mut state, Err(DomainError::QueryTimeout));
            }
            if state.srv_inflight {
                self.complete_srv(&mut state, Err(DomainError::QueryTimeout));
            }
            if state.txt_inflight {
                self.complete_txt(&mut state, Err(DomainError::QueryTimeout));
            }
            let pending = std::mem::take(&mut state.pending_balancers);
            for host in pending.into_values() {
                self.complete_balancer(&mut state, &host, Err(DomainError::QueryTimeout));
            }

            self.check_join(&mut state)
        };
        self.dispatch(completion);
    }

    fn complete_hostname(
        &self,
        state: &mut AttemptState,
        result: Result<Vec<SocketAddr>, DomainError>,
    ) {
        state.hostname_inflight = false;
        match result {
            Ok(addresses) => {
                debug!(attempt = self.id, count = addresses.len(), "Hostname lookup completed");
                state
                    .addresses
                    .extend(addresses.into_iter().map(EndpointAddress::new));
            }
            Err(e) => {
                debug!(attempt = self.id, error = %e, "Hostname lookup failed");
                state.errors.add(HOSTNAME_FIELD, &e);
            }
        }
    }

    fn complete_srv(
        self: &Arc<Self>,
        state: &mut AttemptState,
        result: Result<Vec<SrvRecord>, DomainError>,
    ) {
        state.srv_inflight = false;
        let records = match result {
            Ok(records) => records,
            Err(e) => {
                debug!(attempt = self.id, error = %e, "SRV lookup failed");
                state.errors.add(SRV_FIELD, &e);
                return;
            }
        };

        if records.is_empty() {
            debug!(attempt = self.id, "SRV lookup returned no records");
            return;
        }
        if state.timed_out {
            debug!(
                attempt = self.id,
                records = records.len(),
                "SRV records arrived after timeout, skipping balancer lookups"
            );
            return;
        }

        debug!(attempt = self.id, records = records.len(), "Resolving balancer hostnames");
        for record in records {
            let index = state.balancer_hostnames_initiated;
            state.balancer_hostnames_initiated += 1;
            let host: Arc<str> = Arc::from(record.host.as_str());
            state.pending_balancers.insert(index, Arc::clone(&host));

            let lookup = Arc::clone(&self.ctx.lookup);
            let port = record.port;
            self.spawn_query(
                state,
                async move { lookup.lookup_hostname(&host, port).await },
                move |this, result| this.on_balancer_resolved(index, result),
            );
        }
    }

    fn complete_balancer(
        &self,
        state: &mut AttemptState,
        host: &Arc<str>,
        result: Result<Vec<SocketAddr>, DomainError>,
    ) {
        state.balancer_hostnames_resolved += 1;
        debug_assert!(state.balancer_hostnames_resolved <= state.balancer_hostnames_initiated);

        match result {
            Ok(addresses) => {
                debug!(
                    attempt = self.id,
                    balancer = %host,
                    count = addresses.len(),
                    "Balancer lookup completed"
                );
                state.balancer_addresses.extend(
                    addresses
                        .into_iter()
                        .map(|addr| EndpointAddress::with_authority(addr, Arc::clone(host))),
                );
            }
            Err(e) => {
                debug!(attempt = self.id, balancer = %host, error = %e, "Balancer lookup failed");
                state.errors.add(balancer_field(host), &e);
            }
        }
    }

    fn complete_txt(&self, state: &mut AttemptState, result: Result<Vec<String>, DomainError>) {
        state.txt_inflight = false;
        match result {
            Ok(records) => {
                let selected = select_service_config_record(&records);
                debug!(
                    attempt = self.id,
                    records = records.len(),
                    found = selected.is_ok(),
                    "TXT lookup completed"
                );
                state.service_config_text = Some(selected);
            }
            Err(e) => {
                debug!(attempt = self.id, error = %e, "TXT lookup failed");
                state.service_config_text =
                    Some(Err(Status::unavailable(format!("txt lookup failed: {}", e))));
                state.errors.add(TXT_FIELD, &e);
            }
        }
    }

    /// Builds the result once every lookup has settled. The predicate goes
    /// from false to true at most once because each completion clears its
    /// own in-flight marker exactly once.
    fn check_join(&self, state: &mut AttemptState) -> Option<Completion> {
        if self.is_cancelled() || state.finished {
            return None;
        }
        if state.hostname_inflight
            || state.srv_inflight
            || state.txt_inflight
            || state.balancer_hostnames_resolved != state.balancer_hostnames_initiated
        {
            return None;
        }
        debug_assert!(state.pending_balancers.is_empty());

        state.finished = true;
        if let Some(timeout) = state.timeout.take() {
            timeout.abort();
        }
        state.queries.clear();

        let Some(sender) = state.completion.take() else {
            error!(attempt = self.id, "Resolution attempt joined twice");
            debug_assert!(false, "resolution attempt joined twice");
            return None;
        };

        let collected = CollectedLookups {
            addresses: std::mem::take(&mut state.addresses),
            balancer_addresses: std::mem::take(&mut state.balancer_addresses),
            errors: std::mem::take(&mut state.errors),
            service_config_text: state.service_config_text.take(),
        };
        let result = build_result(
            self.ctx.target.name(),
            collected,
            self.ctx.service_config_parser.as_ref(),
        );

        debug!(
            attempt = self.id,
            target_name = %self.ctx.target,
            success = result.is_success(),
            addresses = result.address_count(),
            "Resolution attempt joined"
        );

        Some((sender, result))
    }

    /// Runs outside the lock: the receiver may react by dropping the attempt.
    fn dispatch(&self, completion: Option<Completion>) {
        if let Some((sender, result)) = completion {
            if sender.send(result).is_err() {
                debug!(attempt = self.id, "Result receiver gone before delivery");
            }
        }
    }
}
