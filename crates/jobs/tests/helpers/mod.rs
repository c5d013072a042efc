#![allow(dead_code)]

use async_trait::async_trait;
use rpcdns_application::ports::{DnsLookup, ResultHandler, ServiceConfigParser};
use rpcdns_application::use_cases::AttemptContext;
use rpcdns_domain::{
    DomainError, ResolverConfig, ResolverResult, ResolverTarget, ServiceConfig, SrvRecord, Status,
};
use rpcdns_jobs::{DriverState, ReResolutionHandle};
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Hostname lookups that succeed or fail according to a script. Once the
/// script runs out the last outcome repeats.
pub struct ScriptedLookup {
    outcomes: Mutex<VecDeque<bool>>,
    last: AtomicBool,
    delay: Mutex<Duration>,
    call_count: AtomicU64,
}

impl ScriptedLookup {
    pub fn succeeding() -> Self {
        Self::with_outcomes(&[true])
    }

    pub fn failing() -> Self {
        Self::with_outcomes(&[false])
    }

    pub fn with_outcomes(outcomes: &[bool]) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.iter().copied().collect()),
            last: AtomicBool::new(outcomes.last().copied().unwrap_or(true)),
            delay: Mutex::new(Duration::ZERO),
            call_count: AtomicU64::new(0),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> bool {
        match self.outcomes.lock().unwrap().pop_front() {
            Some(outcome) => {
                self.last.store(outcome, Ordering::SeqCst);
                outcome
            }
            None => self.last.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl DnsLookup for ScriptedLookup {
    async fn lookup_hostname(
        &self,
        _name: &str,
        default_port: u16,
    ) -> Result<Vec<SocketAddr>, DomainError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let outcome = self.next_outcome();
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if outcome {
            Ok(vec![SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                default_port,
            )])
        } else {
            Err(DomainError::NxDomain)
        }
    }

    async fn lookup_srv(&self, _name: &str) -> Result<Vec<SrvRecord>, DomainError> {
        Err(DomainError::NxDomain)
    }

    async fn lookup_txt(&self, _name: &str) -> Result<Vec<String>, DomainError> {
        Err(DomainError::NxDomain)
    }
}

pub struct NoopParser;

impl ServiceConfigParser for NoopParser {
    fn parse(&self, _payload: &str) -> Result<Option<ServiceConfig>, DomainError> {
        Ok(None)
    }
}

/// Forwards every delivered result, stamped with the delivery time.
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<(Instant, ResolverResult)>,
    reject: AtomicBool,
}

impl ChannelHandler {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(Instant, ResolverResult)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = Arc::new(Self {
            tx,
            reject: AtomicBool::new(false),
        });
        (handler, rx)
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl ResultHandler for ChannelHandler {
    fn report_result(&self, result: ResolverResult) -> Result<(), Status> {
        let _ = self.tx.send((Instant::now(), result));
        if self.reject.load(Ordering::SeqCst) {
            Err(Status::unavailable("no usable addresses"))
        } else {
            Ok(())
        }
    }
}

/// Calls back into its own driver from `report_result`: reads the state,
/// then orphans the driver when `orphan_on_report` is set.
pub struct ReentrantHandler {
    pub handle: OnceLock<ReResolutionHandle>,
    orphan_on_report: bool,
    tx: mpsc::UnboundedSender<DriverState>,
}

impl ReentrantHandler {
    pub fn new(orphan_on_report: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<DriverState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = Arc::new(Self {
            handle: OnceLock::new(),
            orphan_on_report,
            tx,
        });
        (handler, rx)
    }
}

impl ResultHandler for ReentrantHandler {
    fn report_result(&self, _result: ResolverResult) -> Result<(), Status> {
        let Some(handle) = self.handle.get() else {
            return Ok(());
        };
        let _ = self.tx.send(handle.state());
        if self.orphan_on_report {
            handle.orphan();
            let _ = self.tx.send(handle.state());
        }
        Ok(())
    }
}

/// Resolver settings with deterministic backoff.
pub fn driver_config(min_interval_ms: u64, initial_ms: u64, multiplier: f64) -> ResolverConfig {
    let mut config = ResolverConfig::default()
        .with_query_timeout_ms(0)
        .with_min_time_between_resolutions_ms(min_interval_ms);
    config.backoff.initial_ms = initial_ms;
    config.backoff.multiplier = multiplier;
    config.backoff.jitter = 0.0;
    config.backoff.max_ms = 60_000;
    config
}

pub fn make_context(lookup: Arc<ScriptedLookup>, config: &ResolverConfig) -> AttemptContext {
    AttemptContext::new(
        Arc::new(ResolverTarget::parse("svc.example.com").unwrap()),
        lookup,
        Arc::new(NoopParser),
        config,
    )
}

pub fn assert_near(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
