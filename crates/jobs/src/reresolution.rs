use rpcdns_application::ports::ResultHandler;
use rpcdns_application::services::ExponentialBackoff;
use rpcdns_application::use_cases::{AttemptContext, ResolutionAttempt};
use rpcdns_domain::{ResolverConfig, ResolverResult, Status, StatusCode};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    AttemptInFlight,
    BackoffWaiting,
    Orphaned,
}

impl DriverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverState::Idle => "idle",
            DriverState::AttemptInFlight => "attempt_in_flight",
            DriverState::BackoffWaiting => "backoff_waiting",
            DriverState::Orphaned => "orphaned",
        }
    }
}

#[derive(Debug)]
enum Command {
    RequestReresolution,
    ResetBackoff,
}

#[derive(Debug)]
struct SharedInner {
    state: DriverState,
    /// Thread currently running `ResultHandler::report_result`, if any.
    delivering: Option<ThreadId>,
}

/// State shared by the handle and the loop. The handler is never called with
/// the lock held; `orphan()` waits on `delivered` instead.
#[derive(Debug)]
struct Shared {
    inner: Mutex<SharedInner>,
    delivered: Condvar,
}

type SharedState = Arc<Shared>;

impl Shared {
    fn new() -> Self {
        Self {
            inner: Mutex::new(SharedInner {
                state: DriverState::Idle,
                delivering: None,
            }),
            delivered: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the driver orphaned, then blocks until a delivery running on
    /// another thread has returned. A handler orphaning from inside its own
    /// delivery does not wait on itself. Returns `false` if already orphaned.
    fn orphan(&self) -> bool {
        let mut inner = self.lock();
        let newly_orphaned = inner.state != DriverState::Orphaned;
        inner.state = DriverState::Orphaned;

        let current = thread::current().id();
        while inner.delivering.is_some_and(|t| t != current) {
            inner = self
                .delivered
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        newly_orphaned
    }

    /// Claims the delivery slot unless orphaned.
    fn begin_delivery(&self) -> Option<DeliveryGuard<'_>> {
        let mut inner = self.lock();
        if inner.state == DriverState::Orphaned {
            return None;
        }
        inner.delivering = Some(thread::current().id());
        Some(DeliveryGuard { shared: self })
    }
}

/// Releases the delivery slot on drop, including when the handler panics.
struct DeliveryGuard<'a> {
    shared: &'a Shared,
}

impl DeliveryGuard<'_> {
    /// Ends the delivery and moves to `next`. `false` if the driver was
    /// orphaned while the handler ran.
    fn finish(self, next: DriverState) -> bool {
        let mut inner = self.shared.lock();
        inner.delivering = None;
        self.shared.delivered.notify_all();
        if inner.state == DriverState::Orphaned {
            return false;
        }
        inner.state = next;
        true
    }
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if inner.delivering.take().is_some() {
            self.shared.delivered.notify_all();
        }
    }
}

/// Periodically re-resolves one target: runs an attempt, reports its result,
/// then waits out the cooldown (and the backoff after failures) before the
/// next one. At most one attempt and one timer exist at any time.
pub struct ReResolutionDriver {
    ctx: AttemptContext,
    handler: Arc<dyn ResultHandler>,
    backoff: ExponentialBackoff,
    min_time_between_resolutions: Duration,
    shutdown: CancellationToken,
}

impl ReResolutionDriver {
    pub fn new(
        ctx: AttemptContext,
        handler: Arc<dyn ResultHandler>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            ctx,
            handler,
            backoff: ExponentialBackoff::new(config.backoff),
            min_time_between_resolutions: config.min_time_between_resolutions(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Ties the driver to a parent token. Orphaning the driver only cancels
    /// its own child token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token.child_token();
        self
    }

    /// Spawns the driver loop; the first attempt starts right away.
    pub fn start(self) -> ReResolutionHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let state: SharedState = Arc::new(Shared::new());
        let shutdown = self.shutdown.clone();

        info!(
            target_name = %self.ctx.target,
            srv = self.ctx.enable_srv_queries,
            txt = self.ctx.request_service_config,
            min_interval_ms = self.min_time_between_resolutions.as_millis() as u64,
            "Starting re-resolution driver"
        );

        let driver_loop = DriverLoop {
            ctx: self.ctx,
            handler: self.handler,
            backoff: self.backoff,
            min_time_between_resolutions: self.min_time_between_resolutions,
            shutdown: self.shutdown,
            state: Arc::clone(&state),
            commands: commands_rx,
            next_attempt_id: 0,
        };
        let task = tokio::spawn(driver_loop.run());

        ReResolutionHandle {
            commands: commands_tx,
            shutdown,
            state,
            task: Some(task),
        }
    }
}

/// Owner-side control of a running driver. Dropping the handle orphans it.
pub struct ReResolutionHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
    state: SharedState,
    task: Option<JoinHandle<()>>,
}

impl ReResolutionHandle {
    /// Asks for a fresh resolution. The loop always has either an attempt in
    /// flight or a timer armed for the earliest permitted start (the cooldown
    /// after a success, the backoff after a failure), so the request is
    /// folded into that and never starts an extra attempt.
    pub fn request_reresolution(&self) {
        self.send(Command::RequestReresolution);
    }

    /// Forgets accumulated backoff; an armed timer is pulled in to the
    /// cooldown deadline.
    pub fn reset_backoff(&self) {
        self.send(Command::ResetBackoff);
    }

    /// Stops the driver for good. Once this returns the handler is never
    /// invoked again. Safe to call repeatedly, and from inside the handler.
    pub fn orphan(&self) {
        if self.state.orphan() {
            self.shutdown.cancel();
            info!("Re-resolution driver orphaned");
        }
    }

    pub fn state(&self) -> DriverState {
        self.state.lock().state
    }

    pub fn is_orphaned(&self) -> bool {
        self.state() == DriverState::Orphaned
    }

    /// Orphans the driver and waits for its loop to exit.
    pub async fn shutdown(mut self) {
        self.orphan();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Re-resolution driver task failed");
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Re-resolution driver already stopped, command dropped");
        }
    }
}

impl Drop for ReResolutionHandle {
    fn drop(&mut self) {
        self.orphan();
    }
}

struct DriverLoop {
    ctx: AttemptContext,
    handler: Arc<dyn ResultHandler>,
    backoff: ExponentialBackoff,
    min_time_between_resolutions: Duration,
    shutdown: CancellationToken,
    state: SharedState,
    commands: mpsc::UnboundedReceiver<Command>,
    next_attempt_id: u64,
}

impl DriverLoop {
    async fn run(mut self) {
        loop {
            if !self.transition(DriverState::AttemptInFlight) {
                break;
            }

            let started_at = Instant::now();
            let Some(result) = self.run_attempt().await else {
                break;
            };
            let Some(healthy) = self.deliver(result) else {
                break;
            };

            let cooldown = self
                .min_time_between_resolutions
                .saturating_sub(started_at.elapsed());
            let delay = if healthy {
                self.backoff.reset();
                cooldown
            } else {
                cooldown.max(self.backoff.next_delay())
            };

            debug!(
                target_name = %self.ctx.target,
                healthy,
                delay_ms = delay.as_millis() as u64,
                failures = self.backoff.attempts(),
                "Next resolution scheduled"
            );

            let cooldown_deadline = started_at + self.min_time_between_resolutions;
            if !self.wait(Instant::now() + delay, cooldown_deadline).await {
                break;
            }
        }

        self.state.lock().state = DriverState::Orphaned;
        debug!(target_name = %self.ctx.target, "Re-resolution driver stopped");
    }

    /// `None` means the driver was orphaned while the attempt ran.
    async fn run_attempt(&mut self) -> Option<ResolverResult> {
        self.next_attempt_id += 1;
        let (attempt, mut rx) = ResolutionAttempt::start(self.next_attempt_id, self.ctx.clone());

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    attempt.cancel();
                    return None;
                }
                command = self.commands.recv() => match command {
                    Some(Command::RequestReresolution) => {
                        debug!(
                            attempt = attempt.id(),
                            "Re-resolution requested while attempt in flight, coalesced"
                        );
                    }
                    Some(Command::ResetBackoff) => self.backoff.reset(),
                    None => {
                        attempt.cancel();
                        return None;
                    }
                },
                result = &mut rx => {
                    return Some(result.unwrap_or_else(|_| {
                        error!(attempt = attempt.id(), "Resolution attempt ended without a result");
                        ResolverResult::failure(Status::new(
                            StatusCode::Unknown,
                            "resolution attempt ended without a result",
                        ))
                    }));
                }
            }
        }
    }

    /// Hands the result to the handler. An orphan racing with delivery
    /// either wins outright or waits for it to return. Returns whether the
    /// attempt counts as healthy, or `None` if orphaned.
    fn deliver(&self, result: ResolverResult) -> Option<bool> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        let delivery = self.state.begin_delivery()?;

        let success = result.is_success();
        if success {
            info!(
                target_name = %self.ctx.target,
                addresses = result.address_count(),
                balancers = result.balancer_addresses.as_ref().map_or(0, |b| b.len()),
                service_config = matches!(result.service_config, Some(Ok(_))),
                note = result.resolution_note.as_deref().unwrap_or(""),
                "Resolution succeeded"
            );
        } else if let Some(status) = result.address_error() {
            warn!(target_name = %self.ctx.target, error = %status, "Resolution failed");
        }

        let accepted = match self.handler.report_result(result) {
            Ok(()) => true,
            Err(status) => {
                warn!(target_name = %self.ctx.target, error = %status, "Result rejected by handler");
                false
            }
        };

        if !delivery.finish(DriverState::BackoffWaiting) {
            debug!(target_name = %self.ctx.target, "Driver orphaned by its handler");
            return None;
        }
        Some(success && accepted)
    }

    /// Sleeps until `deadline`. Returns `false` if orphaned first.
    async fn wait(&mut self, deadline: Instant, cooldown_deadline: Instant) -> bool {
        let timer = tokio::time::sleep_until(deadline);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return false,
                command = self.commands.recv() => match command {
                    Some(Command::RequestReresolution) => {
                        debug!("Re-resolution requested while timer armed, coalesced");
                    }
                    Some(Command::ResetBackoff) => {
                        self.backoff.reset();
                        if cooldown_deadline < timer.deadline() {
                            debug!("Backoff reset, timer pulled in to cooldown deadline");
                            timer.as_mut().reset(cooldown_deadline);
                        }
                    }
                    None => return false,
                },
                _ = &mut timer => return true,
            }
        }
    }

    fn transition(&self, next: DriverState) -> bool {
        let mut inner = self.state.lock();
        if inner.state == DriverState::Orphaned {
            return false;
        }
        inner.state = next;
        true
    }
}

