//! Hook lifecycle: install, remove and reinstall the keyboard hook, follow
//! permission changes, and hand matched triggers to expansion workers.
//!
//! Event flow while enabled:
//!
//! ```text
//! hook thread ──try_send──> bounded queue ──> matcher thread ──spawn──> expansion worker
//! ```
//!
//! The hook callback only translates the event and enqueues it, so the OS
//! input path is never blocked by matching or by the delay-laden expansion.

use crate::keyboard_listener::{KeySink, KeyboardHook, RdevHook};
use crate::permissions::{PermissionProbe, SystemPermissions};
use parking_lot::Mutex;
use snipex_core::keyboard::KeyInput;
use snipex_core::{
    EngineState, ExpansionConfig, ExpansionRequest, Executor, Matcher, Snippet, SystemInjector,
    SystemVariables, TextInjector, VariableSource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TrySendError};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// Snapshot of the observable flags, published on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStatus {
    pub enabled: bool,
    pub has_permission: bool,
}

struct Lifecycle {
    hook: Box<dyn KeyboardHook>,
    matcher_thread: Option<JoinHandle<()>>,
}

struct MonitorInner {
    config: ExpansionConfig,
    state: Arc<EngineState>,
    executor: Arc<Executor>,
    permissions: Arc<dyn PermissionProbe>,
    /// Serializes start/stop; never held while an expansion runs
    lifecycle: Mutex<Lifecycle>,
    enabled: AtomicBool,
    has_permission: AtomicBool,
    observers: Mutex<Vec<Sender<MonitorStatus>>>,
    polling: AtomicBool,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        self.polling.store(false, Ordering::SeqCst);
        let lifecycle = self.lifecycle.get_mut();
        lifecycle.hook.uninstall();
        if let Some(handle) = lifecycle.matcher_thread.take() {
            let _ = handle.join();
        }
        debug!("Expansion monitor dropped");
    }
}

/// Handle to a text expansion engine.
///
/// Cloning is cheap and every clone drives the same engine. The hook is
/// removed when the last handle goes away.
#[derive(Clone)]
pub struct ExpansionMonitor {
    inner: Arc<MonitorInner>,
}

impl ExpansionMonitor {
    /// Engine wired to the system keyboard hook, permissions, injector and
    /// variable providers. Checks permission once (starting if granted) and
    /// begins polling for permission changes.
    pub fn new(config: ExpansionConfig) -> Self {
        Self::new_with_snippets(config, Vec::new())
    }

    /// Like [`ExpansionMonitor::new`], with triggers registered before the
    /// permission check so an immediate start is not inert.
    pub fn new_with_snippets(config: ExpansionConfig, snapshot: Vec<Snippet>) -> Self {
        let hook = Box::new(RdevHook::new(config.hook_startup_timeout()));
        let injector = Arc::new(SystemInjector::new(config.clone()));

        let monitor = Self::with_platform_and_snippets(
            config,
            hook,
            Arc::new(SystemPermissions),
            injector,
            Arc::new(SystemVariables),
            snapshot,
        );
        monitor.start_permission_polling();
        monitor
    }

    /// Engine over caller-supplied platform pieces. Permission is checked
    /// once; polling is left to the caller.
    pub fn with_platform(
        config: ExpansionConfig,
        hook: Box<dyn KeyboardHook>,
        permissions: Arc<dyn PermissionProbe>,
        injector: Arc<dyn TextInjector>,
        variables: Arc<dyn VariableSource>,
    ) -> Self {
        Self::with_platform_and_snippets(config, hook, permissions, injector, variables, Vec::new())
    }

    pub fn with_platform_and_snippets(
        config: ExpansionConfig,
        hook: Box<dyn KeyboardHook>,
        permissions: Arc<dyn PermissionProbe>,
        injector: Arc<dyn TextInjector>,
        variables: Arc<dyn VariableSource>,
        snapshot: Vec<Snippet>,
    ) -> Self {
        let state = Arc::new(EngineState::new(config.buffer_capacity));
        let count = state.replace_snippets(snapshot);
        debug!(triggers = count, "Initial snippets registered");
        let executor = Arc::new(Executor::new(
            config.clone(),
            Arc::clone(&state),
            injector,
            variables,
        ));

        let monitor = Self {
            inner: Arc::new(MonitorInner {
                config,
                state,
                executor,
                permissions,
                lifecycle: Mutex::new(Lifecycle {
                    hook,
                    matcher_thread: None,
                }),
                enabled: AtomicBool::new(false),
                has_permission: AtomicBool::new(false),
                observers: Mutex::new(Vec::new()),
                polling: AtomicBool::new(false),
            }),
        };

        monitor.check_permission();
        monitor
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Install the hook and begin expanding.
    ///
    /// No-op when already enabled. Without permission this opens the request
    /// flow and returns; polling starts the engine once the grant arrives.
    #[instrument(skip_all)]
    pub fn start(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();

        if self.is_enabled() {
            debug!("Monitor already enabled");
            return;
        }

        if !self.has_permission() {
            info!("Input-monitoring permission missing; requesting it");
            self.inner.permissions.request();
            return;
        }

        let trigger_count = self.trigger_count();
        if trigger_count == 0 {
            warn!("No triggers registered; hook will be installed but inert");
        }

        let (sender, receiver) = mpsc::sync_channel(self.inner.config.event_queue_capacity);
        let matcher_thread = match self.spawn_matcher(receiver) {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "Failed to spawn matcher thread");
                return;
            }
        };

        let sink_state = Arc::clone(&self.inner.state);
        let sink: KeySink = Box::new(move |input: KeyInput| {
            // Synthesized keystrokes from a running expansion stop here
            if sink_state.is_suppressed() {
                return;
            }
            if let Err(TrySendError::Full(_)) = sender.try_send(input) {
                warn!("Key event queue full; dropping event");
            }
        });

        if let Err(e) = lifecycle.hook.install(sink) {
            error!(error = %e, "Failed to install keyboard hook");
            let _ = matcher_thread.join();
            return;
        }

        lifecycle.matcher_thread = Some(matcher_thread);
        self.inner.enabled.store(true, Ordering::SeqCst);
        info!(triggers = trigger_count, "Text expansion enabled");
        drop(lifecycle);
        self.notify();
    }

    /// Remove the hook, forget typed text and end the monitoring session.
    ///
    /// Safe mid-expansion: a worker that finishes afterwards cannot touch
    /// the next session's suppression flag.
    #[instrument(skip_all)]
    pub fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();

        if !self.is_enabled() {
            debug!("Monitor already disabled");
            return;
        }

        // Events still queued belong to the old session and are discarded
        self.inner.state.reset_session();

        // Dropping the sink closes the queue and ends the matcher thread
        lifecycle.hook.uninstall();
        if let Some(handle) = lifecycle.matcher_thread.take() {
            if handle.join().is_err() {
                error!("Matcher thread panicked");
            }
        }

        self.inner.enabled.store(false, Ordering::SeqCst);
        self.inner.state.reset_session();
        info!("Text expansion disabled");
        drop(lifecycle);
        self.notify();
    }

    /// Stop, let the platform settle, then start again if still permitted
    pub fn restart(&self) {
        info!("Restarting expansion monitor");
        self.stop();
        thread::sleep(self.inner.config.restart_settle());

        if self.check_permission() && !self.is_enabled() {
            self.start();
        }
    }

    fn spawn_matcher(&self, receiver: Receiver<KeyInput>) -> std::io::Result<JoinHandle<()>> {
        let state = Arc::clone(&self.inner.state);
        let executor = Arc::clone(&self.inner.executor);

        thread::Builder::new()
            .name("snipex-matcher".to_string())
            .spawn(move || run_matcher(receiver, state, executor))
    }

    // ========================================================================
    // Permission
    // ========================================================================

    /// Re-check permission. On a change, start (newly granted) or stop
    /// (revoked) the engine. Returns the current grant.
    pub fn check_permission(&self) -> bool {
        let granted = self.inner.permissions.is_granted();
        let previous = self.inner.has_permission.swap(granted, Ordering::SeqCst);

        if granted != previous {
            info!(granted, "Input-monitoring permission changed");
            self.notify();

            if granted && !self.is_enabled() {
                self.start();
            } else if !granted && self.is_enabled() {
                self.stop();
            }
        }

        granted
    }

    pub fn request_permission(&self) {
        self.inner.permissions.request();
    }

    /// Poll permission every `permission_poll_interval`. The poll thread
    /// holds only a weak reference and exits once the monitor is gone.
    pub fn start_permission_polling(&self) {
        if self.inner.polling.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak: Weak<MonitorInner> = Arc::downgrade(&self.inner);
        let interval = self.inner.config.permission_poll_interval();

        let spawned = thread::Builder::new()
            .name("snipex-permissions".to_string())
            .spawn(move || loop {
                thread::sleep(interval);

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !inner.polling.load(Ordering::SeqCst) {
                    break;
                }
                ExpansionMonitor { inner }.check_permission();
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn permission polling thread");
            self.inner.polling.store(false, Ordering::SeqCst);
        }
    }

    pub fn stop_permission_polling(&self) {
        self.inner.polling.store(false, Ordering::SeqCst);
    }

    // ========================================================================
    // Snippets
    // ========================================================================

    /// Replace the whole trigger index. Snippets with empty triggers are
    /// skipped. Returns the number of registered triggers.
    pub fn update_snippets(&self, snapshot: Vec<Snippet>) -> usize {
        let count = self.inner.state.replace_snippets(snapshot);
        info!(triggers = count, "Snippets updated");
        count
    }

    pub fn trigger_count(&self) -> usize {
        self.inner.state.index().len()
    }

    pub fn triggers(&self) -> Vec<String> {
        self.inner
            .state
            .index()
            .triggers()
            .map(str::to_string)
            .collect()
    }

    // ========================================================================
    // Observables
    // ========================================================================

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn has_permission(&self) -> bool {
        self.inner.has_permission.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            enabled: self.is_enabled(),
            has_permission: self.has_permission(),
        }
    }

    /// Receive a `MonitorStatus` after every state transition
    pub fn subscribe(&self) -> Receiver<MonitorStatus> {
        let (tx, rx) = mpsc::channel();
        self.inner.observers.lock().push(tx);
        rx
    }

    /// Text currently held in the typed buffer
    pub fn typed(&self) -> String {
        self.inner.state.typed()
    }

    fn notify(&self) {
        let status = self.status();
        self.inner
            .observers
            .lock()
            .retain(|observer| observer.send(status).is_ok());
    }
}

/// Drain the event queue for the monitoring session that is current on entry.
///
/// Once the session ends, remaining events are dropped unmatched so nothing
/// typed before `stop` is injected afterwards.
fn run_matcher(receiver: Receiver<KeyInput>, state: Arc<EngineState>, executor: Arc<Executor>) {
    let session = state.current_session();
    let matcher = Matcher::new(Arc::clone(&state));
    let mut discarded = 0usize;

    for input in receiver {
        if state.current_session() != session {
            discarded += 1;
            continue;
        }
        let Some(request) = matcher.process(&input) else {
            continue;
        };
        if request.session != session {
            state.finish_expansion(request.session);
            continue;
        }
        dispatch_expansion(&executor, &state, request);
    }

    debug!(discarded, "Matcher thread exiting");
}

/// Run the expansion on its own worker thread
fn dispatch_expansion(executor: &Arc<Executor>, state: &EngineState, request: ExpansionRequest) {
    let session = request.session;
    let worker = Arc::clone(executor);

    let spawned = thread::Builder::new()
        .name("snipex-expansion".to_string())
        .spawn(move || {
            worker.execute(&request);
        });

    if let Err(e) = spawned {
        error!(error = %e, "Failed to spawn expansion worker; releasing suppression");
        state.finish_expansion(session);
    }
}
