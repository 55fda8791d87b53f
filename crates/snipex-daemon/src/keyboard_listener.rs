use parking_lot::Mutex;
use snipex_core::keyboard::{KeyInput, KeyTranslator};
use snipex_core::{Result, SnipexError};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Receives translated key-down events on the hook's delivery thread.
///
/// Called synchronously from the OS callback: it must return quickly.
pub type KeySink = Box<dyn Fn(KeyInput) + Send + Sync>;

/// A global keyboard observation hook
pub trait KeyboardHook: Send {
    /// Start delivering key-down events to `sink`
    fn install(&mut self, sink: KeySink) -> Result<()>;

    /// Stop delivering events. Once this returns, `sink` has been dropped
    /// and will not be called again.
    fn uninstall(&mut self);
}

type SinkSlot = Arc<Mutex<Option<KeySink>>>;

/// rdev-backed hook.
///
/// `rdev::listen` blocks its thread for the life of the process and offers no
/// way to remove the tap, so the listener thread is started once and events
/// are routed through a sink slot. Uninstalling empties the slot.
pub struct RdevHook {
    slot: SinkSlot,
    listener: Option<JoinHandle<()>>,
    startup_timeout: Duration,
}

impl RdevHook {
    pub fn new(startup_timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            listener: None,
            startup_timeout,
        }
    }

    fn listener_alive(&self) -> bool {
        self.listener
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawn the listener thread and wait briefly for an early refusal
    fn spawn_listener(&mut self) -> Result<()> {
        let slot = Arc::clone(&self.slot);
        let (failure_tx, failure_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("snipex-hook".to_string())
            .spawn(move || {
                let mut translator = KeyTranslator::new();
                let callback = move |event: rdev::Event| {
                    let Some(input) = translator.translate(&event) else {
                        return;
                    };
                    if let Some(sink) = slot.lock().as_ref() {
                        sink(input);
                    }
                };

                // listen() only returns if the platform refused the tap
                if let Err(e) = rdev::listen(callback) {
                    error!(error = ?e, "Keyboard listener stopped");
                    let _ = failure_tx.send(format!("{:?}", e));
                }
            })
            .map_err(|e| SnipexError::Hook(format!("Failed to spawn listener thread: {}", e)))?;

        match failure_rx.recv_timeout(self.startup_timeout) {
            Ok(reason) => {
                let _ = handle.join();
                Err(SnipexError::Hook(reason))
            }
            Err(_) => {
                self.listener = Some(handle);
                Ok(())
            }
        }
    }
}

impl KeyboardHook for RdevHook {
    fn install(&mut self, sink: KeySink) -> Result<()> {
        *self.slot.lock() = Some(sink);

        if self.listener_alive() {
            debug!("Reusing running keyboard listener");
            return Ok(());
        }

        if let Err(e) = self.spawn_listener() {
            self.slot.lock().take();
            self.listener = None;
            return Err(e);
        }

        info!("Keyboard listener started");
        Ok(())
    }

    fn uninstall(&mut self) {
        if self.slot.lock().take().is_some() {
            debug!("Keyboard sink removed");
        }
    }
}
