//! Background refresh: a named thread that polls the store's
//! last-updated marker and restores the handler's database when another
//! member has written to it.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use sigil_common::CustomProceduresConfig;

use crate::handler::CustomProcedureHandler;

struct Shared {
    stop: Mutex<bool>,
    signal: Condvar,
}

/// Polling scheduler for one database. Runs an initial restore
/// synchronously, then polls on its own thread until cancelled or
/// dropped.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start polling at the configured refresh interval.
    pub fn from_config(
        handler: Arc<CustomProcedureHandler>,
        config: &CustomProceduresConfig,
    ) -> Self {
        Self::start(handler, config.poll_interval())
    }

    pub fn start(handler: Arc<CustomProcedureHandler>, interval: Duration) -> Self {
        // Bring the registry up to date before the first poll interval
        // elapses, so freshly started members serve existing
        // definitions immediately.
        if let Err(e) = handler.restore() {
            log::warn!(
                "initial restore of custom definitions for {} failed: {e}",
                handler.database()
            );
        }

        let shared = Arc::new(Shared {
            stop: Mutex::new(false),
            signal: Condvar::new(),
        });
        let thread_shared = shared.clone();
        let handle = std::thread::Builder::new()
            .name(format!("custom-refresh-{}", handler.database()))
            .spawn(move || poll_loop(handler, thread_shared, interval))
            .expect("failed to spawn refresh thread");

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Stop polling and wait for the thread to exit. A refresh pass in
    /// flight finishes first.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let mut stop = self.shared.stop.lock().unwrap();
            *stop = true;
        }
        self.shared.signal.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_loop(handler: Arc<CustomProcedureHandler>, shared: Arc<Shared>, interval: Duration) {
    let mut stop = shared.stop.lock().unwrap();
    loop {
        let (guard, _timeout) = shared.signal.wait_timeout(stop, interval).unwrap();
        stop = guard;
        if *stop {
            return;
        }
        drop(stop);

        match handler.needs_refresh() {
            Ok(true) => {
                if let Err(e) = handler.restore() {
                    log::warn!(
                        "refresh of custom definitions for {} failed: {e}",
                        handler.database()
                    );
                }
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!(
                    "cannot read last-updated marker for {}: {e}",
                    handler.database()
                );
            }
        }

        stop = shared.stop.lock().unwrap();
    }
}
