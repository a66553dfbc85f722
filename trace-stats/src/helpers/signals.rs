/// # Signals
///
/// Cancellation token for the main loop, flipped either by a termination
/// signal or manually.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::Result;
use log::info;
use signal_hook::iterator::Signals;

#[derive(Clone)]
pub(crate) struct Running {
    condition: Arc<AtomicBool>,
}

impl Running {
    // Create a new Running instance, which stops upon receiving one of the
    // termination signals (e.g. SIGTERM, SIGINT).
    pub(crate) fn new() -> Result<Running> {
        let mut sigs = Signals::new(signal_hook::consts::TERM_SIGNALS)?;

        let run = Self::ignore_signals();
        let condition = Arc::clone(&run.condition);

        thread::spawn(move || {
            if sigs.forever().next().is_some() {
                condition.store(true, Ordering::Relaxed);
                info!("Received signal, terminating...");
            }
        });

        Ok(run)
    }

    // Same as `new()` but without handling termination signals. Termination
    // *must* be manually handled here.
    pub(crate) fn ignore_signals() -> Running {
        Self {
            condition: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn running(&self) -> bool {
        !self.condition.load(Ordering::Relaxed)
    }

    pub(crate) fn terminate(&self) {
        self.condition.store(true, Ordering::Relaxed);
    }
}
