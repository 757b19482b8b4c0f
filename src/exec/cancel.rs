use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Something that can be asked to stop, typically a running child process.
pub trait Terminate: Send + Sync {
    fn terminate(&self) -> io::Result<()>;
}

#[derive(Default)]
struct State {
    requested: AtomicBool,
    target: Mutex<Option<Arc<dyn Terminate>>>,
}

/// Cloneable handle used to cancel a task attempt, possibly from another thread.
///
/// Cancelling only records the request and forwards it to whatever is attached;
/// it never waits for the process to actually exit.
#[derive(Clone, Default)]
pub struct CancelHandle {
    state: Arc<State>,
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("requested", &self.is_requested())
            .finish()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns true the first time it's called.
    pub fn cancel(&self) -> bool {
        let first = !self.state.requested.swap(true, Ordering::SeqCst);
        if first {
            if let Some(target) = self.target() {
                if let Err(e) = target.terminate() {
                    tracing::warn!(error = %e, "failed to terminate process");
                }
            }
        }
        first
    }

    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }

    /// Attach the thing to terminate on cancel. If cancellation was already
    /// requested, it is terminated right away.
    pub fn attach(&self, target: Arc<dyn Terminate>) {
        *self.lock() = Some(target.clone());
        if self.is_requested() {
            if let Err(e) = target.terminate() {
                tracing::warn!(error = %e, "failed to terminate process");
            }
        }
    }

    pub fn detach(&self) {
        self.lock().take();
    }

    fn target(&self) -> Option<Arc<dyn Terminate>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<dyn Terminate>>> {
        self.state
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
