//! Backend trait every input source implements

use crate::error::Result;
use crate::events::InputEvent;

/// One source of input events.
///
/// Implementations wrap whatever the source needs (a blocking stdin
/// thread, a network listener task, a wireless controller link) and expose
/// a uniform non-blocking poll. A backend owning a background worker must
/// make [`stop`] safe to call while the worker is mid-operation and return
/// within a bounded time.
///
/// [`stop`]: InputBackend::stop
pub trait InputBackend: Send {
    /// Short stable name, used as the event source tag and in logs.
    fn name(&self) -> &'static str;

    /// Initialize the source. Called once before the first poll.
    fn start(&mut self) -> Result<()>;

    /// Release resources and stop any background worker.
    fn stop(&mut self);

    /// Non-blocking check for the next queued event.
    fn poll(&mut self) -> Option<InputEvent>;

    /// Whether this backend is currently connected/usable.
    fn is_available(&self) -> bool {
        true
    }

    /// Switch the backend's numeric-entry mode, if it has one.
    ///
    /// During PIN entry the session narrows the event vocabulary; backends
    /// without a numeric mode ignore this.
    fn set_numeric_mode(&mut self, _enabled: bool) {}
}
