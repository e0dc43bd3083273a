use super::Reporter;
use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt::{self, Display, Formatter};

/// A panic caught at the boundary of the reporter's background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicReport {
    /// Panic message, if the payload was a string.
    pub message: Option<String>,

    /// Stack trace captured where the panic was caught.
    pub backtrace: String,
}

impl PanicReport {
    pub(super) fn new(payload: &(dyn Any + Send)) -> Self {
        #[allow(clippy::manual_map)]
        let message = if let Some(v) = payload.downcast_ref::<String>() {
            Some(v.clone())
        } else if let Some(v) = payload.downcast_ref::<&str>() {
            Some(v.to_string())
        } else {
            None
        };

        Self {
            message,
            backtrace: Backtrace::force_capture().to_string(),
        }
    }
}

impl Display for PanicReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            writeln!(f, "panic message: {message}")?;
        } else {
            writeln!(f, "panic message (none)")?;
        }
        writeln!(f, "stack trace:\n{}", self.backtrace)
    }
}

impl Reporter {
    /// Log the panic, then hand it to every registered panic handler.
    pub(super) fn handle_panic(&self, payload: Box<dyn Any + Send>) {
        let report = PanicReport::new(payload.as_ref());
        tracing::error!("metflux reporter stopped after recovering from a panic\n{report}");

        for handler in &self.0.panic_handlers {
            handler(self, &report);
        }
    }
}
