//! Logger injected into a [`crate::Device`].

/// Sink for the messages a device emits while talking to the SDK.
pub trait Logger {
    /// Something unusual that did not stop the operation.
    fn warn(&self, msg: &str);

    /// An SDK call failed.
    fn error(&self, msg: &str);
}

/// Forwards to the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn warn(&self, msg: &str) {
        log::warn!(target: "ueye_capture", "{msg}");
    }

    fn error(&self, msg: &str) {
        log::error!(target: "ueye_capture", "{msg}");
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn warn(&self, msg: &str) {
        (**self).warn(msg);
    }

    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}
