//! User-facing error surface and the reporter that feeds it.

use std::fmt::Display;
use std::sync::{Mutex, PoisonError};

/// Destination for short, user-visible error messages (the host's error
/// display).
pub trait ErrorSink: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> ErrorSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Keeps every reported message, in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Sends each failure to the diagnostic log in full and, when a sink is
/// attached, to the sink as `"<context>: <status text>"`.
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    sink: Option<&'a dyn ErrorSink>,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: Option<&'a dyn ErrorSink>) -> Self {
        Reporter { sink }
    }

    pub fn silent() -> Self {
        Reporter { sink: None }
    }

    pub fn report(&self, context: &str, error: &fits_hdu::Error) {
        self.report_status(context, error, error.status_text());
    }

    pub fn report_status(&self, context: &str, detail: &dyn Display, status: &str) {
        log::error!("{context}: {detail}");
        if let Some(sink) = self.sink {
            sink.report(&format!("{context}: {status}"));
        }
    }
}
