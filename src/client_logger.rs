//! Logging trait for backend traffic.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every prompt the [`GeminiService`](crate::GeminiService) sends and every
//! reply or failure it gets back.

use crate::Error;

/// A trait for logging backend requests.
///
/// # Example
///
/// ```rust,ignore
/// use relaychat::{ClientLogger, Error};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_prompt(&self, model: &str, prompt: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "[{model}] >>> {prompt}").unwrap();
///     }
///
///     fn log_response(&self, model: &str, text: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "[{model}] <<< {text}").unwrap();
///     }
///
///     fn log_error(&self, model: &str, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "[{model}] !!! {error}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log the prompt about to be sent.  Called once per `generate` call,
    /// before any network I/O.
    fn log_prompt(&self, model: &str, prompt: &str);

    /// Log the text of a successful reply.
    fn log_response(&self, model: &str, text: &str);

    /// Log a failed request.  The same error is returned to the caller.
    fn log_error(&self, model: &str, error: &Error);
}
