//! Output rendering for the chat shell.

use std::io::{self, Stdout, Write};

/// ANSI escape code for bold text (used for the reply label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for informational messages).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a complete reply from the backend.
    fn print_response(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the user abandons an in-flight request.
    fn print_interrupted(&mut self) {
        self.print_info("[interrupted]");
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&mut self, style: &str, text: &str) {
        let _ = if self.use_color {
            writeln!(self.out, "{style}{text}{ANSI_RESET}")
        } else {
            writeln!(self.out, "{text}")
        };
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_response(&mut self, text: &str) {
        let label = if self.use_color {
            format!("{ANSI_BOLD}Gemini:{ANSI_RESET}")
        } else {
            "Gemini:".to_string()
        };
        let _ = writeln!(self.out, "{label} {}", text.trim_end());
        let _ = self.out.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.styled(ANSI_RED, &format!("Error: {error}"));
    }

    fn print_info(&mut self, info: &str) {
        self.styled(ANSI_DIM, info);
    }
}
