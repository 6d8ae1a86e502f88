//! Per-invocation output capture.

/// Collects console output written by a module.
///
/// Each invocation gets its own sink, so output from one call can never
/// appear in another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSink {
    buf: String,
}

impl OutputSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line, terminated by `\n`.
    pub fn write_line(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    /// Append already-terminated text.
    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.buf
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the contents, leaving the sink empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }

    /// Consume the sink.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}
