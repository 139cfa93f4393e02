//! Serialized console sink shared by every worker thread.

use std::io::{self, Write};

use parking_lot::Mutex;

/// Line-oriented writer behind one lock.
///
/// Each call writes one complete block under a single lock acquisition,
/// so lines from concurrent tasks never interleave inside a block.
/// Write errors are logged and dropped: a closed stdout must not fail a build.
pub struct SharedConsole<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl SharedConsole<io::Stdout> {
    /// Console writing to the process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> SharedConsole<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write one line.
    pub fn line(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{text}") {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    /// Write several lines as one uninterrupted block.
    pub fn block<S: AsRef<str>>(&self, lines: &[S]) {
        let mut out = self.out.lock();
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line.as_ref()) {
                tracing::debug!(error = %e, "console write failed");
                return;
            }
        }
    }

    pub fn flush(&self) {
        let _ = self.out.lock().flush();
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl SharedConsole<Vec<u8>> {
    /// Console that buffers everything in memory.
    #[must_use]
    pub fn buffered() -> Self {
        Self::new(Vec::new())
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }
}
