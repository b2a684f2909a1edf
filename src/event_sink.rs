//! Gesture event output: JSON-lines sinks and a bounded in-memory log.

use std::{
    collections::VecDeque,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use crate::{circular::CircularEvent, Result};

/// Destination for completed gesture events
pub trait EventSink {
    /// Emit one event
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails
    fn emit(&mut self, event: &CircularEvent) -> Result<()>;

    /// Flush and release the underlying resource
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails
    fn close(&mut self) -> Result<()>;
}

/// Writes events as compact JSON lines, to a file (append mode) or stdout
pub struct JsonSink {
    file: Option<File>,
}

impl JsonSink {
    /// Sink appending to the given file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for appending
    pub fn to_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Some(file) })
    }

    /// Sink writing to stdout
    #[must_use]
    pub const fn to_stdout() -> Self {
        Self { file: None }
    }
}

impl EventSink for JsonSink {
    fn emit(&mut self, event: &CircularEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        match &mut self.file {
            Some(file) => {
                file.write_all(line.as_bytes())?;
                file.flush()?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(line.as_bytes())?;
                lock.flush()?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Keeps the most recent events in memory for diagnostics
pub struct RingBufferLogger {
    capacity: usize,
    buf: VecDeque<CircularEvent>,
}

impl RingBufferLogger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            capacity,
            buf: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, event: CircularEvent) {
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(event);
    }

    /// Number of buffered events
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// All buffered events as newline-separated compact JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn dump_json(&self) -> Result<String> {
        let lines: Vec<String> = self
            .buf
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<_, _>>()?;
        Ok(lines.join("\n"))
    }
}

impl Default for RingBufferLogger {
    fn default() -> Self {
        Self::new(256)
    }
}
