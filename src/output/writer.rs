//! Singer message writer

use crate::engine::Message;
use crate::error::{Error, Result};
use std::io::Write;

/// Destination of engine messages
pub trait MessageSink: Send {
    /// Accept one message
    fn emit(&mut self, message: Message) -> Result<()>;
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes messages as JSON lines
///
/// The writer is flushed after every STATE message so a consumer never sees
/// a checkpoint before the records it covers.
#[derive(Debug)]
pub struct SingerWriter<W: Write> {
    writer: W,
    records_written: u64,
    states_written: u64,
}

impl<W: Write> SingerWriter<W> {
    /// Create a writer over any byte sink
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0,
            states_written: 0,
        }
    }

    /// Write one message as a single line
    pub fn write(&mut self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        writeln!(self.writer, "{line}")?;

        match message {
            Message::Record { .. } => self.records_written += 1,
            Message::State { .. } => {
                self.states_written += 1;
                self.flush()?;
            }
            Message::Schema { .. } => {}
        }
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::Other(format!("Failed to flush output: {e}")))
    }

    /// Number of RECORD messages written
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Number of STATE messages written
    pub fn states_written(&self) -> u64 {
        self.states_written
    }

    /// Consume the writer, returning the inner sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for SingerWriter<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.write(&message)
    }
}
