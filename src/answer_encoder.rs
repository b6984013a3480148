//! Encoders that write an [`AnswerResult`] to a byte stream.

use std::io::Write;

use crate::Result;
use crate::answer::{AnswerResult, AnswerStatus};
use crate::output_type::OutputType;

/// Writes answers to an output stream in one format.
///
/// Why this exists:
/// - The CLI stays format-agnostic: it picks an encoder once via [`encoder_for`] and writes.
/// - Encoders own their framing (line-delimited JSON, blank-line separated text).
///
/// Lifecycle:
/// - `write_answer` may be called any number of times.
/// - `close` flushes and is idempotent; writing after it is an error.
pub trait AnswerEncoder {
    fn write_answer(&mut self, answer: &AnswerResult) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Build the encoder for `output_type`.
pub fn encoder_for<'a, W: Write + 'a>(output_type: OutputType, w: W) -> Box<dyn AnswerEncoder + 'a> {
    match output_type {
        OutputType::Text => Box::new(TextEncoder::new(w)),
        OutputType::Json => Box::new(JsonEncoder::new(w)),
    }
}

/// Writes each answer as one JSON object per line.
pub struct JsonEncoder<W: Write> {
    w: W,
    closed: bool,
}

impl<W: Write> JsonEncoder<W> {
    pub fn new(w: W) -> Self {
        Self { w, closed: false }
    }
}

impl<W: Write> AnswerEncoder for JsonEncoder<W> {
    fn write_answer(&mut self, answer: &AnswerResult) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write answer: encoder is already closed",
            ));
        }

        serde_json::to_writer(&mut self.w, answer)?;
        self.w.write_all(b"\n")?;
        self.w.flush()?;
        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}

/// Writes the answer text for humans, with the status as a trailing line when evidence was
/// insufficient.
pub struct TextEncoder<W: Write> {
    w: W,
    written: usize,
    closed: bool,
}

impl<W: Write> TextEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            written: 0,
            closed: false,
        }
    }
}

impl<W: Write> AnswerEncoder for TextEncoder<W> {
    fn write_answer(&mut self, answer: &AnswerResult) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write answer: encoder is already closed",
            ));
        }

        // Blank line separates answers.
        if self.written > 0 {
            writeln!(&mut self.w)?;
        }

        writeln!(&mut self.w, "{}", answer.content.trim_end())?;
        if answer.status == AnswerStatus::InsufficientEvidence {
            writeln!(&mut self.w, "(insufficient evidence)")?;
        }

        self.written += 1;
        self.w.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}
