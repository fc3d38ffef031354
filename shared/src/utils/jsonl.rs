//! JSON Lines trace reader
//!
//! The decoder writes one [`TraceKernel`] object per line. Blank lines are
//! skipped; anything else that does not decode is reported with its line
//! number.

use std::io::BufRead;

use thiserror::Error;

use crate::types::trace::TraceKernel;

#[derive(Error, Debug)]
pub enum TraceReadError {
    #[error("failed to read trace input at line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid kernel record at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Iterator over the kernel records of a JSON Lines trace
pub struct TraceReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceKernel, TraceReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(source) => {
                    return Some(Err(TraceReadError::Io {
                        line: self.line + 1,
                        source,
                    }))
                }
            }

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(text).map_err(|source| TraceReadError::Decode {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}
