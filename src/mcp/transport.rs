//! Line-delimited stdio transport
//!
//! One JSON-RPC message per line in each direction. Blank lines are skipped.

use std::io::{BufRead, Stdin, StdinLock, Stdout, Write};

use miette::Diagnostic;
use thiserror::Error;

use super::protocol::JsonRpcResponse;

#[derive(Debug, Error, Diagnostic)]
pub enum McpError {
    #[error("stdio transport failed: {0}")]
    #[diagnostic(code(semiproc::mcp::io))]
    Io(#[from] std::io::Error),

    #[error("could not encode response: {0}")]
    #[diagnostic(code(semiproc::mcp::json))]
    Json(#[from] serde_json::Error),

    /// The offending line has been consumed; reading can continue
    #[error("message is not valid UTF-8: {0}")]
    #[diagnostic(code(semiproc::mcp::utf8))]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
}

impl StdioTransport<StdinLock<'static>, Stdout> {
    /// Transport over the process's stdin and stdout
    pub fn stdio() -> Self {
        let stdin: Stdin = std::io::stdin();
        Self::new(stdin.lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next non-blank line, or `None` at end of input
    pub fn read_message(&mut self) -> Result<Option<String>, McpError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            let line = String::from_utf8(std::mem::take(&mut buf))?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    pub fn write_message(&mut self, response: &JsonRpcResponse) -> Result<(), McpError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
