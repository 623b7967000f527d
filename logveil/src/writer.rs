//! Output sinks.
//!
//! Any `Write + Send` can receive entries. `Output` names the sinks that can be
//! described in configuration, and `MemoryWriter` is a cloneable in-memory sink
//! for capturing output.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub type BoxedWriter = Box<dyn Write + Send>;

/// A sink named in configuration: `stdout`, `stderr`, or a file path opened in
/// append mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Output {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl From<String> for Output {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stdout" | "-" => Output::Stdout,
            "stderr" => Output::Stderr,
            _ => Output::File(PathBuf::from(s)),
        }
    }
}

impl From<Output> for String {
    fn from(o: Output) -> Self {
        o.to_string()
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("stdout"),
            Output::Stderr => f.write_str("stderr"),
            Output::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Output {
    /// Opens the sink. Files and their parent directories are created as needed.
    pub fn open(&self) -> io::Result<BoxedWriter> {
        match self {
            Output::Stdout => Ok(Box::new(io::stdout())),
            Output::Stderr => Ok(Box::new(io::stderr())),
            Output::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Box::new(io::LineWriter::new(file)))
            }
        }
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
