//! Build log sink shared by the controller, stages, and the process runner.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for the pipeline audit trail. Cloning shares the underlying
/// sink; the host build system hands one in, everything else writes to it.
#[derive(Clone)]
pub struct BuildLog {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl BuildLog {
    pub fn stderr() -> Self {
        Self::from_writer(Box::new(io::stderr()))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn line(&self, message: &str) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = writeln!(sink, "{}", message);
            let _ = sink.flush();
        }
    }

    /// Stage-prefixed line, `[maven] mvn command is empty, skip maven build`.
    pub fn stage(&self, stage: &str, message: &str) {
        self.line(&format!("[{}] {}", stage, message));
    }
}

/// In-memory sink for assertions on the audit trail.
#[derive(Clone, Default)]
pub struct MemoryLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> BuildLog {
        BuildLog::from_writer(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().expect("log buffer poisoned")).to_string()
    }
}

impl Write for MemoryLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
