use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// A writer that replicates every write to each of its sinks, in order.
///
/// A write stops at the first sink that fails and returns that sink's error.
/// Sinks before the failing one have already received the buffer, so an error
/// means partial delivery, not "delivered nowhere".
///
/// The sink list sits behind one mutex, so concurrent writers never interleave
/// within a single record. `&FanOut` implements [`Write`], which makes
/// `Arc<FanOut>` usable as a `tracing_subscriber` `MakeWriter`.
pub struct FanOut {
    sinks: Mutex<Vec<Box<dyn Write + Send>>>,
}

impl FanOut {
    /// Create a fan-out writer over `sinks`.
    ///
    /// With no sinks every write succeeds and the data is discarded.
    pub fn new(sinks: Vec<Box<dyn Write + Send>>) -> Self {
        Self {
            sinks: Mutex::new(sinks),
        }
    }

    /// Number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut").field("sinks", &self.len()).finish()
    }
}

impl Write for &FanOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter_mut() {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl Write for FanOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}
