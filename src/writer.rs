use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use filetime::FileTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing_subscriber::fmt::MakeWriter;

use crate::RotationPolicy;

const GZ_SUFFIX: &str = ".gz";

/// State of the current log file.
#[derive(Debug)]
struct FileState {
    file: File,
    /// Current size of the file in bytes.
    size: u64,
}

#[derive(Debug)]
enum State {
    /// Nothing written yet; the file is opened on first write.
    Idle,
    Open(FileState),
    /// Released by `close`; further writes are dropped.
    Closed,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<State>,
}

/// A rotated backup of the active file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Backup {
    index: usize,
    path: PathBuf,
    compressed: bool,
}

/// A writer that rotates its log file by size and prunes old backups.
///
/// Backups live next to the active file as `<file>.1`, `<file>.2`, ... with
/// `.1` the most recent, and carry a `.gz` suffix when compression is on.
///
/// Clones share the same file: write, rotation and close are serialized behind
/// one mutex, and closing any clone closes it for all. Writes after close are
/// accepted and discarded.
#[derive(Debug, Clone)]
pub struct RotatingFile {
    inner: Arc<Inner>,
}

impl RotatingFile {
    /// Create a rotating file. No I/O happens until the first write.
    pub fn new<P: Into<PathBuf>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                policy,
                state: Mutex::new(State::Idle),
            }),
        }
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.inner.policy
    }

    /// Whether `close` has been called on this file or any clone of it.
    pub fn is_closed(&self) -> bool {
        matches!(*self.lock(), State::Closed)
    }

    /// Flush and release the file handle.
    ///
    /// Calling this again, or on a file that was never written, succeeds.
    pub fn close(&self) -> io::Result<()> {
        let mut guard = self.lock();
        match std::mem::replace(&mut *guard, State::Closed) {
            State::Open(mut state) => {
                state.file.flush()?;
                state.file.sync_all()
            }
            State::Idle | State::Closed => Ok(()),
        }
    }

    /// Rotate immediately, regardless of the current size.
    ///
    /// The next write opens a fresh active file. A no-op once closed.
    pub fn rotate(&self) -> io::Result<()> {
        let mut guard = self.lock();
        if matches!(*guard, State::Closed) {
            return Ok(());
        }

        *guard = State::Idle;
        if self.inner.path.exists() {
            self.rotate_files()?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the active file, rotating first if the pending write would not fit.
    fn open(&self, buf_len: usize) -> io::Result<FileState> {
        let path = &self.inner.path;

        // Ensure parent directory exists (create if necessary).
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        if let Ok(metadata) = path.metadata()
            && metadata.len() > 0
            && metadata.len() + buf_len as u64 > self.inner.policy.max_bytes()
        {
            self.rotate_files()?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(FileState { file, size })
    }

    /// Shift backups up by one, retire the active file to `.1` and prune.
    ///
    /// The caller must have dropped the active file handle.
    fn rotate_files(&self) -> io::Result<()> {
        let path = &self.inner.path;

        for backup in self.backups()?.iter().rev() {
            let shifted = self.backup_path(backup.index + 1, backup.compressed);
            fs::rename(&backup.path, shifted)?;
        }

        let first = self.backup_path(1, false);
        fs::rename(path, &first)?;
        if self.inner.policy.compress {
            compress_file(&first, &self.backup_path(1, true))?;
        }

        self.prune()
    }

    /// Remove backups beyond the count limit or older than the age limit.
    fn prune(&self) -> io::Result<()> {
        let policy = &self.inner.policy;
        let cutoff = policy
            .age_limit()
            .and_then(|age| SystemTime::now().checked_sub(age));

        for backup in self.backups()? {
            let over_count = policy
                .backup_limit()
                .is_some_and(|limit| backup.index > limit);
            let too_old = match cutoff {
                Some(cutoff) => fs::metadata(&backup.path)
                    .and_then(|m| m.modified())
                    .is_ok_and(|modified| modified < cutoff),
                None => false,
            };
            if over_count || too_old {
                fs::remove_file(&backup.path)?;
            }
        }
        Ok(())
    }

    fn backup_path(&self, index: usize, compressed: bool) -> PathBuf {
        let mut name = self.inner.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        if compressed {
            name.push(GZ_SUFFIX);
        }
        PathBuf::from(name)
    }

    /// Existing backups, sorted by index.
    fn backups(&self) -> io::Result<Vec<Backup>> {
        let path = &self.inner.path;
        let Some(name) = path.file_name() else {
            return Ok(Vec::new());
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            return Ok(Vec::new());
        }

        // Compare raw bytes so names that are not valid UTF-8 still match.
        let mut prefix = name.as_encoded_bytes().to_vec();
        prefix.push(b'.');
        let mut backups = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(rest) = file_name
                .as_encoded_bytes()
                .strip_prefix(prefix.as_slice())
                .and_then(|rest| std::str::from_utf8(rest).ok())
            else {
                continue;
            };
            let (digits, compressed) = match rest.strip_suffix(GZ_SUFFIX) {
                Some(digits) => (digits, true),
                None => (rest, false),
            };
            if let Ok(index) = digits.parse::<usize>()
                && index > 0
            {
                backups.push(Backup {
                    index,
                    path: entry.path(),
                    compressed,
                });
            }
        }
        backups.sort_by_key(|b| b.index);
        Ok(backups)
    }
}

/// Gzip `src` into `dst`, keep the modification time and remove `src`.
fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mtime = FileTime::from_last_modification_time(&fs::metadata(src)?);

    let mut input = File::open(src)?;
    let mut encoder = GzEncoder::new(File::create(dst)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;

    filetime::set_file_mtime(dst, mtime)?;
    fs::remove_file(src)
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.lock();

        let needs_rotation = match &*guard {
            State::Closed => return Ok(buf.len()),
            State::Idle => false,
            State::Open(state) => {
                state.size > 0 && state.size + buf.len() as u64 > self.inner.policy.max_bytes()
            }
        };

        if needs_rotation {
            // Close current file (drop it)
            *guard = State::Idle;
            self.rotate_files()?;
        }

        if matches!(*guard, State::Idle) {
            *guard = State::Open(self.open(buf.len())?);
        }

        match &mut *guard {
            State::Open(state) => {
                let written = state.file.write(buf)?;
                state.size += written as u64;
                Ok(written)
            }
            _ => Err(io::Error::other("Failed to open log file")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.lock() {
            State::Open(state) => state.file.flush(),
            State::Idle | State::Closed => Ok(()),
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}
