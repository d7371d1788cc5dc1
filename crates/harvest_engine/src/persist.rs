use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_warn;
use harvest_core::AcceptedRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("output writer has shut down")]
    WriterClosed,
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Append-only newline-delimited JSON store of accepted records.
///
/// Every `append` is flushed and synced before it returns, so a crash can
/// lose at most the line being written. The file doubles as the checkpoint
/// ledger read back by [`crate::CheckpointStore`].
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: File,
    /// Set when a failed append could not be rolled back.
    torn: bool,
}

impl JsonlSink {
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_output_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        repair_torn_tail(&mut file, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            torn: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. On error the file is truncated back to its length
    /// before the call; if that fails too, the next append terminates the
    /// partial line first.
    pub fn append(&mut self, record: &AcceptedRecord) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if self.torn {
            repair_torn_tail(&mut self.file, &self.path)?;
            self.torn = false;
        }
        append_line(&mut self.file, &line).map_err(|failure| {
            if failure.torn {
                engine_warn!("Could not roll back partial append to {:?}", self.path);
                self.torn = true;
            }
            PersistError::Io(failure.error)
        })
    }
}

/// Byte sink a [`JsonlSink`] appends to.
trait AppendTarget: Write {
    fn committed_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl AppendTarget for File {
    fn committed_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

#[derive(Debug)]
struct AppendFailure {
    error: io::Error,
    /// Partial bytes may still be present after the committed length.
    torn: bool,
}

fn append_line<T: AppendTarget>(target: &mut T, line: &[u8]) -> Result<(), AppendFailure> {
    let committed = target.committed_len().map_err(|error| AppendFailure {
        error,
        torn: false,
    })?;
    let written = target
        .write_all(line)
        .and_then(|()| target.flush())
        .and_then(|()| target.sync());
    let Err(error) = written else {
        return Ok(());
    };
    let torn = target
        .truncate_to(committed)
        .and_then(|()| target.sync())
        .is_err();
    Err(AppendFailure { error, torn })
}

/// A crash mid-append leaves a partial last line. Terminate it so the next
/// record starts on its own line; the fragment stays skippable garbage.
fn repair_torn_tail(file: &mut File, path: &Path) -> Result<(), PersistError> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        engine_warn!("Output {:?} ends with a partial line; terminating it", path);
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}
