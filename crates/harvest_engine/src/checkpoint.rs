use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info, engine_warn};
use harvest_core::{AppId, CheckpointEntry};

/// Rebuilds the completed-id set from the output store itself.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

/// Result of scanning the output store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointScan {
    pub completed: HashSet<AppId>,
    pub skipped_lines: usize,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids of every well-formed line. Missing or unreadable stores yield what
    /// could be read; corrupt lines are skipped.
    pub fn load(&self) -> HashSet<AppId> {
        self.scan().completed
    }

    pub fn scan(&self) -> CheckpointScan {
        let mut scan = CheckpointScan::default();
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                engine_info!("No output store at {:?}; starting fresh", self.path);
                return scan;
            }
            Err(err) => {
                engine_warn!("Failed to open output store {:?}: {}", self.path, err);
                return scan;
            }
        };

        // Split on raw bytes so a torn multi-byte sequence only costs its own line.
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    engine_warn!(
                        "Stopped reading output store {:?} at line {}: {}",
                        self.path,
                        index + 1,
                        err
                    );
                    break;
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<CheckpointEntry>(&line) {
                Ok(entry) => {
                    scan.completed.insert(entry.appid);
                }
                Err(err) => {
                    engine_debug!("Skipping corrupt output line {}: {}", index + 1, err);
                    scan.skipped_lines += 1;
                }
            }
        }

        if scan.skipped_lines > 0 {
            engine_warn!(
                "Skipped {} unreadable lines in {:?}",
                scan.skipped_lines,
                self.path
            );
        }
        engine_info!(
            "Loaded {} completed ids from {:?}",
            scan.completed.len(),
            self.path
        );
        scan
    }
}
