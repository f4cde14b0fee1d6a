//! File signatures: the observed (mtime, size) identity of a watched file.

use std::fmt;
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Observed state of a watched file at one poll.
///
/// `Absent` is a regular value: spreadsheet editors save through a temp file
/// and a rename, so the source briefly disappearing is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Signature {
    Absent,
    Present { mtime: i64, size: u64 },
}

impl Signature {
    pub fn is_absent(&self) -> bool {
        matches!(self, Signature::Absent)
    }

    /// Signature from metadata. mtime is truncated to whole seconds so
    /// sub-second jitter never counts as a change.
    pub fn from_metadata(meta: &Metadata) -> io::Result<Self> {
        let modified = meta.modified()?;
        Ok(Signature::Present {
            mtime: unix_seconds(modified),
            size: meta.len(),
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Absent => write!(f, "absent"),
            Signature::Present { mtime, size } => write!(f, "({mtime}, {size})"),
        }
    }
}

/// Stat `path`. A missing file is `Absent`; any other failure is returned.
pub fn read(path: &Path) -> io::Result<Signature> {
    match std::fs::metadata(path) {
        Ok(meta) => Signature::from_metadata(&meta),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Signature::Absent),
        Err(err) => Err(err),
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}
