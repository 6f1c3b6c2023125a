//! Durable Snapshots
//!
//! Persists the ledger as two files next to each other:
//! - `<path>`: the live state as one JSON document, replaced atomically
//!   (temp file in the same directory, then rename)
//! - `<path>.events.jsonl`: an append-only journal with one line per
//!   committed transaction
//!
//! A commit appends its journal line first and then replaces the state file,
//! so the state file is the commit point. On load, journal entries past the
//! state's sequence are discarded and a later entry for a sequence already
//! seen supersedes the earlier one (a rolled-back write followed by a retry).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ledger::{EventLog, EventRecord, Ledger, LedgerEvent, LedgerState};

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Suffix appended to the snapshot path for the event journal.
pub const JOURNAL_SUFFIX: &str = "events.jsonl";

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failure.
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Written by an incompatible version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// Digest or sequence does not match the contents.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

/// On-disk state document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Sequence of the last committed transaction.
    pub sequence: u64,
    /// Live state.
    pub state: LedgerState,
    /// Hex digest of `state`.
    pub state_hash: String,
}

impl Snapshot {
    /// Capture a ledger's state.
    pub fn capture(ledger: &Ledger) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            sequence: ledger.sequence(),
            state: ledger.state().clone(),
            state_hash: hex::encode(ledger.state_hash()),
        }
    }

    /// Check version and digests, then rebuild the ledger around `log`.
    pub fn restore(self, log: EventLog) -> Result<Ledger, StoreError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if log.sequence() != self.sequence {
            return Err(StoreError::Corrupt(format!(
                "sequence {} does not match event log sequence {}",
                self.sequence,
                log.sequence()
            )));
        }
        let actual = hex::encode(self.state.compute_hash());
        if actual != self.state_hash {
            return Err(StoreError::Corrupt(format!(
                "state hash {} does not match recorded {}",
                actual, self.state_hash
            )));
        }
        Ok(Ledger::from_parts(self.state, log))
    }
}

/// One journal line: the events of one committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Transaction sequence.
    pub sequence: u64,
    /// Events in emission order (possibly none).
    pub events: Vec<LedgerEvent>,
}

impl JournalEntry {
    /// Entry for the transaction committed at `sequence`.
    pub fn from_records(sequence: u64, records: &[EventRecord]) -> Self {
        Self {
            sequence,
            events: records.iter().map(|record| record.event.clone()).collect(),
        }
    }
}

/// Everything one commit writes: the journal line and the new state.
#[derive(Debug)]
pub struct Commit {
    /// Journal line for the transaction.
    pub entry: JournalEntry,
    /// State after the transaction.
    pub snapshot: Snapshot,
}

impl Commit {
    /// Capture the latest transaction of `ledger`.
    pub fn capture(ledger: &Ledger) -> Self {
        let sequence = ledger.sequence();
        let records = ledger.events_since(sequence.saturating_sub(1));
        Self {
            entry: JournalEntry::from_records(sequence, records),
            snapshot: Snapshot::capture(ledger),
        }
    }
}

/// Snapshot file plus its event journal.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    state_path: PathBuf,
    journal_path: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `path`; the journal sits beside it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let state_path = path.into();
        let mut journal = state_path.clone().into_os_string();
        journal.push(".");
        journal.push(JOURNAL_SUFFIX);
        Self {
            state_path,
            journal_path: PathBuf::from(journal),
        }
    }

    /// State file path.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Journal file path.
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Persist one committed transaction: append its journal line, then
    /// replace the state file.
    pub fn commit(&self, commit: &Commit) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&commit.entry)?;
        line.push(b'\n');

        let mut journal = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)?;
        journal.write_all(&line)?;
        journal.sync_all()?;

        write_atomic(&self.state_path, &serde_json::to_vec(&commit.snapshot)?)?;
        debug!(
            path = %self.state_path.display(),
            sequence = commit.snapshot.sequence,
            "commit persisted"
        );
        Ok(())
    }

    /// Rewrite both files from `ledger`, dropping superseded journal lines.
    pub fn compact(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let mut journal = Vec::new();
        for entry in journal_entries(ledger.log()) {
            serde_json::to_writer(&mut journal, &entry)?;
            journal.push(b'\n');
        }
        write_atomic(&self.journal_path, &journal)?;
        write_atomic(&self.state_path, &serde_json::to_vec(&Snapshot::capture(ledger))?)?;
        debug!(path = %self.state_path.display(), sequence = ledger.sequence(), "snapshot compacted");
        Ok(())
    }

    /// Load the ledger.
    pub fn load(&self) -> Result<Ledger, StoreError> {
        let snapshot: Snapshot = serde_json::from_slice(&std::fs::read(&self.state_path)?)?;
        let sequence = snapshot.sequence;
        let log = self.replay_journal(sequence)?;
        let ledger = snapshot.restore(log)?;
        info!(path = %self.state_path.display(), sequence, "snapshot loaded");
        Ok(ledger)
    }

    /// Load if the state file exists.
    pub fn load_if_exists(&self) -> Result<Option<Ledger>, StoreError> {
        if self.state_path.exists() {
            self.load().map(Some)
        } else {
            Ok(None)
        }
    }

    fn replay_journal(&self, sequence: u64) -> Result<EventLog, StoreError> {
        let mut entries: Vec<JournalEntry> = Vec::new();
        if self.journal_path.exists() {
            let lines: Vec<String> = BufReader::new(File::open(&self.journal_path)?)
                .lines()
                .collect::<Result<_, _>>()?;
            let last = lines.len().saturating_sub(1);
            for (number, line) in lines.iter().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: JournalEntry = match serde_json::from_str(line) {
                    Ok(entry) => entry,
                    // Torn final write; its state file was never replaced
                    Err(err) if number == last => {
                        warn!(line = number + 1, error = %err, "ignoring torn journal line");
                        break;
                    }
                    Err(err) => return Err(err.into()),
                };
                let keep = entries.partition_point(|seen| seen.sequence < entry.sequence);
                entries.truncate(keep);
                entries.push(entry);
            }
        }
        entries.retain(|entry| entry.sequence <= sequence);

        let mut log = EventLog::new();
        for entry in &entries {
            let appended = log.append(&entry.events);
            if appended != entry.sequence {
                return Err(StoreError::Corrupt(format!(
                    "journal skips from sequence {} to {}",
                    appended - 1,
                    entry.sequence
                )));
            }
        }
        Ok(log)
    }
}

/// Split a log into one journal entry per sequence, including empty ones.
fn journal_entries(log: &EventLog) -> Vec<JournalEntry> {
    let records = log.records();
    let mut start = 0;
    (1..=log.sequence())
        .map(|sequence| {
            let end = start + records[start..].partition_point(|record| record.sequence <= sequence);
            let entry = JournalEntry::from_records(sequence, &records[start..end]);
            start = end;
            entry
        })
        .collect()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

/// Write a full snapshot of `ledger` to `path` and its journal.
pub fn save(path: &Path, ledger: &Ledger) -> Result<(), StoreError> {
    SnapshotStore::new(path).compact(ledger)
}

/// Load a ledger from `path` and its journal.
pub fn load(path: &Path) -> Result<Ledger, StoreError> {
    SnapshotStore::new(path).load()
}

/// Load from `path` if it exists.
pub fn load_if_exists(path: &Path) -> Result<Option<Ledger>, StoreError> {
    SnapshotStore::new(path).load_if_exists()
}
