//! Append-only journal of written objects.

use crate::error::{Error, Result};
use crate::hash::Hash;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Placeholder recorded when an object had no virtual path.
pub const NO_PATH: &str = "-";

/// A journal entry recording one written object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Unix timestamp when the object was written.
    pub timestamp: i64,
    /// Operation type (e.g., "hash-object").
    pub operation: String,
    /// Id of the object.
    pub hash: Hash,
    /// Virtual path the content was associated with, or `-`.
    pub path: String,
    /// Additional metadata (e.g., "type=blob,size=1024").
    pub metadata: String,
}

impl JournalEntry {
    /// Create a new journal entry.
    pub fn new(
        timestamp: i64,
        operation: String,
        hash: Hash,
        path: String,
        metadata: String,
    ) -> Self {
        Self {
            timestamp,
            operation,
            hash,
            path,
            metadata,
        }
    }

    /// Serialize the entry to a pipe-delimited line.
    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.timestamp, self.operation, self.hash, self.path, self.metadata
        )
    }

    /// Parse a journal entry from a pipe-delimited line.
    ///
    /// The path field may itself contain `|`, so the line is split from both
    /// ends around it.
    pub fn from_line(line: &str) -> Result<Self> {
        let invalid = || Error::malformed("journal entry", line.to_string());

        let mut head = line.splitn(4, '|');
        let timestamp = head.next().ok_or_else(invalid)?;
        let operation = head.next().ok_or_else(invalid)?;
        let hash = head.next().ok_or_else(invalid)?;
        let rest = head.next().ok_or_else(invalid)?;
        let (path, metadata) = rest.rsplit_once('|').ok_or_else(invalid)?;

        let timestamp = timestamp.parse::<i64>().map_err(|_| {
            Error::malformed("journal entry", format!("invalid timestamp {}", timestamp))
        })?;

        let hash = Hash::from_hex(hash)
            .map_err(|_| Error::malformed("journal entry", format!("invalid hash {}", hash)))?;

        Ok(Self {
            timestamp,
            operation: operation.to_string(),
            hash,
            path: path.to_string(),
            metadata: metadata.to_string(),
        })
    }
}

/// Journal for tracking written objects.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Open or create a journal at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            File::create(&path)?;
        }

        Ok(Self { path })
    }

    /// Append an entry to the journal.
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", entry.to_line())?;
        file.flush()?;
        Ok(())
    }

    /// Read the most recent N entries from the journal.
    ///
    /// Lines that fail to parse are skipped.
    pub fn read_recent(&self, count: usize) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            if let Ok(entry) = JournalEntry::from_line(line) {
                entries.push(entry);
            }
        }

        if count >= entries.len() {
            Ok(entries)
        } else {
            Ok(entries.split_off(entries.len() - count))
        }
    }
}
