// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Append-only JSON-lines journal.
//!
//! Each committed [`CommitBatch`] is one line, written and `fsync`ed before
//! the commit returns:
//!
//! ```text
//! {"factors":[{"collection":"efficiency","kind":"dense","value":0.88,...}],"record":{"id":1,...}}
//! {"factors":[...],"record":{"id":2,...}}
//! ```
//!
//! Opening a journal replays it in order, so the last write of each key
//! wins. A trailing line without a newline is the remnant of an
//! interrupted commit: it is dropped with a warning and the file is
//! truncated back to the last complete line.

use super::{CalibrationStore, CommitBatch};
use crate::{CalibrationError, CalibrationSnapshot, ExecutionRecord};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
struct Inner {
    file: File,
    /// Length of the journal up to the last complete line.
    len: u64,
    snapshot: CalibrationSnapshot,
    records: Vec<ExecutionRecord>,
    next_id: u64,
}

/// A durable store backed by a single journal file.
#[derive(Debug)]
pub struct JournalStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl JournalStore {
    /// Opens (or creates) the journal at `path` and replays it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let mut snapshot = CalibrationSnapshot::new();
        let mut records = Vec::new();
        let mut next_id = 0;
        let mut offset = 0usize;

        for (index, line) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
            let line_no = index + 1;
            if line.last() != Some(&b'\n') {
                tracing::warn!(
                    "{}: dropping incomplete trailing line {line_no} ({} bytes)",
                    path.display(),
                    line.len()
                );
                break;
            }
            let body = &line[..line.len() - 1];
            offset += line.len();
            if body.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let batch: CommitBatch =
                serde_json::from_slice(body).map_err(|e| CalibrationError::Corrupt {
                    line: line_no,
                    detail: e.to_string(),
                })?;
            for entry in batch.factors {
                snapshot.set(entry.key, entry.factor);
            }
            next_id = next_id.max(batch.record.id);
            records.push(batch.record);
        }

        let len = offset as u64;
        if len < bytes.len() as u64 {
            file.set_len(len)?;
            file.sync_data()?;
        }

        tracing::debug!(
            "opened journal {} ({} records, {} factors)",
            path.display(),
            records.len(),
            snapshot.len()
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                len,
                snapshot,
                records,
                next_id,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JournalStore {
    fn name(&self) -> &str {
        "journal"
    }

    fn load(&self) -> Result<CalibrationSnapshot, CalibrationError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.snapshot.clone())
    }

    fn commit(&self, batch: &CommitBatch) -> Result<u64, CalibrationError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id + 1;
        let mut batch = batch.clone();
        batch.record.id = id;

        let mut line = serde_json::to_vec(&batch).map_err(std::io::Error::from)?;
        line.push(b'\n');

        let written = inner
            .file
            .write_all(&line)
            .and_then(|()| inner.file.sync_data());
        if let Err(e) = written {
            // Roll back a partial append so the next replay stays clean.
            let len = inner.len;
            if let Err(truncate) = inner.file.set_len(len) {
                tracing::warn!("{}: rollback after failed commit failed: {truncate}", self.path.display());
            }
            return Err(e.into());
        }

        inner.len += line.len() as u64;
        inner.next_id = id;
        for entry in batch.factors {
            inner.snapshot.set(entry.key, entry.factor);
        }
        inner.records.push(batch.record);
        Ok(id)
    }

    fn records(&self) -> Result<Vec<ExecutionRecord>, CalibrationError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.clone())
    }
}
