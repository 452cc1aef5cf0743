//! JSON Lines files, one entity per line.
//!
//! These files are the source of truth across restarts.
//! [`super::LeagueStore`] loads them once and writes through on every change.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use super::StorageError;

/// Appends to, or atomically replaces, one JSONL file.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Add one entity at the end of the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write_lines(file, std::slice::from_ref(entity))?;

        debug!("Appended entity to {:?}", self.path);
        Ok(())
    }

    /// Replace the file contents via a sibling temp file renamed over the
    /// original.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let tmp = self.path.with_extension("jsonl.tmp");
        let count = write_lines(File::create(&tmp)?, entities)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Rewrote {:?} with {} entities", self.path, count);
        Ok(count)
    }
}

fn write_lines<T: Serialize>(file: File, entities: &[T]) -> Result<usize, StorageError> {
    let mut writer = BufWriter::new(file);
    for entity in entities {
        serde_json::to_writer(&mut writer, entity)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(entities.len())
}

/// Reads every entity of one JSONL file.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// A missing file reads as empty and blank lines are ignored. Any line
    /// that does not parse fails the whole read with its line number.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|source| {
                error!("Unparseable line {} in {:?}: {}", idx + 1, self.path, source);
                StorageError::Corrupt {
                    path: self.path.clone(),
                    line: idx + 1,
                    source,
                }
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}
