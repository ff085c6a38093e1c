//! JSON file backing store
//!
//! The data file holds a JSON array of records. Every read parses the whole
//! file; every save rewrites it through a temporary file and a rename.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use trackcache::{ChangeSet, KeyExtractor, Persist, ReadSource, SourceError};

use crate::record::Record;

pub struct JsonFileStore {
    path: PathBuf,
    keys: KeyExtractor<String, Record>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P, keys: KeyExtractor<String, Record>) -> Self {
        Self { path: path.as_ref().to_path_buf(), keys }
    }

    fn read(&self) -> Result<Vec<Record>, SourceError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            // A missing file is an empty store
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, records: &[Record]) -> Result<(), SourceError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ReadSource<String, Record> for JsonFileStore {
    fn fetch(&self, key: &String) -> Result<Option<Record>, SourceError> {
        Ok(self.read()?.into_iter().find(|r| self.keys.key_of(r) == *key))
    }

    fn fetch_all(&self) -> Result<Vec<Record>, SourceError> {
        self.read()
    }
}

impl Persist<Record> for JsonFileStore {
    fn save(&self, changes: &ChangeSet<Record>) -> Result<(), SourceError> {
        if changes.is_empty() {
            return Ok(());
        }

        let deleted: Vec<String> = changes.deleted.iter().map(|r| self.keys.key_of(r)).collect();
        let mut records = self.read()?;
        records.retain(|r| !deleted.contains(&self.keys.key_of(r)));

        // Added and modified rows both replace any row already under their key
        for row in changes.modified.iter().chain(&changes.added) {
            let key = self.keys.key_of(row);
            match records.iter_mut().find(|r| self.keys.key_of(r) == key) {
                Some(slot) => *slot = row.clone(),
                None => records.push(row.clone()),
            }
        }

        self.write(&records)?;
        debug!(path = %self.path.display(), rows = records.len(), "data file rewritten");
        Ok(())
    }
}
