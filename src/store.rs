//! Saved invoices.
//!
//! [`InvoiceStore`] is the history collaborator: every call is scoped to the
//! owning user and listings come back newest first. [`JsonFileStore`] keeps
//! all records in one `invoices.json` file inside the config directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{InvoiceError, Result};
use crate::model::{InvoiceData, InvoiceRecord, InvoiceStatus};

pub const STORE_FILE: &str = "invoices.json";

pub trait InvoiceStore {
    /// The user's records, most recently updated first.
    fn list(&self, user_id: &str) -> Result<Vec<InvoiceRecord>>;

    fn get(&self, user_id: &str, id: &str) -> Result<InvoiceRecord>;

    fn create(
        &mut self,
        user_id: &str,
        status: InvoiceStatus,
        data: InvoiceData,
    ) -> Result<InvoiceRecord>;

    /// Replaces status and data of an existing record and bumps `updated_at`.
    fn update(&mut self, user_id: &str, record: &InvoiceRecord) -> Result<InvoiceRecord>;

    fn delete(&mut self, user_id: &str, id: &str) -> Result<()>;
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct StoreFile {
    #[serde(default)]
    invoices: Vec<InvoiceRecord>,
}

pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<InvoiceRecord>,
}

impl JsonFileStore {
    /// Opens `invoices.json` in `dir`. A missing file is an empty store.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&content)
                .map_err(|e| InvoiceError::StoreParse {
                    path: path.clone(),
                    source: e,
                })?;
            file.invoices
        } else {
            Vec::new()
        };
        debug!("opened {} with {} record(s)", path.display(), records.len());
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let file = StoreFile {
            invoices: self.records.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn position(&self, user_id: &str, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| InvoiceError::InvoiceNotFound(id.to_string()))
    }
}

impl InvoiceStore for JsonFileStore {
    fn list(&self, user_id: &str) -> Result<Vec<InvoiceRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    fn get(&self, user_id: &str, id: &str) -> Result<InvoiceRecord> {
        let index = self.position(user_id, id)?;
        Ok(self.records[index].clone())
    }

    fn create(
        &mut self,
        user_id: &str,
        status: InvoiceStatus,
        data: InvoiceData,
    ) -> Result<InvoiceRecord> {
        let record = InvoiceRecord::new(user_id, status, data, Utc::now());
        self.records.push(record.clone());
        self.save()?;
        info!("saved {} ({})", record.data.invoice_number, record.id);
        Ok(record)
    }

    fn update(&mut self, user_id: &str, record: &InvoiceRecord) -> Result<InvoiceRecord> {
        let index = self.position(user_id, &record.id)?;
        let stored = &mut self.records[index];
        stored.status = record.status;
        stored.data = record.data.clone();
        stored.touch(Utc::now());
        let updated = stored.clone();
        self.save()?;
        info!("updated {} ({})", updated.data.invoice_number, updated.id);
        Ok(updated)
    }

    fn delete(&mut self, user_id: &str, id: &str) -> Result<()> {
        let index = self.position(user_id, id)?;
        let removed = self.records.remove(index);
        self.save()?;
        info!("deleted {} ({})", removed.data.invoice_number, removed.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn data() -> InvoiceData {
        InvoiceData::new_default(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    }

    #[test]
    fn records_are_scoped_to_their_owner() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let mine = store.create("alice", InvoiceStatus::Draft, data()).unwrap();
        store.create("bob", InvoiceStatus::Final, data()).unwrap();

        assert_eq!(store.list("alice").unwrap().len(), 1);
        assert!(matches!(
            store.get("bob", &mine.id),
            Err(InvoiceError::InvoiceNotFound(_))
        ));
        assert!(store.delete("bob", &mine.id).is_err());
    }

    #[test]
    fn reopening_reads_what_was_saved() {
        let dir = TempDir::new().unwrap();
        let created = {
            let mut store = JsonFileStore::open(dir.path()).unwrap();
            store.create("local", InvoiceStatus::Draft, data()).unwrap()
        };

        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.path(), dir.path().join(STORE_FILE));
        assert_eq!(store.get("local", &created.id).unwrap(), created);
    }

    #[test]
    fn update_moves_record_to_the_top() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();
        let first = store.create("local", InvoiceStatus::Draft, data()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.create("local", InvoiceStatus::Draft, data()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let mut changed = first.clone();
        changed.status = InvoiceStatus::Final;
        let updated = store.update("local", &changed).unwrap();
        assert!(updated.updated_at > first.updated_at);
        assert_eq!(updated.created_at, first.created_at);

        let listed = store.list("local").unwrap();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].status, InvoiceStatus::Final);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORE_FILE), "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(dir.path()),
            Err(InvoiceError::StoreParse { .. })
        ));
    }
}
