use crate::core::codec::TableCodec;
use crate::core::store::{TextStore, VersionToken, WriteReceipt};
use crate::error::store::{Result, StoreError};
use crate::model::course::Course;
use log::{debug, info, warn};

/// The course table as read at one moment, plus the token needed to write it
/// back. `version` is `None` when the table file does not exist yet.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub records: Vec<Course>,
    pub version: Option<VersionToken>,
}

impl TableSnapshot {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Course> {
        self.records.iter().find(|c| c.name == name)
    }

    /// Fails when a record other than `previous_name` already uses `name`.
    pub fn check_name_free(&self, name: &str, previous_name: Option<&str>) -> Result<()> {
        let replaced = previous_name.and_then(|previous| self.position(previous));
        let taken = self
            .records
            .iter()
            .enumerate()
            .any(|(index, c)| c.name == name && Some(index) != replaced);
        if taken {
            return Err(StoreError::Validation(format!("a course named {} already exists", name)));
        }
        Ok(())
    }

    /// Replaces the record called `previous_name` in place, or appends.
    /// Returns whether an existing record was replaced.
    pub fn upsert(&mut self, record: Course, previous_name: Option<&str>) -> Result<bool> {
        self.check_name_free(&record.name, previous_name)?;
        match previous_name.and_then(|name| self.position(name)) {
            Some(index) => {
                self.records[index] = record;
                Ok(true)
            }
            None => {
                self.records.push(record);
                Ok(false)
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<Course> {
        let index = self
            .position(name)
            .ok_or_else(|| StoreError::NotFound(format!("course {}", name)))?;
        Ok(self.records.remove(index))
    }
}

/// What happened to a course's PDF after its record was deleted.
#[derive(Debug)]
pub enum BlobOutcome {
    Deleted { commit: String },
    /// Nothing at the path; the table and the files had already drifted.
    Missing,
    Failed(StoreError),
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub removed: Course,
    pub table: WriteReceipt,
    pub blob: BlobOutcome,
}

/// Courses stored as one table file plus one PDF per course.
///
/// Every mutation reads a fresh snapshot, changes it in memory and writes it
/// back with the snapshot's version token. Table and PDF writes are separate
/// commits.
pub struct CourseRepository<S: TextStore> {
    store: S,
    table_path: String,
    codec: TableCodec,
}

impl<S: TextStore> CourseRepository<S> {
    pub fn new(store: S, table_path: &str, codec: TableCodec) -> Self {
        CourseRepository {
            store,
            table_path: table_path.to_string(),
            codec,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn snapshot(&self) -> Result<TableSnapshot> {
        match self.store.read(&self.table_path).await {
            Ok(file) => {
                let text = String::from_utf8(file.content)
                    .map_err(|e| StoreError::Codec(format!("{} is not UTF-8: {}", self.table_path, e)))?;
                let records = self.codec.decode(&text)?;
                debug!("{} holds {} courses at {}", self.table_path, records.len(), file.version);
                Ok(TableSnapshot {
                    records,
                    version: Some(file.version),
                })
            }
            Err(StoreError::NotFound(_)) => {
                warn!("{} does not exist yet, starting from an empty course list", self.table_path);
                Ok(TableSnapshot {
                    records: Vec::new(),
                    version: None,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list(&self) -> Result<Vec<Course>> {
        Ok(self.snapshot().await?.records)
    }

    /// Writes `snapshot.records` over the version the snapshot was read at.
    /// Creates the table when the snapshot saw none.
    pub async fn persist(&self, snapshot: &TableSnapshot, message: &str) -> Result<WriteReceipt> {
        let text = self.codec.encode(&snapshot.records)?;
        self.store
            .write(&self.table_path, text.as_bytes(), message, snapshot.version.as_ref())
            .await
    }

    pub async fn upsert(&self, record: Course, previous_name: Option<&str>, message: &str) -> Result<WriteReceipt> {
        let mut snapshot = self.snapshot().await?;
        let name = record.name.clone();
        let replaced = snapshot.upsert(record, previous_name)?;
        let receipt = self.persist(&snapshot, message).await?;
        info!(
            "{} course {} ({} in table)",
            if replaced { "updated" } else { "added" },
            name,
            snapshot.records.len()
        );
        Ok(receipt)
    }

    /// Removes `name` from the table, then tries to delete its PDF. The table
    /// write is not undone when the PDF delete fails.
    pub async fn delete(&self, name: &str, message: &str, blob_message: &str) -> Result<DeleteOutcome> {
        let mut snapshot = self.snapshot().await?;
        let removed = snapshot.remove(name)?;
        let table = self.persist(&snapshot, message).await?;
        info!("removed course {} from {}", name, self.table_path);

        let blob = self.delete_blob(&removed.file_path, blob_message).await;
        Ok(DeleteOutcome { removed, table, blob })
    }

    async fn delete_blob(&self, path: &str, message: &str) -> BlobOutcome {
        let version = match self.store.read(path).await {
            Ok(file) => file.version,
            Err(StoreError::NotFound(_)) => {
                warn!("no PDF at {}, nothing to delete", path);
                return BlobOutcome::Missing;
            }
            Err(err) => return BlobOutcome::Failed(err),
        };
        match self.store.delete(path, message, &version).await {
            Ok(commit) => BlobOutcome::Deleted { commit },
            Err(StoreError::NotFound(_)) => {
                warn!("PDF at {} vanished before it could be deleted", path);
                BlobOutcome::Missing
            }
            Err(err) => BlobOutcome::Failed(err),
        }
    }

    /// Current version of a PDF, `None` when there is none.
    pub async fn blob_version(&self, path: &str) -> Result<Option<VersionToken>> {
        match self.store.read(path).await {
            Ok(file) => Ok(Some(file.version)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Updates the PDF when `previous` is known, creates it otherwise.
    pub async fn put_blob(
        &self,
        path: &str,
        bytes: &[u8],
        previous: Option<&VersionToken>,
        message: &str,
    ) -> Result<WriteReceipt> {
        self.store.write(path, bytes, message, previous).await
    }
}
