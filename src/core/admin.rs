use crate::core::repository::{CourseRepository, DeleteOutcome};
use crate::core::store::{TextStore, WriteReceipt};
use crate::error::store::{Result, StoreError};
use crate::model::course::{Course, CourseDraft, Semester, Upload, course_file_path};
use log::{error, info};

/// Outcome of one submit. The PDF and the table are separate commits, so
/// each has its own result.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub record: Course,
    /// `None` when no new PDF was uploaded.
    pub blob: Option<Result<WriteReceipt>>,
    pub table: Result<WriteReceipt>,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        self.table.is_ok() && self.blob.as_ref().is_none_or(|b| b.is_ok())
    }
}

/// The add / modify / delete flow behind the course form.
pub struct CourseAdmin<S: TextStore> {
    repository: CourseRepository<S>,
}

impl<S: TextStore> CourseAdmin<S> {
    pub fn new(repository: CourseRepository<S>) -> Self {
        CourseAdmin { repository }
    }

    pub fn repository(&self) -> &CourseRepository<S> {
        &self.repository
    }

    pub async fn courses(&self) -> Result<Vec<Course>> {
        self.repository.list().await
    }

    /// Adds a course, or modifies the one named `previous_name`.
    ///
    /// Draft errors come back as `Err` before anything is sent. The table is
    /// then read once; a failed read, or a name another course already uses,
    /// is also an `Err` and nothing is written. Failures of the PDF upload and
    /// the table write are reported in the outcome.
    pub async fn submit(&self, draft: CourseDraft, previous_name: Option<&str>) -> Result<SubmitOutcome> {
        let previous_name = previous_name.filter(|n| !n.is_empty());
        check_draft(&draft)?;

        let snapshot = self.repository.snapshot().await?;
        let previous = previous_name.and_then(|name| snapshot.get(name)).cloned();
        let (record, upload) = build_record(draft, previous.as_ref())?;
        snapshot.check_name_free(&record.name, previous.as_ref().map(|p| p.name.as_str()))?;
        let is_update = previous.is_some();

        let blob = match &upload {
            Some(upload) => Some(self.upload_pdf(&record, upload).await),
            None => None,
        };

        let message = if is_update {
            format!("Update course {}", record.name)
        } else {
            format!("Add course {}", record.name)
        };
        let table = self
            .repository
            .upsert(record.clone(), previous.as_ref().map(|p| p.name.as_str()), &message)
            .await;
        if let Err(err) = &table {
            error!("saving course {} failed: {}", record.name, err);
        }

        Ok(SubmitOutcome { record, blob, table })
    }

    async fn upload_pdf(&self, record: &Course, upload: &Upload) -> Result<WriteReceipt> {
        let result = self.put_pdf(record, upload).await;
        match &result {
            Ok(receipt) => info!(
                "uploaded {} ({} bytes) as {}",
                record.file_path,
                upload.bytes.len(),
                receipt.version
            ),
            Err(err) => error!("uploading {} failed: {}", record.file_path, err),
        }
        result
    }

    /// Update when a PDF already sits at the path, create otherwise.
    async fn put_pdf(&self, record: &Course, upload: &Upload) -> Result<WriteReceipt> {
        let previous = self.repository.blob_version(&record.file_path).await?;
        let message = match previous {
            Some(_) => format!("Update PDF for {}", record.name),
            None => format!("Add PDF for {}", record.name),
        };
        self.repository
            .put_blob(&record.file_path, &upload.bytes, previous.as_ref(), &message)
            .await
    }

    pub async fn remove(&self, name: &str) -> Result<DeleteOutcome> {
        self.repository
            .delete(
                name,
                &format!("Remove course {}", name),
                &format!("Delete PDF for {}", name),
            )
            .await
    }
}

/// Required-field checks; no remote call is made when these fail.
pub fn check_draft(draft: &CourseDraft) -> Result<()> {
    let mut missing = Vec::new();
    if draft.name.trim().is_empty() {
        missing.push("course name");
    }
    if draft.label.trim().is_empty() {
        missing.push("course label");
    }
    if draft.semesters.is_empty() {
        missing.push("semester");
    }
    if !missing.is_empty() {
        return Err(StoreError::Validation(format!("please fill all fields: missing {}", missing.join(", "))));
    }

    if let Some(upload) = &draft.upload {
        let filename = upload.filename.trim();
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
            return Err(StoreError::Validation(format!("`{}` is not a file name", upload.filename)));
        }
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(StoreError::Validation(format!("{} is not a PDF", filename)));
        }
    }
    Ok(())
}

/// Turns a checked draft into the stored record. Without an upload the new
/// record keeps the previous record's file name.
pub fn build_record(draft: CourseDraft, previous: Option<&Course>) -> Result<(Course, Option<Upload>)> {
    check_draft(&draft)?;

    let file_name = match (&draft.upload, previous) {
        (Some(upload), _) => upload.filename.trim().to_string(),
        (None, Some(previous)) if !previous.file_name().is_empty() => previous.file_name().to_string(),
        _ => {
            return Err(StoreError::Validation(
                "a course outline PDF is required for a new course".to_string(),
            ));
        }
    };

    let mut semesters: Vec<Semester> = Vec::with_capacity(draft.semesters.len());
    for semester in draft.semesters {
        if !semesters.contains(&semester) {
            semesters.push(semester);
        }
    }

    let record = Course {
        name: draft.name.trim().to_string(),
        label: draft.label.trim().to_string(),
        category: draft.category,
        subcategory: draft.subcategory,
        semesters,
        file_path: course_file_path(draft.category, &file_name),
        icon: String::new(),
    };
    Ok((record, draft.upload))
}
