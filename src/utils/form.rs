use crate::model::course::{Category, Course, CourseDraft, Semester, Stream, Upload};
use crate::utils::input::{choose, choose_many, input, input_with_default};
use anyhow::{Context, Result};
use std::path::Path;

/// Prompts for every course field. With `existing`, its values are the
/// defaults and an empty PDF path keeps the current file.
pub async fn prompt_course(existing: Option<&Course>) -> Result<CourseDraft> {
    let name = input_with_default("Course Name", existing.map_or("", |c| c.name.as_str()))?;
    let label = input_with_default("Course Label", existing.map_or("", |c| c.label.as_str()))?;

    let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    let default = existing.and_then(|c| Category::ALL.iter().position(|x| *x == c.category));
    let category = Category::ALL[choose("Select Course Type", &labels, default)?];

    let labels: Vec<&str> = Stream::ALL.iter().map(|s| s.label()).collect();
    let default = existing.and_then(|c| Stream::ALL.iter().position(|x| *x == c.subcategory));
    let subcategory = Stream::ALL[choose("Select Stream", &labels, default)?];

    let labels: Vec<&str> = Semester::ALL.iter().map(|s| s.label()).collect();
    let default: Vec<usize> = existing
        .map(|c| {
            c.semesters
                .iter()
                .filter_map(|s| Semester::ALL.iter().position(|x| x == s))
                .collect()
        })
        .unwrap_or_default();
    let semesters = choose_many("Select Semester(s)", &labels, &default)?
        .into_iter()
        .map(|i| Semester::ALL[i])
        .collect();

    let prompt = if existing.is_some() {
        "Course Outline PDF path (leave blank to keep current)"
    } else {
        "Course Outline PDF path"
    };
    let pdf = input(prompt)?;
    let upload = if pdf.is_empty() { None } else { Some(read_upload(Path::new(&pdf)).await?) };

    Ok(CourseDraft {
        name,
        label,
        category,
        subcategory,
        semesters,
        upload,
    })
}

pub async fn read_upload(path: &Path) -> Result<Upload> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Upload { filename, bytes })
}
