use serde::{Deserialize, Serialize};
use std::fmt;

/// 课程类型 (course type), stored under the `category` key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    #[serde(rename = "Required core courses")]
    RequiredCore,

    #[serde(rename = "Professional Development course")]
    ProfessionalDevelopment,

    #[serde(rename = "Core course")]
    Core,

    #[serde(rename = "Recommended Technical electives")]
    RecommendedTechnicalElective,

    #[serde(rename = "Cross-Disciplinary Elective Course")]
    CrossDisciplinaryElective,

    #[serde(rename = "Other elective course")]
    OtherElective,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::RequiredCore,
        Category::ProfessionalDevelopment,
        Category::Core,
        Category::RecommendedTechnicalElective,
        Category::CrossDisciplinaryElective,
        Category::OtherElective,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::RequiredCore => "Required core courses",
            Category::ProfessionalDevelopment => "Professional Development course",
            Category::Core => "Core course",
            Category::RecommendedTechnicalElective => "Recommended Technical electives",
            Category::CrossDisciplinaryElective => "Cross-Disciplinary Elective Course",
            Category::OtherElective => "Other elective course",
        }
    }

    /// Directory name under `Course/` holding this category's PDFs.
    pub fn folder(&self) -> String {
        self.label().replace(' ', "_")
    }
}

/// 方向 (stream), stored under the `subcategory` key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    #[serde(rename = "Automotive Stream")]
    Automotive,

    #[serde(rename = "Automation and Smart Systems")]
    AutomationAndSmartSystems,

    #[serde(rename = "Digital Manufacturing")]
    DigitalManufacturing,

    #[serde(rename = "Process Systems Stream")]
    ProcessSystems,

    #[serde(rename = "All stream course")]
    AllStreams,
}

impl Stream {
    pub const ALL: [Stream; 5] = [
        Stream::Automotive,
        Stream::AutomationAndSmartSystems,
        Stream::DigitalManufacturing,
        Stream::ProcessSystems,
        Stream::AllStreams,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stream::Automotive => "Automotive Stream",
            Stream::AutomationAndSmartSystems => "Automation and Smart Systems",
            Stream::DigitalManufacturing => "Digital Manufacturing",
            Stream::ProcessSystems => "Process Systems Stream",
            Stream::AllStreams => "All stream course",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    Fall,
    Winter,
    Summer,
}

impl Semester {
    pub const ALL: [Semester; 3] = [Semester::Fall, Semester::Winter, Semester::Summer];

    pub fn label(&self) -> &'static str {
        match self {
            Semester::Fall => "Fall",
            Semester::Winter => "Winter",
            Semester::Summer => "Summer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the course table. Field order is the serialized key order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub label: String,
    pub category: Category,
    pub subcategory: Stream,
    pub semesters: Vec<Semester>,
    pub file_path: String,

    /// Reserved, always empty.
    #[serde(default)]
    pub icon: String,
}

impl Course {
    /// Last segment of `file_path`.
    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('/').next().unwrap_or_default()
    }
}

/// `Course/<category folder>/<file name>`
pub fn course_file_path(category: Category, file_name: &str) -> String {
    format!("Course/{}/{}", category.folder(), file_name)
}

/// A PDF picked by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// What the form hands over on submit, before validation.
#[derive(Debug, Clone)]
pub struct CourseDraft {
    pub name: String,
    pub label: String,
    pub category: Category,
    pub subcategory: Stream,
    pub semesters: Vec<Semester>,
    pub upload: Option<Upload>,
}
