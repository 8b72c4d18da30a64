pub mod contents_response;
pub mod course;
