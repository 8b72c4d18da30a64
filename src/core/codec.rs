use crate::core::literal;
use crate::error::store::{Result, StoreError};
use crate::model::course::Course;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Converts between the course table file and the course list.
///
/// The file holds one assignment, `pdfs = [ {...}, ... ]`. Decoding only
/// reads literals; nothing in the file is executed.
#[derive(Debug, Clone)]
pub struct TableCodec {
    variable: String,
}

impl TableCodec {
    pub fn new(variable: &str) -> Self {
        TableCodec {
            variable: variable.to_string(),
        }
    }

    pub fn decode(&self, source: &str) -> Result<Vec<Course>> {
        let Some(value) = literal::find_assignment(source, &self.variable)? else {
            return Ok(Vec::new());
        };

        let Value::Array(entries) = value else {
            return Err(StoreError::Codec(format!("`{}` is not a list", self.variable)));
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value::<Course>(entry)
                    .map_err(|e| StoreError::Codec(format!("{}[{}]: {}", self.variable, index, e)))
            })
            .collect()
    }

    /// Same input, same bytes: struct key order, four space indent, trailing
    /// newline.
    pub fn encode(&self, records: &[Course]) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        records
            .serialize(&mut serializer)
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        let literal = String::from_utf8(buf).map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(format!("{} = {}\n", self.variable, literal))
    }
}
