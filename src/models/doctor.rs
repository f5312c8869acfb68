use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub available_start: String,
    pub available_end: String,
    pub off_day: Option<String>,
}

/// Payload for creating a doctor; also the record shape in the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub department: String,
    pub available_start: String,
    pub available_end: String,
    #[serde(default)]
    pub off_day: Option<String>,
}
