use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    BookAppointment,
    ProvideName,
    SelectDepartment,
    SelectDoctor,
    SelectTime,
    ConfirmBooking,
    Other,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::Other
    }
}

/// Best-effort structured parse of one user message. Every field is
/// optional; a failed extraction call collapses to `intent: other`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub problem_description: Option<String>,
}
