use crate::models::{ExtractedEntities, Intent};
use crate::services::ai::LlmProvider;

pub const DEPARTMENTS: [&str; 14] = [
    "Cardiology",
    "Dermatology",
    "Emergency Medicine",
    "Family Medicine",
    "Gastroenterology",
    "Nephrology",
    "Neurology",
    "Oncology",
    "Ophthalmology",
    "Orthopedics",
    "Pathology",
    "Pediatrics",
    "Radiology",
    "Surgery",
];

const SYSTEM_PROMPT: &str = r#"You are an entity extraction engine for a hospital appointment booking assistant. Analyze the patient's message.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "intent": "greeting|book_appointment|provide_name|select_department|select_doctor|select_time|confirm_booking|other",
  "patient_name": "extracted full name or null",
  "department": "extracted department or null",
  "doctor_name": "extracted doctor name or null",
  "date": "extracted date like 2025-01-15 or null",
  "time": "extracted time like 14:00 or null",
  "problem_description": "symptoms or complaint in the patient's words, or null"
}

Departments to look for: Cardiology, Dermatology, Emergency Medicine, Family Medicine, Gastroenterology, Nephrology, Neurology, Oncology, Ophthalmology, Orthopedics, Pathology, Pediatrics, Radiology, Surgery.

If the patient mentions a department name (like "pathology" or "surgery"), set the department field to the full department name. Use 24-hour HH:MM for times and YYYY-MM-DD for dates. Use null for anything not present, never an empty string."#;

/// Best-effort extraction. Never fails: any provider or parse breakdown
/// degrades to `{intent: other}` so the dialogue can re-prompt instead of
/// stalling.
pub async fn extract_entities(llm: &dyn LlmProvider, message: &str) -> ExtractedEntities {
    let raw = match llm.complete(SYSTEM_PROMPT, message).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "extraction call failed, degrading to 'other'");
            return ExtractedEntities::default();
        }
    };

    let mut entities = parse_entities(&raw).unwrap_or_else(|| {
        tracing::warn!("failed to parse extraction response as JSON, degrading to 'other'");
        ExtractedEntities::default()
    });

    apply_department_fallback(message, &mut entities);
    entities
}

/// Parse the model output, tolerating markdown fences and surrounding prose.
fn parse_entities(response: &str) -> Option<ExtractedEntities> {
    let trimmed = response.trim();
    if let Ok(entities) = serde_json::from_str::<ExtractedEntities>(trimmed) {
        return Some(normalize(entities));
    }

    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(entities) = serde_json::from_str::<ExtractedEntities>(cleaned) {
        return Some(normalize(entities));
    }

    // Last resort: the first {...} span in the response.
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    serde_json::from_str::<ExtractedEntities>(&cleaned[start..=end])
        .ok()
        .map(normalize)
}

/// Models sometimes emit "" or "null" instead of JSON null.
fn normalize(mut entities: ExtractedEntities) -> ExtractedEntities {
    for field in [
        &mut entities.patient_name,
        &mut entities.department,
        &mut entities.doctor_name,
        &mut entities.date,
        &mut entities.time,
        &mut entities.problem_description,
    ] {
        if let Some(value) = field {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                *field = None;
            } else if trimmed.len() != value.len() {
                *field = Some(trimmed.to_string());
            }
        }
    }
    entities
}

/// If the raw message names a department the model missed, fill it in.
fn apply_department_fallback(message: &str, entities: &mut ExtractedEntities) {
    if entities.department.is_some() {
        return;
    }

    let message_lower = message.to_lowercase();
    for department in DEPARTMENTS {
        if message_lower.contains(&department.to_lowercase()) {
            entities.department = Some(department.to_string());
            entities.intent = Intent::SelectDepartment;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"intent":"book_appointment","patient_name":"Alice Brown","department":null,"doctor_name":null,"date":"2025-06-16","time":"09:20","problem_description":null}"#;
        let entities = parse_entities(json).unwrap();
        assert_eq!(entities.intent, Intent::BookAppointment);
        assert_eq!(entities.patient_name.as_deref(), Some("Alice Brown"));
        assert_eq!(entities.time.as_deref(), Some("09:20"));
    }

    #[test]
    fn test_parse_markdown_fenced_json() {
        let fenced = "```json\n{\"intent\":\"select_time\",\"time\":\"10:00\"}\n```";
        let entities = parse_entities(fenced).unwrap();
        assert_eq!(entities.intent, Intent::SelectTime);
        assert_eq!(entities.time.as_deref(), Some("10:00"));
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let noisy = "Sure! Here is the extraction: {\"intent\":\"greeting\"} Hope that helps.";
        let entities = parse_entities(noisy).unwrap();
        assert_eq!(entities.intent, Intent::Greeting);
    }

    #[test]
    fn test_unparseable_response_is_none() {
        assert!(parse_entities("I cannot answer that").is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let entities = parse_entities(r#"{"intent":"other"}"#).unwrap();
        assert!(entities.patient_name.is_none());
        assert!(entities.department.is_none());
    }

    #[test]
    fn test_empty_strings_normalized_to_none() {
        let json = r#"{"intent":"other","patient_name":"","department":"null"}"#;
        let entities = parse_entities(json).unwrap();
        assert!(entities.patient_name.is_none());
        assert!(entities.department.is_none());
    }

    #[test]
    fn test_department_fallback_from_raw_message() {
        let mut entities = ExtractedEntities::default();
        apply_department_fallback("I think I need pathology", &mut entities);
        assert_eq!(entities.department.as_deref(), Some("Pathology"));
        assert_eq!(entities.intent, Intent::SelectDepartment);
    }

    #[test]
    fn test_fallback_does_not_override_extracted_department() {
        let mut entities = ExtractedEntities {
            department: Some("Cardiology".to_string()),
            ..Default::default()
        };
        apply_department_fallback("or maybe surgery", &mut entities);
        assert_eq!(entities.department.as_deref(), Some("Cardiology"));
    }
}
