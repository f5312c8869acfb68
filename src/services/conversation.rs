use std::sync::Arc;

use chrono::{Duration, Local};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ChatReply, ConversationState, ExtractedEntities, Intent, Step};
use crate::services::ai::extract;
use crate::services::{availability, booking, slots};
use crate::state::AppState;

/// Exact full-message matches (case-insensitive) that restart the dialogue
/// from any step.
const RESET_PHRASES: [&str; 5] = ["hi", "hello", "start over", "reset", "new appointment"];

const WELCOME: &str = "Welcome to our Hospital Appointment Booking System!\n\nI'm here to help you book an appointment with our doctors. To get started, may I have your full name please?";

const APOLOGY: &str =
    "I'm sorry, there was an error processing your request. Please try again.";

/// Symptom keywords mapped to the department that treats them.
const SYMPTOM_DEPARTMENTS: &[(&[&str], &str)] = &[
    (&["heart", "chest", "cardiac"], "Cardiology"),
    (&["skin", "rash", "dermatitis"], "Dermatology"),
    (&["child", "baby", "pediatric"], "Pediatrics"),
    (&["bone", "joint", "fracture"], "Orthopedics"),
    (&["eye", "vision", "sight"], "Ophthalmology"),
    (&["brain", "headache", "neurological"], "Neurology"),
    (&["stomach", "digestive", "gastro"], "Gastroenterology"),
    (&["kidney", "renal", "urinary"], "Nephrology"),
    (&["cancer", "tumor", "oncology"], "Oncology"),
    (&["surgery", "operation", "surgical"], "Surgery"),
    (&["family", "general", "primary"], "Family Medicine"),
    (&["emergency", "urgent", "acute"], "Emergency Medicine"),
    (&["x-ray", "scan", "imaging"], "Radiology"),
    (&["test", "lab", "pathology"], "Pathology"),
];

/// Handle one user message for a session: load state, extract entities,
/// advance the state machine, persist the new state. Any unexpected error
/// inside a transition becomes a generic apology and the stored state is
/// left untouched so the user can retry.
pub async fn process_message(state: &Arc<AppState>, session_id: &str, message: &str) -> ChatReply {
    let mut conv = state.sessions.get(session_id).unwrap_or_default();
    let parsed = extract::extract_entities(state.llm.as_ref(), message).await;

    tracing::info!(
        session = session_id,
        intent = ?parsed.intent,
        step = conv.step.as_str(),
        "processing message"
    );

    let result = {
        let db = state.db.lock().unwrap();
        advance(&db, &mut conv, &parsed, message)
    };

    match result {
        Ok(reply) => {
            let done = conv.booking_confirmed;
            let booking_details = conv.booking.clone();
            state.sessions.put(session_id, conv);
            ChatReply {
                reply,
                done,
                booking_details,
            }
        }
        Err(e) => {
            tracing::error!(session = session_id, error = %e, "message handling failed, state preserved");
            ChatReply {
                reply: APOLOGY.to_string(),
                done: false,
                booking_details: None,
            }
        }
    }
}

/// One deterministic transition: first matching rule wins.
fn advance(
    conn: &Connection,
    conv: &mut ConversationState,
    parsed: &ExtractedEntities,
    message: &str,
) -> Result<String, AppError> {
    let lower = message.trim().to_lowercase();

    if RESET_PHRASES.contains(&lower.as_str()) {
        *conv = ConversationState::default();
        return Ok(WELCOME.to_string());
    }

    match conv.step {
        Step::Welcome => match &conv.patient_name {
            None => {
                if let Some(name) = parsed.patient_name.clone() {
                    conv.patient_name = Some(name.clone());
                    conv.step = Step::BookingRequest;
                    Ok(format!(
                        "Nice to meet you, {name}! How can I help you today? \
                         Would you like to book an appointment with one of our doctors?"
                    ))
                } else {
                    Ok(WELCOME.to_string())
                }
            }
            Some(name) => {
                let name = name.clone();
                conv.step = Step::BookingRequest;
                Ok(format!(
                    "Hello {name}! How can I help you today? Would you like to book an appointment?"
                ))
            }
        },

        Step::BookingRequest => {
            if parsed.intent == Intent::BookAppointment
                || lower.contains("book")
                || lower.contains("appointment")
            {
                conv.step = Step::DepartmentSelection;
                Ok(format!(
                    "Great! I'd be happy to help you book an appointment.\n\n\
                     What type of doctor would you like to see? You can either:\n\n\
                     1. Tell me which department you need:\n{}\n\n\
                     2. Describe your problem and I'll suggest the right department for you.\n\n\
                     What would you prefer?",
                    department_list(conn)?
                ))
            } else {
                Ok("I'm here to help you book an appointment. Would you like to book an \
                    appointment with one of our doctors?"
                    .to_string())
            }
        }

        Step::DepartmentSelection => {
            let department = parsed.department.clone().or_else(|| {
                parsed
                    .problem_description
                    .as_deref()
                    .and_then(infer_department)
                    .map(String::from)
            });

            match department {
                Some(dept) => select_department(conn, conv, &dept),
                None => Ok("I need a bit more information. Could you please tell me which \
                            department you need or describe your problem so I can suggest \
                            the right doctor for you?"
                    .to_string()),
            }
        }

        Step::DoctorSelection => {
            let current = conv.department.clone().unwrap_or_default();

            if let Some(dept) = parsed
                .department
                .as_ref()
                .filter(|d| !d.eq_ignore_ascii_case(&current))
            {
                // Department change takes priority over anything else.
                let dept = dept.clone();
                return select_department(conn, conv, &dept);
            }

            if let Some(name) = &parsed.doctor_name {
                return match queries::find_doctor_by_name(conn, name)? {
                    Some(doctor) => {
                        let today = Local::now().date_naive();
                        let tomorrow = today + Duration::days(1);
                        let off_note = match &doctor.off_day {
                            Some(day) => format!("\n\nPlease note: {} is off on {day}s.", doctor.name),
                            None => String::new(),
                        };
                        conv.doctor = Some(doctor.name.clone());
                        conv.step = Step::DateSelection;
                        Ok(format!(
                            "Excellent choice! {} is a great {} specialist.\n\n\
                             What date would you like to book your appointment? You can say:\n\
                             • Today ({today})\n• Tomorrow ({tomorrow})\n\
                             • Or any specific date (YYYY-MM-DD format){off_note}",
                            doctor.name, doctor.department
                        ))
                    }
                    None => Ok(format!(
                        "I couldn't find a doctor named {name}. Could you please check the \
                         spelling and try again?"
                    )),
                };
            }

            // Fallback: the raw message may name a department outright.
            if let Some(dept) = extract::DEPARTMENTS
                .iter()
                .find(|d| lower.contains(&d.to_lowercase()))
            {
                return select_department(conn, conv, dept);
            }

            Ok("I didn't catch the doctor's name. Could you please tell me which doctor \
                you'd like to book an appointment with, or if you want to change departments, \
                just tell me the department name."
                .to_string())
        }

        Step::DateSelection => {
            let doctor_name = conv
                .doctor
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no doctor selected at date step"))?;

            let date = parsed.date.clone().or_else(|| {
                if lower.contains("today") {
                    Some(Local::now().date_naive().to_string())
                } else if lower.contains("tomorrow") {
                    Some((Local::now().date_naive() + Duration::days(1)).to_string())
                } else {
                    None
                }
            });

            // An unparseable date counts as unresolved; re-prompt.
            let date = date.filter(|d| availability::parse_date(d).is_ok());

            let Some(date) = date else {
                return Ok("I need a specific date for your appointment. Please tell me which \
                           date you'd like (today, tomorrow, or a specific date in YYYY-MM-DD \
                           format)."
                    .to_string());
            };

            let doctor = queries::get_doctor(conn, &doctor_name)?
                .ok_or_else(|| anyhow::anyhow!("selected doctor missing from directory"))?;

            if !availability::is_available(conn, &doctor_name, &date)? {
                let off_day = doctor.off_day.as_deref().unwrap_or("scheduled");
                return Ok(format!(
                    "Sorry, {doctor_name} is not available on {date} (it's their {off_day} \
                     off day). Please choose a different date."
                ));
            }

            let available = availability::available_slots(conn, &doctor_name, &date)?;
            if available.is_empty() {
                return Ok(format!(
                    "Sorry, {doctor_name} has no available slots on {date}. Please choose a \
                     different date."
                ));
            }

            let shown = available
                .iter()
                .take(10)
                .map(|s| format!("• {s}"))
                .collect::<Vec<_>>()
                .join("\n");
            conv.date = Some(date.clone());
            conv.step = Step::TimeSelection;
            Ok(format!(
                "Great! Here are the available time slots for {doctor_name} on {date}:\n\n\
                 {shown}\n\nWhich time slot would you prefer? (Each appointment is {} minutes \
                 long)",
                slots::SLOT_MINUTES
            ))
        }

        Step::TimeSelection => {
            let doctor_name = conv
                .doctor
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no doctor selected at time step"))?;
            let date = conv
                .date
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no date selected at time step"))?;

            let time = parsed
                .time
                .clone()
                .filter(|t| slots::parse_minutes(t).is_ok());

            let Some(time) = time else {
                return Ok("I need a specific time for your appointment. Please choose from \
                           the available time slots I showed you."
                    .to_string());
            };

            let available = availability::available_slots(conn, &doctor_name, &date)?;
            if available.contains(&time) {
                let patient = conv.patient_name.as_deref().unwrap_or("(unknown)").to_string();
                conv.time = Some(time.clone());
                conv.step = Step::ConfirmBooking;
                return Ok(format!(
                    "Perfect! Let me confirm your appointment details:\n\n\
                     Patient: {patient}\nDoctor: {doctor_name}\nDate: {date}\nTime: {time}\n\n\
                     Is this correct? Please say 'yes' to confirm or 'no' to make changes."
                ));
            }

            let alternatives =
                availability::suggest_alternatives(conn, &doctor_name, &date, &time)?;
            if alternatives.is_empty() {
                conv.step = Step::DateSelection;
                return Ok(format!(
                    "Sorry, {time} is not available and there are no alternative slots. \
                     Please choose a different date."
                ));
            }

            let listed = alternatives
                .iter()
                .map(|s| format!("• {s}"))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!(
                "Sorry, {time} is no longer available. Here are some alternative time \
                 slots:\n\n{listed}\n\nWhich one would you prefer?"
            ))
        }

        Step::ConfirmBooking => {
            if lower.contains("yes") || lower.contains("confirm") {
                let patient = conv
                    .patient_name
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no patient name at confirm step"))?;
                let doctor_name = conv
                    .doctor
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no doctor at confirm step"))?;
                let date = conv
                    .date
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no date at confirm step"))?;
                let time = conv
                    .time
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no time at confirm step"))?;

                match booking::create(conn, &patient, &doctor_name, &date, &time) {
                    Ok(created) => {
                        conv.booking = Some(created);
                        conv.booking_confirmed = true;
                        conv.step = Step::Completed;
                        Ok(format!(
                            "Congratulations! Your appointment has been successfully booked!\n\n\
                             Booking Details:\n• Patient: {patient}\n• Doctor: {doctor_name}\n\
                             • Date: {date}\n• Time: {time}\n• Duration: {} minutes\n\n\
                             Please arrive 10 minutes before your appointment time. If you need \
                             to cancel or reschedule, please contact us at least 24 hours in \
                             advance.\n\nIs there anything else I can help you with?",
                            slots::SLOT_MINUTES
                        ))
                    }
                    Err(AppError::Conflict) => {
                        conv.step = Step::TimeSelection;
                        Ok("Sorry, there was an error creating your booking. The time slot \
                            may have been taken by someone else. Please try again with a \
                            different time slot."
                            .to_string())
                    }
                    Err(e) => Err(e),
                }
            } else {
                // Anything short of a confirmation is a request to modify;
                // collected fields stay as they are.
                Ok("No problem! What would you like to change? You can modify the doctor, \
                    date, or time."
                    .to_string())
            }
        }

        Step::Completed => Ok(
            "Your appointment has been successfully booked! Is there anything else I can \
             help you with?"
                .to_string(),
        ),
    }
}

fn department_list(conn: &Connection) -> Result<String, AppError> {
    let departments = queries::list_departments(conn)?;
    Ok(departments
        .iter()
        .map(|d| format!("• {d}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn infer_department(problem: &str) -> Option<&'static str> {
    let problem_lower = problem.to_lowercase();
    SYMPTOM_DEPARTMENTS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| problem_lower.contains(k)))
        .map(|(_, department)| *department)
}

/// List the department's doctors and move to doctor selection; with no
/// doctors, re-list departments and fall back to department selection.
fn select_department(
    conn: &Connection,
    conv: &mut ConversationState,
    department: &str,
) -> Result<String, AppError> {
    let doctors = queries::find_doctors_by_department(conn, department)?;

    if doctors.is_empty() {
        conv.step = Step::DepartmentSelection;
        return Ok(format!(
            "I couldn't find any doctors in the {department} department. Here are the \
             available departments:\n\n{}\n\nPlease choose from the list above.",
            department_list(conn)?
        ));
    }

    let listed = doctors
        .iter()
        .map(|d| format!("• {}", d.name))
        .collect::<Vec<_>>()
        .join("\n");
    conv.department = Some(department.to_string());
    conv.step = Step::DoctorSelection;
    Ok(format!(
        "Perfect! I found these doctors in the {department} department:\n\n{listed}\n\n\
         Which doctor would you like to book an appointment with?"
    ))
}
