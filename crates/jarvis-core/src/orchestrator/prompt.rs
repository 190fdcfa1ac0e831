//! System prompt assembly
//!
//! The prompt is rebuilt every turn from the user's profile and long-term
//! memory. Nothing here touches the store; callers pass what they loaded.

use chrono::{DateTime, Local};
use jarvis_memory::{Fact, Importance, Preference, Role, User};
use std::fmt::Write;

const BASE_PROMPT: &str = "You are Jarvis, a helpful voice assistant for a family household. \
Your replies are spoken aloud, so keep them short and natural: one to three sentences, \
no lists, no markdown, no emoji. Use the tools when they help. When a tool returns an \
error, tell the user plainly or try a different approach.";

/// Tone and capability lines for a role
fn role_guidance(role: Role) -> &'static str {
    match role {
        Role::Adult => {
            "You are talking to an adult of the household. Be efficient and direct. \
They can place orders and approve orders for others."
        }
        Role::Child => {
            "You are talking to a child. Be warm, simple and encouraging. Keep content age \
appropriate. Children cannot place orders; if they ask, suggest they ask a parent."
        }
        Role::Elderly => {
            "You are talking to an elderly family member. Speak slowly and clearly, be patient \
and respectful, and repeat important details such as medicine times."
        }
        Role::Maid => {
            "You are talking to the household help. Be polite and practical. They may manage \
the grocery list and request orders, but every order waits for an adult's approval."
        }
        Role::Guest => {
            "You are talking to a guest. Be courteous. Guests can ask general questions and \
set reminders but cannot place orders or change the grocery list."
        }
    }
}

/// Everything the prompt is built from
pub(crate) struct PromptContext<'a> {
    pub user: &'a User,
    pub facts: &'a [Fact],
    pub preferences: &'a [Preference],
    pub summaries: &'a [String],
    pub now: DateTime<Local>,
}

/// Render the system prompt
pub(crate) fn build_system_prompt(ctx: &PromptContext<'_>) -> String {
    let user = ctx.user;
    let mut prompt = String::with_capacity(2048);
    prompt.push_str(BASE_PROMPT);
    prompt.push_str("\n\n");
    prompt.push_str(role_guidance(user.role));

    let _ = write!(
        prompt,
        "\n\nUSER PROFILE:\n- Name: {}\n- Role: {}\n- Response preference: {}\n- Language: {}",
        user.name, user.role, user.response_length, user.language
    );
    if let Some(age) = user.age {
        let _ = write!(prompt, "\n- Age: {age}");
    }
    if user.requires_approval {
        prompt.push_str("\n- This user's orders require approval");
    }
    let _ = write!(prompt, "\n- Daily order limit: Rs {:.0}", user.daily_order_limit);

    if user.role == Role::Elderly {
        if let Some(info) = &user.medical_info {
            prompt.push_str("\n\nMEDICAL INFO:");
            if !info.medicines.is_empty() {
                let meds: Vec<String> = info
                    .medicines
                    .iter()
                    .map(|m| match &m.schedule {
                        Some(schedule) => format!("{} ({schedule})", m.name),
                        None => m.name.clone(),
                    })
                    .collect();
                let _ = write!(prompt, "\n- Medicines: {}", meds.join(", "));
            }
            if !info.allergies.is_empty() {
                let _ = write!(prompt, "\n- Allergies: {}", info.allergies.join(", "));
            }
            if !info.conditions.is_empty() {
                let _ = write!(prompt, "\n- Conditions: {}", info.conditions.join(", "));
            }
        }
    }

    if !ctx.preferences.is_empty() {
        prompt.push_str("\n\nPREFERENCES:");
        for pref in ctx.preferences {
            let _ = write!(prompt, "\n- {}/{}: {}", pref.category, pref.key, pref.value);
        }
    }

    if !ctx.facts.is_empty() {
        prompt.push_str("\n\nTHINGS YOU KNOW ABOUT THIS USER:");
        for fact in ctx.facts {
            let marker = if fact.importance >= Importance::High {
                "[IMPORTANT] "
            } else {
                ""
            };
            let _ = write!(prompt, "\n- {marker}{}", fact.text);
        }
    }

    if !ctx.summaries.is_empty() {
        prompt.push_str("\n\nRECENT CONVERSATIONS:");
        for summary in ctx.summaries {
            let _ = write!(prompt, "\n- {summary}");
        }
    }

    let _ = write!(
        prompt,
        "\n\nCurrent date and time: {}",
        ctx.now.format("%A, %B %d, %Y %I:%M %p")
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jarvis_memory::{FactCategory, MedicalInfo, Medicine};
    use uuid::Uuid;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, 15, 15, 0).unwrap()
    }

    #[test]
    fn test_child_prompt() {
        let user = User::new("tablet", "Anu", Role::Child).with_age(8);
        let facts = vec![
            Fact::new(user.id, "loves dinosaurs", FactCategory::Preference, Importance::Normal),
            Fact::new(user.id, "allergic to peanuts", FactCategory::Health, Importance::Critical),
        ];
        let prompt = build_system_prompt(&PromptContext {
            user: &user,
            facts: &facts,
            preferences: &[],
            summaries: &[],
            now: now(),
        });

        assert!(prompt.contains("Children cannot place orders"));
        assert!(prompt.contains("- Name: Anu"));
        assert!(prompt.contains("- Age: 8"));
        assert!(prompt.contains("This user's orders require approval"));
        assert!(prompt.contains("- loves dinosaurs"));
        assert!(prompt.contains("- [IMPORTANT] allergic to peanuts"));
        assert!(!prompt.contains("RECENT CONVERSATIONS"));
        assert!(prompt.contains("Monday, March 04, 2024 03:15 PM"));
    }

    #[test]
    fn test_elderly_medical_section() {
        let user = User::new("echo-bedroom", "Paati", Role::Elderly).with_medical_info(MedicalInfo {
            medicines: vec![Medicine {
                name: "Metformin".into(),
                dosage: Some("500mg".into()),
                schedule: Some("after breakfast".into()),
            }],
            allergies: vec!["penicillin".into()],
            ..MedicalInfo::default()
        });
        let summaries = vec!["Asked about the weather in Chennai.".to_string()];
        let prompt = build_system_prompt(&PromptContext {
            user: &user,
            facts: &[],
            preferences: &[],
            summaries: &summaries,
            now: now(),
        });

        assert!(prompt.contains("Metformin (after breakfast)"));
        assert!(prompt.contains("Allergies: penicillin"));
        assert!(prompt.contains("RECENT CONVERSATIONS:\n- Asked about the weather in Chennai."));
    }

    #[test]
    fn test_adult_has_no_approval_line() {
        let user = User::new("echo", "Ravi", Role::Adult);
        let pref = Preference {
            id: Uuid::new_v4(),
            user_id: user.id,
            category: "food".into(),
            key: "spice_level".into(),
            value: "mild".into(),
            confidence: 0.9,
            source_conversation_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let prompt = build_system_prompt(&PromptContext {
            user: &user,
            facts: &[],
            preferences: std::slice::from_ref(&pref),
            summaries: &[],
            now: now(),
        });
        assert!(!prompt.contains("require approval"));
        assert!(prompt.contains("- food/spice_level: mild"));
        assert!(!prompt.contains("MEDICAL INFO"));
    }
}
