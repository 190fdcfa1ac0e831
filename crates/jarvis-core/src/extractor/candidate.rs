//! Inputs and outputs of fact extraction

use jarvis_llm::MessageRole;
use jarvis_memory::{ConversationMessage, FactCategory, Importance};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One spoken line of a transcript
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    /// `User` or `Assistant`
    pub role: MessageRole,
    /// What was said
    pub text: String,
}

/// The user/assistant exchange handed to an extractor.
///
/// Tool chatter never enters a transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Speaker the knowledge is about
    pub user_id: Uuid,
    /// Conversation the lines came from
    pub conversation_id: Option<Uuid>,
    /// Lines, oldest first
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    /// A single turn: the utterance and the final answer
    #[must_use]
    pub fn turn(
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        utterance: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            conversation_id,
            lines: vec![
                TranscriptLine {
                    role: MessageRole::User,
                    text: utterance.into(),
                },
                TranscriptLine {
                    role: MessageRole::Assistant,
                    text: answer.into(),
                },
            ],
        }
    }

    /// Build from stored messages, keeping only user and assistant lines
    #[must_use]
    pub fn from_messages(
        user_id: Uuid,
        conversation_id: Uuid,
        messages: &[ConversationMessage],
    ) -> Self {
        let lines = messages
            .iter()
            .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
            .map(|m| TranscriptLine {
                role: m.role,
                text: m.content.clone(),
            })
            .collect();
        Self {
            user_id,
            conversation_id: Some(conversation_id),
            lines,
        }
    }

    /// "User: ..." / "Assistant: ..." lines
    #[must_use]
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|l| {
                let speaker = if l.role == MessageRole::User {
                    "User"
                } else {
                    "Assistant"
                };
                format!("{speaker}: {}", l.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Everything the user said
    pub fn user_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.role == MessageRole::User)
            .map(|l| l.text.as_str())
    }

    /// Total characters across all lines
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.lines.iter().map(|l| l.text.chars().count()).sum()
    }
}

/// A fact the extractor believes it found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFact {
    /// Fact text
    pub text: String,
    /// Topic
    pub category: FactCategory,
    /// Importance
    pub importance: Importance,
}

/// A preference observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePreference {
    /// Grouping
    pub category: String,
    /// Key within the category
    pub key: String,
    /// Observed value
    pub value: String,
    /// Confidence, 0.0 ..= 1.0
    pub confidence: f64,
}

/// Extractor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    /// Accumulating fact
    Fact(CandidateFact),
    /// Overwritable preference
    Preference(CandidatePreference),
}
