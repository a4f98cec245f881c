//! Survey and question domain models.
//!
//! A survey is an ordered questionnaire with an activation window. Only
//! nomination questions feed the sociogram; single-choice and free-text
//! questions count toward completion but carry no score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a nomination question measures attraction or rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Selection rule of a nomination question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationRule {
    pub polarity: Polarity,
    /// Exact number of peers a respondent must select (at least 1).
    pub max_selections: u32,
}

/// One selectable option of a single-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: Uuid,
    pub text: String,
    #[serde(default = "default_option_value")]
    pub value: i32,
}

const fn default_option_value() -> i32 {
    1
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            value: default_option_value(),
        }
    }
}

/// Shape of the answer a question expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    Nomination {
        #[serde(default)]
        polarity: Polarity,
        max_selections: u32,
    },
    SingleChoice {
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    FreeText,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nomination { .. } => "nomination",
            Self::SingleChoice { .. } => "single_choice",
            Self::FreeText => "free_text",
        }
    }

    pub fn nomination_rule(&self) -> Option<NominationRule> {
        match self {
            Self::Nomination { polarity, max_selections } => Some(NominationRule {
                polarity: *polarity,
                max_selections: *max_selections,
            }),
            _ => None,
        }
    }
}

/// A question at a fixed position inside one survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub position: u32,
    pub text: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl Question {
    pub fn nomination(position: u32, text: impl Into<String>, polarity: Polarity, max_selections: u32) -> Self {
        Self::with_kind(position, text, QuestionKind::Nomination { polarity, max_selections })
    }

    pub fn single_choice(position: u32, text: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        Self::with_kind(position, text, QuestionKind::SingleChoice { options })
    }

    pub fn free_text(position: u32, text: impl Into<String>) -> Self {
        Self::with_kind(position, text, QuestionKind::FreeText)
    }

    fn with_kind(position: u32, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            text: text.into(),
            kind,
            description: None,
        }
    }

    pub fn is_nomination(&self) -> bool {
        matches!(self.kind, QuestionKind::Nomination { .. })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err(format!("question {} has empty text", self.id));
        }
        match &self.kind {
            QuestionKind::Nomination { max_selections, .. } if *max_selections == 0 => {
                Err(format!("question {} must allow at least one selection", self.id))
            }
            QuestionKind::SingleChoice { options } if options.is_empty() => {
                Err(format!("question {} has no options", self.id))
            }
            _ => Ok(()),
        }
    }
}

/// An ordered questionnaire with an activation window `[starts_at, ends_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Questions ordered by position.
    #[serde(default)]
    pub questions: Vec<Question>,
}

const fn default_active() -> bool {
    true
}

impl Survey {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            starts_at,
            ends_at,
            active: true,
            questions: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self.questions.sort_by_key(|q| q.position);
        self
    }

    /// Open means the flag is on and `now` falls inside the window.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= now && now < self.ends_at
    }

    pub fn question(&self, id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn nomination_questions(&self) -> impl Iterator<Item = (&Question, NominationRule)> {
        self.questions
            .iter()
            .filter_map(|q| q.kind.nomination_rule().map(|rule| (q, rule)))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("survey title cannot be empty".to_string());
        }
        if self.ends_at <= self.starts_at {
            return Err(format!("survey {} ends before it starts", self.id));
        }
        for question in &self.questions {
            question.validate()?;
        }
        Ok(())
    }
}
