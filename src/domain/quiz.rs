//! Quiz questions and knowledge chunks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the four answer options of a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    /// All choices, in display order.
    pub const ALL: [AnswerChoice; 4] = [
        AnswerChoice::A,
        AnswerChoice::B,
        AnswerChoice::C,
        AnswerChoice::D,
    ];
}

impl fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnswerChoice::A => "A",
            AnswerChoice::B => "B",
            AnswerChoice::C => "C",
            AnswerChoice::D => "D",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AnswerChoice {
    type Err = QuizParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(AnswerChoice::A),
            "B" => Ok(AnswerChoice::B),
            "C" => Ok(AnswerChoice::C),
            "D" => Ok(AnswerChoice::D),
            other => Err(QuizParseError::InvalidAnswer(other.to_string())),
        }
    }
}

/// A text chunk of the knowledge bank, derived upstream from one source
/// document of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Category (subject) this chunk belongs to.
    pub category: String,
    /// File name of the source document.
    pub source: String,
    /// The chunk text itself.
    pub content: String,
}

/// A single-choice quiz question produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerChoice,
    pub explanation: String,
}

impl QuizQuestion {
    /// Checks an answer against the question.
    pub fn check(&self, choice: AnswerChoice) -> bool {
        choice == self.correct_answer
    }

    /// Returns the text of the given option.
    pub fn option_text(&self, choice: AnswerChoice) -> &str {
        match choice {
            AnswerChoice::A => &self.option_a,
            AnswerChoice::B => &self.option_b,
            AnswerChoice::C => &self.option_c,
            AnswerChoice::D => &self.option_d,
        }
    }

    /// Parses a question from model output.
    ///
    /// Models asked for a JSON object still wrap it in markdown fences or
    /// prose often enough that we cut out the outermost `{ ... }` span
    /// before deserializing. The answer letter is accepted in any case.
    pub fn from_model_output(raw: &str) -> Result<Self, QuizParseError> {
        let start = raw.find('{').ok_or(QuizParseError::NoJsonObject)?;
        let end = raw.rfind('}').ok_or(QuizParseError::NoJsonObject)?;
        if end < start {
            return Err(QuizParseError::NoJsonObject);
        }

        let wire: WireQuestion = serde_json::from_str(&raw[start..=end])
            .map_err(|e| QuizParseError::Malformed(e.to_string()))?;

        Ok(Self {
            question: wire.question,
            option_a: wire.option_a,
            option_b: wire.option_b,
            option_c: wire.option_c,
            option_d: wire.option_d,
            correct_answer: wire.correct_answer.parse()?,
            explanation: wire.explanation,
        })
    }
}

/// Wire shape of the model's answer; the answer letter arrives as a
/// free-form string and is validated separately.
#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_answer: String,
    explanation: String,
}

/// Failures turning model output into a [`QuizQuestion`].
#[derive(Debug, Clone, Error)]
pub enum QuizParseError {
    #[error("model output contains no JSON object")]
    NoJsonObject,

    #[error("malformed quiz JSON: {0}")]
    Malformed(String),

    #[error("correct_answer must be A, B, C or D, got {0:?}")]
    InvalidAnswer(String),
}
