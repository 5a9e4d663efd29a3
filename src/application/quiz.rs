//! Quiz service - question generation from the knowledge bank.
//!
//! Picks a random chunk of the requested category, asks the model for a
//! single-choice question as a JSON object, and holds the parsed question
//! per user until they answer it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::UserId;
use crate::domain::quiz::{AnswerChoice, KnowledgeChunk, QuizParseError, QuizQuestion};
use crate::ports::{BankError, ChatModel, CompletionRequest, KnowledgeBank, ModelError, ModelRole};

/// System prompt for quiz generation.
const QUIZ_SYSTEM_PROMPT: &str = "You are an experienced teacher who writes single-choice \
exam questions. Answer strictly with the requested JSON object and nothing else.";

/// Quiz failures. Bank variants are user-reportable; model and parse
/// failures are logged and surfaced as a generic apology.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("question generation failed: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] QuizParseError),

    #[error("no question is waiting for an answer")]
    NoPendingQuestion,
}

/// Result of answering a pending question.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub selected: AnswerChoice,
    pub question: QuizQuestion,
}

/// Quiz generation and answering service.
pub struct QuizService {
    model: Arc<dyn ChatModel>,
    bank: Arc<dyn KnowledgeBank>,
    quiz_model: String,
    /// One open question per user; replaced by a new `/quiz`, consumed
    /// by an answer.
    pending: Mutex<HashMap<UserId, QuizQuestion>>,
}

impl QuizService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        bank: Arc<dyn KnowledgeBank>,
        quiz_model: impl Into<String>,
    ) -> Self {
        Self {
            model,
            bank,
            quiz_model: quiz_model.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Generates a question for `user` from `category` and parks it until
    /// answered.
    pub async fn make_question(
        &self,
        user: UserId,
        category: &str,
    ) -> Result<QuizQuestion, QuizError> {
        let chunk = self.bank.pick(category).await?;

        let request = CompletionRequest::new()
            .with_model(&self.quiz_model)
            .with_system_prompt(QUIZ_SYSTEM_PROMPT)
            .with_message(ModelRole::User, build_prompt(&chunk))
            .with_json_output();

        let completion = self.model.complete(request).await?;
        let question = QuizQuestion::from_model_output(&completion.content)?;

        tracing::info!(user = %user, category, source = %chunk.source, "quiz question generated");
        self.pending.lock().unwrap().insert(user, question.clone());
        Ok(question)
    }

    /// Checks `choice` against the user's pending question, consuming it.
    pub fn answer(&self, user: UserId, choice: AnswerChoice) -> Result<AnswerOutcome, QuizError> {
        let question = self
            .pending
            .lock()
            .unwrap()
            .remove(&user)
            .ok_or(QuizError::NoPendingQuestion)?;

        Ok(AnswerOutcome {
            correct: question.check(choice),
            selected: choice,
            question,
        })
    }

    /// Whether `user` has an unanswered question.
    pub fn has_pending(&self, user: UserId) -> bool {
        self.pending.lock().unwrap().contains_key(&user)
    }
}

/// The question-writing prompt for one chunk.
fn build_prompt(chunk: &KnowledgeChunk) -> String {
    format!(
        "Subject: {category}\n\
Reference source: {source}\n\
Reference material:\n{content}\n\n\
Task: based only on the reference material, write one single-choice question as a JSON \
object with these fields:\n\
- question: the question text\n\
- option_a / option_b / option_c / option_d: the option texts (no letter prefixes)\n\
- correct_answer: exactly one letter, A, B, C or D\n\
- explanation: why the correct answer is right\n\n\
Rules:\n\
1. Write in the same language as the reference material.\n\
2. Test understanding of a concept, not rote recall.\n\
3. Keep the question and explanation strictly within the reference material.\n\
4. All options must be plausible and internally consistent.\n\
5. Keep the wording clear and direct.",
        category = chunk.category,
        source = chunk.source,
        content = chunk.content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::MockChatModel;
    use crate::ports::BankStats;
    use async_trait::async_trait;

    /// Bank with exactly one category holding zero or more chunks.
    struct FixedBank {
        category: String,
        chunks: Vec<KnowledgeChunk>,
    }

    #[async_trait]
    impl KnowledgeBank for FixedBank {
        async fn reload(&self) -> Result<BankStats, BankError> {
            Ok(BankStats {
                categories: 1,
                chunks: self.chunks.len(),
            })
        }

        async fn categories(&self) -> Vec<String> {
            vec![self.category.clone()]
        }

        async fn chunk_count(&self, category: &str) -> usize {
            if category == self.category {
                self.chunks.len()
            } else {
                0
            }
        }

        async fn pick(&self, category: &str) -> Result<KnowledgeChunk, BankError> {
            if category != self.category {
                return Err(BankError::UnknownCategory(category.to_string()));
            }
            self.chunks
                .first()
                .cloned()
                .ok_or_else(|| BankError::EmptyCategory(category.to_string()))
        }
    }

    const QUESTION_JSON: &str = r#"{
        "question": "What completed the Grand Canal?",
        "option_a": "The Han dynasty",
        "option_b": "The Sui dynasty",
        "option_c": "The Tang dynasty",
        "option_d": "The Song dynasty",
        "correct_answer": "B",
        "explanation": "It was completed under the Sui."
    }"#;

    fn chunk() -> KnowledgeChunk {
        KnowledgeChunk {
            category: "歷史".to_string(),
            source: "dynasties.txt".to_string(),
            content: "The Grand Canal was completed under the Sui dynasty.".to_string(),
        }
    }

    fn user() -> UserId {
        UserId::new(3)
    }

    fn service_with(model: MockChatModel, chunks: Vec<KnowledgeChunk>) -> QuizService {
        QuizService::new(
            Arc::new(model),
            Arc::new(FixedBank {
                category: "歷史".to_string(),
                chunks,
            }),
            "quiz-model",
        )
    }

    #[tokio::test]
    async fn generates_and_parks_a_question() {
        let model = MockChatModel::new().with_reply(QUESTION_JSON);
        let service = service_with(model.clone(), vec![chunk()]);

        let question = service.make_question(user(), "歷史").await.unwrap();
        assert_eq!(question.correct_answer, AnswerChoice::B);
        assert!(service.has_pending(user()));

        // The request carried the quiz model, JSON mode, and the chunk.
        let call = &model.calls()[0];
        assert_eq!(call.model.as_deref(), Some("quiz-model"));
        assert!(call.json_output);
        assert!(call.messages[0].content.contains("Grand Canal"));
    }

    #[tokio::test]
    async fn empty_category_is_reported_without_a_model_call() {
        let model = MockChatModel::new();
        let service = service_with(model.clone(), vec![]);

        let result = service.make_question(user(), "歷史").await;
        assert!(matches!(
            result,
            Err(QuizError::Bank(BankError::EmptyCategory(_)))
        ));
        assert_eq!(model.call_count(), 0);
        assert!(!service.has_pending(user()));
    }

    #[tokio::test]
    async fn unknown_category_is_reported() {
        let service = service_with(MockChatModel::new(), vec![chunk()]);
        assert!(matches!(
            service.make_question(user(), "chemistry").await,
            Err(QuizError::Bank(BankError::UnknownCategory(_)))
        ));
    }

    #[tokio::test]
    async fn malformed_model_output_is_a_parse_error() {
        let model = MockChatModel::new().with_reply("no json here");
        let service = service_with(model, vec![chunk()]);

        assert!(matches!(
            service.make_question(user(), "歷史").await,
            Err(QuizError::Parse(_))
        ));
        assert!(!service.has_pending(user()));
    }

    #[tokio::test]
    async fn answering_consumes_the_pending_question() {
        let model = MockChatModel::new().with_reply(QUESTION_JSON);
        let service = service_with(model, vec![chunk()]);
        service.make_question(user(), "歷史").await.unwrap();

        let outcome = service.answer(user(), AnswerChoice::B).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.selected, AnswerChoice::B);

        // Second answer has nothing to check.
        assert!(matches!(
            service.answer(user(), AnswerChoice::A),
            Err(QuizError::NoPendingQuestion)
        ));
    }

    #[tokio::test]
    async fn wrong_answer_reports_the_right_one() {
        let model = MockChatModel::new().with_reply(QUESTION_JSON);
        let service = service_with(model, vec![chunk()]);
        service.make_question(user(), "歷史").await.unwrap();

        let outcome = service.answer(user(), AnswerChoice::D).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.question.correct_answer, AnswerChoice::B);
    }

    #[test]
    fn answer_without_question_is_reported() {
        let service = service_with(MockChatModel::new(), vec![chunk()]);
        assert!(matches!(
            service.answer(user(), AnswerChoice::A),
            Err(QuizError::NoPendingQuestion)
        ));
    }
}
