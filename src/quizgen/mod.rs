//! Question generation boundary.
//!
//! Quizzes come from chat-completion APIs. Each backend implements
//! [`QuestionSource`]; a [`SourceChain`] tries them in fixed priority order
//! and gives up only when every source has failed. Model output is free
//! text; the first JSON array found in it is parsed and shape-checked.

mod gemini;
mod openai_compat;

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub use gemini::GeminiSource;
pub use openai_compat::OpenAiCompatSource;

use crate::state::room::{Difficulty, Question};

/// Answer options every generated question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// What to generate a quiz about.
#[derive(Debug, Clone)]
pub struct QuizRequest {
    /// Free-text topic; ignored when `source_text` is set.
    pub topic: String,
    /// Difficulty the prompt is tuned for.
    pub difficulty: Difficulty,
    /// Number of questions to produce.
    pub count: u32,
    /// When set, questions are drawn only from this text.
    pub source_text: Option<String>,
}

/// A parsed, shape-checked quiz.
#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    /// The questions, each with four options and an in-range answer index.
    pub questions: Vec<Question>,
    /// Label of the source that produced them, for logging and display.
    pub source_label: String,
}

/// Failures of one source or of the whole chain.
#[derive(Debug, Error)]
pub enum QuizGenError {
    /// The HTTP call itself failed.
    #[error("request to {provider} failed")]
    Request {
        /// Provider label.
        provider: &'static str,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("{provider} returned status {status}")]
    Status {
        /// Provider label.
        provider: &'static str,
        /// HTTP status received.
        status: u16,
    },
    /// The completion contained no parseable question array.
    #[error("{provider} returned no usable question array: {reason}")]
    BadCompletion {
        /// Provider label.
        provider: &'static str,
        /// What was wrong with the payload.
        reason: String,
    },
    /// Every configured source failed.
    #[error("all {attempted} question source(s) failed")]
    AllSourcesFailed {
        /// Number of sources tried.
        attempted: usize,
    },
    /// No source is configured at all.
    #[error("no question source configured")]
    NoSources,
}

/// One quiz-producing backend.
pub trait QuestionSource: Send + Sync {
    /// Generate a quiz for the request.
    fn generate(&self, request: QuizRequest) -> BoxFuture<'_, Result<GeneratedQuiz, QuizGenError>>;
    /// Stable label used in logs and the `source_label` field.
    fn label(&self) -> &'static str;
}

/// Ordered fallback over several sources.
pub struct SourceChain {
    sources: Vec<Box<dyn QuestionSource>>,
}

impl SourceChain {
    /// Build a chain; order is priority order.
    pub fn new(sources: Vec<Box<dyn QuestionSource>>) -> Self {
        Self { sources }
    }

    /// Assemble the chain from the environment: Groq, then OpenRouter, then
    /// Gemini, each included only when its API key is set.
    pub fn from_env() -> Self {
        let mut sources: Vec<Box<dyn QuestionSource>> = Vec::new();
        if let Some(key) = non_empty_env("GROQ_API_KEY") {
            sources.push(Box::new(OpenAiCompatSource::groq(key)));
        }
        if let Some(key) = non_empty_env("OPENROUTER_API_KEY") {
            sources.push(Box::new(OpenAiCompatSource::openrouter(key)));
        }
        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            sources.push(Box::new(GeminiSource::new(key)));
        }
        Self::new(sources)
    }

    /// Number of configured sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is configured.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Try each source in order; the first success wins.
    pub async fn generate(&self, request: QuizRequest) -> Result<GeneratedQuiz, QuizGenError> {
        if self.sources.is_empty() {
            return Err(QuizGenError::NoSources);
        }

        for source in &self.sources {
            match source.generate(request.clone()).await {
                Ok(quiz) => {
                    info!(source = source.label(), count = quiz.questions.len(), "quiz generated");
                    return Ok(quiz);
                }
                Err(err) => {
                    warn!(source = source.label(), error = %err, "question source failed; trying next");
                }
            }
        }

        Err(QuizGenError::AllSourcesFailed {
            attempted: self.sources.len(),
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

fn difficulty_guide(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Basic concepts, simple recall, fundamental definitions",
        Difficulty::Medium => {
            "Application of concepts, moderate problem-solving, connections between ideas"
        }
        Difficulty::Hard => {
            "Complex analysis, advanced problem-solving, synthesis of multiple concepts"
        }
    }
}

/// Build the completion prompt. Mirrors the shape the sources were tuned
/// against: topic or source-text mode, a difficulty guide, and a strict
/// JSON-array output contract.
pub(crate) fn build_prompt(request: &QuizRequest) -> String {
    let subject = match &request.source_text {
        Some(text) => format!("based ONLY on this content:\n\n{text}\n\n"),
        None => format!("on the topic \"{}\"", request.topic),
    };
    let level_hint = if request.source_text.is_none() {
        format!(
            "\nFor {}:\n- Easy: Grade 6-8 level concepts\n- Medium: High school level analysis\n- Hard: College/advanced level thinking\n",
            request.topic
        )
    } else {
        String::new()
    };

    format!(
        "You are a professional quiz creator. Generate {count} multiple-choice questions {subject}\n\
         Difficulty: {difficulty} ({guide})\n\
         {level_hint}\n\
         IMPORTANT:\n\
         - Double-check all calculations and facts for accuracy\n\
         - Ensure the correct answer is actually correct\n\
         - Make plausible but incorrect distractors\n\
         - Each question must have exactly one correct answer\n\n\
         Return ONLY valid JSON array:\n\
         [\n  {{\n    \"question\": \"Question text?\",\n    \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n    \"correct\": 0\n  }}\n]\n",
        count = request.count,
        difficulty = request.difficulty.as_str(),
        guide = difficulty_guide(request.difficulty),
    )
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct: usize,
}

/// Extract the first JSON array from completion text and validate its shape.
pub(crate) fn parse_questions(
    provider: &'static str,
    completion: &str,
) -> Result<Vec<Question>, QuizGenError> {
    let start = completion
        .find('[')
        .ok_or_else(|| QuizGenError::BadCompletion {
            provider,
            reason: "no JSON array in completion".to_owned(),
        })?;
    let end = completion
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| QuizGenError::BadCompletion {
            provider,
            reason: "unterminated JSON array in completion".to_owned(),
        })?;

    let raw: Vec<RawQuestion> =
        serde_json::from_str(&completion[start..=end]).map_err(|err| {
            QuizGenError::BadCompletion {
                provider,
                reason: format!("array did not parse: {err}"),
            }
        })?;

    if raw.is_empty() {
        return Err(QuizGenError::BadCompletion {
            provider,
            reason: "empty question array".to_owned(),
        });
    }

    raw.into_iter()
        .map(|question| {
            if question.options.len() != OPTIONS_PER_QUESTION {
                return Err(QuizGenError::BadCompletion {
                    provider,
                    reason: format!(
                        "expected {OPTIONS_PER_QUESTION} options, got {}",
                        question.options.len()
                    ),
                });
            }
            if question.correct >= question.options.len() {
                return Err(QuizGenError::BadCompletion {
                    provider,
                    reason: format!("correct index {} out of range", question.correct),
                });
            }
            Ok(Question {
                text: question.question,
                options: question.options,
                correct: question.correct,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuizRequest {
        QuizRequest {
            topic: "Astronomy".into(),
            difficulty: Difficulty::Medium,
            count: 5,
            source_text: None,
        }
    }

    struct StubSource {
        label: &'static str,
        fail: bool,
    }

    impl QuestionSource for StubSource {
        fn generate(
            &self,
            _request: QuizRequest,
        ) -> BoxFuture<'_, Result<GeneratedQuiz, QuizGenError>> {
            Box::pin(async move {
                if self.fail {
                    Err(QuizGenError::Status {
                        provider: self.label,
                        status: 500,
                    })
                } else {
                    Ok(GeneratedQuiz {
                        questions: vec![Question {
                            text: "Which planet is largest?".into(),
                            options: vec![
                                "Mars".into(),
                                "Jupiter".into(),
                                "Venus".into(),
                                "Saturn".into(),
                            ],
                            correct: 1,
                        }],
                        source_label: self.label.to_owned(),
                    })
                }
            })
        }

        fn label(&self) -> &'static str {
            self.label
        }
    }

    #[tokio::test]
    async fn chain_falls_through_to_first_success() {
        let chain = SourceChain::new(vec![
            Box::new(StubSource {
                label: "primary",
                fail: true,
            }),
            Box::new(StubSource {
                label: "fallback",
                fail: false,
            }),
        ]);
        let quiz = chain.generate(request()).await.unwrap();
        assert_eq!(quiz.source_label, "fallback");
    }

    #[tokio::test]
    async fn chain_reports_total_failure() {
        let chain = SourceChain::new(vec![
            Box::new(StubSource {
                label: "primary",
                fail: true,
            }),
            Box::new(StubSource {
                label: "fallback",
                fail: true,
            }),
        ]);
        let err = chain.generate(request()).await.unwrap_err();
        assert!(matches!(err, QuizGenError::AllSourcesFailed { attempted: 2 }));
    }

    #[tokio::test]
    async fn empty_chain_is_its_own_error() {
        let chain = SourceChain::new(Vec::new());
        let err = chain.generate(request()).await.unwrap_err();
        assert!(matches!(err, QuizGenError::NoSources));
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let completion = r#"Here is your quiz:
[
  {"question": "2 + 2?", "options": ["1", "2", "3", "4"], "correct": 3}
]
Enjoy!"#;
        let questions = parse_questions("test", completion).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct, 3);
        assert_eq!(questions[0].options.len(), 4);
    }

    #[test]
    fn rejects_wrong_option_count() {
        let completion = r#"[{"question": "Q?", "options": ["a", "b"], "correct": 0}]"#;
        assert!(matches!(
            parse_questions("test", completion),
            Err(QuizGenError::BadCompletion { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_answer_index() {
        let completion = r#"[{"question": "Q?", "options": ["a", "b", "c", "d"], "correct": 4}]"#;
        assert!(matches!(
            parse_questions("test", completion),
            Err(QuizGenError::BadCompletion { .. })
        ));
    }

    #[test]
    fn rejects_completion_without_array() {
        assert!(matches!(
            parse_questions("test", "Sorry, I cannot help with that."),
            Err(QuizGenError::BadCompletion { .. })
        ));
    }

    #[test]
    fn errors_name_the_provider_in_their_message() {
        let status = QuizGenError::Status {
            provider: "groq",
            status: 429,
        };
        assert_eq!(status.to_string(), "groq returned status 429");

        let err = parse_questions("gemini", "no json here").unwrap_err();
        assert!(err.to_string().starts_with("gemini returned no usable question array"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn prompt_switches_to_source_text_mode() {
        let mut req = request();
        let topical = build_prompt(&req);
        assert!(topical.contains("on the topic \"Astronomy\""));
        assert!(topical.contains("Grade 6-8"));

        req.source_text = Some("The mitochondria is the powerhouse of the cell.".into());
        let sourced = build_prompt(&req);
        assert!(sourced.contains("based ONLY on this content"));
        assert!(!sourced.contains("Grade 6-8"));
    }
}
