//! Google Gemini source, the last fallback in the chain.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::{GeneratedQuiz, QuestionSource, QuizGenError, QuizRequest, build_prompt, parse_questions};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);
const GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
const LABEL: &str = "gemini";

/// `generateContent` source authenticated by query-string key.
pub struct GeminiSource {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiSource {
    /// Build a source with an API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn request(&self, request: QuizRequest) -> Result<GeneratedQuiz, QuizGenError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(&request) }] }],
        });

        let response = self
            .client
            .post(GENERATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|source| QuizGenError::Request {
                provider: LABEL,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizGenError::Status {
                provider: LABEL,
                status: status.as_u16(),
            });
        }

        let completion: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|source| QuizGenError::Request {
                    provider: LABEL,
                    source,
                })?;
        let content = completion
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| QuizGenError::BadCompletion {
                provider: LABEL,
                reason: "no candidates in response".to_owned(),
            })?;

        Ok(GeneratedQuiz {
            questions: parse_questions(LABEL, &content)?,
            source_label: LABEL.to_owned(),
        })
    }
}

impl QuestionSource for GeminiSource {
    fn generate(&self, request: QuizRequest) -> BoxFuture<'_, Result<GeneratedQuiz, QuizGenError>> {
        Box::pin(self.request(request))
    }

    fn label(&self) -> &'static str {
        LABEL
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}
