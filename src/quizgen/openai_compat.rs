//! Chat-completion sources speaking the OpenAI wire shape (Groq, OpenRouter).

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::{GeneratedQuiz, QuestionSource, QuizGenError, QuizRequest, build_prompt, parse_questions};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// A `POST {base_url}/chat/completions` source with bearer-token auth.
pub struct OpenAiCompatSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    label: &'static str,
}

impl OpenAiCompatSource {
    /// Groq, the primary source.
    pub fn groq(api_key: String) -> Self {
        Self::new(
            "https://api.groq.com/openai/v1",
            api_key,
            "llama-3.1-8b-instant",
            "groq",
        )
    }

    /// OpenRouter, the first fallback.
    pub fn openrouter(api_key: String) -> Self {
        Self::new(
            "https://openrouter.ai/api/v1",
            api_key,
            "openai/gpt-4o-mini",
            "openrouter",
        )
    }

    fn new(base_url: &str, api_key: String, model: &str, label: &'static str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_owned(),
            api_key,
            model: model.to_owned(),
            label,
        }
    }

    async fn request(&self, request: QuizRequest) -> Result<GeneratedQuiz, QuizGenError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": build_prompt(&request) }],
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|source| QuizGenError::Request {
                provider: self.label,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizGenError::Status {
                provider: self.label,
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletion =
            response
                .json()
                .await
                .map_err(|source| QuizGenError::Request {
                    provider: self.label,
                    source,
                })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| QuizGenError::BadCompletion {
                provider: self.label,
                reason: "no choices in response".to_owned(),
            })?;

        Ok(GeneratedQuiz {
            questions: parse_questions(self.label, &content)?,
            source_label: self.label.to_owned(),
        })
    }
}

impl QuestionSource for OpenAiCompatSource {
    fn generate(&self, request: QuizRequest) -> BoxFuture<'_, Result<GeneratedQuiz, QuizGenError>> {
        Box::pin(self.request(request))
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}
