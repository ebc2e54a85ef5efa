use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LlmError;
use crate::prompts::render_system_prompt;
use crate::traits::AnswerGenerator;

pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";
pub const COMPLETION_MODEL: &str = "llama3-70b-8192";
pub const COMPLETION_TEMPERATURE: f32 = 0.0;
pub const MAX_COMPLETION_TOKENS: u32 = 1024;

/// Chat-completions client (OpenAI wire format, served by Groq).
///
/// The API key is optional at construction so a missing credential
/// surfaces per request instead of aborting startup; generation simply
/// fails until the key is provided.
pub struct GroqGenerator {
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl GroqGenerator {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, LlmError> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            endpoint,
            api_key,
            model: COMPLETION_MODEL.to_string(),
            client: Client::new(),
        })
    }
}

#[async_trait]
impl AnswerGenerator for GroqGenerator {
    async fn answer(&self, question: &str, context: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredential("GROQ_API_KEY"))?;

        let request = build_request(&self.model, question, context);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.to_string(),
                details,
            });
        }

        let payload: ChatResponse = response.json().await?;
        first_choice(payload)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

fn build_request<'a>(model: &'a str, question: &str, context: &str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        temperature: COMPLETION_TEMPERATURE,
        max_tokens: MAX_COMPLETION_TOKENS,
        messages: vec![
            ChatMessage {
                role: "system",
                content: render_system_prompt(context),
            },
            ChatMessage {
                role: "user",
                content: question.to_string(),
            },
        ],
    }
}

fn first_choice(payload: ChatResponse) -> Result<String, LlmError> {
    payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(LlmError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_pins_model_temperature_and_token_budget() {
        let request = build_request(COMPLETION_MODEL, "When is the exam?", "Exam: week 9.");
        let body = serde_json::to_value(&request).expect("request should serialize");

        assert_eq!(body["model"], "llama3-70b-8192");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn request_sends_system_then_user() {
        let request = build_request(COMPLETION_MODEL, "When is the exam?", "Exam: week 9.");
        let body = serde_json::to_value(&request).expect("request should serialize");
        let messages = body["messages"].as_array().expect("messages array");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "When is the exam?");

        let system = messages[0]["content"].as_str().expect("system content");
        assert!(system.contains("Exam: week 9."));
        assert!(system.contains("I don't know the answer to that based on the syllabus."));
    }

    #[test]
    fn first_choice_takes_the_assistant_content() {
        let payload: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Week 9." } }
            ]
        }))
        .expect("response should deserialize");

        assert_eq!(first_choice(payload).expect("one choice"), "Week 9.");
    }

    #[test]
    fn empty_choices_are_an_error() {
        let payload: ChatResponse =
            serde_json::from_value(serde_json::json!({ "choices": [] }))
                .expect("response should deserialize");
        assert!(matches!(first_choice(payload), Err(LlmError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let generator =
            GroqGenerator::new(DEFAULT_GROQ_URL, None).expect("url should parse");
        let result = generator.answer("When is the exam?", "").await;
        assert!(matches!(
            result,
            Err(LlmError::MissingCredential("GROQ_API_KEY"))
        ));
    }
}
