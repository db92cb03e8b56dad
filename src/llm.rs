//! Completion service client
//!
//! One user message in, one generated reply out. No history is kept between
//! calls and no timeout is applied.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::{Error, Result};

/// Produces a reply to freeform text
#[async_trait(?Send)]
pub trait ResponseGenerator {
    /// Generate a reply to `text`
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` if the service call fails
    async fn complete(&self, text: &str) -> Result<String>;
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletion {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl ChatCompletion {
    /// Create a chat completions client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: Option<SecretString>, config: &LlmConfig) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            Error::Config("OpenAI API key required for completions".to_string())
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait(?Send)]
impl ResponseGenerator for ChatCompletion {
    async fn complete(&self, text: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: text,
            }],
        };

        tracing::debug!(model = %self.model, "requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "completion API error {status}: {body}"
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("failed to parse completion response: {e}")))?;

        let reply = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Upstream("completion response had no content".to_string()))?;

        tracing::info!(reply = %reply, "completion received");
        Ok(reply)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client_for(url: &str) -> ChatCompletion {
        let config = LlmConfig {
            model: "gpt-4".to_string(),
            base_url: format!("{url}/"),
        };
        ChatCompletion::new(Some(SecretString::from("sk-test".to_string())), &config).unwrap()
    }

    #[test]
    fn test_missing_key_rejected() {
        let config = LlmConfig {
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        };
        assert!(matches!(
            ChatCompletion::new(None, &config),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_single_user_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4",
                "messages": [{"role": "user", "content": "what is the weather"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Sunny."}}]}"#)
            .create_async()
            .await;

        let reply = client_for(&server.url())
            .complete("what is the weather")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Sunny.");
    }

    #[tokio::test]
    async fn test_api_error_is_upstream() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_upstream() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream() {
        let err = client_for("http://127.0.0.1:1").complete("hi").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
