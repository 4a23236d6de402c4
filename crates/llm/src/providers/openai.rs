use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{CompletionParams, LlmError, Message, Role, SummarizationClient};

const TOP_P: f32 = 0.7;

/// Client for any OpenAI-compatible `chat/completions` endpoint
/// (OpenAI, Together, vLLM, llama.cpp server, ...).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    /// `base_url` includes the version segment, e.g. `https://api.openai.com/v1`.
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SummarizationClient for OpenAiProvider {
    async fn summarize(
        &self,
        messages: Vec<Message>,
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let body = json!({
            "model": self.model,
            "messages": api_messages,
            "max_tokens": params.max_gen_length,
            "stop": params.stop,
            "temperature": params.temperature,
            "top_p": TOP_P,
            "stream": false,
        });

        debug!("OpenAI-compatible request to {}", url);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn params() -> CompletionParams {
        CompletionParams {
            stop: vec!["<|eot_id|>".into()],
            max_gen_length: 2048,
            temperature: 0.1,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn sends_messages_and_generation_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "llama-3",
                "max_tokens": 2048,
                "stop": ["<|eot_id|>"],
                "stream": false,
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "chunk" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"summary": "ok"}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(
            Some("sk-test".into()),
            "llama-3".into(),
            format!("{}/v1/", server.uri()),
        );
        let out = provider
            .summarize(vec![Message::system("sys"), Message::user("chunk")], &params())
            .await
            .unwrap();
        assert_eq!(out, r#"{"summary": "ok"}"#);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(None, "m".into(), server.uri());
        let err = provider
            .summarize(vec![Message::user("x")], &params())
            .await
            .unwrap_err();
        match err {
            LlmError::ApiError { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn null_content_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(None, "m".into(), server.uri());
        let err = provider
            .summarize(vec![Message::user("x")], &params())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }
}
