pub mod models;

use crate::config::KeyFromEnv;
use crate::core::{ChatReply, ChatRequest, FunctionCall, LowLevelClient};
use crate::error::{AIError, OpenAIError};
use async_trait::async_trait;
use models::OpenAIModel;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: OpenAIModel,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: OpenAIModel::default(),
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OpenAIClient {
    config: OpenAIConfig,
    http: reqwest::Client,
}

impl KeyFromEnv for OpenAIClient {
    const KEY_NAME: &'static str = "OPENAI_API_KEY";
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        info!(model = %config.model.id(), name = config.model.display_name(), "Creating new OpenAI client");
        Self { config, http: reqwest::Client::new() }
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model.id(),
            "max_tokens": self.config.max_tokens,
            "temperature": request.temperature.unwrap_or(self.config.temperature),
            "messages": request.messages,
        });
        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        if !request.functions.is_empty() {
            body["functions"] = serde_json::json!(request.functions);
            body["function_call"] = serde_json::json!("auto");
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct Choices { choices: Vec<Choice> }

#[derive(Debug, Deserialize)]
struct Choice { message: Msg }

#[derive(Debug, Deserialize)]
struct Msg {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall { name: String, arguments: String }

impl From<Msg> for ChatReply {
    fn from(msg: Msg) -> Self {
        match msg.function_call {
            Some(call) => ChatReply::FunctionCall(FunctionCall { name: call.name, arguments: call.arguments }),
            None => ChatReply::Text(msg.content.unwrap_or_default()),
        }
    }
}

#[async_trait]
impl LowLevelClient for OpenAIClient {
    #[instrument(skip(self, request), fields(model = %self.config.model.id(), functions = request.functions.len()))]
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AIError> {
        let body = self.request_body(&request);
        debug!("Sending request to OpenAI API");
        let resp = self.http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send().await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                AIError::OpenAI(OpenAIError::Http(e.to_string()))
            })?;

        debug!(status = %resp.status(), "Received response from OpenAI API");
        if resp.status() == 401 {
            error!("OpenAI API authentication failed");
            return Err(AIError::OpenAI(OpenAIError::Authentication));
        }
        if resp.status() == 429 {
            warn!("OpenAI API rate limit exceeded");
            return Err(AIError::OpenAI(OpenAIError::RateLimit));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let txt = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %txt, "OpenAI API error");
            return Err(AIError::OpenAI(OpenAIError::Api(txt)));
        }

        let parsed: Choices = resp.json().await
            .map_err(|e| AIError::OpenAI(OpenAIError::Http(e.to_string())))?;
        let message = parsed.choices.into_iter().next()
            .map(|c| c.message)
            .ok_or_else(|| AIError::OpenAI(OpenAIError::Api("No choices in response".into())))?;

        let reply = ChatReply::from(message);
        match &reply {
            ChatReply::Text(text) => info!(response_len = text.len(), "Received text reply"),
            ChatReply::FunctionCall(call) => info!(function = %call.name, "Received function call"),
        }
        Ok(reply)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> { Box::new(self.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionSpec;

    fn client() -> OpenAIClient {
        OpenAIClient::new(OpenAIConfig { api_key: "test".into(), ..OpenAIConfig::default() })
    }

    #[test]
    fn plain_request_has_no_function_fields() {
        let body = client().request_body(&ChatRequest::new("sys", "hi"));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!(body.get("functions").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn function_request_sets_auto_call_and_temperature() {
        let function = FunctionSpec {
            name: "generate_quiz".into(),
            description: "d".into(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let request = ChatRequest::new("sys", "hi")
            .with_functions(vec![function])
            .with_temperature(0.0)
            .json_object();
        let body = client().request_body(&request);
        assert_eq!(body["functions"][0]["name"], "generate_quiz");
        assert_eq!(body["function_call"], "auto");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn function_call_message_wins_over_content() {
        let raw = r#"{"choices":[{"message":{"content":null,"function_call":{"name":"generate_quiz","arguments":"{\"topic\":\"x\"}"}}}]}"#;
        let parsed: Choices = serde_json::from_str(raw).unwrap();
        let reply = ChatReply::from(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(
            reply,
            ChatReply::FunctionCall(FunctionCall { name: "generate_quiz".into(), arguments: "{\"topic\":\"x\"}".into() })
        );
    }

    #[test]
    fn missing_content_becomes_empty_text() {
        let parsed: Choices = serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        let reply = ChatReply::from(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(reply, ChatReply::Text(String::new()));
    }
}
