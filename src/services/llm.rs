use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini", "ollama" or "openai"
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    /// Falls back to `GEMINI_API_KEY` when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// Falls back to `OPENAI_API_KEY` when empty.
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn resolve_key(configured: &str, env_var: &str) -> Result<String> {
    if !configured.trim().is_empty() {
        return Ok(configured.to_string());
    }
    std::env::var(env_var)
        .with_context(|| format!("No API key configured and {} is not set", env_var))
}

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

pub fn create_llm(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider.as_str() {
        "gemini" => {
            let cfg = config.gemini.as_ref().context("Gemini config missing")?;
            let key = resolve_key(&cfg.api_key, "GEMINI_API_KEY")?;
            Ok(Box::new(GeminiClient::new(&key, &cfg.model)))
        }
        "ollama" => {
            let cfg = config.ollama.as_ref().context("Ollama config missing")?;
            Ok(Box::new(OllamaClient::new(&cfg.base_url, &cfg.model)))
        }
        "openai" => {
            let cfg = config.openai.as_ref().context("OpenAI config missing")?;
            let key = resolve_key(&cfg.api_key, "OPENAI_API_KEY")?;
            Ok(Box::new(OpenAIClient::new(&key, &cfg.model, cfg.base_url.as_deref())))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.provider)),
    }
}

/// POSTs `body` and decodes the reply, keeping the raw text around for error messages.
async fn post_json<B: Serialize, R: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    body: &B,
    provider: &str,
) -> Result<R> {
    let resp = request.json(body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let error_text = resp.text().await?;
        return Err(anyhow!("{} API error ({}): {}", provider, status, error_text));
    }

    let text = resp.text().await?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} response. Body: {}", provider, text))
}

// --- Gemini ---

#[derive(Debug)]
struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiContent,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiResponse {
    fn into_text(self) -> Result<String> {
        if let Some(err) = self.error {
            return Err(anyhow!("Gemini API returned error: {}", err.message));
        }
        let first = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .context("Gemini response contained no candidates")?;
        let reason = first.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        first
            .content
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow!("Gemini response empty. Finish reason: {}", reason))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: user.to_string(),
                }],
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system.to_string(),
                }],
            },
        };

        let result: GeminiResponse = post_json(self.client.post(&url), &body, "Gemini").await?;
        result.into_text()
    }
}

// --- Ollama ---

#[derive(Debug)]
struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Both Ollama and OpenAI-compatible servers take role-tagged messages.
#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

fn system_and_user(system: &str, user: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: Some(system.to_string()),
        },
        ChatMessage {
            role: "user".to_string(),
            content: Some(user.to_string()),
        },
    ]
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: ChatMessage,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaRequest {
            model: self.model.clone(),
            messages: system_and_user(system, user),
            stream: false,
        };

        let result: OllamaResponse = post_json(self.client.post(&url), &body, "Ollama").await?;
        result
            .message
            .content
            .ok_or_else(|| anyhow!("Ollama response missing content"))
    }
}

// --- OpenAI ---

#[derive(Debug)]
struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: ChatMessage,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAIRequest {
            model: self.model.clone(),
            messages: system_and_user(system, user),
        };

        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let result: OpenAIResponse = post_json(request, &body, "OpenAI").await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response empty or missing content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_safety_block_reports_finish_reason() {
        let json = r#"{ "candidates": [ { "finishReason": "SAFETY", "index": 0 } ] }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = result.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_gemini_content_without_parts_is_an_error() {
        let json = r#"{
            "candidates": [
                { "content": { "role": "model" }, "finishReason": "STOP", "index": 0 }
            ]
        }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(result.into_text().is_err());
    }

    #[test]
    fn test_gemini_error_payload() {
        let json = r#"{ "error": { "code": 400, "message": "API key not valid" } }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = result.into_text().unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_gemini_success() {
        let json = r#"{
            "candidates": [
                {
                    "content": { "parts": [ { "text": "Acme makes picking effortless." } ], "role": "model" },
                    "finishReason": "STOP",
                    "index": 0
                }
            ]
        }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.into_text().unwrap(), "Acme makes picking effortless.");
    }

    #[test]
    fn test_gemini_request_shape() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: "hi".to_string(),
                }],
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: "sys".to_string(),
                }],
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert!(value["system_instruction"].get("role").is_none());
        assert_eq!(value["system_instruction"]["parts"][0]["text"], "sys");
    }

    #[test]
    fn test_openai_response_parsing() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Seed-stage robotics, done right." },
                "finish_reason": "stop"
            }]
        }"#;
        let result: OpenAIResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.choices[0].message.content.as_deref(),
            Some("Seed-stage robotics, done right.")
        );
    }

    #[test]
    fn test_ollama_response_parsing() {
        let json = r#"{ "model": "llama3", "message": { "role": "assistant", "content": "ok" }, "done": true }"#;
        let result: OllamaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.message.content.as_deref(), Some("ok"));
    }

    #[test]
    fn test_create_llm_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "parrot".to_string(),
            gemini: None,
            ollama: None,
            openai: None,
        };
        let err = create_llm(&config).unwrap_err();
        assert!(err.to_string().contains("parrot"));
    }

    #[test]
    fn test_create_llm_prefers_configured_key() {
        let config = LlmConfig {
            provider: "gemini".to_string(),
            gemini: Some(GeminiConfig {
                api_key: "configured".to_string(),
                model: default_gemini_model(),
            }),
            ollama: None,
            openai: None,
        };
        assert!(create_llm(&config).is_ok());
        assert_eq!(resolve_key("configured", "UNUSED_ENV_VAR").unwrap(), "configured");
    }
}
