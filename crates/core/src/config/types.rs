use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::ocr::PollingPolicy;
use crate::provider::RetryPolicy;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub polling: PollingPolicy,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub substitution: SubstitutionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u32 {
    30
}

// ============================================================================
// Assistant
// ============================================================================

/// Conversational assistant configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    /// Domain keywords for the knowledge-base gate. Built-in list when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Knowledge-base answers must score strictly above this (0-100).
    #[serde(default = "default_kb_min_confidence")]
    pub kb_min_confidence: f32,
    /// Knowledge-base answers must be strictly longer than this.
    #[serde(default = "default_kb_min_answer_chars")]
    pub kb_min_answer_chars: usize,
    /// General-purpose completion provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionConfig>,
    /// Domain knowledge-base provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<KnowledgeBaseConfig>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            keywords: None,
            kb_min_confidence: default_kb_min_confidence(),
            kb_min_answer_chars: default_kb_min_answer_chars(),
            completion: None,
            knowledge_base: None,
        }
    }
}

fn default_kb_min_confidence() -> f32 {
    60.0
}

fn default_kb_min_answer_chars() -> usize {
    20
}

/// Wire protocol of the general completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionApi {
    /// OpenAI-compatible `/v1/chat/completions`.
    #[default]
    OpenAi,
    /// Anthropic `/v1/messages`.
    Anthropic,
    /// Local Ollama `/api/chat`.
    Ollama,
}

impl CompletionApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionApi::OpenAi => "openai",
            CompletionApi::Anthropic => "anthropic",
            CompletionApi::Ollama => "ollama",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            CompletionApi::OpenAi => "https://api.openai.com",
            CompletionApi::Anthropic => "https://api.anthropic.com",
            CompletionApi::Ollama => "http://localhost:11434",
        }
    }

    /// Ollama runs locally without credentials.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, CompletionApi::Ollama)
    }
}

/// General completion client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub api: CompletionApi,
    /// Model name/identifier.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

/// Knowledge-base client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeBaseConfig {
    /// Base URL; queries go to `{api_base}/query`.
    pub api_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

// ============================================================================
// OCR
// ============================================================================

/// OCR pipeline configuration. Providers without credentials are disabled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    /// Always-available deterministic provider.
    #[serde(default = "default_true")]
    pub local_fallback: bool,
    #[serde(default = "default_fallback_text")]
    pub fallback_text: String,
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f32,
    /// Request timeout in seconds for remote OCR calls.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_space: Option<OcrSpaceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_job: Option<ReadJobConfig>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            local_fallback: true,
            fallback_text: default_fallback_text(),
            fallback_confidence: default_fallback_confidence(),
            timeout_secs: default_timeout(),
            vision: None,
            ocr_space: None,
            read_job: None,
        }
    }
}

impl OcrConfig {
    /// Whether at least one provider, local fallback included, can run.
    pub fn has_any_provider(&self) -> bool {
        self.local_fallback
            || self.vision.as_ref().is_some_and(|v| !v.api_key.is_empty())
            || self.ocr_space.as_ref().is_some_and(|o| !o.api_key.is_empty())
            || self
                .read_job
                .as_ref()
                .is_some_and(|r| !r.api_key.is_empty() && !r.endpoint.is_empty())
    }
}

fn default_true() -> bool {
    true
}

fn default_fallback_text() -> String {
    "Text could not be read automatically. Please enter it manually.".to_string()
}

fn default_fallback_confidence() -> f32 {
    10.0
}

/// Document text detection API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VisionConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Form-upload OCR API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrSpaceConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// This API reports no confidence; results are scored with this value.
    #[serde(default = "default_assumed_confidence")]
    pub assumed_confidence: f32,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_assumed_confidence() -> f32 {
    75.0
}

/// Asynchronous read-job API (submit, then poll).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadJobConfig {
    /// Resource endpoint, e.g. `https://example.cognitiveservices.azure.com`.
    pub endpoint: String,
    pub api_key: String,
}

// ============================================================================
// Substitution
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubstitutionConfig {
    /// Default cap on ranked candidates.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

// ============================================================================
// Sanitized view
// ============================================================================

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub retry: RetryPolicy,
    pub polling: PollingPolicy,
    pub assistant: SanitizedAssistantConfig,
    pub ocr: SanitizedOcrConfig,
    pub substitution: SubstitutionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAssistantConfig {
    pub custom_keywords: bool,
    pub kb_min_confidence: f32,
    pub kb_min_answer_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<SanitizedCompletionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<SanitizedEndpoint>,
}

/// Sanitized completion config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCompletionConfig {
    pub api: CompletionApi,
    pub model: String,
    pub api_base: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Any keyed endpoint with its credential hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOcrConfig {
    pub local_fallback: bool,
    pub fallback_confidence: f32,
    pub timeout_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<SanitizedEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_space: Option<SanitizedEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_job: Option<SanitizedEndpoint>,
}

fn key_configured(key: Option<&str>) -> bool {
    key.is_some_and(|k| !k.is_empty())
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let assistant = &config.assistant;
        let ocr = &config.ocr;
        Self {
            server: config.server.clone(),
            retry: config.retry.clone(),
            polling: config.polling.clone(),
            assistant: SanitizedAssistantConfig {
                custom_keywords: assistant.keywords.is_some(),
                kb_min_confidence: assistant.kb_min_confidence,
                kb_min_answer_chars: assistant.kb_min_answer_chars,
                completion: assistant
                    .completion
                    .as_ref()
                    .map(|c| SanitizedCompletionConfig {
                        api: c.api,
                        model: c.model.clone(),
                        api_base: c
                            .api_base
                            .clone()
                            .unwrap_or_else(|| c.api.default_api_base().to_string()),
                        api_key_configured: key_configured(c.api_key.as_deref()),
                        timeout_secs: c.timeout_secs,
                        max_tokens: c.max_tokens,
                        temperature: c.temperature,
                    }),
                knowledge_base: assistant.knowledge_base.as_ref().map(|kb| SanitizedEndpoint {
                    url: Some(kb.api_base.clone()),
                    api_key_configured: key_configured(kb.api_key.as_deref()),
                }),
            },
            ocr: SanitizedOcrConfig {
                local_fallback: ocr.local_fallback,
                fallback_confidence: ocr.fallback_confidence,
                timeout_secs: ocr.timeout_secs,
                vision: ocr.vision.as_ref().map(|v| SanitizedEndpoint {
                    url: v.api_base.clone(),
                    api_key_configured: key_configured(Some(&v.api_key)),
                }),
                ocr_space: ocr.ocr_space.as_ref().map(|o| SanitizedEndpoint {
                    url: o.api_base.clone(),
                    api_key_configured: key_configured(Some(&o.api_key)),
                }),
                read_job: ocr.read_job.as_ref().map(|r| SanitizedEndpoint {
                    url: Some(r.endpoint.clone()),
                    api_key_configured: key_configured(Some(&r.api_key)),
                }),
            },
            substitution: config.substitution.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.polling.max_attempts, 30);
        assert_eq!(config.assistant.kb_min_confidence, 60.0);
        assert_eq!(config.assistant.kb_min_answer_chars, 20);
        assert!(config.assistant.completion.is_none());
        assert!(config.ocr.local_fallback);
        assert_eq!(config.ocr.fallback_confidence, 10.0);
        assert_eq!(config.substitution.max_results, 10);
    }

    #[test]
    fn test_deserialize_completion_config() {
        let toml = r#"
[assistant.completion]
api = "anthropic"
model = "claude-3-haiku-20240307"
api_key = "sk-test"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let completion = config.assistant.completion.unwrap();
        assert_eq!(completion.api, CompletionApi::Anthropic);
        assert_eq!(completion.timeout_secs, 30); // default
        assert_eq!(completion.max_tokens, 1024);
        assert!((completion.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_deserialize_unknown_api_fails() {
        let toml = r#"
[assistant.completion]
api = "palm"
model = "x"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_ocr_providers() {
        let toml = r#"
[ocr]
local_fallback = false

[ocr.ocr_space]
api_key = "k"

[ocr.read_job]
endpoint = "https://read.example.com"
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let ocr_space = config.ocr.ocr_space.as_ref().unwrap();
        assert_eq!(ocr_space.language, "eng");
        assert_eq!(ocr_space.assumed_confidence, 75.0);
        assert!(config.ocr.has_any_provider());
    }

    #[test]
    fn test_has_any_provider_ignores_empty_keys() {
        let ocr = OcrConfig {
            local_fallback: false,
            vision: Some(VisionConfig {
                api_key: String::new(),
                api_base: None,
            }),
            ..Default::default()
        };
        assert!(!ocr.has_any_provider());
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let mut config = Config::default();
        config.assistant.completion = Some(CompletionConfig {
            api: CompletionApi::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-secret".to_string()),
            api_base: None,
            timeout_secs: 30,
            max_tokens: 512,
            temperature: 0.2,
        });
        config.ocr.read_job = Some(ReadJobConfig {
            endpoint: "https://read.example.com".to_string(),
            api_key: "secret-key".to_string(),
        });

        let sanitized = SanitizedConfig::from(&config);
        let completion = sanitized.assistant.completion.as_ref().unwrap();
        assert!(completion.api_key_configured);
        assert_eq!(completion.api_base, "https://api.openai.com");
        let read_job = sanitized.ocr.read_job.as_ref().unwrap();
        assert!(read_job.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("secret-key"));
    }
}
