//! Local language-model client (TGI or Ollama) used for concept extraction and answer synthesis.

use crate::builder::{ConceptExtraction, ConceptExtractor, ExtractedConcept, ExtractedRelationship};
use crate::synthesizer::{
    AnswerSynthesizer, SynthesisRequest, SYNTHESIS_MAX_TOKENS, SYNTHESIS_TEMPERATURE, SYSTEM_PROMPT,
};
use crate::{AgentError, Result};
use async_trait::async_trait;
use conceptgraph_core::DocumentChunk;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_PROVIDER: &str = "ollama";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_TGI_URL: &str = "http://localhost:8082";
const DEFAULT_MODEL: &str = "phi4-mini:latest";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EXTRACT_MAX_CHARS: usize = 2000;

const EXTRACTION_TEMPERATURE: f32 = 0.3;
const EXTRACTION_MAX_TOKENS: u32 = 1000;
const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are an expert at extracting knowledge graphs from text. Return valid JSON only.";

fn env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn timeout_secs() -> u64 {
    std::env::var("LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

fn extract_max_chars() -> usize {
    std::env::var("EXTRACT_MAX_CHARS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_EXTRACT_MAX_CHARS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Tgi,
    Ollama,
}

impl LlmProvider {
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("tgi") {
            Self::Tgi
        } else {
            Self::Ollama
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            Self::Tgi => DEFAULT_TGI_URL,
            Self::Ollama => DEFAULT_OLLAMA_URL,
        }
    }
}

/// Sampling settings for one completion
#[derive(Debug, Clone, Copy)]
struct Generation {
    temperature: f32,
    max_tokens: u32,
    json: bool,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    provider: LlmProvider,
    model: String,
    timeout: Duration,
    extract_max_chars: usize,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            extract_max_chars: DEFAULT_EXTRACT_MAX_CHARS,
        }
    }

    /// Build from `LLM_PROVIDER`, `LLM_URL`, `LLM_MODEL`, `LLM_TIMEOUT_SECS` and `EXTRACT_MAX_CHARS`
    pub fn default_local() -> Self {
        let provider = LlmProvider::from_name(&env_or_default("LLM_PROVIDER", DEFAULT_PROVIDER));
        let url = env_or_default("LLM_URL", provider.default_url());

        Self::new(provider, url)
            .with_model(env_or_default("LLM_MODEL", DEFAULT_MODEL))
            .with_timeout(Duration::from_secs(timeout_secs()))
            .with_extract_max_chars(extract_max_chars())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_extract_max_chars(mut self, max_chars: usize) -> Self {
        self.extract_max_chars = max_chars.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn health(&self) -> Result<bool> {
        let url = match self.provider {
            LlmProvider::Tgi => format!("{}/health", self.base_url),
            LlmProvider::Ollama => format!("{}/api/tags", self.base_url),
        };
        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        Ok(response.status().is_success())
    }

    /// Ask the model for the concepts and relations in `text`
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn extract_concepts(&self, text: &str) -> Result<ConceptExtraction> {
        let prompt = extraction_prompt(text, self.extract_max_chars);
        let generated = self
            .complete(
                EXTRACTION_SYSTEM_PROMPT,
                &prompt,
                Generation {
                    temperature: EXTRACTION_TEMPERATURE,
                    max_tokens: EXTRACTION_MAX_TOKENS,
                    json: true,
                },
            )
            .await?;

        let cleaned = normalize_json_payload(&generated);
        parse_concept_extraction(&cleaned)
    }

    async fn complete(&self, system: &str, prompt: &str, generation: Generation) -> Result<String> {
        match self.provider {
            LlmProvider::Tgi => self.tgi_generate(system, prompt, generation).await,
            LlmProvider::Ollama => self.ollama_chat(system, prompt, generation).await,
        }
    }

    async fn tgi_generate(&self, system: &str, prompt: &str, generation: Generation) -> Result<String> {
        let url = format!("{}/generate", self.base_url);
        let request = TgiGenerateRequest {
            inputs: format!("{}\n\n{}", system, prompt),
            parameters: TgiParameters {
                max_new_tokens: Some(generation.max_tokens),
                return_full_text: Some(false),
                temperature: Some(generation.temperature),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        extract_generated_text(response)
    }

    async fn ollama_chat(&self, system: &str, prompt: &str, generation: Generation) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                OllamaChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OllamaChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: generation.json.then(|| Value::String("json".to_string())),
            options: Some(json!({
                "temperature": generation.temperature,
                "num_predict": generation.max_tokens,
            })),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<OllamaChatResponse>()
            .await?;

        if let Some(done_reason) = response.done_reason.as_deref() {
            debug!("Ollama chat done_reason={}", done_reason);
        }

        if let Some(total_ms) = response
            .total_duration
            .map(|ns| ns as f64 / 1_000_000.0)
        {
            debug!("Ollama chat total_duration_ms={:.2}", total_ms);
        }

        Ok(response.message.content)
    }
}

#[async_trait]
impl AnswerSynthesizer for LlmClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String> {
        let answer = self
            .complete(
                SYSTEM_PROMPT,
                &request.prompt(),
                Generation {
                    temperature: SYNTHESIS_TEMPERATURE,
                    max_tokens: SYNTHESIS_MAX_TOKENS,
                    json: false,
                },
            )
            .await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AgentError::Llm("model returned an empty answer".to_string()));
        }
        Ok(answer.to_string())
    }
}

#[async_trait]
impl ConceptExtractor for LlmClient {
    async fn extract(&self, chunk: &DocumentChunk) -> Result<ConceptExtraction> {
        self.extract_concepts(&chunk.text).await
    }
}

fn extraction_prompt(text: &str, max_chars: usize) -> String {
    let text = match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    };

    format!(
        "Analyze the following text and extract:\n\
         1. Key concepts/entities (5-10 items)\n\
         2. Relationships between these concepts\n\
         3. Topic categories\n\n\
         Text: {}\n\n\
         Return JSON format:\n\
         {{\"concepts\":[{{\"name\":\"concept_name\",\"type\":\"entity|topic|concept\",\"importance\":0.1-1.0}}],\
         \"relationships\":[{{\"source\":\"concept1\",\"target\":\"concept2\",\"type\":\"relates_to|contains|mentions\",\"strength\":0.1-1.0}}]}}",
        text
    )
}

#[derive(Serialize)]
struct TgiGenerateRequest {
    inputs: String,
    parameters: TgiParameters,
}

#[derive(Serialize)]
struct TgiParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_full_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Serialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessageResponse,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    total_duration: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaChatMessageResponse {
    content: String,
}

/// Strip code fences and surrounding prose from a model's JSON reply
fn normalize_json_payload(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }

    let without_fence = if trimmed.starts_with("```") {
        let mut lines = trimmed.lines();
        let _ = lines.next(); // ``` or ```json
        let mut content = lines.collect::<Vec<_>>().join("\n");
        if content.ends_with("```") {
            content.truncate(content.len().saturating_sub(3));
        }
        content.trim().to_string()
    } else {
        trimmed.to_string()
    };

    if let (Some(start), Some(end)) = (without_fence.find('{'), without_fence.rfind('}')) {
        if start < end {
            return without_fence[start..=end].to_string();
        }
    }

    without_fence
}

/// Lenient parse: unknown shapes inside the arrays are skipped, not fatal
fn parse_concept_extraction(payload: &str) -> Result<ConceptExtraction> {
    let value: Value = serde_json::from_str(payload).map_err(|e| {
        AgentError::Processing(format!("Model returned invalid JSON: {} ({})", payload, e))
    })?;

    let concepts = value
        .get("concepts")
        .or_else(|| value.get("entities"))
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(parse_concept).collect())
        .unwrap_or_default();

    let relationships = value
        .get("relationships")
        .or_else(|| value.get("relations"))
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(parse_relationship).collect())
        .unwrap_or_default();

    Ok(ConceptExtraction {
        concepts,
        relationships,
    })
}

fn parse_concept(item: &Value) -> Option<ExtractedConcept> {
    match item {
        Value::String(name) => Some(ExtractedConcept::new(name.as_str())),
        Value::Object(obj) => {
            let name = obj
                .get("name")
                .or_else(|| obj.get("concept"))
                .or_else(|| obj.get("entity"))
                .and_then(value_to_string)?;
            let concept_type = obj
                .get("type")
                .or_else(|| obj.get("concept_type"))
                .or_else(|| obj.get("entity_type"))
                .and_then(value_to_string);
            Some(ExtractedConcept {
                name,
                concept_type,
                importance: obj.get("importance").and_then(value_to_f32),
            })
        }
        _ => None,
    }
}

fn parse_relationship(item: &Value) -> Option<ExtractedRelationship> {
    let source = item
        .get("source")
        .or_else(|| item.get("from"))
        .and_then(value_to_string)?;
    let target = item
        .get("target")
        .or_else(|| item.get("to"))
        .and_then(value_to_string)?;
    let relation_type = item
        .get("type")
        .or_else(|| item.get("relation_type"))
        .or_else(|| item.get("relationship_type"))
        .and_then(value_to_string);

    Some(ExtractedRelationship {
        source,
        target,
        relation_type,
        strength: item.get("strength").and_then(value_to_f32),
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(arr) => arr.first().and_then(value_to_string),
        Value::Object(obj) => obj.get("name").and_then(value_to_string),
        _ => None,
    }
}

fn value_to_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

fn extract_generated_text(value: Value) -> Result<String> {
    match value {
        Value::Array(mut items) => {
            let first = items
                .pop()
                .ok_or_else(|| AgentError::Llm("Empty TGI response array".to_string()))?;
            extract_generated_text(first)
        }
        Value::Object(mut obj) => {
            if let Some(Value::String(text)) = obj.remove("generated_text") {
                Ok(text)
            } else {
                Err(AgentError::Llm(
                    "TGI response missing generated text field".to_string(),
                ))
            }
        }
        other => Err(AgentError::Llm(format!(
            "Unexpected TGI response format: {}",
            other
        ))),
    }
}
