//! Embedding generation on top of a [`Provider`].

use std::sync::Arc;

use serde_json::{Map, Value};
use signalforge_config::EmbeddingConfig;
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::provider::{EmbeddingRequest, Provider};
use tracing::{debug, error};

use crate::EMBEDDING_MAX_CHARS;
use crate::truncate::{record_to_json_string, truncate, truncate_record};

const EMBEDDING_FIELD: &str = "embedding";

/// What to embed.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInput {
    Text(String),
    Record(Map<String, Value>),
}

impl From<&str> for EmbeddingInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Map<String, Value>> for EmbeddingInput {
    fn from(record: Map<String, Value>) -> Self {
        Self::Record(record)
    }
}

pub struct EmbeddingPipeline {
    provider: Arc<dyn Provider>,
    model: String,
    dimensions: Option<u32>,
    max_chars: usize,
}

impl EmbeddingPipeline {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions: None,
            max_chars: EMBEDDING_MAX_CHARS,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_chars: config.max_chars,
        }
    }

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// The exact text that would be sent to the embedding model.
    pub fn prepare(&self, input: &EmbeddingInput) -> String {
        match input {
            EmbeddingInput::Text(text) => truncate(text, self.max_chars),
            EmbeddingInput::Record(record) => {
                record_to_json_string(&truncate_record(record, self.max_chars))
            }
        }
    }

    /// Embed text or a record after shrinking it to the character budget.
    ///
    /// Only empty text is rejected; an empty record is embedded as `{}`.
    pub async fn embed(&self, input: &EmbeddingInput) -> ResultEnvelope<Vec<f32>> {
        if matches!(input, EmbeddingInput::Text(text) if text.is_empty()) {
            return ResultEnvelope::bad_request("No input provided for embedding");
        }

        let text = self.prepare(input);
        debug!(model = %self.model, chars = text.len(), "Requesting embedding");

        let request = EmbeddingRequest {
            model: self.model.clone(),
            inputs: vec![text],
            dimensions: self.dimensions,
        };

        match self.provider.embed(request).await {
            Ok(response) => match response.embeddings.into_iter().next() {
                Some(vector) if !vector.is_empty() => {
                    ResultEnvelope::ok_with_data("Embedding generated successfully", vector)
                }
                _ => failed("No embedding generated"),
            },
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "Embedding request failed");
                failed(&e.to_string())
            }
        }
    }

    /// Return `record` with a fresh `embedding` field computed from its other fields.
    pub async fn attach_embedding(&self, record: &Map<String, Value>) -> ResultEnvelope<Map<String, Value>> {
        let mut source = record.clone();
        source.shift_remove(EMBEDDING_FIELD);

        let embedded = self.embed(&EmbeddingInput::Record(source)).await;
        let Some(vector) = embedded.data else {
            return ResultEnvelope::new(embedded.status, embedded.message);
        };

        let mut updated = record.clone();
        updated.insert(EMBEDDING_FIELD.to_string(), vector_to_json(&vector));
        ResultEnvelope::ok_with_data("Embedding added successfully", updated)
    }
}

fn failed<T>(reason: &str) -> ResultEnvelope<T> {
    ResultEnvelope::internal(format!("Failed to embed data with error: {reason}"))
}

/// Keep the shortest decimal form of each component rather than its widened f64 value.
fn vector_to_json(vector: &[f32]) -> Value {
    Value::Array(
        vector
            .iter()
            .map(|x| {
                x.to_string()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use signalforge_core::error::ProviderError;
    use signalforge_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    /// Records every embedded text and answers with a fixed vector.
    struct RecordingEmbedder {
        seen: Mutex<Vec<String>>,
        vector: Vec<f32>,
    }

    impl RecordingEmbedder {
        fn new(vector: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                vector,
            })
        }
    }

    #[async_trait]
    impl Provider for RecordingEmbedder {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("chat".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            self.seen.lock().unwrap().extend(request.inputs);
            Ok(EmbeddingResponse {
                embeddings: vec![self.vector.clone()],
                model: request.model,
            })
        }
    }

    struct NoEmbeddings;

    #[async_trait]
    impl Provider for NoEmbeddings {
        fn name(&self) -> &str {
            "none"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("chat".into()))
        }
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn text_is_truncated_before_embedding() {
        let provider = RecordingEmbedder::new(vec![0.5, 0.25]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "text-embedding-3-small").with_max_chars(10);

        let result = pipeline.embed(&EmbeddingInput::from("abcdefghijklmnop")).await;
        assert_eq!(result.status, 200);
        assert_eq!(result.data, Some(vec![0.5, 0.25]));
        assert_eq!(provider.seen.lock().unwrap()[0], "abcdefghi…");
    }

    #[tokio::test]
    async fn record_is_serialised_compactly() {
        let provider = RecordingEmbedder::new(vec![1.0]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "m");
        pipeline
            .embed(&EmbeddingInput::from(record(json!({"title": "Hi", "n": 2}))))
            .await;
        assert_eq!(provider.seen.lock().unwrap()[0], r#"{"title":"Hi","n":2}"#);
    }

    #[tokio::test]
    async fn whole_floats_are_sent_in_integer_form() {
        let provider = RecordingEmbedder::new(vec![1.0]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "m");
        pipeline
            .embed(&EmbeddingInput::from(record(json!({"price": 10.0, "title": "t"}))))
            .await;
        assert_eq!(provider.seen.lock().unwrap()[0], r#"{"price":10,"title":"t"}"#);
    }

    #[tokio::test]
    async fn record_holding_only_an_embedding_embeds_empty_object() {
        let provider = RecordingEmbedder::new(vec![0.5]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "m");

        let result = pipeline.attach_embedding(&record(json!({"embedding": [9.0, 9.0]}))).await;
        assert_eq!(result.status, 200);
        assert_eq!(provider.seen.lock().unwrap().as_slice(), ["{}"]);
        assert_eq!(result.data.unwrap()["embedding"], json!([0.5]));
    }

    #[tokio::test]
    async fn attach_never_embeds_existing_embedding() {
        let provider = RecordingEmbedder::new(vec![0.1, 0.2]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "m");
        let input = record(json!({"title": "Hi", "embedding": [9.0, 9.0]}));

        let result = pipeline.attach_embedding(&input).await;
        assert_eq!(result.status, 200);

        let seen = provider.seen.lock().unwrap()[0].clone();
        assert_eq!(seen, r#"{"title":"Hi"}"#);

        let updated = result.data.unwrap();
        assert_eq!(updated["title"], "Hi");
        assert_eq!(updated["embedding"], json!([0.1, 0.2]));
    }

    #[tokio::test]
    async fn empty_vector_is_an_error() {
        let provider = RecordingEmbedder::new(vec![]);
        let pipeline = EmbeddingPipeline::new(provider, "m");
        let result = pipeline.embed(&EmbeddingInput::from("hello")).await;
        assert_eq!(result.status, 500);
        assert_eq!(result.message, "Failed to embed data with error: No embedding generated");
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let pipeline = EmbeddingPipeline::new(Arc::new(NoEmbeddings), "m");
        let result = pipeline.attach_embedding(&record(json!({"a": 1}))).await;
        assert_eq!(result.status, 500);
        assert!(result.message.starts_with("Failed to embed data with error:"));
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let provider = RecordingEmbedder::new(vec![1.0]);
        let pipeline = EmbeddingPipeline::new(provider.clone(), "m");
        let result = pipeline.embed(&EmbeddingInput::from("")).await;
        assert_eq!(result.status, 400);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn config_sets_model_and_budget() {
        let config = EmbeddingConfig {
            model: "text-embedding-3-large".into(),
            dimensions: Some(256),
            max_chars: 64,
        };
        let pipeline = EmbeddingPipeline::from_config(Arc::new(NoEmbeddings), &config);
        assert_eq!(pipeline.model, "text-embedding-3-large");
        assert_eq!(pipeline.dimensions, Some(256));
        assert_eq!(pipeline.prepare(&EmbeddingInput::from("x".repeat(100).as_str())).chars().count(), 64);
    }
}
