//! Request and response types for the Ollama REST API.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub prompt: String,
}

/// Response body for `POST /api/embeddings`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

/// Request body for `POST /api/generate` (non-streaming).
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Response body for `POST /api/generate` with `stream: false`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Response body for `GET /api/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_response_deserializes() {
        let json = r#"{"embedding": [0.5, -0.25, 1.0]}"#;
        let response: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.embedding, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn generate_response_tolerates_extra_fields() {
        let json = r#"{
            "model": "llama3.1",
            "response": "Dear hiring manager,",
            "done": true,
            "total_duration": 123456
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response, "Dear hiring manager,");
        assert!(response.done);
    }

    #[test]
    fn generate_request_serializes_stream_flag() {
        let request = GenerateRequest {
            model: "llama3.1".to_string(),
            prompt: "hello".to_string(),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::json!(false));
    }
}
