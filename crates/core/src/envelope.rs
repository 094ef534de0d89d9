//! The uniform result shape returned across every public operation.
//!
//! Storage collaborators, function implementations, the dispatchers and the
//! embedding pipeline all speak `ResultEnvelope`. A status of 200 means
//! success; anything else is a failure with a human-readable message.

use serde::{Deserialize, Serialize};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL: u16 = 500;

/// Outcome of an operation: status code, message, optional payload and
/// optional citation references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T = serde_json::Value> {
    /// 200 on success, non-200 on failure
    pub status: u16,

    /// Human-readable outcome
    #[serde(default)]
    pub message: String,

    /// Optional payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Citation markers or reference targets carried alongside the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl<T> ResultEnvelope<T> {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
            references: None,
        }
    }

    /// A 200 envelope with no payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(STATUS_OK, message)
    }

    /// A 200 envelope carrying `data`.
    pub fn ok_with_data(message: impl Into<String>, data: T) -> Self {
        Self::ok(message).with_data(data)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(STATUS_NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(STATUS_INTERNAL, message)
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_references(mut self, references: impl Into<String>) -> Self {
        self.references = Some(references.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Convert the payload type, keeping status, message and references.
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> ResultEnvelope<U> {
        ResultEnvelope {
            status: self.status,
            message: self.message,
            data: self.data.map(f),
            references: self.references,
        }
    }
}

impl ResultEnvelope<serde_json::Value> {
    /// A 200 envelope carrying any serializable payload.
    pub fn ok_json<S: Serialize>(
        message: impl Into<String>,
        data: &S,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::ok_with_data(message, serde_json::to_value(data)?))
    }
}
