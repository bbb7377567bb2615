// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of every POST to the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Map<String, Value>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
        }
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Uniform result of a command call.
///
/// `success` mirrors the HTTP status only. A 200 whose body carries a GraphQL
/// `errors` array still reports `success: true`; use [`CommandResponse::outcome`]
/// to tell an answered command from a rejected one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What actually happened to a command, as opposed to what HTTP said.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The request never produced a JSON body.
    TransportFailure(String),
    /// The backend answered with a GraphQL `errors` array.
    Rejected(Vec<Value>),
    /// The backend answered; holds the body's `data` member (or the whole
    /// body when it has none).
    Answered(Value),
}

impl CommandResponse {
    pub fn answered(success: bool, data: Value) -> Self {
        Self {
            success,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn outcome(&self) -> Outcome {
        let Some(body) = &self.data else {
            return Outcome::TransportFailure(
                self.error.clone().unwrap_or_else(|| "no response body".to_string()),
            );
        };

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Outcome::Rejected(errors.clone());
            }
        }

        if !self.success {
            return Outcome::TransportFailure(format!("HTTP request failed: {}", body));
        }

        Outcome::Answered(body.get("data").cloned().unwrap_or_else(|| body.clone()))
    }
}

/// Response shape of the `submitCode` mutation.
#[derive(Deserialize, Debug)]
pub(crate) struct SubmitCodeResponse {
    pub data: Option<SubmitCodeData>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SubmitCodeData {
    #[serde(rename = "submitCode")]
    pub submit_code: Option<SubmitCodePayload>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SubmitCodePayload {
    pub code_submission_id: Option<String>,
}
