//! Runtime message protocol between the content script and the worker.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Requests sent to the background worker, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ExtensionMessage {
    #[serde(rename = "analyzeWithLetta")]
    AnalyzeWithLetta {
        content: String,
        #[serde(default)]
        url: String,
    },

    #[serde(rename = "getDrugInteractions")]
    GetDrugInteractions {
        #[serde(rename = "drugName")]
        drug_name: String,
    },
}

/// `{success, data}` on success, `{success, error}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Decode the payload of a successful response.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ResponseError> {
        if !self.success {
            return Err(ResponseError::Failed(
                self.error
                    .unwrap_or_else(|| "Background script returned a failure.".to_string()),
            ));
        }
        let data = self.data.ok_or(ResponseError::MissingData)?;
        serde_json::from_value(data).map_err(|e| ResponseError::WrongShape(e.to_string()))
    }
}

/// Why a response could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("{0}")]
    Failed(String),

    #[error("Response carried no data")]
    MissingData,

    #[error("Unexpected data shape: {0}")]
    WrongShape(String),
}
