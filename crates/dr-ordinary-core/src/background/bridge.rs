//! Content-script side of the runtime message channel.

use thiserror::Error;
use tracing::warn;

use super::{ExtensionMessage, MessageResponse, ResponseError};
use crate::content::{AcquisitionError, AcquisitionResult, WordSetProvider};
use crate::interactions::{InteractionLookup, InteractionRecord, LookupError, LookupResult};

/// The runtime channel is gone or refused the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Extension context is not available")]
    Disconnected,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Delivers a serialized message and returns the serialized reply.
#[allow(async_fn_in_trait)]
pub trait MessageChannel {
    async fn send(&self, message: String) -> Result<String, ChannelError>;
}

impl<C: MessageChannel> MessageChannel for &C {
    async fn send(&self, message: String) -> Result<String, ChannelError> {
        (**self).send(message).await
    }
}

#[derive(Debug)]
enum BridgeError {
    Channel(ChannelError),
    Encode(String),
    Decode(String),
    Response(ResponseError),
}

/// Uses the background worker as word-set provider and interaction lookup.
pub struct RuntimeBridge<C> {
    channel: C,
}

impl<C: MessageChannel> RuntimeBridge<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        message: &ExtensionMessage,
    ) -> Result<T, BridgeError> {
        let raw = serde_json::to_string(message).map_err(|e| BridgeError::Encode(e.to_string()))?;
        let reply = self.channel.send(raw).await.map_err(BridgeError::Channel)?;
        let response: MessageResponse =
            serde_json::from_str(&reply).map_err(|e| BridgeError::Decode(e.to_string()))?;
        response.into_data().map_err(BridgeError::Response)
    }
}

impl<C: MessageChannel> WordSetProvider for RuntimeBridge<C> {
    async fn candidate_words(&self, page_text: &str, url: &str) -> AcquisitionResult<Vec<String>> {
        let message = ExtensionMessage::AnalyzeWithLetta {
            content: page_text.to_owned(),
            url: url.to_owned(),
        };
        self.request(&message).await.map_err(|error| {
            warn!(?error, "Could not fetch drugs from background");
            match error {
                BridgeError::Channel(e) => AcquisitionError::Transport(e.to_string()),
                BridgeError::Encode(e) | BridgeError::Decode(e) => AcquisitionError::MalformedResponse(e),
                BridgeError::Response(ResponseError::Failed(e)) => AcquisitionError::Rejected(e),
                BridgeError::Response(e) => AcquisitionError::MalformedResponse(e.to_string()),
            }
        })
    }
}

impl<C: MessageChannel> InteractionLookup for RuntimeBridge<C> {
    async fn interactions(&self, drug_name: &str) -> LookupResult<Vec<InteractionRecord>> {
        let message = ExtensionMessage::GetDrugInteractions {
            drug_name: drug_name.to_owned(),
        };
        self.request(&message).await.map_err(|error| match error {
            BridgeError::Channel(e) => LookupError::Transport(e.to_string()),
            BridgeError::Encode(e) | BridgeError::Decode(e) => LookupError::MalformedResponse(e),
            BridgeError::Response(ResponseError::Failed(e)) => LookupError::Failed(e),
            BridgeError::Response(e) => LookupError::MalformedResponse(e.to_string()),
        })
    }
}
