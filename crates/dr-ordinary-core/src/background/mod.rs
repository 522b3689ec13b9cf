//! Background worker: message dispatch and the selection menu.

mod bridge;
mod messages;

pub use bridge::*;
pub use messages::*;

use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::content::WordSetProvider;
use crate::context_menu::{CompanionLink, ContextMenuItem};
use crate::interactions::InteractionLookup;

/// Serves runtime messages from content scripts.
pub struct BackgroundWorker<P, L> {
    provider: P,
    lookup: L,
    companion: CompanionLink,
}

impl<P: WordSetProvider, L: InteractionLookup> BackgroundWorker<P, L> {
    pub fn new(provider: P, lookup: L, companion: CompanionLink) -> Self {
        Self {
            provider,
            lookup,
            companion,
        }
    }

    /// Menu entries to register on install.
    pub fn context_menu_items(&self) -> Vec<ContextMenuItem> {
        vec![ContextMenuItem::check_with_companion()]
    }

    /// URL of the companion tab to open for a menu click, if any.
    pub fn context_menu_clicked(&self, menu_id: &str, selection: Option<&str>) -> Option<Url> {
        let url = self.companion.on_clicked(menu_id, selection)?;
        info!(url = %url, "Opening companion app");
        Some(url)
    }

    pub async fn handle(&self, message: ExtensionMessage) -> MessageResponse {
        match message {
            ExtensionMessage::AnalyzeWithLetta { content, url } => {
                debug!(url = %url, chars = content.len(), "Received analyze request");
                match self.provider.candidate_words(&content, &url).await {
                    Ok(words) => {
                        info!(count = words.len(), "Analysis successful");
                        MessageResponse::ok(json!(words))
                    }
                    Err(error) => {
                        warn!(%error, "Analysis failed");
                        MessageResponse::failure(error.to_string())
                    }
                }
            }
            ExtensionMessage::GetDrugInteractions { drug_name } => {
                debug!(drug = %drug_name, "Received interactions request");
                let records = match self.lookup.interactions(&drug_name).await {
                    Ok(records) => records,
                    Err(error) => {
                        warn!(drug = %drug_name, %error, "Interaction lookup failed");
                        return MessageResponse::failure(error.to_string());
                    }
                };
                match serde_json::to_value(&records) {
                    Ok(data) => MessageResponse::ok(data),
                    Err(error) => MessageResponse::failure(error.to_string()),
                }
            }
        }
    }

    /// Handle a serialized message and serialize the response.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<ExtensionMessage>(raw) {
            Ok(message) => self.handle(message).await,
            Err(error) => {
                warn!(%error, "Unrecognized message");
                MessageResponse::failure(format!("Invalid message: {error}"))
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|error| {
            format!(r#"{{"success":false,"error":"Serialization failed: {error}"}}"#)
        })
    }
}

impl<P: WordSetProvider, L: InteractionLookup> MessageChannel for BackgroundWorker<P, L> {
    async fn send(&self, message: String) -> Result<String, ChannelError> {
        Ok(self.handle_json(&message).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::content::{AcquisitionError, AcquisitionResult};
    use crate::interactions::{InteractionRecord, InteractionTable};
    use futures::executor::block_on;
    use serde_json::Value;

    struct StaticProvider(AcquisitionResult<Vec<String>>);

    impl WordSetProvider for StaticProvider {
        async fn candidate_words(&self, _text: &str, _url: &str) -> AcquisitionResult<Vec<String>> {
            self.0.clone()
        }
    }

    fn worker(result: AcquisitionResult<Vec<String>>) -> BackgroundWorker<StaticProvider, InteractionTable> {
        let companion = CompanionLink::from_config(&AppConfig::default()).unwrap();
        BackgroundWorker::new(StaticProvider(result), InteractionTable::new(), companion)
    }

    #[test]
    fn test_analyze_success() {
        let worker = worker(Ok(vec!["aspirin".into()]));
        let raw = block_on(worker.handle_json(
            r#"{"action":"analyzeWithLetta","content":"Take aspirin","url":"https://example.org"}"#,
        ));

        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({"success": true, "data": ["aspirin"]}));
    }

    #[test]
    fn test_analyze_failure_carries_message() {
        let worker = worker(Err(AcquisitionError::Upstream {
            status: 401,
            message: "Unauthorized".into(),
        }));
        let response = block_on(worker.handle(ExtensionMessage::AnalyzeWithLetta {
            content: "x".into(),
            url: String::new(),
        }));

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Upstream error 401: Unauthorized"));
    }

    #[test]
    fn test_interactions_response() {
        let worker = worker(Ok(Vec::new()));
        let response = block_on(worker.handle(ExtensionMessage::GetDrugInteractions {
            drug_name: "foobarin".into(),
        }));

        let records: Vec<InteractionRecord> = response.into_data().unwrap();
        assert_eq!(records, vec![InteractionRecord::not_found()]);
    }

    #[test]
    fn test_invalid_message() {
        let worker = worker(Ok(Vec::new()));
        let raw = block_on(worker.handle_json(r#"{"action":"unknown"}"#));
        let response: MessageResponse = serde_json::from_str(&raw).unwrap();

        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("Invalid message"));
    }

    #[test]
    fn test_context_menu() {
        let worker = worker(Ok(Vec::new()));
        assert_eq!(worker.context_menu_items().len(), 1);
        assert_eq!(
            worker
                .context_menu_clicked("checkWithDrStrange", Some("warfarin"))
                .map(|u| u.to_string()),
            Some("http://localhost:3000/?drug=warfarin".to_string())
        );
        assert!(worker.context_menu_clicked("other", Some("warfarin")).is_none());
    }
}
