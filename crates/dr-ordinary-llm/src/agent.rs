//! Letta agent client.
//!
//! The client builds the message request, hands it to an [`AgentTransport`]
//! and parses the reply. Network I/O lives behind the transport so hosts can
//! plug in whatever HTTP stack they already run.

use dr_ordinary_core::config::AgentConfig;
use dr_ordinary_core::content::{AcquisitionError, AcquisitionResult, WordSetProvider};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::extraction::{parse_agent_response, ExtractionError, ExtractionResult};
use crate::prompts::make_page_analysis_prompt;

/// One POST to the agent messages endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRequest {
    pub url: String,
    /// `Authorization` header value
    pub authorization: String,
    pub body: Value,
}

/// Raw HTTP reply from the agent API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl AgentReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends agent requests over the network.
#[allow(async_fn_in_trait)]
pub trait AgentTransport {
    async fn post(&self, request: &AgentRequest) -> ExtractionResult<AgentReply>;
}

impl<T: AgentTransport> AgentTransport for &T {
    async fn post(&self, request: &AgentRequest) -> ExtractionResult<AgentReply> {
        (**self).post(request).await
    }
}

/// Drug extraction backed by a hosted agent.
pub struct LettaAgent<'c, T> {
    config: &'c AgentConfig,
    transport: T,
}

impl<'c, T: AgentTransport> LettaAgent<'c, T> {
    pub fn new(config: &'c AgentConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn build_request(&self, url: &str, content: &str) -> ExtractionResult<AgentRequest> {
        let endpoint = self
            .config
            .messages_url()
            .map_err(|e| ExtractionError::Config(e.to_string()))?;
        let prompt = make_page_analysis_prompt(url, content);

        Ok(AgentRequest {
            url: endpoint.to_string(),
            authorization: self.config.bearer(),
            body: json!({
                "messages": [{ "role": "user", "content": prompt }]
            }),
        })
    }

    /// Ask the agent for the drug names on a page.
    pub async fn extract(&self, url: &str, content: &str) -> ExtractionResult<Vec<String>> {
        let request = self.build_request(url, content)?;
        debug!(endpoint = %request.url, "Sending page to agent");

        let reply = self.transport.post(&request).await?;
        if !reply.is_success() {
            warn!(status = reply.status, "Agent request failed");
            return Err(ExtractionError::Upstream {
                status: reply.status,
                status_text: reply.status_text,
            });
        }

        let drugs = parse_agent_response(&reply.body)?;
        info!(count = drugs.len(), "Agent identified drugs");
        Ok(drugs)
    }
}

impl<T: AgentTransport> WordSetProvider for LettaAgent<'_, T> {
    async fn candidate_words(&self, page_text: &str, url: &str) -> AcquisitionResult<Vec<String>> {
        Ok(self.extract(url, page_text).await?)
    }
}

/// Tries `primary`, then `fallback` when the primary is unreachable.
///
/// Malformed replies are returned as-is.
pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> WithFallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: WordSetProvider, F: WordSetProvider> WordSetProvider for WithFallback<P, F> {
    async fn candidate_words(&self, page_text: &str, url: &str) -> AcquisitionResult<Vec<String>> {
        match self.primary.candidate_words(page_text, url).await {
            Err(
                error @ (AcquisitionError::Transport(_)
                | AcquisitionError::Upstream { .. }
                | AcquisitionError::Unconfigured(_)),
            ) => {
                warn!(%error, "Primary provider unavailable, using fallback");
                self.fallback.candidate_words(page_text, url).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::KeywordExtractor;
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct CannedTransport {
        reply: Result<AgentReply, String>,
        seen: RefCell<Vec<AgentRequest>>,
    }

    impl CannedTransport {
        fn ok(body: &str) -> Self {
            Self::status(200, "OK", body)
        }

        fn status(status: u16, status_text: &str, body: &str) -> Self {
            Self {
                reply: Ok(AgentReply {
                    status,
                    status_text: status_text.into(),
                    body: body.into(),
                }),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn offline() -> Self {
            Self {
                reply: Err("connection refused".into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl AgentTransport for CannedTransport {
        async fn post(&self, request: &AgentRequest) -> ExtractionResult<AgentReply> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone().map_err(ExtractionError::Transport)
        }
    }

    const REPLY: &str = r#"{"messages":[{"message_type":"assistant_message","content":"[\"warfarin\"]"}]}"#;

    #[test]
    fn test_build_request() {
        let config = AgentConfig::new("sk-test", "agent-123");
        let transport = CannedTransport::ok(REPLY);
        let agent = LettaAgent::new(&config, &transport);

        let request = agent.build_request("https://example.org/", "Take warfarin").unwrap();

        assert_eq!(request.url, "https://api.letta.com/v1/agents/agent-123/messages");
        assert_eq!(request.authorization, "Bearer sk-test");
        assert_eq!(request.body["messages"][0]["role"], "user");
        let prompt = request.body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("URL: https://example.org/"));
        assert!(prompt.contains("Content: Take warfarin"));
    }

    #[test]
    fn test_extract_parses_reply() {
        let config = AgentConfig::new("sk-test", "agent-123");
        let transport = CannedTransport::ok(REPLY);
        let agent = LettaAgent::new(&config, &transport);

        let drugs = block_on(agent.extract("https://example.org/", "Take warfarin")).unwrap();

        assert_eq!(drugs, vec!["warfarin"]);
        assert_eq!(transport.seen.borrow().len(), 1);
    }

    #[test]
    fn test_non_success_status_is_upstream_error() {
        let config = AgentConfig::new("sk-test", "agent-123");
        let transport = CannedTransport::status(401, "Unauthorized", "{}");
        let agent = LettaAgent::new(&config, &transport);

        let error = block_on(agent.extract("https://example.org/", "text")).unwrap_err();

        assert_eq!(error.to_string(), "Letta API error: 401 - Unauthorized");
    }

    #[test]
    fn test_invalid_base_url_never_sends() {
        let mut config = AgentConfig::new("sk-test", "agent-123");
        config.base_url = "not a url".into();
        let transport = CannedTransport::ok(REPLY);
        let agent = LettaAgent::new(&config, &transport);

        let result = block_on(agent.candidate_words("text", "https://example.org/"));

        assert!(matches!(result, Err(AcquisitionError::Unconfigured(_))));
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn test_fallback_on_transport_error() {
        let config = AgentConfig::new("sk-test", "agent-123");
        let transport = CannedTransport::offline();
        let provider = WithFallback::new(LettaAgent::new(&config, &transport), KeywordExtractor::new());

        let words = block_on(provider.candidate_words("Patients on Warfarin", "https://example.org/"));

        assert_eq!(words, Ok(vec!["warfarin".to_string()]));
    }

    #[test]
    fn test_no_fallback_on_malformed_reply() {
        let config = AgentConfig::new("sk-test", "agent-123");
        let transport = CannedTransport::ok(r#"{"messages":[]}"#);
        let provider = WithFallback::new(LettaAgent::new(&config, &transport), KeywordExtractor::new());

        let words = block_on(provider.candidate_words("Patients on warfarin", "https://example.org/"));

        assert!(matches!(words, Err(AcquisitionError::MalformedResponse(_))));
    }
}
