// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock extraction provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies, so
//! extraction paths can be exercised without calling a real model.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use jgrants_core::JgrantsError;
use jgrants_core::traits::adapter::PluginAdapter;
use jgrants_core::traits::provider::ProviderAdapter;
use jgrants_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Free-form text, as a model without tool support would answer.
    Text(String),
    /// A schema-constrained tool input.
    Structured(Value),
    /// The call fails with a provider error.
    Failure(String),
}

/// A mock provider that answers from a FIFO queue.
///
/// When the queue is empty the call fails, which exercises the
/// literal-keyword fallback.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, JgrantsError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, JgrantsError> {
        let model = request.model.clone().unwrap_or_else(|| "mock-model".to_string());
        self.requests.lock().await.push(request);

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Failure("no scripted reply".to_string()));

        let (content, structured, stop_reason) = match reply {
            MockReply::Text(text) => (text, None, "end_turn"),
            MockReply::Structured(value) => (String::new(), Some(value), "tool_use"),
            MockReply::Failure(message) => {
                return Err(JgrantsError::Provider {
                    message,
                    source: None,
                });
            }
        };

        Ok(ProviderResponse {
            id: "mock-resp".to_string(),
            content,
            structured,
            model,
            stop_reason: Some(stop_reason.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: None,
            system_prompt: None,
            messages: vec![],
            max_tokens: 100,
            output_schema: None,
        }
    }

    #[tokio::test]
    async fn empty_queue_fails() {
        let provider = MockProvider::new();
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, JgrantsError::Provider { .. }));
    }

    #[tokio::test]
    async fn replies_are_returned_in_order() {
        let provider = MockProvider::with_replies(vec![
            MockReply::Text("first".to_string()),
            MockReply::Structured(json!({"keyword": "DX"})),
        ]);
        let first = provider.complete(request()).await.unwrap();
        assert_eq!(first.content, "first");
        assert!(first.structured.is_none());

        let second = provider.complete(request()).await.unwrap();
        assert_eq!(second.structured, Some(json!({"keyword": "DX"})));
        assert_eq!(second.stop_reason.as_deref(), Some("tool_use"));

        assert_eq!(provider.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn add_reply_appends() {
        let provider = MockProvider::new();
        provider.add_reply(MockReply::Text("late".to_string())).await;
        assert_eq!(provider.complete(request()).await.unwrap().content, "late");
    }
}
