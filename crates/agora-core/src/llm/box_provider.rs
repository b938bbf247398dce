//! BoxChatProvider -- object-safe dynamic dispatch wrapper for ChatProvider.
//!
//! 1. Define an object-safe `ChatProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ChatProviderDyn` for all `T: ChatProvider`
//! 3. `BoxChatProvider` wraps `Box<dyn ChatProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use agora_types::llm::{ChatRequest, ChatResponse, LlmError};

use super::provider::ChatProvider;

/// Object-safe version of [`ChatProvider`] with boxed futures.
pub trait ChatProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn chat_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>>;

    fn list_models_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>>;
}

impl<T: ChatProvider> ChatProviderDyn for T {
    fn name(&self) -> &str {
        ChatProvider::name(self)
    }

    fn chat_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(request))
    }

    fn list_models_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, LlmError>> + Send + '_>> {
        Box::pin(self.list_models())
    }
}

/// Type-erased chat provider.
///
/// `ChatProvider` uses RPITIT and cannot be a trait object directly, so the
/// services hold this wrapper instead.
pub struct BoxChatProvider {
    inner: Box<dyn ChatProviderDyn + Send + Sync>,
}

impl BoxChatProvider {
    /// Wrap a concrete `ChatProvider` in a type-erased box.
    pub fn new<T: ChatProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send a chat request and wait for the complete reply.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        self.inner.chat_boxed(request).await
    }

    /// Names of the models the server can run.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        self.inner.list_models_boxed().await
    }
}

impl std::fmt::Debug for BoxChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxChatProvider")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::llm::{Message, SamplingOptions};

    struct EchoProvider;

    impl ChatProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn chat(
            &self,
            request: &ChatRequest,
        ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let model = request.model.clone();
            async move {
                Ok(ChatResponse {
                    model,
                    message: Message::assistant(last),
                    total_duration_ns: None,
                    eval_count: None,
                })
            }
        }

        fn list_models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send {
            async { Ok(vec!["llama3.2".to_string()]) }
        }
    }

    #[tokio::test]
    async fn test_box_provider_delegates() {
        let provider = BoxChatProvider::new(EchoProvider);
        assert_eq!(provider.name(), "echo");

        let request = ChatRequest {
            model: "llama3.2".to_string(),
            messages: vec![Message::user("ping")],
            options: SamplingOptions::default(),
        };
        let response = provider.chat(&request).await.unwrap();
        assert_eq!(response.message.content, "ping");
        assert_eq!(provider.list_models().await.unwrap(), vec!["llama3.2"]);
    }
}
