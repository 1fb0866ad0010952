use crate::error::Result;
use crate::model_info::ModelInfo;
use crate::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use parley_core::TokenUsage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The identifier the client was built with, unchanged.
    fn model(&self) -> &str;

    fn model_info(&self) -> &ModelInfo;

    async fn create(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Usage summed over every successful `create` call.
    fn total_usage(&self) -> TokenUsage {
        TokenUsage::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_info::{get_info, Provider};
    use parley_core::Message;

    struct EchoClient {
        info: ModelInfo,
    }

    #[async_trait]
    impl ChatClient for EchoClient {
        fn model(&self) -> &str {
            &self.info.id
        }

        fn model_info(&self) -> &ModelInfo {
            &self.info
        }

        async fn create(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            let last = request
                .messages
                .last()
                .map(|m| m.text_content())
                .unwrap_or_default();
            Ok(CompletionResponse::new("echo-1", self.model(), Message::assistant(last)))
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let client: Box<dyn ChatClient> = Box::new(EchoClient {
            info: get_info("deepseek-v3").unwrap(),
        });

        assert_eq!(client.model(), "deepseek-v3");
        assert_eq!(client.model_info().provider, Provider::DeepSeek);
        assert!(client.total_usage().is_empty());

        let response = client
            .create(CompletionRequest::new(vec![Message::user("你好")]))
            .await
            .unwrap();
        assert_eq!(response.text_content(), "你好");
    }
}
