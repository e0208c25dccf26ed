//! OpenAI-compatible completion gateway.
//!
//! Implements [`CompletionGateway`] against any chat-completions endpoint
//! that speaks the OpenAI wire format, via [`async_openai`]. Each call sends
//! exactly two messages (the bot's system prompt plus the user utterance)
//! and expects one reply. No streaming, no retries: a failed call surfaces
//! as a [`CompletionError`] and the caller decides what to do.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use parlor_core::llm::gateway::CompletionGateway;
use parlor_types::config::CompletionConfig;
use parlor_types::error::CompletionError;

/// Gateway to an OpenAI-compatible chat-completions endpoint.
///
/// Does NOT derive Debug: the API key lives inside the `async_openai`
/// client and must not leak through debug formatting.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiGateway {
    /// Build a gateway from completion settings and an API key.
    pub fn new(config: &CompletionConfig, api_key: SecretString) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn build_request(&self, system_prompt: &str, user_text: &str) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(system_prompt.to_string()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user_text.to_string()),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl CompletionGateway for OpenAiGateway {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, CompletionError> {
        let request = self.build_request(system_prompt, user_text);

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                CompletionError::MalformedResponse("response carried no message content".to_string())
            })?;

        if content.is_empty() {
            return Err(CompletionError::MalformedResponse(
                "response content was empty".to_string(),
            ));
        }

        Ok(content)
    }
}

/// Map an `async_openai` error to a [`CompletionError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> CompletionError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => CompletionError::Api(api_err.message.clone()),
        OpenAIError::Reqwest(_) => CompletionError::Network(err.to_string()),
        OpenAIError::JSONDeserialize(..) | OpenAIError::InvalidArgument(_) => {
            CompletionError::MalformedResponse(err.to_string())
        }
        _ => CompletionError::Api(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> OpenAiGateway {
        let config = CompletionConfig::default();
        OpenAiGateway::new(&config, SecretString::from("test-key"))
    }

    #[test]
    fn test_build_request_two_message_context() {
        let gw = gateway();
        let req = gw.build_request("You are terse.", "hi");

        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.max_completion_tokens, Some(1024));
        assert_eq!(req.messages.len(), 2);
        assert!(matches!(
            req.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            req.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
    }

    #[test]
    fn test_gateway_name() {
        assert_eq!(gateway().name(), "openai");
    }

    #[test]
    fn test_map_openai_error_api() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "model overloaded".to_string(),
            r#type: Some("server_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, CompletionError::Api(_)));
    }

    #[test]
    fn test_map_openai_error_json_deserialize() {
        use async_openai::error::OpenAIError;
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = map_openai_error(OpenAIError::JSONDeserialize(
            json_err,
            "not json".to_string(),
        ));
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }
}
