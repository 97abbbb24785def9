//! One-off questions about a single message.

use tracing::{debug, info};

use crate::ai::{ModelBackend, PromptError};
use crate::email::MailHost;
use crate::error::Result;

const ANALYZE_INSTRUCTION: &str = "Analyze this email and give a short assessment of its importance, urgency and recommended actions:";
const SUMMARIZE_INSTRUCTION: &str = "Summarize this email briefly and concisely:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistAction {
    Analyze,
    Summarize,
}

impl AssistAction {
    fn instruction(self) -> &'static str {
        match self {
            AssistAction::Analyze => ANALYZE_INSTRUCTION,
            AssistAction::Summarize => SUMMARIZE_INSTRUCTION,
        }
    }
}

pub fn assist_prompt(action: AssistAction, content: &str) -> String {
    format!("{}\n\n{}", action.instruction(), content)
}

/// Importance, urgency and recommended actions, as raw model text.
pub async fn analyze_message(
    host: &dyn MailHost,
    backend: &dyn ModelBackend,
    message_id: &str,
) -> Result<String> {
    run_action(host, backend, message_id, AssistAction::Analyze).await
}

/// A short summary, as raw model text.
pub async fn summarize_message(
    host: &dyn MailHost,
    backend: &dyn ModelBackend,
    message_id: &str,
) -> Result<String> {
    run_action(host, backend, message_id, AssistAction::Summarize).await
}

async fn run_action(
    host: &dyn MailHost,
    backend: &dyn ModelBackend,
    message_id: &str,
    action: AssistAction,
) -> Result<String> {
    let content = host.message_content(message_id).await?;
    if content.trim().is_empty() {
        return Err(PromptError::ContentMissing("email content").into());
    }
    debug!("{:?} message {} ({} chars)", action, message_id, content.len());

    let answer = backend.generate(&assist_prompt(action, &content)).await?;
    info!("{:?} of message {} done", action, message_id);
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ModelError, UnimplementedBackend};
    use crate::email::{MemoryMailHost, MemoryMessage};
    use crate::error::MailsorterError;
    use async_trait::async_trait;

    struct EchoBackend;

    #[async_trait]
    impl ModelBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError> {
            Ok(prompt.to_string())
        }
    }

    fn host() -> MemoryMailHost {
        let host = MemoryMailHost::new();
        host.add_account("a", "me@example.com");
        host.add_message(
            "a",
            "/INBOX",
            MemoryMessage::new("m1", "Meeting").with_content("Meeting at 10"),
        );
        host.add_message("a", "/INBOX", MemoryMessage::new("m2", "Empty"));
        host
    }

    #[tokio::test]
    async fn test_summarize_sends_content() {
        let answer = summarize_message(&host(), &EchoBackend, "m1").await.unwrap();
        assert!(answer.starts_with(SUMMARIZE_INSTRUCTION));
        assert!(answer.ends_with("Meeting at 10"));
    }

    #[tokio::test]
    async fn test_analyze_prompt() {
        let answer = analyze_message(&host(), &EchoBackend, "m1").await.unwrap();
        assert!(answer.contains("urgency"));
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let err = summarize_message(&host(), &EchoBackend, "m2").await.unwrap_err();
        assert!(matches!(err, MailsorterError::Prompt(PromptError::ContentMissing(_))));
    }

    #[tokio::test]
    async fn test_unimplemented_backend_error_surfaces() {
        let backend = UnimplementedBackend::new("openai");
        let err = analyze_message(&host(), &backend, "m1").await.unwrap_err();
        assert!(matches!(err, MailsorterError::Model(ModelError::NotImplemented { .. })));
    }
}
