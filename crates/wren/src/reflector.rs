//! A second-pass critique of the agent's draft answer.

use serde::Serialize;

use crate::models::message::Message;
use crate::models::role::Role;
use crate::prompt_template::render_prompt_file;
use crate::providers::base::Provider;

const REVISION_MARKER: &str = "REVISED:";

/// How many trailing history messages the critique prompt gets to see.
const HISTORY_TAIL: usize = 10;

#[derive(Serialize)]
struct ReflectionContext {
    history: String,
    draft: String,
}

pub struct Reflector;

impl Reflector {
    /// Ask the model to critique `draft` and return the revision when one
    /// is produced. Every failure path returns the draft unchanged; a
    /// broken reflection pass must never cost the user their answer.
    pub async fn refine(provider: &dyn Provider, history: &[Message], draft: &str) -> String {
        let context = ReflectionContext {
            history: format_history_tail(history),
            draft: draft.to_string(),
        };

        let prompt = match render_prompt_file("reflection.md", &context) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(error = %e, "failed to render reflection prompt");
                return draft.to_string();
            }
        };

        match provider.complete(&prompt, &[Message::user("Review the draft.")]).await {
            Ok((reply, _usage)) => match extract_revision(&reply.content) {
                Some(revision) => {
                    tracing::debug!("reflection produced a revision");
                    revision
                }
                None => draft.to_string(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "reflection call failed, keeping draft");
                draft.to_string()
            }
        }
    }
}

fn format_history_tail(history: &[Message]) -> String {
    history
        .iter()
        .filter(|m| m.role != Role::System)
        .rev()
        .take(HISTORY_TAIL)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_revision(reply: &str) -> Option<String> {
    let idx = reply.find(REVISION_MARKER)?;
    let revision = reply[idx + REVISION_MARKER.len()..].trim();
    if revision.is_empty() {
        None
    } else {
        Some(revision.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::errors::ProviderError;
    use crate::providers::mock::MockProvider;

    #[tokio::test]
    async fn test_revision_is_substituted() {
        let provider = MockProvider::new(vec![Message::assistant(
            "The draft misses the error case.\nREVISED:\nUse Result instead of panicking.",
        )]);
        let history = vec![Message::user("how should I handle errors?")];

        let refined = Reflector::refine(&provider, &history, "Just panic.").await;
        assert_eq!(refined, "Use Result instead of panicking.");
    }

    #[tokio::test]
    async fn test_ok_reply_keeps_draft() {
        let provider = MockProvider::new(vec![Message::assistant("OK")]);
        let refined = Reflector::refine(&provider, &[], "fine answer").await;
        assert_eq!(refined, "fine answer");
    }

    #[tokio::test]
    async fn test_idempotent_with_deterministic_provider() {
        let reply = "REVISED:\nimproved answer";
        let first = Reflector::refine(
            &MockProvider::new(vec![Message::assistant(reply)]),
            &[],
            "draft",
        )
        .await;
        let second = Reflector::refine(
            &MockProvider::new(vec![Message::assistant(reply)]),
            &[],
            "draft",
        )
        .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_draft() {
        let provider =
            MockProvider::failing(|| ProviderError::Server("temporarily unavailable".into()));
        let refined = Reflector::refine(&provider, &[], "the draft").await;
        assert_eq!(refined, "the draft");
    }

    #[test]
    fn test_empty_revision_is_ignored() {
        assert_eq!(extract_revision("REVISED:\n   "), None);
        assert_eq!(
            extract_revision("preamble\nREVISED: better").as_deref(),
            Some("better")
        );
    }

    #[test]
    fn test_history_tail_skips_system_and_keeps_order() {
        let mut history = vec![Message::system("sys")];
        for i in 0..12 {
            history.push(Message::user(format!("u{i}")));
        }
        let tail = format_history_tail(&history);
        assert!(!tail.contains("sys"));
        assert!(tail.starts_with("user: u2"));
        assert!(tail.ends_with("user: u11"));
    }
}
