//! Narrative beat generation on top of the LLM port.
//!
//! Builds the chat request (system prompt, history, turn prompt) and turns the
//! backend's reply into a validated [`SceneDraft`]. A reply that cannot be
//! parsed or validated is an error; partial scenes are never returned.

use std::sync::Arc;

use taleforge_domain::{GameSettings, History, HistoryRole, SceneDraft};

use super::prompts;
use super::SceneGenerationError;
use crate::infrastructure::ports::{ChatMessage, LlmPort, LlmRequest};

/// Writes the next narrative beat of a story.
#[derive(Clone)]
pub struct SceneWriter {
    llm: Arc<dyn LlmPort>,
}

impl SceneWriter {
    pub fn new(llm: Arc<dyn LlmPort>) -> Self {
        Self { llm }
    }

    /// Ask the backend for the scene that follows `history`.
    ///
    /// `action_intent` is the intent of the option the player chose; `None`
    /// requests the opening scene.
    pub async fn next_scene(
        &self,
        settings: &GameSettings,
        history: &History,
        action_intent: Option<&str>,
    ) -> Result<SceneDraft, SceneGenerationError> {
        let request = build_request(settings, history, action_intent);
        let response = self.llm.generate(request).await?;

        parse_scene_draft(&response.content)
    }
}

fn build_request(
    settings: &GameSettings,
    history: &History,
    action_intent: Option<&str>,
) -> LlmRequest {
    let mut messages: Vec<ChatMessage> = history
        .iter()
        .map(|item| match item.role {
            HistoryRole::User => ChatMessage::user(item.text()),
            HistoryRole::Model => ChatMessage::assistant(item.text()),
        })
        .collect();
    messages.push(ChatMessage::user(prompts::turn_prompt(action_intent)));

    LlmRequest::new(messages)
        .with_system_prompt(prompts::system_prompt(settings))
        .expecting_json()
}

/// Extract and validate the scene object from a backend reply.
///
/// Tolerates prose or code fences around the object by slicing from the first
/// `{` to the last `}`.
pub(crate) fn parse_scene_draft(content: &str) -> Result<SceneDraft, SceneGenerationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(SceneGenerationError::EmptyResponse);
    }

    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if end > start => &content[start..=end],
        _ => {
            return Err(SceneGenerationError::Malformed(
                "response did not contain a JSON object".to_string(),
            ))
        }
    };

    let draft: SceneDraft = serde_json::from_str(json_str).map_err(|e| {
        tracing::warn!(error = %e, json = %json_str, "Failed to parse scene JSON");
        SceneGenerationError::Malformed(e.to_string())
    })?;

    Ok(draft.into_validated()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        LlmError, LlmResponse, MessageRole, MockLlmPort, ResponseFormat,
    };
    use crate::test_fixtures::{scene_json, test_settings};
    use taleforge_domain::{MusicMood, SceneOption};

    #[test]
    fn parses_a_bare_scene_object() {
        let draft =
            parse_scene_draft(&scene_json("The gate creaks open.", 3)).expect("valid scene");

        assert_eq!(draft.narrative, "The gate creaks open.");
        assert_eq!(draft.options.len(), 3);
        assert_eq!(draft.music_config.mood, MusicMood::Mysterious);
    }

    #[test]
    fn parses_a_fenced_scene_object() {
        let fenced = format!("```json\n{}\n```", scene_json("Fog rolls in.", 2));

        let draft = parse_scene_draft(&fenced).expect("valid scene");

        assert_eq!(draft.narrative, "Fog rolls in.");
    }

    #[test]
    fn blank_reply_is_an_empty_response() {
        assert!(matches!(
            parse_scene_draft("  \n "),
            Err(SceneGenerationError::EmptyResponse)
        ));
    }

    #[test]
    fn prose_without_json_is_malformed() {
        assert!(matches!(
            parse_scene_draft("Once upon a time..."),
            Err(SceneGenerationError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_mood_is_malformed() {
        let reply = r#"{
            "narrative": "A storm.",
            "visualPrompt": "storm over sea",
            "musicConfig": {"mood": "jolly", "tempo": "fast"},
            "options": [{"text": "a", "intent": "a"}, {"text": "b", "intent": "b"}]
        }"#;

        assert!(matches!(
            parse_scene_draft(reply),
            Err(SceneGenerationError::Malformed(_))
        ));
    }

    #[test]
    fn too_many_options_is_an_invalid_scene() {
        assert!(matches!(
            parse_scene_draft(&scene_json("Crowded crossroads.", 5)),
            Err(SceneGenerationError::InvalidScene(_))
        ));
    }

    #[test]
    fn single_option_is_an_invalid_scene() {
        assert!(matches!(
            parse_scene_draft(&scene_json("Dead end.", 1)),
            Err(SceneGenerationError::InvalidScene(_))
        ));
    }

    #[test]
    fn request_replays_history_then_the_turn_prompt() {
        let mut history = History::new();
        history.record_selection(
            "The gate creaks open.",
            &SceneOption::new("Step inside", "enter"),
        );

        let request = build_request(&test_settings(), &history, Some("enter"));

        assert_eq!(request.response_format, ResponseFormat::Json);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, MessageRole::Assistant);
        assert_eq!(request.messages[0].content, "The gate creaks open.");
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.messages[1].content, "I choose to: Step inside");
        assert_eq!(
            request.last_message(),
            Some("Player chose: enter. Generate the next scene consequences and situation.")
        );
        assert!(request
            .system_prompt
            .as_deref()
            .is_some_and(|p| p.contains("Target Language: English")));
    }

    #[tokio::test]
    async fn opening_scene_uses_the_start_prompt() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .withf(|request| {
                request.messages.len() == 1 && request.last_message() == Some("Start the story.")
            })
            .times(1)
            .returning(|_| Ok(LlmResponse::stop(scene_json("It begins.", 2))));

        let writer = SceneWriter::new(Arc::new(llm));
        let draft = writer
            .next_scene(&test_settings(), &History::new(), None)
            .await
            .expect("scene generated");

        assert_eq!(draft.narrative, "It begins.");
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".to_string())));

        let writer = SceneWriter::new(Arc::new(llm));
        let result = writer.next_scene(&test_settings(), &History::new(), None).await;

        assert!(matches!(result, Err(SceneGenerationError::Backend(_))));
    }
}
