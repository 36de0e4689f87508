//! Prompt text for the narrative backend.

use taleforge_domain::GameSettings;

use crate::infrastructure::ports::{Speaker, SpeechRequest, SpeechSegment};

/// Final user message for the opening scene.
pub const START_PROMPT: &str = "Start the story.";

const MUSIC_MOOD_GUIDE: &str = "Music Mood Guide:
- epic: Major scales, heroic, broad.
- mysterious: Dorian/Minor, inquisitive, light tension.
- ominous: Phrygian/Locrian, dark, dangerous, horror.
- melancholic: Minor, slow, sad, emotional.
- cybernetic: Techy, repetitive, synthetic, futuristic.
- peaceful: Lydian/Major, calm, nature.
- action: Fast, rhythmic, intense.";

/// System prompt describing the story setup and the JSON contract.
pub fn system_prompt(settings: &GameSettings) -> String {
    let language = settings.language().english_name();

    format!(
        r#"You are an advanced visual novel engine.
Settings: Genre={genre}, Hero={hero}, Role={role}, Trait={character_trait}.
Target Language: {language}.

Your task is to generate the next scene in the story.

CRITICAL INSTRUCTION:
The "narrative", "dialogue", and "options[].text" fields MUST be written in {language}.
The "visualPrompt" and "musicConfig" must remain in English/Technical format.

Respond with a single JSON object of this shape:
{{
  "narrative": "Descriptive text of what is happening, setting the scene (in {language}).",
  "dialogue": "Optional spoken text by characters (in {language}).",
  "visualPrompt": "A highly detailed, artistic description of the current scene for an image generator. Include style keywords matching the genre (e.g. 'cinematic lighting', 'oil painting style' for fantasy, 'digital art' for sci-fi). Do not include text in the image. (Write this in English).",
  "musicConfig": {{
    "mood": "epic|mysterious|ominous|melancholic|cybernetic|peaceful|action",
    "tempo": "slow|medium|fast"
  }},
  "options": [
    {{ "text": "Action choice 1 (in {language})", "intent": "Description of intent (in English)" }},
    {{ "text": "Action choice 2 (in {language})", "intent": "Description of intent (in English)" }},
    {{ "text": "Action choice 3 (in {language})", "intent": "Description of intent (in English)" }}
  ]
}}

{mood_guide}

Keep the narrative engaging but concise (under 150 words). Provide 2-4 distinct choices."#,
        genre = settings.genre().display_name(),
        hero = settings.protagonist_name(),
        role = settings.role(),
        character_trait = settings.character_trait(),
        language = language,
        mood_guide = MUSIC_MOOD_GUIDE,
    )
}

/// Final user message asking for the consequences of a choice.
pub fn action_prompt(intent: &str) -> String {
    format!(
        "Player chose: {}. Generate the next scene consequences and situation.",
        intent
    )
}

/// The last message for a request: the action prompt, or the opening prompt.
pub fn turn_prompt(action_intent: Option<&str>) -> String {
    match action_intent {
        Some(intent) => action_prompt(intent),
        None => START_PROMPT.to_string(),
    }
}

/// Narrator reads the narrative; the protagonist voices the dialogue, if any.
pub fn narration_script(narrative: &str, dialogue: Option<&str>) -> SpeechRequest {
    let mut segments = vec![SpeechSegment {
        speaker: Speaker::Narrator,
        text: narrative.to_string(),
    }];

    if let Some(line) = dialogue.filter(|d| !d.trim().is_empty()) {
        segments.push(SpeechSegment {
            speaker: Speaker::Protagonist,
            text: line.to_string(),
        });
    }

    SpeechRequest { segments }
}
