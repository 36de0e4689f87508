//! Speech synthesis client (OpenAI-compatible `/v1/audio/speech`)
//!
//! The endpoint speaks one voice per request, so a multi-speaker script is
//! rendered segment by segment and the audio is concatenated in script order.
//! MP3 frames concatenate into a playable stream.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::infrastructure::ports::{
    AudioResult, Speaker, SpeechError, SpeechPort, SpeechRequest, SpeechSegment,
};

/// Default speech server base URL.
pub const DEFAULT_SPEECH_BASE_URL: &str = "http://localhost:8880";

/// Default speech model.
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";

pub const DEFAULT_NARRATOR_VOICE: &str = "onyx";
pub const DEFAULT_PROTAGONIST_VOICE: &str = "nova";

const AUDIO_FORMAT: &str = "mp3";

/// Voice assignment per script speaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCast {
    pub narrator: String,
    pub protagonist: String,
}

impl VoiceCast {
    pub fn voice_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Narrator => &self.narrator,
            Speaker::Protagonist => &self.protagonist,
        }
    }
}

impl Default for VoiceCast {
    fn default() -> Self {
        Self {
            narrator: DEFAULT_NARRATOR_VOICE.to_string(),
            protagonist: DEFAULT_PROTAGONIST_VOICE.to_string(),
        }
    }
}

/// Client for an OpenAI-compatible speech server
#[derive(Clone)]
pub struct SpeechClient {
    client: Client,
    base_url: String,
    model: String,
    voices: VoiceCast,
}

impl SpeechClient {
    pub fn new(base_url: &str, model: &str, voices: VoiceCast) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            voices,
        }
    }

    async fn speak(&self, segment: &SpeechSegment) -> Result<Vec<u8>, SpeechError> {
        let body = speech_body(&self.model, &self.voices, segment);

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::SynthesisFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::SynthesisFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| SpeechError::SynthesisFailed(e.to_string()))
    }
}

#[async_trait]
impl SpeechPort for SpeechClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<AudioResult, SpeechError> {
        let segments: Vec<&SpeechSegment> = request
            .segments
            .iter()
            .filter(|segment| !segment.text.trim().is_empty())
            .collect();
        if segments.is_empty() {
            return Err(SpeechError::EmptyScript);
        }

        let mut audio_data = Vec::new();
        for segment in segments {
            tracing::debug!(
                speaker = segment.speaker.label(),
                chars = segment.text.len(),
                "Synthesizing narration segment"
            );
            audio_data.extend(self.speak(segment).await?);
        }

        Ok(AudioResult {
            audio_data,
            format: AUDIO_FORMAT.to_string(),
        })
    }
}

fn speech_body<'a>(
    model: &'a str,
    voices: &'a VoiceCast,
    segment: &'a SpeechSegment,
) -> SpeechBody<'a> {
    SpeechBody {
        model,
        input: segment.text.trim(),
        voice: voices.voice_for(segment.speaker),
        response_format: AUDIO_FORMAT,
    }
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}
