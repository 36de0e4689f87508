//! Error types for port operations.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Service unavailable")]
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("Nothing to synthesize")]
    EmptyScript,
}
