//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (could swap Ollama -> any OpenAI-compatible server)
//! - Image generation (could swap ComfyUI -> other)
//! - Speech synthesis
//! - Clock (for testing)

mod error;
mod external;
mod testing;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    AudioResult, ChatMessage, FinishReason, ImageGenPort, ImageRequest, ImageResult, LlmPort,
    LlmRequest, LlmResponse, MessageRole, ResponseFormat, Speaker, SpeechPort, SpeechRequest,
    SpeechSegment, TokenUsage,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockImageGenPort, MockLlmPort, MockSpeechPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ImageGenError, LlmError, SpeechError};
