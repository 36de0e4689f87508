//! Image and speech fakes for tests that never reach ComfyUI or a speech server.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::infrastructure::ports::{
    AudioResult, ImageGenError, ImageGenPort, ImageRequest, ImageResult, SpeechError, SpeechPort,
    SpeechRequest,
};

/// Returns a 1x1 PNG for every prompt.
pub struct StaticImageGen {
    call_count: AtomicUsize,
}

impl StaticImageGen {
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Minimal 1x1 transparent PNG.
    pub fn minimal_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
            0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
            0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, // RGBA + CRC
            0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
            0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4,
            0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82, // IEND
        ]
    }
}

impl Default for StaticImageGen {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenPort for StaticImageGen {
    async fn generate(&self, _request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(ImageResult {
            image_data: Self::minimal_png(),
            format: "png".to_string(),
        })
    }

    async fn check_health(&self) -> Result<bool, ImageGenError> {
        Ok(true)
    }
}

/// Image backend that is always down.
pub struct FailingImageGen;

#[async_trait]
impl ImageGenPort for FailingImageGen {
    async fn generate(&self, _request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        Err(ImageGenError::Unavailable)
    }

    async fn check_health(&self) -> Result<bool, ImageGenError> {
        Ok(false)
    }
}

/// Returns the script text as "audio" so tests can see what was spoken.
pub struct StaticSpeech {
    call_count: AtomicUsize,
}

impl StaticSpeech {
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for StaticSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechPort for StaticSpeech {
    async fn synthesize(&self, request: SpeechRequest) -> Result<AudioResult, SpeechError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(AudioResult {
            audio_data: request.script().into_bytes(),
            format: "mp3".to_string(),
        })
    }
}

/// Speech backend that always fails.
pub struct FailingSpeech;

#[async_trait]
impl SpeechPort for FailingSpeech {
    async fn synthesize(&self, _request: SpeechRequest) -> Result<AudioResult, SpeechError> {
        Err(SpeechError::SynthesisFailed("voice server offline".to_string()))
    }
}
