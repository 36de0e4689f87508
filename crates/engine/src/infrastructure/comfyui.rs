//! ComfyUI image generation client
//!
//! Renders scene illustrations: queue a text-to-image workflow, poll the
//! history endpoint until it completes, then download the first output image.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use crate::infrastructure::ports::{ImageGenError, ImageGenPort, ImageRequest, ImageResult};

/// Default ComfyUI base URL.
pub const DEFAULT_COMFYUI_BASE_URL: &str = "http://localhost:8188";

/// Default Stable Diffusion checkpoint used by the scene workflow.
pub const DEFAULT_CHECKPOINT: &str = "v1-5-pruned-emaonly.ckpt";

const NEGATIVE_PROMPT: &str = "text, watermark, signature, bad quality, blurry, ugly";

/// Client for ComfyUI API
#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
    checkpoint: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ComfyUIClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            checkpoint: DEFAULT_CHECKPOINT.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 120,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Into<String>) -> Self {
        self.checkpoint = checkpoint.into();
        self
    }

    async fn queue_prompt(&self, workflow: serde_json::Value) -> Result<String, ImageGenError> {
        let request = QueuePromptRequest {
            prompt: workflow,
            client_id: uuid::Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        let queued: QueueResponse = read_json(response).await?;
        Ok(queued.prompt_id)
    }

    async fn find_output(&self, prompt_id: &str) -> Result<Option<ImageOutput>, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        let history: HistoryResponse = read_json(response).await?;
        let Some(entry) = history.prompts.get(prompt_id) else {
            return Ok(None);
        };
        if !entry.status.completed {
            return Ok(None);
        }

        entry
            .outputs
            .values()
            .filter_map(|node| node.images.as_ref())
            .flat_map(|images| images.iter())
            .next()
            .cloned()
            .map(Some)
            .ok_or_else(|| ImageGenError::GenerationFailed("No images in output".to_string()))
    }

    async fn wait_for_output(&self, prompt_id: &str) -> Result<ImageOutput, ImageGenError> {
        for _ in 0..self.max_polls {
            if let Some(output) = self.find_output(prompt_id).await? {
                return Ok(output);
            }
            sleep(self.poll_interval).await;
        }

        Err(ImageGenError::GenerationFailed(format!(
            "Prompt {} did not complete after {} polls",
            prompt_id, self.max_polls
        )))
    }

    async fn download(&self, output: &ImageOutput) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", output.filename.as_str()),
                ("subfolder", output.subfolder.as_str()),
                ("type", output.r#type.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageGenError::GenerationFailed(format!(
                "Image download returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }
}

#[async_trait]
impl ImageGenPort for ComfyUIClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        let workflow = build_workflow(&request, &self.checkpoint, rand::random::<u32>());
        let prompt_id = self.queue_prompt(workflow).await?;
        tracing::debug!(prompt_id = %prompt_id, "Queued scene image workflow");

        let output = self.wait_for_output(&prompt_id).await?;
        let image_data = self.download(&output).await?;

        Ok(ImageResult {
            image_data,
            format: image_format(&output.filename).to_string(),
        })
    }

    async fn check_health(&self) -> Result<bool, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/system_stats", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|_| ImageGenError::Unavailable)?;

        Ok(response.status().is_success())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ImageGenError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ImageGenError::GenerationFailed(format!(
            "{}: {}",
            status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
}

/// Format name for a ComfyUI output file, defaulting to png.
fn image_format(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "jpeg"
    } else if lower.ends_with(".webp") {
        "webp"
    } else {
        "png"
    }
}

/// Text-to-image graph: checkpoint -> prompts -> sampler -> decode -> save.
fn build_workflow(request: &ImageRequest, checkpoint: &str, seed: u32) -> serde_json::Value {
    serde_json::json!({
        "checkpoint": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": { "ckpt_name": checkpoint }
        },
        "positive": {
            "class_type": "CLIPTextEncode",
            "inputs": { "text": request.prompt, "clip": ["checkpoint", 1] }
        },
        "negative": {
            "class_type": "CLIPTextEncode",
            "inputs": { "text": NEGATIVE_PROMPT, "clip": ["checkpoint", 1] }
        },
        "latent": {
            "class_type": "EmptyLatentImage",
            "inputs": { "width": request.width, "height": request.height, "batch_size": 1 }
        },
        "sampler": {
            "class_type": "KSampler",
            "inputs": {
                "seed": seed,
                "steps": 20,
                "cfg": 7.0,
                "sampler_name": "euler",
                "scheduler": "normal",
                "denoise": 1.0,
                "model": ["checkpoint", 0],
                "positive": ["positive", 0],
                "negative": ["negative", 0],
                "latent_image": ["latent", 0]
            }
        },
        "decode": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["sampler", 0], "vae": ["checkpoint", 2] }
        },
        "save": {
            "class_type": "SaveImage",
            "inputs": { "filename_prefix": "taleforge_scene", "images": ["decode", 0] }
        }
    })
}

// =============================================================================
// ComfyUI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    prompts: HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
struct PromptHistory {
    outputs: HashMap<String, NodeOutput>,
    status: PromptStatus,
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    images: Option<Vec<ImageOutput>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageOutput {
    filename: String,
    subfolder: String,
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct PromptStatus {
    completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_carries_prompt_size_and_checkpoint() {
        let request = ImageRequest {
            prompt: "a lighthouse in a storm, oil painting".to_string(),
            width: 768,
            height: 512,
        };

        let workflow = build_workflow(&request, "dreamshaper.safetensors", 42);

        assert_eq!(workflow["positive"]["inputs"]["text"], request.prompt);
        assert_eq!(workflow["latent"]["inputs"]["width"], 768);
        assert_eq!(workflow["latent"]["inputs"]["height"], 512);
        assert_eq!(workflow["sampler"]["inputs"]["seed"], 42);
        assert_eq!(
            workflow["checkpoint"]["inputs"]["ckpt_name"],
            "dreamshaper.safetensors"
        );
    }

    #[test]
    fn image_format_follows_extension() {
        assert_eq!(image_format("scene_0001.png"), "png");
        assert_eq!(image_format("scene_0001.JPG"), "jpeg");
        assert_eq!(image_format("scene_0001.webp"), "webp");
        assert_eq!(image_format("scene_0001"), "png");
    }

    #[test]
    fn history_parses_completed_prompt() {
        let history: HistoryResponse = serde_json::from_str(
            r#"{
                "abc": {
                    "outputs": {
                        "save": { "images": [{ "filename": "x.png", "subfolder": "", "type": "output" }] }
                    },
                    "status": { "status_str": "success", "completed": true }
                }
            }"#,
        )
        .expect("history parses");

        let entry = history.prompts.get("abc").expect("prompt present");
        assert!(entry.status.completed);
        assert_eq!(entry.outputs.len(), 1);
    }
}
