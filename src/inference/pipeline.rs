//! Multi-stage generation: txt2img, img2img refinement, then a ReActor face
//! swap that composites the caller's face onto the generated image.
//!
//! Each stage gets its own request value built from [`GenerationParams`];
//! nothing is shared or mutated between stages.

use super::{
    image::{inspect_base64_image, to_data_uri},
    request::GenerationParams,
    response::InferenceResponse,
};
use crate::{
    Result,
    clock::Clock,
    config::PipelineConfig,
    progress::ProgressWatcher,
    upstream::{
        FaceSwapOutput, FaceSwapPayload, GenerationOutput, Img2ImgPayload, Txt2ImgPayload,
        UpstreamClient, UpstreamResponse,
    },
};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MIN_TXT2IMG_STEPS: u32 = 15;
pub const MIN_REFINE_STEPS: u32 = 10;
pub const REFINE_DENOISING_STRENGTH: f64 = 0.3;

const FACE_SWAP_MODEL: &str = "inswapper_128.onnx";
const FACE_RESTORER: &str = "GFPGAN";
const FACE_SWAP_DEVICE: &str = "CUDA";
const FACE_SWAP_SCALE: u32 = 2;

pub const INVALID_STAGE_ONE_IMAGE: &str = "Generated image from txt2img is invalid or corrupted";
pub const FACE_SWAP_NO_IMAGE: &str = "Face swap returned no image";

pub fn txt2img_stage(params: &GenerationParams) -> Txt2ImgPayload {
    Txt2ImgPayload {
        prompt: params.prompt.clone(),
        negative_prompt: params.negative_prompt.clone(),
        steps: params.steps.max(MIN_TXT2IMG_STEPS),
        width: params.width,
        height: params.height,
        cfg_scale: params.cfg_scale,
        sampler_name: params.sampler_name.clone(),
        batch_size: 1,
        n_iter: 1,
        seed: params.seed,
        restore_faces: false,
        tiling: false,
        do_not_save_samples: true,
        do_not_save_grid: true,
    }
}

pub fn refine_stage(params: &GenerationParams, init_image: &str) -> Img2ImgPayload {
    Img2ImgPayload {
        init_images: vec![init_image.to_string()],
        denoising_strength: REFINE_DENOISING_STRENGTH,
        prompt: params.prompt.clone(),
        negative_prompt: params.negative_prompt.clone(),
        steps: params.steps.max(MIN_REFINE_STEPS),
        width: params.width,
        height: params.height,
        cfg_scale: params.cfg_scale,
        sampler_name: params.sampler_name.clone(),
        batch_size: 1,
        n_iter: 1,
        seed: params.seed,
        restore_faces: true,
        do_not_save_samples: true,
        do_not_save_grid: true,
    }
}

pub fn face_swap_request(source_face: &str, target_image: &str) -> FaceSwapPayload {
    FaceSwapPayload {
        source_image: to_data_uri(source_face),
        target_image: to_data_uri(target_image),
        source_faces_index: vec![0],
        face_index: vec![0],
        scale: FACE_SWAP_SCALE,
        upscale_visibility: 1,
        face_restorer: FACE_RESTORER.to_string(),
        restorer_visibility: 1,
        restore_first: 1,
        model: FACE_SWAP_MODEL.to_string(),
        gender_source: 0,
        gender_target: 0,
        save_to_file: 0,
        result_file_path: String::new(),
        device: FACE_SWAP_DEVICE.to_string(),
        mask_face: 1,
        select_source: 1,
        upscale_force: 1,
    }
}

/// Turns a `/reactor/image` answer into the job result.
///
/// Only a 200 with a non-empty `image` counts as success; anything else is an
/// error envelope carrying the status and body.
pub fn face_swap_result(response: UpstreamResponse) -> InferenceResponse {
    if response.is_ok() {
        if let Ok(FaceSwapOutput { image: Some(image) }) = response.json::<FaceSwapOutput>() {
            if !image.is_empty() {
                return InferenceResponse::images(vec![image]);
            }
        }
    }

    warn!("Face swap answered {} without an image", response.status);
    InferenceResponse::error_with_details(
        FACE_SWAP_NO_IMAGE,
        format!("status {}: {}", response.status.as_u16(), response.body),
    )
}

/// Single-stage face swap between two caller-supplied images.
pub async fn relay_face_swap(
    client: &UpstreamClient,
    source_image: &str,
    target_image: &str,
) -> Result<InferenceResponse> {
    info!("Relaying face swap request");
    let response = client
        .face_swap(&face_swap_request(source_image, target_image))
        .await?;
    Ok(face_swap_result(response))
}

pub struct Pipeline<'a> {
    pub client: &'a UpstreamClient,
    pub clock: &'a dyn Clock,
    pub config: &'a PipelineConfig,
    pub watcher: &'a ProgressWatcher,
}

impl Pipeline<'_> {
    /// Runs all three stages. Transport errors propagate; upstream refusals
    /// and bad images come back as error envelopes. Nothing is retried across
    /// stages.
    pub async fn run(
        &self,
        params: &GenerationParams,
        source_face: &str,
    ) -> Result<InferenceResponse> {
        info!("=== PIPELINE GENERATION STARTED ===");

        let stage_one = txt2img_stage(params);
        info!(
            "Step 1: txt2img, steps={}, size={}x{}",
            stage_one.steps, stage_one.width, stage_one.height
        );

        let response = self.client.generate("txt2img", &stage_one).await?;
        if !response.is_ok() {
            return Ok(InferenceResponse::from_request_error(&response.into_error()));
        }

        let Some(generated) = first_valid_image(&response) else {
            return Ok(InferenceResponse::error(INVALID_STAGE_ONE_IMAGE));
        };
        info!("Step 1 completed successfully");

        self.clock
            .sleep(Duration::from_millis(self.config.stage_pause_ms))
            .await;
        if self.config.wait_for_idle && !self.watcher.wait_for_completion().await {
            warn!("WebUI did not report idle before refinement, continuing");
        }

        info!("Step 2: img2img refinement");
        let refine = refine_stage(params, &generated);
        let refined = self.client.generate("img2img", &refine).await?;
        if refined.is_ok() {
            debug!("Refinement finished, result superseded by face swap");
        } else {
            warn!("Refinement answered {}, continuing with face swap", refined.status);
        }

        info!("Step 3: face swap");
        let swapped = self
            .client
            .face_swap(&face_swap_request(source_face, &generated))
            .await?;
        let result = face_swap_result(swapped);

        if !result.is_error() {
            info!("=== PIPELINE GENERATION COMPLETED ===");
        }
        Ok(result)
    }
}

fn first_valid_image(response: &UpstreamResponse) -> Option<String> {
    let output = match response.json::<GenerationOutput>() {
        Ok(output) => output,
        Err(e) => {
            warn!("[INVALID IMAGE] txt2img body did not decode: {}", e);
            return None;
        }
    };

    let image = output.images.into_iter().next()?;
    match inspect_base64_image(&image) {
        Ok(image_info) => {
            info!(
                "Generated image is {}x{} ({} bytes)",
                image_info.width, image_info.height, image_info.byte_len
            );
            Some(image)
        }
        Err(e) => {
            warn!("[INVALID IMAGE] {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    fn params() -> GenerationParams {
        GenerationParams {
            prompt: "portrait".to_string(),
            steps: 8,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_txt2img_stage_enforces_minimum_steps() {
        let stage = txt2img_stage(&params());
        assert_eq!(stage.steps, MIN_TXT2IMG_STEPS);
        assert_eq!(stage.batch_size, 1);
        assert_eq!(stage.n_iter, 1);
        assert!(!stage.restore_faces);
        assert!(stage.do_not_save_samples);
        assert!(stage.do_not_save_grid);
        assert_eq!(stage.seed, 7);
    }

    #[test]
    fn test_txt2img_stage_keeps_higher_steps() {
        let params = GenerationParams {
            steps: 40,
            ..params()
        };
        assert_eq!(txt2img_stage(&params).steps, 40);
    }

    #[test]
    fn test_refine_stage_uses_init_image() {
        let stage = refine_stage(&params(), "IMG");
        assert_eq!(stage.init_images, vec!["IMG".to_string()]);
        assert_eq!(stage.denoising_strength, REFINE_DENOISING_STRENGTH);
        assert_eq!(stage.steps, MIN_REFINE_STEPS);
        assert!(stage.restore_faces);
        assert_eq!((stage.width, stage.height), (512, 512));
    }

    #[test]
    fn test_face_swap_request_wire_format() {
        let value = serde_json::to_value(face_swap_request("FACE", "TARGET")).unwrap();

        assert_eq!(value["source_image"], "data:image/png;base64,FACE");
        assert_eq!(value["target_image"], "data:image/png;base64,TARGET");
        assert_eq!(value["model"], "inswapper_128.onnx");
        assert_eq!(value["scale"], 2);
        assert_eq!(value["face_restorer"], "GFPGAN");
        assert_eq!(value["device"], "CUDA");
        assert_eq!(value["mask_face"], 1);
        assert_eq!(value["source_faces_index"], json!([0]));
    }

    #[test]
    fn test_face_swap_result_success() {
        let response = UpstreamResponse {
            status: StatusCode::OK,
            body: json!({"image": "SWAPPED"}).to_string(),
        };
        let value = serde_json::to_value(face_swap_result(response)).unwrap();
        assert_eq!(value, json!({"images": ["SWAPPED"]}));
    }

    #[test]
    fn test_face_swap_result_without_image_is_error() {
        let response = UpstreamResponse {
            status: StatusCode::OK,
            body: json!({"detail": "no face found"}).to_string(),
        };
        let result = face_swap_result(response);
        assert!(result.is_error());

        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["error"], FACE_SWAP_NO_IMAGE);
        assert!(value["details"].as_str().unwrap().contains("no face found"));
    }
}
