use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of `GET /sd-models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Body of `POST /options` when switching checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsUpdate {
    pub sd_model_checkpoint: String,
}

/// `GET /progress`, read fresh on every poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub state: ProgressState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default)]
    pub job_count: i64,
}

impl ProgressSnapshot {
    pub fn job_count(&self) -> i64 {
        self.state.job_count
    }
}

/// Response of the txt2img/img2img endpoints. Fields other than `images`
/// (`parameters`, `info`) are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// First-stage text-to-image request of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Txt2ImgPayload {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f64,
    pub sampler_name: String,
    pub batch_size: u32,
    pub n_iter: u32,
    pub seed: i64,
    pub restore_faces: bool,
    pub tiling: bool,
    pub do_not_save_samples: bool,
    pub do_not_save_grid: bool,
}

/// Refinement request run on top of a previously generated image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Img2ImgPayload {
    pub init_images: Vec<String>,
    pub denoising_strength: f64,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f64,
    pub sampler_name: String,
    pub batch_size: u32,
    pub n_iter: u32,
    pub seed: i64,
    pub restore_faces: bool,
    pub do_not_save_samples: bool,
    pub do_not_save_grid: bool,
}

/// Request body of the ReActor `/reactor/image` extension endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceSwapPayload {
    pub source_image: String,
    pub target_image: String,
    pub source_faces_index: Vec<u32>,
    pub face_index: Vec<u32>,
    pub scale: u32,
    pub upscale_visibility: u32,
    pub face_restorer: String,
    pub restorer_visibility: u32,
    pub restore_first: u32,
    pub model: String,
    pub gender_source: u32,
    pub gender_target: u32,
    pub save_to_file: u32,
    pub result_file_path: String,
    pub device: String,
    pub mask_face: u32,
    pub select_source: u32,
    pub upscale_force: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaceSwapOutput {
    #[serde(default)]
    pub image: Option<String>,
}
