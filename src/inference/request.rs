use crate::{Error, Result};
use serde::{Deserialize, Deserializer, de};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// Prompt and sampling settings shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationParams {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_steps", deserialize_with = "whole_u32")]
    pub steps: u32,
    #[serde(default = "default_dimension", deserialize_with = "whole_u32")]
    pub width: u32,
    #[serde(default = "default_dimension", deserialize_with = "whole_u32")]
    pub height: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_seed", deserialize_with = "whole_i64")]
    pub seed: i64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            steps: default_steps(),
            width: default_dimension(),
            height: default_dimension(),
            cfg_scale: default_cfg_scale(),
            sampler_name: default_sampler(),
            seed: default_seed(),
        }
    }
}

/// Integer fields arrive from JSON clients as `20` or `20.0`; both are
/// accepted, fractional values are not.
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(de::Error::custom(format!("expected a whole number, got {}", number))),
    }
}

fn whole_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = whole_number(deserializer)?;
    u32::try_from(n).map_err(|_| de::Error::custom(format!("{} is out of range", n)))
}

fn whole_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    whole_number(deserializer)
}

fn default_steps() -> u32 {
    20
}

fn default_dimension() -> u32 {
    512
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn default_sampler() -> String {
    "Euler a".to_string()
}

fn default_seed() -> i64 {
    -1
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Txt2Img,
    Img2Img,
    GetModels,
    Pipeline {
        params: GenerationParams,
        source_face: String,
    },
    FaceSwap {
        source_image: String,
        target_image: String,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Txt2Img => "txt2img",
            Self::Img2Img => "img2img",
            Self::GetModels => "get_models",
            Self::Pipeline { .. } => "pipeline",
            Self::FaceSwap { .. } => "face_swap",
        }
    }
}

/// One parsed `input` mapping.
///
/// `payload` is what gets forwarded for single-stage generation: the input
/// with the `task` and `model` keys removed.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub task: Task,
    pub model: Option<String>,
    pub payload: Map<String, Value>,
}

impl InferenceRequest {
    /// Classifies `input` and checks that each task carries what it needs.
    ///
    /// Fails with [`Error::InvalidRequest`] before anything touches the network.
    pub fn from_input(input: Value) -> Result<Self> {
        let Value::Object(mut payload) = input else {
            return Err(Error::invalid_request("input must be a JSON object"));
        };

        let task_name = match payload.remove("task") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(Error::invalid_request(format!(
                    "task must be a string, got {}",
                    other
                )));
            }
        };

        let model = match payload.remove("model") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(Error::invalid_request(format!(
                    "model must be a string, got {}",
                    other
                )));
            }
        };

        let task = match task_name.as_deref() {
            None | Some("txt2img") => Task::Txt2Img,
            Some("img2img") => Task::Img2Img,
            Some("get_models") => Task::GetModels,
            Some("pipeline") => {
                let source_face = non_empty_string(&payload, "for_reactor_image").ok_or_else(|| {
                    Error::invalid_request("for_reactor_image is required for pipeline generation")
                })?;
                let params = GenerationParams::deserialize(Value::Object(payload.clone()))
                    .map_err(|e| Error::invalid_request(format!("invalid generation parameters: {}", e)))?;
                Task::Pipeline {
                    params,
                    source_face,
                }
            }
            Some("face_swap") => {
                let source_image = non_empty_string(&payload, "source_image").ok_or_else(|| {
                    Error::invalid_request("source_image is required for face swap")
                })?;
                let target_image = non_empty_string(&payload, "target_image").ok_or_else(|| {
                    Error::invalid_request("target_image is required for face swap")
                })?;
                Task::FaceSwap {
                    source_image,
                    target_image,
                }
            }
            Some(other) => {
                warn!("Unknown task '{}', falling back to txt2img", other);
                Task::Txt2Img
            }
        };

        Ok(Self {
            task,
            model,
            payload,
        })
    }
}

fn non_empty_string(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
