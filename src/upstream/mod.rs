mod client;
mod retry;
mod types;

pub use client::{UpstreamClient, UpstreamResponse};
pub use retry::RetryPolicy;
pub use types::{
    FaceSwapOutput, FaceSwapPayload, GenerationOutput, Img2ImgPayload, ModelEntry,
    OptionsUpdate, ProgressSnapshot, ProgressState, Txt2ImgPayload,
};
