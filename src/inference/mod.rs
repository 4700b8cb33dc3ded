pub mod image;
mod orchestrator;
pub mod pipeline;
mod request;
mod response;

pub use orchestrator::Orchestrator;
pub use request::{GenerationParams, InferenceRequest, Task};
pub use response::{ErrorEnvelope, InferenceResponse};
