use serde::Deserialize;
use serde_json::Value;

/// One job as the serverless runtime delivers it.
#[derive(Debug, Deserialize)]
pub struct JobEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}
