use std::env;
use std::path::PathBuf;

/// Server configuration. Defaults suit local development; every field can
/// be overridden with a `LEAFDOC_*` environment variable.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    /// Optional JSON file replacing the built-in remedy table.
    pub remedies_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            model_path: PathBuf::from("model.onnx"),
            labels_path: PathBuf::from("classes.txt"),
            remedies_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("LEAFDOC_BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_path: env::var("LEAFDOC_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            labels_path: env::var("LEAFDOC_LABELS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.labels_path),
            remedies_path: env::var("LEAFDOC_REMEDIES_PATH").ok().map(PathBuf::from),
        }
    }
}
