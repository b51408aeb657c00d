use serde::{Deserialize, Serialize};

/// Body of a successful `POST /diagnose`. `confidence` is the raw top-1
/// probability; `confidence_display` is the fixed two-decimal rendering the
/// front-end shows verbatim.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiagnosisResponse {
    pub label: String,
    pub confidence: f32,
    pub confidence_display: String,
    pub remedy: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
