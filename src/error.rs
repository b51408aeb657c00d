use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorBody;

/// Errors raised by the classifier, from model load to inference.
///
/// `ModelLoad` and `Labels` can only happen at startup and are fatal; the
/// server never binds without a working classifier. `Decode` is the caller's
/// fault and maps to 400, everything else to 500.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to load ONNX model from '{0}': {1}")]
    ModelLoad(String, String),
    #[error("Failed to read class labels from '{0}': {1}")]
    Labels(String, String),
    #[error("Could not decode uploaded image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ResponseError for ClassifierError {
    fn status_code(&self) -> StatusCode {
        match self {
            ClassifierError::Decode(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

/// Top-level application error, used during startup.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Remedy table error: {0}")]
    Remedies(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
