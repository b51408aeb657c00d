use image::DynamicImage;

use crate::classifier::Classify;
use crate::error::ClassifierError;
use crate::remedies::RemedyTable;

/// One diagnosis, created fresh per request and owned by the caller. The
/// caller also keeps the decoded image it passed in, so the original upload
/// can be rendered alongside these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisResult {
    pub label: String,
    pub confidence: f32,
    pub remedy: String,
}

/// Composes the classifier and the remedy table. Stateless apart from the
/// two components it was constructed with; built once at startup and
/// injected into handlers.
pub struct DiagnosisPipeline<C: Classify> {
    classifier: C,
    remedies: RemedyTable,
}

impl<C: Classify> DiagnosisPipeline<C> {
    pub fn new(classifier: C, remedies: RemedyTable) -> Self {
        Self {
            classifier,
            remedies,
        }
    }

    /// Classify the image and attach the remedy for the predicted class.
    /// Classifier errors propagate unchanged; the remedy lookup never fails.
    pub fn diagnose(&self, image: &DynamicImage) -> Result<DiagnosisResult, ClassifierError> {
        let prediction = self.classifier.classify(image)?;
        let remedy = self.remedies.lookup(&prediction.label).to_string();
        Ok(DiagnosisResult {
            label: prediction.label,
            confidence: prediction.confidence,
            remedy,
        })
    }
}

/// The fixed two-decimal confidence rendering: 0.9321 -> "0.93".
pub fn format_confidence(confidence: f32) -> String {
    format!("{confidence:.2}")
}
