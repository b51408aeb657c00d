use std::collections::HashMap;
use std::path::Path;

use crate::error::AppError;

/// Returned for any class the table has no entry for.
pub const FALLBACK_REMEDY: &str = "No remedy found for this class";

const BUILTIN_REMEDIES: &[(&str, &str)] = &[
    (
        "Healthy",
        "No treatment needed.\nKeep up regular watering, avoid wetting the foliage, and \
         inspect the underside of leaves weekly so problems are caught early.",
    ),
    (
        "Apple Scab",
        "Rake up and destroy fallen leaves to remove overwintering spores.\nApply a \
         fungicide (captan or myclobutanil) at green tip and repeat every 10-14 days \
         through petal fall.\nPrune for an open canopy so leaves dry quickly.",
    ),
    (
        "Bacterial Spot",
        "Remove infected leaves and avoid overhead irrigation.\nSpray copper-based \
         bactericide at first sign and repeat weekly during wet weather.\nDo not work \
         among wet plants.",
    ),
    (
        "Early Blight",
        "Remove the lower infected leaves and mulch the soil surface.\nApply \
         chlorothalonil or a copper fungicide every 7-10 days.\nRotate crops: keep \
         tomatoes and potatoes out of the same bed for two years.",
    ),
    (
        "Late Blight",
        "Act immediately: remove and bag infected plants, do not compost them.\nProtect \
         remaining plants with a copper fungicide.\nWater at the base in the morning so \
         foliage dries before evening.",
    ),
    (
        "Leaf Mold",
        "Improve air circulation and lower humidity; in greenhouses ventilate and avoid \
         leaf wetness.\nRemove affected leaves and apply a protectant fungicide if the \
         infection spreads.",
    ),
    (
        "Powdery Mildew",
        "Prune to improve airflow and remove heavily coated leaves.\nSpray with \
         potassium bicarbonate, neem oil, or sulfur at the first white patches and \
         repeat every 7 days.",
    ),
    (
        "Rust",
        "Remove and destroy infected leaves as soon as pustules appear.\nAvoid overhead \
         watering.\nApply a sulfur or copper fungicide and repeat after rain.",
    ),
    (
        "Septoria Leaf Spot",
        "Strip off spotted lower leaves and mulch to stop soil splash.\nApply \
         chlorothalonil or copper fungicide every 7-10 days until the weather dries \
         out.\nStake plants to keep foliage off the ground.",
    ),
    (
        "Yellow Leaf Curl Virus",
        "There is no cure for infected plants; remove and destroy them to protect the \
         rest.\nControl the whitefly vector with insecticidal soap or reflective \
         mulches, and choose resistant varieties next season.",
    ),
];

/// Immutable disease-class to remedy-advice mapping. Built once at startup
/// and shared read-only; lookups are total and never fail.
pub struct RemedyTable {
    entries: HashMap<String, String>,
}

impl RemedyTable {
    /// The advice shipped with the backend.
    pub fn builtin() -> Self {
        let entries = BUILTIN_REMEDIES
            .iter()
            .map(|&(label, remedy)| (label.to_string(), remedy.to_string()))
            .collect();
        Self { entries }
    }

    /// Load a replacement table from a JSON object of label -> remedy text,
    /// for deployments that ship their own advice.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Remedies(format!("{}: {}", path.display(), e)))?;
        let entries: HashMap<String, String> = serde_json::from_str(&text)
            .map_err(|e| AppError::Remedies(format!("{}: {}", path.display(), e)))?;
        Ok(Self { entries })
    }

    /// Exact-match, case-sensitive lookup. Unknown labels get the fixed
    /// fallback string.
    pub fn lookup(&self, label: &str) -> &str {
        self.entries
            .get(label)
            .map(String::as_str)
            .unwrap_or(FALLBACK_REMEDY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
