use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbaImage};
use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::error::ClassifierError;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 224;

// ImageNet normalization constants (RGB).
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

type RunnableOnnx = RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Top-1 prediction: the class label with the highest probability and that
/// probability as confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// The inference seam. The production implementation is [`OnnxClassifier`];
/// tests substitute a stub so the pipeline and handlers can be exercised
/// without model weights on disk.
pub trait Classify: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Prediction, ClassifierError>;
}

/// A pretrained ONNX image classifier. Loaded once at startup and shared
/// read-only across requests; `run` takes `&self`, so no locking is needed.
pub struct OnnxClassifier {
    model: RunnableOnnx,
    labels: Vec<String>,
}

impl OnnxClassifier {
    /// Load the model graph and its class-label list. Any failure here is
    /// fatal: the server cannot diagnose anything without a model.
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self, ClassifierError> {
        let labels = read_labels(labels_path)?;
        let model = onnx()
            .model_for_path(model_path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                ClassifierError::ModelLoad(model_path.display().to_string(), e.to_string())
            })?;
        Ok(Self { model, labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Classify for OnnxClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Prediction, ClassifierError> {
        let tensor = to_tensor(&fit_to_square(image));
        let input = tract_ndarray::Array4::from_shape_vec(
            (1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize),
            tensor.into_raw_vec(),
        )
        .map_err(|e| ClassifierError::Inference(e.to_string()))?
        .into_tensor();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let logits: Vec<f32> = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?
            .iter()
            .cloned()
            .collect();

        let probabilities = softmax(&logits);
        let (index, confidence) = top1(&probabilities)
            .ok_or_else(|| ClassifierError::Inference("model produced an empty output".into()))?;

        let label = self.labels.get(index).cloned().ok_or_else(|| {
            ClassifierError::Inference(format!(
                "predicted class index {index} is outside the label list ({} labels)",
                self.labels.len()
            ))
        })?;

        Ok(Prediction { label, confidence })
    }
}

/// Decode raw upload bytes into an image. Malformed input is a request-level
/// failure, never a panic.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Resize to fit INPUT_SIZE without distorting the aspect ratio, then center
/// on a black square canvas.
fn fit_to_square(image: &DynamicImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = if width > height {
        (INPUT_SIZE, (INPUT_SIZE * height) / width)
    } else {
        ((INPUT_SIZE * width) / height, INPUT_SIZE)
    };

    let resized = image.resize(new_width, new_height, image::imageops::FilterType::Triangle);

    let mut canvas = RgbaImage::new(INPUT_SIZE, INPUT_SIZE);
    let (resized_width, resized_height) = resized.dimensions();
    let pad_x = (INPUT_SIZE - resized_width) / 2;
    let pad_y = (INPUT_SIZE - resized_height) / 2;

    for y in 0..resized_height {
        for x in 0..resized_width {
            let pixel = resized.get_pixel(x, y);
            canvas.put_pixel(
                x + pad_x,
                y + pad_y,
                image::Rgba([pixel[0], pixel[1], pixel[2], 255]),
            );
        }
    }

    canvas
}

/// NCHW f32 tensor with ImageNet normalization.
fn to_tensor(image: &RgbaImage) -> Array4<f32> {
    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = image.get_pixel(x, y);
            for c in 0..3 {
                let value = (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
                tensor[[0, c, y as usize, x as usize]] = value;
            }
        }
    }
    tensor
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Argmax over the probability vector. Ties resolve to the last maximal
/// index, which is stable across repeated calls on the same input.
fn top1(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, &p)| (index, p))
}

fn read_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ClassifierError::Labels(path.display().to_string(), e.to_string()))?;
    let labels: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    if labels.is_empty() {
        return Err(ClassifierError::Labels(
            path.display().to_string(),
            "label file is empty".into(),
        ));
    }
    Ok(labels)
}
