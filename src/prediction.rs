use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::errors::{DetectorError, Result};
use crate::image_processor::PreparedImage;
use crate::traits::BinaryClassifier;

/// Raw scores below this threshold are classified as an accident.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// The two class names, in the order the models were trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    Accident,
    NonAccident,
}

impl Class {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accident => "accident",
            Self::NonAccident => "non_accident",
        }
    }

    pub const fn is_accident(self) -> bool {
        matches!(self, Self::Accident)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model's verdict as it is stored in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelVerdict {
    pub prediction: Class,
    pub confidence: f64,
}

impl ModelVerdict {
    /// Class index 0 (accident) when `p < 0.5`, otherwise 1 (non accident).
    /// Confidence is the probability mass of the chosen class.
    pub fn from_probability(p: f32) -> Self {
        let p = f64::from(p);
        if p < DECISION_THRESHOLD {
            Self {
                prediction: Class::Accident,
                confidence: 1.0 - p,
            }
        } else {
            Self {
                prediction: Class::NonAccident,
                confidence: p,
            }
        }
    }

    pub const fn is_accident(&self) -> bool {
        self.prediction.is_accident()
    }
}

/// Output of a single model run on a prepared image.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub class: Class,
    pub confidence: f64,
    pub is_accident: bool,
    pub image: DynamicImage,
}

impl Prediction {
    pub const fn verdict(&self) -> ModelVerdict {
        ModelVerdict {
            prediction: self.class,
            confidence: self.confidence,
        }
    }
}

/// Runs `model` on the prepared tensor and applies the decision rule.
///
/// A score outside [0, 1] (NaN included) is an inference error.
pub fn predict<M: BinaryClassifier + ?Sized>(
    prepared: &PreparedImage,
    model: &M,
) -> Result<Prediction> {
    let p = model.predict_probability(prepared.tensor.view())?;
    if !(0.0..=1.0).contains(&p) {
        return Err(DetectorError::Model {
            operation: "interpret model output".to_string(),
            reason: format!("probability {} is outside [0, 1]", p),
        });
    }
    let verdict = ModelVerdict::from_probability(p);
    Ok(Prediction {
        class: verdict.prediction,
        confidence: verdict.confidence,
        is_accident: verdict.is_accident(),
        image: prepared.image.clone(),
    })
}

/// A history entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub timestamp: String,
    pub image_path: String,
    pub final_model: ModelVerdict,
    pub best_model: ModelVerdict,
    pub accident_detected: bool,
}

impl PredictionResult {
    pub fn new(
        timestamp: String,
        image_path: String,
        final_model: ModelVerdict,
        best_model: ModelVerdict,
    ) -> Self {
        Self {
            timestamp,
            image_path,
            accident_detected: final_model.is_accident() || best_model.is_accident(),
            final_model,
            best_model,
        }
    }

    /// Local time without offset, e.g. `2024-05-01T13:45:10.123456`.
    pub fn now_timestamp() -> String {
        chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string()
    }
}
