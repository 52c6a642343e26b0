use std::path::{Path, PathBuf};

use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;
use tracing::info;

use crate::{
    errors::{DetectorError, Result},
    image_processor::IMAGE_SIZE,
    traits::BinaryClassifier,
};

/// An ONNX export of one of the accident classifiers.
///
/// The session is locked per call since `Session::run` needs `&mut self`.
pub struct Model {
    name: String,
    path: PathBuf,
    input_name: String,
    session: Mutex<Session>,
}

impl Model {
    pub fn new(name: &str, model_path: &Path, device_id: i32) -> Result<Self> {
        let session = SessionBuilder::new()
            .map_err(|e| DetectorError::Model {
                operation: "session builder init".to_string(),
                reason: e.to_string(),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| DetectorError::Model {
                operation: "execution provider setup".to_string(),
                reason: e.to_string(),
            })?
            .with_memory_pattern(true)
            .map_err(|e| DetectorError::Model {
                operation: "memory pattern setup".to_string(),
                reason: e.to_string(),
            })?
            .commit_from_file(model_path)
            .map_err(|e| DetectorError::Model {
                operation: format!("load model file {}", model_path.display()),
                reason: e.to_string(),
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectorError::Model {
                operation: format!("inspect inputs of {}", model_path.display()),
                reason: "model declares no inputs".to_string(),
            })?;
        if session.outputs.is_empty() {
            return Err(DetectorError::Model {
                operation: format!("inspect outputs of {}", model_path.display()),
                reason: "model declares no outputs".to_string(),
            });
        }

        info!(model = name, path = %model_path.display(), input = %input_name, "model loaded");

        Ok(Self {
            name: name.to_string(),
            path: model_path.to_path_buf(),
            input_name,
            session: Mutex::new(session),
        })
    }
}

impl BinaryClassifier for Model {
    fn predict_probability(&self, tensor: ArrayView4<f32>) -> Result<f32> {
        let expected = [1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, 3];
        if tensor.shape() != &expected[..] {
            return Err(DetectorError::Model {
                operation: format!("{} inference", self.name),
                reason: format!("expected input shape {:?}, got {:?}", expected, tensor.shape()),
            });
        }

        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
        ])?;
        let probabilities = outputs[0].try_extract_array::<f32>()?;
        let first = probabilities.iter().next().copied();
        first.ok_or_else(|| DetectorError::Model {
            operation: format!("{} inference", self.name),
            reason: "model returned an empty output".to_string(),
        })
    }

    fn summary(&self) -> String {
        let session = self.session.lock();
        let mut lines = vec![format!("Model file: {}", self.path.display())];
        for input in &session.inputs {
            lines.push(format!("  input  {:<24} {:?}", input.name, input.input_type));
        }
        for output in &session.outputs {
            lines.push(format!("  output {:<24} {:?}", output.name, output.output_type));
        }
        lines.join("\n")
    }
}
