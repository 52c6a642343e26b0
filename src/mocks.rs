use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::prelude::*;
use parking_lot::Mutex;

use crate::errors::{DetectorError, Result};
use crate::traits::{BinaryClassifier, Geocoder, Visualizer};
use crate::visualizer::Figure;

/// Classifier that always answers with the same probability.
#[derive(Debug)]
pub struct FixedProbabilityModel {
    probability: f32,
    calls: AtomicUsize,
}

impl FixedProbabilityModel {
    pub const fn new(probability: f32) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BinaryClassifier for FixedProbabilityModel {
    fn predict_probability(&self, tensor: ArrayView4<f32>) -> Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tensor.shape()[3] != 3 {
            return Err(DetectorError::Model {
                operation: "mock inference".to_string(),
                reason: format!("unexpected tensor shape {:?}", tensor.shape()),
            });
        }
        Ok(self.probability)
    }

    fn summary(&self) -> String {
        format!("Mock model (always {})", self.probability)
    }
}

/// Classifier whose inference always fails.
#[derive(Debug, Default)]
pub struct FailingModel;

impl BinaryClassifier for FailingModel {
    fn predict_probability(&self, _tensor: ArrayView4<f32>) -> Result<f32> {
        Err(DetectorError::Model {
            operation: "mock inference".to_string(),
            reason: "inference failed".to_string(),
        })
    }

    fn summary(&self) -> String {
        "Failing mock model".to_string()
    }
}

#[derive(Debug, Clone)]
enum GeocodeAnswer {
    Resolved(String),
    NoMatch,
    Failure,
}

/// Geocoder with a canned answer that records its queries.
#[derive(Debug)]
pub struct MockGeocoder {
    answer: GeocodeAnswer,
    queries: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn resolving(address: &str) -> Self {
        Self::with_answer(GeocodeAnswer::Resolved(address.to_string()))
    }

    pub fn no_match() -> Self {
        Self::with_answer(GeocodeAnswer::NoMatch)
    }

    pub fn failing() -> Self {
        Self::with_answer(GeocodeAnswer::Failure)
    }

    fn with_answer(answer: GeocodeAnswer) -> Self {
        Self {
            answer,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn last_query(&self) -> Option<String> {
        self.queries.lock().last().cloned()
    }
}

impl Geocoder for MockGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<String>> {
        self.queries.lock().push(address.to_string());
        match &self.answer {
            GeocodeAnswer::Resolved(found) => Ok(Some(found.clone())),
            GeocodeAnswer::NoMatch => Ok(None),
            GeocodeAnswer::Failure => Err(DetectorError::Geocoding {
                reason: "service unreachable".to_string(),
            }),
        }
    }
}

/// Visualizer that keeps the captions of every figure it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingVisualizer {
    shown: Mutex<Vec<String>>,
}

impl RecordingVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().clone()
    }
}

impl Visualizer for RecordingVisualizer {
    fn show(&self, figure: &Figure) -> Result<()> {
        self.shown.lock().push(figure.image_title.clone());
        Ok(())
    }
}
