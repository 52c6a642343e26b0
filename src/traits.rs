use std::sync::Arc;

use crate::errors::Result;
use crate::visualizer::Figure;
use ndarray::prelude::*;

/// A binary image classifier with a single sigmoid output.
pub trait BinaryClassifier: Send + Sync {
    /// Raw probability for a (1, 224, 224, 3) tensor.
    fn predict_probability(&self, tensor: ArrayView4<f32>) -> Result<f32>;

    /// Human readable description of the model's inputs and outputs.
    fn summary(&self) -> String;
}

/// Forward geocoding of a free-form address.
pub trait Geocoder {
    /// `Ok(None)` when the service knows no match for `address`.
    fn geocode(&self, address: &str) -> Result<Option<String>>;
}

/// Shows a prediction figure to the user.
pub trait Visualizer {
    fn show(&self, figure: &Figure) -> Result<()>;
}

impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    fn geocode(&self, address: &str) -> Result<Option<String>> {
        (**self).geocode(address)
    }
}

impl<T: Visualizer + ?Sized> Visualizer for Arc<T> {
    fn show(&self, figure: &Figure) -> Result<()> {
        (**self).show(figure)
    }
}

impl<T: BinaryClassifier + ?Sized> BinaryClassifier for Arc<T> {
    fn predict_probability(&self, tensor: ArrayView4<f32>) -> Result<f32> {
        (**self).predict_probability(tensor)
    }

    fn summary(&self) -> String {
        (**self).summary()
    }
}
