pub mod batch;
pub mod config;
pub mod console;
pub mod detector;
pub mod errors;
pub mod history;
pub mod image_processor;
pub mod location;
pub mod logging;
pub mod menu;
pub mod model;
pub mod prediction;
pub mod traits;
pub mod visualizer;

pub mod mocks;

pub use config::{Config, RunMode};
pub use console::{CancellationToken, Console};
pub use detector::AccidentDetector;
pub use errors::{DetectorError, Result};
pub use history::{HistorySummary, ResultsHistory};
pub use model::Model;
pub use prediction::{Class, ModelVerdict, PredictionResult};
pub use traits::*;
