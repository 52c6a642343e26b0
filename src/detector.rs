use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::batch::{collect_image_files, BatchItem, BatchSummary};
use crate::console::CancellationToken;
use crate::errors::Result;
use crate::history::ResultsHistory;
use crate::image_processor::{preprocess, PreparedImage};
use crate::location::locate;
use crate::prediction::{predict, Prediction, PredictionResult};
use crate::traits::{BinaryClassifier, Geocoder, Visualizer};
use crate::visualizer::Figure;

pub const RULE: &str = "============================================================";
const RECENT_ENTRIES: usize = 10;

/// Runs the two classifiers and owns everything a session touches.
pub struct AccidentDetector<M: BinaryClassifier> {
    final_model: M,
    best_model: M,
    history: ResultsHistory,
    geocoder: Box<dyn Geocoder>,
    visualizer: Box<dyn Visualizer>,
    token: CancellationToken,
}

impl<M: BinaryClassifier> AccidentDetector<M> {
    pub fn new(
        final_model: M,
        best_model: M,
        history: ResultsHistory,
        geocoder: Box<dyn Geocoder>,
        visualizer: Box<dyn Visualizer>,
    ) -> Self {
        Self {
            final_model,
            best_model,
            history,
            geocoder,
            visualizer,
            token: CancellationToken::new(),
        }
    }

    /// Batch runs stop between files once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn history(&self) -> &ResultsHistory {
        &self.history
    }

    /// Runs both models on a prepared image. `None` when either inference
    /// fails; the error is logged.
    fn predict_both(&self, prepared: &PreparedImage) -> Option<(Prediction, Prediction)> {
        let run = |model: &M, name: &str| match predict(prepared, model) {
            Ok(prediction) => Some(prediction),
            Err(e) => {
                debug!(model = name, error = ?e, "inference failed");
                println!("Error running {}: {}", name, e);
                None
            }
        };
        let final_prediction = run(&self.final_model, "Final Model")?;
        let best_prediction = run(&self.best_model, "Best Model")?;
        Some((final_prediction, best_prediction))
    }

    /// Classifies one image, prints the verdicts, records the result and
    /// shows the figure. Returns the recorded entry.
    pub fn analyze_image(&mut self, image_path: &Path) -> Option<PredictionResult> {
        println!("\n{}", RULE);
        println!("ANALYZING IMAGE...");
        println!("{}", RULE);

        let prepared = preprocess(image_path)?;
        let (final_prediction, best_prediction) = self.predict_both(&prepared)?;

        println!("PREDICTION RESULTS:");
        println!(
            "Final Model: {} (Confidence: {:.2}%)",
            final_prediction.class,
            final_prediction.confidence * 100.0
        );
        println!(
            "Best Model:  {} (Confidence: {:.2}%)",
            best_prediction.class,
            best_prediction.confidence * 100.0
        );

        let result = PredictionResult::new(
            PredictionResult::now_timestamp(),
            image_path.display().to_string(),
            final_prediction.verdict(),
            best_prediction.verdict(),
        );

        if result.accident_detected {
            println!("\nACCIDENT DETECTED!");
            let location = locate(self.geocoder.as_ref());
            info!(image = %image_path.display(), location = %location, "accident detected");
            println!("Location: {}", location);
            println!("Alert system would be triggered!");
        } else {
            println!("\nNo accident detected");
        }

        if let Err(e) = self.history.append(result.clone()) {
            debug!(error = ?e, "history append failed");
            println!("Could not save results history: {}", e);
        }

        let figure = Figure::new(
            image_path,
            prepared.image,
            &final_prediction,
            &best_prediction,
        );
        if let Err(e) = self.visualizer.show(&figure) {
            debug!(error = ?e, "figure display failed");
            println!("Could not display prediction: {}", e);
        }

        Some(result)
    }

    /// Classifies every image directly inside `dir`. Batch results are only
    /// printed, never written to the history.
    pub fn batch_predict(&self, dir: &Path) -> Option<BatchSummary> {
        if !dir.exists() {
            println!("Directory not found: {}", dir.display());
            return None;
        }
        let image_files = match collect_image_files(dir) {
            Ok(files) => files,
            Err(e) => {
                debug!(dir = %dir.display(), error = ?e, "directory listing failed");
                println!("Could not read directory {}: {}", dir.display(), e);
                return None;
            }
        };
        if image_files.is_empty() {
            println!("No image files found in {}", dir.display());
            return None;
        }

        println!("\nProcessing {} images...", image_files.len());
        println!("{}", RULE);

        let progress_bar = ProgressBar::new(image_files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            progress_bar.set_style(style.progress_chars("#>-"));
        }

        let mut items = Vec::with_capacity(image_files.len());
        for (i, path) in image_files.iter().enumerate() {
            if self.token.is_cancelled() {
                progress_bar.suspend(|| println!("Batch cancelled."));
                break;
            }
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            progress_bar.suspend(|| {
                println!("\n[{}/{}] Processing: {}", i + 1, image_files.len(), file_name)
            });

            let predictions = preprocess(path).and_then(|prepared| self.predict_both(&prepared));
            if let Some((final_prediction, best_prediction)) = predictions {
                let item = BatchItem::new(file_name, &final_prediction, &best_prediction);
                progress_bar.suspend(|| {
                    println!(
                        "   Final Model: {} ({:.2}%)",
                        item.final_model.prediction,
                        item.final_model.confidence * 100.0
                    );
                    println!(
                        "   Best Model:  {} ({:.2}%)",
                        item.best_model.prediction,
                        item.best_model.confidence * 100.0
                    );
                    println!("   Result: {}", item.status());
                });
                items.push(item);
            }
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        let summary = BatchSummary::from_items(image_files.len(), &items);
        println!("\nBATCH PROCESSING SUMMARY:");
        println!("   Total images: {}", summary.total);
        println!("   Accidents detected: {}", summary.accidents);
        println!("   Safe images: {}", summary.safe);
        Some(summary)
    }

    pub fn show_model_summary(&self) {
        println!("\n{}", RULE);
        println!("MODEL ARCHITECTURE");
        println!("{}", RULE);

        println!("\nFINAL MODEL SUMMARY:");
        println!("{}", "-".repeat(40));
        println!("{}", self.final_model.summary());

        println!("\nBEST MODEL SUMMARY:");
        println!("{}", "-".repeat(40));
        println!("{}", self.best_model.summary());
    }

    pub fn show_results_history(&self) {
        if self.history.is_empty() {
            println!("\nNo prediction history available yet.");
            return;
        }

        println!("\n{}", RULE);
        println!("PREDICTION HISTORY");
        println!("{}", RULE);

        let summary = self.history.summarize();
        println!("Total predictions: {}", summary.total);
        println!("Accidents detected: {}", summary.accidents);
        println!("Safe images: {}", summary.safe);

        println!("\nRecent predictions:");
        for (i, entry) in self.history.recent(RECENT_ENTRIES).iter().enumerate() {
            println!("{}", history_line(i + 1, entry));
        }
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()
    }
}

/// ` 1. 2024-05-01 13:45 | crash.jpg | ACCIDENT`
pub fn history_line(index: usize, entry: &PredictionResult) -> String {
    let status = if entry.accident_detected {
        "ACCIDENT"
    } else {
        "SAFE"
    };
    let timestamp = entry
        .timestamp
        .parse::<chrono::NaiveDateTime>()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| entry.timestamp.clone());
    let image_name = Path::new(&entry.image_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.image_path.clone());
    format!("{:2}. {} | {} | {}", index, timestamp, image_name, status)
}
