use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const FINAL_MODEL_PATH: &str = "accident_detection_model.onnx";
pub const BEST_MODEL_PATH: &str = "best_model.onnx";
pub const RESULTS_LOG_PATH: &str = "prediction_results.json";

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Interactive Accident Detection System", long_about = None)]
pub struct Config {
    /// Path to a single image (bypasses interactive mode)
    #[arg(long = "image_path", visible_alias = "image-path")]
    pub image_path: Option<PathBuf>,

    /// Path to a directory of images (bypasses interactive mode)
    #[arg(long = "dir_path", visible_alias = "dir-path")]
    pub dir_path: Option<PathBuf>,

    /// Run in interactive mode (default)
    #[arg(long, action = ArgAction::SetTrue, default_value_t = true)]
    pub interactive: bool,

    #[arg(long, default_value = FINAL_MODEL_PATH)]
    pub final_model: PathBuf,

    #[arg(long, default_value = BEST_MODEL_PATH)]
    pub best_model: PathBuf,

    #[arg(long, default_value = RESULTS_LOG_PATH)]
    pub history: PathBuf,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    /// Print results as text instead of opening a window
    #[arg(long)]
    pub no_display: bool,
}

/// What a single process run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    SingleImage(PathBuf),
    BatchDir(PathBuf),
    Interactive,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: None,
            dir_path: None,
            interactive: true,
            final_model: FINAL_MODEL_PATH.into(),
            best_model: BEST_MODEL_PATH.into(),
            history: RESULTS_LOG_PATH.into(),
            device_id: 0,
            no_display: false,
        }
    }
}

impl Config {
    /// `--interactive` never changes the outcome: the menu runs whenever no
    /// path flag is given, and the image path wins over the directory.
    pub fn run_mode(&self) -> RunMode {
        match (&self.image_path, &self.dir_path) {
            (Some(image), _) => RunMode::SingleImage(image.clone()),
            (None, Some(dir)) => RunMode::BatchDir(dir.clone()),
            (None, None) => RunMode::Interactive,
        }
    }
}
