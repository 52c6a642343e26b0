use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use accident_detector::{
    location::NominatimGeocoder, logging, menu, visualizer::ConsoleVisualizer, AccidentDetector,
    CancellationToken, Config, Console, Model, ResultsHistory, RunMode, Visualizer,
};

fn main() -> Result<()> {
    logging::init_tracing();
    let config = Config::parse();

    println!("Initializing Accident Detection System...");
    println!("Loading models...");
    let (final_model, best_model) = match load_models(&config) {
        Ok(models) => models,
        Err(e) => {
            debug!(error = ?e, "model load failed");
            println!("Error loading models: {}", e);
            process::exit(1);
        }
    };
    println!("Both models loaded successfully!");

    let history = ResultsHistory::load(&config.history);
    let geocoder = NominatimGeocoder::new().context("Failed to build geocoding client")?;
    let token = CancellationToken::new();
    let mut detector = AccidentDetector::new(
        final_model,
        best_model,
        history,
        Box::new(geocoder),
        build_visualizer(&config),
    )
    .with_cancellation(token.clone());

    match config.run_mode() {
        RunMode::SingleImage(image_path) => {
            detector.analyze_image(&image_path);
        }
        RunMode::BatchDir(dir_path) => {
            install_interrupt_handler(&token)?;
            detector.batch_predict(&dir_path);
        }
        RunMode::Interactive => {
            install_interrupt_handler(&token)?;
            let console = Console::stdin(token)?;
            menu::run_interactive(&mut detector, &console);
        }
    }

    Ok(())
}

fn load_models(config: &Config) -> accident_detector::Result<(Model, Model)> {
    let final_model = Model::new("Final Model", &config.final_model, config.device_id)?;
    let best_model = Model::new("Best Model", &config.best_model, config.device_id)?;
    Ok((final_model, best_model))
}

fn install_interrupt_handler(token: &CancellationToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || token.cancel()).context("Failed to install interrupt handler")
}

#[cfg(feature = "gui")]
fn build_visualizer(config: &Config) -> Box<dyn Visualizer> {
    if config.no_display {
        Box::new(ConsoleVisualizer::default())
    } else {
        Box::new(accident_detector::visualizer::WindowVisualizer)
    }
}

#[cfg(not(feature = "gui"))]
fn build_visualizer(_config: &Config) -> Box<dyn Visualizer> {
    Box::new(ConsoleVisualizer::default())
}
