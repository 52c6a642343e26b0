use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::console::Console;
use crate::detector::{AccidentDetector, RULE};
use crate::traits::BinaryClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SingleImage,
    BatchDir,
    ShowArchitecture,
    ShowHistory,
    ClearHistory,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::SingleImage),
            "2" => Ok(Self::BatchDir),
            "3" => Ok(Self::ShowArchitecture),
            "4" => Ok(Self::ShowHistory),
            "5" => Ok(Self::ClearHistory),
            "6" => Ok(Self::Exit),
            other => Err(format!("invalid menu choice: {:?}", other)),
        }
    }
}

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Exited,
    Cancelled,
}

impl SessionEnd {
    const fn farewell(self) -> &'static str {
        match self {
            Self::Exited => "Thank you for using SMART ACCIDENT DETECTOR!",
            Self::Cancelled => "Terminating...",
        }
    }
}

pub fn display_menu() {
    println!("\n{}", RULE);
    println!("ACCIDENT DETECTION SYSTEM");
    println!("{}", RULE);
    println!("1.Test single image");
    println!("2.Batch test directory");
    println!("3.Show model architecture");
    println!("4.Show prediction history");
    println!("5.Clear prediction history");
    println!("6.Exit");
    println!("{}", RULE);
}

/// Reprompts until a valid choice is entered. `None` on cancellation.
pub fn get_user_choice(console: &Console) -> Option<MenuChoice> {
    loop {
        let input = console.prompt("\nEnter your choice (1-6): ")?;
        match input.parse::<MenuChoice>() {
            Ok(choice) => return Some(choice),
            Err(e) => {
                debug!("{}", e);
                println!("Invalid choice. Please enter a number between 1-6.");
            }
        }
    }
}

/// Trims whitespace, then any quotes left around a pasted path.
pub fn clean_path_input(input: &str) -> PathBuf {
    PathBuf::from(input.trim().trim_matches(|c| c == '"' || c == '\''))
}

pub fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// The interactive loop. Returns once the user exits or the console is
/// cancelled (interrupt or end of input).
pub fn run_interactive<M: BinaryClassifier>(detector: &mut AccidentDetector<M>, console: &Console) {
    let outcome = loop {
        if console.is_cancelled() {
            break SessionEnd::Cancelled;
        }
        display_menu();
        let Some(choice) = get_user_choice(console) else {
            break SessionEnd::Cancelled;
        };

        match choice {
            MenuChoice::SingleImage => {
                let Some(input) = console.prompt("\nEnter image path: ") else {
                    break SessionEnd::Cancelled;
                };
                let image_path = clean_path_input(&input);
                if image_path.exists() {
                    detector.analyze_image(&image_path);
                } else {
                    println!("Image not found: {}", image_path.display());
                }
            }
            MenuChoice::BatchDir => {
                let Some(input) = console.prompt("\nEnter directory path: ") else {
                    break SessionEnd::Cancelled;
                };
                detector.batch_predict(&clean_path_input(&input));
            }
            MenuChoice::ShowArchitecture => detector.show_model_summary(),
            MenuChoice::ShowHistory => detector.show_results_history(),
            MenuChoice::ClearHistory => {
                let Some(confirm) =
                    console.prompt("\nAre you sure you want to clear history? (y/N): ")
                else {
                    break SessionEnd::Cancelled;
                };
                if is_confirmation(&confirm) {
                    match detector.clear_history() {
                        Ok(()) => println!("History cleared!"),
                        Err(e) => {
                            debug!(error = ?e, "history clear failed");
                            println!("An error occurred: {}", e);
                        }
                    }
                } else {
                    println!("Operation cancelled.");
                }
            }
            MenuChoice::Exit => break SessionEnd::Exited,
        }

        if console.prompt("\nPress Enter to continue...").is_none() {
            break SessionEnd::Cancelled;
        }
    };
    println!("\n{}", outcome.farewell());
}
