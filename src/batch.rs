use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{DetectorError, Result};
use crate::prediction::{ModelVerdict, Prediction};

/// Extensions picked up by batch mode, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Image files directly inside `dir` (no recursion), sorted by file name.
pub fn collect_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DetectorError::FileSystem {
            path: dir.to_path_buf(),
            operation: "list directory".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        });
    }

    let image_files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(|e| e.into_path())
        .collect::<Vec<_>>();
    Ok(image_files)
}

/// Result of running both models on one file of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub file_name: String,
    pub final_model: ModelVerdict,
    pub best_model: ModelVerdict,
    pub accident_detected: bool,
}

impl BatchItem {
    pub fn new(
        file_name: String,
        final_prediction: &Prediction,
        best_prediction: &Prediction,
    ) -> Self {
        Self {
            file_name,
            final_model: final_prediction.verdict(),
            best_model: best_prediction.verdict(),
            accident_detected: final_prediction.is_accident || best_prediction.is_accident,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.accident_detected {
            "ACCIDENT"
        } else {
            "SAFE"
        }
    }
}

/// Aggregate over the files of a batch that produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Files with a supported extension.
    pub attempted: usize,
    /// Files that produced a prediction from both models.
    pub total: usize,
    pub accidents: usize,
    pub safe: usize,
}

impl BatchSummary {
    pub fn from_items(attempted: usize, items: &[BatchItem]) -> Self {
        let accidents = items.iter().filter(|item| item.accident_detected).count();
        Self {
            attempted,
            total: items.len(),
            accidents,
            safe: items.len() - accidents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::Class;
    use image::{DynamicImage, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_formats() {
        let test_cases = vec![
            ("test.jpg", true),
            ("test.JPEG", true),
            ("test.Png", true),
            ("test.bmp", true),
            ("test.GIF", true),
            ("test.webp", false),
            ("test.txt", false),
            ("test", false),
            ("png", false),
        ];

        for (filename, expected) in test_cases {
            assert_eq!(is_supported_image(Path::new(filename)), expected, "{}", filename);
        }
    }

    #[test]
    fn test_collect_skips_other_files_and_subdirectories() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        for name in ["b.jpg", "a.PNG", "c.gif", "notes.txt", "archive.zip"] {
            fs::write(dir.join(name), b"x")?;
        }
        let nested = dir.join("nested.png");
        fs::create_dir(&nested)?;
        fs::write(nested.join("inner.png"), b"x")?;

        let files = collect_image_files(dir)?;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg", "c.gif"]);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_error() {
        let err = collect_image_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DetectorError::FileSystem { .. }));
    }

    #[test]
    fn test_summary_counts() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        let accident = Prediction {
            class: Class::Accident,
            confidence: 0.9,
            is_accident: true,
            image: image.clone(),
        };
        let safe = Prediction {
            class: Class::NonAccident,
            confidence: 0.8,
            is_accident: false,
            image,
        };
        let items = vec![
            BatchItem::new("1.png".into(), &accident, &safe),
            BatchItem::new("2.png".into(), &safe, &safe),
            BatchItem::new("3.png".into(), &safe, &accident),
        ];

        let summary = BatchSummary::from_items(4, &items);
        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.accidents, 2);
        assert_eq!(summary.safe, 1);
        assert_eq!(items[1].status(), "SAFE");
        assert_eq!(items[2].status(), "ACCIDENT");
    }
}
