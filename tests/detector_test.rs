use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use accident_detector::{
    mocks::{FailingModel, FixedProbabilityModel, MockGeocoder, RecordingVisualizer},
    AccidentDetector, CancellationToken, Class, ResultsHistory,
};

struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
    history_path: PathBuf,
    geocoder: Arc<MockGeocoder>,
    visualizer: Arc<RecordingVisualizer>,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        Self {
            history_path: root.join("prediction_results.json"),
            root,
            _temp_dir: temp_dir,
            geocoder: Arc::new(MockGeocoder::resolving("New York, United States")),
            visualizer: Arc::new(RecordingVisualizer::new()),
        }
    }

    fn detector<M: accident_detector::BinaryClassifier>(
        &self,
        final_model: M,
        best_model: M,
    ) -> AccidentDetector<M> {
        AccidentDetector::new(
            final_model,
            best_model,
            ResultsHistory::load(&self.history_path),
            Box::new(self.geocoder.clone()),
            Box::new(self.visualizer.clone()),
        )
    }

    fn write_image(&self, relative: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        RgbImage::from_pixel(64, 48, Rgb([120, 60, 30]))
            .save(&path)
            .unwrap();
        path
    }
}

fn history_len(path: &Path) -> usize {
    ResultsHistory::load(path).len()
}

#[test]
fn test_mixed_verdicts_detect_accident_and_look_up_location_once() {
    let fixture = Fixture::new();
    let image = fixture.write_image("crash.png");
    let mut detector = fixture.detector(
        Arc::new(FixedProbabilityModel::new(0.2)),
        Arc::new(FixedProbabilityModel::new(0.7)),
    );

    let result = detector.analyze_image(&image).expect("prediction expected");

    assert!(result.accident_detected);
    assert_eq!(result.final_model.prediction, Class::Accident);
    assert!((result.final_model.confidence - 0.8).abs() < 1e-6);
    assert_eq!(result.best_model.prediction, Class::NonAccident);
    assert!((result.best_model.confidence - 0.7).abs() < 1e-6);
    assert_eq!(result.image_path, image.display().to_string());

    assert_eq!(fixture.geocoder.calls(), 1);
    assert_eq!(fixture.visualizer.shown(), vec!["Input Image\ncrash.png".to_string()]);

    let persisted = ResultsHistory::load(&fixture.history_path);
    assert_eq!(persisted.entries(), &[result]);
}

#[test]
fn test_safe_image_skips_location_lookup() {
    let fixture = Fixture::new();
    let image = fixture.write_image("road.jpg");
    let mut detector = fixture.detector(
        FixedProbabilityModel::new(0.9),
        FixedProbabilityModel::new(0.5),
    );

    let result = detector.analyze_image(&image).expect("prediction expected");

    assert!(!result.accident_detected);
    assert_eq!(fixture.geocoder.calls(), 0);
    assert_eq!(history_len(&fixture.history_path), 1);
}

#[test]
fn test_unreadable_image_records_nothing() {
    let fixture = Fixture::new();
    let path = fixture.root.join("broken.png");
    fs::write(&path, b"not an image").unwrap();
    let mut detector = fixture.detector(
        FixedProbabilityModel::new(0.1),
        FixedProbabilityModel::new(0.1),
    );

    assert!(detector.analyze_image(&path).is_none());
    assert!(detector.history().is_empty());
    assert!(!fixture.history_path.exists());
    assert_eq!(fixture.geocoder.calls(), 0);
    assert!(fixture.visualizer.shown().is_empty());
}

#[test]
fn test_inference_failure_records_nothing() {
    let fixture = Fixture::new();
    let image = fixture.write_image("crash.png");
    let mut detector = fixture.detector(FailingModel, FailingModel);

    assert!(detector.analyze_image(&image).is_none());
    assert!(detector.history().is_empty());
}

#[test]
fn test_nan_score_keeps_existing_history_loadable() {
    let fixture = Fixture::new();
    let first = fixture.write_image("a.png");
    let second = fixture.write_image("b.png");

    fixture
        .detector(
            FixedProbabilityModel::new(0.2),
            FixedProbabilityModel::new(0.2),
        )
        .analyze_image(&first)
        .unwrap();

    let mut detector = fixture.detector(
        FixedProbabilityModel::new(0.2),
        FixedProbabilityModel::new(f32::NAN),
    );
    assert!(detector.analyze_image(&second).is_none());
    assert_eq!(detector.history().len(), 1);

    let reloaded = ResultsHistory::load(&fixture.history_path);
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.entries()[0].accident_detected);
}

#[test]
fn test_history_accumulates_across_sessions() {
    let fixture = Fixture::new();
    let first = fixture.write_image("a.png");
    let second = fixture.write_image("b.png");

    {
        let mut detector = fixture.detector(
            FixedProbabilityModel::new(0.3),
            FixedProbabilityModel::new(0.8),
        );
        detector.analyze_image(&first).unwrap();
    }
    let mut detector = fixture.detector(
        FixedProbabilityModel::new(0.6),
        FixedProbabilityModel::new(0.8),
    );
    assert_eq!(detector.history().len(), 1);
    detector.analyze_image(&second).unwrap();

    let summary = ResultsHistory::load(&fixture.history_path).summarize();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.accidents, 1);
    assert_eq!(summary.safe, 1);
}

#[test]
fn test_batch_skips_non_images_and_leaves_history_alone() {
    let fixture = Fixture::new();
    for name in ["batch/one.png", "batch/two.PNG", "batch/three.bmp"] {
        fixture.write_image(name);
    }
    fs::write(fixture.root.join("batch/readme.txt"), "not an image").unwrap();

    let final_model = Arc::new(FixedProbabilityModel::new(0.2));
    let best_model = Arc::new(FixedProbabilityModel::new(0.9));
    let detector = fixture.detector(final_model.clone(), best_model.clone());

    let summary = detector
        .batch_predict(&fixture.root.join("batch"))
        .expect("summary expected");

    assert_eq!(final_model.calls(), 3);
    assert_eq!(best_model.calls(), 3);
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.accidents, 3);
    assert_eq!(summary.safe, 0);
    assert_eq!(summary.accidents + summary.safe, summary.total);

    assert!(detector.history().is_empty());
    assert!(!fixture.history_path.exists());
    assert_eq!(fixture.geocoder.calls(), 0);
}

#[test]
fn test_batch_counts_only_decodable_images() {
    let fixture = Fixture::new();
    fixture.write_image("batch/good.png");
    fs::write(fixture.root.join("batch/corrupt.jpg"), b"garbage").unwrap();

    let detector = fixture.detector(
        FixedProbabilityModel::new(0.7),
        FixedProbabilityModel::new(0.7),
    );
    let summary = detector.batch_predict(&fixture.root.join("batch")).unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.safe, 1);
}

#[test]
fn test_batch_on_missing_or_empty_directory() {
    let fixture = Fixture::new();
    let detector = fixture.detector(
        FixedProbabilityModel::new(0.7),
        FixedProbabilityModel::new(0.7),
    );

    assert!(detector.batch_predict(&fixture.root.join("nope")).is_none());

    fs::create_dir(fixture.root.join("empty")).unwrap();
    fs::write(fixture.root.join("empty/notes.md"), "# notes").unwrap();
    assert!(detector.batch_predict(&fixture.root.join("empty")).is_none());
}

#[test]
fn test_cancelled_batch_stops_before_next_file() {
    let fixture = Fixture::new();
    fixture.write_image("batch/one.png");
    fixture.write_image("batch/two.png");

    let token = CancellationToken::new();
    let model = Arc::new(FixedProbabilityModel::new(0.7));
    let detector = fixture
        .detector(model.clone(), model.clone())
        .with_cancellation(token.clone());
    token.cancel();

    let summary = detector.batch_predict(&fixture.root.join("batch")).unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_clear_history_persists_empty_array() {
    let fixture = Fixture::new();
    let image = fixture.write_image("crash.png");
    let mut detector = fixture.detector(
        FixedProbabilityModel::new(0.1),
        FixedProbabilityModel::new(0.1),
    );
    detector.analyze_image(&image).unwrap();
    assert_eq!(history_len(&fixture.history_path), 1);

    detector.clear_history().unwrap();
    detector.clear_history().unwrap();

    assert!(detector.history().is_empty());
    assert_eq!(fs::read_to_string(&fixture.history_path).unwrap().trim(), "[]");
}
