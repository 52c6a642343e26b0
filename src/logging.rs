use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g.
/// `ACCIDENT_LOG=accident_detector=debug`.
pub const LOG_ENV: &str = "ACCIDENT_LOG";

/// Filter used when `ACCIDENT_LOG` is unset. Failures the user already sees
/// on stdout are logged below this level.
pub const DEFAULT_FILTER: &str = "accident_detector=warn";

/// Installs the global subscriber once. Logs go to stderr so they do not mix
/// with the menu on stdout.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ResultsHistory;
    use crate::image_processor::preprocess;
    use parking_lot::Mutex;
    use std::io;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_under(filter: &str, f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_env_filter(EnvFilter::new(filter))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_reported_failures_are_not_logged_twice_by_default() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let history_path = temp_dir.path().join("prediction_results.json");
        std::fs::write(&history_path, "{ not json")?;

        let output = captured_under(DEFAULT_FILTER, || {
            assert!(preprocess(Path::new("missing.png")).is_none());
            assert!(ResultsHistory::load(&history_path).is_empty());
        });
        assert!(output.is_empty(), "unexpected log output: {}", output);
        Ok(())
    }

    #[test]
    fn test_debug_filter_shows_failure_details() {
        let output = captured_under("accident_detector=debug", || {
            assert!(preprocess(Path::new("missing.png")).is_none());
        });
        assert!(output.contains("preprocessing failed"));
    }
}
