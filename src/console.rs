use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::errors::{DetectorError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cooperative cancellation flag shared between the interrupt handler and
/// the controller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Line-based user input.
///
/// Lines are read on a background thread so that a pending prompt notices
/// cancellation. End of input cancels the token.
pub struct Console {
    lines: Receiver<String>,
    token: CancellationToken,
}

impl Console {
    pub fn stdin(token: CancellationToken) -> Result<Self> {
        Self::from_reader(BufReader::new(io::stdin()), token)
    }

    pub fn from_reader<R>(reader: R, token: CancellationToken) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "console input closed");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| DetectorError::Configuration {
                message: format!("failed to start console input thread: {}", e),
            })?;
        Ok(Self { lines: rx, token })
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Prints `message` without a newline and waits for a line. `None` means
    /// the session was cancelled.
    pub fn prompt(&self, message: &str) -> Option<String> {
        print!("{}", message);
        let _ = io::stdout().flush();
        self.read_line()
    }

    pub fn read_line(&self) -> Option<String> {
        loop {
            if self.token.is_cancelled() {
                return None;
            }
            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.token.cancel();
                    return None;
                }
            }
        }
    }
}
