use crate::fmt::{ceprintln, CYAN, DIM, RED, RESET};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Line { level: Level, text: String },
    Banner(Vec<String>),
}

/// Destination for progress and error output.
pub trait Sink: Send + Sync + 'static {
    fn emit(&self, report: Report);
}

/// Writes `[mhist] ...` lines to stderr.
pub struct Terminal;

impl Sink for Terminal {
    fn emit(&self, report: Report) {
        match report {
            Report::Line { level, text } => {
                let color = match level {
                    Level::Debug => DIM,
                    Level::Info => CYAN,
                    Level::Error => RED,
                };
                ceprintln!("{color}[mhist] {text}{RESET}");
            }
            Report::Banner(lines) => {
                ceprintln!("{DIM}── mhist ───────────────────────────────────────{RESET}");
                for line in lines {
                    ceprintln!("  {CYAN}{line}{RESET}");
                }
                ceprintln!("{DIM}────────────────────────────────────────────────{RESET}");
            }
        }
    }
}

/// Producer side of the report queue. Cheap to clone into workers; the
/// drain task ends once every clone is dropped.
#[derive(Clone)]
pub struct Reporter {
    tx: mpsc::Sender<Report>,
    verbose: bool,
}

impl Reporter {
    /// Spawns the single consumer that forwards queued reports to `sink` in
    /// the order they were sent.
    pub fn spawn<S: Sink>(sink: Arc<S>, verbose: bool) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Report>(QUEUE_DEPTH);
        let drain = tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                sink.emit(report);
            }
        });
        (Self { tx, verbose }, drain)
    }

    pub async fn debug(&self, text: impl Into<String>) {
        if self.verbose {
            self.send(Level::Debug, text.into()).await;
        }
    }

    pub async fn info(&self, text: impl Into<String>) {
        if self.verbose {
            self.send(Level::Info, text.into()).await;
        }
    }

    /// Emitted regardless of verbosity.
    pub async fn error(&self, text: impl Into<String>) {
        self.send(Level::Error, text.into()).await;
    }

    pub async fn banner(&self, lines: Vec<String>) {
        if self.verbose {
            self.tx.send(Report::Banner(lines)).await.ok();
        }
    }

    async fn send(&self, level: Level, text: String) {
        // only fails once the drain task is gone, at which point there is
        // nowhere left to report to
        self.tx.send(Report::Line { level, text }).await.ok();
    }
}

/// Keeps every report in memory.
#[cfg(test)]
#[derive(Default)]
pub struct Captured {
    reports: std::sync::Mutex<Vec<Report>>,
}

#[cfg(test)]
impl Captured {
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Line {
                    level: Level::Error,
                    text,
                } => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Sink for Captured {
    fn emit(&self, report: Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}
