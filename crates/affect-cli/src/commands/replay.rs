//! Replay recorded blendshape frames through a detection session

use anyhow::{Context as _, Result};
use clap::Args;
use facial_affect_classifier::{
    load_jsonl, DetectionSession, MoodAggregator, NoFaceMonitor, ReplayLandmarkService,
    SessionConfig, TickOutcome,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Args)]
pub struct ReplayCommand {
    /// Recorded frames, one JSON array of {name, score} per line
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Session configuration (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit one JSON object per line instead of text
    #[arg(long, default_value = "false")]
    json: bool,

    /// Labels per mood reading
    #[arg(long, default_value = "10")]
    batch_size: usize,

    /// Consecutive no-face frames before reporting a lost face
    #[arg(long, default_value = "5")]
    no_face_threshold: usize,

    /// Pace frames at the configured tick interval instead of as fast as possible
    #[arg(long, default_value = "false")]
    realtime: bool,
}

impl ReplayCommand {
    pub async fn execute(self) -> Result<()> {
        let start = Instant::now();

        if !self.input.exists() {
            anyhow::bail!("Input file does not exist: {}", self.input.display());
        }

        let config = match &self.config {
            Some(path) => SessionConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SessionConfig::default(),
        };
        let period = if self.realtime {
            config.tick_interval()
        } else {
            Duration::from_millis(1)
        };

        let frames = load_jsonl(&self.input)
            .with_context(|| format!("Failed to read frames from {}", self.input.display()))?;

        let session = DetectionSession::new(ReplayLandmarkService::new(), config);
        session
            .initialize()
            .await
            .context("Failed to start detection session")?;

        let ctrl_c = session.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, disposing session");
                ctrl_c.dispose();
            }
        });

        let mut printer = Printer {
            json: self.json,
            frame: 0,
            moods: MoodAggregator::new(self.batch_size),
            no_face: NoFaceMonitor::new(self.no_face_threshold),
        };
        let summary = session
            .run(frames, period, |outcome| printer.print(outcome))
            .await?;

        session.dispose();
        interrupt.abort();

        info!(
            frames = summary.ticks,
            classified = summary.classified,
            no_face = summary.no_face,
            failed = summary.failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Replay complete"
        );
        Ok(())
    }
}

/// Renders tick outcomes along with mood and face-loss notices
struct Printer {
    json: bool,
    frame: usize,
    moods: MoodAggregator,
    no_face: NoFaceMonitor,
}

impl Printer {
    fn print(&mut self, outcome: &TickOutcome) {
        self.frame += 1;
        let frame = self.frame;

        match outcome {
            TickOutcome::Classified(result) => {
                self.no_face.face_seen();
                if self.json {
                    emit(json!({ "frame": frame, "result": result }));
                } else {
                    let marker = if result.calibrating {
                        " [calibrating]"
                    } else {
                        ""
                    };
                    println!(
                        "frame {frame}: {} ({:.2}){marker}",
                        result.emotion, result.confidence
                    );
                }

                if result.calibrating {
                    return;
                }
                if let Some(mood) = self.moods.push(result.emotion) {
                    if self.json {
                        emit(json!({ "frame": frame, "mood": mood }));
                    } else {
                        println!(
                            "mood: {} ({:.0}% of {} readings)",
                            mood.emotion,
                            mood.confidence * 100.0,
                            mood.readings
                        );
                    }
                }
            }
            TickOutcome::NoFace => {
                if self.json {
                    emit(json!({ "frame": frame, "noFace": true }));
                } else {
                    println!("frame {frame}: no face");
                }
                if let Some(lost) = self.no_face.no_face() {
                    if self.json {
                        emit(json!({ "frame": frame, "faceLost": lost.consecutive }));
                    } else {
                        println!("face lost for {} frames", lost.consecutive);
                    }
                }
            }
            TickOutcome::Skipped | TickOutcome::Abandoned => {
                warn!(frame, ?outcome, "Frame not classified");
            }
        }
    }
}

fn emit(value: serde_json::Value) {
    println!("{value}");
}
