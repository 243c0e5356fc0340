use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use rep_motion::coaching::payload::new_session_id;
use rep_motion::coaching::{CoachingRequest, SessionAnalyzer, SessionRecord, SessionReport};
use rep_motion::config::Config;
use rep_motion::logging::{init_tracing, LogConfig};
use rep_motion::motion::{MotionConfig, MotionEngine};
use rep_motion::recording::{read_recording, RecordingError};

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("usage: rep-replay <recording.jsonl>")]
    MissingPath,
    #[error("invalid motion config: {0}")]
    Config(String),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ReplayOutput {
    request: CoachingRequest,
    report: SessionReport,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });

    match run(&config) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Replay failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<String, ReplayError> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or(ReplayError::MissingPath)?;

    let motion_config = MotionConfig::from_env(&config.motion);
    motion_config.validate().map_err(ReplayError::Config)?;

    let frames = read_recording(&path)?;
    let session_id = config.session_id.clone().unwrap_or_else(new_session_id);
    tracing::info!(
        path = %path.display(),
        frames = frames.len(),
        exercise = %motion_config.exercise,
        session_id = %session_id,
        "Starting replay"
    );

    let mut engine = MotionEngine::new(motion_config);
    let mut reps = Vec::new();
    for frame in &frames {
        if let Some(rep) = engine.process_frame(frame).rep {
            reps.push(rep);
        }
    }

    let stats = engine.stats();
    tracing::info!(
        frames = stats.frames_processed,
        reps = stats.reps_accepted,
        dropped = stats.reps_dropped,
        "Replay finished"
    );

    let record = SessionRecord::new(session_id.clone(), engine.exercise(), reps);
    let report = SessionAnalyzer::new().analyze(&record, &[]);
    let request = CoachingRequest::from_reps(session_id, &record.reps).with_report(&report);

    Ok(serde_json::to_string_pretty(&ReplayOutput { request, report })?)
}
