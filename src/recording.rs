//! JSON Lines 帧录制
//!
//! 每行一帧：`{"confidence": f, "keypoints": {...} | null, "keypoints3d": {...}}`。
//! `keypoints` 为 null 表示该帧未检测到人体，读取时整帧跳过。

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::motion::types::{FrameInput, ImageSkeleton, PoseKeypoints, WorldSkeleton};

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("recording io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub confidence: f64,
    pub keypoints: Option<ImageSkeleton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints3d: Option<WorldSkeleton>,
}

impl RecordedFrame {
    pub fn into_input(self) -> Option<FrameInput> {
        let image = self.keypoints?;
        Some(FrameInput::new(
            PoseKeypoints::from_parts(image, self.keypoints3d),
            self.confidence,
        ))
    }
}

impl From<&FrameInput> for RecordedFrame {
    fn from(input: &FrameInput) -> Self {
        Self {
            confidence: input.confidence,
            keypoints: Some(*input.pose.image()),
            keypoints3d: input.pose.world().copied(),
        }
    }
}

pub fn read_recording(path: impl AsRef<Path>) -> Result<Vec<FrameInput>, RecordingError> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let recorded: RecordedFrame =
            serde_json::from_str(&line).map_err(|source| RecordingError::Parse {
                line: idx + 1,
                source,
            })?;
        match recorded.into_input() {
            Some(frame) => frames.push(frame),
            None => skipped += 1,
        }
    }

    tracing::debug!(frames = frames.len(), skipped, "Recording loaded");
    Ok(frames)
}

pub fn write_recording(
    path: impl AsRef<Path>,
    frames: &[RecordedFrame],
) -> Result<(), RecordingError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for frame in frames {
        let line = serde_json::to_string(frame).map_err(std::io::Error::from)?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}
