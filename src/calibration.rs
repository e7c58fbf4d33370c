use log::info;
use std::fmt;

use crate::config::CalibrationConfig;
use crate::pose::{PoseIndex, PoseLandmarks};
use crate::tracker::SampleWindow;

/// 起立姿勢の基準身長を決める
///
/// 直近 `smoothing_window` サンプルの中央値を、`frames_required` フレーム目で
/// 一度だけ確定する。確定後の `observe` は何もしない。
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    frames_required: usize,
    min_reference: f32,
    samples: SampleWindow,
    frames_seen: usize,
    reference: Option<f32>,
}

impl CalibrationEngine {
    pub fn new(frames_required: usize, window: usize, min_reference: f32) -> Self {
        Self {
            frames_required,
            min_reference,
            samples: SampleWindow::new(window),
            frames_seen: 0,
            reference: None,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(config.frames, config.smoothing_window, config.min_reference)
    }

    /// 身長サンプルを1つ追加。基準が確定したフレームだけ true
    pub fn observe(&mut self, sample: f32) -> bool {
        if self.reference.is_some() {
            return false;
        }
        self.samples.push(sample);
        self.frames_seen += 1;
        if self.frames_seen < self.frames_required {
            return false;
        }

        let median = self.samples.median().unwrap_or(sample);
        let reference = median.max(self.min_reference);
        info!(
            "Calibration complete after {} frames: reference height {:.3} (median {:.3})",
            self.frames_seen, reference, median
        );
        self.reference = Some(reference);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<f32> {
        self.reference
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn frames_required(&self) -> usize {
        self.frames_required
    }

    pub fn status(&self) -> CalibrationStatus {
        match self.reference {
            Some(reference) => CalibrationStatus::Ready { reference },
            None => CalibrationStatus::InProgress {
                frames_seen: self.frames_seen,
                frames_required: self.frames_required,
            },
        }
    }
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::from_config(&CalibrationConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    InProgress {
        frames_seen: usize,
        frames_required: usize,
    },
    Ready {
        reference: f32,
    },
}

impl CalibrationStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, CalibrationStatus::Ready { .. })
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStatus::InProgress {
                frames_seen,
                frames_required,
            } => write!(f, "Calibrate: {}/{}", frames_seen, frames_required),
            CalibrationStatus::Ready { reference } => write!(f, "Reference: {:.3}", reference),
        }
    }
}

/// 鼻と両足首の平均との縦距離
pub fn standing_height(pose: &PoseLandmarks) -> Option<f32> {
    let nose = pose.get(PoseIndex::Nose)?;
    let left = pose.get(PoseIndex::LeftAnkle)?;
    let right = pose.get(PoseIndex::RightAnkle)?;
    Some((nose.y - (left.y + right.y) / 2.0).abs())
}
