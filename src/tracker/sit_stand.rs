use log::debug;

use crate::config::SitStandConfig;
use crate::geometry::{joint_angle_degrees, EXTENDED_ANGLE_DEG};
use crate::pose::{PoseIndex, PoseLandmarks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Standing,
    Sitting,
}

/// 起立・着座のヒステリシス判定
///
/// 着座: 平滑身長 < 基準×sit_ratio または 膝角度 < knee_sit_deg
/// 起立: 平滑身長 > 基準×stand_ratio かつ 膝角度 > knee_stand_deg（ここで1回）
#[derive(Debug, Clone)]
pub struct SitStandDetector {
    sit_ratio: f32,
    stand_ratio: f32,
    knee_sit_deg: f32,
    knee_stand_deg: f32,
    stance: Stance,
}

impl SitStandDetector {
    pub fn from_config(config: &SitStandConfig) -> Self {
        Self {
            sit_ratio: config.sit_ratio,
            stand_ratio: config.stand_ratio,
            knee_sit_deg: config.knee_sit_deg,
            knee_stand_deg: config.knee_stand_deg,
            stance: Stance::Standing,
        }
    }

    /// 基準身長が未確定なら常に false で状態も変えない
    pub fn update(&mut self, reference: Option<f32>, smoothed_height: f32, min_knee_angle: f32) -> bool {
        let Some(reference) = reference else {
            return false;
        };
        let sit_threshold = reference * self.sit_ratio;
        let stand_threshold = reference * self.stand_ratio;

        match self.stance {
            Stance::Standing
                if smoothed_height < sit_threshold || min_knee_angle < self.knee_sit_deg =>
            {
                debug!(
                    "sit: height {:.3} (< {:.3}), knee {:.1}",
                    smoothed_height, sit_threshold, min_knee_angle
                );
                self.stance = Stance::Sitting;
                false
            }
            Stance::Sitting
                if smoothed_height > stand_threshold && min_knee_angle > self.knee_stand_deg =>
            {
                debug!(
                    "stand: height {:.3} (> {:.3}), knee {:.1}",
                    smoothed_height, stand_threshold, min_knee_angle
                );
                self.stance = Stance::Standing;
                true
            }
            _ => false,
        }
    }

    /// 姿勢から膝角度を求めて更新
    pub fn evaluate(&mut self, pose: &PoseLandmarks, reference: Option<f32>, smoothed_height: Option<f32>) -> bool {
        match smoothed_height {
            Some(height) => self.update(reference, height, min_knee_angle(pose)),
            None => false,
        }
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn reset(&mut self) {
        self.stance = Stance::Standing;
    }
}

impl Default for SitStandDetector {
    fn default() -> Self {
        Self::from_config(&SitStandConfig::default())
    }
}

/// 左右の膝角度（hip-knee-ankle）の小さい方。関節が無い脚は 180°
pub fn min_knee_angle(pose: &PoseLandmarks) -> f32 {
    let right = knee_angle(pose, PoseIndex::RightHip, PoseIndex::RightKnee, PoseIndex::RightAnkle);
    let left = knee_angle(pose, PoseIndex::LeftHip, PoseIndex::LeftKnee, PoseIndex::LeftAnkle);
    right.min(left)
}

fn knee_angle(pose: &PoseLandmarks, hip: PoseIndex, knee: PoseIndex, ankle: PoseIndex) -> f32 {
    match (pose.get(hip), pose.get(knee), pose.get(ankle)) {
        (Some(h), Some(k), Some(a)) => joint_angle_degrees(h, k, a),
        _ => EXTENDED_ANGLE_DEG,
    }
}
