use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pose::Side;
use crate::tracker::Gesture;

/// 運動の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    RightHandOpenClose,
    LeftHandOpenClose,
    MouthOpenClose,
    RightEyeBlink,
    LeftEyeBlink,
    RightLegExtension,
    LeftLegExtension,
    RightArmRaise,
    LeftArmRaise,
    SitStand,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 10] = [
        Self::RightHandOpenClose,
        Self::LeftHandOpenClose,
        Self::MouthOpenClose,
        Self::RightEyeBlink,
        Self::LeftEyeBlink,
        Self::RightLegExtension,
        Self::LeftLegExtension,
        Self::RightArmRaise,
        Self::LeftArmRaise,
        Self::SitStand,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            Self::RightHandOpenClose => "Right Hand Open - Close",
            Self::LeftHandOpenClose => "Left Hand Open - Close",
            Self::MouthOpenClose => "Mouth Open - Close",
            Self::RightEyeBlink => "Right Eye Blink",
            Self::LeftEyeBlink => "Left Eye Blink",
            Self::RightLegExtension => "Right Leg Extension",
            Self::LeftLegExtension => "Left Leg Extension",
            Self::RightArmRaise => "Right Arm Raise",
            Self::LeftArmRaise => "Left Arm Raise",
            Self::SitStand => "Sit Down, Stand Up",
        }
    }

    /// 標準プランでの目標回数
    pub fn default_target(self) -> u32 {
        match self {
            Self::RightHandOpenClose | Self::LeftHandOpenClose => 10,
            Self::MouthOpenClose | Self::RightEyeBlink | Self::LeftEyeBlink => 5,
            Self::RightLegExtension | Self::LeftLegExtension => 8,
            Self::RightArmRaise | Self::LeftArmRaise => 5,
            Self::SitStand => 8,
        }
    }

    /// 画面に出す一言ヒント
    pub fn hint(self) -> &'static str {
        match self {
            Self::RightHandOpenClose | Self::LeftHandOpenClose => {
                "Open the hand fully, then close it: one open-close cycle is one repetition."
            }
            Self::MouthOpenClose => "Open then close the mouth for one repetition.",
            Self::RightEyeBlink | Self::LeftEyeBlink => {
                "Close the eye fully and open it again for one repetition."
            }
            Self::RightLegExtension | Self::LeftLegExtension => {
                "Move the foot clearly out to the side and bring it back."
            }
            Self::RightArmRaise | Self::LeftArmRaise => {
                "Raise the wrist well above the shoulder, then lower it."
            }
            Self::SitStand => {
                "Stand upright for the first seconds (calibration), then sit down and stand up for one repetition."
            }
        }
    }

    /// 対応する開閉ジェスチャー（起立着座は None）
    pub fn gesture(self) -> Option<Gesture> {
        match self {
            Self::RightHandOpenClose => Some(Gesture::HandOpenClose(Side::Right)),
            Self::LeftHandOpenClose => Some(Gesture::HandOpenClose(Side::Left)),
            Self::MouthOpenClose => Some(Gesture::MouthOpenClose),
            Self::RightEyeBlink => Some(Gesture::EyeBlink(Side::Right)),
            Self::LeftEyeBlink => Some(Gesture::EyeBlink(Side::Left)),
            Self::RightLegExtension => Some(Gesture::LegExtension(Side::Right)),
            Self::LeftLegExtension => Some(Gesture::LegExtension(Side::Left)),
            Self::RightArmRaise => Some(Gesture::ArmRaise(Side::Right)),
            Self::LeftArmRaise => Some(Gesture::ArmRaise(Side::Left)),
            Self::SitStand => None,
        }
    }
}

/// 目標回数。時間制の運動は `Untimed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Reps(u32),
    Untimed,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Reps(n) => write!(f, "{}", n),
            Target::Untimed => write!(f, "Time"),
        }
    }
}

/// プラン内の運動1つ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub kind: ExerciseKind,
    pub name: String,
    /// None なら時間制（自動で次へ進まない）
    pub target_reps: Option<u32>,
}

impl Exercise {
    pub fn new(kind: ExerciseKind, target_reps: Option<u32>) -> Self {
        Self {
            kind,
            name: kind.default_name().to_string(),
            target_reps,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn target(&self) -> Target {
        match self.target_reps {
            Some(n) => Target::Reps(n),
            None => Target::Untimed,
        }
    }
}

/// 標準の10種目プラン
pub fn default_plan() -> Vec<Exercise> {
    ExerciseKind::ALL
        .iter()
        .map(|&kind| Exercise::new(kind, Some(kind.default_target())))
        .collect()
}
