//! 開閉型ジェスチャー検出（手の開閉・口・まばたき・脚の外転・腕の挙上）。
//!
//! どれも「ある量が閾値を越えたら Armed、戻ったら Idle に戻って1回」という
//! 同じ2状態機械で、違うのは測る量と閾値だけ。`CycleDetector` がその状態機械、
//! `GestureDetector` がジェスチャーごとの測定をまとめる。

use log::debug;

use crate::config::GestureConfig;
use crate::geometry::distance;
use crate::pose::{face, hand, LandmarkFrame, PoseIndex, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Armed,
}

/// 測定値に対する条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Above(f32),
    Below(f32),
    AtLeast(f32),
    AtMost(f32),
}

impl Bound {
    pub fn holds(self, value: f32) -> bool {
        match self {
            Bound::Above(t) => value > t,
            Bound::Below(t) => value < t,
            Bound::AtLeast(t) => value >= t,
            Bound::AtMost(t) => value <= t,
        }
    }
}

/// Idle → Armed → Idle の1周で1回を数える状態機械
#[derive(Debug, Clone)]
pub struct CycleDetector {
    arm: Bound,
    release: Bound,
    state: GestureState,
}

impl CycleDetector {
    pub fn new(arm: Bound, release: Bound) -> Self {
        Self {
            arm,
            release,
            state: GestureState::Idle,
        }
    }

    /// 測定値で状態を更新。Armed → Idle に戻ったときだけ true
    ///
    /// 測定値が無いフレームは状態を変えない。
    pub fn update(&mut self, measure: Option<f32>) -> bool {
        let Some(value) = measure else {
            return false;
        };
        match self.state {
            GestureState::Idle if self.arm.holds(value) => {
                self.state = GestureState::Armed;
                false
            }
            GestureState::Armed if self.release.holds(value) => {
                self.state = GestureState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}

/// 開閉ジェスチャーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    HandOpenClose(Side),
    MouthOpenClose,
    EyeBlink(Side),
    LegExtension(Side),
    ArmRaise(Side),
}

/// ジェスチャー1種類分の検出器
#[derive(Debug, Clone)]
pub struct GestureDetector {
    gesture: Gesture,
    cycle: CycleDetector,
    mirror_handedness: bool,
}

impl GestureDetector {
    pub fn new(gesture: Gesture, config: &GestureConfig, mirror_handedness: bool) -> Self {
        let (arm, release) = match gesture {
            Gesture::HandOpenClose(_) => (Bound::Above(config.hand_open), Bound::Below(config.hand_closed)),
            Gesture::MouthOpenClose => (Bound::Above(config.mouth_open), Bound::AtMost(config.mouth_open)),
            Gesture::EyeBlink(_) => (Bound::Below(config.eye_closed), Bound::AtLeast(config.eye_closed)),
            Gesture::LegExtension(_) => {
                (Bound::Above(config.leg_extension), Bound::AtMost(config.leg_extension))
            }
            Gesture::ArmRaise(_) => {
                (Bound::Above(config.arm_raise_margin), Bound::AtMost(config.arm_raise_margin))
            }
        };
        Self {
            gesture,
            cycle: CycleDetector::new(arm, release),
            mirror_handedness,
        }
    }

    /// 1フレーム分更新。1周完了したら true
    pub fn update(&mut self, frame: &LandmarkFrame) -> bool {
        let before = self.cycle.state();
        let completed = self.cycle.update(self.measure(frame));
        if self.cycle.state() != before {
            debug!("{:?}: {:?} -> {:?}", self.gesture, before, self.cycle.state());
        }
        completed
    }

    /// フレームからこのジェスチャーの測定値を取り出す
    ///
    /// 腕の挙上は「肩のy - 手首のy」（画像座標は下が正なので、上げるほど大きい）。
    pub fn measure(&self, frame: &LandmarkFrame) -> Option<f32> {
        match self.gesture {
            Gesture::HandOpenClose(side) => {
                let h = frame.hand(side.hand_label(self.mirror_handedness))?;
                Some(distance(h.get(hand::INDEX_FINGER_TIP)?, h.get(hand::WRIST)?))
            }
            Gesture::MouthOpenClose => {
                let f = frame.face.as_ref()?;
                Some(distance(f.get(face::UPPER_LIP_INNER)?, f.get(face::LOWER_LIP_INNER)?))
            }
            Gesture::EyeBlink(side) => {
                let f = frame.face.as_ref()?;
                let (upper, lower) = match side {
                    Side::Right => (face::RIGHT_EYE_UPPER, face::RIGHT_EYE_LOWER),
                    Side::Left => (face::LEFT_EYE_UPPER, face::LEFT_EYE_LOWER),
                };
                Some(distance(f.get(upper)?, f.get(lower)?))
            }
            Gesture::LegExtension(side) => {
                let p = frame.pose.as_ref()?;
                let (hip, ankle) = match side {
                    Side::Right => (PoseIndex::RightHip, PoseIndex::RightAnkle),
                    Side::Left => (PoseIndex::LeftHip, PoseIndex::LeftAnkle),
                };
                Some((p.get(ankle)?.x - p.get(hip)?.x).abs())
            }
            Gesture::ArmRaise(side) => {
                let p = frame.pose.as_ref()?;
                let (shoulder, wrist) = match side {
                    Side::Right => (PoseIndex::RightShoulder, PoseIndex::RightWrist),
                    Side::Left => (PoseIndex::LeftShoulder, PoseIndex::LeftWrist),
                };
                Some(p.get(shoulder)?.y - p.get(wrist)?.y)
            }
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn state(&self) -> GestureState {
        self.cycle.state()
    }

    pub fn reset(&mut self) {
        self.cycle.reset();
    }
}
