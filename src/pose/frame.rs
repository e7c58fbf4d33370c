//! 1フレーム分のランドマーク入力と、その整合性チェック。
//!
//! ランドマークが欠けているフレームは正常（検出は確率的）として扱うが、
//! 点数が合わないグループや非有限の座標は producer 側の不具合なので
//! `FrameError` として拒否する。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::landmark::{face, hand, FaceLandmarks, HandLandmarks, Handedness, Landmark, PoseIndex, PoseLandmarks};

/// 不正なフレーム
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("hand group {index} ({handedness:?}) has {count} points, expected {expected}")]
    HandPointCount {
        index: usize,
        handedness: Handedness,
        count: usize,
        expected: usize,
    },
    #[error("face group has {count} points, expected at least {min}")]
    FacePointCount { count: usize, min: usize },
    #[error("pose group has {count} points, expected {expected}")]
    PosePointCount { count: usize, expected: usize },
    #[error("non-finite coordinate in {group} landmark {index}")]
    NonFiniteCoordinate { group: &'static str, index: usize },
}

/// ランドマーク検出器から受け取る1フレーム分の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
    #[serde(default)]
    pub face: Option<FaceLandmarks>,
    #[serde(default)]
    pub pose: Option<PoseLandmarks>,
}

impl LandmarkFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hand(mut self, hand: HandLandmarks) -> Self {
        self.hands.push(hand);
        self
    }

    pub fn with_face(mut self, face: FaceLandmarks) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_pose(mut self, pose: PoseLandmarks) -> Self {
        self.pose = Some(pose);
        self
    }

    /// 指定ラベルの最初の手
    pub fn hand(&self, handedness: Handedness) -> Option<&HandLandmarks> {
        self.hands.iter().find(|h| h.handedness == handedness)
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty() && self.face.is_none() && self.pose.is_none()
    }

    /// 点数と座標の整合性をチェック
    pub fn validate(&self) -> Result<(), FrameError> {
        for (index, h) in self.hands.iter().enumerate() {
            if h.points.len() != hand::COUNT {
                return Err(FrameError::HandPointCount {
                    index,
                    handedness: h.handedness,
                    count: h.points.len(),
                    expected: hand::COUNT,
                });
            }
            check_finite("hand", &h.points)?;
        }

        if let Some(f) = &self.face {
            if f.points.len() < face::MIN_COUNT {
                return Err(FrameError::FacePointCount {
                    count: f.points.len(),
                    min: face::MIN_COUNT,
                });
            }
            check_finite("face", &f.points)?;
        }

        if let Some(p) = &self.pose {
            if p.points.len() != PoseIndex::COUNT {
                return Err(FrameError::PosePointCount {
                    count: p.points.len(),
                    expected: PoseIndex::COUNT,
                });
            }
            check_finite("pose", &p.points)?;
        }

        Ok(())
    }
}

fn check_finite(group: &'static str, points: &[Landmark]) -> Result<(), FrameError> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(FrameError::NonFiniteCoordinate { group, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5); n]
    }

    #[test]
    fn test_empty_frame_is_valid() {
        let frame = LandmarkFrame::new();
        assert!(frame.is_empty());
        assert_eq!(frame.validate(), Ok(()));
    }

    #[test]
    fn test_full_frame_is_valid() {
        let frame = LandmarkFrame::new()
            .with_hand(HandLandmarks::new(Handedness::Left, points(21)))
            .with_hand(HandLandmarks::new(Handedness::Right, points(21)))
            .with_face(FaceLandmarks::new(points(478)))
            .with_pose(PoseLandmarks::new(points(33)));
        assert_eq!(frame.validate(), Ok(()));
    }

    #[test]
    fn test_hand_point_count_rejected() {
        let frame = LandmarkFrame::new()
            .with_hand(HandLandmarks::new(Handedness::Right, points(21)))
            .with_hand(HandLandmarks::new(Handedness::Left, points(20)));
        assert_eq!(
            frame.validate(),
            Err(FrameError::HandPointCount {
                index: 1,
                handedness: Handedness::Left,
                count: 20,
                expected: 21,
            })
        );
    }

    #[test]
    fn test_face_point_count_rejected() {
        let frame = LandmarkFrame::new().with_face(FaceLandmarks::new(points(400)));
        assert!(matches!(
            frame.validate(),
            Err(FrameError::FacePointCount { count: 400, .. })
        ));
    }

    #[test]
    fn test_pose_point_count_rejected() {
        let frame = LandmarkFrame::new().with_pose(PoseLandmarks::new(points(17)));
        assert!(matches!(
            frame.validate(),
            Err(FrameError::PosePointCount { count: 17, expected: 33 })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut pose = points(33);
        pose[27] = Landmark::new(0.5, f32::NAN);
        let frame = LandmarkFrame::new().with_pose(PoseLandmarks::new(pose));
        assert_eq!(
            frame.validate(),
            Err(FrameError::NonFiniteCoordinate { group: "pose", index: 27 })
        );
    }

    #[test]
    fn test_hand_lookup_takes_first_match() {
        let mut first = points(21);
        first[0] = Landmark::new(0.1, 0.1);
        let frame = LandmarkFrame::new()
            .with_hand(HandLandmarks::new(Handedness::Left, first))
            .with_hand(HandLandmarks::new(Handedness::Left, points(21)));
        let hand = frame.hand(Handedness::Left).unwrap();
        assert_eq!(hand.points[0], Landmark::new(0.1, 0.1));
        assert!(frame.hand(Handedness::Right).is_none());
    }

    #[test]
    fn test_json_defaults() {
        let frame: LandmarkFrame = serde_json::from_str("{}").unwrap();
        assert!(frame.is_empty());

        let json = r#"{"hands":[{"handedness":"Right","points":[{"x":0.1,"y":0.2}]}]}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].handedness, Handedness::Right);
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_error_message() {
        let err = FrameError::PosePointCount { count: 17, expected: 33 };
        assert_eq!(err.to_string(), "pose group has 17 points, expected 33");
    }
}
