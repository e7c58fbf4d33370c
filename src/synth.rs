//! 合成ランドマーク。実カメラ無しでの再生・デモ・テスト用
//!
//! 基本姿勢は正面を向いて立った状態（基準身長 0.30）で、両手は握り、
//! 口は閉じ、両目は開いている。`engaged_frame` はそこから運動1種類分の
//! 動作だけを加える。

use crate::exercise::ExerciseKind;
use crate::pose::{
    face, hand, FaceLandmarks, HandLandmarks, Handedness, Landmark, LandmarkFrame, PoseIndex,
    PoseLandmarks, Side,
};

pub const STANDING_HEIGHT: f32 = 0.30;
pub const SEATED_HEIGHT: f32 = 0.20;

const OPEN_HAND_SPAN: f32 = 0.30;
const CLOSED_HAND_SPAN: f32 = 0.10;
const OPEN_MOUTH_GAP: f32 = 0.05;
const CLOSED_MOUTH_GAP: f32 = 0.01;
const OPEN_EYE_GAP: f32 = 0.03;
const CLOSED_EYE_GAP: f32 = 0.005;
const LEG_SWING: f32 = 0.2;
const RAISED_WRIST_Y: f32 = 0.02;

fn place(points: &mut [Landmark], index: PoseIndex, x: f32, y: f32) {
    points[index as usize] = Landmark::new(x, y);
}

/// 直立（膝 180°）
pub fn standing_pose() -> PoseLandmarks {
    let mut p = vec![Landmark::new(0.5, 0.2); PoseIndex::COUNT];
    place(&mut p, PoseIndex::Nose, 0.50, 0.10);
    place(&mut p, PoseIndex::LeftShoulder, 0.54, 0.15);
    place(&mut p, PoseIndex::RightShoulder, 0.46, 0.15);
    place(&mut p, PoseIndex::LeftWrist, 0.56, 0.23);
    place(&mut p, PoseIndex::RightWrist, 0.44, 0.23);
    place(&mut p, PoseIndex::LeftHip, 0.52, 0.25);
    place(&mut p, PoseIndex::RightHip, 0.48, 0.25);
    place(&mut p, PoseIndex::LeftKnee, 0.52, 0.325);
    place(&mut p, PoseIndex::RightKnee, 0.48, 0.325);
    place(&mut p, PoseIndex::LeftAnkle, 0.52, 0.40);
    place(&mut p, PoseIndex::RightAnkle, 0.48, 0.40);
    PoseLandmarks::new(p)
}

/// 椅子に座った状態（膝 約95°）
pub fn seated_pose() -> PoseLandmarks {
    let mut p = standing_pose().points;
    place(&mut p, PoseIndex::Nose, 0.50, 0.20);
    place(&mut p, PoseIndex::LeftShoulder, 0.54, 0.25);
    place(&mut p, PoseIndex::RightShoulder, 0.46, 0.25);
    place(&mut p, PoseIndex::LeftWrist, 0.58, 0.31);
    place(&mut p, PoseIndex::RightWrist, 0.50, 0.31);
    place(&mut p, PoseIndex::LeftHip, 0.52, 0.32);
    place(&mut p, PoseIndex::RightHip, 0.48, 0.32);
    place(&mut p, PoseIndex::LeftKnee, 0.62, 0.33);
    place(&mut p, PoseIndex::RightKnee, 0.58, 0.33);
    place(&mut p, PoseIndex::LeftAnkle, 0.62, 0.40);
    place(&mut p, PoseIndex::RightAnkle, 0.58, 0.40);
    PoseLandmarks::new(p)
}

fn extended_leg(side: Side) -> PoseLandmarks {
    let mut p = standing_pose().points;
    match side {
        Side::Right => place(&mut p, PoseIndex::RightAnkle, 0.48 - LEG_SWING, 0.40),
        Side::Left => place(&mut p, PoseIndex::LeftAnkle, 0.52 + LEG_SWING, 0.40),
    }
    PoseLandmarks::new(p)
}

fn raised_arm(side: Side) -> PoseLandmarks {
    let mut p = standing_pose().points;
    match side {
        Side::Right => place(&mut p, PoseIndex::RightWrist, 0.44, RAISED_WRIST_Y),
        Side::Left => place(&mut p, PoseIndex::LeftWrist, 0.56, RAISED_WRIST_Y),
    }
    PoseLandmarks::new(p)
}

/// 手首から人差し指先端まで `span` の手
fn hand_group(handedness: Handedness, span: f32) -> HandLandmarks {
    let wrist_x = match handedness {
        Handedness::Left => 0.3,
        Handedness::Right => 0.7,
    };
    let mut points = vec![Landmark::new(wrist_x, 0.6); hand::COUNT];
    points[hand::INDEX_FINGER_TIP] = Landmark::new(wrist_x, 0.6 - span);
    HandLandmarks::new(handedness, points)
}

fn hands(open: Option<Handedness>) -> Vec<HandLandmarks> {
    [Handedness::Left, Handedness::Right]
        .into_iter()
        .map(|label| {
            let span = if open == Some(label) { OPEN_HAND_SPAN } else { CLOSED_HAND_SPAN };
            hand_group(label, span)
        })
        .collect()
}

fn face_mesh(mouth_gap: f32, right_eye_gap: f32, left_eye_gap: f32) -> FaceLandmarks {
    let mut points = vec![Landmark::new(0.5, 0.08); face::MIN_COUNT];
    points[face::UPPER_LIP_INNER] = Landmark::new(0.5, 0.12);
    points[face::LOWER_LIP_INNER] = Landmark::new(0.5, 0.12 + mouth_gap);
    points[face::RIGHT_EYE_UPPER] = Landmark::new(0.48, 0.07);
    points[face::RIGHT_EYE_LOWER] = Landmark::new(0.48, 0.07 + right_eye_gap);
    points[face::LEFT_EYE_UPPER] = Landmark::new(0.52, 0.07);
    points[face::LEFT_EYE_LOWER] = Landmark::new(0.52, 0.07 + left_eye_gap);
    FaceLandmarks::new(points)
}

/// 何の運動もしていない直立フレーム
pub fn rest_frame() -> LandmarkFrame {
    LandmarkFrame {
        hands: hands(None),
        face: Some(face_mesh(CLOSED_MOUTH_GAP, OPEN_EYE_GAP, OPEN_EYE_GAP)),
        pose: Some(standing_pose()),
    }
}

/// `kind` の動作を行っている最中のフレーム
pub fn engaged_frame(kind: ExerciseKind, mirror_handedness: bool) -> LandmarkFrame {
    let mut frame = rest_frame();
    match kind {
        ExerciseKind::RightHandOpenClose => {
            frame.hands = hands(Some(Side::Right.hand_label(mirror_handedness)));
        }
        ExerciseKind::LeftHandOpenClose => {
            frame.hands = hands(Some(Side::Left.hand_label(mirror_handedness)));
        }
        ExerciseKind::MouthOpenClose => {
            frame.face = Some(face_mesh(OPEN_MOUTH_GAP, OPEN_EYE_GAP, OPEN_EYE_GAP));
        }
        ExerciseKind::RightEyeBlink => {
            frame.face = Some(face_mesh(CLOSED_MOUTH_GAP, CLOSED_EYE_GAP, OPEN_EYE_GAP));
        }
        ExerciseKind::LeftEyeBlink => {
            frame.face = Some(face_mesh(CLOSED_MOUTH_GAP, OPEN_EYE_GAP, CLOSED_EYE_GAP));
        }
        ExerciseKind::RightLegExtension => frame.pose = Some(extended_leg(Side::Right)),
        ExerciseKind::LeftLegExtension => frame.pose = Some(extended_leg(Side::Left)),
        ExerciseKind::RightArmRaise => frame.pose = Some(raised_arm(Side::Right)),
        ExerciseKind::LeftArmRaise => frame.pose = Some(raised_arm(Side::Left)),
        ExerciseKind::SitStand => frame.pose = Some(seated_pose()),
    }
    frame
}

/// 動作 `hold` フレーム → 静止 `hold` フレームの1周
///
/// 起立着座は平滑化窓が追いつくまで静止側を 4 フレーム以上保つ必要がある。
pub fn cycle(kind: ExerciseKind, mirror_handedness: bool, hold: usize) -> Vec<LandmarkFrame> {
    let hold = hold.max(1);
    let engaged = engaged_frame(kind, mirror_handedness);
    let rest = rest_frame();
    std::iter::repeat(engaged)
        .take(hold)
        .chain(std::iter::repeat(rest).take(hold))
        .collect()
}
