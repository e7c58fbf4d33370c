//! 運動セッション
//!
//! 1フレームずつ `process` を呼ぶと、起立着座の運動中なら身長キャリブレーションと
//! 平滑化を更新し、現在の運動に割り当てた検出器だけを評価して、デバウンスを通ったものを
//! レップとして数える。目標回数に達したら次の運動へ進み、最後の次は先頭に戻る。

use anyhow::{bail, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::fmt;

use crate::calibration::{standing_height, CalibrationEngine, CalibrationStatus};
use crate::config::Config;
use crate::exercise::{Exercise, ExerciseKind, Target};
use crate::pose::{FrameError, LandmarkFrame};
use crate::tracker::{DebounceController, GestureDetector, HeightSmoother, SitStandDetector};

/// 運動種類ごとの検出器
#[derive(Debug, Clone)]
enum Detector {
    Gesture(GestureDetector),
    SitStand(SitStandDetector),
}

impl Detector {
    fn for_kind(kind: ExerciseKind, config: &Config) -> Self {
        match kind.gesture() {
            Some(gesture) => Detector::Gesture(GestureDetector::new(
                gesture,
                &config.gesture,
                config.tracker.mirror_handedness,
            )),
            None => Detector::SitStand(SitStandDetector::from_config(&config.sit_stand)),
        }
    }

    fn evaluate(&mut self, frame: &LandmarkFrame, reference: Option<f32>, smoothed: Option<f32>) -> bool {
        match self {
            Detector::Gesture(d) => d.update(frame),
            Detector::SitStand(d) => match &frame.pose {
                Some(pose) => d.evaluate(pose, reference, smoothed),
                None => false,
            },
        }
    }

    fn reset(&mut self) {
        match self {
            Detector::Gesture(d) => d.reset(),
            Detector::SitStand(d) => d.reset(),
        }
    }
}

/// `process` / `advance` 1回分の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub repetition_accepted: bool,
    pub exercise_advanced: bool,
    /// 最後の運動から先頭に戻った
    pub sequence_wrapped: bool,
}

impl FrameOutcome {
    pub fn rep_count_changed(&self) -> bool {
        self.repetition_accepted || self.exercise_advanced
    }
}

/// 画面表示用のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub exercise: String,
    pub rep_count: u32,
    pub target: Target,
    pub calibration: CalibrationStatus,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Reps: {}/{} | {}",
            self.exercise, self.rep_count, self.target, self.calibration
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Done,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry<'a> {
    pub exercise: &'a Exercise,
    pub state: PlanState,
}

pub struct ExerciseSession {
    exercises: Vec<Exercise>,
    /// exercises[i] が使う detectors のインデックス（同じ種類は共有）
    bindings: Vec<usize>,
    detectors: Vec<Detector>,
    calibration: CalibrationEngine,
    smoother: HeightSmoother,
    debounce: DebounceController,
    active_index: usize,
    rep_count: u32,
}

impl ExerciseSession {
    pub fn new(exercises: Vec<Exercise>, config: &Config) -> Result<Self> {
        if exercises.is_empty() {
            bail!("Exercise plan is empty");
        }
        if let Some(e) = exercises.iter().find(|e| e.target_reps == Some(0)) {
            bail!("Exercise '{}' has a zero target", e.name);
        }

        let mut slots: HashMap<ExerciseKind, usize> = HashMap::new();
        let mut detectors = Vec::new();
        let mut bindings = Vec::with_capacity(exercises.len());
        for exercise in &exercises {
            let slot = *slots.entry(exercise.kind).or_insert_with(|| {
                detectors.push(Detector::for_kind(exercise.kind, config));
                detectors.len() - 1
            });
            bindings.push(slot);
        }

        info!(
            "Session plan: {} exercises, {} detectors",
            exercises.len(),
            detectors.len()
        );

        Ok(Self {
            exercises,
            bindings,
            detectors,
            calibration: CalibrationEngine::from_config(&config.calibration),
            smoother: HeightSmoother::new(config.calibration.smoothing_window),
            debounce: DebounceController::from_config(&config.debounce),
            active_index: 0,
            rep_count: 0,
        })
    }

    /// `[[plan]]` を使ってセッションを作る
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.exercises(), config)
    }

    /// 1フレーム処理。不正なフレームは状態を一切変えずに拒否する
    pub fn process(&mut self, frame: &LandmarkFrame) -> Result<FrameOutcome, FrameError> {
        if let Err(e) = frame.validate() {
            warn!("Rejected frame: {}", e);
            return Err(e);
        }

        // 身長の観測は起立着座の運動中だけ
        let mut calibrated_now = false;
        let mut smoothed = None;
        if self.active_exercise().kind == ExerciseKind::SitStand {
            if let Some(height) = frame.pose.as_ref().and_then(standing_height) {
                calibrated_now = self.calibration.observe(height);
                smoothed = Some(self.smoother.apply(height));
            }
        }

        // 基準が確定したフレームは判定しない
        let candidate = if calibrated_now {
            false
        } else {
            let reference = self.calibration.reference();
            let slot = self.bindings[self.active_index];
            self.detectors[slot].evaluate(frame, reference, smoothed)
        };

        let mut outcome = FrameOutcome::default();
        if !self.debounce.accept(candidate) {
            return Ok(outcome);
        }

        self.rep_count += 1;
        outcome.repetition_accepted = true;
        info!(
            "{}: repetition {}/{}",
            self.active_exercise().name,
            self.rep_count,
            self.active_exercise().target()
        );

        if let Some(target) = self.active_exercise().target_reps {
            if self.rep_count >= target {
                let advanced = self.advance();
                outcome.exercise_advanced = advanced.exercise_advanced;
                outcome.sequence_wrapped = advanced.sequence_wrapped;
            }
        }
        Ok(outcome)
    }

    /// 次の運動へ進む（時間制の運動を終えるときの外部操作にも使う）
    pub fn advance(&mut self) -> FrameOutcome {
        let finished = self.active_index;
        self.rep_count = 0;
        self.active_index = (self.active_index + 1) % self.exercises.len();
        let wrapped = self.active_index == 0;

        info!(
            "Finished '{}', next: '{}'",
            self.exercises[finished].name,
            self.active_exercise().name
        );
        if wrapped {
            info!("Plan complete, starting over");
        }

        FrameOutcome {
            repetition_accepted: false,
            exercise_advanced: true,
            sequence_wrapped: wrapped,
        }
    }

    /// 現在の運動をやり直す。キャリブレーションと運動の位置は保持
    pub fn reset(&mut self) {
        self.rep_count = 0;
        self.debounce.reset();
        for detector in &mut self.detectors {
            detector.reset();
        }
        info!("Reset '{}'", self.active_exercise().name);
    }

    pub fn status(&self) -> SessionStatus {
        let exercise = self.active_exercise();
        SessionStatus {
            exercise: exercise.name.clone(),
            rep_count: self.rep_count,
            target: exercise.target(),
            calibration: self.calibration.status(),
        }
    }

    /// 目標に対する進捗（0.0〜1.0）。時間制は None
    pub fn progress(&self) -> Option<f32> {
        let target = self.active_exercise().target_reps?;
        Some((self.rep_count as f32 / target as f32).clamp(0.0, 1.0))
    }

    pub fn plan(&self) -> Vec<PlanEntry<'_>> {
        self.exercises
            .iter()
            .enumerate()
            .map(|(i, exercise)| PlanEntry {
                exercise,
                state: match i.cmp(&self.active_index) {
                    std::cmp::Ordering::Less => PlanState::Done,
                    std::cmp::Ordering::Equal => PlanState::Active,
                    std::cmp::Ordering::Greater => PlanState::Pending,
                },
            })
            .collect()
    }

    pub fn active_exercise(&self) -> &Exercise {
        &self.exercises[self.active_index]
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    pub fn smoothed_height(&self) -> Option<f32> {
        self.smoother.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{hand, HandLandmarks, Handedness, Landmark, PoseIndex, PoseLandmarks};
    use crate::synth;

    fn session(plan: &[(ExerciseKind, Option<u32>)]) -> ExerciseSession {
        let exercises = plan.iter().map(|&(kind, target)| Exercise::new(kind, target)).collect();
        ExerciseSession::new(exercises, &Config::default()).unwrap()
    }

    fn run(s: &mut ExerciseSession, frames: &[LandmarkFrame]) -> Vec<FrameOutcome> {
        frames.iter().map(|f| s.process(f).unwrap()).collect()
    }

    fn calibrate(s: &mut ExerciseSession) {
        let frames = vec![synth::rest_frame(); 60];
        run(s, &frames);
        assert!(s.calibration().is_ready());
    }

    #[test]
    fn test_right_hand_ten_cycles_advance() {
        let mut s = session(&[
            (ExerciseKind::RightHandOpenClose, Some(10)),
            (ExerciseKind::MouthOpenClose, Some(5)),
        ]);
        let cycle = synth::cycle(ExerciseKind::RightHandOpenClose, true, 6);

        for n in 1..=9 {
            run(&mut s, &cycle);
            assert_eq!(s.rep_count(), n);
            assert_eq!(s.active_index(), 0);
        }
        let outcomes = run(&mut s, &cycle);
        assert_eq!(outcomes.iter().filter(|o| o.repetition_accepted).count(), 1);
        assert_eq!(outcomes.iter().filter(|o| o.exercise_advanced).count(), 1);
        assert!(!outcomes.iter().any(|o| o.sequence_wrapped));
        assert_eq!(s.rep_count(), 0);
        assert_eq!(s.active_index(), 1);
        assert_eq!(s.active_exercise().kind, ExerciseKind::MouthOpenClose);
    }

    #[test]
    fn test_sit_stand_through_session() {
        let mut s = session(&[(ExerciseKind::SitStand, Some(2))]);
        calibrate(&mut s);
        assert!((s.calibration().reference().unwrap() - 0.30).abs() < 1e-6);

        let cycle = synth::cycle(ExerciseKind::SitStand, true, 6);
        let outcomes = run(&mut s, &cycle);
        let accepted: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.repetition_accepted)
            .map(|(i, _)| i)
            .collect();
        // 平滑化窓が 0.276 を超えるのは立ち上がり4フレーム目
        assert_eq!(accepted, vec![9]);
        assert_eq!(s.rep_count(), 1);

        let outcomes = run(&mut s, &cycle);
        let last = outcomes.iter().find(|o| o.repetition_accepted).unwrap();
        assert!(last.exercise_advanced);
        assert!(last.sequence_wrapped);
        assert_eq!(s.rep_count(), 0);
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn test_sit_stand_needs_calibration() {
        let mut s = session(&[(ExerciseKind::SitStand, Some(8))]);
        let cycle = synth::cycle(ExerciseKind::SitStand, true, 6);
        for _ in 0..4 {
            run(&mut s, &cycle);
        }
        assert!(!s.calibration().is_ready());
        assert_eq!(s.rep_count(), 0);
    }

    #[test]
    fn test_debounce_drops_fast_cycles() {
        let mut s = session(&[(ExerciseKind::MouthOpenClose, Some(20))]);
        let cycle = synth::cycle(ExerciseKind::MouthOpenClose, true, 2);
        for _ in 0..6 {
            run(&mut s, &cycle);
        }
        // 閉じるのは 2,6,10,14,18,22 フレーム目、受理は 2 と 14 だけ
        assert_eq!(s.rep_count(), 2);
    }

    #[test]
    fn test_wrap_emits_event() {
        let mut s = session(&[
            (ExerciseKind::MouthOpenClose, Some(1)),
            (ExerciseKind::LeftEyeBlink, Some(1)),
        ]);
        let first = run(&mut s, &synth::cycle(ExerciseKind::MouthOpenClose, true, 6));
        let advanced = first.iter().find(|o| o.exercise_advanced).unwrap();
        assert!(!advanced.sequence_wrapped);
        assert_eq!(s.active_index(), 1);

        let second = run(&mut s, &synth::cycle(ExerciseKind::LeftEyeBlink, true, 6));
        let advanced = second.iter().find(|o| o.exercise_advanced).unwrap();
        assert!(advanced.sequence_wrapped);
        assert_eq!(s.active_index(), 0);
    }

    #[test]
    fn test_only_active_exercise_counts() {
        let mut s = session(&[
            (ExerciseKind::MouthOpenClose, Some(5)),
            (ExerciseKind::RightArmRaise, Some(5)),
        ]);
        run(&mut s, &synth::cycle(ExerciseKind::RightArmRaise, true, 6));
        assert_eq!(s.rep_count(), 0);
    }

    #[test]
    fn test_untimed_never_auto_advances() {
        let mut s = session(&[
            (ExerciseKind::MouthOpenClose, None),
            (ExerciseKind::RightArmRaise, Some(1)),
        ]);
        let cycle = synth::cycle(ExerciseKind::MouthOpenClose, true, 6);
        for _ in 0..15 {
            run(&mut s, &cycle);
        }
        assert_eq!(s.rep_count(), 15);
        assert_eq!(s.active_index(), 0);
        assert_eq!(s.status().target, Target::Untimed);
        assert_eq!(s.progress(), None);

        let outcome = s.advance();
        assert!(outcome.exercise_advanced);
        assert!(!outcome.sequence_wrapped);
        assert_eq!(s.rep_count(), 0);
        assert_eq!(s.active_index(), 1);
    }

    #[test]
    fn test_malformed_frame_leaves_state() {
        let mut s = session(&[(ExerciseKind::SitStand, Some(8))]);
        run(&mut s, &vec![synth::rest_frame(); 30]);
        run(&mut s, &synth::cycle(ExerciseKind::SitStand, true, 6));
        let rep_count = s.rep_count();
        let frames_seen = s.calibration().frames_seen();
        let smoothed = s.smoothed_height();

        let short_hand = LandmarkFrame::new()
            .with_hand(HandLandmarks::new(Handedness::Left, vec![Landmark::new(0.5, 0.5); hand::COUNT - 1]))
            .with_pose(synth::seated_pose());
        assert!(matches!(s.process(&short_hand), Err(FrameError::HandPointCount { .. })));

        let mut points = synth::standing_pose().points;
        points[PoseIndex::Nose as usize] = Landmark::new(f32::NAN, 0.1);
        let nan_pose = LandmarkFrame::new().with_pose(PoseLandmarks::new(points));
        assert!(matches!(s.process(&nan_pose), Err(FrameError::NonFiniteCoordinate { .. })));

        assert_eq!(frames_seen, 42);
        assert_eq!(s.rep_count(), rep_count);
        assert_eq!(s.calibration().frames_seen(), frames_seen);
        assert_eq!(s.smoothed_height(), smoothed);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut s = session(&[(ExerciseKind::MouthOpenClose, Some(5))]);
        let outcome = s.process(&LandmarkFrame::new()).unwrap();
        assert_eq!(outcome, FrameOutcome::default());
        assert_eq!(s.calibration().frames_seen(), 0);
        assert_eq!(s.smoothed_height(), None);
    }

    #[test]
    fn test_calibration_only_during_sit_stand() {
        let mut s = session(&[
            (ExerciseKind::RightHandOpenClose, Some(1)),
            (ExerciseKind::SitStand, Some(8)),
        ]);
        // 手の運動中は座っていても基準身長に影響しない
        let mut seated = synth::rest_frame();
        seated.pose = Some(synth::seated_pose());
        run(&mut s, &vec![seated; 60]);
        assert_eq!(s.active_index(), 0);
        assert_eq!(s.status().calibration.to_string(), "Calibrate: 0/60");
        assert_eq!(s.smoothed_height(), None);

        s.advance();
        calibrate(&mut s);
        assert_eq!(s.status().calibration.to_string(), "Reference: 0.300");
    }

    #[test]
    fn test_calibration_frame_skips_sit_stand() {
        let mut s = session(&[(ExerciseKind::SitStand, Some(8))]);
        run(&mut s, &vec![synth::rest_frame(); 59]);
        // 60フレーム目で基準が確定するが、その座位では着座にならない
        let mut seated = synth::rest_frame();
        seated.pose = Some(synth::seated_pose());
        let outcome = s.process(&seated).unwrap();
        assert!(s.calibration().is_ready());
        assert!(!outcome.repetition_accepted);

        run(&mut s, &vec![synth::rest_frame(); 5]);
        assert_eq!(s.rep_count(), 0);

        run(&mut s, &synth::cycle(ExerciseKind::SitStand, true, 6));
        assert_eq!(s.rep_count(), 1);
    }

    #[test]
    fn test_reset_rearms_debounce_and_detectors() {
        let mut s = session(&[(ExerciseKind::MouthOpenClose, Some(5))]);
        let cycle = synth::cycle(ExerciseKind::MouthOpenClose, true, 1);
        run(&mut s, &cycle);
        assert_eq!(s.rep_count(), 1);
        s.reset();
        assert_eq!(s.rep_count(), 0);
        // デバウンスが戻っているので間隔なしで受理される
        run(&mut s, &cycle);
        assert_eq!(s.rep_count(), 1);

        // 開いたままリセットすると、その後の閉じでは数えない
        s.reset();
        s.process(&synth::engaged_frame(ExerciseKind::MouthOpenClose, true)).unwrap();
        s.reset();
        let outcome = s.process(&synth::rest_frame()).unwrap();
        assert!(!outcome.repetition_accepted);
    }

    #[test]
    fn test_reset_keeps_calibration_and_index() {
        let mut s = session(&[
            (ExerciseKind::SitStand, Some(8)),
            (ExerciseKind::MouthOpenClose, Some(1)),
        ]);
        calibrate(&mut s);
        s.advance();
        s.reset();
        assert_eq!(s.active_index(), 1);
        assert!(s.calibration().is_ready());
    }

    #[test]
    fn test_same_kind_shares_detector() {
        let s = session(&[
            (ExerciseKind::MouthOpenClose, Some(1)),
            (ExerciseKind::RightArmRaise, Some(1)),
            (ExerciseKind::MouthOpenClose, Some(3)),
        ]);
        assert_eq!(s.detectors.len(), 2);
        assert_eq!(s.bindings, vec![0, 1, 0]);
    }

    #[test]
    fn test_detector_state_survives_transitions() {
        let mut s = session(&[
            (ExerciseKind::MouthOpenClose, Some(1)),
            (ExerciseKind::RightArmRaise, Some(1)),
            (ExerciseKind::MouthOpenClose, Some(1)),
        ]);
        // 口を開けたまま次へ進み、腕の運動を経て同じ検出器に戻る
        s.process(&synth::engaged_frame(ExerciseKind::MouthOpenClose, true)).unwrap();
        s.advance();
        run(&mut s, &vec![synth::rest_frame(); 3]);
        s.advance();
        assert_eq!(s.active_index(), 2);

        // 最初の閉じでそのまま1回
        let outcome = s.process(&synth::rest_frame()).unwrap();
        assert!(outcome.repetition_accepted);
        assert!(outcome.sequence_wrapped);

        // Idle に戻すのは reset だけ
        s.process(&synth::engaged_frame(ExerciseKind::MouthOpenClose, true)).unwrap();
        s.advance();
        s.advance();
        s.advance();
        assert_eq!(s.active_index(), 0);
        s.reset();
        let outcome = s.process(&synth::rest_frame()).unwrap();
        assert!(!outcome.repetition_accepted);
    }

    #[test]
    fn test_invalid_plans_rejected() {
        assert!(ExerciseSession::new(Vec::new(), &Config::default()).is_err());
        let zero = vec![Exercise::new(ExerciseKind::SitStand, Some(0))];
        assert!(ExerciseSession::new(zero, &Config::default()).is_err());
    }

    #[test]
    fn test_status_progress_and_plan() {
        let mut s = ExerciseSession::from_config(&Config::default()).unwrap();
        assert_eq!(
            s.status().to_string(),
            "Right Hand Open - Close | Reps: 0/10 | Calibrate: 0/60"
        );
        assert_eq!(s.progress(), Some(0.0));

        s.advance();
        run(&mut s, &synth::cycle(ExerciseKind::LeftHandOpenClose, true, 6));
        assert!((s.progress().unwrap() - 0.1).abs() < 1e-6);

        let plan = s.plan();
        assert_eq!(plan.len(), 10);
        assert_eq!(plan[0].state, PlanState::Done);
        assert_eq!(plan[1].state, PlanState::Active);
        assert_eq!(plan[2].state, PlanState::Pending);
        assert_eq!(plan[1].exercise.kind, ExerciseKind::LeftHandOpenClose);
    }

    #[test]
    fn test_rep_count_change_flag() {
        let o = FrameOutcome {
            repetition_accepted: true,
            ..FrameOutcome::default()
        };
        assert!(o.rep_count_changed());
        assert!(!FrameOutcome::default().rep_count_changed());
    }
}
