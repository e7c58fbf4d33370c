use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::exercise::{default_plan, Exercise, ExerciseKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub sit_stand: SitStandConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub debounce: DebounceConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default = "default_plan_entries")]
    pub plan: Vec<PlanEntryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// 基準身長を決めるまでのフレーム数
    #[serde(default = "default_calibration_frames")]
    pub frames: usize,
    /// 平滑化・中央値に使う直近サンプル数
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// 基準身長の下限（カメラが近すぎる場合の補正）
    #[serde(default = "default_min_reference")]
    pub min_reference: f32,
}

fn default_calibration_frames() -> usize { 60 }
fn default_smoothing_window() -> usize { 5 }
fn default_min_reference() -> f32 { 0.25 }

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frames: default_calibration_frames(),
            smoothing_window: default_smoothing_window(),
            min_reference: default_min_reference(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitStandConfig {
    /// 基準身長に対するこの比率を下回ったら着座
    #[serde(default = "default_sit_ratio")]
    pub sit_ratio: f32,
    /// 基準身長に対するこの比率を上回ったら起立
    #[serde(default = "default_stand_ratio")]
    pub stand_ratio: f32,
    /// 膝角度がこれ未満なら着座（度）
    #[serde(default = "default_knee_sit_deg")]
    pub knee_sit_deg: f32,
    /// 膝角度がこれを超えたら起立（度）
    #[serde(default = "default_knee_stand_deg")]
    pub knee_stand_deg: f32,
}

fn default_sit_ratio() -> f32 { 0.75 }
fn default_stand_ratio() -> f32 { 0.92 }
fn default_knee_sit_deg() -> f32 { 110.0 }
fn default_knee_stand_deg() -> f32 { 150.0 }

impl Default for SitStandConfig {
    fn default() -> Self {
        Self {
            sit_ratio: default_sit_ratio(),
            stand_ratio: default_stand_ratio(),
            knee_sit_deg: default_knee_sit_deg(),
            knee_stand_deg: default_knee_stand_deg(),
        }
    }
}

/// 開閉ジェスチャーの閾値（すべて正規化座標）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// 人差し指先端-手首距離がこれを超えたら「開」
    #[serde(default = "default_hand_open")]
    pub hand_open: f32,
    /// 人差し指先端-手首距離がこれ未満なら「閉」
    #[serde(default = "default_hand_closed")]
    pub hand_closed: f32,
    #[serde(default = "default_mouth_open")]
    pub mouth_open: f32,
    #[serde(default = "default_eye_closed")]
    pub eye_closed: f32,
    /// 足首-股関節の横方向距離
    #[serde(default = "default_leg_extension")]
    pub leg_extension: f32,
    /// 手首が肩よりこの分だけ上なら挙上
    #[serde(default = "default_arm_raise_margin")]
    pub arm_raise_margin: f32,
}

fn default_hand_open() -> f32 { 0.25 }
fn default_hand_closed() -> f32 { 0.15 }
fn default_mouth_open() -> f32 { 0.03 }
fn default_eye_closed() -> f32 { 0.015 }
fn default_leg_extension() -> f32 { 0.15 }
fn default_arm_raise_margin() -> f32 { 0.1 }

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hand_open: default_hand_open(),
            hand_closed: default_hand_closed(),
            mouth_open: default_mouth_open(),
            eye_closed: default_eye_closed(),
            leg_extension: default_leg_extension(),
            arm_raise_margin: default_arm_raise_margin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// 連続するレップ間の最小フレーム数
    #[serde(default = "default_min_gap_frames")]
    pub min_gap_frames: u32,
}

fn default_min_gap_frames() -> u32 { 10 }

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            min_gap_frames: default_min_gap_frames(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// 検出器の手ラベルが鏡像（自撮り）基準か
    #[serde(default = "default_mirror_handedness")]
    pub mirror_handedness: bool,
}

fn default_mirror_handedness() -> bool { true }

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mirror_handedness: default_mirror_handedness(),
        }
    }
}

/// `[[plan]]` の1エントリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntryConfig {
    pub kind: ExerciseKind,
    /// 省略時は時間制（自動で次へ進まない）
    #[serde(default)]
    pub target: Option<u32>,
    /// 表示名（省略時は種類ごとの既定名）
    #[serde(default)]
    pub name: Option<String>,
}

fn default_plan_entries() -> Vec<PlanEntryConfig> {
    default_plan()
        .into_iter()
        .map(|e| PlanEntryConfig {
            kind: e.kind,
            target: e.target_reps,
            name: None,
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            sit_stand: SitStandConfig::default(),
            gesture: GestureConfig::default(),
            debounce: DebounceConfig::default(),
            tracker: TrackerConfig::default(),
            plan: default_plan_entries(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content)
    }

    /// 読めなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        Ok(config)
    }

    /// `[[plan]]` から運動リストを組み立てる
    pub fn exercises(&self) -> Vec<Exercise> {
        self.plan
            .iter()
            .map(|entry| {
                let exercise = Exercise::new(entry.kind, entry.target);
                match &entry.name {
                    Some(name) => exercise.with_name(name.clone()),
                    None => exercise,
                }
            })
            .collect()
    }
}
