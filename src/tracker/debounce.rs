use crate::config::DebounceConfig;

/// 連続するレップ受理の間に最低 `min_gap` フレーム空ける
///
/// カウンタは呼び出しごとに1ずつ `min_gap` まで増え、受理で0に戻る。
/// 初期値は `min_gap` なので最初の候補は即受理される。
#[derive(Debug, Clone)]
pub struct DebounceController {
    min_gap: u32,
    frames_since_accept: u32,
}

impl DebounceController {
    pub fn new(min_gap: u32) -> Self {
        Self {
            min_gap,
            frames_since_accept: min_gap,
        }
    }

    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(config.min_gap_frames)
    }

    /// 毎フレーム1回呼ぶ。候補を受理したら true
    pub fn accept(&mut self, candidate: bool) -> bool {
        if self.frames_since_accept < self.min_gap {
            self.frames_since_accept += 1;
        }
        if candidate && self.frames_since_accept >= self.min_gap {
            self.frames_since_accept = 0;
            return true;
        }
        false
    }

    pub fn frames_since_accept(&self) -> u32 {
        self.frames_since_accept
    }

    pub fn reset(&mut self) {
        self.frames_since_accept = self.min_gap;
    }
}

impl Default for DebounceController {
    fn default() -> Self {
        Self::from_config(&DebounceConfig::default())
    }
}
