use std::collections::VecDeque;

/// 固定長リングバッファ。容量を超えると最も古いサンプルを捨てる
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    /// 偶数個のときは中央2値の平均
    pub fn median(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f32> = self.samples.iter().copied().collect();
        sorted.sort_by(f32::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Some(sorted[mid])
        } else {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        }
    }
}

/// 身長サンプルの移動平均
///
/// キャリブレーション状態とは無関係に、直近 N フレームの平均を保持する。
#[derive(Debug, Clone)]
pub struct HeightSmoother {
    window: SampleWindow,
}

impl HeightSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            window: SampleWindow::new(window),
        }
    }

    /// サンプルを追加して平滑値を返す
    pub fn apply(&mut self, sample: f32) -> f32 {
        self.window.push(sample);
        self.window.mean().unwrap_or(sample)
    }

    /// 現在の平滑値（サンプルが無ければ None）
    pub fn current(&self) -> Option<f32> {
        self.window.mean()
    }
}
