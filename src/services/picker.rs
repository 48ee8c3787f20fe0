//! 随机回复选择器

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// 进程级随机源，启动时播种一次
///
/// 固定种子时输出可复现，便于测试断言。
#[derive(Debug)]
pub struct ReplyPicker {
    rng: Mutex<StdRng>,
}

impl ReplyPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// 均匀随机选取一项，空切片返回 `None`
    pub fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rng.lock().gen_range(0..items.len());
        items.get(index)
    }

    /// `[min_ms, max_ms]` 之间的随机延迟
    pub fn delay_between(&self, min_ms: u64, max_ms: u64) -> Duration {
        if max_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        Duration::from_millis(self.rng.lock().gen_range(min_ms..=max_ms))
    }
}
