//! 帧计时模块
//!
//! 以 `Instant` 为基准计算每次主循环迭代的时间间隔，并维护帧统计。
//! 平均帧时间每 60 帧刷新一次。

use std::time::{Duration, Instant};

/// 平均帧时间的刷新周期（帧）
pub const STATS_WINDOW_FRAMES: u32 = 60;

/// 帧统计信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// 上一帧的时间间隔（秒）
    pub delta_time: f32,
    /// 由最近一次平均帧时间推算的帧率
    pub fps: f32,
    /// 已计时的帧数
    pub frame_count: u64,
    /// 自基准点以来的总时间（秒）
    pub total_time: f64,
    /// 最近一个统计周期的平均帧时间（秒）
    pub average_frame_time: f32,
    pub min_frame_time: f32,
    pub max_frame_time: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            delta_time: 0.0,
            fps: 0.0,
            frame_count: 0,
            total_time: 0.0,
            average_frame_time: 0.0,
            min_frame_time: f32::MAX,
            max_frame_time: 0.0,
        }
    }
}

/// 帧计时器
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_frame: Instant,
    stats: FrameStats,
    window_time: f32,
    window_frames: u32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            stats: FrameStats::default(),
            window_time: 0.0,
            window_frames: 0,
        }
    }

    /// 重置时间基准
    ///
    /// 暂停恢复后调用，避免下一帧的间隔包含暂停时长。统计数据保留。
    pub fn reset_baseline(&mut self) {
        self.last_frame = Instant::now();
    }

    /// 计时一帧，返回与上一帧的时间间隔（秒）
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.record(delta)
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    fn record(&mut self, delta: Duration) -> f32 {
        let dt = delta.as_secs_f32();
        let stats = &mut self.stats;

        stats.delta_time = dt;
        stats.frame_count += 1;
        stats.total_time += delta.as_secs_f64();
        stats.min_frame_time = stats.min_frame_time.min(dt);
        stats.max_frame_time = stats.max_frame_time.max(dt);

        self.window_time += dt;
        self.window_frames += 1;
        if self.window_frames >= STATS_WINDOW_FRAMES {
            stats.average_frame_time = self.window_time / self.window_frames as f32;
            stats.fps = if stats.average_frame_time > 0.0 {
                1.0 / stats.average_frame_time
            } else {
                0.0
            };
            self.window_time = 0.0;
            self.window_frames = 0;
        }

        dt
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 限帧：若本帧耗时不足 `1 / target_fps`，睡眠剩余时间
///
/// `target_fps` 为 0 时不做任何事。
pub fn limit_frame_rate(frame_start: Instant, target_fps: u32) {
    if target_fps == 0 {
        return;
    }
    let budget = Duration::from_secs_f64(1.0 / target_fps as f64);
    let elapsed = frame_start.elapsed();
    if elapsed < budget {
        std::thread::sleep(budget - elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_refreshes_every_window() {
        let mut timer = FrameTimer::new();
        for _ in 0..STATS_WINDOW_FRAMES - 1 {
            timer.record(Duration::from_millis(10));
        }
        assert_eq!(timer.stats().average_frame_time, 0.0);
        assert_eq!(timer.stats().fps, 0.0);

        timer.record(Duration::from_millis(10));
        let stats = timer.stats();
        assert_eq!(stats.frame_count, STATS_WINDOW_FRAMES as u64);
        assert!((stats.average_frame_time - 0.010).abs() < 1e-4);
        assert!((stats.fps - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_min_max_tracking() {
        let mut timer = FrameTimer::new();
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(5));
        timer.record(Duration::from_millis(12));

        let stats = timer.stats();
        assert!((stats.min_frame_time - 0.005).abs() < 1e-6);
        assert!((stats.max_frame_time - 0.020).abs() < 1e-6);
        assert!((stats.delta_time - 0.012).abs() < 1e-6);
        assert!((stats.total_time - 0.037).abs() < 1e-6);
    }

    #[test]
    fn test_limit_frame_rate_sleeps_remaining_budget() {
        let start = Instant::now();
        limit_frame_rate(start, 100);
        assert!(start.elapsed() >= Duration::from_millis(10));

        let start = Instant::now();
        limit_frame_rate(start, 0);
        assert!(start.elapsed() < Duration::from_millis(10));
    }
}
