//! 复习间隔算法模块
//!
//! 实现离散化遗忘曲线的固定间隔阶梯：掌握等级 0-7 对应一个
//! 严格递增的复习间隔，每次复习根据记住/忘记结果单步升降等级。
//!
//! 与 FSRS 等连续优化算法不同，本模块刻意采用固定阶梯：
//! 单次复习只移动一级，间隔有上界，调度行为简单可预测。

use chrono::{DateTime, Duration, Utc};

// ============================================================
// 常量定义
// ============================================================

/// 最低掌握等级（从未记住 / 最近一次忘记）
pub const MIN_MASTERY_LEVEL: i32 = 0;

/// 最高掌握等级（充分巩固）
pub const MAX_MASTERY_LEVEL: i32 = 7;

/// 各掌握等级对应的复习间隔（分钟）
///
/// 0 → 10 分钟, 1 → 1 小时, 2 → 1 天, 3 → 7 天,
/// 4 → 14 天, 5 → 30 天, 6 → 60 天, 7 → 180 天
const INTERVAL_MINUTES: [i64; 8] = [
    10,
    60,
    60 * 24,
    60 * 24 * 7,
    60 * 24 * 14,
    60 * 24 * 30,
    60 * 24 * 60,
    60 * 24 * 180,
];

// ============================================================
// 间隔计算
// ============================================================

/// 将掌握等级收敛到合法范围 [0, 7]
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(MIN_MASTERY_LEVEL, MAX_MASTERY_LEVEL)
}

/// 获取指定掌握等级的复习间隔
///
/// 超出 [0, 7] 的等级按边界值处理：负数等级使用等级 0 的间隔，
/// 大于 7 的等级使用等级 7 的间隔。纯函数，无失败路径。
pub fn next_interval(level: i32) -> Duration {
    let idx = clamp_level(level) as usize;
    Duration::minutes(INTERVAL_MINUTES[idx])
}

/// 应用一次复习结果
///
/// 记住则等级 +1（封顶 7），忘记则等级 -1（保底 0），
/// 下次到期时间 = `now` + 新等级对应的间隔。
///
/// # Arguments
/// * `level` - 当前掌握等级
/// * `remembered` - 本次是否记住
/// * `now` - 复习发生时间
///
/// # Returns
/// * `(i32, DateTime<Utc>)` - 新掌握等级与下次到期时间
pub fn apply_outcome(level: i32, remembered: bool, now: DateTime<Utc>) -> (i32, DateTime<Utc>) {
    let current = clamp_level(level);
    let new_level = if remembered {
        (current + 1).min(MAX_MASTERY_LEVEL)
    } else {
        (current - 1).max(MIN_MASTERY_LEVEL)
    };

    (new_level, now + next_interval(new_level))
}

/// 掌握进度（0.0 - 1.0）
///
/// 用于展示层的进度条等场景，不参与调度逻辑。
pub fn mastery_progress(level: i32) -> f64 {
    clamp_level(level) as f64 / MAX_MASTERY_LEVEL as f64
}

// ============================================================
// 单元测试
// ============================================================
