//! 提醒频率定义模块
//!
//! 固定的五档提醒频率，声明顺序即评估顺序。每档携带一个冷却
//! 时长，刻意设为略短于频率本身的周期：既避免同一逻辑周期内
//! 重复提醒，又能及时重新武装。

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================
// NotificationCadence - 提醒频率
// ============================================================

/// 提醒频率
///
/// 声明顺序即 `ReviewChecker` 的评估顺序，单个评估周期内
/// 最多只有排位最靠前的一档真正发出提醒。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCadence {
    /// 每 15 分钟
    Every15Min,
    /// 每小时
    Hourly,
    /// 每天
    Daily,
    /// 每周（周日）
    Weekly,
    /// 每月（1 号）
    Monthly,
}

impl NotificationCadence {
    /// 全部频率，按评估顺序排列
    pub const ALL: [NotificationCadence; 5] = [
        NotificationCadence::Every15Min,
        NotificationCadence::Hourly,
        NotificationCadence::Daily,
        NotificationCadence::Weekly,
        NotificationCadence::Monthly,
    ];

    /// 冷却时长
    ///
    /// 14 分钟 / 59 分钟 / 23 小时 55 分 / 6 天 23 小时 / 27 天，
    /// 均略短于各自的周期长度。
    pub fn cooldown(&self) -> Duration {
        match self {
            Self::Every15Min => Duration::minutes(14),
            Self::Hourly => Duration::minutes(59),
            Self::Daily => Duration::hours(23) + Duration::minutes(55),
            Self::Weekly => Duration::days(6) + Duration::hours(23),
            Self::Monthly => Duration::days(27),
        }
    }

    /// 展示用标签（不参与调度逻辑）
    pub fn label(&self) -> &'static str {
        match self {
            Self::Every15Min => "每15分钟",
            Self::Hourly => "每小时",
            Self::Daily => "每天",
            Self::Weekly => "每周",
            Self::Monthly => "每月",
        }
    }

    /// 展示用颜色（不参与调度逻辑）
    pub fn color(&self) -> &'static str {
        match self {
            Self::Every15Min => "#EF4444",
            Self::Hourly => "#F59E0B",
            Self::Daily => "#10B981",
            Self::Weekly => "#3B82F6",
            Self::Monthly => "#8B5CF6",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Every15Min => "every_15_min",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

// ============================================================
// 辅助函数
// ============================================================

/// 解析 "HH:MM" 起始时间
///
/// 解析失败返回 None，由调用方按配置错误处理（跳过该频率）。
pub fn parse_start_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

// ============================================================
// 单元测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_shorter_than_cadence_period() {
        assert!(NotificationCadence::Every15Min.cooldown() < Duration::minutes(15));
        assert!(NotificationCadence::Hourly.cooldown() < Duration::hours(1));
        assert!(NotificationCadence::Daily.cooldown() < Duration::days(1));
        assert!(NotificationCadence::Weekly.cooldown() < Duration::days(7));
        assert!(NotificationCadence::Monthly.cooldown() < Duration::days(28));
    }

    #[test]
    fn test_all_order_matches_declaration() {
        assert_eq!(NotificationCadence::ALL[0], NotificationCadence::Every15Min);
        assert_eq!(NotificationCadence::ALL[4], NotificationCadence::Monthly);
        assert_eq!(NotificationCadence::ALL.len(), 5);
    }

    #[test]
    fn test_parse_start_time() {
        assert_eq!(
            parse_start_time("09:00"),
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
        assert_eq!(
            parse_start_time(" 21:30 "),
            Some(NaiveTime::from_hms_opt(21, 30, 0).unwrap())
        );
        assert_eq!(parse_start_time("9am"), None);
        assert_eq!(parse_start_time("25:00"), None);
        assert_eq!(parse_start_time(""), None);
    }
}
