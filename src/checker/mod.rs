//! 到期提醒检查模块
//!
//! 由外部定时器以固定周期（建议 ≤ 1 分钟）调用 `evaluate_once`，
//! 按声明顺序评估各提醒频率。防骚扰规则：
//! - 单个评估周期内最多发出一次提醒
//! - 通过的频率即使当时无到期条目，也记录一次"空发射"，
//!   避免在冷却窗口自然经过前每个周期都重复查询
//! - 日/周/月频率额外做日历周期去重，与冷却互相独立兜底

// ============================================================
// 子模块声明
// ============================================================

pub mod policy;

pub use policy::{parse_start_time, NotificationCadence};

// ============================================================
// 依赖导入
// ============================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, Utc, Weekday};

use crate::settings::SettingsSource;
use crate::storage::ReviewRecordRepository;

/// 提醒回调
///
/// 参数为当前到期条目数。实际的系统级通知投递由宿主实现，
/// 从检查器的角度视为 fire-and-forget，不应有明显阻塞。
pub type NotifyFn = Box<dyn Fn(i64) + Send + Sync>;

// ============================================================
// ReviewChecker - 到期提醒检查器
// ============================================================

/// 到期提醒检查器
///
/// `last_fired` 是进程内状态，由构造方注入空表、仅本检查器写入，
/// 不持久化：进程重启后所有频率重新武装。
pub struct ReviewChecker {
    repo: ReviewRecordRepository,
    settings: Arc<dyn SettingsSource + Send + Sync>,
    notify: NotifyFn,
    last_fired: HashMap<NotificationCadence, DateTime<Local>>,
}

impl ReviewChecker {
    /// 创建新的检查器
    ///
    /// # Arguments
    /// * `repo` - 复习记录仓储
    /// * `settings` - 设置来源（每个评估周期重新读取）
    /// * `notify` - 提醒回调
    pub fn new(
        repo: ReviewRecordRepository,
        settings: Arc<dyn SettingsSource + Send + Sync>,
        notify: impl Fn(i64) + Send + Sync + 'static,
    ) -> Self {
        Self {
            repo,
            settings,
            notify: Box::new(notify),
            last_fired: HashMap::new(),
        }
    }

    /// 执行一次评估
    ///
    /// 按声明顺序检查每个开启的提醒频率：起始时间已过、本日历
    /// 周期未提醒过、满足日期门槛（周提醒仅周日、月提醒仅 1 号）、
    /// 冷却已结束的频率进入候选。到期条目数在整个评估周期内只
    /// 查询一次，供所有频率共享；第一个遇到非零到期数的候选频率
    /// 发出提醒，其余候选只记录发射时间不再提醒。
    ///
    /// # Arguments
    /// * `now` - 当前本地时间（测试可传入任意时刻）
    pub fn evaluate_once(&mut self, now: DateTime<Local>) {
        // 全局通知权限关闭时不评估任何频率
        if !self.settings.notification_permission_enabled() {
            return;
        }

        // 到期数惰性查询，整个评估周期共享
        let mut due_count: Option<i64> = None;
        let mut notified = false;

        for cadence in NotificationCadence::ALL {
            if !self.settings.cadence_enabled(cadence) {
                continue;
            }

            // 起始时间解析失败属配置错误：跳过本周期，不崩溃也不
            // 停用该频率，设置修复后自行恢复
            let raw = self.settings.cadence_start_time(cadence);
            let start_time = match parse_start_time(&raw) {
                Some(t) => t,
                None => {
                    log::warn!(
                        "提醒频率 {} 的起始时间无法解析: {:?}，本周期跳过",
                        cadence.as_str(),
                        raw
                    );
                    continue;
                }
            };

            // 今日起始时刻尚未到达
            if now.time() < start_time {
                continue;
            }

            let last = self.last_fired.get(&cadence).copied();

            // 本日历周期已提醒过
            if already_notified_this_period(cadence, last, now) {
                continue;
            }

            // 周/月频率的日期门槛
            if !day_gate_passes(cadence, now) {
                continue;
            }

            // 冷却检查，与日历周期去重互相独立
            if let Some(last) = last {
                if now - last < cadence.cooldown() {
                    continue;
                }
            }

            if due_count.is_none() {
                due_count = Some(self.count_due_or_zero(now));
            }
            let count = due_count.unwrap_or(0);

            if count > 0 && !notified {
                (self.notify)(count);
                notified = true;
                log::info!(
                    "提醒频率 {} 已发出提醒，到期条目数: {}",
                    cadence.as_str(),
                    count
                );
            }

            // 无论是否真正提醒都记录发射时间：空发射同样进入冷却，
            // 避免该频率在下个周期立即重查
            self.last_fired.insert(cadence, now);
        }
    }

    /// 查询指定频率最近一次发射时间
    pub fn last_fired_at(&self, cadence: NotificationCadence) -> Option<DateTime<Local>> {
        self.last_fired.get(&cadence).copied()
    }

    /// 查询到期条目数
    ///
    /// 瞬态存储错误按"本周期无到期条目"处理：漏掉一次检查
    /// 好过让检查循环崩溃，下个周期就是天然的重试。
    fn count_due_or_zero(&self, now: DateTime<Local>) -> i64 {
        match self.repo.count_due(now.with_timezone(&Utc)) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("到期条目查询失败，本周期按 0 处理: {}", e);
                0
            }
        }
    }
}

// ============================================================
// 周期判定
// ============================================================

/// 本日历周期是否已提醒过
///
/// 15 分钟 / 每小时频率不做日历去重（由冷却兜底）；
/// 每天：同一自然日；每周：最近 7 天内且同一 ISO 周；
/// 每月：同年同月。
fn already_notified_this_period(
    cadence: NotificationCadence,
    last_fired: Option<DateTime<Local>>,
    now: DateTime<Local>,
) -> bool {
    let last = match last_fired {
        Some(t) => t,
        None => return false,
    };

    match cadence {
        NotificationCadence::Every15Min | NotificationCadence::Hourly => false,
        NotificationCadence::Daily => last.date_naive() == now.date_naive(),
        NotificationCadence::Weekly => {
            now - last < Duration::days(7) && last.iso_week() == now.iso_week()
        }
        NotificationCadence::Monthly => last.year() == now.year() && last.month() == now.month(),
    }
}

/// 周/月频率的日期门槛
///
/// 每周提醒固定在周日，每月提醒固定在 1 号，其余频率不限。
fn day_gate_passes(cadence: NotificationCadence, now: DateTime<Local>) -> bool {
    match cadence {
        NotificationCadence::Weekly => now.weekday() == Weekday::Sun,
        NotificationCadence::Monthly => now.day() == 1,
        _ => true,
    }
}

// ============================================================
// 单元测试
// ============================================================
