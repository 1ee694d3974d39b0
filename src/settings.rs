//! 设置来源模块
//!
//! 提醒检查器只读取三类设置：全局通知权限、各提醒频率的开关、
//! 各提醒频率的起始时间。设置的持久化方式由宿主应用决定，
//! 本模块只定义读取契约和一个可直接使用的内存实现。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checker::NotificationCadence;

/// 默认提醒起始时间
pub const DEFAULT_START_TIME: &str = "09:00";

// ============================================================
// SettingsSource - 设置读取契约
// ============================================================

/// 设置读取契约
///
/// 检查器每个评估周期都会重新读取，设置变更无需重启即可生效。
pub trait SettingsSource {
    /// 全局通知权限是否开启
    fn notification_permission_enabled(&self) -> bool;

    /// 指定提醒频率是否开启
    fn cadence_enabled(&self, cadence: NotificationCadence) -> bool;

    /// 指定提醒频率的起始时间 ("HH:MM")
    ///
    /// 返回值未经校验，由检查器负责解析；解析失败按配置错误处理。
    fn cadence_start_time(&self, cadence: NotificationCadence) -> String;
}

// ============================================================
// ReviewReminderSettings - 内存设置实现
// ============================================================

/// 复习提醒设置
///
/// 可序列化的设置快照，默认全部关闭。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReminderSettings {
    /// 全局通知权限
    pub notification_permission: bool,
    /// 各提醒频率的开关
    pub enabled_cadences: HashMap<NotificationCadence, bool>,
    /// 各提醒频率的起始时间 ("HH:MM")
    pub start_times: HashMap<NotificationCadence, String>,
}

impl Default for ReviewReminderSettings {
    fn default() -> Self {
        Self {
            notification_permission: false,
            enabled_cadences: HashMap::new(),
            start_times: HashMap::new(),
        }
    }
}

impl ReviewReminderSettings {
    /// 开启指定提醒频率
    pub fn enable_cadence(&mut self, cadence: NotificationCadence) {
        self.enabled_cadences.insert(cadence, true);
    }

    /// 设置指定提醒频率的起始时间
    pub fn set_start_time(&mut self, cadence: NotificationCadence, time: impl Into<String>) {
        self.start_times.insert(cadence, time.into());
    }
}

impl SettingsSource for ReviewReminderSettings {
    fn notification_permission_enabled(&self) -> bool {
        self.notification_permission
    }

    fn cadence_enabled(&self, cadence: NotificationCadence) -> bool {
        self.enabled_cadences.get(&cadence).copied().unwrap_or(false)
    }

    fn cadence_start_time(&self, cadence: NotificationCadence) -> String {
        self.start_times
            .get(&cadence)
            .cloned()
            .unwrap_or_else(|| DEFAULT_START_TIME.to_string())
    }
}

// ============================================================
// 单元测试
// ============================================================
