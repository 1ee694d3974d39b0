//! 周期检查任务模块
//!
//! 用一个长驻 tokio 任务以固定周期驱动 `ReviewChecker::evaluate_once`，
//! 独立于任何界面线程。停机时先停止发出节拍，等待进行中的
//! 评估（含其内部的存储事务）完整结束后才返回。

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::checker::ReviewChecker;

/// 默认检查周期
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

// ============================================================
// CheckerRunner - 周期检查任务
// ============================================================

/// 周期检查任务句柄
///
/// 持有任务与停机信号，`shutdown` 后任务完整退出。
pub struct CheckerRunner {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl CheckerRunner {
    /// 启动周期检查任务
    ///
    /// # Arguments
    /// * `checker` - 检查器（任务独占，`last_fired` 单写者）
    /// * `tick` - 检查周期，建议 ≤ 1 分钟
    pub fn spawn(mut checker: ReviewChecker, tick: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // 错过的节拍直接跳过，不补发
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval 的首个节拍立即触发，先吞掉它
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        checker.evaluate_once(Local::now());
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            log::info!("检查任务收到停机信号，退出");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            handle,
            shutdown_tx,
        }
    }

    /// 以默认周期启动
    pub fn spawn_default(checker: ReviewChecker) -> Self {
        Self::spawn(checker, DEFAULT_TICK)
    }

    /// 停机并等待任务退出
    ///
    /// 进行中的评估会执行完毕，不会留下半途的存储事务。
    pub async fn shutdown(self) {
        // 接收端已退出时发送失败，直接等待任务结束即可
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }

    /// 任务是否仍在运行
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

// ============================================================
// 单元测试
// ============================================================
