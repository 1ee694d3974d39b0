//! # danci-review - 间隔复习调度引擎
//!
//! 词汇学习应用的复习调度核心，提供：
//!
//! - **间隔算法** - 离散化遗忘曲线的固定间隔阶梯 (等级 0-7)
//! - **调度记录存储** - SQLite 持久化的逐条目调度状态，事务化更新
//! - **到期提醒检查** - 多档提醒频率的周期评估，含冷却与日历去重
//! - **复习会话** - 问题/答案/提交三步走的会话状态机，延迟提交进度
//!
//! ## 模块结构
//!
//! - [`algo`] - 间隔计算 (等级阶梯、复习结果应用)
//! - [`storage`] - SQLite 存储 (记录模型、仓储、迁移)
//! - [`checker`] - 到期提醒检查器与提醒频率定义
//! - [`session`] - 复习会话状态机
//! - [`settings`] - 设置读取契约与内存实现
//! - [`runner`] - tokio 周期检查任务
//!
//! ## 使用示例
//!
//! ```rust
//! use danci_review::storage::Storage;
//! use danci_review::session::{ReviewOutcome, ReviewSession};
//! use chrono::Utc;
//!
//! let storage = Storage::in_memory().expect("storage");
//! let repo = storage.review_records();
//!
//! // 条目进入学习集时初始化调度记录
//! repo.initialize_if_absent("word-1", Utc::now()).expect("init");
//!
//! // 复习会话：加载到期快照，逐条决定并提交
//! let due = repo.get_due_items(Utc::now() + chrono::Duration::hours(1)).expect("due");
//! let mut session = ReviewSession::new(storage.review_records());
//! session.start(due);
//! while !session.is_completed() {
//!     session.record_decision(ReviewOutcome::Remembered);
//!     session.advance(Utc::now());
//! }
//! ```

// ============================================================
// 模块声明
// ============================================================

pub mod algo;
pub mod checker;
pub mod runner;
pub mod session;
pub mod settings;
pub mod storage;

// ============================================================
// 重新导出
// ============================================================

/// 重新导出检查器与提醒频率
pub use checker::{NotificationCadence, ReviewChecker};

/// 重新导出周期任务
pub use runner::CheckerRunner;

/// 重新导出会话类型
pub use session::{PendingOutcome, ReviewOutcome, ReviewSession, SessionPhase};

/// 重新导出设置类型
pub use settings::{ReviewReminderSettings, SettingsSource};

/// 重新导出存储类型
pub use storage::{
    ReviewRecord, ReviewRecordRepository, ReviewStats, Storage, StorageError, StorageResult,
};
