//! 复习会话模块
//!
//! 内存中的会话状态机：按固定顺序逐条出示到期条目，
//! 问题面 → 答案面 → 下一条。用户决定先作为待提交结果暂存，
//! `advance` 时才事务化写入存储——"用户已决定"与"进度已提交"
//! 解耦，翻面前可反悔，崩溃最多丢一条未提交的决定。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{ReviewRecord, ReviewRecordRepository, StorageError};

// ============================================================
// 类型定义
// ============================================================

/// 复习结果
///
/// 跳过是一等结果而非"未决定"：它同样推进会话，只是不写存储。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewOutcome {
    /// 记住
    Remembered,
    /// 忘记
    Forgotten,
    /// 跳过（不影响调度）
    Skipped,
}

/// 会话出示阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// 问题面（只见条目，未揭示答案）
    Question,
    /// 答案面（已揭示，等待推进）
    Answer,
}

/// 待提交的复习决定
///
/// 显式值而非闭包捕获，便于在不触发副作用的情况下检视与测试。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOutcome {
    /// 条目 ID
    pub item_id: String,
    /// 复习结果
    pub outcome: ReviewOutcome,
}

// ============================================================
// ReviewSession - 复习会话
// ============================================================

/// 复习会话
///
/// 持有会话开始时的条目快照，中途不重新查询存储——
/// 即使底层记录被并发修改，本次会话的条目顺序也保持不变。
pub struct ReviewSession {
    repo: ReviewRecordRepository,
    items: Vec<ReviewRecord>,
    current_index: usize,
    phase: SessionPhase,
    pending: Option<PendingOutcome>,
    completed: bool,
}

impl ReviewSession {
    /// 创建空会话
    pub fn new(repo: ReviewRecordRepository) -> Self {
        Self {
            repo,
            items: Vec::new(),
            current_index: 0,
            phase: SessionPhase::Question,
            pending: None,
            completed: true,
        }
    }

    /// 以到期条目快照开始会话
    ///
    /// 重置进度与待提交决定。空快照的会话直接处于完成态，
    /// 调用方据此向用户呈现"无待复习条目"。
    pub fn start(&mut self, items: Vec<ReviewRecord>) {
        self.completed = items.is_empty();
        self.items = items;
        self.current_index = 0;
        self.phase = SessionPhase::Question;
        self.pending = None;
    }

    /// 记录当前条目的复习决定
    ///
    /// 暂存为待提交结果并翻到答案面，此时不写存储。
    /// 重复调用覆盖之前的决定。会话已完成时忽略。
    pub fn record_decision(&mut self, outcome: ReviewOutcome) {
        let item = match self.items.get(self.current_index) {
            Some(item) if !self.completed => item,
            _ => return,
        };

        self.pending = Some(PendingOutcome {
            item_id: item.item_id.clone(),
            outcome,
        });
        self.phase = SessionPhase::Answer;
    }

    /// 提交待定决定并推进到下一条
    ///
    /// 记住/忘记的决定事务化写入存储，跳过不写。提交失败
    /// （条目已被外部删除、瞬态存储错误）记日志后照常推进——
    /// 快照本身容忍过期。到达末尾时转入完成态。
    ///
    /// # Arguments
    /// * `now` - 提交时间
    ///
    /// # Returns
    /// * `bool` - 是否还有下一条目
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }

        if let Some(pending) = self.pending.take() {
            let remembered = match pending.outcome {
                ReviewOutcome::Remembered => Some(true),
                ReviewOutcome::Forgotten => Some(false),
                ReviewOutcome::Skipped => None,
            };

            if let Some(remembered) = remembered {
                match self.repo.apply_review_outcome(&pending.item_id, remembered, now) {
                    Ok(_) => {}
                    Err(StorageError::NotFound(id)) => {
                        // 条目在会话进行中被外部删除，软失败
                        log::warn!("复习结果提交失败，条目已不存在: {}", id);
                    }
                    Err(e) => {
                        log::error!("复习结果提交失败，丢弃待提交决定: {}", e);
                    }
                }
            }
        }

        if self.current_index + 1 >= self.items.len() {
            self.completed = true;
            return false;
        }

        self.current_index += 1;
        self.phase = SessionPhase::Question;
        true
    }

    /// 当前条目
    ///
    /// 会话完成后返回 None。
    pub fn current_item(&self) -> Option<&ReviewRecord> {
        if self.completed {
            return None;
        }
        self.items.get(self.current_index)
    }

    /// 当前出示阶段
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// 当前待提交决定
    pub fn pending_outcome(&self) -> Option<&PendingOutcome> {
        self.pending.as_ref()
    }

    /// 会话是否已完成
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// 会话进度 (已完成数, 总数)
    pub fn progress(&self) -> (usize, usize) {
        let done = if self.completed {
            self.items.len()
        } else {
            self.current_index
        };
        (done, self.items.len())
    }
}

// ============================================================
// 单元测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::Duration;

    /// 搭建含 `count` 个到期条目的会话（快照已加载）
    fn setup_session(count: usize) -> (ReviewSession, Storage, DateTime<Utc>) {
        let storage = Storage::in_memory().expect("Failed to create storage");
        let repo = storage.review_records();

        let past = crate::storage::models::parse_datetime("2025-06-01 09:00:00".to_string());
        for i in 0..count {
            repo.initialize_if_absent(&format!("item-{}", i), past)
                .expect("Failed to initialize");
        }

        let now = past + Duration::days(1);
        let items = repo.get_due_items(now).expect("Failed to load due items");

        let mut session = ReviewSession::new(storage.review_records());
        session.start(items);

        (session, storage, now)
    }

    #[test]
    fn test_empty_snapshot_completes_immediately() {
        let (session, _storage, _now) = setup_session(0);

        assert!(session.is_completed());
        assert!(session.current_item().is_none());
        assert_eq!(session.progress(), (0, 0));
    }

    #[test]
    fn test_question_to_answer_phase() {
        let (mut session, _storage, _now) = setup_session(2);

        assert_eq!(session.phase(), SessionPhase::Question);
        assert!(session.pending_outcome().is_none());

        session.record_decision(ReviewOutcome::Remembered);

        assert_eq!(session.phase(), SessionPhase::Answer);
        let pending = session.pending_outcome().expect("Pending outcome missing");
        assert_eq!(pending.outcome, ReviewOutcome::Remembered);
        assert_eq!(pending.item_id, session.current_item().unwrap().item_id);
    }

    #[test]
    fn test_decision_can_be_reconsidered_before_advance() {
        let (mut session, storage, now) = setup_session(1);
        let repo = storage.review_records();
        let item_id = session.current_item().unwrap().item_id.clone();

        session.record_decision(ReviewOutcome::Forgotten);
        session.record_decision(ReviewOutcome::Remembered);
        session.advance(now);

        // 只有最终决定生效
        let record = repo
            .get_record(&item_id)
            .expect("Failed to get record")
            .expect("Record missing");
        assert_eq!(record.mastery_level, 1);
    }

    #[test]
    fn test_advance_commits_and_moves_on() {
        let (mut session, storage, now) = setup_session(2);
        let repo = storage.review_records();
        let first_id = session.current_item().unwrap().item_id.clone();

        session.record_decision(ReviewOutcome::Remembered);
        let has_next = session.advance(now);

        assert!(has_next);
        assert_eq!(session.phase(), SessionPhase::Question);
        assert!(session.pending_outcome().is_none());
        assert_ne!(session.current_item().unwrap().item_id, first_id);

        let record = repo
            .get_record(&first_id)
            .expect("Failed to get record")
            .expect("Record missing");
        assert_eq!(record.mastery_level, 1);
        assert!(record.next_due_at.unwrap() > now);
    }

    #[test]
    fn test_skipped_writes_nothing() {
        let (mut session, storage, now) = setup_session(1);
        let repo = storage.review_records();
        let item_id = session.current_item().unwrap().item_id.clone();

        session.record_decision(ReviewOutcome::Skipped);
        session.advance(now);

        let record = repo
            .get_record(&item_id)
            .expect("Failed to get record")
            .expect("Record missing");
        assert_eq!(record.mastery_level, 0);
        assert!(record.last_reviewed_at.is_none());
    }

    #[test]
    fn test_advance_without_decision_writes_nothing() {
        let (mut session, storage, now) = setup_session(2);
        let repo = storage.review_records();
        let first_id = session.current_item().unwrap().item_id.clone();

        // 未做决定直接推进
        assert!(session.advance(now));

        let record = repo
            .get_record(&first_id)
            .expect("Failed to get record")
            .expect("Record missing");
        assert_eq!(record.mastery_level, 0);
    }

    #[test]
    fn test_three_item_session_write_count() {
        // 条目 1 记"忘记"，条目 2 未决定，条目 3 跳过：
        // 只有条目 1 发生存储写入
        let (mut session, storage, now) = setup_session(3);
        let repo = storage.review_records();

        let first_id = session.current_item().unwrap().item_id.clone();
        session.record_decision(ReviewOutcome::Forgotten);
        assert!(session.advance(now));

        // 条目 2 不做决定直接推进
        let second_id = session.current_item().unwrap().item_id.clone();
        assert!(session.advance(now));

        let third_id = session.current_item().unwrap().item_id.clone();
        session.record_decision(ReviewOutcome::Skipped);
        assert!(!session.advance(now));
        assert!(session.is_completed());

        let ids = [first_id, second_id, third_id];

        let first = repo
            .get_record(&ids[0])
            .expect("Failed to get record")
            .expect("Record missing");
        assert!(first.last_reviewed_at.is_some());

        for id in &ids[1..] {
            let record = repo
                .get_record(id)
                .expect("Failed to get record")
                .expect("Record missing");
            assert!(record.last_reviewed_at.is_none(), "条目 {} 不应被写入", id);
        }
    }

    #[test]
    fn test_completion_at_last_item() {
        let (mut session, _storage, now) = setup_session(2);

        session.record_decision(ReviewOutcome::Remembered);
        assert!(session.advance(now));

        session.record_decision(ReviewOutcome::Remembered);
        assert!(!session.advance(now));

        assert!(session.is_completed());
        assert!(session.current_item().is_none());
        assert_eq!(session.progress(), (2, 2));

        // 完成后的操作均为空操作
        session.record_decision(ReviewOutcome::Forgotten);
        assert!(session.pending_outcome().is_none());
        assert!(!session.advance(now));
    }

    #[test]
    fn test_externally_deleted_item_soft_fails() {
        let (mut session, storage, now) = setup_session(2);
        let first_id = session.current_item().unwrap().item_id.clone();

        // 模拟条目在会话进行中被外部删除
        {
            let conn = storage.connection();
            let guard = conn.lock().expect("Failed to lock");
            guard
                .execute(
                    "DELETE FROM review_record WHERE item_id = ?1",
                    rusqlite::params![first_id],
                )
                .expect("Failed to delete");
        }

        session.record_decision(ReviewOutcome::Remembered);

        // 提交被吞掉，会话照常推进
        assert!(session.advance(now));
        assert!(session.current_item().is_some());
    }

    #[test]
    fn test_restart_resets_progress() {
        let (mut session, storage, now) = setup_session(2);
        let repo = storage.review_records();

        session.record_decision(ReviewOutcome::Remembered);
        session.advance(now);

        let items = repo.get_due_items(now).expect("Failed to load due items");
        session.start(items);

        assert!(!session.is_completed());
        assert_eq!(session.progress().0, 0);
        assert_eq!(session.phase(), SessionPhase::Question);
        assert!(session.pending_outcome().is_none());
    }
}
