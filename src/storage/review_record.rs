//! 复习调度记录数据库操作模块
//!
//! 提供 ReviewRecord 的查询与事务化更新。核心约束：
//! `mastery_level` 与 `next_due_at` 永远在同一事务中一起写入，
//! 并发读取永远不会观察到两者不一致的中间状态。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::algo;
use crate::storage::models::{format_datetime, ReviewRecord};
use crate::storage::{StorageError, StorageResult};

// ============================================================
// ReviewStats - 复习统计数据
// ============================================================

/// 复习统计数据
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewStats {
    /// 总条目数
    pub total_items: i64,
    /// 当前到期条目数
    pub due_items: i64,
    /// 各掌握等级的条目数 (下标即等级 0-7)
    pub level_counts: [i64; 8],
    /// 平均掌握等级
    pub avg_mastery_level: f64,
}

// ============================================================
// ReviewRecordRepository - 复习调度记录仓储
// ============================================================

/// 复习调度记录仓储
///
/// 提供 ReviewRecord 的数据库操作方法
pub struct ReviewRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReviewRecordRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    // ========== 查询方法 ==========

    /// 获取单条记录
    ///
    /// # Arguments
    /// * `item_id` - 条目 ID
    ///
    /// # Returns
    /// * `Option<ReviewRecord>` - 记录，如果不存在则返回 None
    pub fn get_record(&self, item_id: &str) -> StorageResult<Option<ReviewRecord>> {
        let conn = self.get_connection()?;

        let record = conn
            .query_row(
                "SELECT * FROM review_record WHERE item_id = ?1",
                params![item_id],
                |row| ReviewRecord::from_row(row),
            )
            .optional()?;

        Ok(record)
    }

    /// 获取到期条目
    ///
    /// 返回 next_due_at <= as_of 的记录；next_due_at 为 NULL
    /// 的记录（尚未调度）同样视为到期。按到期时间、条目 ID 排序，
    /// 保证会话快照顺序稳定。
    ///
    /// # Arguments
    /// * `as_of` - 评估时间
    ///
    /// # Returns
    /// * `Vec<ReviewRecord>` - 到期的记录列表
    pub fn get_due_items(&self, as_of: DateTime<Utc>) -> StorageResult<Vec<ReviewRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM review_record
            WHERE next_due_at IS NULL
                OR next_due_at <= ?1
            ORDER BY next_due_at ASC, item_id ASC
            "#,
        )?;

        let records: Vec<ReviewRecord> = stmt
            .query_map(params![format_datetime(as_of)], |row| {
                ReviewRecord::from_row(row)
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    /// 统计到期条目数
    ///
    /// 与 `get_due_items` 的筛选条件一致，直接走 COUNT 避免
    /// 把整个结果集读进内存。
    pub fn count_due(&self, as_of: DateTime<Utc>) -> StorageResult<i64> {
        let conn = self.get_connection()?;

        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM review_record
            WHERE next_due_at IS NULL
                OR next_due_at <= ?1
            "#,
            params![format_datetime(as_of)],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    // ========== 更新操作 ==========

    /// 幂等初始化记录
    ///
    /// 不存在时创建等级 0 的记录（next_due_at = now + 等级 0 间隔），
    /// 已存在时原样返回现有记录，不做任何修改。
    ///
    /// # Arguments
    /// * `item_id` - 条目 ID
    /// * `now` - 当前时间
    ///
    /// # Returns
    /// * `ReviewRecord` - 新建或已存在的记录
    pub fn initialize_if_absent(
        &self,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<ReviewRecord> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT * FROM review_record WHERE item_id = ?1",
                params![item_id],
                |row| ReviewRecord::from_row(row),
            )
            .optional()?;

        if let Some(record) = existing {
            tx.commit()?;
            return Ok(record);
        }

        let record = ReviewRecord::new(item_id.to_string(), now);
        record.insert(&tx)?;
        tx.commit()?;

        Ok(record)
    }

    /// 应用一次复习结果
    ///
    /// 在单个事务内：读取当前记录（不存在则返回 NotFound），
    /// 将 last_reviewed_at 设为旧的 next_due_at（从未调度过时
    /// 退回 now），再由间隔算法推导新等级与新到期时间，三个字段
    /// 一并写入。先捕获旧 next_due_at 再覆盖是正确性约束：
    /// 迟到的复习不能被记成按时复习。
    ///
    /// # Arguments
    /// * `item_id` - 条目 ID
    /// * `remembered` - 本次是否记住
    /// * `now` - 复习发生时间
    ///
    /// # Returns
    /// * `ReviewRecord` - 更新后的记录
    pub fn apply_review_outcome(
        &self,
        item_id: &str,
        remembered: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<ReviewRecord> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT * FROM review_record WHERE item_id = ?1",
                params![item_id],
                |row| ReviewRecord::from_row(row),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;

        // 旧的 next_due_at 作为"这次复习本应发生的时间"留档
        let last_reviewed_at = current.next_due_at.unwrap_or(now);
        let (new_level, next_due_at) =
            algo::apply_outcome(current.mastery_level, remembered, now);

        tx.execute(
            r#"
            UPDATE review_record SET
                mastery_level = ?2,
                last_reviewed_at = ?3,
                next_due_at = ?4,
                updated_at = ?5
            WHERE item_id = ?1
            "#,
            params![
                item_id,
                new_level,
                format_datetime(last_reviewed_at),
                format_datetime(next_due_at),
                format_datetime(now),
            ],
        )?;

        tx.commit()?;

        Ok(ReviewRecord {
            item_id: current.item_id,
            mastery_level: new_level,
            last_reviewed_at: Some(last_reviewed_at),
            next_due_at: Some(next_due_at),
            created_at: current.created_at,
            updated_at: now,
        })
    }

    // ========== 统计方法 ==========

    /// 获取复习统计数据
    ///
    /// # Arguments
    /// * `now` - 当前时间（用于到期统计）
    pub fn review_statistics(&self, now: DateTime<Utc>) -> StorageResult<ReviewStats> {
        let conn = self.get_connection()?;

        let mut stats = ReviewStats::default();

        stats.total_items = conn
            .query_row("SELECT COUNT(*) FROM review_record", [], |row| row.get(0))
            .unwrap_or(0);

        stats.due_items = conn
            .query_row(
                "SELECT COUNT(*) FROM review_record WHERE next_due_at IS NULL OR next_due_at <= ?1",
                params![format_datetime(now)],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let mut stmt = conn.prepare(
            "SELECT mastery_level, COUNT(*) FROM review_record GROUP BY mastery_level",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows.filter_map(|r| r.ok()) {
            let level = algo::clamp_level(row.0) as usize;
            stats.level_counts[level] += row.1;
        }

        stats.avg_mastery_level = conn
            .query_row(
                "SELECT COALESCE(AVG(mastery_level), 0.0) FROM review_record",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0.0);

        Ok(stats)
    }

    // ========== 辅助方法 ==========

    /// 获取数据库连接
    fn get_connection(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

// ============================================================
// 单元测试
// ============================================================
