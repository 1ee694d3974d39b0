//! 数据模型定义
//!
//! 定义 SQLite 存储所需的数据结构，以及与数据库交互的方法。

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};

use crate::algo;
use crate::storage::StorageResult;

// ============================================================
// ReviewRecord - 复习调度记录
// ============================================================

/// 复习调度记录
///
/// 每个学习条目对应一条记录。不变式：`next_due_at` 永远由
/// `mastery_level` 经间隔算法推导，两者在同一事务中写入，
/// 任何时刻都不会单独更新其中一个。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// 学习条目唯一标识（由条目生命周期模块分配，创建后不变）
    pub item_id: String,
    /// 掌握等级 (0-7)
    pub mastery_level: i32,
    /// 最近一次复习时间（首次复习前为 None）
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// 下次到期时间（仅在首次调度前短暂为 None）
    pub next_due_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// 创建等级 0 的新记录
    ///
    /// 下次到期时间 = `now` + 等级 0 的间隔。
    pub fn new(item_id: String, now: DateTime<Utc>) -> Self {
        Self {
            item_id,
            mastery_level: algo::MIN_MASTERY_LEVEL,
            last_reviewed_at: None,
            next_due_at: Some(now + algo::next_interval(algo::MIN_MASTERY_LEVEL)),
            created_at: now,
            updated_at: now,
        }
    }

    /// 条目是否已到期
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        match self.next_due_at {
            Some(due) => due <= as_of,
            // 尚未调度的记录视为到期
            None => true,
        }
    }

    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            item_id: row.get("item_id")?,
            mastery_level: row.get("mastery_level")?,
            last_reviewed_at: row
                .get::<_, Option<String>>("last_reviewed_at")?
                .map(parse_datetime),
            next_due_at: row
                .get::<_, Option<String>>("next_due_at")?
                .map(parse_datetime),
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
        })
    }

    /// 插入到数据库
    pub fn insert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO review_record (
                item_id, mastery_level, last_reviewed_at, next_due_at,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6
            )
            "#,
            params![
                self.item_id,
                self.mastery_level,
                self.last_reviewed_at.map(format_datetime),
                self.next_due_at.map(format_datetime),
                format_datetime(self.created_at),
                format_datetime(self.updated_at),
            ],
        )?;
        Ok(())
    }
}

// ============================================================
// 辅助函数
// ============================================================

/// 格式化日期时间为字符串
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 从字符串解析日期时间
///
/// 解析失败时退回 Unix 纪元，避免单条脏数据导致查询整体失败。
pub fn parse_datetime(s: String) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(|_| DateTime::from_timestamp(0, 0).unwrap_or_else(Utc::now))
}

// ============================================================
// 单元测试
// ============================================================
