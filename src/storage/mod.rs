//! SQLite 调度记录存储模块
//!
//! 提供复习调度记录的本地持久化，支持：
//! - 按到期时间查询待复习条目
//! - 复习结果的事务化应用（等级与到期时间同事务写入）
//! - 幂等的记录初始化

// ============================================================
// 子模块声明
// ============================================================

pub mod migrations;
pub mod models;
pub mod review_record;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use migrations::run_migrations;
pub use models::ReviewRecord;
pub use review_record::{ReviewRecordRepository, ReviewStats};

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// Storage - 数据库连接管理器
// ============================================================

/// 数据库连接管理器
///
/// 持有共享的 SQLite 连接，按需创建仓储实例。
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Storage {
    /// 创建新的 Storage 实例
    ///
    /// 自动启用 WAL 模式、外键约束，并运行数据库迁移。
    ///
    /// # Arguments
    /// * `db_path` - 数据库文件路径
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path_str = db_path.as_ref().to_string_lossy().to_string();
        let connection = Connection::open(&db_path)?;

        // 启用 WAL 模式以提高并发性能
        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;

        let conn = Arc::new(Mutex::new(connection));

        // 运行迁移
        {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::LockError(e.to_string()))?;
            migrations::run_migrations(&guard)?;
        }

        Ok(Self {
            conn,
            db_path: path_str,
        })
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;

        connection.execute_batch("PRAGMA foreign_keys=ON;")?;

        let conn = Arc::new(Mutex::new(connection));

        // 运行迁移
        {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::LockError(e.to_string()))?;
            migrations::run_migrations(&guard)?;
        }

        Ok(Self {
            conn,
            db_path: ":memory:".to_string(),
        })
    }

    /// 获取数据库连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 获取数据库路径
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 获取复习调度记录仓库
    pub fn review_records(&self) -> ReviewRecordRepository {
        ReviewRecordRepository::new(Arc::clone(&self.conn))
    }

    /// 执行事务
    ///
    /// # Arguments
    /// * `f` - 在事务中执行的闭包
    pub fn transaction<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_in_memory() {
        let storage = Storage::in_memory().expect("Failed to create in-memory storage");
        assert_eq!(storage.db_path(), ":memory:");
    }

    #[test]
    fn test_connection_usable() {
        let storage = Storage::in_memory().expect("Failed to create in-memory storage");
        let conn = storage.connection();
        let guard = conn.lock().expect("Failed to lock connection");
        let result: i32 = guard.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(result, 1);
    }

    #[test]
    fn test_transaction() {
        let storage = Storage::in_memory().expect("Failed to create in-memory storage");

        let result = storage.transaction(|_conn| Ok(42));
        assert_eq!(result.unwrap(), 42);
    }
}
