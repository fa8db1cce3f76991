mod settings;

use directories::ProjectDirs;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use settings::SETTINGS_TABLE_SCHEMA;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "DrivePicker";
const APPLICATION: &str = "DrivePicker";
const DB_FILE_NAME: &str = "picker.db";

pub type StorageResult<T> = Result<T, String>;

/// 设置存储所在的 SQLite 文件。每次操作打开一个短连接，避免跨线程共享连接。
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// 使用平台数据目录下的默认数据库文件。
    pub fn open_default() -> StorageResult<Self> {
        let database = Self::at_path(default_database_path()?);
        database.init()?;
        Ok(database)
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn init(&self) -> StorageResult<()> {
        self.with_connection(|_| Ok(()))
    }

    pub(crate) fn with_connection<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let conn = open_connection(&self.path)?;
        operation(&conn)
    }
}

fn open_connection(path: &Path) -> StorageResult<Connection> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| format!("failed to create database directory {dir:?}: {e}"))?;
    }

    let conn =
        Connection::open(path).map_err(|e| format!("failed to open SQLite database: {e}"))?;
    apply_migrations(&conn)?;
    Ok(conn)
}

fn apply_migrations(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(SETTINGS_TABLE_SCHEMA)
        .map_err(|e| format!("failed to initialize database schema: {e}"))?;
    Ok(())
}

fn default_database_path() -> StorageResult<PathBuf> {
    let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| "failed to resolve application data directory".to_string())?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

pub(crate) fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
