//! # 本地键值持久化服务
//!
//! 对应浏览器 `localStorage` 的语义：不透明的字符串键值对，同步读写。
//! 文档存储、资料库和偏好设置都通过 `KeyValueStore` trait 访问持久层，
//! 不直接接触文件系统。
//!
//! ## 实现
//! - `FileStore` - 每个键一个 JSON 文件，写入时先写临时文件再原子重命名
//! - `MemoryStore` - 进程内存映射，用于测试和非持久化模式
//!
//! ## 失败语义
//! 写入失败只影响本次写入：调用方记录日志，内存状态仍然是权威数据。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// 打开的文档列表
pub const DOCUMENTS_KEY: &str = "tabbed-docs-data";
/// 界面主题（`"dark"` / `"light"`）
pub const THEME_KEY: &str = "tabbed-docs-theme";
/// 正文基准字号（整数字符串）
pub const FONT_SIZE_KEY: &str = "tabbed-docs-font-size";
/// 资料库条目列表
pub const LIBRARY_KEY: &str = "tabbed-docs-library";
/// 当前选择的模型 ID
pub const MODEL_KEY: &str = "tabbed-docs-selected-model";

/// 键值存储抽象
///
/// 所有方法均为同步调用，实现需保证线程安全（Tauri command 可能在不同线程上执行）。
pub trait KeyValueStore: Send + Sync {
    /// 读取键对应的值，键不存在时返回 `Ok(None)`
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 写入（覆盖）键值
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// 删除键，键不存在时同样返回成功
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// 读取并反序列化 JSON 值
///
/// # 返回值
/// - `Ok(Some(value))` - 键存在且解析成功
/// - `Ok(None)` - 键不存在
///
/// # 错误
/// 值存在但不是合法 JSON 时返回 `AppError::PersistenceParse`
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> AppResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| AppError::PersistenceParse(format!("{}: {}", key, e)))
}

/// 序列化为 JSON 并写入
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    let content = serde_json::to_string(value)?;
    store.set(key, &content)
}

// ============ 文件存储 ============

/// 基于文件的键值存储
///
/// 键 `tabbed-docs-data` 对应文件 `<root>/tabbed-docs-data.json`。
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// 打开（必要时创建）存储目录
    ///
    /// # 错误
    /// 目录创建失败时返回错误
    pub fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key);
        // 先写临时文件再重命名，避免写入中途崩溃留下截断的文件
        let tmp = self.root.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============ 内存存储 ============

/// 进程内存键值存储
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AppError::Validation(format!("存储锁已损坏: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AppError::Validation(format!("存储锁已损坏: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AppError::Validation(format!("存储锁已损坏: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}
