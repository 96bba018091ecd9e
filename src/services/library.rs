//! # 资料库服务
//!
//! 文档的命名快照集合，持久化在 `tabbed-docs-library` 键下。
//! 与打开的标签列表相互独立：关闭标签不影响资料库，删除条目也不影响已打开的文档。
//!
//! 每次操作都重新读取存储，不在内存中缓存条目列表。

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::document::{Document, LibraryItem};
use crate::services::storage::{self, KeyValueStore, LIBRARY_KEY};
use crate::utils::ids;

/// 资料库存储
pub struct LibraryStore {
    store: Arc<dyn KeyValueStore>,
}

impl LibraryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 保存文档快照
    ///
    /// 以文档 ID 匹配：已存在则原位覆盖，否则追加到末尾。
    ///
    /// # 参数
    /// - `document` - 要保存的文档
    /// - `display_name` - 保存名称，去除空白后为空时使用文档当前标题
    ///
    /// # 返回值
    /// 实际使用的名称
    pub fn save(&self, document: &Document, display_name: &str) -> AppResult<String> {
        let trimmed = display_name.trim();
        let final_name = if trimmed.is_empty() {
            document.title.clone()
        } else {
            trimmed.to_string()
        };

        let item = LibraryItem {
            id: document.id.clone(),
            title: final_name.clone(),
            content: document.content.clone(),
            saved_at: ids::now_millis(),
        };

        let mut items = self.read_items();
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        storage::save_json(self.store.as_ref(), LIBRARY_KEY, &items)?;

        log::info!("文档 {} 已保存到资料库: {}", document.id, final_name);
        Ok(final_name)
    }

    /// 列出所有条目，按保存时间倒序
    pub fn list(&self) -> Vec<LibraryItem> {
        let mut items = self.read_items();
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        items
    }

    /// 删除指定条目
    ///
    /// # 返回值
    /// 条目存在并被删除时返回 true
    pub fn delete(&self, id: &str) -> AppResult<bool> {
        let mut items = self.read_items();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        storage::save_json(self.store.as_ref(), LIBRARY_KEY, &items)?;
        Ok(true)
    }

    /// 读取指定条目，交给文档存储激活或打开
    ///
    /// # 错误
    /// 条目不存在时返回 `AppError::Validation`
    pub fn load(&self, id: &str) -> AppResult<LibraryItem> {
        self.read_items()
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| AppError::Validation(format!("资料库中不存在 ID 为 '{}' 的条目", id)))
    }

    /// 读取条目列表，数据缺失或损坏时视为空资料库
    fn read_items(&self) -> Vec<LibraryItem> {
        match storage::load_json(self.store.as_ref(), LIBRARY_KEY) {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("读取资料库失败: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;

    fn doc(id: &str, title: &str, content: &str) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            is_pinned: false,
            is_active: true,
            last_modified: 0,
        }
    }

    fn library() -> LibraryStore {
        LibraryStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_save_blank_name_falls_back_to_title() {
        let lib = library();
        let d = doc("d1", "Meeting notes", "<p>x</p>");
        assert_eq!(lib.save(&d, "   ").unwrap(), "Meeting notes");
        let items = lib.list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Meeting notes");
    }

    #[test]
    fn test_save_then_load_returns_content_and_name() {
        let lib = library();
        let d = doc("d1", "Draft", "<p>body</p>");
        assert_eq!(lib.save(&d, "X").unwrap(), "X");
        let item = lib.load("d1").unwrap();
        assert_eq!(item.content, "<p>body</p>");
        assert_eq!(item.title, "X");
    }

    #[test]
    fn test_save_overwrites_same_document() {
        let lib = library();
        lib.save(&doc("d1", "A", "<p>1</p>"), "").unwrap();
        lib.save(&doc("d2", "B", "<p>2</p>"), "").unwrap();
        lib.save(&doc("d1", "A", "<p>updated</p>"), "A2").unwrap();

        let items = lib.list();
        assert_eq!(items.len(), 2);
        let d1 = lib.load("d1").unwrap();
        assert_eq!(d1.content, "<p>updated</p>");
        assert_eq!(d1.title, "A2");
    }

    #[test]
    fn test_list_sorted_by_saved_at_desc() {
        let kv = Arc::new(MemoryStore::new());
        let items = vec![
            LibraryItem { id: "old".into(), title: "Old".into(), content: String::new(), saved_at: 10 },
            LibraryItem { id: "new".into(), title: "New".into(), content: String::new(), saved_at: 30 },
            LibraryItem { id: "mid".into(), title: "Mid".into(), content: String::new(), saved_at: 20 },
        ];
        storage::save_json(kv.as_ref(), LIBRARY_KEY, &items).unwrap();

        let lib = LibraryStore::new(kv);
        let order: Vec<String> = lib.list().into_iter().map(|i| i.id).collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_delete_removes_single_item() {
        let lib = library();
        lib.save(&doc("d1", "A", ""), "").unwrap();
        lib.save(&doc("d2", "B", ""), "").unwrap();

        assert!(lib.delete("d1").unwrap());
        assert!(!lib.delete("d1").unwrap());
        assert!(lib.load("d1").is_err());
        assert!(lib.load("d2").is_ok());
    }

    #[test]
    fn test_corrupt_library_reads_as_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(LIBRARY_KEY, "not json").unwrap();
        let lib = LibraryStore::new(kv);
        assert!(lib.list().is_empty());
        lib.save(&doc("d1", "A", ""), "").unwrap();
        assert_eq!(lib.list().len(), 1);
    }
}
