//! # 文档存储服务
//!
//! 维护打开的文档标签列表，负责新建、激活、关闭、固定、重命名和内容更新。
//! 每次变更在内存状态稳定后同步写入本地存储。
//!
//! ## 不变量
//! - 列表永不为空：关闭最后一个文档时自动新建一个空白文档
//! - 恰好一个文档处于激活状态
//! - 所有固定文档排在未固定文档之前（固定切换时重排，组内相对顺序不变）
//!
//! ## 启动加载
//! 读取 `tabbed-docs-data`；键不存在、JSON 损坏或列表为空时，
//! 以一个空白文档作为初始状态（损坏数据仅记录日志，不打扰用户）。

use std::sync::Arc;

use crate::error::AppError;
use crate::models::document::{Document, LibraryItem};
use crate::services::storage::{self, DOCUMENTS_KEY, KeyValueStore};
use crate::utils::ids;

/// 文档存储
pub struct DocumentStore {
    documents: Vec<Document>,
    store: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    /// 从本地存储加载文档列表
    ///
    /// 加载后会修正激活状态：没有激活文档时激活第一个，
    /// 有多个激活文档时只保留第一个。
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let loaded: Vec<Document> = match storage::load_json(store.as_ref(), DOCUMENTS_KEY) {
            Ok(Some(docs)) => docs,
            Ok(None) => Vec::new(),
            Err(AppError::PersistenceParse(msg)) => {
                log::warn!("文档列表数据损坏，已重置为空白文档: {}", msg);
                Vec::new()
            }
            Err(e) => {
                log::warn!("读取文档列表失败，已重置为空白文档: {}", e);
                Vec::new()
            }
        };

        let mut this = Self {
            documents: loaded,
            store,
        };
        if this.documents.is_empty() {
            this.documents.push(Document::blank(1));
        }
        this.normalize_active();
        this.persist();
        this
    }

    /// 所有打开的文档（按标签顺序）
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// 当前激活的文档
    pub fn active(&self) -> Option<&Document> {
        self.documents.iter().find(|d| d.is_active)
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// 新建空白文档并激活
    ///
    /// 新文档追加到列表末尾，标题为 `Untitled {新列表长度}`。
    pub fn create(&mut self) -> &Document {
        let doc = Document::blank(self.documents.len() + 1);
        self.push_active(doc)
    }

    /// 激活指定文档，其余文档取消激活
    ///
    /// # 返回值
    /// ID 不存在时返回 false 且不做任何修改
    pub fn activate(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for doc in self.documents.iter_mut() {
            doc.is_active = doc.id == id;
        }
        self.persist();
        true
    }

    /// 关闭指定文档
    ///
    /// - 固定的文档不可关闭（无操作）
    /// - 关闭的是激活文档时，激活它前面的文档；它本身是第一个时激活新的第一个
    /// - 关闭后列表为空时新建 `Untitled 1`
    ///
    /// # 返回值
    /// 文档实际被关闭时返回 true
    pub fn close(&mut self, id: &str) -> bool {
        let Some(index) = self.documents.iter().position(|d| d.id == id) else {
            return false;
        };
        if self.documents[index].is_pinned {
            return false;
        }

        let closed = self.documents.remove(index);
        if self.documents.is_empty() {
            self.documents.push(Document::blank(1));
        } else if closed.is_active {
            let next = index.saturating_sub(1);
            for (i, doc) in self.documents.iter_mut().enumerate() {
                doc.is_active = i == next;
            }
        }

        log::debug!("关闭文档 {}，剩余 {} 个", closed.id, self.documents.len());
        self.persist();
        true
    }

    /// 切换固定状态并重排：固定文档在前，组内保持原有相对顺序
    pub fn toggle_pin(&mut self, id: &str) -> bool {
        let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) else {
            return false;
        };
        doc.is_pinned = !doc.is_pinned;

        let (pinned, unpinned): (Vec<Document>, Vec<Document>) = std::mem::take(&mut self.documents)
            .into_iter()
            .partition(|d| d.is_pinned);
        self.documents = pinned;
        self.documents.extend(unpinned);

        self.persist();
        true
    }

    /// 重命名文档
    ///
    /// 新标题去除首尾空白后为空时忽略。
    pub fn rename(&mut self, id: &str, new_title: &str) -> bool {
        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) else {
            return false;
        };
        doc.title = trimmed.to_string();
        self.persist();
        true
    }

    /// 更新内容
    ///
    /// 始终作用于当前激活文档，并刷新 `last_modified`。
    pub fn update_content(&mut self, content: impl Into<String>) -> bool {
        let Some(doc) = self.documents.iter_mut().find(|d| d.is_active) else {
            return false;
        };
        doc.content = content.into();
        doc.last_modified = ids::now_millis();
        self.persist();
        true
    }

    /// 从资料库打开文档
    ///
    /// 同 ID 的文档已打开时直接激活；否则克隆条目为新文档追加到末尾并激活。
    pub fn open_from_library(&mut self, item: &LibraryItem) -> &Document {
        if let Some(index) = self.documents.iter().position(|d| d.id == item.id) {
            for (i, doc) in self.documents.iter_mut().enumerate() {
                doc.is_active = i == index;
            }
            self.persist();
            return &self.documents[index];
        }
        self.push_active(Document::from_library(item))
    }

    /// 取消所有激活状态后追加新文档
    fn push_active(&mut self, doc: Document) -> &Document {
        for existing in self.documents.iter_mut() {
            existing.is_active = false;
        }
        self.documents.push(doc);
        self.persist();
        let last = self.documents.len() - 1;
        &self.documents[last]
    }

    /// 保证恰好一个文档激活
    fn normalize_active(&mut self) {
        let first_active = self.documents.iter().position(|d| d.is_active).unwrap_or(0);
        for (i, doc) in self.documents.iter_mut().enumerate() {
            doc.is_active = i == first_active;
        }
    }

    /// 同步写入本地存储，失败仅记录日志
    fn persist(&self) {
        if let Err(e) = storage::save_json(self.store.as_ref(), DOCUMENTS_KEY, &self.documents) {
            log::warn!("保存文档列表失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;

    fn new_store() -> (Arc<MemoryStore>, DocumentStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = DocumentStore::load(kv.clone());
        (kv, store)
    }

    fn active_count(store: &DocumentStore) -> usize {
        store.documents().iter().filter(|d| d.is_active).count()
    }

    fn ids_of(store: &DocumentStore) -> Vec<String> {
        store.documents().iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_load_seeds_single_blank_document() {
        let (_, store) = new_store();
        assert_eq!(store.documents().len(), 1);
        let doc = &store.documents()[0];
        assert_eq!(doc.title, "Untitled 1");
        assert!(doc.is_active);
        assert!(doc.content.is_empty());
    }

    #[test]
    fn test_load_malformed_json_reseeds() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(DOCUMENTS_KEY, "[{broken").unwrap();
        let store = DocumentStore::load(kv);
        assert_eq!(store.documents().len(), 1);
        assert_eq!(store.documents()[0].title, "Untitled 1");
    }

    #[test]
    fn test_load_empty_list_reseeds() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(DOCUMENTS_KEY, "[]").unwrap();
        let store = DocumentStore::load(kv);
        assert_eq!(store.documents().len(), 1);
    }

    #[test]
    fn test_load_restores_persisted_documents() {
        let (kv, mut store) = new_store();
        store.create();
        store.rename(&store.documents()[1].id.clone(), "Second");
        let reloaded = DocumentStore::load(kv);
        assert_eq!(reloaded.documents().len(), 2);
        assert_eq!(reloaded.documents()[1].title, "Second");
        assert_eq!(reloaded.active().unwrap().title, "Second");
    }

    #[test]
    fn test_create_activates_new_document() {
        let (_, mut store) = new_store();
        let id = store.create().id.clone();
        assert_eq!(store.documents().len(), 2);
        assert_eq!(store.active().unwrap().id, id);
        assert_eq!(store.active().unwrap().title, "Untitled 2");
        assert_eq!(active_count(&store), 1);
    }

    #[test]
    fn test_activate_unknown_id_is_ignored() {
        let (_, mut store) = new_store();
        let before = store.active().unwrap().id.clone();
        assert!(!store.activate("missing"));
        assert_eq!(store.active().unwrap().id, before);
    }

    #[test]
    fn test_close_active_activates_preceding() {
        let (_, mut store) = new_store();
        store.create();
        store.create();
        let ids = ids_of(&store);
        store.activate(&ids[1]);

        assert!(store.close(&ids[1]));
        assert_eq!(store.active().unwrap().id, ids[0]);
        assert_eq!(active_count(&store), 1);
    }

    #[test]
    fn test_close_first_active_activates_next_remaining() {
        let (_, mut store) = new_store();
        store.create();
        let ids = ids_of(&store);
        store.activate(&ids[0]);

        store.close(&ids[0]);
        assert_eq!(store.active().unwrap().id, ids[1]);
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let (_, mut store) = new_store();
        store.create();
        let ids = ids_of(&store);
        store.close(&ids[0]);
        assert_eq!(store.active().unwrap().id, ids[1]);
    }

    #[test]
    fn test_close_last_document_creates_blank() {
        let (_, mut store) = new_store();
        let id = store.documents()[0].id.clone();
        assert!(store.close(&id));
        assert_eq!(store.documents().len(), 1);
        assert_ne!(store.documents()[0].id, id);
        assert!(store.documents()[0].is_active);
    }

    #[test]
    fn test_list_never_empty_under_create_close_sequences() {
        let (_, mut store) = new_store();
        for round in 0..20 {
            if round % 3 == 0 {
                store.create();
            } else {
                let id = store.documents()[round % store.documents().len()].id.clone();
                store.close(&id);
            }
            assert!(!store.documents().is_empty());
            assert_eq!(active_count(&store), 1);
        }
    }

    #[test]
    fn test_close_pinned_is_noop() {
        let (_, mut store) = new_store();
        store.create();
        let ids = ids_of(&store);
        store.toggle_pin(&ids[1]);
        let before_ids = ids_of(&store);
        let before_active = store.active().unwrap().id.clone();

        assert!(!store.close(&ids[1]));
        assert_eq!(ids_of(&store), before_ids);
        assert_eq!(store.active().unwrap().id, before_active);
    }

    #[test]
    fn test_toggle_pin_partitions_stably() {
        let (_, mut store) = new_store();
        for _ in 0..4 {
            store.create();
        }
        let ids = ids_of(&store);
        store.toggle_pin(&ids[3]);
        store.toggle_pin(&ids[1]);

        let order = ids_of(&store);
        assert_eq!(order, vec![
            ids[3].clone(),
            ids[1].clone(),
            ids[0].clone(),
            ids[2].clone(),
            ids[4].clone(),
        ]);

        // 每个固定文档都排在所有未固定文档之前
        let docs = store.documents();
        let last_pinned = docs.iter().rposition(|d| d.is_pinned).unwrap();
        let first_unpinned = docs.iter().position(|d| !d.is_pinned).unwrap();
        assert!(last_pinned < first_unpinned);

        // 取消固定后回到未固定组的开头
        store.toggle_pin(&ids[1]);
        assert_eq!(ids_of(&store)[0], ids[3]);
        assert_eq!(ids_of(&store)[1], ids[1]);
    }

    #[test]
    fn test_rename_trims_and_ignores_blank() {
        let (_, mut store) = new_store();
        let id = store.documents()[0].id.clone();

        assert!(!store.rename(&id, "   "));
        assert_eq!(store.get(&id).unwrap().title, "Untitled 1");

        assert!(store.rename(&id, "  Plan  "));
        assert_eq!(store.get(&id).unwrap().title, "Plan");
    }

    #[test]
    fn test_update_content_targets_active_document() {
        let (_, mut store) = new_store();
        store.create();
        let ids = ids_of(&store);
        let before = store.get(&ids[1]).unwrap().last_modified;

        store.update_content("<p>hello</p>");
        assert_eq!(store.get(&ids[1]).unwrap().content, "<p>hello</p>");
        assert!(store.get(&ids[1]).unwrap().last_modified >= before);
        assert_eq!(store.get(&ids[0]).unwrap().content, "");
    }

    #[test]
    fn test_open_from_library_activates_existing() {
        let (_, mut store) = new_store();
        let first = store.documents()[0].id.clone();
        store.create();
        let item = LibraryItem {
            id: first.clone(),
            title: "Saved".into(),
            content: "<p>saved</p>".into(),
            saved_at: 0,
        };
        store.open_from_library(&item);
        assert_eq!(store.documents().len(), 2);
        assert_eq!(store.active().unwrap().id, first);
    }

    #[test]
    fn test_open_from_library_appends_clone() {
        let (_, mut store) = new_store();
        let item = LibraryItem {
            id: "fromlib".into(),
            title: "Saved".into(),
            content: "<p>saved</p>".into(),
            saved_at: 0,
        };
        store.open_from_library(&item);
        assert_eq!(store.documents().len(), 2);
        let active = store.active().unwrap();
        assert_eq!(active.id, "fromlib");
        assert_eq!(active.content, "<p>saved</p>");
        assert_eq!(active_count(&store), 1);
    }
}
