//! # 文档和资料库数据模型
//!
//! 定义了打开的文档标签（Document）和资料库快照（LibraryItem），
//! 字段命名与前端 TypeScript 接口一致（camelCase），
//! 同时也是本地持久化文件的 JSON 结构。

use serde::{Deserialize, Serialize};

use crate::utils::ids;

/// 文档标签数据结构
///
/// 表示一个打开的文档标签页。打开的文档列表中恰好有一个 `is_active == true`。
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface DocumentData {
///   id: string;
///   title: string;
///   content: string;
///   isPinned: boolean;
///   isActive: boolean;
///   lastModified: number;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// 不透明的稳定标识符，同时作为资料库条目的匹配键
    pub id: String,

    /// 标签标题
    pub title: String,

    /// 序列化后的富文本标记（HTML 片段）
    pub content: String,

    /// 是否固定：固定的文档不可关闭，且排在所有未固定文档之前
    pub is_pinned: bool,

    /// 是否为当前激活的文档
    pub is_active: bool,

    /// 最后修改时间：Unix 毫秒时间戳
    pub last_modified: i64,
}

impl Document {
    /// 创建一个空白文档，标题为 `Untitled {ordinal}`，默认处于激活状态
    pub fn blank(ordinal: usize) -> Self {
        Self {
            id: ids::generate_id(),
            title: format!("Untitled {}", ordinal),
            content: String::new(),
            is_pinned: false,
            is_active: true,
            last_modified: ids::now_millis(),
        }
    }

    /// 从资料库条目克隆出一个新的激活文档（沿用条目 ID）
    pub fn from_library(item: &LibraryItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            content: item.content.clone(),
            is_pinned: false,
            is_active: true,
            last_modified: ids::now_millis(),
        }
    }
}

/// 资料库条目数据结构
///
/// 文档的命名快照，生命周期独立于打开的标签列表。
/// 以文档 ID 为键：同一文档再次保存会覆盖旧条目。
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface LibraryItem {
///   id: string;
///   title: string;
///   content: string;
///   savedAt: number;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    pub title: String,
    pub content: String,
    /// 保存时间：Unix 毫秒时间戳
    pub saved_at: i64,
}
