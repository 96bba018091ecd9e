//! # 数据模型模块
//!
//! 定义了与前端 TypeScript 类型一一对应的 Rust 数据结构。
//! 所有结构体均派生 `Serialize` 和 `Deserialize`，用于 Tauri IPC 传输和本地 JSON 持久化。
//! - `document` - 文档标签和资料库条目
//! - `selection` - 选区状态与前端上报的选区事件
//! - `settings` - 偏好设置和模型目录
//! - `assistant` - 助手会话快照和预置提示词

pub mod assistant;
pub mod document;
pub mod selection;
pub mod settings;
