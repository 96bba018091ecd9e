//! # Tauri Command 处理模块
//!
//! 本模块包含所有注册到 Tauri 的 command 处理函数。
//! 每个子模块对应一个功能域，均为 `AppState` 上的薄封装：
//! - `documents` - 文档标签的新建、切换、关闭、固定、重命名
//! - `editor` - 编辑面同步、选区上报、格式命令、字号
//! - `library` - 资料库的保存、列出、删除、打开
//! - `assistant` - AI 助手会话与结果写回
//! - `vault` - API Key 保管与宿主代发请求
//! - `settings` - 主题、模型选择与目录
//! - `export` - Word / 打印导出

pub mod assistant;
pub mod documents;
pub mod editor;
pub mod export;
pub mod library;
pub mod settings;
pub mod vault;
