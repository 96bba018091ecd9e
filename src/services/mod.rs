//! # 业务逻辑服务模块
//!
//! 包含核心业务逻辑的实现，与 Tauri command 层解耦：
//! - `storage` - 本地键值持久化（文件 / 内存）
//! - `documents` - 文档存储：新建、激活、关闭、固定、重命名、内容更新
//! - `library` - 资料库：文档命名快照的保存、列出、删除、读取
//! - `surface` - 富文本编辑面：内容同步、输入规范化、选区上报、助手结果拼接
//! - `formatting` - 格式命令分发、链接与图片插入、字号缩放
//! - `assistant` - AI 助手会话状态机、请求标记与执行
//! - `provider` - Gemini 模型服务客户端（单次 / 流式）
//! - `vault` - API Key 保管（内存 / 系统钥匙串）
//! - `catalog` - 模型目录与预置提示词目录
//! - `settings` - 偏好设置（主题、字号、模型）
//! - `export` - Word / 打印导出
//! - `app_state` - 应用全局状态，组合以上各组件

pub mod app_state;
pub mod assistant;
pub mod catalog;
pub mod documents;
pub mod export;
pub mod formatting;
pub mod library;
pub mod provider;
pub mod settings;
pub mod storage;
pub mod surface;
pub mod vault;
