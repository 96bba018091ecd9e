//! # 错误类型
//!
//! 核心服务统一返回 `AppResult<T>`。Tauri command 层
//! 在 IPC 边界通过 `map_err(|e| e.to_string())` 转换为 `Result<T, String>`，
//! 前端拿到的始终是可直接展示的文本。
//!
//! ## 错误分类
//! - `Auth` - 凭据缺失或无效，在密钥输入表单内联展示
//! - `Request` - 模型服务调用失败，在助手面板内联展示，可重试
//! - `PersistenceParse` - 本地持久化数据损坏，由文档存储静默恢复
//! - `Validation` - 空标题、空链接、无效选区等输入问题，操作降级为无操作

use thiserror::Error;

/// 应用错误枚举
#[derive(Debug, Error)]
pub enum AppError {
    /// 凭据缺失、为空或宿主不支持安全存储
    #[error("{0}")]
    Auth(String),

    /// 模型服务请求失败（消息为服务端原文或兜底文案）
    #[error("{0}")]
    Request(String),

    /// 本地存储内容无法解析
    #[error("解析本地数据失败: {0}")]
    PersistenceParse(String),

    /// 输入校验失败
    #[error("{0}")]
    Validation(String),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化失败: {0}")]
    Serde(#[from] serde_json::Error),

    /// 网络层错误（连接失败、读取响应体失败等）
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// 核心服务的返回类型别名
pub type AppResult<T> = Result<T, AppError>;
