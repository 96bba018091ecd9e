//! # 通用工具函数
//!
//! - `path` - 应用数据目录定位
//! - `ids` - 文档 ID 与毫秒时间戳
//! - `html` - HTML 文本转义

pub mod html;
pub mod ids;
pub mod path;
