//! # 偏好设置和模型目录数据模型
//!
//! 定义了界面偏好（AppSettings）和模型目录（ModelCategory、ModelOption）。
//! 偏好设置中的每个字段分别以独立的键持久化。

use serde::{Deserialize, Serialize};

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    /// 持久化使用的字符串形式（`"dark"` / `"light"`）
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// 解析持久化的主题值，未知值返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// 界面偏好设置
///
/// 对应前端 App 组件中的 `isDarkMode`、`baseFontSize`、`selectedModelId` 状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: Theme,

    /// 正文基准字号（px），范围 [8, 72]
    pub base_font_size: u32,

    /// 当前选择的模型 ID
    pub selected_model_id: String,
}

/// 模型选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOption {
    /// 模型 ID（如 `openai/gpt-5`），斜杠前为服务商前缀
    pub id: String,
    pub name: String,
    /// 一句话描述模型风格
    pub vibe: String,
}

/// 模型分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCategory {
    pub id: String,
    pub label: String,
    pub models: Vec<ModelOption>,
}

/// 当前模型对应的 API Key 输入提示
///
/// 由模型 ID 的服务商前缀推导，供密钥输入表单展示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPrompt {
    pub model_name: String,
    pub key_label: String,
    pub key_placeholder: String,
}
