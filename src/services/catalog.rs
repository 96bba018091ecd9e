//! # 静态目录
//!
//! 模型目录和预置提示词目录都是固定配置数据，
//! 以静态表的形式定义，按需构造成可序列化的模型结构交给前端。

use crate::models::assistant::{Suggestion, SuggestionGroup};
use crate::models::settings::{KeyPrompt, ModelCategory, ModelOption};

/// 默认模型
pub const DEFAULT_MODEL_ID: &str = "meta-llama/llama-4-maverick:free";

/// (分类 ID, 分类名称, [(模型 ID, 名称, 风格)])
type CategoryRow = (&'static str, &'static str, &'static [(&'static str, &'static str, &'static str)]);

const MODEL_TABLE: &[CategoryRow] = &[
    (
        "heavyweights",
        "The Heavyweights (Highest Quality)",
        &[
            ("anthropic/claude-3.7-sonnet", "Claude 3.7 Sonnet", "Highly natural, human-sounding tone"),
            ("openai/gpt-5", "GPT-5", "Industry standard, precise formatting"),
            ("google/gemini-3-pro", "Gemini 3 Pro", "Massive context, great for research"),
        ],
    ),
    (
        "speedsters",
        "The Speedsters (Fast & Cheap)",
        &[
            ("google/gemini-3-flash", "Gemini 3 Flash", "Ultra-fast, excellent instruction following"),
            ("openai/gpt-5-nano", "GPT-5 Nano", "Lightweight, instant grammar fixes"),
            ("meta-llama/llama-4-maverick", "Llama 4 Maverick", "Lightning-fast open-source"),
        ],
    ),
    (
        "free_openrouter",
        "Completely Free (via OpenRouter)",
        &[
            ("meta-llama/llama-4-maverick:free", "Llama 4 Maverick (Free)", "Fastest free model for quick edits"),
            ("deepseek/deepseek-r1:free", "DeepSeek R1 (Free)", "Best free logic and reasoning"),
            ("google/gemini-2.5-pro-exp-03-25:free", "Gemini 2.5 Pro Exp (Free)", "Massive 1M token context window"),
        ],
    ),
];

/// (分组标题, [(图标, 名称, 指令)])
type SuggestionRow = (&'static str, &'static [(&'static str, &'static str, &'static str)]);

const SUGGESTION_TABLE: &[SuggestionRow] = &[
    (
        "Writing",
        &[
            ("fa-magic", "Improve writing", "Improve the writing of the following text, making it more professional and clear:"),
            ("fa-pen-nib", "Continue writing", "Based on the following context, continue writing a few more sentences:"),
            ("fa-spell-check", "Fix spelling & grammar", "Fix any spelling and grammar mistakes in the following text:"),
            ("fa-language", "Translate into English", "Translate the following text into English:"),
            ("fa-compress-arrows-alt", "Make shorter", "Summarize the following text to be much shorter:"),
            ("fa-expand-arrows-alt", "Make longer", "Expand on the following text with more detail and depth:"),
            ("fa-feather-alt", "Simplify language", "Rewrite the following text using simpler language that a child could understand:"),
            ("fa-smile", "Change tone to Friendly", "Rewrite the following text with a friendly and welcoming tone:"),
        ],
    ),
    (
        "Understand",
        &[
            ("fa-list-ul", "Outline", "Create a bulleted outline of the main points in the following text:"),
            ("fa-book-open", "Explain", "Explain the concepts in the following text in detail:"),
            ("fa-robot", "Summarize", "Provide a concise summary of the following text:"),
            ("fa-code", "Explain codes", "Explain what this code block does step by step:"),
        ],
    ),
    (
        "Tasks",
        &[(
            "fa-tasks",
            "Find action items",
            "Identify all actionable tasks or items from the following text:",
        )],
    ),
    (
        "Enhance",
        &[
            ("fa-bullhorn", "More persuasive", "Rewrite the following text to be more persuasive and compelling:"),
            ("fa-plus-circle", "Add details", "Add more relevant details and context to the following text:"),
            ("fa-chart-bar", "Add statistics", "Enhance the following text by incorporating relevant statistical or data points where appropriate:"),
            ("fa-laugh-wink", "Add humor", "Rewrite the following text with a touch of lighthearted humor:"),
        ],
    ),
];

/// 全部模型分类
pub fn model_categories() -> Vec<ModelCategory> {
    MODEL_TABLE
        .iter()
        .map(|(id, label, models)| ModelCategory {
            id: id.to_string(),
            label: label.to_string(),
            models: models
                .iter()
                .map(|(id, name, vibe)| ModelOption {
                    id: id.to_string(),
                    name: name.to_string(),
                    vibe: vibe.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// 按 ID 查找模型
pub fn find_model(id: &str) -> Option<ModelOption> {
    model_categories()
        .into_iter()
        .flat_map(|category| category.models)
        .find(|model| model.id == id)
}

/// 根据模型 ID 的服务商前缀生成密钥输入提示
///
/// 未知前缀使用大写形式作为服务商名称，占位符回退为 `sk-...`。
pub fn key_prompt(model_id: &str) -> KeyPrompt {
    let model = find_model(model_id);
    let provider = model
        .as_ref()
        .and_then(|m| m.id.split('/').next())
        .unwrap_or("model")
        .to_lowercase();

    let label = match provider.as_str() {
        "openai" => "OpenAI".to_string(),
        "anthropic" => "Anthropic".to_string(),
        "google" => "Google".to_string(),
        "meta-llama" => "Meta Llama".to_string(),
        "deepseek" => "DeepSeek".to_string(),
        other => other.to_uppercase(),
    };
    let placeholder = match provider.as_str() {
        "anthropic" => "sk-ant-...",
        "google" => "AIza...",
        "meta-llama" => "sk-or-...",
        _ => "sk-...",
    };

    KeyPrompt {
        model_name: model.map(|m| m.name).unwrap_or_else(|| "Selected Model".to_string()),
        key_label: format!("{} API Key", label),
        key_placeholder: placeholder.to_string(),
    }
}

/// 预置提示词分组（写作、理解、任务提取、增强）
pub fn suggestion_groups() -> Vec<SuggestionGroup> {
    SUGGESTION_TABLE
        .iter()
        .map(|(title, items)| SuggestionGroup {
            title: title.to_string(),
            items: items
                .iter()
                .map(|(icon, label, prompt)| Suggestion {
                    label: label.to_string(),
                    icon: icon.to_string(),
                    prompt: prompt.to_string(),
                })
                .collect(),
        })
        .collect()
}
