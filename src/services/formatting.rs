//! # 格式命令分发服务
//!
//! 把工具栏动作映射为编辑区域的原生格式命令（`document.execCommand` 名称）。
//! 编辑区域没有输入焦点时先聚焦再执行。
//!
//! 原生执行由 `EditableSurface` trait 抽象：
//! - 桌面端使用 `InvocationLog` 记录要执行的原生调用，通过 IPC 交给 web view 重放
//! - 测试直接检查记录下的调用序列
//!
//! 另外包含两个不走原生命令的功能：
//! - 链接与图片的预处理（URL 规范化、data URI 编码）
//! - 字号缩放（数值状态，夹在 [8, 72]，派生出正文和三级标题字号）

use std::path::Path;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::selection::SelectionRange;
use crate::utils::html;

/// 带协议头的 URL（大小写不敏感）
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;
pub const DEFAULT_FONT_SIZE: u32 = 16;
/// 工具栏 A- / A+ 每次调整的步长
pub const FONT_STEP: i32 = 2;

// ============ 命令定义 ============

/// 段落块样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    P,
    H1,
    H2,
    H3,
}

impl BlockStyle {
    fn tag(&self) -> &'static str {
        match self {
            BlockStyle::P => "P",
            BlockStyle::H1 => "H1",
            BlockStyle::H2 => "H2",
            BlockStyle::H3 => "H3",
        }
    }
}

/// 段落对齐方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// 工具栏格式命令
///
/// 序列化形式：`{ "command": "bold" }`、`{ "command": "foreColor", "value": "#ff0000" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "camelCase")]
pub enum FormatCommand {
    Undo,
    Redo,
    Bold,
    Italic,
    Strikethrough,
    FontName(String),
    FormatBlock(BlockStyle),
    ForeColor(String),
    HiliteColor(String),
    UnorderedList,
    OrderedList,
    Align(Alignment),
    InsertHtml(String),
    InsertImage(String),
}

impl FormatCommand {
    /// 对应的原生命令名和参数
    pub fn native(&self) -> (&'static str, Option<String>) {
        match self {
            FormatCommand::Undo => ("undo", None),
            FormatCommand::Redo => ("redo", None),
            FormatCommand::Bold => ("bold", None),
            FormatCommand::Italic => ("italic", None),
            FormatCommand::Strikethrough => ("strikeThrough", None),
            FormatCommand::FontName(font) => ("fontName", Some(font.clone())),
            FormatCommand::FormatBlock(style) => ("formatBlock", Some(style.tag().to_string())),
            FormatCommand::ForeColor(color) => ("foreColor", Some(color.clone())),
            FormatCommand::HiliteColor(color) => ("hiliteColor", Some(color.clone())),
            FormatCommand::UnorderedList => ("insertUnorderedList", None),
            FormatCommand::OrderedList => ("insertOrderedList", None),
            FormatCommand::Align(Alignment::Left) => ("justifyLeft", None),
            FormatCommand::Align(Alignment::Center) => ("justifyCenter", None),
            FormatCommand::Align(Alignment::Right) => ("justifyRight", None),
            FormatCommand::Align(Alignment::Justify) => ("justifyFull", None),
            FormatCommand::InsertHtml(markup) => ("insertHTML", Some(markup.clone())),
            FormatCommand::InsertImage(src) => ("insertImage", Some(src.clone())),
        }
    }
}

// ============ 编辑区域抽象 ============

/// 可执行原生格式命令的编辑区域
pub trait EditableSurface {
    fn has_focus(&self) -> bool;

    fn focus(&mut self);

    /// 执行原生命令，返回是否执行成功
    fn exec_command(&mut self, name: &str, value: Option<&str>) -> bool;

    /// 恢复先前保存的选区（插入链接时使用）
    fn restore_range(&mut self, range: SelectionRange);
}

/// 一次原生调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NativeInvocation {
    Focus,
    RestoreRange { range: SelectionRange },
    Exec { name: String, value: Option<String> },
}

/// 记录原生调用的编辑区域
///
/// 焦点状态由前端在发起命令时告知，记录结果按顺序交回前端执行。
#[derive(Debug, Default)]
pub struct InvocationLog {
    focused: bool,
    invocations: Vec<NativeInvocation>,
}

impl InvocationLog {
    pub fn new(focused: bool) -> Self {
        Self {
            focused,
            invocations: Vec::new(),
        }
    }

    pub fn invocations(&self) -> &[NativeInvocation] {
        &self.invocations
    }

    pub fn into_invocations(self) -> Vec<NativeInvocation> {
        self.invocations
    }
}

impl EditableSurface for InvocationLog {
    fn has_focus(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) {
        self.focused = true;
        self.invocations.push(NativeInvocation::Focus);
    }

    fn exec_command(&mut self, name: &str, value: Option<&str>) -> bool {
        self.invocations.push(NativeInvocation::Exec {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
        true
    }

    fn restore_range(&mut self, range: SelectionRange) {
        self.invocations.push(NativeInvocation::RestoreRange { range });
    }
}

// ============ 分发 ============

/// 格式命令分发器
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// 在编辑区域上执行格式命令，未聚焦时先聚焦
    pub fn dispatch<S: EditableSurface + ?Sized>(surface: &mut S, command: &FormatCommand) -> bool {
        if !surface.has_focus() {
            surface.focus();
        }
        let (name, value) = command.native();
        log::debug!("执行格式命令: {}", name);
        surface.exec_command(name, value.as_deref())
    }

    /// 插入链接
    ///
    /// URL 为空时不做任何操作。先恢复打开链接对话框前保存的选区，再插入锚点标记。
    ///
    /// # 返回值
    /// 是否执行了插入
    pub fn insert_link<S: EditableSurface + ?Sized>(surface: &mut S, request: &LinkRequest) -> bool {
        let Some(url) = normalize_link_url(&request.url) else {
            return false;
        };
        if !surface.has_focus() {
            surface.focus();
        }
        if let Some(range) = request.saved_range {
            surface.restore_range(range);
        }
        let markup = compose_link(&url, &request.text);
        Self::dispatch(surface, &FormatCommand::InsertHtml(markup))
    }

    /// 在光标处插入图片（data URI）
    pub fn insert_image<S: EditableSurface + ?Sized>(surface: &mut S, data_uri: &str) -> bool {
        Self::dispatch(surface, &FormatCommand::InsertImage(data_uri.to_string()))
    }
}

// ============ 链接 ============

/// 插入链接请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub url: String,
    /// 显示文字，为空时使用 URL 本身
    #[serde(default)]
    pub text: String,
    /// 打开链接对话框前保存的选区
    #[serde(default)]
    pub saved_range: Option<SelectionRange>,
}

/// 规范化链接地址
///
/// 没有 `http://` / `https://` 前缀时补上 `https://`。
/// 去除空白后为空返回 None。
pub fn normalize_link_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() {
        return None;
    }
    if SCHEME_RE.is_match(url) {
        Some(url.to_string())
    } else {
        Some(format!("https://{}", url))
    }
}

/// 生成锚点标记
pub fn compose_link(url: &str, text: &str) -> String {
    let display = if text.trim().is_empty() { url } else { text };
    format!(
        r#"<a href="{}" target="_blank" class="text-blue-600 underline">{}</a>"#,
        html::escape_text(url),
        html::escape_text(display)
    )
}

// ============ 图片 ============

/// 将图片字节编码为 data URI
pub fn image_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// 读取本地图片文件并编码为 data URI
///
/// MIME 类型根据扩展名推断。
///
/// # 错误
/// - 文件不是图片类型时返回 `AppError::Validation`
/// - 读取失败时返回 `AppError::Io`
pub async fn read_image_data_uri(path: &Path) -> AppResult<String> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(AppError::Validation(format!(
            "不支持的图片类型: {}",
            path.display()
        )));
    }
    let bytes = tokio::fs::read(path).await?;
    Ok(image_data_uri(&bytes, mime.essence_str()))
}

// ============ 字号 ============

/// 字号缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontScale {
    base: u32,
}

/// 由基准字号派生的各级字号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSizes {
    pub body: u32,
    pub h3: u32,
    pub h2: u32,
    pub h1: u32,
}

impl Default for FontScale {
    fn default() -> Self {
        Self {
            base: DEFAULT_FONT_SIZE,
        }
    }
}

impl FontScale {
    pub fn new(base: u32) -> Self {
        Self {
            base: base.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// 按增量调整，结果夹在 [8, 72]
    pub fn step(self, delta: i32) -> Self {
        let next = (self.base as i64 + delta as i64)
            .clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64);
        Self { base: next as u32 }
    }

    pub fn sizes(&self) -> FontSizes {
        FontSizes {
            body: self.base,
            h3: self.base + 4,
            h2: self.base + 8,
            h1: self.base + 12,
        }
    }
}
