//! # 文档导出服务
//!
//! 将当前文档内容导出为两种形式：
//! - **Word**：固定的 Office HTML 外壳包裹正文，带 UTF-8 BOM，
//!   以 `application/msword` 保存为 `.doc`，Word 可直接打开
//! - **打印**：独立的 HTML 页面，交给 web view 的打印流程
//!
//! ## 导出策略
//! 正文标记原样写入，不做清洗；标题进入 `<title>` 前转义。

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::document::Document;
use crate::services::formatting::FontScale;
use crate::utils::html;

/// 文件名中不允许出现的字符
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap());

const WORD_MIME: &str = "application/msword";
const WORD_FOOTER: &str = "</body></html>";

/// Word 导出结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordExport {
    /// 建议的文件名（`<标题>.doc`）
    pub file_name: String,
    pub mime_type: String,
    /// 以 BOM 开头的完整文件内容
    pub contents: String,
}

impl WordExport {
    /// 写入目标目录，返回文件完整路径
    ///
    /// 文件名中的路径分隔符等非法字符替换为 `_`。
    pub async fn save_in(&self, dir: &Path) -> AppResult<PathBuf> {
        let path = dir.join(sanitize_file_name(&self.file_name));
        tokio::fs::write(&path, self.contents.as_bytes()).await?;
        log::info!("Word 文档已导出: {}", path.display());
        Ok(path)
    }
}

/// 生成 Word 兼容文档
///
/// 标题为空时文件名使用 `document.doc`。
pub fn to_word_document(document: &Document) -> WordExport {
    let header = format!(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\
         <head><meta charset='utf-8'><title>{}</title>\
         <style> body {{ font-family: Arial, sans-serif; }} </style></head><body>",
        html::escape_text(&document.title)
    );

    let base_name = if document.title.trim().is_empty() {
        "document"
    } else {
        document.title.as_str()
    };

    WordExport {
        file_name: format!("{}.doc", base_name),
        mime_type: WORD_MIME.to_string(),
        contents: format!("\u{feff}{}{}{}", header, document.content, WORD_FOOTER),
    }
}

/// 生成打印用 HTML 页面
///
/// 字号与编辑器一致：正文使用基准字号，标题按派生字号。
pub fn to_print_html(document: &Document, scale: FontScale) -> String {
    let sizes = scale.sizes();
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>body {{ font-family: Arial, sans-serif; font-size: {body}px; }} \
         h1 {{ font-size: {h1}px; }} h2 {{ font-size: {h2}px; }} h3 {{ font-size: {h3}px; }}</style>\
         </head><body>{content}</body></html>",
        title = html::escape_text(&document.title),
        body = sizes.body,
        h1 = sizes.h1,
        h2 = sizes.h2,
        h3 = sizes.h3,
        content = document.content,
    )
}

fn sanitize_file_name(name: &str) -> String {
    UNSAFE_FILE_CHARS.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, content: &str) -> Document {
        Document {
            id: "d1".into(),
            title: title.into(),
            content: content.into(),
            is_pinned: false,
            is_active: true,
            last_modified: 0,
        }
    }

    #[test]
    fn test_word_document_shell() {
        let export = to_word_document(&doc("Report", "<p>Hi</p>"));
        assert_eq!(export.file_name, "Report.doc");
        assert_eq!(export.mime_type, "application/msword");
        assert!(export.contents.starts_with('\u{feff}'));
        assert!(export.contents.contains("xmlns:w='urn:schemas-microsoft-com:office:word'"));
        assert!(export.contents.contains("<title>Report</title>"));
        assert!(export.contents.ends_with("<body><p>Hi</p></body></html>"));
    }

    #[test]
    fn test_word_document_blank_title() {
        let export = to_word_document(&doc("  ", ""));
        assert_eq!(export.file_name, "document.doc");
    }

    #[test]
    fn test_print_html_uses_font_scale() {
        let page = to_print_html(&doc("A <b>", "<h1>T</h1>"), FontScale::new(20));
        assert!(page.contains("<title>A &lt;b&gt;</title>"));
        assert!(page.contains("font-size: 20px"));
        assert!(page.contains("h1 { font-size: 32px; }"));
        assert!(page.contains("<body><h1>T</h1></body>"));
    }

    #[tokio::test]
    async fn test_save_in_sanitizes_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let export = to_word_document(&doc("a/b: c", "<p>x</p>"));
        let path = export.save_in(dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "a_b_ c.doc");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, export.contents);
    }
}
