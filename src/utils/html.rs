//! # HTML 转义
//!
//! 助手返回的文本、链接显示文字和导出标题在拼接进标记前都要转义，
//! 与浏览器插入文本节点的效果一致。

/// 转义 HTML 文本节点中的特殊字符
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_text("plain"), "plain");
    }
}
