// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

/// 转义 HTML 文本中的特殊字符，用于标题、描述以及属性值。
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

/// 把首字符转为大写，其余字符保持不变。
pub fn ucfirst(piece: &str) -> String {
    let mut chars = piece.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 去掉字符串末尾所有连续出现的 `trailing` 字符。
pub fn remove_trailing_chars(data: &str, trailing: char) -> &str {
    data.trim_end_matches(trailing)
}

/// 返回 `start` 与其后第一个 `end` 之间的子串。任一标记不存在时返回空串。
pub fn substr_between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let begin = match text.find(start) {
        Some(i) => i + start.len(),
        None => return "",
    };
    match text[begin..].find(end) {
        Some(len) => &text[begin..begin + len],
        None => "",
    }
}

/// 取客户端文件名的最后一段，`/` 与 `\\` 都视为分隔符。
///
/// 结果为空、`.` 或 `..` 时返回 `None`。
pub fn base_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

/// 渲染携带请求令牌的隐藏表单字段。
pub fn token_input(token: &str) -> String {
    let token = escape_html(token);
    format!(
        r#"<input type="hidden" value="{}" name="token" id="token">"#,
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_file_name() {
        assert_eq!(base_file_name("photo.png"), Some("photo.png"));
        assert_eq!(base_file_name("../../escaped.txt"), Some("escaped.txt"));
        assert_eq!(base_file_name("/etc/passwd"), Some("passwd"));
        assert_eq!(base_file_name("C:\\Users\\me\\cv.pdf"), Some("cv.pdf"));
        assert_eq!(base_file_name("dir/"), None);
        assert_eq!(base_file_name(".."), None);
        assert_eq!(base_file_name("a/."), None);
        assert_eq!(base_file_name("  "), None);
    }

    #[test]
    fn test_file_size() {
        let a = 9926;
        let b = 51800;
        assert_eq!(format_file_size(a), "9.7 KB".to_string());
        assert_eq!(format_file_size(b), "50.6 KB".to_string());
    }

    #[test]
    fn test_file_size_units() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(1023), "1023.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5242880), "5.0 MB");
        assert_eq!(format_file_size(3221225472), "3.0 GB");
        assert_eq!(format_file_size(1099511627776), "1.0 TB");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_ucfirst() {
        assert_eq!(ucfirst("page"), "Page");
        assert_eq!(ucfirst("Page"), "Page");
        assert_eq!(ucfirst("über"), "Über");
        assert_eq!(ucfirst(""), "");
        assert_eq!(ucfirst("mY"), "MY");
    }

    #[test]
    fn test_remove_trailing_chars() {
        assert_eq!(remove_trailing_chars("uploads///", '/'), "uploads");
        assert_eq!(remove_trailing_chars("uploads", '/'), "uploads");
        assert_eq!(remove_trailing_chars("///", '/'), "");
    }

    #[test]
    fn test_substr_between() {
        assert_eq!(
            substr_between(r#"form-data; name="file"; filename="a.png""#, "name=\"", "\""),
            "file"
        );
        assert_eq!(substr_between("abc", "x", "c"), "");
        assert_eq!(substr_between("a[b", "[", "]"), "");
    }

    #[test]
    fn test_token_input() {
        let html = token_input("abc\"123");
        assert!(html.contains(r#"value="abc&quot;123""#));
        assert!(html.contains(r#"name="token""#));
    }
}
