// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 页面布局模块
//!
//! 把一个页面拆成 header / body / footer 三段缓冲区依次组装：
//! 各段只允许追加，保证插入顺序就是输出顺序。

use crate::util::escape_html;

#[derive(Debug, Clone, Default)]
pub struct Layout {
    title: String,
    description: String,
    language: String,
    block_robots: bool,
    favicon: Option<String>,
    header: String,
    body: String,
    footer: String,
}

impl Layout {
    pub fn new() -> Self {
        Self {
            language: "en".to_string(),
            ..Self::default()
        }
    }

    /// 设置 `<head>` 中的元信息。
    pub fn init_header(
        &mut self,
        title: &str,
        description: &str,
        language: &str,
        block_robots: bool,
    ) -> &mut Self {
        self.title = title.to_string();
        self.description = description.to_string();
        self.language = language.to_string();
        self.block_robots = block_robots;
        self
    }

    pub fn set_favicon(&mut self, favicon: Option<&str>) -> &mut Self {
        self.favicon = favicon.map(str::to_string);
        self
    }

    pub fn append_to_header(&mut self, html: &str) -> &mut Self {
        append(&mut self.header, html);
        self
    }

    pub fn append_to_body(&mut self, html: &str) -> &mut Self {
        append(&mut self.body, html);
        self
    }

    pub fn append_to_footer(&mut self, html: &str) -> &mut Self {
        append(&mut self.footer, html);
        self
    }

    /// 输出文档开头直到 `<body>`。
    pub fn render_header(&self) -> String {
        let mut head = format!(
            r#"<!DOCTYPE html>
<html lang="{}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
"#,
            escape_html(&self.language),
            escape_html(&self.title)
        );
        if !self.description.is_empty() {
            head.push_str(&format!(
                "<meta name=\"description\" content=\"{}\">\n",
                escape_html(&self.description)
            ));
        }
        if self.block_robots {
            head.push_str("<meta name=\"robots\" content=\"noindex, nofollow\">\n");
        }
        if let Some(favicon) = &self.favicon {
            head.push_str(&format!(
                "<link rel=\"icon\" href=\"{}\">\n",
                escape_html(favicon)
            ));
        }
        head.push_str(&self.header);
        head.push_str("</head>\n<body>\n");
        head
    }

    pub fn render_body(&self) -> String {
        self.body.clone()
    }

    /// 输出页脚内容并闭合文档。
    pub fn render_footer(&self) -> String {
        format!("{}</body>\n</html>\n", self.footer)
    }
}

fn append(buffer: &mut String, html: &str) {
    if html.is_empty() {
        return;
    }
    buffer.push_str(html);
    buffer.push('\n');
}
