// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 按页面位置收集并输出 CSS / JS 标签。

use std::collections::HashMap;

use crate::{param::PagePosition, util::escape_html};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Asset {
    Link(String),
    Inline(String),
}

#[derive(Debug, Clone, Default)]
pub struct HtmlInjector {
    css: HashMap<PagePosition, Vec<Asset>>,
    js: HashMap<PagePosition, Vec<Asset>>,
}

impl HtmlInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_css(&mut self, position: PagePosition, href: &str) -> &mut Self {
        push(&mut self.css, position, Asset::Link(href.to_string()));
        self
    }

    pub fn add_inline_css(&mut self, position: PagePosition, css: &str) -> &mut Self {
        push(&mut self.css, position, Asset::Inline(css.to_string()));
        self
    }

    pub fn add_js(&mut self, position: PagePosition, src: &str) -> &mut Self {
        push(&mut self.js, position, Asset::Link(src.to_string()));
        self
    }

    pub fn add_inline_js(&mut self, position: PagePosition, js: &str) -> &mut Self {
        push(&mut self.js, position, Asset::Inline(js.to_string()));
        self
    }

    /// 输出该位置的全部样式，保持添加顺序。
    pub fn insert_css(&self, position: PagePosition) -> String {
        render(&self.css, position, |asset| match asset {
            Asset::Link(href) => format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)),
            Asset::Inline(css) => format!("<style>{}</style>", css),
        })
    }

    /// 输出该位置的全部脚本，保持添加顺序。
    pub fn insert_js(&self, position: PagePosition) -> String {
        render(&self.js, position, |asset| match asset {
            Asset::Link(src) => format!(r#"<script src="{}"></script>"#, escape_html(src)),
            Asset::Inline(js) => format!("<script>{}</script>", js),
        })
    }
}

fn push(map: &mut HashMap<PagePosition, Vec<Asset>>, position: PagePosition, asset: Asset) {
    map.entry(position).or_default().push(asset);
}

fn render(
    map: &HashMap<PagePosition, Vec<Asset>>,
    position: PagePosition,
    tag: impl Fn(&Asset) -> String,
) -> String {
    map.get(&position)
        .map(|assets| assets.iter().map(tag).collect::<Vec<_>>().join("\n"))
        .unwrap_or_default()
}
