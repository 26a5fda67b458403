// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 页面处理器模块
//!
//! 该模块定义了路由器与具体页面之间的契约：
//! - `PageHandler`：页面对象只需提供 `construct_page`，把内容写入缓冲区。
//! - `PageContext`：页面构造期间可用的输出缓冲区、请求、配置、Cookie 与资源注入器。
//! - `PageRegistry`：页面标识到工厂函数的映射，取代按字符串动态实例化类。
//! - `ErrorPage`：实例化失败时使用的兜底页面，自身永远不会失败。

use std::{collections::HashMap, fmt};

use log::debug;

use crate::{
    config::Config,
    cookie::CookieJar,
    exception::Exception,
    injector::HtmlInjector,
    param::{PAGE_NAMESPACE, STATUS_CODES},
    request::Request,
};

/// 页面处理器。构造后只被调用一次 `construct_page`。
pub trait PageHandler {
    /// 把页面主体写入 `ctx`。返回错误时已写入的内容会被丢弃。
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception>;
}

/// 创建页面处理器的工厂函数
pub type PageFactory = Box<dyn Fn() -> Result<Box<dyn PageHandler>, Exception> + Send + Sync>;

/// 页面构造期间的上下文。页面的全部输出先写入这里，由路由器嵌入布局。
pub struct PageContext<'a> {
    request: &'a Request,
    config: &'a Config,
    output: String,
    status: u16,
    cookies: CookieJar,
    injector: HtmlInjector,
}

impl<'a> PageContext<'a> {
    pub fn new(request: &'a Request, config: &'a Config) -> Self {
        Self {
            request,
            config,
            output: String::new(),
            status: 200,
            cookies: CookieJar::new(),
            injector: HtmlInjector::new(),
        }
    }

    /// 向输出缓冲区追加 HTML。
    pub fn echo(&mut self, html: &str) {
        self.output.push_str(html);
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn injector(&self) -> &HtmlInjector {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut HtmlInjector {
        &mut self.injector
    }

    /// 丢弃已写入的内容、Cookie 与资源，恢复到刚创建时的状态。
    pub(crate) fn reset(&mut self) {
        self.output.clear();
        self.status = 200;
        self.cookies = CookieJar::new();
        self.injector = HtmlInjector::new();
    }
}

impl fmt::Write for PageContext<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

/// 页面标识到工厂函数的注册表。
#[derive(Default)]
pub struct PageRegistry {
    factories: HashMap<String, PageFactory>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以完整标识注册页面，常用于静态路由指向的页面。
    pub fn register<F>(&mut self, identifier: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn PageHandler>, Exception> + Send + Sync + 'static,
    {
        debug!("注册页面：{}", identifier);
        self.factories
            .insert(identifier.to_string(), Box::new(factory));
        self
    }

    /// 以类名注册页面，标识自动带上命名空间前缀，例如 `MyPagePage` → `web::MyPagePage`。
    pub fn register_page<P>(&mut self, class: &str) -> &mut Self
    where
        P: PageHandler + Default + 'static,
    {
        let identifier = format!("{}{}", PAGE_NAMESPACE, class);
        self.register(&identifier, || {
            Ok(Box::new(P::default()) as Box<dyn PageHandler>)
        })
    }

    /// 按标识实例化页面。标识未注册时返回 `Exception::PageNotFound`。
    pub fn instantiate(&self, identifier: &str) -> Result<Box<dyn PageHandler>, Exception> {
        match self.factories.get(identifier) {
            Some(factory) => factory(),
            None => Err(Exception::PageNotFound),
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// 错误页。任何状态码都能渲染，未知状态码显示 "Unknown Error"。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage {
    code: u16,
}

impl ErrorPage {
    pub fn new(code: u16) -> Self {
        Self { code }
    }

    pub fn code(&self) -> u16 {
        self.code
    }
}

impl PageHandler for ErrorPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        ctx.set_status(self.code);
        let reason = STATUS_CODES.get(&self.code).copied().unwrap_or("Unknown Error");
        let note = match self.code {
            404 => "<p>你指定的网页无法找到。</p>",
            500 => "<p>服务器出现了一个内部错误。</p>",
            _ => "",
        };
        ctx.echo(&format!(
            "<h1>{}</h1>\n<h2>{}</h2>\n{}",
            self.code, reason, note
        ));
        Ok(())
    }
}

/// 路由器渲染完成的页面。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 请求的页面标识（回退到错误页时仍是原标识）
    pub identifier: String,
    /// HTTP 状态码
    pub status: u16,
    /// 完整的 HTML 文档
    pub html: String,
    /// `Set-Cookie` 头的值
    pub cookies: Vec<String>,
}
