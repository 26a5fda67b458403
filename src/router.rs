// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由引擎
//!
//! 把一次调用的执行上下文与路径映射到页面处理器，并在 HTTP 模式下驱动布局流水线。
//!
//! ## 路由规则：
//! 1. 命令行调用 → `Cli`；`X-Requested-With: XMLHttpRequest` → `Api`；其余 → `Http`。
//! 2. 路径按 `/` 拆分并丢弃空段，前三段依次为 `page` / `subpage` / `tab`。
//! 3. 静态路由表先按 `/{page}/*` 通配键查找，再按完整路径查找；两者同时存在时通配键优先。
//! 4. 非静态路由按命名约定推导页面标识：`my-page` → `web::MyPagePage`。
//! 5. 页面无法实例化时回退到 404 错误页；页面构造失败时回退到 500 错误页。

use std::collections::HashMap;

use log::{debug, error, info, warn};

use crate::{
    config::{Config, CurrentPage},
    layout::Layout,
    page::{ErrorPage, PageContext, PageHandler, PageRegistry, RenderedPage},
    param::*,
    request::Request,
    util::ucfirst,
};

#[derive(Debug, Clone)]
pub struct Router {
    request: Request,
    kind: RouteKind,
    path: Vec<String>,
    page: String,
    subpage: Option<String>,
    tab: Option<String>,
    http_method: HttpMethod,
    static_route: bool,
    wildcard: bool,
    tasks: Vec<String>,
}

impl Router {
    /// 根据请求上下文构建路由器，并把路由类型、当前页面与 HTTP 方法发布到配置中。
    pub fn new(request: Request, config: &mut Config) -> Self {
        let id = request.id();
        let kind = determine_route(&request);
        config.publish_route(kind);
        debug!("[ID{}]路由类型：{}", id, kind);

        let mut router = Self {
            request,
            kind,
            path: Vec::new(),
            page: DEFAULT_PAGE.to_string(),
            subpage: None,
            tab: None,
            http_method: HttpMethod::Get,
            static_route: false,
            wildcard: false,
            tasks: Vec::new(),
        };
        // 命令行调用没有路径，页面保持默认值
        if kind != RouteKind::Cli {
            let redirect_path = router.request.redirect_path().map(str::to_string);
            router.path = split_path(redirect_path.as_deref().unwrap_or_default());
            if let Some(raw) = redirect_path.as_deref() {
                let (static_route, wildcard) =
                    resolve_static_route(raw, &mut router.path, config.static_routes());
                router.static_route = static_route;
                router.wildcard = wildcard;
                if static_route {
                    debug!(
                        "[ID{}]命中静态路由{}（通配：{}）→ {}",
                        id, raw, wildcard, router.path[0]
                    );
                }
            }
        }

        router.http_method = determine_http_method(&router.request);
        router.page = router
            .path
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_PAGE.to_string());
        router.subpage = router.path.get(1).cloned();
        router.tab = router.path.get(2).cloned();

        config.publish_current_page(CurrentPage {
            page: router.page.clone(),
            subpage: router.subpage.clone(),
            tab: router.tab.clone(),
        });
        config.publish_http_method(router.http_method);
        debug!(
            "[ID{}]当前页面：page={}, subpage={:?}, tab={:?}, method={}",
            id, router.page, router.subpage, router.tab, router.http_method
        );
        router
    }

    /// 按路由类型分发。只有 HTTP 模式会产生页面。
    pub fn route(&mut self, pages: &PageRegistry, config: &Config) -> Option<RenderedPage> {
        match self.kind {
            RouteKind::Cli => {
                self.execute_cli();
                None
            }
            RouteKind::Api => {
                self.execute_api();
                None
            }
            RouteKind::Http => self.render_webpage(pages, config),
        }
    }

    /// 实例化并渲染当前页面。页面标识已在任务列表中时跳过渲染，返回 `None`。
    pub fn render_webpage(&mut self, pages: &PageRegistry, config: &Config) -> Option<RenderedPage> {
        let id = self.request.id();
        let identifier = self.page_identifier();

        if self.tasks.contains(&identifier) {
            debug!("[ID{}]页面{}已在本次生命周期中渲染，跳过", id, identifier);
            return None;
        }

        let mut page: Box<dyn PageHandler> = match pages.instantiate(&identifier) {
            Ok(page) => page,
            Err(e) => {
                warn!("[ID{}]无法实例化页面{}：{}，使用404页面", id, identifier, e);
                Box::new(ErrorPage::new(404))
            }
        };

        let mut ctx = PageContext::new(&self.request, config);
        if let Err(e) = page.construct_page(&mut ctx) {
            error!("[ID{}]页面{}构造失败：{}，使用500页面", id, identifier, e);
            ctx.reset();
            let mut fallback = ErrorPage::new(500);
            if let Err(e) = fallback.construct_page(&mut ctx) {
                error!("[ID{}]错误页构造失败：{}", id, e);
            }
        }

        let secure = config.environment() != AppMode::Development;
        let cookies = ctx.cookies().inject_cookies(secure);

        let meta = config.meta();
        let injector = ctx.injector();
        let mut layout = Layout::new();
        layout
            .init_header(
                &meta.page_title,
                &meta.description,
                &meta.site_language,
                meta.block_robots,
            )
            .set_favicon(meta.favicon.as_deref())
            .append_to_header(&injector.insert_css(PagePosition::InHead))
            .append_to_header(&injector.insert_js(PagePosition::InHead));
        let mut html = layout.render_header();

        layout
            .append_to_body(&injector.insert_css(PagePosition::TopOfPage))
            .append_to_body(&injector.insert_js(PagePosition::TopOfPage))
            .append_to_body(&format!(
                "<main>{}{}{}</main>",
                ctx.output(),
                injector.insert_css(PagePosition::InBody),
                injector.insert_js(PagePosition::InBody)
            ));
        html.push_str(&layout.render_body());

        layout
            .append_to_footer(&injector.insert_css(PagePosition::BottomOfPage))
            .append_to_footer(&injector.insert_js(PagePosition::BottomOfPage));
        html.push_str(&layout.render_footer());

        info!(
            "[ID{}]页面{}渲染完成，状态码{}，长度{}",
            id,
            identifier,
            ctx.status(),
            html.len()
        );
        Some(RenderedPage {
            identifier,
            status: ctx.status(),
            html,
            cookies,
        })
    }

    /// API 请求的扩展点，目前不做任何处理。
    pub fn execute_api(&self) {
        info!("[ID{}]API路由暂无处理逻辑：{}", self.request.id(), self.request.path());
    }

    /// 命令行调用的扩展点，目前不做任何处理。
    pub fn execute_cli(&self) {
        info!("[ID{}]CLI路由暂无处理逻辑", self.request.id());
    }

    /// 当前路由对应的页面标识。
    pub fn page_identifier(&self) -> String {
        if self.static_route {
            self.page.clone()
        } else {
            format!("{}{}", PAGE_NAMESPACE, derive_page_class(&self.page))
        }
    }

    /// 登记一个已渲染的页面标识。
    pub fn add_task(&mut self, task: &str) {
        self.tasks.push(task.to_string());
    }

    /// 批量登记已渲染的页面标识，新标识排在已有标识之前。
    pub fn add_multiple_tasks<I, S>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged: Vec<String> = tasks.into_iter().map(Into::into).collect();
        merged.append(&mut self.tasks);
        self.tasks = merged;
    }
}

// --- Getter 访问器实现 ---

impl Router {
    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn subpage(&self) -> Option<&str> {
        self.subpage.as_deref()
    }

    pub fn tab(&self) -> Option<&str> {
        self.tab.as_deref()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_static_route(&self) -> bool {
        self.static_route
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// 把路径按 `/` 拆分，丢弃去掉空白后为空的段，保持相对顺序。
pub fn split_path(raw: &str) -> Vec<String> {
    raw.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// 由页面段推导页面类名：按 `-` 拆分，各段首字母大写后拼接，再追加 `Page`。
pub fn derive_page_class(page: &str) -> String {
    let mut class: String = page.split('-').map(ucfirst).collect();
    class.push_str(PAGE_SUFFIX);
    class
}

/// 查找静态路由并替换第一段路径。
///
/// 返回 `(是否命中静态路由, 是否经由通配键命中)`。通配键与完整路径同时存在时使用通配键的值。
pub fn resolve_static_route(
    raw: &str,
    path: &mut Vec<String>,
    routes: &HashMap<String, String>,
) -> (bool, bool) {
    let wildcard_target = path
        .first()
        .and_then(|segment| routes.get(&format!("/{}/*", segment)));
    let target = match wildcard_target.or_else(|| routes.get(raw)) {
        Some(t) => t.clone(),
        None => return (false, false),
    };
    let wildcard = wildcard_target.is_some();
    match path.first_mut() {
        Some(first) => *first = target,
        None => path.push(target),
    }
    (true, wildcard)
}

fn determine_route(request: &Request) -> RouteKind {
    if request.is_cli() {
        return RouteKind::Cli;
    }
    if route_is_api(request) {
        return RouteKind::Api;
    }
    RouteKind::Http
}

fn route_is_api(request: &Request) -> bool {
    request
        .header(XHR_HEADER)
        .map_or(false, |v| v.eq_ignore_ascii_case(XHR_MARKER))
}

fn determine_http_method(request: &Request) -> HttpMethod {
    if !request.post_fields().is_empty() {
        return HttpMethod::Post;
    }
    HttpMethod::from_declared(request.method())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(split_path("//a///b/"), vec!["a", "b"]);
        assert_eq!(split_path("/ /a"), vec!["a"]);
        assert!(split_path("").is_empty());
        assert!(split_path("/").is_empty());
    }

    #[test]
    fn test_derive_page_class() {
        assert_eq!(derive_page_class("my-page"), "MyPagePage");
        assert_eq!(derive_page_class("index"), "IndexPage");
        assert_eq!(derive_page_class("a-b-c"), "ABCPage");
        assert_eq!(derive_page_class("my--page"), "MyPagePage");
    }

    #[test]
    fn test_resolve_static_route_exact() {
        let mut routes = HashMap::new();
        routes.insert("/home/cake".to_string(), "Mouse::Hole".to_string());
        let mut path = split_path("/home/cake");
        assert_eq!(
            resolve_static_route("/home/cake", &mut path, &routes),
            (true, false)
        );
        assert_eq!(path, vec!["Mouse::Hole", "cake"]);
    }

    #[test]
    fn test_resolve_static_route_wildcard_wins() {
        let mut routes = HashMap::new();
        routes.insert("/docs/intro".to_string(), "web::ExactPage".to_string());
        routes.insert("/docs/*".to_string(), "web::DocsPage".to_string());
        let mut path = split_path("/docs/intro");
        assert_eq!(
            resolve_static_route("/docs/intro", &mut path, &routes),
            (true, true)
        );
        assert_eq!(path[0], "web::DocsPage");
    }

    #[test]
    fn test_resolve_static_route_root_exact() {
        let mut routes = HashMap::new();
        routes.insert("/".to_string(), "web::HomePage".to_string());
        let mut path = split_path("/");
        assert_eq!(resolve_static_route("/", &mut path, &routes), (true, false));
        assert_eq!(path, vec!["web::HomePage"]);
    }

    #[test]
    fn test_resolve_static_route_miss() {
        let routes = HashMap::new();
        let mut path = split_path("/a/b");
        assert_eq!(resolve_static_route("/a/b", &mut path, &routes), (false, false));
        assert_eq!(path, vec!["a", "b"]);
    }

    #[test]
    fn test_route_is_api_case_insensitive() {
        let request = Request::new("GET", "/").with_header("X-Requested-With", "xmlHTTPrequest");
        assert_eq!(determine_route(&request), RouteKind::Api);
        let request = Request::new("GET", "/").with_header("X-Requested-With", "fetch");
        assert_eq!(determine_route(&request), RouteKind::Http);
    }

    #[test]
    fn test_post_fields_force_post() {
        let request = Request::new("PUT", "/").with_post_field("a", "1");
        assert_eq!(determine_http_method(&request), HttpMethod::Post);
        let request = Request::new("PATCH", "/");
        assert_eq!(determine_http_method(&request), HttpMethod::Get);
    }
}
