use proptest::prelude::*;

use webframe::{
    config::{Config, CurrentPage},
    cookie::Cookie,
    exception::Exception,
    page::{PageContext, PageHandler, PageRegistry},
    param::{AppMode, HttpMethod, PagePosition, RouteKind},
    request::Request,
    router::{derive_page_class, split_path, Router},
};

#[derive(Default)]
struct IndexPage;

impl PageHandler for IndexPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        ctx.echo("<p>index</p>");
        Ok(())
    }
}

#[derive(Default)]
struct MyPagePage;

impl PageHandler for MyPagePage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        ctx.echo("<p>my page</p>");
        Ok(())
    }
}

#[derive(Default)]
struct AssetPage;

impl PageHandler for AssetPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        ctx.injector_mut()
            .add_css(PagePosition::InHead, "/head.css")
            .add_js(PagePosition::InHead, "/head.js")
            .add_css(PagePosition::TopOfPage, "/top.css")
            .add_js(PagePosition::TopOfPage, "/top.js")
            .add_css(PagePosition::BottomOfPage, "/bottom.css")
            .add_js(PagePosition::BottomOfPage, "/bottom.js")
            .add_css(PagePosition::InBody, "/body.css")
            .add_js(PagePosition::InBody, "/body.js");
        ctx.cookies_mut().set(Cookie::new("session", "abc"));
        ctx.echo("<p>body</p>");
        Ok(())
    }
}

#[derive(Default)]
struct BrokenPage;

impl PageHandler for BrokenPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        ctx.echo("<p>half written</p>");
        Err(Exception::PageConstructFailed)
    }
}

fn registry() -> PageRegistry {
    let mut pages = PageRegistry::new();
    pages
        .register_page::<IndexPage>("IndexPage")
        .register_page::<MyPagePage>("MyPagePage")
        .register_page::<AssetPage>("AssetPage")
        .register_page::<BrokenPage>("BrokenPage");
    pages
}

#[test]
fn test_cli_route_renders_nothing() {
    let mut config = Config::new();
    let mut router = Router::new(Request::cli(), &mut config);
    assert_eq!(router.kind(), RouteKind::Cli);
    assert_eq!(router.page(), "index");
    assert!(router.path().is_empty());
    assert!(router.route(&registry(), &config).is_none());
    assert_eq!(config.route(), Some(RouteKind::Cli));
}

#[test]
fn test_xhr_request_routes_to_api() {
    let mut config = Config::new();
    let request = Request::new("GET", "/reports/weekly").with_header("X-Requested-With", "XMLHttpRequest");
    let mut router = Router::new(request, &mut config);
    assert_eq!(router.kind(), RouteKind::Api);
    assert_eq!(router.page(), "reports");
    assert_eq!(router.subpage(), Some("weekly"));
    assert!(router.route(&registry(), &config).is_none());
    assert_eq!(config.route(), Some(RouteKind::Api));
}

#[test]
fn test_page_subpage_tab() {
    let mut config = Config::new();
    let router = Router::new(Request::new("GET", "/a/b/c"), &mut config);
    assert_eq!(router.kind(), RouteKind::Http);
    assert_eq!(router.page(), "a");
    assert_eq!(router.subpage(), Some("b"));
    assert_eq!(router.tab(), Some("c"));
    assert_eq!(
        config.current_page(),
        Some(&CurrentPage {
            page: "a".to_string(),
            subpage: Some("b".to_string()),
            tab: Some("c".to_string()),
        })
    );
}

#[test]
fn test_empty_path_defaults_to_index() {
    for path in ["", "/", "//"] {
        let mut config = Config::new();
        let router = Router::new(Request::new("GET", path), &mut config);
        assert_eq!(router.page(), "index");
        assert_eq!(router.subpage(), None);
        assert_eq!(router.tab(), None);
    }
}

#[test]
fn test_query_string_is_not_part_of_path() {
    let mut config = Config::new();
    let router = Router::new(Request::new("GET", "/search?q=rust"), &mut config);
    assert_eq!(router.path(), &["search".to_string()]);
}

#[test]
fn test_http_method_published() {
    let mut config = Config::new();
    let request = Request::new("GET", "/form").with_post_field("name", "value");
    let router = Router::new(request, &mut config);
    assert_eq!(router.http_method(), HttpMethod::Post);
    assert_eq!(config.http_method(), Some(HttpMethod::Post));

    let mut config = Config::new();
    let router = Router::new(Request::new("DELETE", "/form"), &mut config);
    assert_eq!(router.http_method(), HttpMethod::Delete);

    let mut config = Config::new();
    let router = Router::new(Request::new("OPTIONS", "/form"), &mut config);
    assert_eq!(router.http_method(), HttpMethod::Get);
}

#[test]
fn test_derived_page_is_rendered() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/my-page"), &mut config);
    assert_eq!(router.page_identifier(), "web::MyPagePage");
    let page = router.route(&registry(), &config).unwrap();
    assert_eq!(page.status, 200);
    assert!(page.html.contains("<main><p>my page</p></main>"));
}

#[test]
fn test_exact_static_route_bypasses_naming() {
    let mut config = Config::new();
    config.add_static_route("/home/cake", "Mouse::Hole");
    let mut pages = registry();
    pages.register("Mouse::Hole", || Ok(Box::new(IndexPage) as Box<dyn PageHandler>));

    let mut router = Router::new(Request::new("GET", "/home/cake"), &mut config);
    assert!(router.is_static_route());
    assert!(!router.is_wildcard());
    assert_eq!(router.page_identifier(), "Mouse::Hole");
    let page = router.route(&pages, &config).unwrap();
    assert_eq!(page.identifier, "Mouse::Hole");
    assert_eq!(page.status, 200);
}

#[test]
fn test_wildcard_static_route_wins_over_exact() {
    let mut config = Config::new();
    config
        .add_static_route("/docs/intro", "web::IndexPage")
        .add_static_route("/docs/*", "web::MyPagePage");
    let mut router = Router::new(Request::new("GET", "/docs/intro"), &mut config);
    assert!(router.is_wildcard());
    assert_eq!(router.subpage(), Some("intro"));
    let page = router.route(&registry(), &config).unwrap();
    assert!(page.html.contains("my page"));
}

#[test]
fn test_static_routes_need_redirect_path() {
    let mut config = Config::new();
    config.add_static_route("/home", "Mouse::Hole");
    let request = Request::new("GET", "/home").with_redirect_path(None);
    let router = Router::new(request, &mut config);
    assert!(!router.is_static_route());
    assert_eq!(router.page(), "index");
}

#[test]
fn test_missing_page_renders_404() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/does-not-exist"), &mut config);
    let page = router.route(&registry(), &config).unwrap();
    assert_eq!(page.identifier, "web::DoesNotExistPage");
    assert_eq!(page.status, 404);
    assert!(page.html.contains("<main><h1>404</h1>"));
    assert!(page.html.ends_with("</body>\n</html>\n"));
}

#[test]
fn test_failed_construction_renders_500() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/broken"), &mut config);
    let page = router.route(&registry(), &config).unwrap();
    assert_eq!(page.status, 500);
    assert!(page.html.contains("<h1>500</h1>"));
    assert!(!page.html.contains("half written"));
}

#[test]
fn test_duplicate_render_is_suppressed() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/"), &mut config);
    router.add_task("web::IndexPage");
    assert!(router.route(&registry(), &config).is_none());
}

#[test]
fn test_add_multiple_tasks_prepends() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/"), &mut config);
    router.add_task("c");
    router.add_multiple_tasks(["a", "b"]);
    router.add_task("d");
    assert_eq!(router.tasks(), &["a", "b", "c", "d"]);
}

#[test]
fn test_layout_order() {
    let mut config = Config::new();
    config.meta_mut().page_title = "Asset Test".to_string();
    config.meta_mut().favicon = Some("/favicon.ico".to_string());
    let mut router = Router::new(Request::new("GET", "/asset"), &mut config);
    let html = router.route(&registry(), &config).unwrap().html;

    let pos = |needle: &str| html.find(needle).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Asset Test</title>"));
    assert!(pos("/favicon.ico") < pos("/head.css"));
    assert!(pos("/head.css") < pos("/head.js"));
    assert!(pos("/head.js") < pos("</head>"));
    assert!(pos("<body>") < pos("/top.css"));
    assert!(pos("/top.css") < pos("/top.js"));
    assert!(pos("/top.js") < pos("<main>"));
    assert!(pos("<p>body</p>") < pos("/body.css"));
    assert!(pos("/body.css") < pos("/body.js"));
    assert!(pos("/body.js") < pos("</main>"));
    assert!(pos("</main>") < pos("/bottom.css"));
    assert!(pos("/bottom.css") < pos("/bottom.js"));
    assert!(pos("/bottom.js") < pos("</body>"));
}

#[test]
fn test_cookies_secure_outside_development() {
    let mut config = Config::new();
    let mut router = Router::new(Request::new("GET", "/asset"), &mut config);
    let cookies = router.route(&registry(), &config).unwrap().cookies;
    assert_eq!(cookies.len(), 1);
    assert!(!cookies[0].contains("Secure"));

    let mut config = Config::new();
    config.set_environment(AppMode::Production);
    let mut router = Router::new(Request::new("GET", "/asset"), &mut config);
    let cookies = router.route(&registry(), &config).unwrap().cookies;
    assert!(cookies[0].ends_with("; Secure"));
}

#[test]
fn test_derive_page_class() {
    assert_eq!(derive_page_class("my-page"), "MyPagePage");
    assert_eq!(derive_page_class("upload"), "UploadPage");
}

proptest! {
    #[test]
    fn test_split_path_has_no_empty_segments(raw in "[a-z/ ]{0,40}") {
        let segments = split_path(&raw);
        prop_assert!(segments.iter().all(|s| !s.trim().is_empty()));
        let expected: Vec<String> = raw
            .split('/')
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect();
        prop_assert_eq!(segments, expected);
    }

    #[test]
    fn test_first_three_segments_named(a in "[a-z]{1,8}", b in "[a-z]{1,8}", c in "[a-z]{1,8}") {
        let mut config = Config::new();
        let path = format!("/{}//{}/{}/", a, b, c);
        let router = Router::new(Request::new("GET", &path), &mut config);
        prop_assert_eq!(router.page(), a.as_str());
        prop_assert_eq!(router.subpage(), Some(b.as_str()));
        prop_assert_eq!(router.tab(), Some(c.as_str()));
    }
}
