// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use log::debug;

/// Cookie 的 `SameSite` 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: String,
    max_age: Option<i64>,
    http_only: bool,
    same_site: SameSite,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// 渲染为 `Set-Cookie` 头的值。`SameSite=None` 在浏览器中要求同时带 `Secure`。
    fn render(&self, secure: bool) -> String {
        let mut header = format!("{}={}; Path={}", self.name, encode_value(&self.value), self.path);
        if let Some(age) = self.max_age {
            header.push_str(&format!("; Max-Age={}", age));
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header.push_str(match self.same_site {
            SameSite::Strict => "; SameSite=Strict",
            SameSite::Lax => "; SameSite=Lax",
            SameSite::None => "; SameSite=None",
        });
        if secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// 页面在渲染过程中设置的 Cookie。路由器在页面构造完成后统一注入。
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 Cookie，同名 Cookie 会被替换。
    pub fn set(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// 让浏览器删除指定 Cookie。
    pub fn remove(&mut self, name: &str) {
        self.set(Cookie::new(name, "").max_age(0));
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// 生成全部 `Set-Cookie` 头的值，`secure` 为真时为每个 Cookie 追加 `Secure`。
    pub fn inject_cookies(&self, secure: bool) -> Vec<String> {
        debug!("注入{}个Cookie，安全模式：{}", self.cookies.len(), secure);
        self.cookies.iter().map(|c| c.render(secure)).collect()
    }
}

/// 对 Cookie 值中不属于 cookie-octet 的字节做百分号编码。
fn encode_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'!' | b'#'..=b'+' | b'-'..=b':' | b'<'..=b'[' | b']'..=b'~' if b != b'%' => {
                encoded.push(b as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", b)),
        }
    }
    encoded
}
