// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 框架参数与常量模块
//!
//! 该模块定义了 `webframe` 在路由、布局与上传处理中共享的常量和数据结构，包括：
//! - 路由类型、HTTP 方法、页面注入位置、运行环境等强类型枚举。
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase），供错误页与响应行使用。
//! - 文件后缀名到 MIME 类型的映射表，用于补全缺失 `Content-Type` 的上传文件。
//! - 上传错误码（`0` 表示成功，`1` 表示超过服务器的单文件上限）。

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use serde_derive::{Deserialize, Serialize};

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "webframe";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 页面类标识的统一命名空间前缀
pub const PAGE_NAMESPACE: &str = "web::";

/// 由页面段推导页面类名时追加的后缀
pub const PAGE_SUFFIX: &str = "Page";

/// 未指定页面时使用的默认页面段
pub const DEFAULT_PAGE: &str = "index";

/// 用于标记 AJAX/XHR 请求的请求头（小写形式）
pub const XHR_HEADER: &str = "x-requested-with";

/// `X-Requested-With` 头在 API 请求中的取值（比较时忽略大小写）
pub const XHR_MARKER: &str = "xmlhttprequest";

/// 上传成功，没有错误
pub const UPLOAD_ERR_OK: u8 = 0;
/// 文件大小超过服务器允许的上限。这是唯一计入 `error_count` 的错误码。
pub const UPLOAD_ERR_INI_SIZE: u8 = 1;
/// 文件只有部分被上传
pub const UPLOAD_ERR_PARTIAL: u8 = 3;
/// 没有文件被上传
pub const UPLOAD_ERR_NO_FILE: u8 = 4;
/// 临时文件无法写入磁盘
pub const UPLOAD_ERR_CANT_WRITE: u8 = 7;

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(204, "No Content");
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(409, "Conflict");
        map.insert(413, "Content Too Large");
        map.insert(415, "Unsupported Media Type");
        map.insert(422, "Unprocessable Content");
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(503, "Service Unavailable");
        map
    };
}

lazy_static! {
    /// 文件后缀名到 MIME 类型（Media Type）的映射表。
    ///
    /// 客户端在 multipart 分段中没有给出 `Content-Type` 时，按后缀名推断上传文件的类型。
    pub static ref MIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("avif", "image/avif");
        map.insert("bmp", "image/bmp");
        map.insert("css", "text/css");
        map.insert("csv", "text/csv");
        map.insert("doc", "application/msword");
        map.insert(
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        );
        map.insert("gif", "image/gif");
        map.insert("gz", "application/gzip");
        map.insert("htm", "text/html");
        map.insert("html", "text/html");
        map.insert("ico", "image/x-icon");
        map.insert("jpeg", "image/jpeg");
        map.insert("jpg", "image/jpeg");
        map.insert("js", "text/javascript");
        map.insert("json", "application/json");
        map.insert("mp3", "audio/mpeg");
        map.insert("mp4", "video/mp4");
        map.insert("odt", "application/vnd.oasis.opendocument.text");
        map.insert("pdf", "application/pdf");
        map.insert("png", "image/png");
        map.insert("svg", "image/svg+xml");
        map.insert("tar", "application/x-tar");
        map.insert("tif", "image/tiff");
        map.insert("tiff", "image/tiff");
        map.insert("txt", "text/plain");
        map.insert("wav", "audio/wav");
        map.insert("webp", "image/webp");
        map.insert("xls", "application/vnd.ms-excel");
        map.insert(
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        );
        map.insert("xml", "text/xml");
        map.insert("zip", "application/zip");
        map.insert("7z", "application/x-7z-compressed");
        map
    };
}

/// 根据后缀名推断 MIME 类型，未知后缀返回 `application/octet-stream`。
pub fn mime_from_extension(extension: &str) -> &'static str {
    MIME_TYPES
        .get(extension.to_lowercase().as_str())
        .copied()
        .unwrap_or("application/octet-stream")
}

/// 一次调用的执行上下文。构造路由器时确定，之后不再改变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// 命令行（批处理）调用
    Cli,
    /// 带有 `X-Requested-With: XMLHttpRequest` 的异步请求
    Api,
    /// 普通的页面请求
    Http,
}

/// 路由器识别的 HTTP 方法。无法识别的方法一律视为 `Get`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// 按请求行中声明的方法名解析，大小写不敏感，未知方法回退为 `Get`。
    pub fn from_declared(method: &str) -> Self {
        match method.to_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => HttpMethod::Get,
        }
    }
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.0 版本
    V1_0,
    /// HTTP/1.1 版本
    V1_1,
}

/// 支持的内容编码（压缩）格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpEncoding {
    /// GNU zip 压缩
    Gzip,
    /// zlib 压缩
    Deflate,
    /// Brotli 压缩
    Br,
}

/// CSS / JS 在页面中的注入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagePosition {
    /// `<head>` 内
    InHead,
    /// `<body>` 开头、页面主体之前
    TopOfPage,
    /// 页面主体内部，紧跟页面输出之后
    InBody,
    /// 页面主体之后、`</body>` 之前
    BottomOfPage,
}

/// 应用运行环境。除 `Development` 外均视为安全模式（Cookie 带 `Secure`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Development,
    Staging,
    Production,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RouteKind::Cli => write!(f, "CLI"),
            RouteKind::Api => write!(f, "API"),
            RouteKind::Http => write!(f, "HTTP"),
        }
    }
}

impl fmt::Display for HttpMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

impl fmt::Display for HttpEncoding {
    /// 将枚举格式化为 `Content-Encoding` 头所使用的标识符
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpEncoding::Gzip => write!(f, "gzip"),
            HttpEncoding::Deflate => write!(f, "deflate"),
            HttpEncoding::Br => write!(f, "br"),
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AppMode::Development => write!(f, "development"),
            AppMode::Staging => write!(f, "staging"),
            AppMode::Production => write!(f, "production"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_method_known() {
        assert_eq!(HttpMethod::from_declared("GET"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_declared("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::from_declared("Put"), HttpMethod::Put);
        assert_eq!(HttpMethod::from_declared("DELETE"), HttpMethod::Delete);
    }

    #[test]
    fn test_declared_method_unknown_falls_back_to_get() {
        assert_eq!(HttpMethod::from_declared("PATCH"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_declared("OPTIONS"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_declared(""), HttpMethod::Get);
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("png"), "image/png");
        assert_eq!(mime_from_extension("PDF"), "application/pdf");
        assert_eq!(mime_from_extension("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_status_codes_cover_error_pages() {
        assert_eq!(STATUS_CODES.get(&404), Some(&"Not Found"));
        assert_eq!(STATUS_CODES.get(&500), Some(&"Internal Server Error"));
    }

    #[test]
    fn test_display() {
        assert_eq!(RouteKind::Api.to_string(), "API");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpVersion::V1_1.to_string(), "HTTP/1.1");
        assert_eq!(AppMode::Production.to_string(), "production");
    }
}
