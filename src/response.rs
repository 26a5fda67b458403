// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! 把路由器渲染出的页面包装为 HTTP/1.1 响应报文：状态行、压缩编码、`Set-Cookie` 头与报文体。

use crate::{
    page::RenderedPage,
    param::*,
    request::Request,
    util::escape_html,
};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    set_cookie: Vec<String>,
    content: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            set_cookie: Vec::new(),
            content: None,
        }
    }

    /// 由渲染完成的页面构建响应。`HEAD` 请求只保留报文头。
    pub fn from_page(page: &RenderedPage, request: &Request) -> Self {
        let id = request.id();
        let mut response = Self::from_html(&page.html, request);
        response.set_code(page.status);
        response.set_cookie = page.cookies.clone();
        debug!(
            "[ID{}]页面{}包装为响应，状态码{}，Cookie {}个",
            id,
            page.identifier,
            page.status,
            page.cookies.len()
        );
        response
    }

    fn from_html(html: &str, request: &Request) -> Self {
        let id = request.id();
        let mut response = Self::new();
        response.content_type = Some("text/html;charset=utf-8".to_string());
        response.content_encoding = decide_encoding(request.accept_encoding());
        match response.content_encoding {
            Some(HttpEncoding::Gzip) => debug!("[ID{}]使用Gzip压缩编码", id),
            Some(HttpEncoding::Br) => debug!("[ID{}]使用Brotli压缩编码", id),
            Some(HttpEncoding::Deflate) => debug!("[ID{}]使用Deflate压缩编码", id),
            None => debug!("[ID{}]不进行压缩", id),
        };
        let content = match compress(Vec::from(html), response.content_encoding) {
            Ok(c) => c,
            Err(e) => {
                error!("[ID{}]压缩HTML失败: {}，返回未压缩内容", id, e);
                response.content_encoding = None;
                Vec::from(html)
            }
        };
        response.content_length = content.len() as u64;
        if request.method() != "HEAD" {
            response.content = Some(Bytes::from(content));
        }
        response
    }

    fn from_status_code(code: u16, request: &Request) -> Self {
        if code == 204 {
            let mut response = Self::new();
            response.set_code(code);
            return response;
        }
        let reason = STATUS_CODES.get(&code).copied().unwrap_or("Unknown Error");
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{} {}</title>\n</head>\n<body>\n<h1>{}</h1>\n<h2>{}</h2>\n</body>\n</html>\n",
            code,
            escape_html(reason),
            code,
            escape_html(reason)
        );
        let mut response = Self::from_html(&html, request);
        response.set_code(code);
        response
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&reason) => reason.to_string(),
            None => {
                warn!("未登记的状态码：{}", code);
                "Unknown".to_string()
            }
        };
        self
    }

    /// 路由器没有产生页面（API / CLI 或重复渲染被抑制）时使用。
    pub fn response_204(request: &Request) -> Self {
        Self::from_status_code(204, request)
    }

    pub fn response_400(request: &Request) -> Self {
        Self::from_status_code(400, request)
    }

    pub fn response_413(request: &Request) -> Self {
        Self::from_status_code(413, request)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version, self.status_code, self.information, CRLF
        );
        if let Some(t) = &self.content_type {
            header.push_str(&["Content-Type: ", t, CRLF].concat());
        }
        if let Some(e) = self.content_encoding {
            let name = match e {
                HttpEncoding::Gzip => "gzip",
                HttpEncoding::Deflate => "deflate",
                HttpEncoding::Br => "br",
            };
            header.push_str(&["Content-Encoding: ", name, CRLF].concat());
        }
        // 204 响应不能携带 Content-Length
        if self.status_code != 204 {
            header.push_str(&["Content-Length: ", &self.content_length.to_string(), CRLF].concat());
        }
        header.push_str(&["Date: ", &format_date(&self.date), CRLF].concat());
        header.push_str(&["Server: ", &self.server_name, CRLF].concat());
        for cookie in &self.set_cookie {
            header.push_str(&["Set-Cookie: ", cookie, CRLF].concat());
        }
        header.push_str(&["Connection: close", CRLF, CRLF].concat());

        let mut bytes = header.into_bytes();
        if let Some(c) = &self.content {
            bytes.extend_from_slice(c);
        }
        bytes
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn set_cookie(&self) -> &[String] {
        &self.set_cookie
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

/// HTTP 日期格式，例如 `Tue, 15 Nov 1994 08:12:31 GMT`
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    let original_size = data.len();
    let result = match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    };

    if let Ok(ref compressed) = result {
        debug!(
            "压缩完成: {:?}, 原始大小: {} bytes, 压缩后: {} bytes",
            mode,
            original_size,
            compressed.len()
        );
    }

    result
}

/// Brotli 优先，其次 Gzip，最后 Deflate。
fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    [HttpEncoding::Br, HttpEncoding::Gzip, HttpEncoding::Deflate]
        .into_iter()
        .find(|e| accept_encoding.contains(e))
}
