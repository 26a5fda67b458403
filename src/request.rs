// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求上下文模块
//!
//! 该模块把一次调用所需的全部外部输入收拢到一个显式的 `Request` 结构体中，
//! 路由器只从这里读取信息，不依赖任何全局状态。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、版本）。
//! 2. 请求头的提取（大小写不敏感），包括 `X-Requested-With` 与 `Accept-Encoding`。
//! 3. 查询字符串与 `application/x-www-form-urlencoded` 表单的解析。
//! 4. `multipart/form-data` 表单的解析，以及把文件分段落盘为上传描述。
//! 5. 命令行调用与测试使用的构造器。

use std::{collections::HashMap, fs, path::Path};

use bytes::Bytes;
use lazy_static::lazy_static;
use log::{debug, error, warn};
use regex::Regex;

use crate::{
    exception::Exception,
    param::*,
    upload::RawUpload,
    util::{base_file_name, substr_between},
};

lazy_static! {
    static ref DISPOSITION_NAME: Regex = Regex::new(r#"(?i)\bname="([^"]*)""#).unwrap();
    static ref DISPOSITION_FILENAME: Regex = Regex::new(r#"(?i)\bfilename="([^"]*)""#).unwrap();
}

/// multipart 请求中的一个文件分段，尚未写入磁盘。
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartFile {
    /// 表单字段名
    pub field: String,
    /// 客户端给出的文件名
    pub file_name: String,
    /// 分段的 `Content-Type`，缺失时为 `None`
    pub content_type: Option<String>,
    /// 文件内容
    pub data: Bytes,
}

/// 一次调用的完整请求上下文。
#[derive(Debug, Clone)]
pub struct Request {
    /// 请求 ID，用于在日志中追踪
    id: u128,
    /// 是否为命令行（批处理）调用
    cli: bool,
    /// 请求行中声明的方法名（大写）
    method: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 请求目标（包含查询字符串）
    path: String,
    /// 去掉查询字符串后的路径，未设置时为 `None`
    redirect_path: Option<String>,
    /// 请求头，键为小写
    headers: HashMap<String, String>,
    /// 查询参数
    query: HashMap<String, String>,
    /// 表单字段（urlencoded 或 multipart 的非文件分段）
    post: HashMap<String, String>,
    /// multipart 文件分段
    multipart_files: Vec<MultipartFile>,
    /// 已落盘的上传描述
    files: Vec<RawUpload>,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 在第一个空行处拆分报文头与报文体，报文头必须是合法的 UTF-8。
    /// 2. 解析请求行：提取方法、路径和协议版本。方法名不做校验，由路由器决定如何回退。
    /// 3. 解析请求头、查询字符串，以及按 `Content-Type` 解析报文体。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match find_bytes(buffer, b"\r\n\r\n", 0) {
            Some(i) => (&buffer[..i], &buffer[i + 4..]),
            None => (buffer, &buffer[buffer.len()..]),
        };
        let head = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);
        let first_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = first_line.split_whitespace().collect();
        if parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, first_line);
            return Err(Exception::MalformedRequest);
        }

        let method = parts[0].to_uppercase();
        let version = match parts[parts.len() - 1].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };
        // 路径中可能包含空格，虽然不规范但通过 join 尝试恢复
        let path = parts[1..parts.len() - 1].join(" ");

        let mut request = Self::new(&method, &path);
        request.id = id;
        request.version = version;

        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                request
                    .headers
                    .insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        if let Some(encoding) = request.headers.get("accept-encoding") {
            request.accept_encoding = parse_accept_encoding(encoding);
        }

        let content_type = request.header("content-type").unwrap_or_default().to_string();
        let content_type_lower = content_type.to_lowercase();
        if content_type_lower.starts_with("application/x-www-form-urlencoded") {
            let body = String::from_utf8_lossy(body);
            request.post = parse_query(&body);
        } else if content_type_lower.starts_with("multipart/form-data") {
            let boundary = substr_between(&format!("{};", content_type), "boundary=", ";")
                .trim()
                .trim_matches('"')
                .to_string();
            if boundary.is_empty() {
                error!("[ID{}]multipart请求缺少boundary", id);
                return Err(Exception::MalformedMultipart);
            }
            let (fields, files) = parse_multipart(body, &boundary, id)?;
            request.post = fields;
            request.multipart_files = files;
        }

        debug!(
            "[ID{}]请求解析完成：{} {}，表单字段{}个，文件分段{}个",
            id,
            request.method,
            request.path,
            request.post.len(),
            request.multipart_files.len()
        );
        Ok(request)
    }

    /// 以给定方法与请求目标构建一个 HTTP 请求，其余字段为空。
    pub fn new(method: &str, path: &str) -> Self {
        let (route_path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), parse_query(q)),
            None => (path.to_string(), HashMap::new()),
        };
        Self {
            id: 0,
            cli: false,
            method: method.to_uppercase(),
            version: HttpVersion::V1_1,
            path: path.to_string(),
            redirect_path: Some(route_path),
            headers: HashMap::new(),
            query,
            post: HashMap::new(),
            multipart_files: Vec::new(),
            files: Vec::new(),
            accept_encoding: Vec::new(),
        }
    }

    /// 构建命令行调用的上下文。
    pub fn cli() -> Self {
        let mut request = Self::new("GET", "");
        request.cli = true;
        request.redirect_path = None;
        request
    }

    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("accept-encoding") {
            self.accept_encoding = parse_accept_encoding(value);
        }
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_post_field(mut self, name: &str, value: &str) -> Self {
        self.post.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_file(mut self, upload: RawUpload) -> Self {
        self.files.push(upload);
        self
    }

    /// 覆盖路由使用的路径，`None` 表示上游没有提供重写后的路径。
    pub fn with_redirect_path(mut self, path: Option<&str>) -> Self {
        self.redirect_path = path.map(str::to_string);
        self
    }

    /// 把 multipart 文件分段写入临时目录，转换为上传描述。
    ///
    /// 超过 `max_file_size` 的文件不落盘，错误码记为 `UPLOAD_ERR_INI_SIZE`；
    /// 写入失败的文件错误码记为 `UPLOAD_ERR_CANT_WRITE`。
    pub fn spill_uploads(&mut self, tmp_dir: &Path, max_file_size: u64) {
        if self.multipart_files.is_empty() {
            return;
        }
        if let Err(e) = fs::create_dir_all(tmp_dir) {
            warn!("[ID{}]无法创建临时目录{}：{}", self.id, tmp_dir.display(), e);
        }
        for (n, part) in self.multipart_files.drain(..).enumerate() {
            let tmp_name = tmp_dir.join(format!("upload_{}_{}.tmp", self.id, n));
            let mime_type = part.content_type.clone().unwrap_or_else(|| {
                let extension = Path::new(&part.file_name)
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default();
                mime_from_extension(&extension).to_string()
            });
            let size = part.data.len() as u64;
            let (error, size) = if size > max_file_size {
                warn!(
                    "[ID{}]文件{}大小{}超过服务器上限{}",
                    self.id, part.file_name, size, max_file_size
                );
                (UPLOAD_ERR_INI_SIZE, 0)
            } else {
                match fs::write(&tmp_name, &part.data) {
                    Ok(()) => (UPLOAD_ERR_OK, size),
                    Err(e) => {
                        error!("[ID{}]无法写入临时文件{}：{}", self.id, tmp_name.display(), e);
                        (UPLOAD_ERR_CANT_WRITE, 0)
                    }
                }
            };
            self.files.push(RawUpload {
                field: part.field,
                name: part.file_name,
                mime_type,
                tmp_name,
                error,
                size,
            });
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn parse_accept_encoding(value: &str) -> Vec<HttpEncoding> {
    let mut encodings = vec![];
    if value.contains("gzip") {
        encodings.push(HttpEncoding::Gzip);
    }
    if value.contains("deflate") {
        encodings.push(HttpEncoding::Deflate);
    }
    if value.contains("br") {
        encodings.push(HttpEncoding::Br);
    }
    encodings
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (url_decode(k), url_decode(v)),
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

fn url_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        decoded.push(b);
                        i += 2;
                    }
                    Err(_) => decoded.push(b'%'),
                }
            }
            b => decoded.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).to_string()
}

type MultipartParts = (HashMap<String, String>, Vec<MultipartFile>);

fn parse_multipart(body: &[u8], boundary: &str, id: u128) -> Result<MultipartParts, Exception> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut fields = HashMap::new();
    let mut files = Vec::new();

    let mut pos = match find_bytes(body, &delimiter, 0) {
        Some(p) => p,
        None => {
            error!("[ID{}]multipart请求体中找不到boundary", id);
            return Err(Exception::MalformedMultipart);
        }
    };
    loop {
        pos += delimiter.len();
        if body[pos..].starts_with(b"--") {
            break;
        }
        if body[pos..].starts_with(b"\r\n") {
            pos += 2;
        }
        let next = match find_bytes(body, &delimiter, pos) {
            Some(n) => n,
            None => {
                error!("[ID{}]multipart请求体缺少结束boundary", id);
                return Err(Exception::MalformedMultipart);
            }
        };
        let part = &body[pos..next];
        let part = part.strip_suffix(b"\r\n").unwrap_or(part);
        let header_end = find_bytes(part, b"\r\n\r\n", 0).ok_or(Exception::MalformedMultipart)?;
        let part_head =
            std::str::from_utf8(&part[..header_end]).map_err(|_| Exception::MalformedMultipart)?;
        let data = &part[header_end + 4..];

        let mut disposition = "";
        let mut content_type = None;
        for line in part_head.split(CRLF) {
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_lowercase();
                if name == "content-disposition" {
                    disposition = value.trim();
                } else if name == "content-type" {
                    content_type = Some(value.trim().to_string());
                }
            }
        }
        let field = match DISPOSITION_NAME.captures(disposition) {
            Some(c) => c[1].to_string(),
            None => {
                warn!("[ID{}]multipart分段缺少name，已跳过", id);
                pos = next;
                continue;
            }
        };
        match DISPOSITION_FILENAME.captures(disposition) {
            Some(c) if c[1].is_empty() => {
                debug!("[ID{}]字段{}没有选择文件，已跳过", id, field);
            }
            Some(c) => match base_file_name(&c[1]) {
                Some(file_name) => files.push(MultipartFile {
                    field,
                    file_name: file_name.to_string(),
                    content_type,
                    data: Bytes::copy_from_slice(data),
                }),
                None => warn!("[ID{}]字段{}的文件名{:?}不合法，已跳过", id, field, &c[1]),
            },
            None => {
                fields.insert(field, String::from_utf8_lossy(data).to_string());
            }
        }
        pos = next;
    }
    Ok((fields, files))
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取请求 ID
    pub fn id(&self) -> u128 {
        self.id
    }

    /// 是否为命令行调用
    pub fn is_cli(&self) -> bool {
        self.cli
    }

    /// 获取请求行中声明的方法名
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取 HTTP 协议版本
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求目标（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取路由使用的路径（不含查询参数）
    pub fn redirect_path(&self) -> Option<&str> {
        self.redirect_path.as_deref()
    }

    /// 按名称获取请求头，名称大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or_default()
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &[HttpEncoding] {
        &self.accept_encoding
    }

    /// 获取查询参数
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// 获取全部表单字段
    pub fn post_fields(&self) -> &HashMap<String, String> {
        &self.post
    }

    /// 获取单个表单字段
    pub fn post(&self, name: &str) -> Option<&str> {
        self.post.get(name).map(String::as_str)
    }

    /// 获取尚未落盘的 multipart 文件分段
    pub fn multipart_files(&self) -> &[MultipartFile] {
        &self.multipart_files
    }

    /// 获取已落盘的上传描述
    pub fn files(&self) -> &[RawUpload] {
        &self.files
    }

    /// 获取请求令牌：优先读取表单字段 `token`，其次读取查询参数 `token`
    pub fn token(&self) -> Option<&str> {
        self.post("token").or_else(|| self.query("token"))
    }
}
