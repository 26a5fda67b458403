// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了框架在请求处理、页面分发、文件上传以及数组工具中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖请求解析错误、配置错误、页面实例化错误、上传错误以及数组查找错误。
//! - **语义映射**：路由层会把页面相关的异常转化为 404 / 500 错误页，其余异常交由调用方处理。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地记录到日志中。

use std::fmt;

/// 框架处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行缺失或格式不正确。
    MalformedRequest,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// `multipart/form-data` 请求体无法解析（缺少 boundary 或分段格式错误）。
    MalformedMultipart,
    /// 配置文件不存在或无法读取。
    ConfigNotFound,
    /// 配置文件内容不是合法的 TOML，或字段类型不匹配。
    ConfigParseFailed,
    /// 页面注册表中不存在所请求的页面标识。对应 `404 Not Found`。
    PageNotFound,
    /// 页面存在，但构造或渲染过程中失败。对应 `500 Internal Server Error`。
    PageConstructFailed,
    /// 上传描述为空时调用了校验或转存方法。
    NoFilesSelected,
    /// 上传校验未通过，或已有文件处于错误状态。具体原因保存在 `UploadHandler` 中。
    UploadFailed,
    /// 至少有一个文件无法从临时目录转存到目标目录。
    FileMoveFailed,
    /// 转存文件名为空、为 `.` / `..` 或包含路径分隔符。
    InvalidFileName,
    /// 子集合中不存在指定的键，或该键的值为 null。
    IndexNotInArray,
    /// 元素是标量，没有可供查找的键或字段。
    ScalarVariable,
    /// 值无法作为映射的键使用（数组或对象）。
    IllegalOffset,
    /// 过滤后没有任何数值可供归约（max / min）。
    EmptyInput,
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request line"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedMultipart => write!(f, "Malformed multipart body"),
            ConfigNotFound => write!(f, "Config file not found"),
            ConfigParseFailed => write!(f, "Config file can't be parsed"),
            PageNotFound => write!(f, "Page not found (404)"),
            PageConstructFailed => write!(f, "Page failed to construct (500)"),
            NoFilesSelected => write!(f, "No files selected"),
            UploadFailed => write!(f, "Upload failed"),
            FileMoveFailed => write!(f, "Uploaded file could not be moved"),
            InvalidFileName => write!(f, "Invalid file name"),
            IndexNotInArray => write!(f, "Index not in array"),
            ScalarVariable => write!(
                f,
                "The subvalue is scalar, and does not have a property, field or index"
            ),
            IllegalOffset => write!(f, "Illegal offset type"),
            EmptyInput => write!(f, "No numeric values in input"),
        }
    }
}

impl std::error::Error for Exception {}
