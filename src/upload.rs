// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文件上传处理模块
//!
//! 把请求中携带的上传文件整理为统一的逐文件记录，按调用方开启的策略依次校验，
//! 最后把通过校验的文件从临时目录转存到目标目录。
//!
//! ## 处理流程
//! 1. **构造**：读取上传描述，无论一个还是多个文件都保存为同一个有序列表。
//! 2. **校验**：`upload_check` 按 大小 → 是否已存在 → 类型 的固定顺序执行已开启的检查，
//!    遇到第一个不合格的文件立即停止。
//! 3. **转存**：`place_uploaded_file` 逐个移动文件，单个文件失败不会中断其余文件。

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use crate::{
    config::UploadConfig,
    exception::Exception,
    param::UPLOAD_ERR_INI_SIZE,
    util::{base_file_name, format_file_size},
};

/// 请求中携带的原始上传描述。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    /// 表单字段名
    pub field: String,
    /// 客户端给出的文件名
    pub name: String,
    /// 客户端给出的 MIME 类型
    pub mime_type: String,
    /// 文件在服务器上的临时位置
    pub tmp_name: PathBuf,
    /// 上传错误码，见 `param::UPLOAD_ERR_*`
    pub error: u8,
    /// 文件大小（字节）
    pub size: u64,
}

/// 单个上传文件的规范化记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// 表单字段名
    pub field: String,
    /// 完整文件名，例如 `example.jpg`
    pub file_name: String,
    /// 不含后缀的文件名，例如 `example`
    pub base_name: String,
    /// 小写后缀名，例如 `jpg`
    pub extension: String,
    /// MIME 类型，例如 `image/jpeg`
    pub mime_type: String,
    /// 临时文件位置
    pub tmp_path: PathBuf,
    /// 原始上传错误码
    pub error_code: u8,
    /// 文件大小（字节）
    pub size: u64,
    /// 转存时使用的文件名，默认与原文件名相同
    pub new_name: String,
}

impl UploadedFile {
    fn from_raw(raw: RawUpload) -> Self {
        // 只保留最后一段，不合法的文件名留空，转存时按失败处理
        let name = base_file_name(&raw.name).unwrap_or_default().to_string();
        if name.is_empty() {
            warn!("上传文件名{:?}不合法", raw.name);
        }
        let path = Path::new(&name);
        let base_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            field: raw.field,
            new_name: name.clone(),
            file_name: name,
            base_name,
            extension,
            mime_type: raw.mime_type,
            tmp_path: raw.tmp_name,
            error_code: raw.error,
            size: raw.size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadHandler {
    files: Vec<UploadedFile>,
    save_path: PathBuf,
    error_count: usize,
    check_file_type: bool,
    check_file_exists: bool,
    check_size_limit: bool,
    allowed_file_types: Vec<String>,
    max_upload_size: u64,
    upload_failed: bool,
    upload_failed_reason: Option<String>,
}

impl UploadHandler {
    /// 从上传描述构建处理器。
    ///
    /// 没有任何文件时只记录一条警告，此后调用校验或转存方法都会返回
    /// `Exception::NoFilesSelected`。只有错误码等于 `UPLOAD_ERR_INI_SIZE` 的条目计入 `error_count`。
    pub fn new(uploads: Vec<RawUpload>, config: &UploadConfig) -> Self {
        if uploads.is_empty() {
            warn!("No files selected");
        }
        let mut error_count = 0;
        let files: Vec<UploadedFile> = uploads
            .into_iter()
            .map(|raw| {
                if raw.error == UPLOAD_ERR_INI_SIZE {
                    error_count += 1;
                }
                UploadedFile::from_raw(raw)
            })
            .collect();
        debug!("上传处理器已创建，文件数：{}，初始错误数：{}", files.len(), error_count);
        Self {
            files,
            save_path: config.save_path.clone(),
            error_count,
            check_file_type: false,
            check_file_exists: false,
            check_size_limit: false,
            allowed_file_types: Vec::new(),
            max_upload_size: config.max_upload_size,
            upload_failed: false,
            upload_failed_reason: None,
        }
    }

    /// 检查当前错误数。返回 `true` 时调用方应立即返回，不再继续处理。
    pub fn upload_error(&self) -> bool {
        match self.error_count {
            0 => false,
            1 => {
                warn!("1 file could not be uploaded");
                true
            }
            n => {
                warn!("{} files could not be uploaded", n);
                true
            }
        }
    }

    /// 按已开启的策略校验全部文件，遇到第一个不合格的文件即停止。
    pub fn upload_check(&mut self) -> Result<(), Exception> {
        self.ensure_files()?;
        if self.upload_error() {
            return Err(Exception::UploadFailed);
        }
        self.upload_failed = false;

        if self.check_size_limit {
            let max = self.max_upload_size;
            let oversized = self.files.iter().find(|f| f.size > max).map(|f| {
                format!(
                    "File {} ({}) is bigger than the maximum upload size ({})",
                    f.file_name,
                    format_file_size(f.size),
                    format_file_size(max)
                )
            });
            if let Some(reason) = oversized {
                return Err(self.fail(reason));
            }
        }

        if self.check_file_exists {
            let existing = self
                .files
                .iter()
                .find_map(|f| {
                    if f.new_name.is_empty() {
                        return Some(format!("File name of {} is not allowed", f.field));
                    }
                    let target = self.save_path.join(&f.new_name);
                    target.exists().then(|| {
                        format!(
                            "File {} already exists and may not be overwritten",
                            target.display()
                        )
                    })
                });
            if let Some(reason) = existing {
                return Err(self.fail(reason));
            }
        }

        if self.check_file_type {
            let test_all = self.normalize_allowed_types();
            let allowed = &self.allowed_file_types;
            let rejected = self
                .files
                .iter()
                .find(|f| !type_allowed(f, allowed, test_all))
                .map(|f| format!("Invalid file type {} / {} not allowed", f.mime_type, f.extension));
            if let Some(reason) = rejected {
                return Err(self.fail(reason));
            }
        }

        debug!("{}个文件通过上传校验", self.files.len());
        Ok(())
    }

    /// 把每个文件从临时位置移动到 `save_path/new_name`。
    ///
    /// 单个文件失败会增加错误数并记录日志，但不会中断其余文件。
    pub fn place_uploaded_file(&mut self) -> Result<(), Exception> {
        self.ensure_files()?;
        if self.upload_error() {
            return Err(Exception::UploadFailed);
        }

        let mut failed = 0;
        for file in &self.files {
            if file.new_name.is_empty() {
                error!("字段{}的文件名不合法，无法转存", file.field);
                failed += 1;
                continue;
            }
            let target = self.save_path.join(&file.new_name);
            match move_file(&file.tmp_path, &target) {
                Ok(()) => info!("文件{}已保存到{}", file.file_name, target.display()),
                Err(e) => {
                    error!(
                        "无法把{}移动到{}：{}",
                        file.tmp_path.display(),
                        target.display(),
                        e
                    );
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            self.error_count += failed;
            self.upload_failed = true;
            return Err(Exception::FileMoveFailed);
        }
        Ok(())
    }

    fn ensure_files(&self) -> Result<(), Exception> {
        if self.files.is_empty() {
            return Err(Exception::NoFilesSelected);
        }
        Ok(())
    }

    fn fail(&mut self, reason: String) -> Exception {
        warn!("上传校验失败：{}", reason);
        self.error_count += 1;
        self.upload_failed = true;
        self.upload_failed_reason = Some(reason);
        Exception::UploadFailed
    }

    /// 规范化允许的类型列表：去掉后缀名开头的 `.`，并为每个 `category/*` 追加 `category/`。
    ///
    /// 返回列表中是否存在 `category/*` 形式的通配类型。
    fn normalize_allowed_types(&mut self) -> bool {
        let mut normalized: Vec<String> = Vec::with_capacity(self.allowed_file_types.len());
        let mut categories = Vec::new();
        for entry in &self.allowed_file_types {
            let stripped = entry.trim_start_matches('.').to_string();
            if !normalized.contains(&stripped) {
                normalized.push(stripped);
            }
            let mut parts = entry.split('/');
            if let (Some(category), Some("*")) = (parts.next(), parts.next()) {
                categories.push(format!("{}/", category));
            }
        }
        let test_all = !categories.is_empty();
        for category in categories {
            if !normalized.contains(&category) {
                normalized.push(category);
            }
        }
        self.allowed_file_types = normalized;
        test_all
    }
}

fn type_allowed(file: &UploadedFile, allowed: &[String], test_all: bool) -> bool {
    let listed = |value: &str| allowed.iter().any(|a| a == value);
    if listed(&file.mime_type) || listed(&file.extension) {
        return true;
    }
    if test_all {
        let category = file.mime_type.split('/').next().unwrap_or_default();
        return listed(&format!("{}/", category));
    }
    false
}

/// 移动文件。跨文件系统时 `rename` 会失败，此时退回到复制后删除。
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            if !from.exists() {
                return Err(e);
            }
            debug!("rename失败({})，改为复制后删除", e);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

// --- 策略设置 ---

impl UploadHandler {
    pub fn set_check_size_limit(&mut self, enabled: bool) -> &mut Self {
        self.check_size_limit = enabled;
        self
    }

    pub fn set_check_file_exists(&mut self, enabled: bool) -> &mut Self {
        self.check_file_exists = enabled;
        self
    }

    pub fn set_check_file_type(&mut self, enabled: bool) -> &mut Self {
        self.check_file_type = enabled;
        self
    }

    /// 设置允许的类型。条目可以是 MIME 类型（`application/pdf`）、通配类型（`image/*`）
    /// 或后缀名（`pdf` / `.pdf`）。单个类型传入只含一个元素的列表即可。
    pub fn set_allowed_file_types<I, S>(&mut self, types: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_file_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_max_upload_size(&mut self, size: u64) -> &mut Self {
        self.max_upload_size = size;
        self
    }

    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.save_path = path.into();
        self
    }

    /// 修改第 `index` 个文件转存时使用的文件名。名称不能包含路径分隔符，也不能是 `.` / `..`。
    pub fn set_new_name(&mut self, index: usize, name: &str) -> Result<(), Exception> {
        if base_file_name(name) != Some(name) {
            warn!("转存文件名{:?}不合法", name);
            return Err(Exception::InvalidFileName);
        }
        match self.files.get_mut(index) {
            Some(file) => {
                file.new_name = name.to_string();
                Ok(())
            }
            None => Err(Exception::IndexNotInArray),
        }
    }
}

// --- Getter 访问器实现 ---

impl UploadHandler {
    pub fn num_of_files(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn upload_failed(&self) -> bool {
        self.upload_failed
    }

    pub fn upload_failed_reason(&self) -> Option<&str> {
        self.upload_failed_reason.as_deref()
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn allowed_file_types(&self) -> &[String] {
        &self.allowed_file_types
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }
}
