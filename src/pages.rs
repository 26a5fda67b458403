// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 内置页面
//!
//! 服务端二进制默认注册的页面：
//! - `IndexPage`：站点首页，显示当前路由信息。
//! - `UploadPage`：上传表单，`POST` 时校验并转存上传的文件。

use chrono::Utc;
use log::{info, warn};

use crate::{
    cookie::Cookie,
    exception::Exception,
    page::{PageContext, PageHandler, PageRegistry},
    param::{HttpMethod, PagePosition},
    upload::UploadHandler,
    util::{escape_html, format_file_size, remove_trailing_chars, token_input},
};

/// 注册全部内置页面。
pub fn register_builtin_pages(registry: &mut PageRegistry) -> &mut PageRegistry {
    registry
        .register_page::<IndexPage>("IndexPage")
        .register_page::<UploadPage>("UploadPage")
}

#[derive(Debug, Default)]
pub struct IndexPage;

impl PageHandler for IndexPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        let config = ctx.config();
        let title = escape_html(&config.meta().page_title);
        let (page, subpage, tab) = match config.current_page() {
            Some(current) => (
                current.page.clone(),
                current.subpage.clone().unwrap_or_default(),
                current.tab.clone().unwrap_or_default(),
            ),
            None => Default::default(),
        };
        let method = config
            .http_method()
            .map(|m| m.to_string())
            .unwrap_or_default();

        ctx.injector_mut().add_inline_css(
            PagePosition::InHead,
            "main{max-width:48rem;margin:2rem auto;font-family:sans-serif}",
        );
        ctx.cookies_mut()
            .set(Cookie::new("last_visit", &Utc::now().timestamp().to_string()).max_age(86400));

        ctx.echo(&format!("<h1>{}</h1>\n", title));
        ctx.echo("<table>\n");
        for (name, value) in [
            ("page", page),
            ("subpage", subpage),
            ("tab", tab),
            ("method", method),
        ] {
            ctx.echo(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                name,
                escape_html(&value)
            ));
        }
        ctx.echo("</table>\n<p><a href=\"/upload\">上传文件</a></p>\n");
        Ok(())
    }
}

/// 上传页面。允许的类型默认为图片、PDF 与纯文本。
#[derive(Debug)]
pub struct UploadPage {
    allowed_file_types: Vec<String>,
}

impl Default for UploadPage {
    fn default() -> Self {
        Self {
            allowed_file_types: vec!["image/*".to_string(), "pdf".to_string(), "txt".to_string()],
        }
    }
}

impl UploadPage {
    fn handle_upload(&self, ctx: &mut PageContext<'_>) {
        let request = ctx.request();
        let config = ctx.config();
        let mut handler = UploadHandler::new(request.files().to_vec(), config.upload());
        handler
            .set_check_size_limit(true)
            .set_check_file_exists(true)
            .set_check_file_type(true)
            .set_allowed_file_types(self.allowed_file_types.iter().cloned());

        match handler
            .upload_check()
            .and_then(|()| handler.place_uploaded_file())
        {
            Ok(()) => {
                info!("[ID{}]{}个文件上传成功", request.id(), handler.num_of_files());
                ctx.set_status(201);
                ctx.echo("<ul class=\"uploaded\">\n");
                for file in handler.files() {
                    ctx.echo(&format!(
                        "<li>{} ({})</li>\n",
                        escape_html(&file.new_name),
                        format_file_size(file.size)
                    ));
                }
                ctx.echo("</ul>\n");
            }
            Err(Exception::NoFilesSelected) => {
                ctx.set_status(400);
                ctx.echo("<p class=\"error\">No files selected</p>\n");
            }
            Err(e) => {
                warn!("[ID{}]上传失败：{}", request.id(), e);
                let reason = handler
                    .upload_failed_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                ctx.set_status(422);
                ctx.echo(&format!("<p class=\"error\">{}</p>\n", escape_html(&reason)));
            }
        }
    }
}

impl PageHandler for UploadPage {
    fn construct_page(&mut self, ctx: &mut PageContext<'_>) -> Result<(), Exception> {
        let config = ctx.config();
        let request = ctx.request();

        ctx.echo("<h1>上传文件</h1>\n");
        if config.http_method() == Some(HttpMethod::Post) {
            self.handle_upload(ctx);
        }

        let save_path = config.upload().save_path.to_string_lossy().to_string();
        ctx.echo(&format!(
            "<p>文件将保存到 <code>{}/</code>，单个文件不超过 {}。</p>\n",
            escape_html(remove_trailing_chars(&save_path, '/')),
            format_file_size(config.upload().max_upload_size)
        ));
        ctx.echo(&format!(
            "<form method=\"post\" enctype=\"multipart/form-data\">\n{}\n<input type=\"file\" name=\"files\" multiple>\n<button type=\"submit\">上传</button>\n</form>\n",
            token_input(request.token().unwrap_or_default())
        ));
        Ok(())
    }
}
