use serde_derive::{Deserialize, Serialize};

use log::{error, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use crate::{
    exception::Exception,
    param::{AppMode, HttpMethod, RouteKind},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    environment: AppMode,
    #[serde(default)]
    meta: MetaConfig,
    #[serde(default)]
    static_routes: HashMap<String, String>,
    #[serde(default)]
    upload: UploadConfig,
    #[serde(skip)]
    published: RouteState,
}

/// 页面头部使用的站点元信息
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetaConfig {
    #[serde(default = "default_page_title")]
    pub page_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_site_language")]
    pub site_language: String,
    #[serde(default)]
    pub block_robots: bool,
    #[serde(default)]
    pub favicon: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
    #[serde(default = "default_tmp_path")]
    pub tmp_path: PathBuf,
    /// 单个文件允许的最大字节数，开启大小检查时生效
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// 服务器接受的单个文件上限，超出的文件被标记为 `UPLOAD_ERR_INI_SIZE`
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// 服务器接受的请求体上限，超出时直接返回 413
    #[serde(default = "default_max_request_size")]
    pub max_request_size: u64,
}

/// 路由器在构造时发布的当前页面
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrentPage {
    pub page: String,
    pub subpage: Option<String>,
    pub tab: Option<String>,
}

/// 路由器发布到配置中的请求级状态。每个请求使用独立的配置副本。
#[derive(Debug, Clone, Default)]
struct RouteState {
    route: Option<RouteKind>,
    http_method: Option<HttpMethod>,
    current_page: Option<CurrentPage>,
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

fn default_page_title() -> String {
    "webframe".to_string()
}

fn default_site_language() -> String {
    "en".to_string()
}

fn default_save_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_tmp_path() -> PathBuf {
    std::env::temp_dir().join("webframe")
}

fn default_max_upload_size() -> u64 {
    2097152 // 2MB
}

fn default_max_file_size() -> u64 {
    8388608 // 8MB
}

fn default_max_request_size() -> u64 {
    16777216 // 16MB
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            page_title: default_page_title(),
            description: String::new(),
            site_language: default_site_language(),
            block_robots: false,
            favicon: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            save_path: default_save_path(),
            tmp_path: default_tmp_path(),
            max_upload_size: default_max_upload_size(),
            max_file_size: default_max_file_size(),
            max_request_size: default_max_request_size(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: default_port(),
            worker_threads: num_cpus::get(),
            local: default_local(),
            environment: AppMode::Development,
            meta: MetaConfig::default(),
            static_routes: HashMap::new(),
            upload: UploadConfig::default(),
            published: RouteState::default(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                error!("无法打开配置文件{}：{}", filename, e);
                return Err(Exception::ConfigNotFound);
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}失败：{}", filename, e);
            return Err(Exception::ConfigNotFound);
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Exception> {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}", e);
                return Err(Exception::ConfigParseFailed);
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.upload.max_upload_size > raw_config.upload.max_file_size {
            warn!(
                "max_upload_size({})大于max_file_size({})，超出服务器上限的文件在到达校验之前就会被标记为错误。",
                raw_config.upload.max_upload_size, raw_config.upload.max_file_size
            );
        }
        for (path, target) in raw_config.static_routes.iter() {
            if !path.starts_with('/') {
                warn!("静态路由{} -> {}不以'/'开头，永远不会被匹配", path, target);
            }
        }
        Ok(raw_config)
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn environment(&self) -> AppMode {
        self.environment
    }

    pub fn meta(&self) -> &MetaConfig {
        &self.meta
    }

    pub fn static_routes(&self) -> &HashMap<String, String> {
        &self.static_routes
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.upload
    }

    pub fn set_environment(&mut self, environment: AppMode) -> &mut Self {
        self.environment = environment;
        self
    }

    pub fn add_static_route(&mut self, path: &str, identifier: &str) -> &mut Self {
        self.static_routes
            .insert(path.to_string(), identifier.to_string());
        self
    }

    pub fn meta_mut(&mut self) -> &mut MetaConfig {
        &mut self.meta
    }

    pub fn upload_mut(&mut self) -> &mut UploadConfig {
        &mut self.upload
    }
}

// --- 路由状态发布 ---

impl Config {
    pub fn publish_route(&mut self, route: RouteKind) {
        self.published.route = Some(route);
    }

    pub fn publish_http_method(&mut self, method: HttpMethod) {
        self.published.http_method = Some(method);
    }

    pub fn publish_current_page(&mut self, current_page: CurrentPage) {
        self.published.current_page = Some(current_page);
    }

    pub fn route(&self) -> Option<RouteKind> {
        self.published.route
    }

    pub fn http_method(&self) -> Option<HttpMethod> {
        self.published.http_method
    }

    pub fn current_page(&self) -> Option<&CurrentPage> {
        self.published.current_page.as_ref()
    }
}
