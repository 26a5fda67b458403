// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # webframe 服务端
//!
//! 基于 Tokio 运行时的页面服务器，把每个连接交给路由器处理。
//! 核心功能包括：
//! - 读取请求头与按 `Content-Length` 读取请求体，超出上限时直接返回 413
//! - multipart 上传落盘，交由上传页面校验与转存
//! - 每个请求使用独立的配置副本，路由器发布的状态不会跨请求泄漏
//! - 后台管理控制台（CLI 指令交互）
//! - `webframe cli` 以命令行模式执行一次路由

use webframe::{
    config::Config,
    page::PageRegistry,
    pages::register_builtin_pages,
    request::Request,
    response::Response,
    router::Router,
};

use log::{debug, error, info, warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
    sync::Notify,
};

use std::{
    fs,
    net::{Ipv4Addr, SocketAddrV4},
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Instant,
};

const CONFIG_PATH: &str = "config/development.toml";
const LOG_CONFIG_PATH: &str = "config/log4rs.yaml";
/// 请求头的最大长度
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// # 程序入口点
///
/// 初始化日志、加载配置、注册页面，然后进入命令行模式或启动服务器。
fn main() {
    // 1. 日志：优先使用外部 YAML，缺失时退回到控制台输出
    init_logging();

    // 2. 配置：配置文件缺失或无法解析时使用默认配置
    let config = match Config::from_toml(CONFIG_PATH) {
        Ok(config) => {
            info!("配置文件已载入");
            config
        }
        Err(e) => {
            warn!("{}：{}，使用默认配置", CONFIG_PATH, e);
            Config::new()
        }
    };

    // 3. 页面注册
    let mut pages = PageRegistry::new();
    register_builtin_pages(&mut pages);
    info!("已注册{}个页面", pages.len());

    if std::env::args().nth(1).as_deref() == Some("cli") {
        run_cli(config, &pages);
        return;
    }

    // 4. 异步运行时：按配置分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            return;
        }
    };
    runtime.block_on(serve(Arc::new(config), Arc::new(pages)));
}

fn init_logging() {
    if let Err(e) = log4rs::init_file(LOG_CONFIG_PATH, Default::default()) {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
            )))
            .build();
        let fallback = log4rs::config::Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info));
        match fallback {
            Ok(config) => {
                if log4rs::init_config(config).is_ok() {
                    warn!("无法读取{}：{}，日志输出到控制台", LOG_CONFIG_PATH, e);
                }
            }
            Err(e) => eprintln!("无法初始化日志系统：{}", e),
        }
    }
}

/// 以命令行模式执行一次路由。
fn run_cli(mut config: Config, pages: &PageRegistry) {
    let mut router = Router::new(Request::cli(), &mut config);
    let rendered = router.route(pages, &config);
    info!("命令行路由完成，类型：{}，产生页面：{}", router.kind(), rendered.is_some());
}

async fn serve(config: Arc<Config>, pages: Arc<PageRegistry>) {
    // 网络层初始化：支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, port);
    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("服务端在{}上监听Socket连接，运行环境：{}", socket, config.environment());

    // 服务器状态：停机通知与活跃连接计数
    let shutdown = Arc::new(Notify::new());
    let stopping = Arc::new(AtomicBool::new(false));
    let active_connection = Arc::new(AtomicU32::new(0));

    tokio::spawn(admin_console(
        Arc::clone(&shutdown),
        Arc::clone(&stopping),
        Arc::clone(&active_connection),
        Arc::clone(&config),
        Arc::clone(&pages),
    ));

    let mut id: u128 = 0;

    // 主事件循环：持续接收新连接并分发到线程池
    loop {
        let (mut stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            },
            _ = shutdown.notified() => {
                info!("主循环接收到停机指令，正在退出...");
                break;
            }
        };
        if stopping.load(Ordering::SeqCst) {
            break;
        }
        debug!("[ID{}]新的连接：{}", id, addr);

        let active_connection = Arc::clone(&active_connection);
        let config = Arc::clone(&config);
        let pages = Arc::clone(&pages);
        tokio::spawn(async move {
            active_connection.fetch_add(1, Ordering::SeqCst);
            handle_connection(&mut stream, id, config, pages).await;
            active_connection.fetch_sub(1, Ordering::SeqCst);
        });
        id += 1;
    }
}

/// 后台管理控制台，提供运维指令支持。
async fn admin_console(
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    active_connection: Arc<AtomicU32>,
    config: Arc<Config>,
    pages: Arc<PageRegistry>,
) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                stopping.store(true, Ordering::SeqCst);
                shutdown.notify_one();
                println!("停机指令已激活，服务器将停止接收新连接...");
                break;
            }
            "status" => {
                println!("== webframe 状态 ===");
                println!("当前活跃连接数: {}", active_connection.load(Ordering::SeqCst));
                println!("运行环境: {}", config.environment());
                println!("====================");
            }
            "routes" => {
                println!("== 静态路由 ========");
                let mut routes: Vec<_> = config.static_routes().iter().collect();
                routes.sort();
                for (path, target) in routes {
                    println!("{} -> {}", path, target);
                }
                println!("== 已注册页面 ======");
                for identifier in pages.identifiers() {
                    println!("{}", identifier);
                }
                println!("====================");
            }
            "help" => {
                println!("== webframe Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("routes - 列出静态路由与已注册页面");
                println!("help   - 显示此帮助信息");
                println!("====================");
            }
            "" => {}
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}

/// # 连接处理器
///
/// 读取并解析请求，交给路由器渲染页面，然后发送响应。
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    config: Arc<Config>,
    pages: Arc<PageRegistry>,
) {
    let start_time = Instant::now();

    // 1. 读取请求头
    let mut buffer: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = vec![0u8; 4096];
    let head_end = loop {
        if let Some(i) = find_head_end(&buffer) {
            break i;
        }
        if buffer.len() > MAX_HEAD_SIZE {
            warn!("[ID{}]请求头过长，返回400", id);
            send(stream, id, &Response::response_400(&Request::new("GET", "/"))).await;
            return;
        }
        match stream.read(&mut chunk).await {
            Ok(0) => {
                debug!("[ID{}]客户端关闭了连接", id);
                return;
            }
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return;
            }
        }
    };

    // 2. 按 Content-Length 读取请求体，超出上限直接拒绝
    let content_length = content_length(&buffer[..head_end]);
    if content_length > config.upload().max_request_size {
        warn!(
            "[ID{}]请求体{}字节超过上限{}字节，返回413",
            id,
            content_length,
            config.upload().max_request_size
        );
        let head = Request::try_from(&buffer[..head_end], id).unwrap_or_else(|_| Request::new("GET", "/"));
        send(stream, id, &Response::response_413(&head)).await;
        return;
    }
    let total = head_end + 4 + content_length as usize;
    while buffer.len() < total {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取请求体时遇到错误: {}", id, e);
                return;
            }
        }
    }
    debug!("[ID{}]HTTP请求接收完毕，共{}字节", id, buffer.len());

    // 3. 协议解析：将字节流转换为结构化的 Request 对象
    let mut request = match Request::try_from(&buffer, id) {
        Ok(request) => request,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}，返回400", id, e);
            send(stream, id, &Response::response_400(&Request::new("GET", "/"))).await;
            return;
        }
    };
    request.spill_uploads(&config.upload().tmp_path, config.upload().max_file_size);

    // 4. 路由：每个请求使用独立的配置副本
    let mut config = (*config).clone();
    let mut router = Router::new(request, &mut config);
    let rendered = router.route(&pages, &config);
    let request = router.request();
    let response = match rendered {
        Some(page) => Response::from_page(&page, request),
        None => Response::response_204(request),
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    // 5. 结构化日志记录
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, {}",
        id,
        request.version(),
        request.path(),
        request.method(),
        router.kind(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    send(stream, id, &response).await;

    // 6. 清理没有被转存的临时文件
    for file in request.files() {
        if file.tmp_name.exists() {
            if let Err(e) = fs::remove_file(&file.tmp_name) {
                warn!("[ID{}]无法删除临时文件{}：{}", id, file.tmp_name.display(), e);
            }
        }
    }
}

async fn send(stream: &mut TcpStream, id: u128, response: &Response) {
    let bytes = response.as_bytes();
    debug!("[ID{}]发送响应，长度: {}", id, bytes.len());
    if let Err(e) = stream.write_all(&bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// 从请求头中读取 `Content-Length`，缺失或无法解析时为 0。
fn content_length(head: &[u8]) -> u64 {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
