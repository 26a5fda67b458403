pub mod array_tool;
pub mod config;
pub mod cookie;
pub mod exception;
pub mod injector;
pub mod layout;
pub mod page;
pub mod pages;
pub mod param;
pub mod request;
pub mod response;
pub mod router;
pub mod upload;
pub mod util;

pub use array_tool::{ArrayKey, ArrayTool};
pub use config::Config;
pub use cookie::{Cookie, CookieJar};
pub use exception::Exception;
pub use injector::HtmlInjector;
pub use layout::Layout;
pub use page::{ErrorPage, PageContext, PageHandler, PageRegistry, RenderedPage};
pub use param::{AppMode, HttpEncoding, HttpMethod, HttpVersion, PagePosition, RouteKind};
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use upload::{RawUpload, UploadHandler, UploadedFile};
