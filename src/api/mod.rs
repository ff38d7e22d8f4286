pub mod client;
pub mod cookies;
pub mod service;
pub mod types;

pub use client::{ApiRequest, HttpClient};
pub use cookies::{get_cookie, SessionCookies};
pub use service::ApiService;
