//! 핵심 계산 로직을 라이브러리로 분리하여 CLI와 HTTP 서버가 함께 쓴다.

pub mod app;
pub mod config;
pub mod db;
pub mod export;
pub mod history;
pub mod logging;
pub mod process;
pub mod properties;
pub mod server;
pub mod service;
pub mod ui_cli;
pub mod units;
