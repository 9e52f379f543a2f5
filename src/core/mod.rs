//! 核心功能模块
//!
//! 与具体图形 API 无关的基础设施：配置、错误、日志和帧计时。
//!
//! - `config`：配置管理，支持从 TOML 文件加载并夹取到合法范围
//! - `error`：统一的错误类型，包括后端错误分类 `BackendError`
//! - `log`：基于 `tracing` 的日志系统
//! - `time`：帧计时与帧统计

pub mod config;
pub mod error;
pub mod log;
pub mod time;

pub use config::{EngineConfig, GraphicsApi, GraphicsConfig, PresentMode};
pub use error::{BackendError, BackendResult, LumiosError, Result};
pub use time::{FrameStats, FrameTimer};
