//! Lumios - 实时渲染前端
//!
//! Lumios 在统一的 `GraphicsBackend` 契约之上驱动帧生命周期，
//! 目前提供 Vulkan 后端和一个 DirectX 12 占位后端。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（配置、日志、错误处理、帧计时）
//! - `platform`: 窗口系统抽象及其 winit 实现
//! - `gfx`: 图形后端抽象层与具体后端
//! - `frontend`: 帧循环与生命周期状态机
//! - `engine`: 把宿主应用接到前端上
//!
//! # 使用示例
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use lumios::{Application, Engine, EngineConfig, FrontendHandle};
//!
//! struct Demo {
//!     frames: u32,
//!     handle: Option<FrontendHandle>,
//! }
//!
//! impl Application for Demo {
//!     fn initialize(&mut self, handle: &FrontendHandle) -> bool {
//!         self.handle = Some(handle.clone());
//!         true
//!     }
//!
//!     fn render(&mut self) {
//!         self.frames += 1;
//!         if self.frames == 100 {
//!             if let Some(handle) = self.handle.as_ref() {
//!                 handle.request_shutdown();
//!             }
//!         }
//!     }
//! }
//!
//! let config = EngineConfig::default();
//! let mut engine = Engine::new(&config);
//! engine
//!     .run(Rc::new(RefCell::new(Demo { frames: 0, handle: None })))
//!     .ok();
//! ```

pub mod core;
pub mod engine;
pub mod frontend;
pub mod gfx;
pub mod platform;

// 重新导出常用类型
pub use crate::core::config::{EngineConfig, GraphicsApi, GraphicsConfig, PresentMode};
pub use crate::core::error::{BackendError, LumiosError, Result};
pub use crate::engine::{Application, Engine};
pub use crate::frontend::{FrontendHandle, FrontendState, GraphicsFrontend};
pub use crate::gfx::{create_backend, FrameStatus, GraphicsBackend};
