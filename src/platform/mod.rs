//! 平台层
//!
//! 窗口系统能力的抽象（[`WindowSystem`]）及其 winit 实现。

pub mod window;
pub mod winit_window;

#[cfg(test)]
pub(crate) mod mock;

pub use self::window::{
    wait_for_nonzero_framebuffer, SharedWindow, SurfaceHandles, WindowEvent, WindowProvider,
    WindowSystem,
};
pub use self::winit_window::WinitPlatform;
