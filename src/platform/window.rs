//! 窗口系统抽象
//!
//! 渲染核心只需要窗口提供以下能力：
//! 帧缓冲尺寸、关闭请求、原生句柄（用于创建表面），以及调整大小和关闭事件。
//! 事件在窗口内部排队，由前端在每帧开始时取出；
//! 后端在等待最小化窗口恢复时泵出的事件也会留在队列中，不会丢失。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::core::config::WindowConfig;
use crate::core::error::WindowError;

/// 等待最小化窗口恢复时，每次阻塞泵事件的最长时间
pub const MINIMIZED_WAIT_SLICE: Duration = Duration::from_millis(16);

/// 窗口事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// 帧缓冲尺寸改变（物理像素）
    Resized { width: u32, height: u32 },
    /// 用户请求关闭窗口
    CloseRequested,
    /// 焦点变化
    Focused(bool),
}

/// 创建 Vulkan 表面所需的原生句柄
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHandles {
    pub window: RawWindowHandle,
    pub display: RawDisplayHandle,
}

/// 窗口能力
pub trait WindowSystem {
    /// 泵出系统事件并加入内部队列
    ///
    /// `timeout` 为 `Some(Duration::ZERO)` 时不阻塞；
    /// 其他值最多阻塞该时长等待事件；`None` 阻塞直到有事件到达。
    fn pump_events(&mut self, timeout: Option<Duration>);

    /// 取出所有排队的事件
    fn drain_events(&mut self) -> Vec<WindowEvent>;

    /// 当前帧缓冲尺寸（物理像素），最小化时可能为 0
    fn framebuffer_size(&self) -> (u32, u32);

    /// 是否已收到关闭请求
    fn close_requested(&self) -> bool;

    fn set_title(&mut self, title: &str);

    fn set_size(&mut self, width: u32, height: u32);

    fn set_fullscreen(&mut self, fullscreen: bool);

    /// 原生窗口和显示句柄
    fn surface_handles(&self) -> Result<SurfaceHandles, WindowError>;
}

/// 前端与后端共享的窗口
///
/// 整个帧生命周期都在同一线程上，用 `Rc<RefCell<_>>` 共享即可。
pub type SharedWindow = Rc<RefCell<dyn WindowSystem>>;

/// 窗口工厂
pub trait WindowProvider {
    fn create_window(&mut self, config: &WindowConfig) -> Result<SharedWindow, WindowError>;
}

/// 阻塞直到帧缓冲尺寸非零
///
/// 返回非零尺寸；如果等待期间窗口收到关闭请求则返回 `None`。
pub fn wait_for_nonzero_framebuffer(window: &SharedWindow) -> Option<(u32, u32)> {
    loop {
        let (width, height) = window.borrow().framebuffer_size();
        if width > 0 && height > 0 {
            return Some((width, height));
        }
        if window.borrow().close_requested() {
            return None;
        }
        window.borrow_mut().pump_events(Some(MINIMIZED_WAIT_SLICE));
    }
}
