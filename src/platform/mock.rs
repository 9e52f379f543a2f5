//! 测试用的脚本化窗口

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle, WebDisplayHandle, WebWindowHandle};

use super::window::{SharedWindow, SurfaceHandles, WindowEvent, WindowProvider, WindowSystem};
use crate::core::config::WindowConfig;
use crate::core::error::WindowError;

/// 脚本化窗口
///
/// 每次泵事件应用一个预设尺寸，可在指定次数后发出关闭请求。
pub struct MockWindow {
    pub size: (u32, u32),
    pub title: String,
    pub fullscreen: bool,
    pub pump_calls: u32,
    /// 带非零超时（即允许阻塞）的泵事件次数
    pub blocking_pumps: u32,
    /// 每次泵事件额外耗费的时间，模拟缓慢的事件轮询
    pub pump_delay: Duration,
    scheduled_sizes: VecDeque<(u32, u32)>,
    close_after: Option<u32>,
    close_requested: bool,
    events: VecDeque<WindowEvent>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            title: String::new(),
            fullscreen: false,
            pump_calls: 0,
            blocking_pumps: 0,
            pump_delay: Duration::ZERO,
            scheduled_sizes: VecDeque::new(),
            close_after: None,
            close_requested: false,
            events: VecDeque::new(),
        }
    }

    /// 之后每次泵事件依次应用一个尺寸
    pub fn schedule_sizes(&mut self, sizes: impl IntoIterator<Item = (u32, u32)>) {
        self.scheduled_sizes.extend(sizes);
    }

    /// 第 `pumps` 次泵事件时发出关闭请求
    pub fn close_after_pumps(&mut self, pumps: u32) {
        self.close_after = Some(pumps);
    }

    /// 模拟用户拖动窗口边框
    pub fn push_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.events.push_back(WindowEvent::Resized { width, height });
    }
}

impl WindowSystem for MockWindow {
    fn pump_events(&mut self, timeout: Option<Duration>) {
        self.pump_calls += 1;
        if !self.pump_delay.is_zero() {
            std::thread::sleep(self.pump_delay);
        }
        if timeout != Some(Duration::ZERO) {
            self.blocking_pumps += 1;
        }
        if let Some((width, height)) = self.scheduled_sizes.pop_front() {
            if (width, height) != self.size {
                self.push_resize(width, height);
            }
        }
        if self.close_after == Some(self.pump_calls) {
            self.close_requested = true;
            self.events.push_back(WindowEvent::CloseRequested);
        }
    }

    fn drain_events(&mut self) -> Vec<WindowEvent> {
        self.events.drain(..).collect()
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.push_resize(width, height);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    fn surface_handles(&self) -> Result<SurfaceHandles, WindowError> {
        Ok(SurfaceHandles {
            window: RawWindowHandle::Web(WebWindowHandle::new(1)),
            display: RawDisplayHandle::Web(WebDisplayHandle::new()),
        })
    }
}

/// 总是返回同一个脚本化窗口的工厂
pub struct MockPlatform {
    pub window: Rc<RefCell<MockWindow>>,
    pub fail: bool,
    pub created: u32,
}

impl MockPlatform {
    pub fn new(window: MockWindow) -> Self {
        Self {
            window: Rc::new(RefCell::new(window)),
            fail: false,
            created: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(MockWindow::new(1, 1))
        }
    }
}

impl WindowProvider for MockPlatform {
    fn create_window(&mut self, config: &WindowConfig) -> Result<SharedWindow, WindowError> {
        if self.fail {
            return Err(WindowError::Creation("mock window creation failure".to_string()));
        }
        self.created += 1;
        self.window.borrow_mut().title = config.title.clone();
        let shared: SharedWindow = self.window.clone();
        Ok(shared)
    }
}
