//! 基于 winit 的窗口实现
//!
//! 使用 `pump_events` 让主循环保持在引擎手中：
//! 前端每帧以零超时泵一次事件，后端等待最小化窗口时以短超时阻塞泵事件。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent as WinitWindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::window::{SharedWindow, SurfaceHandles, WindowEvent, WindowProvider, WindowSystem};
use crate::core::config::WindowConfig;
use crate::core::error::WindowError;

/// winit 窗口工厂
///
/// 事件循环在进程内只能创建一次，因此由工厂持有并在所有窗口间共享。
#[derive(Default)]
pub struct WinitPlatform {
    event_loop: Option<Rc<RefCell<EventLoop<()>>>>,
}

impl WinitPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn event_loop(&mut self) -> Result<Rc<RefCell<EventLoop<()>>>, WindowError> {
        if let Some(event_loop) = &self.event_loop {
            return Ok(event_loop.clone());
        }
        let event_loop = EventLoop::new().map_err(|e| WindowError::EventLoop(e.to_string()))?;
        let event_loop = Rc::new(RefCell::new(event_loop));
        self.event_loop = Some(event_loop.clone());
        Ok(event_loop)
    }
}

impl WindowProvider for WinitPlatform {
    fn create_window(&mut self, config: &WindowConfig) -> Result<SharedWindow, WindowError> {
        let event_loop = self.event_loop()?;

        let mut builder = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width.max(1), config.height.max(1)))
            .with_resizable(config.resizable)
            .with_decorations(config.decorated)
            .with_maximized(config.maximized);
        if config.fullscreen {
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = builder
            .build(&*event_loop.borrow())
            .map_err(|e| WindowError::Creation(e.to_string()))?;

        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            title = %config.title,
            "Window created"
        );

        let window: SharedWindow = Rc::new(RefCell::new(WinitWindow {
            event_loop,
            window,
            events: VecDeque::new(),
            close_requested: false,
        }));
        Ok(window)
    }
}

/// winit 窗口
pub struct WinitWindow {
    event_loop: Rc<RefCell<EventLoop<()>>>,
    window: Window,
    events: VecDeque<WindowEvent>,
    close_requested: bool,
}

impl WindowSystem for WinitWindow {
    fn pump_events(&mut self, timeout: Option<Duration>) {
        let window_id = self.window.id();
        let events = &mut self.events;
        let close_requested = &mut self.close_requested;

        let status = self
            .event_loop
            .borrow_mut()
            .pump_events(timeout, |event, _target| {
                let Event::WindowEvent { window_id: id, event } = event else {
                    return;
                };
                if id != window_id {
                    return;
                }
                match event {
                    WinitWindowEvent::Resized(size) => events.push_back(WindowEvent::Resized {
                        width: size.width,
                        height: size.height,
                    }),
                    WinitWindowEvent::CloseRequested => {
                        *close_requested = true;
                        events.push_back(WindowEvent::CloseRequested);
                    }
                    WinitWindowEvent::Focused(focused) => {
                        events.push_back(WindowEvent::Focused(focused))
                    }
                    _ => {}
                }
            });

        if let PumpStatus::Exit(code) = status {
            debug!(code, "Event loop exited");
            self.close_requested = true;
        }
    }

    fn drain_events(&mut self) -> Vec<WindowEvent> {
        self.events.drain(..).collect()
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        // 实际尺寸以随后的 Resized 事件为准
        let _ = self.window.request_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }

    fn surface_handles(&self) -> Result<SurfaceHandles, WindowError> {
        let window = self
            .window
            .window_handle()
            .map_err(|e| WindowError::Handle(e.to_string()))?
            .as_raw();
        let display = self
            .window
            .display_handle()
            .map_err(|e| WindowError::Handle(e.to_string()))?
            .as_raw();
        Ok(SurfaceHandles { window, display })
    }
}
