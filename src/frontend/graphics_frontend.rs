//! 图形前端控制器
//!
//! # 状态机
//!
//! ```text
//! Uninitialized ─► Initializing ─► Running ⇄ Paused
//!                        │            │        │
//!                        ▼            ▼        ▼
//!                   ErrorState    ShuttingDown ─► Uninitialized
//! ```
//!
//! 任何一步失败都会进入 `ErrorState`，此后只有 `shutdown` 有意义。

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::handle::FrontendHandle;
use crate::core::config::{GraphicsApi, GraphicsConfig};
use crate::core::time::{limit_frame_rate, FrameStats, FrameTimer};
use crate::gfx::{self, FrameStatus, GraphicsBackend, RenderStats};
use crate::platform::{SharedWindow, WindowEvent, WindowProvider};

/// 根据图形 API 创建后端，无法创建时返回 `None`
pub type BackendFactory = Box<dyn Fn(GraphicsApi) -> Option<Box<dyn GraphicsBackend>>>;

type UpdateCallback = Box<dyn FnMut(f32)>;
type RenderCallback = Box<dyn FnMut()>;
type ResizeCallback = Box<dyn FnMut(u32, u32)>;
type InputCallback = Box<dyn FnMut()>;

/// 前端生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendState {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    ShuttingDown,
    ErrorState,
}

impl fmt::Display for FrontendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrontendState::Uninitialized => "UNINITIALIZED",
            FrontendState::Initializing => "INITIALIZING",
            FrontendState::Running => "RUNNING",
            FrontendState::Paused => "PAUSED",
            FrontendState::ShuttingDown => "SHUTTING_DOWN",
            FrontendState::ErrorState => "ERROR_STATE",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct Callbacks {
    update: Option<UpdateCallback>,
    render: Option<RenderCallback>,
    resize: Option<ResizeCallback>,
    input: Option<InputCallback>,
}

/// 图形前端
///
/// 整个帧生命周期运行在创建它的线程上。
pub struct GraphicsFrontend {
    config: GraphicsConfig,
    state: FrontendState,
    platform: Box<dyn WindowProvider>,
    backend_factory: BackendFactory,
    window: Option<SharedWindow>,
    backend: Option<Box<dyn GraphicsBackend>>,
    timer: FrameTimer,
    handle: FrontendHandle,
    callbacks: Callbacks,
    pending_resize: Option<(u32, u32)>,
    should_close: bool,
}

impl GraphicsFrontend {
    /// 创建前端
    ///
    /// # 参数
    ///
    /// * `config` - 图形配置，按 setter 的规则夹取后保存
    /// * `platform` - 窗口工厂
    pub fn new(config: GraphicsConfig, platform: Box<dyn WindowProvider>) -> Self {
        let mut config = config;
        config.sanitize();
        info!(api = %config.render.api, "GraphicsFrontend created");

        Self {
            config,
            state: FrontendState::Uninitialized,
            platform,
            backend_factory: Box::new(|api| Some(gfx::create_backend(api))),
            window: None,
            backend: None,
            timer: FrameTimer::new(),
            handle: FrontendHandle::new(),
            callbacks: Callbacks::default(),
            pending_resize: None,
            should_close: false,
        }
    }

    /// 替换后端工厂
    pub fn with_backend_factory(mut self, factory: BackendFactory) -> Self {
        self.backend_factory = factory;
        self
    }

    fn set_state(&mut self, state: FrontendState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Frontend state change");
            self.state = state;
        }
    }

    /// 创建窗口并初始化后端
    ///
    /// 已处于运行或暂停状态时直接返回 `true`。
    /// 窗口创建、后端创建或后端初始化失败时进入 `ErrorState` 并返回 `false`。
    pub fn initialize(&mut self) -> bool {
        if self.state != FrontendState::Uninitialized {
            warn!(state = %self.state, "GraphicsFrontend already initialized or in invalid state");
            return matches!(self.state, FrontendState::Running | FrontendState::Paused);
        }

        self.set_state(FrontendState::Initializing);
        info!("Initializing GraphicsFrontend");

        let window = match self.platform.create_window(&self.config.window) {
            Ok(window) => window,
            Err(e) => {
                error!(error = %e, "Failed to create window");
                self.set_state(FrontendState::ErrorState);
                return false;
            }
        };
        self.window = Some(window.clone());

        let Some(mut backend) = (self.backend_factory)(self.config.render.api) else {
            error!(api = %self.config.render.api, "Failed to create graphics backend");
            self.set_state(FrontendState::ErrorState);
            return false;
        };

        if let Err(e) = backend.initialize(&self.config, window) {
            error!(error = %e, api = backend.api_name(), "Failed to initialize graphics backend");
            self.set_state(FrontendState::ErrorState);
            return false;
        }
        info!(api = backend.api_name(), "Graphics backend initialized");
        self.backend = Some(backend);

        self.timer = FrameTimer::new();
        self.should_close = false;
        self.pending_resize = None;
        self.set_state(FrontendState::Running);
        info!(backend = %self.backend_info(), "GraphicsFrontend initialized");
        true
    }

    /// 运行帧循环，直到收到关闭请求或离开运行状态
    pub fn run(&mut self) {
        if self.state != FrontendState::Running {
            error!(state = %self.state, "Cannot run GraphicsFrontend - not in running state");
            return;
        }

        info!("Starting main loop");
        while self.run_frame() {}
        info!(frames = self.timer.stats().frame_count, "Main loop ended");
    }

    /// 执行一次循环迭代，返回是否应继续循环
    pub fn run_frame(&mut self) -> bool {
        if !matches!(self.state, FrontendState::Running | FrontendState::Paused) {
            return false;
        }
        // 限帧从迭代开始计时，事件轮询的耗时也计入帧预算
        let iteration_start = Instant::now();

        self.apply_requests();
        if self.close_requested() {
            return false;
        }

        self.process_events();
        if self.close_requested() {
            return false;
        }

        let dt = self.timer.tick();
        self.forward_resize();

        if self.state == FrontendState::Running {
            if let Some(update) = self.callbacks.update.as_mut() {
                update(dt);
            }
            self.render();
        }

        if !self.config.vsync() && self.config.performance.target_fps > 0 {
            limit_frame_rate(iteration_start, self.config.performance.target_fps);
        }

        self.state == FrontendState::Running
    }

    fn apply_requests(&mut self) {
        let requests = self.handle.take();
        if requests.shutdown && !self.should_close {
            info!("Shutdown requested");
            self.should_close = true;
        }
        if requests.pause {
            self.pause();
        }
        if requests.resume {
            self.resume();
        }
    }

    fn close_requested(&self) -> bool {
        self.should_close
            || self
                .window
                .as_ref()
                .map_or(false, |window| window.borrow().close_requested())
    }

    fn process_events(&mut self) {
        if let Some(window) = self.window.as_ref() {
            let events = {
                let mut window = window.borrow_mut();
                window.pump_events(Some(Duration::ZERO));
                window.drain_events()
            };

            for event in events {
                match event {
                    WindowEvent::Resized { width, height } => {
                        self.pending_resize = Some((width, height));
                    }
                    WindowEvent::CloseRequested => {
                        info!("Window close requested");
                        self.should_close = true;
                    }
                    WindowEvent::Focused(focused) => debug!(focused, "Window focus changed"),
                }
            }
        }

        if let Some(input) = self.callbacks.input.as_mut() {
            input();
        }
    }

    fn forward_resize(&mut self) {
        let Some((width, height)) = self.pending_resize.take() else {
            return;
        };
        debug!(width, height, "Window resized");
        if let Some(backend) = self.backend.as_mut() {
            backend.handle_resize(width, height);
        }
        if let Some(resize) = self.callbacks.resize.as_mut() {
            resize(width, height);
        }
    }

    fn render(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        match backend.begin_frame() {
            Ok(FrameStatus::Recording) => {
                if let Some(render) = self.callbacks.render.as_mut() {
                    render();
                }
                if let Err(e) = backend.end_frame() {
                    error!(error = %e, "Failed to end frame");
                } else if let Err(e) = backend.present() {
                    error!(error = %e, "Failed to present frame");
                }
            }
            Ok(FrameStatus::Skipped) => debug!("Frame skipped after swapchain recreation"),
            Err(e) => error!(error = %e, "Failed to begin frame"),
        }

        if backend.is_device_lost() {
            error!("Graphics device lost, frontend entering error state");
            self.set_state(FrontendState::ErrorState);
        }
    }

    /// 释放后端和窗口，回到 `Uninitialized`；可以重复调用
    pub fn shutdown(&mut self) {
        if self.state == FrontendState::Uninitialized {
            return;
        }

        self.set_state(FrontendState::ShuttingDown);
        info!("Shutting down GraphicsFrontend");

        if let Some(mut backend) = self.backend.take() {
            backend.shutdown();
        }
        self.window = None;
        self.pending_resize = None;
        self.should_close = false;
        self.handle.clear();

        self.set_state(FrontendState::Uninitialized);
        info!("GraphicsFrontend shutdown complete");
    }

    pub fn pause(&mut self) {
        if self.state == FrontendState::Running {
            self.set_state(FrontendState::Paused);
            info!("GraphicsFrontend paused");
        }
    }

    /// 从暂停恢复，重置帧间隔的时间基准
    pub fn resume(&mut self) {
        if self.state == FrontendState::Paused {
            self.set_state(FrontendState::Running);
            self.timer.reset_baseline();
            info!("GraphicsFrontend resumed");
        }
    }

    /// 请求在下一次迭代开始时结束循环
    pub fn request_shutdown(&self) {
        self.handle.request_shutdown();
    }

    pub fn state(&self) -> FrontendState {
        self.state
    }

    /// 供回调使用的控制句柄
    pub fn handle(&self) -> FrontendHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// 替换配置，下次初始化时生效
    pub fn set_config(&mut self, config: GraphicsConfig) {
        self.config = config;
        self.config.sanitize();
        info!("Graphics configuration updated");
    }

    pub fn frame_stats(&self) -> &FrameStats {
        self.timer.stats()
    }

    /// 后端渲染统计，没有后端时为默认值
    pub fn render_stats(&self) -> RenderStats {
        self.backend
            .as_ref()
            .map(|backend| backend.render_stats())
            .unwrap_or_default()
    }

    /// 形如 `"Vulkan - <设备名> (Driver: <版本>)"` 的描述
    pub fn backend_info(&self) -> String {
        match self.backend.as_ref() {
            Some(backend) => format!(
                "{} - {} (Driver: {})",
                backend.api_name(),
                backend.device_name(),
                backend.driver_version()
            ),
            None => "No backend".to_string(),
        }
    }

    pub fn backend(&self) -> Option<&dyn GraphicsBackend> {
        self.backend.as_deref()
    }

    pub fn set_update_callback(&mut self, callback: impl FnMut(f32) + 'static) {
        self.callbacks.update = Some(Box::new(callback));
    }

    pub fn set_render_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.render = Some(Box::new(callback));
    }

    pub fn set_resize_callback(&mut self, callback: impl FnMut(u32, u32) + 'static) {
        self.callbacks.resize = Some(Box::new(callback));
    }

    pub fn set_input_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.input = Some(Box::new(callback));
    }

    pub fn set_window_title(&mut self, title: &str) {
        self.config.set_window_title(title);
        if let Some(window) = self.window.as_ref() {
            window.borrow_mut().set_title(&self.config.window.title);
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.config.set_window_size(width, height);
        if let Some(window) = self.window.as_ref() {
            window
                .borrow_mut()
                .set_size(self.config.window.width, self.config.window.height);
        }
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.config.set_fullscreen(fullscreen);
        if let Some(window) = self.window.as_ref() {
            window.borrow_mut().set_fullscreen(fullscreen);
        }
        info!(fullscreen, "Fullscreen mode changed");
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.config.set_target_fps(fps);
        info!(target_fps = self.config.performance.target_fps, "Target FPS set");
    }

    /// 开关垂直同步；呈现模式在下次创建后端时生效，限帧立即生效
    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.set_vsync(enabled);
        info!(vsync = enabled, "VSync changed");
    }
}

impl Drop for GraphicsFrontend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
