//! 引擎与应用程序宿主
//!
//! [`Engine`] 拥有图形前端，把 [`Application`] 的钩子接到前端的四个回调上，
//! 负责应用和前端的初始化、运行与关闭顺序。

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::config::EngineConfig;
use crate::core::error::{BackendError, LumiosError, Result};
use crate::frontend::{FrontendHandle, FrontendState, GraphicsFrontend};
use crate::platform::WinitPlatform;
use crate::{engine_error, engine_info, engine_warn};

/// 宿主应用
///
/// 所有钩子都有空的默认实现。
pub trait Application {
    /// 前端初始化成功后调用，返回 `false` 中止运行
    ///
    /// `handle` 可以保存下来，在之后的回调中请求关闭、暂停或恢复。
    fn initialize(&mut self, _handle: &FrontendHandle) -> bool {
        true
    }

    /// 每帧更新，`dt` 为与上一帧的间隔（秒）
    fn update(&mut self, _dt: f32) {}

    /// 在 `begin_frame` 与 `end_frame` 之间调用
    fn render(&mut self) {}

    /// 每帧泵完窗口事件后调用
    fn on_input(&mut self) {}

    fn on_window_resize(&mut self, _width: u32, _height: u32) {}

    fn shutdown(&mut self) {}
}

/// 引擎
pub struct Engine {
    frontend: GraphicsFrontend,
}

impl Engine {
    /// 使用 winit 窗口创建引擎
    pub fn new(config: &EngineConfig) -> Self {
        let frontend = GraphicsFrontend::new(config.graphics.clone(), Box::new(WinitPlatform::new()));
        Self { frontend }
    }

    /// 使用已配置好的前端创建引擎
    pub fn with_frontend(frontend: GraphicsFrontend) -> Self {
        Self { frontend }
    }

    pub fn frontend(&self) -> &GraphicsFrontend {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut GraphicsFrontend {
        &mut self.frontend
    }

    /// 运行应用直到关闭
    ///
    /// # 返回值
    ///
    /// 前端或应用初始化失败时返回 `LumiosError::Initialization`；
    /// 运行中设备丢失时返回 `BackendError::DeviceLost`。
    pub fn run<A: Application + 'static>(&mut self, app: Rc<RefCell<A>>) -> Result<()> {
        if !self.frontend.initialize() {
            engine_error!(state = %self.frontend.state(), "Graphics frontend failed to initialize");
            self.frontend.shutdown();
            return Err(LumiosError::Initialization(
                "graphics frontend failed to initialize".to_string(),
            ));
        }
        self.wire_callbacks(&app);

        let handle = self.frontend.handle();
        if !app.borrow_mut().initialize(&handle) {
            engine_error!("Application failed to initialize");
            self.frontend.shutdown();
            return Err(LumiosError::Initialization("application failed to initialize".to_string()));
        }
        engine_info!(backend = %self.frontend.backend_info(), "Application initialized");

        self.frontend.run();
        let device_lost = self.frontend.state() == FrontendState::ErrorState;

        app.borrow_mut().shutdown();
        self.frontend.shutdown();
        engine_info!("Engine stopped");

        if device_lost {
            engine_warn!("Engine stopped after the graphics device was lost");
            Err(BackendError::DeviceLost.into())
        } else {
            Ok(())
        }
    }

    fn wire_callbacks<A: Application + 'static>(&mut self, app: &Rc<RefCell<A>>) {
        let target = app.clone();
        self.frontend
            .set_update_callback(move |dt| target.borrow_mut().update(dt));
        let target = app.clone();
        self.frontend.set_render_callback(move || target.borrow_mut().render());
        let target = app.clone();
        self.frontend
            .set_resize_callback(move |w, h| target.borrow_mut().on_window_resize(w, h));
        let target = app.clone();
        self.frontend.set_input_callback(move || target.borrow_mut().on_input());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GraphicsConfig;
    use crate::gfx::vulkan::mock::{MockStep, MockVulkan};
    use crate::gfx::{GraphicsBackend, VulkanBackend};
    use crate::platform::mock::{MockPlatform, MockWindow};

    #[derive(Default)]
    struct CountingApp {
        accept_init: bool,
        max_frames: u32,
        handle: Option<FrontendHandle>,
        updates: u32,
        renders: u32,
        shutdowns: u32,
        resizes: Vec<(u32, u32)>,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, handle: &FrontendHandle) -> bool {
            self.handle = Some(handle.clone());
            self.accept_init
        }

        fn update(&mut self, _dt: f32) {
            self.updates += 1;
        }

        fn render(&mut self) {
            self.renders += 1;
            if self.renders >= self.max_frames {
                if let Some(handle) = self.handle.as_ref() {
                    handle.request_shutdown();
                }
            }
        }

        fn on_window_resize(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }

        fn shutdown(&mut self) {
            self.shutdowns += 1;
        }
    }

    fn engine(window: MockWindow, fail_at: Option<MockStep>) -> Engine {
        let mut config = GraphicsConfig::default();
        config.set_validation(false);
        let frontend = GraphicsFrontend::new(config, Box::new(MockPlatform::new(window)))
            .with_backend_factory(Box::new(move |_| {
                let (mock, state) = MockVulkan::single_discrete();
                state.borrow_mut().fail_at = fail_at;
                Some(Box::new(VulkanBackend::with_api(mock)) as Box<dyn GraphicsBackend>)
            }));
        Engine::with_frontend(frontend)
    }

    #[test]
    fn test_run_drives_application_until_shutdown_request() {
        let mut window = MockWindow::new(800, 600);
        window.schedule_sizes([(800, 600), (640, 480)]);
        let mut engine = engine(window, None);
        let app = Rc::new(RefCell::new(CountingApp {
            accept_init: true,
            max_frames: 5,
            ..Default::default()
        }));

        assert!(engine.run(app.clone()).is_ok());

        let app = app.borrow();
        assert_eq!(app.renders, 5);
        assert_eq!(app.updates, 5);
        assert_eq!(app.shutdowns, 1);
        assert_eq!(app.resizes, vec![(640, 480)]);
        assert_eq!(engine.frontend().state(), FrontendState::Uninitialized);
    }

    #[test]
    fn test_application_init_failure_aborts() {
        let mut engine = engine(MockWindow::new(800, 600), None);
        let app = Rc::new(RefCell::new(CountingApp::default()));

        let result = engine.run(app.clone());
        assert!(matches!(result, Err(LumiosError::Initialization(_))));
        assert_eq!(app.borrow().updates, 0);
        assert_eq!(app.borrow().shutdowns, 0);
    }

    #[test]
    fn test_frontend_init_failure_aborts() {
        let mut engine = engine(MockWindow::new(800, 600), Some(MockStep::LogicalDevice));
        let app = Rc::new(RefCell::new(CountingApp {
            accept_init: true,
            ..Default::default()
        }));

        assert!(matches!(engine.run(app.clone()), Err(LumiosError::Initialization(_))));
        assert!(app.borrow().handle.is_none());
    }

    #[test]
    fn test_device_lost_is_reported() {
        let mut engine = engine(MockWindow::new(800, 600), Some(MockStep::Submit));
        let app = Rc::new(RefCell::new(CountingApp {
            accept_init: true,
            max_frames: 10,
            ..Default::default()
        }));

        let result = engine.run(app.clone());
        assert!(matches!(result, Err(LumiosError::Backend(BackendError::DeviceLost))));
        assert_eq!(app.borrow().renders, 1);
        assert_eq!(app.borrow().shutdowns, 1);
    }
}
