//! Lumios 演示程序
//!
//! 打开一个窗口，用配置的清屏颜色逐帧清屏，并定期输出帧率。
//! 可以通过配置文件或命令行参数选择图形后端。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件（默认 lumios.toml）
//! cargo run
//!
//! # 使用 DirectX 12 占位后端，渲染 600 帧后退出
//! cargo run -- --api dx12 --max-frames 600
//!
//! # 关闭验证层和垂直同步
//! cargo run -- --validation false --present-mode immediate
//! ```
//!
//! # 初始化流程
//!
//! 1. 解析命令行参数
//! 2. 加载引擎配置文件并应用命令行覆盖
//! 3. 验证配置
//! 4. 初始化日志系统
//! 5. 创建引擎并运行演示应用

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;

use lumios::core::config::{EngineConfig, GraphicsApi, PresentMode};
use lumios::core::log;
use lumios::{app_info, app_warn, Application, Engine, FrontendHandle};

/// 每隔多少帧输出一次帧率
const FPS_REPORT_INTERVAL: u64 = 120;

#[derive(Parser, Debug)]
#[command(name = "lumios", version, about = "Lumios rendering frontend demo")]
struct Args {
    /// Engine configuration file (TOML).
    #[arg(long, default_value = "lumios.toml")]
    config: PathBuf,

    /// Graphics API: vulkan, dx12 or auto.
    #[arg(long)]
    api: Option<GraphicsApi>,

    /// Window width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Present mode: immediate, fifo, fifo_relaxed or mailbox.
    #[arg(long)]
    present_mode: Option<PresentMode>,

    /// Frames in flight (clamped to 1-8).
    #[arg(long)]
    frames_in_flight: Option<u32>,

    /// Enable or disable the Vulkan validation layer.
    #[arg(long)]
    validation: Option<bool>,

    /// Exit after rendering this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut EngineConfig) {
        let graphics = &mut config.graphics;
        if let Some(api) = self.api {
            graphics.set_api(api);
        }
        if self.width.is_some() || self.height.is_some() {
            graphics.set_window_size(
                self.width.unwrap_or(graphics.window.width),
                self.height.unwrap_or(graphics.window.height),
            );
        }
        if let Some(mode) = self.present_mode {
            graphics.set_present_mode(mode);
        }
        if let Some(frames) = self.frames_in_flight {
            graphics.set_max_frames_in_flight(frames);
        }
        if let Some(enabled) = self.validation {
            graphics.set_validation(enabled);
        }
    }
}

/// 演示应用：统计帧数并按需退出
struct DemoApp {
    handle: Option<FrontendHandle>,
    max_frames: Option<u64>,
    frames: u64,
    elapsed: f32,
}

impl DemoApp {
    fn new(max_frames: Option<u64>) -> Self {
        Self {
            handle: None,
            max_frames,
            frames: 0,
            elapsed: 0.0,
        }
    }
}

impl Application for DemoApp {
    fn initialize(&mut self, handle: &FrontendHandle) -> bool {
        self.handle = Some(handle.clone());
        app_info!("Demo application initialized");
        true
    }

    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    fn render(&mut self) {
        self.frames += 1;

        if self.frames % FPS_REPORT_INTERVAL == 0 && self.elapsed > 0.0 {
            let fps = FPS_REPORT_INTERVAL as f32 / self.elapsed;
            app_info!(frames = self.frames, fps = format!("{fps:.1}"), "Frame rate");
            self.elapsed = 0.0;
        }

        if self.max_frames.is_some_and(|max| self.frames >= max) {
            if let Some(handle) = self.handle.as_ref() {
                app_info!(frames = self.frames, "Frame limit reached, shutting down");
                handle.request_shutdown();
            }
        }
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            app_warn!("Window minimized");
        } else {
            app_info!(width, height, "Window resized");
        }
    }

    fn shutdown(&mut self) {
        app_info!(frames = self.frames, "Demo application shutting down");
    }
}

fn main() -> anyhow::Result<()> {
    // 1. 解析命令行参数（在初始化日志之前）
    let args = Args::parse();

    // 2. 加载配置并应用命令行覆盖
    let mut config = EngineConfig::from_file_or_default(&args.config);
    args.apply(&mut config);

    // 3. 验证配置
    config.validate().context("invalid configuration")?;

    // 4. 初始化日志系统
    log::init_from_config(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Lumios starting...");
    info!(
        api = %config.graphics.render.api,
        width = config.graphics.window.width,
        height = config.graphics.window.height,
        present_mode = ?config.graphics.render.present_mode,
        frames_in_flight = config.graphics.render.max_frames_in_flight,
        validation = config.graphics.render.enable_validation,
        "Graphics configuration"
    );

    // 5. 运行
    let mut engine = Engine::new(&config);
    let app = Rc::new(RefCell::new(DemoApp::new(args.max_frames)));
    engine.run(app).context("engine run failed")?;

    info!("Lumios exited cleanly");
    Ok(())
}
