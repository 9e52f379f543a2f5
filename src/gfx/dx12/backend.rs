//! DirectX 12 图形后端（占位实现）
//!
//! 不调用任何 D3D12 接口，只遵守与 Vulkan 后端相同的契约：
//! 初始化和关闭幂等、未初始化时帧操作返回 `FailedInitialization`、
//! 帧操作必须按 begin → end → present 的顺序进行。
//!
//! # 初始化流程（均为占位）
//!
//! 1. 创建设备
//! 2. 创建命令队列
//! 3. 创建交换链
//! 4. 创建渲染目标
//! 5. 创建命令对象
//! 6. 创建同步对象

use tracing::{debug, info, warn};

use crate::core::config::GraphicsConfig;
use crate::core::error::{BackendError, BackendResult};
use crate::gfx::backend::{BackendState, FrameStatus, GraphicsBackend, RenderStats};
use crate::platform::SharedWindow;

/// 后台缓冲数量
pub const BACK_BUFFER_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Idle,
    Recording,
    Ended,
}

/// DirectX 12 占位后端
pub struct Dx12Backend {
    config: GraphicsConfig,
    state: BackendState,
    window: Option<SharedWindow>,
    phase: FramePhase,
    current_back_buffer: u32,
    resize_pending: bool,
    stats: RenderStats,
}

impl Default for Dx12Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl Dx12Backend {
    pub fn new() -> Self {
        Self {
            config: GraphicsConfig::default(),
            state: BackendState::Uninitialized,
            window: None,
            phase: FramePhase::Idle,
            current_back_buffer: 0,
            resize_pending: false,
            stats: RenderStats::default(),
        }
    }

    fn require_initialized(&self) -> BackendResult {
        if self.state == BackendState::Initialized {
            Ok(())
        } else {
            Err(BackendError::FailedInitialization)
        }
    }

    /// 当前后台缓冲下标
    pub fn current_back_buffer(&self) -> u32 {
        self.current_back_buffer
    }
}

impl GraphicsBackend for Dx12Backend {
    fn initialize(&mut self, config: &GraphicsConfig, window: SharedWindow) -> BackendResult {
        if self.state == BackendState::Initialized {
            warn!("DirectX 12 backend already initialized");
            return Ok(());
        }

        self.state = BackendState::Initializing;
        self.config = config.clone();
        self.config.sanitize();
        self.window = Some(window);
        warn!("DirectX 12 backend is a stub implementation");
        warn!("To enable DirectX 12 support, implement the actual DirectX 12 functionality");

        self.phase = FramePhase::Idle;
        self.current_back_buffer = 0;
        self.stats = RenderStats::default();
        self.state = BackendState::Initialized;
        info!("DirectX 12 backend stub initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.state == BackendState::Uninitialized {
            return;
        }

        info!("Shutting down DirectX 12 backend stub");
        self.wait_idle();
        self.window = None;
        self.phase = FramePhase::Idle;
        self.state = BackendState::Uninitialized;
        info!("DirectX 12 backend stub shut down");
    }

    fn begin_frame(&mut self) -> BackendResult<FrameStatus> {
        self.require_initialized()?;
        self.phase = FramePhase::Recording;
        Ok(FrameStatus::Recording)
    }

    fn end_frame(&mut self) -> BackendResult {
        self.require_initialized()?;
        if self.phase != FramePhase::Recording {
            return Err(BackendError::FailedCommandBufferCreation);
        }
        self.phase = FramePhase::Ended;
        Ok(())
    }

    fn present(&mut self) -> BackendResult {
        self.require_initialized()?;
        if self.phase != FramePhase::Ended {
            return Err(BackendError::Unknown);
        }
        self.phase = FramePhase::Idle;

        if self.resize_pending {
            self.recreate_swapchain()?;
        }
        self.current_back_buffer = (self.current_back_buffer + 1) % BACK_BUFFER_COUNT;
        self.stats.frames_rendered += 1;
        Ok(())
    }

    fn handle_resize(&mut self, _width: u32, _height: u32) {
        self.resize_pending = true;
    }

    fn recreate_swapchain(&mut self) -> BackendResult {
        self.require_initialized()?;
        self.wait_idle();
        self.resize_pending = false;
        self.current_back_buffer = 0;
        self.stats.swapchain_recreations += 1;
        Ok(())
    }

    fn wait_idle(&mut self) {
        if self.state == BackendState::Uninitialized {
            return;
        }
        debug!("DirectX 12 stub has no GPU work to wait for");
    }

    fn is_device_lost(&self) -> bool {
        false
    }

    fn api_name(&self) -> &str {
        "DirectX 12"
    }

    fn device_name(&self) -> String {
        "DirectX 12 Device (Stub)".to_string()
    }

    fn driver_version(&self) -> String {
        "Unknown (Stub)".to_string()
    }

    fn render_stats(&self) -> RenderStats {
        self.stats
    }

    fn supports_feature(&self, name: &str) -> bool {
        matches!(name, "directx12" | "stub_implementation")
    }

    fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    fn state(&self) -> BackendState {
        self.state
    }
}

impl Drop for Dx12Backend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
