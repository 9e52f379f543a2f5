//! 图形后端的统一抽象接口
//!
//! 本模块定义了所有图形后端（Vulkan、DirectX 12）必须实现的统一接口。
//! 前端只通过 [`GraphicsBackend`] 驱动帧生命周期，不依赖具体 API。
//!
//! # 帧生命周期
//!
//! ```text
//! initialize ─► begin_frame ─► (宿主渲染) ─► end_frame ─► present ─┐
//!                   ▲                                               │
//!                   └───────────────────────────────────────────────┘
//! ```
//!
//! `begin_frame` 返回 [`FrameStatus::Skipped`] 时交换链刚被重建，
//! 本帧不应继续录制、结束或呈现。

use crate::core::config::GraphicsConfig;
use crate::core::error::BackendResult;
use crate::platform::SharedWindow;

/// `begin_frame` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// 已开始录制，调用方应继续渲染、`end_frame`、`present`
    Recording,
    /// 交换链已过期并被重建，本帧跳过
    Skipped,
}

/// 后端生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// 渲染统计
///
/// 只由后端在帧操作成功后更新。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    /// 成功呈现的帧数
    pub frames_rendered: u64,
    /// 上一帧从 `begin_frame` 到 `present` 完成的 CPU 时间（毫秒）
    pub frame_time_ms: f32,
    /// 上一帧在帧栅栏上等待 GPU 的时间（毫秒）
    pub gpu_wait_ms: f32,
    pub draw_calls: u32,
    pub triangles: u32,
    /// 交换链图像占用显存的估计值（字节）
    pub memory_used: u64,
    /// 交换链重建次数
    pub swapchain_recreations: u32,
}

/// 图形后端的统一接口
///
/// 所有具体的图形后端都必须实现此 trait。
/// 除内省方法外，所有操作都返回 [`BackendResult`]，可恢复的失败不会 panic。
///
/// 状态机：`Uninitialized → Initializing → Initialized`。
/// 初始化失败会释放已获取的资源并回到 `Uninitialized`；
/// `shutdown` 在任何状态下都可以安全地重复调用。
pub trait GraphicsBackend {
    /// 初始化后端
    ///
    /// 已初始化时记录警告并直接返回成功，不产生任何副作用。
    ///
    /// # 参数
    ///
    /// * `config` - 图形配置，后端保留一份副本
    /// * `window` - 用于创建表面和查询帧缓冲尺寸的窗口
    fn initialize(&mut self, config: &GraphicsConfig, window: SharedWindow) -> BackendResult;

    /// 等待 GPU 空闲后按获取的逆序释放所有资源
    ///
    /// 从未初始化时什么也不做；可以重复调用。
    fn shutdown(&mut self);

    /// 开始一帧
    ///
    /// 等待当前帧槽位的栅栏、获取下一张交换链图像并开始录制。
    /// 未初始化时返回 `FailedInitialization`。
    fn begin_frame(&mut self) -> BackendResult<FrameStatus>;

    /// 结束录制
    fn end_frame(&mut self) -> BackendResult;

    /// 提交并呈现，成功后推进帧槽位
    fn present(&mut self) -> BackendResult;

    /// 记录新的窗口尺寸，下一次呈现后重建交换链
    fn handle_resize(&mut self, width: u32, height: u32);

    /// 按当前帧缓冲尺寸重建交换链
    ///
    /// 帧缓冲尺寸为 0（窗口最小化）时阻塞等待，直到尺寸非零。
    fn recreate_swapchain(&mut self) -> BackendResult;

    /// 阻塞直到所有已提交的 GPU 工作完成；未初始化时什么也不做
    fn wait_idle(&mut self);

    /// 设备是否已丢失（一旦置位不会自动清除）
    fn is_device_lost(&self) -> bool;

    fn api_name(&self) -> &str;

    fn device_name(&self) -> String;

    fn driver_version(&self) -> String;

    fn render_stats(&self) -> RenderStats;

    /// 按名称查询能力，未知名称返回 `false`
    fn supports_feature(&self, name: &str) -> bool;

    /// 初始化时保存的配置
    fn config(&self) -> &GraphicsConfig;

    fn state(&self) -> BackendState;

    fn is_initialized(&self) -> bool {
        self.state() == BackendState::Initialized
    }
}
