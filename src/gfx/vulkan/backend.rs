//! Vulkan 后端
//!
//! 把设备选择、交换链管理和帧同步组合在 [`GraphicsBackend`] 接口之后。
//!
//! # 初始化顺序
//!
//! 1. 实例（可选验证层）与调试信使
//! 2. 窗口表面
//! 3. 选择物理设备，创建逻辑设备和队列
//! 4. 交换链与图像视图
//! 5. 命令池与每帧命令缓冲
//! 6. 每帧同步对象
//!
//! 关闭时先等待设备空闲，再按相反顺序释放。

use std::time::Instant;

use ash::vk;
use tracing::{debug, error, info, warn};

use super::api::{DeviceRequest, FrameSubmission, InstanceDesc, VulkanApi};
use super::ash_api::AshApi;
use super::device::{format_driver_version, select_device, PhysicalDeviceCandidate, QueueFamilyIndices};
use super::frame::FrameSynchronizer;
use super::swapchain::{ImageIndex, SwapchainManager};
use crate::core::config::GraphicsConfig;
use crate::core::error::{BackendError, BackendResult};
use crate::gfx::backend::{BackendState, FrameStatus, GraphicsBackend, RenderStats};
use crate::platform::{wait_for_nonzero_framebuffer, SharedWindow};

/// 等待帧栅栏的超时（纳秒）
const FENCE_TIMEOUT_NS: u64 = u64::MAX;

/// 提交时等待图像可用信号量的管线阶段：清屏在传输阶段写入图像
fn image_available_wait_stages() -> vk::PipelineStageFlags {
    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::TRANSFER
}

/// 已创建的实例级对象，用于按需释放
#[derive(Debug, Clone, Copy, Default)]
struct CreatedObjects {
    instance: bool,
    debug_messenger: bool,
    surface: bool,
    device: bool,
}

impl CreatedObjects {
    fn any(&self) -> bool {
        self.instance || self.debug_messenger || self.surface || self.device
    }
}

/// 正在录制或等待呈现的帧
#[derive(Debug, Clone, Copy)]
struct FrameInProgress {
    image: ImageIndex,
    /// 图像当前布局，`end_frame` 据此转换到呈现布局
    layout: vk::ImageLayout,
    recording: bool,
    started: Instant,
}

/// Vulkan 图形后端
///
/// 泛型参数是原生调用的实现，生产环境为 [`AshApi`]。
pub struct VulkanBackend<A: VulkanApi = AshApi> {
    api: A,
    config: GraphicsConfig,
    state: BackendState,
    window: Option<SharedWindow>,
    created: CreatedObjects,
    physical_device: Option<PhysicalDeviceCandidate>,
    queue_families: QueueFamilyIndices,
    swapchain: SwapchainManager,
    frames: FrameSynchronizer,
    frame: Option<FrameInProgress>,
    framebuffer_resized: bool,
    pending_size: Option<(u32, u32)>,
    device_lost: bool,
    stats: RenderStats,
}

impl VulkanBackend<AshApi> {
    /// 创建未初始化的后端，此时不会加载 Vulkan 库
    pub fn new() -> Self {
        Self::with_api(AshApi::new())
    }
}

impl Default for VulkanBackend<AshApi> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: VulkanApi> VulkanBackend<A> {
    pub fn with_api(api: A) -> Self {
        Self {
            api,
            config: GraphicsConfig::default(),
            state: BackendState::Uninitialized,
            window: None,
            created: CreatedObjects::default(),
            physical_device: None,
            queue_families: QueueFamilyIndices::default(),
            swapchain: SwapchainManager::new(),
            frames: FrameSynchronizer::new(),
            frame: None,
            framebuffer_resized: false,
            pending_size: None,
            device_lost: false,
            stats: RenderStats::default(),
        }
    }

    /// 把 Vulkan 结果码归类，并记录设备丢失
    fn classify(&mut self, result: vk::Result, fallback: BackendError) -> BackendError {
        let err = BackendError::from_vk(result, fallback);
        if err == BackendError::DeviceLost && !self.device_lost {
            error!("Vulkan device lost");
            self.device_lost = true;
        }
        err
    }

    fn window(&self) -> BackendResult<SharedWindow> {
        self.window.clone().ok_or(BackendError::FailedInitialization)
    }

    fn initialize_resources(&mut self) -> BackendResult {
        let window = self.window()?;
        let handles = window.borrow().surface_handles().map_err(|e| {
            error!(error = %e, "Cannot obtain native window handles");
            BackendError::FailedInitialization
        })?;

        // 1. 实例与调试信使
        let enable_validation = self.config.render.enable_validation;
        let desc = InstanceDesc {
            app_name: &self.config.window.title,
            enable_validation,
            display: handles.display,
        };
        if let Err(r) = self.api.create_instance(&desc) {
            return Err(self.classify(r, BackendError::FailedInitialization));
        }
        self.created.instance = true;
        debug!(validation = enable_validation, "Vulkan instance created");

        if enable_validation {
            if let Err(r) = self.api.create_debug_messenger() {
                return Err(self.classify(r, BackendError::FailedInitialization));
            }
            self.created.debug_messenger = true;
        }

        // 2. 表面
        if let Err(r) = self.api.create_surface(&handles) {
            return Err(self.classify(r, BackendError::FailedInitialization));
        }
        self.created.surface = true;
        debug!("Vulkan surface created");

        // 3. 物理设备与逻辑设备
        let candidates = match self.api.enumerate_physical_devices() {
            Ok(candidates) => candidates,
            Err(r) => return Err(self.classify(r, BackendError::FailedInitialization)),
        };
        let chosen = select_device(&candidates)?;
        let device = candidates[chosen].clone();
        let queues = device.queue_family_indices();
        let (graphics_family, present_family) = match (queues.graphics, queues.present) {
            (Some(g), Some(p)) => (g, p),
            _ => return Err(BackendError::FailedDeviceCreation),
        };

        let request = DeviceRequest {
            graphics_family,
            present_family,
            enable_sampler_anisotropy: device.sampler_anisotropy
                && self.config.render.enable_anisotropic_filtering,
        };
        if let Err(r) = self.api.create_logical_device(&device, &request) {
            return Err(self.classify(r, BackendError::FailedDeviceCreation));
        }
        self.created.device = true;
        info!(
            graphics_family,
            present_family,
            compute_family = ?queues.compute_or_graphics(),
            transfer_family = ?queues.transfer_or_graphics(),
            "Vulkan logical device created"
        );
        self.queue_families = queues;
        self.physical_device = Some(device);

        // 4. 交换链与图像视图
        self.create_swapchain()?;

        // 5-6. 命令对象与同步对象
        let frames_in_flight = self.config.render.max_frames_in_flight;
        self.frames.create(&mut self.api, graphics_family, frames_in_flight)?;

        Ok(())
    }

    /// 按当前帧缓冲尺寸创建交换链
    ///
    /// 窗口最小化时阻塞等待；等待期间窗口被关闭则返回 `Ok(false)`，交换链保持不变。
    fn create_swapchain(&mut self) -> BackendResult<bool> {
        let window = self.window()?;
        let Some(size) = wait_for_nonzero_framebuffer(&window) else {
            return Ok(false);
        };

        let physical = self
            .physical_device
            .as_ref()
            .map(|d| d.handle)
            .ok_or(BackendError::FailedInitialization)?;
        let support = match self.api.query_swapchain_support(physical) {
            Ok(support) => support,
            Err(r) => return Err(self.classify(r, BackendError::FailedSwapchainCreation)),
        };

        // 表面在等待之后可能已被销毁，销毁旧交换链放在查询之后
        self.swapchain.destroy(&mut self.api);
        if let Err(e) = self.swapchain.create(
            &mut self.api,
            &support,
            size,
            self.config.render.present_mode,
            &self.queue_families,
        ) {
            if e == BackendError::DeviceLost {
                self.device_lost = true;
            }
            return Err(e);
        }

        self.stats.memory_used = self.swapchain.memory_estimate();
        Ok(true)
    }

    /// 释放所有已创建的对象，顺序与创建相反
    fn release_resources(&mut self) {
        if self.created.device {
            if let Err(r) = self.api.device_wait_idle() {
                warn!(result = ?r, "vkDeviceWaitIdle failed during shutdown");
            }
        }

        self.frames.destroy(&mut self.api);
        self.swapchain.destroy(&mut self.api);

        if self.created.device {
            self.api.destroy_device();
        }
        if self.created.debug_messenger {
            self.api.destroy_debug_messenger();
        }
        if self.created.surface {
            self.api.destroy_surface();
        }
        if self.created.instance {
            self.api.destroy_instance();
        }

        self.created = CreatedObjects::default();
        self.physical_device = None;
        self.queue_families = QueueFamilyIndices::default();
        self.frame = None;
        self.framebuffer_resized = false;
        self.pending_size = None;
    }

    /// 上一帧获取了图像却没有完成呈现时，让当前槽位回到可用状态
    ///
    /// 图像可用信号量换新，交换链重建以归还被占用的图像。
    fn recover_abandoned_frame(&mut self) -> BackendResult {
        warn!("Previous frame was not presented, recovering frame slot");
        self.frame = None;
        if let Err(r) = self.api.device_wait_idle() {
            return Err(self.classify(r, BackendError::Unknown));
        }
        self.frames.replace_current_semaphores(&mut self.api)?;
        self.recreate_swapchain()
    }

    fn render_finished(&mut self, started: Instant) {
        self.stats.frames_rendered += 1;
        self.stats.frame_time_ms = started.elapsed().as_secs_f32() * 1000.0;
        self.frames.advance();
    }

    /// 当前帧槽位下标
    pub fn current_frame(&self) -> usize {
        self.frames.current().as_usize()
    }

    /// 当前交换链尺寸
    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// 是否有待处理的尺寸变化
    pub fn resize_pending(&self) -> bool {
        self.framebuffer_resized
    }
}

impl<A: VulkanApi> GraphicsBackend for VulkanBackend<A> {
    fn initialize(&mut self, config: &GraphicsConfig, window: SharedWindow) -> BackendResult {
        if self.state == BackendState::Initialized {
            warn!("Vulkan backend already initialized");
            return Ok(());
        }

        info!("Initializing Vulkan backend");
        self.state = BackendState::Initializing;
        self.config = config.clone();
        self.config.sanitize();
        self.window = Some(window);
        self.device_lost = false;
        self.stats = RenderStats::default();

        match self.initialize_resources() {
            Ok(()) => {
                self.state = BackendState::Initialized;
                info!(
                    device = %self.device_name(),
                    frames_in_flight = self.frames.frames_in_flight(),
                    "Vulkan backend initialized"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Vulkan backend initialization failed");
                self.release_resources();
                self.window = None;
                self.state = BackendState::Uninitialized;
                Err(e)
            }
        }
    }

    fn shutdown(&mut self) {
        if self.state == BackendState::Uninitialized && !self.created.any() {
            return;
        }

        info!("Shutting down Vulkan backend");
        self.release_resources();
        self.window = None;
        self.state = BackendState::Uninitialized;
        info!("Vulkan backend shut down");
    }

    fn begin_frame(&mut self) -> BackendResult<FrameStatus> {
        if self.state != BackendState::Initialized {
            return Err(BackendError::FailedInitialization);
        }
        if self.device_lost {
            return Err(BackendError::DeviceLost);
        }
        if self.frame.is_some() {
            self.recover_abandoned_frame()?;
        }
        if !self.swapchain.is_created() {
            debug!("No swapchain, recreating before acquire");
            self.recreate_swapchain()?;
            return Ok(FrameStatus::Skipped);
        }

        let slot = self.frames.current_slot()?;

        // 等待该槽位上一次提交的工作完成，限制在飞帧数
        let wait_start = Instant::now();
        if self.frames.needs_fence_wait() {
            if let Err(r) = self.api.wait_for_fence(slot.in_flight, FENCE_TIMEOUT_NS) {
                return Err(self.classify(r, BackendError::Unknown));
            }
        }
        self.stats.gpu_wait_ms = wait_start.elapsed().as_secs_f32() * 1000.0;
        let started = Instant::now();

        let image = match self.api.acquire_next_image(self.swapchain.handle(), slot.image_available) {
            Ok((index, _suboptimal)) => ImageIndex(index),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date on acquire");
                self.recreate_swapchain()?;
                return Ok(FrameStatus::Skipped);
            }
            Err(r) => return Err(self.classify(r, BackendError::Unknown)),
        };
        let image_handle = self.swapchain.image(image).ok_or(BackendError::Unknown)?;

        self.frame = Some(FrameInProgress {
            image,
            layout: vk::ImageLayout::UNDEFINED,
            recording: false,
            started,
        });

        // 只在确定会提交时重置栅栏
        if self.frames.needs_fence_wait() {
            if let Err(r) = self.api.reset_fence(slot.in_flight) {
                return Err(self.classify(r, BackendError::Unknown));
            }
            self.frames.mark_fence_reset();
        }

        let command_buffer = slot.command_buffer;
        if let Err(r) = self.api.reset_command_buffer(command_buffer) {
            return Err(self.classify(r, BackendError::FailedCommandBufferCreation));
        }
        if let Err(r) = self.api.begin_command_buffer(command_buffer) {
            return Err(self.classify(r, BackendError::FailedCommandBufferCreation));
        }

        let mut layout = vk::ImageLayout::UNDEFINED;
        if self.swapchain.supports_clear() {
            self.api
                .record_clear(command_buffer, image_handle, self.config.render.clear_color);
            layout = vk::ImageLayout::TRANSFER_DST_OPTIMAL;
        }

        if let Some(frame) = self.frame.as_mut() {
            frame.layout = layout;
            frame.recording = true;
        }
        Ok(FrameStatus::Recording)
    }

    fn end_frame(&mut self) -> BackendResult {
        if self.state != BackendState::Initialized {
            return Err(BackendError::FailedInitialization);
        }
        let Some(frame) = self.frame.filter(|f| f.recording) else {
            warn!("end_frame called without a frame being recorded");
            return Err(BackendError::FailedCommandBufferCreation);
        };

        let slot = self.frames.current_slot()?;
        let image = self.swapchain.image(frame.image).ok_or(BackendError::Unknown)?;
        self.api
            .record_present_transition(slot.command_buffer, image, frame.layout);

        if let Err(r) = self.api.end_command_buffer(slot.command_buffer) {
            return Err(self.classify(r, BackendError::FailedCommandBufferCreation));
        }
        if let Some(frame) = self.frame.as_mut() {
            frame.recording = false;
        }
        Ok(())
    }

    fn present(&mut self) -> BackendResult {
        if self.state != BackendState::Initialized {
            return Err(BackendError::FailedInitialization);
        }
        let Some(frame) = self.frame.filter(|f| !f.recording) else {
            warn!("present called without a finished frame");
            return Err(BackendError::Unknown);
        };

        let slot = self.frames.current_slot()?;
        let submission = FrameSubmission {
            command_buffer: slot.command_buffer,
            wait_semaphore: slot.image_available,
            wait_stage: image_available_wait_stages(),
            signal_semaphore: slot.render_finished,
            fence: slot.in_flight,
        };
        if let Err(r) = self.api.queue_submit(&submission) {
            return Err(self.classify(r, BackendError::Unknown));
        }
        self.frames.mark_submitted();
        self.frame = None;

        let out_of_date = match self.api.queue_present(
            self.swapchain.handle(),
            frame.image.0,
            slot.render_finished,
        ) {
            Ok(suboptimal) => suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            Err(r) => return Err(self.classify(r, BackendError::Unknown)),
        };

        if out_of_date || self.framebuffer_resized {
            debug!(
                out_of_date,
                resized = self.framebuffer_resized,
                "Swapchain needs recreation after present"
            );
            self.recreate_swapchain()?;
        }

        self.render_finished(frame.started);
        Ok(())
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        debug!(width, height, "Resize recorded");
        self.pending_size = Some((width, height));
        self.framebuffer_resized = true;
    }

    fn recreate_swapchain(&mut self) -> BackendResult {
        if self.state != BackendState::Initialized {
            return Err(BackendError::FailedInitialization);
        }

        if let Err(r) = self.api.device_wait_idle() {
            return Err(self.classify(r, BackendError::Unknown));
        }

        // 已在录制中的帧所用的图像随旧交换链一起失效
        self.frame = None;
        self.framebuffer_resized = false;
        match self.create_swapchain() {
            Ok(true) => {}
            Ok(false) => {
                info!("Window closed while minimized, swapchain recreation deferred");
                self.framebuffer_resized = true;
                return Ok(());
            }
            Err(e) => {
                // 旧交换链已销毁，下一帧开始时重试
                warn!(error = %e, "Swapchain recreation failed");
                self.framebuffer_resized = true;
                return Err(e);
            }
        }

        self.pending_size = None;
        self.stats.swapchain_recreations += 1;
        let extent = self.swapchain.extent();
        info!(width = extent.width, height = extent.height, "Swapchain recreated");
        Ok(())
    }

    fn wait_idle(&mut self) {
        if !self.created.device {
            return;
        }
        if let Err(r) = self.api.device_wait_idle() {
            let err = self.classify(r, BackendError::Unknown);
            warn!(error = %err, "vkDeviceWaitIdle failed");
        }
    }

    fn is_device_lost(&self) -> bool {
        self.device_lost
    }

    fn api_name(&self) -> &str {
        "Vulkan"
    }

    fn device_name(&self) -> String {
        self.physical_device
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), |d| d.name.clone())
    }

    fn driver_version(&self) -> String {
        self.physical_device
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), |d| format_driver_version(d.driver_version))
    }

    fn render_stats(&self) -> RenderStats {
        self.stats
    }

    fn supports_feature(&self, name: &str) -> bool {
        let device = self.physical_device.as_ref();
        match name {
            "validation_layers" => self.created.debug_messenger,
            "debug_markers" => self.config.render.enable_debug_markers,
            "geometry_shader" => device.map_or(false, |d| d.geometry_shader),
            "sampler_anisotropy" => device.map_or(false, |d| d.sampler_anisotropy),
            "swapchain" => self.swapchain.is_created(),
            _ => false,
        }
    }

    fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    fn state(&self) -> BackendState {
        self.state
    }
}

impl<A: VulkanApi> Drop for VulkanBackend<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
