//! Vulkan 原生调用的接缝
//!
//! [`VulkanBackend`](super::VulkanBackend) 只通过 [`VulkanApi`] 调用驱动，
//! 生产环境使用基于 ash 的 [`AshApi`](super::AshApi)。
//! 每个方法对应一次（或一组紧密相关的）原生调用，返回原始的 `vk::Result`，
//! 错误分类由后端完成。

use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::RawDisplayHandle;

use super::device::{PhysicalDeviceCandidate, SwapchainSupportDetails};
use crate::platform::SurfaceHandles;

/// 实例创建参数
#[derive(Debug, Clone, Copy)]
pub struct InstanceDesc<'a> {
    pub app_name: &'a str,
    /// 启用 `VK_LAYER_KHRONOS_validation` 和调试扩展
    pub enable_validation: bool,
    /// 决定需要哪个平台表面扩展
    pub display: RawDisplayHandle,
}

/// 逻辑设备创建参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRequest {
    pub graphics_family: u32,
    pub present_family: u32,
    pub enable_sampler_anisotropy: bool,
}

/// 交换链创建参数
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub image_usage: vk::ImageUsageFlags,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub graphics_family: u32,
    pub present_family: u32,
}

/// 一帧的队列提交
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission {
    pub command_buffer: vk::CommandBuffer,
    /// 图像可用信号量
    pub wait_semaphore: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags,
    /// 渲染完成信号量
    pub signal_semaphore: vk::Semaphore,
    /// 帧槽位的栅栏
    pub fence: vk::Fence,
}

/// Vulkan 原生调用
///
/// 销毁类方法对空句柄或未创建的对象不做任何事。
pub trait VulkanApi {
    // 实例与表面
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<()>;
    fn create_debug_messenger(&mut self) -> VkResult<()>;
    fn create_surface(&mut self, handles: &SurfaceHandles) -> VkResult<()>;
    fn destroy_debug_messenger(&mut self);
    fn destroy_surface(&mut self);
    fn destroy_instance(&mut self);

    // 物理设备与逻辑设备
    fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDeviceCandidate>>;
    fn query_swapchain_support(&self, device: vk::PhysicalDevice) -> VkResult<SwapchainSupportDetails>;
    fn create_logical_device(
        &mut self,
        device: &PhysicalDeviceCandidate,
        request: &DeviceRequest,
    ) -> VkResult<()>;
    fn device_wait_idle(&mut self) -> VkResult<()>;
    fn destroy_device(&mut self);

    // 交换链
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<(vk::SwapchainKHR, Vec<vk::Image>)>;
    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR);
    fn create_image_view(&mut self, image: vk::Image, format: vk::Format) -> VkResult<vk::ImageView>;
    fn destroy_image_view(&mut self, view: vk::ImageView);
    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;
    /// 返回值为 `true` 表示 suboptimal
    fn queue_present(
        &mut self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> VkResult<bool>;

    // 命令
    fn create_command_pool(&mut self, queue_family: u32) -> VkResult<vk::CommandPool>;
    fn allocate_command_buffers(
        &mut self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>>;
    /// 同时释放从该池分配的命令缓冲
    fn destroy_command_pool(&mut self, pool: vk::CommandPool);
    fn reset_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    fn begin_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    fn end_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    /// 把图像转到 `TRANSFER_DST_OPTIMAL` 并清屏
    fn record_clear(&mut self, command_buffer: vk::CommandBuffer, image: vk::Image, color: [f32; 4]);
    /// 把图像从 `old_layout` 转到 `PRESENT_SRC_KHR`
    fn record_present_transition(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        old_layout: vk::ImageLayout,
    );
    fn queue_submit(&mut self, submission: &FrameSubmission) -> VkResult<()>;

    // 同步对象
    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore>;
    fn destroy_semaphore(&mut self, semaphore: vk::Semaphore);
    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence>;
    fn destroy_fence(&mut self, fence: vk::Fence);
    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()>;
    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()>;
}
