//! 测试用的 Vulkan 模拟实现
//!
//! 记录每个句柄的生命周期和栅栏状态，用来检查泄漏、重复释放、
//! 在飞帧数上限以及交换链重建次数。栅栏只有在被等待（或设备空闲）时才完成，
//! 因此未完成的栅栏数就是在飞帧数。

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};

use super::api::{DeviceRequest, FrameSubmission, InstanceDesc, SwapchainDesc, VulkanApi};
use super::device::{PhysicalDeviceCandidate, QueueFamilyInfo, SwapchainSupportDetails};
use crate::platform::SurfaceHandles;

/// 可注入失败的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    Instance,
    DebugMessenger,
    Surface,
    LogicalDevice,
    Swapchain,
    ImageView,
    CommandPool,
    CommandBuffers,
    Semaphore,
    Fence,
    BeginCommandBuffer,
    EndCommandBuffer,
    Submit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockFence {
    pub signaled: bool,
    /// 已提交但尚未被等待
    pub pending: bool,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub devices: Vec<PhysicalDeviceCandidate>,
    pub fail_at: Option<MockStep>,
    /// 按顺序消费的获取结果，空时返回 `Ok((下一张图像, false))`
    pub acquire_script: VecDeque<VkResult<bool>>,
    /// 按顺序消费的呈现结果，空时返回 `Ok(false)`
    pub present_script: VecDeque<VkResult<bool>>,

    pub instance_alive: bool,
    pub messenger_alive: bool,
    pub surface_alive: bool,
    pub device_alive: bool,
    pub validation_requested: bool,

    pub swapchains_created: u32,
    pub swapchain_extents: Vec<vk::Extent2D>,
    pub zero_extent_attempts: u32,
    pub submits: u32,
    pub presents: u32,
    pub wait_idle_calls: u32,
    pub max_pending_fences: usize,
    pub fence_protocol_violations: u32,
    pub double_frees: u32,
    /// 所有 destroy_* 调用次数
    pub destroy_calls: u32,

    next_handle: u64,
    next_image: u32,
    image_count: u32,
    live: HashSet<u64>,
    fences: HashMap<u64, MockFence>,
}

impl MockState {
    pub fn live_handle_count(&self) -> usize {
        self.live.len()
    }

    pub fn pending_fences(&self) -> usize {
        self.fences.values().filter(|f| f.pending).count()
    }

    fn fail(&self, step: MockStep) -> VkResult<()> {
        if self.fail_at == Some(step) {
            Err(match step {
                MockStep::Submit => vk::Result::ERROR_DEVICE_LOST,
                _ => vk::Result::ERROR_INITIALIZATION_FAILED,
            })
        } else {
            Ok(())
        }
    }

    fn alloc(&mut self) -> u64 {
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        self.next_handle
    }

    fn release(&mut self, raw: u64) {
        if raw == 0 {
            return;
        }
        self.destroy_calls += 1;
        if !self.live.remove(&raw) {
            self.double_frees += 1;
        }
    }

    fn complete_all_fences(&mut self) {
        for fence in self.fences.values_mut() {
            if fence.pending {
                fence.pending = false;
                fence.signaled = true;
            }
        }
    }
}

/// 模拟的 Vulkan
pub struct MockVulkan {
    state: Rc<RefCell<MockState>>,
}

impl MockVulkan {
    /// 创建模拟实现，同时返回共享的状态用于断言
    pub fn with_devices(devices: Vec<PhysicalDeviceCandidate>) -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            devices,
            ..MockState::default()
        }));
        (Self { state: state.clone() }, state)
    }

    /// 只有一块合格独立显卡的主机
    pub fn single_discrete() -> (Self, Rc<RefCell<MockState>>) {
        Self::with_devices(vec![candidate(vk::PhysicalDeviceType::DISCRETE_GPU, "Mock Discrete GPU")])
    }
}

/// 构造一个完全合格的候选设备
///
/// 表面尺寸由交换链决定（`current_extent` 为 `u32::MAX`），因此交换链跟随窗口帧缓冲尺寸。
pub fn candidate(device_type: vk::PhysicalDeviceType, name: &str) -> PhysicalDeviceCandidate {
    let capabilities = vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
        min_image_extent: vk::Extent2D { width: 1, height: 1 },
        max_image_extent: vk::Extent2D { width: 8192, height: 8192 },
        max_image_array_layers: 1,
        supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
        current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
        supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
    };

    PhysicalDeviceCandidate {
        handle: vk::PhysicalDevice::from_raw(0x1000),
        name: name.to_string(),
        device_type,
        api_version: vk::API_VERSION_1_2,
        driver_version: vk::make_api_version(0, 1, 2, 3),
        max_image_dimension_2d: 16384,
        geometry_shader: true,
        sampler_anisotropy: true,
        queue_families: vec![QueueFamilyInfo {
            flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            queue_count: 1,
            supports_present: true,
        }],
        extensions: vec!["VK_KHR_swapchain".to_string()],
        swapchain_support: SwapchainSupportDetails {
            capabilities,
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        },
    }
}

impl VulkanApi for MockVulkan {
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::Instance)?;
        state.instance_alive = true;
        state.validation_requested = desc.enable_validation;
        Ok(())
    }

    fn create_debug_messenger(&mut self) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::DebugMessenger)?;
        state.messenger_alive = true;
        Ok(())
    }

    fn create_surface(&mut self, _handles: &SurfaceHandles) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::Surface)?;
        state.surface_alive = true;
        Ok(())
    }

    fn destroy_debug_messenger(&mut self) {
        let state = &mut *self.state.borrow_mut();
        if state.messenger_alive {
            state.destroy_calls += 1;
            state.messenger_alive = false;
        }
    }

    fn destroy_surface(&mut self) {
        let state = &mut *self.state.borrow_mut();
        if state.surface_alive {
            state.destroy_calls += 1;
            state.surface_alive = false;
        }
    }

    fn destroy_instance(&mut self) {
        let state = &mut *self.state.borrow_mut();
        if state.instance_alive {
            state.destroy_calls += 1;
            state.instance_alive = false;
        }
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDeviceCandidate>> {
        Ok(self.state.borrow().devices.clone())
    }

    fn query_swapchain_support(&self, device: vk::PhysicalDevice) -> VkResult<SwapchainSupportDetails> {
        self.state
            .borrow()
            .devices
            .iter()
            .find(|d| d.handle == device)
            .map(|d| d.swapchain_support.clone())
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn create_logical_device(
        &mut self,
        _device: &PhysicalDeviceCandidate,
        _request: &DeviceRequest,
    ) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::LogicalDevice)?;
        state.device_alive = true;
        Ok(())
    }

    fn device_wait_idle(&mut self) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.wait_idle_calls += 1;
        state.complete_all_fences();
        Ok(())
    }

    fn destroy_device(&mut self) {
        let state = &mut *self.state.borrow_mut();
        if state.device_alive {
            state.destroy_calls += 1;
            state.device_alive = false;
        }
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<(vk::SwapchainKHR, Vec<vk::Image>)> {
        let state = &mut *self.state.borrow_mut();
        if desc.extent.width == 0 || desc.extent.height == 0 {
            state.zero_extent_attempts += 1;
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        state.fail(MockStep::Swapchain)?;

        let swapchain = vk::SwapchainKHR::from_raw(state.alloc());
        // 图像归交换链所有，不单独跟踪
        let images = (0..desc.image_count)
            .map(|i| vk::Image::from_raw(0xA000 + u64::from(i)))
            .collect();
        state.swapchains_created += 1;
        state.swapchain_extents.push(desc.extent);
        state.image_count = desc.image_count;
        state.next_image = 0;
        Ok((swapchain, images))
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        self.state.borrow_mut().release(swapchain.as_raw());
    }

    fn create_image_view(&mut self, _image: vk::Image, _format: vk::Format) -> VkResult<vk::ImageView> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::ImageView)?;
        Ok(vk::ImageView::from_raw(state.alloc()))
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        self.state.borrow_mut().release(view.as_raw());
    }

    fn acquire_next_image(&mut self, _swapchain: vk::SwapchainKHR, _signal: vk::Semaphore) -> VkResult<(u32, bool)> {
        let state = &mut *self.state.borrow_mut();
        let suboptimal = match state.acquire_script.pop_front() {
            Some(result) => result?,
            None => false,
        };
        let index = state.next_image;
        state.next_image = (state.next_image + 1) % state.image_count.max(1);
        Ok((index, suboptimal))
    }

    fn queue_present(&mut self, _swapchain: vk::SwapchainKHR, _image_index: u32, _wait: vk::Semaphore) -> VkResult<bool> {
        let state = &mut *self.state.borrow_mut();
        state.presents += 1;
        state.present_script.pop_front().unwrap_or(Ok(false))
    }

    fn create_command_pool(&mut self, _queue_family: u32) -> VkResult<vk::CommandPool> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::CommandPool)?;
        Ok(vk::CommandPool::from_raw(state.alloc()))
    }

    fn allocate_command_buffers(&mut self, _pool: vk::CommandPool, count: u32) -> VkResult<Vec<vk::CommandBuffer>> {
        let state = self.state.borrow();
        state.fail(MockStep::CommandBuffers)?;
        // 命令缓冲随命令池释放
        Ok((0..count)
            .map(|i| vk::CommandBuffer::from_raw(0xC000 + u64::from(i)))
            .collect())
    }

    fn destroy_command_pool(&mut self, pool: vk::CommandPool) {
        self.state.borrow_mut().release(pool.as_raw());
    }

    fn reset_command_buffer(&mut self, _command_buffer: vk::CommandBuffer) -> VkResult<()> {
        Ok(())
    }

    fn begin_command_buffer(&mut self, _command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.state.borrow().fail(MockStep::BeginCommandBuffer)
    }

    fn end_command_buffer(&mut self, _command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.state.borrow().fail(MockStep::EndCommandBuffer)
    }

    fn record_clear(&mut self, _command_buffer: vk::CommandBuffer, _image: vk::Image, _color: [f32; 4]) {}

    fn record_present_transition(
        &mut self,
        _command_buffer: vk::CommandBuffer,
        _image: vk::Image,
        _old_layout: vk::ImageLayout,
    ) {
    }

    fn queue_submit(&mut self, submission: &FrameSubmission) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::Submit)?;
        let fence = state.fences.entry(submission.fence.as_raw()).or_default();
        // 提交时栅栏必须处于已重置状态
        let violation = fence.signaled || fence.pending;
        fence.signaled = false;
        fence.pending = true;
        if violation {
            state.fence_protocol_violations += 1;
        }
        state.submits += 1;
        let pending = state.pending_fences();
        state.max_pending_fences = state.max_pending_fences.max(pending);
        Ok(())
    }

    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::Semaphore)?;
        Ok(vk::Semaphore::from_raw(state.alloc()))
    }

    fn destroy_semaphore(&mut self, semaphore: vk::Semaphore) {
        self.state.borrow_mut().release(semaphore.as_raw());
    }

    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence> {
        let state = &mut *self.state.borrow_mut();
        state.fail(MockStep::Fence)?;
        let raw = state.alloc();
        state.fences.insert(raw, MockFence { signaled, pending: false });
        Ok(vk::Fence::from_raw(raw))
    }

    fn destroy_fence(&mut self, fence: vk::Fence) {
        let state = &mut *self.state.borrow_mut();
        state.fences.remove(&fence.as_raw());
        state.release(fence.as_raw());
    }

    fn wait_for_fence(&mut self, fence: vk::Fence, _timeout_ns: u64) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        let fence = state
            .fences
            .get_mut(&fence.as_raw())
            .ok_or(vk::Result::ERROR_UNKNOWN)?;
        if fence.pending {
            fence.pending = false;
            fence.signaled = true;
        }
        if fence.signaled {
            Ok(())
        } else {
            // 等待一个已重置且从未提交的栅栏会永远阻塞
            state.fence_protocol_violations += 1;
            Err(vk::Result::TIMEOUT)
        }
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()> {
        let state = &mut *self.state.borrow_mut();
        let fence = state
            .fences
            .get_mut(&fence.as_raw())
            .ok_or(vk::Result::ERROR_UNKNOWN)?;
        if fence.pending {
            state.fence_protocol_violations += 1;
            return Err(vk::Result::ERROR_UNKNOWN);
        }
        fence.signaled = false;
        Ok(())
    }
}
