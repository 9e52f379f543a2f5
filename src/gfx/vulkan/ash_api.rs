//! 基于 ash 的 [`VulkanApi`] 实现
//!
//! Vulkan 库在第一次创建实例时才加载，构造 [`AshApi`] 本身不接触驱动。
//! 所有 `unsafe` 调用集中在这里，句柄的创建/销毁顺序由后端保证。

use std::collections::BTreeSet;
use std::ffi::{c_char, c_void, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain, WaylandSurface, Win32Surface, XlibSurface};
use ash::prelude::VkResult;
use ash::{vk, Device, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, error, info, warn};

use super::api::{DeviceRequest, FrameSubmission, InstanceDesc, SwapchainDesc, VulkanApi};
use super::device::{PhysicalDeviceCandidate, QueueFamilyInfo, SwapchainSupportDetails};
use crate::platform::SurfaceHandles;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";
const ENGINE_NAME: &CStr = c"Lumios";

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// 验证层消息转发到 tracing
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            error!(target: "lumios::vulkan", kind = ?message_type, "{}", message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            warn!(target: "lumios::vulkan", kind = ?message_type, "{}", message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            info!(target: "lumios::vulkan", kind = ?message_type, "{}", message)
        }
        _ => debug!(target: "lumios::vulkan", kind = ?message_type, "{}", message),
    }

    vk::FALSE
}

/// 显示句柄对应的平台表面扩展
fn surface_extension(display: &RawDisplayHandle) -> VkResult<&'static CStr> {
    match display {
        RawDisplayHandle::Windows(_) => Ok(Win32Surface::name()),
        RawDisplayHandle::Xlib(_) => Ok(XlibSurface::name()),
        RawDisplayHandle::Wayland(_) => Ok(WaylandSurface::name()),
        other => {
            error!(display = ?other, "Unsupported windowing platform for Vulkan surface");
            Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
        }
    }
}

/// 通过 ash 调用真实驱动
#[derive(Default)]
pub struct AshApi {
    entry: Option<Entry>,
    instance: Option<Instance>,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
    surface_loader: Option<Surface>,
    surface: vk::SurfaceKHR,
    device: Option<Device>,
    swapchain_loader: Option<Swapchain>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
}

impl AshApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self) -> VkResult<&Entry> {
        if self.entry.is_none() {
            let entry = unsafe { Entry::load() }.map_err(|e| {
                error!(error = %e, "Failed to load the Vulkan library");
                vk::Result::ERROR_INITIALIZATION_FAILED
            })?;
            self.entry = Some(entry);
        }
        self.entry.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn instance(&self) -> VkResult<&Instance> {
        self.instance.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn device(&self) -> VkResult<&Device> {
        self.device.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn surface_loader(&self) -> VkResult<&Surface> {
        self.surface_loader.as_ref().ok_or(vk::Result::ERROR_SURFACE_LOST_KHR)
    }

    fn swapchain_loader(&self) -> VkResult<&Swapchain> {
        self.swapchain_loader.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn validation_layer_available(entry: &Entry) -> bool {
        unsafe { entry.enumerate_instance_layer_properties() }
            .map(|layers| {
                layers.iter().any(|layer| {
                    let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
                    name == VALIDATION_LAYER
                })
            })
            .unwrap_or(false)
    }

    fn describe_device(&self, physical: vk::PhysicalDevice) -> VkResult<PhysicalDeviceCandidate> {
        let instance = self.instance()?;
        let surface_loader = self.surface_loader()?;

        let props = unsafe { instance.get_physical_device_properties(physical) };
        let features = unsafe { instance.get_physical_device_features(physical) };
        let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(physical) }
            .iter()
            .enumerate()
            .map(|(index, family)| QueueFamilyInfo {
                flags: family.queue_flags,
                queue_count: family.queue_count,
                supports_present: unsafe {
                    surface_loader.get_physical_device_surface_support(physical, index as u32, self.surface)
                }
                .unwrap_or(false),
            })
            .collect();

        let extensions = unsafe { instance.enumerate_device_extension_properties(physical) }?
            .iter()
            .map(|ext| {
                unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();

        Ok(PhysicalDeviceCandidate {
            handle: physical,
            name,
            device_type: props.device_type,
            api_version: props.api_version,
            driver_version: props.driver_version,
            max_image_dimension_2d: props.limits.max_image_dimension2_d,
            geometry_shader: features.geometry_shader == vk::TRUE,
            sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
            queue_families,
            extensions,
            swapchain_support: self.query_swapchain_support(physical).unwrap_or_default(),
        })
    }

    fn record_barrier(
        device: &Device,
        command_buffer: vk::CommandBuffer,
        barrier: vk::ImageMemoryBarrier,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
    ) {
        unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

impl VulkanApi for AshApi {
    fn create_instance(&mut self, desc: &InstanceDesc<'_>) -> VkResult<()> {
        let surface_ext = surface_extension(&desc.display)?;
        let entry = self.entry()?.clone();

        let app_name = CString::new(desc.app_name).map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(ENGINE_NAME)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_2);

        let mut extensions: Vec<*const c_char> = vec![Surface::name().as_ptr(), surface_ext.as_ptr()];
        let mut layers: Vec<*const c_char> = Vec::new();
        if desc.enable_validation {
            if !Self::validation_layer_available(&entry) {
                error!("Validation requested but VK_LAYER_KHRONOS_validation is not installed");
                return Err(vk::Result::ERROR_LAYER_NOT_PRESENT);
            }
            layers.push(VALIDATION_LAYER.as_ptr());
            extensions.push(DebugUtils::name().as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe { entry.create_instance(&create_info, None) }?;
        self.surface_loader = Some(Surface::new(&entry, &instance));
        self.instance = Some(instance);
        Ok(())
    }

    fn create_debug_messenger(&mut self) -> VkResult<()> {
        let entry = self.entry.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let instance = self.instance()?;
        let debug_utils = DebugUtils::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }?;
        self.debug_utils = Some((debug_utils, messenger));
        Ok(())
    }

    fn create_surface(&mut self, handles: &SurfaceHandles) -> VkResult<()> {
        let entry = self.entry.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let instance = self.instance()?;

        let surface = match (handles.window, handles.display) {
            (RawWindowHandle::Win32(window), _) => {
                let hinstance = window
                    .hinstance
                    .map_or(std::ptr::null(), |h| h.get() as vk::HINSTANCE);
                let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                    .hinstance(hinstance)
                    .hwnd(window.hwnd.get() as vk::HWND);
                unsafe { Win32Surface::new(entry, instance).create_win32_surface(&create_info, None) }?
            }
            (RawWindowHandle::Xlib(window), RawDisplayHandle::Xlib(display)) => {
                let dpy = display
                    .display
                    .map_or(std::ptr::null_mut(), |d| d.as_ptr().cast());
                let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                    .dpy(dpy)
                    .window(window.window);
                unsafe { XlibSurface::new(entry, instance).create_xlib_surface(&create_info, None) }?
            }
            (RawWindowHandle::Wayland(window), RawDisplayHandle::Wayland(display)) => {
                let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                    .display(display.display.as_ptr().cast())
                    .surface(window.surface.as_ptr().cast());
                unsafe { WaylandSurface::new(entry, instance).create_wayland_surface(&create_info, None) }?
            }
            (window, _) => {
                error!(window = ?window, "Unsupported window handle for Vulkan surface");
                return Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT);
            }
        };

        self.surface = surface;
        Ok(())
    }

    fn destroy_debug_messenger(&mut self) {
        if let Some((debug_utils, messenger)) = self.debug_utils.take() {
            unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    fn destroy_surface(&mut self) {
        if self.surface == vk::SurfaceKHR::null() {
            return;
        }
        if let Some(loader) = self.surface_loader.as_ref() {
            unsafe { loader.destroy_surface(self.surface, None) };
        }
        self.surface = vk::SurfaceKHR::null();
    }

    fn destroy_instance(&mut self) {
        self.surface_loader = None;
        if let Some(instance) = self.instance.take() {
            unsafe { instance.destroy_instance(None) };
        }
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<PhysicalDeviceCandidate>> {
        let physical_devices = unsafe { self.instance()?.enumerate_physical_devices() }?;
        physical_devices
            .into_iter()
            .map(|physical| self.describe_device(physical))
            .collect()
    }

    fn query_swapchain_support(&self, device: vk::PhysicalDevice) -> VkResult<SwapchainSupportDetails> {
        let loader = self.surface_loader()?;
        unsafe {
            Ok(SwapchainSupportDetails {
                capabilities: loader.get_physical_device_surface_capabilities(device, self.surface)?,
                formats: loader.get_physical_device_surface_formats(device, self.surface)?,
                present_modes: loader.get_physical_device_surface_present_modes(device, self.surface)?,
            })
        }
    }

    fn create_logical_device(
        &mut self,
        device: &PhysicalDeviceCandidate,
        request: &DeviceRequest,
    ) -> VkResult<()> {
        let instance = self.instance.as_ref().ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;

        let families: BTreeSet<u32> = [request.graphics_family, request.present_family].into_iter().collect();
        let priorities = [1.0_f32];
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let features = vk::PhysicalDeviceFeatures::builder()
            .sampler_anisotropy(request.enable_sampler_anisotropy)
            .build();
        let extensions = [Swapchain::name().as_ptr()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let logical = unsafe { instance.create_device(device.handle, &create_info, None) }?;
        self.graphics_queue = unsafe { logical.get_device_queue(request.graphics_family, 0) };
        self.present_queue = unsafe { logical.get_device_queue(request.present_family, 0) };
        self.swapchain_loader = Some(Swapchain::new(instance, &logical));
        self.device = Some(logical);
        Ok(())
    }

    fn device_wait_idle(&mut self) -> VkResult<()> {
        unsafe { self.device()?.device_wait_idle() }
    }

    fn destroy_device(&mut self) {
        self.swapchain_loader = None;
        self.graphics_queue = vk::Queue::null();
        self.present_queue = vk::Queue::null();
        if let Some(device) = self.device.take() {
            unsafe { device.destroy_device(None) };
        }
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> VkResult<(vk::SwapchainKHR, Vec<vk::Image>)> {
        let loader = self.swapchain_loader()?;
        let families = [desc.graphics_family, desc.present_family];

        let mut create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .min_image_count(desc.image_count)
            .image_format(desc.surface_format.format)
            .image_color_space(desc.surface_format.color_space)
            .image_extent(desc.extent)
            .image_array_layers(1)
            .image_usage(desc.image_usage)
            .pre_transform(desc.pre_transform)
            .composite_alpha(desc.composite_alpha)
            .present_mode(desc.present_mode)
            .clipped(true);
        create_info = if desc.graphics_family != desc.present_family {
            create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        } else {
            create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }?;
        match unsafe { loader.get_swapchain_images(swapchain) } {
            Ok(images) => Ok((swapchain, images)),
            Err(r) => {
                unsafe { loader.destroy_swapchain(swapchain, None) };
                Err(r)
            }
        }
    }

    fn destroy_swapchain(&mut self, swapchain: vk::SwapchainKHR) {
        if swapchain == vk::SwapchainKHR::null() {
            return;
        }
        if let Some(loader) = self.swapchain_loader.as_ref() {
            unsafe { loader.destroy_swapchain(swapchain, None) };
        }
    }

    fn create_image_view(&mut self, image: vk::Image, format: vk::Format) -> VkResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(color_subresource_range());
        unsafe { self.device()?.create_image_view(&create_info, None) }
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        if let (Some(device), false) = (self.device.as_ref(), view == vk::ImageView::null()) {
            unsafe { device.destroy_image_view(view, None) };
        }
    }

    fn acquire_next_image(
        &mut self,
        swapchain: vk::SwapchainKHR,
        signal: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        let loader = self.swapchain_loader()?;
        unsafe { loader.acquire_next_image(swapchain, u64::MAX, signal, vk::Fence::null()) }
    }

    fn queue_present(
        &mut self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> VkResult<bool> {
        let loader = self.swapchain_loader()?;
        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        unsafe { loader.queue_present(self.present_queue, &present_info) }
    }

    fn create_command_pool(&mut self, queue_family: u32) -> VkResult<vk::CommandPool> {
        let create_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        unsafe { self.device()?.create_command_pool(&create_info, None) }
    }

    fn allocate_command_buffers(
        &mut self,
        pool: vk::CommandPool,
        count: u32,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        unsafe { self.device()?.allocate_command_buffers(&allocate_info) }
    }

    fn destroy_command_pool(&mut self, pool: vk::CommandPool) {
        if let (Some(device), false) = (self.device.as_ref(), pool == vk::CommandPool::null()) {
            unsafe { device.destroy_command_pool(pool, None) };
        }
    }

    fn reset_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        unsafe {
            self.device()?
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
        }
    }

    fn begin_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        let begin_info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device()?.begin_command_buffer(command_buffer, &begin_info) }
    }

    fn end_command_buffer(&mut self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        unsafe { self.device()?.end_command_buffer(command_buffer) }
    }

    fn record_clear(&mut self, command_buffer: vk::CommandBuffer, image: vk::Image, color: [f32; 4]) {
        let Some(device) = self.device.as_ref() else {
            return;
        };
        let range = color_subresource_range();

        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(range)
            .build();
        // 源阶段与提交时等待图像可用信号量的阶段一致
        Self::record_barrier(
            device,
            command_buffer,
            barrier,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::TRANSFER,
        );

        let clear_value = vk::ClearColorValue { float32: color };
        unsafe {
            device.cmd_clear_color_image(
                command_buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &clear_value,
                &[range],
            );
        }
    }

    fn record_present_transition(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image: vk::Image,
        old_layout: vk::ImageLayout,
    ) {
        let Some(device) = self.device.as_ref() else {
            return;
        };

        let (src_access, src_stage) = if old_layout == vk::ImageLayout::TRANSFER_DST_OPTIMAL {
            (vk::AccessFlags::TRANSFER_WRITE, vk::PipelineStageFlags::TRANSFER)
        } else {
            (vk::AccessFlags::empty(), vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        };

        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(old_layout)
            .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .src_access_mask(src_access)
            .dst_access_mask(vk::AccessFlags::empty())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(color_subresource_range())
            .build();
        Self::record_barrier(
            device,
            command_buffer,
            barrier,
            src_stage,
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        );
    }

    fn queue_submit(&mut self, submission: &FrameSubmission) -> VkResult<()> {
        let device = self.device()?;
        let wait_semaphores = [submission.wait_semaphore];
        let wait_stages = [submission.wait_stage];
        let command_buffers = [submission.command_buffer];
        let signal_semaphores = [submission.signal_semaphore];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();
        unsafe { device.queue_submit(self.graphics_queue, &[submit_info], submission.fence) }
    }

    fn create_semaphore(&mut self) -> VkResult<vk::Semaphore> {
        let create_info = vk::SemaphoreCreateInfo::default();
        unsafe { self.device()?.create_semaphore(&create_info, None) }
    }

    fn destroy_semaphore(&mut self, semaphore: vk::Semaphore) {
        if let (Some(device), false) = (self.device.as_ref(), semaphore == vk::Semaphore::null()) {
            unsafe { device.destroy_semaphore(semaphore, None) };
        }
    }

    fn create_fence(&mut self, signaled: bool) -> VkResult<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        unsafe { self.device()?.create_fence(&create_info, None) }
    }

    fn destroy_fence(&mut self, fence: vk::Fence) {
        if let (Some(device), false) = (self.device.as_ref(), fence == vk::Fence::null()) {
            unsafe { device.destroy_fence(fence, None) };
        }
    }

    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()> {
        unsafe { self.device()?.wait_for_fences(&[fence], true, timeout_ns) }
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> VkResult<()> {
        unsafe { self.device()?.reset_fences(&[fence]) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{WaylandDisplayHandle, WebDisplayHandle, WindowsDisplayHandle};
    use std::ptr::NonNull;

    #[test]
    fn test_new_does_not_load_vulkan() {
        let api = AshApi::new();
        assert!(api.entry.is_none());
        assert!(api.instance.is_none());
        assert_eq!(api.enumerate_physical_devices().err(), Some(vk::Result::ERROR_INITIALIZATION_FAILED));
    }

    #[test]
    fn test_surface_extension_per_platform() {
        let windows = RawDisplayHandle::Windows(WindowsDisplayHandle::new());
        assert_eq!(surface_extension(&windows), Ok(Win32Surface::name()));

        let mut dummy = 0u8;
        let wayland = RawDisplayHandle::Wayland(WaylandDisplayHandle::new(
            NonNull::from(&mut dummy).cast(),
        ));
        assert_eq!(surface_extension(&wayland), Ok(WaylandSurface::name()));

        let web = RawDisplayHandle::Web(WebDisplayHandle::new());
        assert_eq!(surface_extension(&web), Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT));
    }

    #[test]
    fn test_destroy_without_objects_is_noop() {
        let mut api = AshApi::new();
        api.destroy_image_view(vk::ImageView::null());
        api.destroy_swapchain(vk::SwapchainKHR::null());
        api.destroy_device();
        api.destroy_debug_messenger();
        api.destroy_surface();
        api.destroy_instance();
        assert_eq!(api.device_wait_idle(), Err(vk::Result::ERROR_INITIALIZATION_FAILED));
    }
}
