//! 交换链管理
//!
//! 选择策略：
//! - 表面格式：优先 `B8G8R8A8_SRGB` + `SRGB_NONLINEAR`，否则取驱动报告的第一个格式
//! - 呈现模式：优先配置的模式，表面不支持时回退到总是可用的 `FIFO`
//! - 尺寸：表面给出确定的当前尺寸时直接使用，否则把帧缓冲尺寸夹到表面的最小/最大范围内
//! - 图像数量：最小数量 + 1，不超过最大数量

use ash::vk;
use tracing::{debug, info};

use super::api::{SwapchainDesc, VulkanApi};
use super::device::{QueueFamilyIndices, SwapchainSupportDetails};
use crate::core::config::PresentMode;
use crate::core::error::{BackendError, BackendResult};

/// 首选的表面格式
pub const PREFERRED_FORMAT: vk::Format = vk::Format::B8G8R8A8_SRGB;
/// 首选的色彩空间
pub const PREFERRED_COLOR_SPACE: vk::ColorSpaceKHR = vk::ColorSpaceKHR::SRGB_NONLINEAR;

/// 交换链图像下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageIndex(pub u32);

impl ImageIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// 配置中的呈现模式到 Vulkan 呈现模式
pub fn to_vk_present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
    }
}

/// 选择表面格式，列表为空时返回 `None`
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == PREFERRED_FORMAT && f.color_space == PREFERRED_COLOR_SPACE)
        .or_else(|| formats.first())
        .copied()
}

pub fn choose_present_mode(available: &[vk::PresentModeKHR], preferred: PresentMode) -> vk::PresentModeKHR {
    let preferred = to_vk_present_mode(preferred);
    if available.contains(&preferred) {
        preferred
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// 选择交换链尺寸
///
/// `current_extent.width == u32::MAX` 表示表面尺寸由交换链决定。
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, framebuffer: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    vk::Extent2D {
        width: framebuffer.0.clamp(min.width, max.width.max(min.width)),
        height: framebuffer.1.clamp(min.height, max.height.max(min.height)),
    }
}

pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// 优先不透明合成，否则取表面支持的第一种
pub fn choose_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ]
    .into_iter()
    .find(|flag| supported.contains(*flag))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// 交换链及其图像视图
///
/// 不变量：图像视图数量始终等于图像数量（创建失败时两者都为空）。
#[derive(Debug)]
pub struct SwapchainManager {
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
    usage: vk::ImageUsageFlags,
}

impl Default for SwapchainManager {
    fn default() -> Self {
        Self {
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::SurfaceFormatKHR::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            extent: vk::Extent2D::default(),
            usage: vk::ImageUsageFlags::empty(),
        }
    }
}

impl SwapchainManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建交换链和图像视图
    ///
    /// # 参数
    ///
    /// * `support` - 表面的最新支持信息（尺寸随窗口变化，重建前需要重新查询）
    /// * `framebuffer` - 窗口帧缓冲尺寸，调用方保证非零
    /// * `preferred_mode` - 配置的呈现模式
    /// * `queues` - 图形/呈现队列族，不同时使用并发共享模式
    pub fn create<A: VulkanApi>(
        &mut self,
        api: &mut A,
        support: &SwapchainSupportDetails,
        framebuffer: (u32, u32),
        preferred_mode: PresentMode,
        queues: &QueueFamilyIndices,
    ) -> BackendResult {
        let caps = &support.capabilities;
        let format = choose_surface_format(&support.formats).ok_or(BackendError::FailedSwapchainCreation)?;
        let present_mode = choose_present_mode(&support.present_modes, preferred_mode);
        let extent = choose_extent(caps, framebuffer);
        if extent.width == 0 || extent.height == 0 {
            tracing::error!(width = extent.width, height = extent.height, "Refusing to create zero-sized swapchain");
            return Err(BackendError::FailedSwapchainCreation);
        }

        let (graphics_family, present_family) = match (queues.graphics, queues.present) {
            (Some(g), Some(p)) => (g, p),
            _ => return Err(BackendError::FailedSwapchainCreation),
        };

        let mut usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
        if caps.supported_usage_flags.contains(vk::ImageUsageFlags::TRANSFER_DST) {
            usage |= vk::ImageUsageFlags::TRANSFER_DST;
        }

        let desc = SwapchainDesc {
            surface_format: format,
            present_mode,
            extent,
            image_count: choose_image_count(caps),
            image_usage: usage,
            pre_transform: caps.current_transform,
            composite_alpha: choose_composite_alpha(caps.supported_composite_alpha),
            graphics_family,
            present_family,
        };

        let (swapchain, images) = api
            .create_swapchain(&desc)
            .map_err(|r| BackendError::from_vk(r, BackendError::FailedSwapchainCreation))?;

        let mut views = Vec::with_capacity(images.len());
        for &image in &images {
            match api.create_image_view(image, format.format) {
                Ok(view) => views.push(view),
                Err(r) => {
                    for view in views {
                        api.destroy_image_view(view);
                    }
                    api.destroy_swapchain(swapchain);
                    return Err(BackendError::from_vk(r, BackendError::FailedSwapchainCreation));
                }
            }
        }

        self.swapchain = swapchain;
        self.images = images;
        self.image_views = views;
        self.format = format;
        self.present_mode = present_mode;
        self.extent = extent;
        self.usage = usage;

        info!(
            width = extent.width,
            height = extent.height,
            images = self.images.len(),
            format = ?format.format,
            present_mode = ?present_mode,
            "Swapchain created"
        );
        Ok(())
    }

    /// 销毁图像视图和交换链，未创建时什么也不做
    pub fn destroy<A: VulkanApi>(&mut self, api: &mut A) {
        if !self.is_created() {
            return;
        }
        for view in self.image_views.drain(..) {
            api.destroy_image_view(view);
        }
        api.destroy_swapchain(self.swapchain);
        self.swapchain = vk::SwapchainKHR::null();
        self.images.clear();
        debug!("Swapchain destroyed");
    }

    pub fn is_created(&self) -> bool {
        self.swapchain != vk::SwapchainKHR::null()
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn image(&self, index: ImageIndex) -> Option<vk::Image> {
        self.images.get(index.as_usize()).copied()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn image_view_count(&self) -> usize {
        self.image_views.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// 图像能否作为传输目标（用于清屏）
    pub fn supports_clear(&self) -> bool {
        self.usage.contains(vk::ImageUsageFlags::TRANSFER_DST)
    }

    /// 交换链图像占用的显存估计值（字节），按每像素 4 字节计
    pub fn memory_estimate(&self) -> u64 {
        self.images.len() as u64 * u64::from(self.extent.width) * u64::from(self.extent.height) * 4
    }
}
