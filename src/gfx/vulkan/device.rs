//! 物理设备选择
//!
//! 每个候选设备得到一个分数：
//!
//! | 项目 | 分数 |
//! |------|------|
//! | 独立显卡 / 集成显卡 / 其他 | 10000 / 1000 / 100 |
//! | 最大 2D 图像尺寸 | 原值 |
//! | 几何着色器 | +100 |
//! | 各向异性采样 | +50 |
//!
//! 队列族不完整、缺少交换链扩展、或表面格式/呈现模式为空的设备得 0 分，
//! 不参与选择。最高分胜出，同分时先枚举到的设备胜出。

use ash::extensions::khr::Swapchain;
use ash::vk;
use tracing::{debug, info};

use crate::core::error::{BackendError, BackendResult};

/// 队列族能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyInfo {
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
    /// 能否向当前表面呈现
    pub supports_present: bool,
}

/// 队列族索引
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
    pub compute: Option<u32>,
    pub transfer: Option<u32>,
}

impl QueueFamilyIndices {
    /// 在队列族列表中查找各类队列
    ///
    /// 呈现队列优先使用图形队列所在的族；
    /// 计算和传输队列优先使用专用族（不带图形能力）。
    pub fn find(families: &[QueueFamilyInfo]) -> Self {
        let usable = || {
            families
                .iter()
                .enumerate()
                .filter(|(_, family)| family.queue_count > 0)
                .map(|(index, family)| (index as u32, family))
        };

        let graphics = usable()
            .find(|(_, f)| f.flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|(i, _)| i);

        let present = graphics
            .filter(|&g| families[g as usize].supports_present)
            .or_else(|| usable().find(|(_, f)| f.supports_present).map(|(i, _)| i));

        let compute = usable()
            .find(|(_, f)| {
                f.flags.contains(vk::QueueFlags::COMPUTE) && !f.flags.contains(vk::QueueFlags::GRAPHICS)
            })
            .or_else(|| usable().find(|(_, f)| f.flags.contains(vk::QueueFlags::COMPUTE)))
            .map(|(i, _)| i);

        let transfer = usable()
            .find(|(_, f)| {
                f.flags.contains(vk::QueueFlags::TRANSFER)
                    && !f.flags.intersects(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
            })
            .or_else(|| usable().find(|(_, f)| f.flags.contains(vk::QueueFlags::TRANSFER)))
            .map(|(i, _)| i);

        Self { graphics, present, compute, transfer }
    }

    /// 图形队列和呈现队列都已找到
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn compute_or_graphics(&self) -> Option<u32> {
        self.compute.or(self.graphics)
    }

    pub fn transfer_or_graphics(&self) -> Option<u32> {
        self.transfer.or(self.graphics)
    }
}

/// 表面对交换链的支持情况
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// 一个候选物理设备的全部选择依据
#[derive(Debug, Clone)]
pub struct PhysicalDeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
    pub driver_version: u32,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    pub sampler_anisotropy: bool,
    pub queue_families: Vec<QueueFamilyInfo>,
    pub extensions: Vec<String>,
    pub swapchain_support: SwapchainSupportDetails,
}

impl PhysicalDeviceCandidate {
    pub fn queue_family_indices(&self) -> QueueFamilyIndices {
        QueueFamilyIndices::find(&self.queue_families)
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| ext == name)
    }

    pub fn supports_swapchain(&self) -> bool {
        Swapchain::name()
            .to_str()
            .map(|name| self.supports_extension(name))
            .unwrap_or(false)
    }
}

/// 设备类型的基础分
pub fn device_type_score(device_type: vk::PhysicalDeviceType) -> u64 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 10_000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1_000,
        _ => 100,
    }
}

/// 计算候选设备的分数，0 表示不合格
pub fn score_device(candidate: &PhysicalDeviceCandidate) -> u64 {
    if !candidate.queue_family_indices().is_complete()
        || !candidate.supports_swapchain()
        || !candidate.swapchain_support.is_adequate()
    {
        return 0;
    }

    let mut score = device_type_score(candidate.device_type);
    score += u64::from(candidate.max_image_dimension_2d);
    if candidate.geometry_shader {
        score += 100;
    }
    if candidate.sampler_anisotropy {
        score += 50;
    }
    score
}

/// 选出分数最高的设备，返回其在 `candidates` 中的下标
pub fn select_device(candidates: &[PhysicalDeviceCandidate]) -> BackendResult<usize> {
    let mut best: Option<(usize, u64)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let score = score_device(candidate);
        debug!(
            device = %candidate.name,
            device_type = ?candidate.device_type,
            score,
            "Scored physical device"
        );
        // 严格大于：同分时保留先枚举到的设备
        if score > 0 && best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, score)) => {
            let chosen = &candidates[index];
            info!(
                device = %chosen.name,
                device_type = ?chosen.device_type,
                driver = %format_driver_version(chosen.driver_version),
                score,
                "Selected physical device"
            );
            Ok(index)
        }
        None => {
            tracing::error!(candidates = candidates.len(), "No suitable GPU found");
            Err(BackendError::FailedInitialization)
        }
    }
}

/// 以 major.minor.patch 格式化驱动版本
pub fn format_driver_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    )
}
