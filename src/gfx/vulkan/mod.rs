//! Vulkan 图形 API 实现模块
//!
//! - `api`: 原生调用的接缝，后端只通过它访问驱动
//! - `ash_api`: 基于 ash 的生产实现
//! - `device`: 队列族发现与物理设备评分
//! - `swapchain`: 交换链创建、重建与图像视图
//! - `frame`: 帧槽位与同步对象
//! - `backend`: 组合以上部分的 [`VulkanBackend`]

pub mod api;
pub mod ash_api;
pub mod backend;
pub mod device;
pub mod frame;
pub mod swapchain;

#[cfg(test)]
pub(crate) mod mock;

// 重新导出常用类型
pub use api::VulkanApi;
pub use ash_api::AshApi;
pub use backend::VulkanBackend;
pub use device::{PhysicalDeviceCandidate, QueueFamilyIndices};
pub use swapchain::SwapchainManager;
