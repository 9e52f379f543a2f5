//! 图形后端模块
//!
//! 本模块封装了不同图形 API 的底层实现，包括：
//! - Vulkan：跨平台的现代图形 API
//! - DirectX 12：目前为满足同一契约的占位实现
//!
//! 所有后端都实现了统一的 `GraphicsBackend` trait，
//! 前端通过 [`create_backend`] 获得 trait 对象，不依赖具体 API。

pub mod backend;
pub mod dx12;
pub mod vulkan;

pub use backend::{BackendState, FrameStatus, GraphicsBackend, RenderStats};
pub use dx12::Dx12Backend;
pub use vulkan::VulkanBackend;

use tracing::debug;

use crate::core::config::GraphicsApi;

/// 为指定的图形 API 创建未初始化的后端
///
/// `AutoSelect` 目前在所有平台上都解析为 Vulkan。
///
/// # 示例
///
/// ```no_run
/// use lumios::core::config::GraphicsApi;
/// use lumios::gfx::create_backend;
///
/// let backend = create_backend(GraphicsApi::AutoSelect);
/// assert_eq!(backend.api_name(), "Vulkan");
/// ```
pub fn create_backend(api: GraphicsApi) -> Box<dyn GraphicsBackend> {
    let resolved = api.resolve();
    debug!(requested = %api, resolved = %resolved, "Creating graphics backend");
    match resolved {
        GraphicsApi::DirectX12 => Box::new(Dx12Backend::new()),
        GraphicsApi::Vulkan | GraphicsApi::AutoSelect => Box::new(VulkanBackend::new()),
    }
}

/// 按名称创建后端，无法识别的名称返回 `None`
///
/// 接受的名称与 [`GraphicsApi`] 的解析规则一致（如 `"vulkan"`、`"dx12"`、`"auto"`）。
pub fn create_backend_by_name(name: &str) -> Option<Box<dyn GraphicsBackend>> {
    name.parse::<GraphicsApi>().ok().map(create_backend)
}
