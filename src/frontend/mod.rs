//! 图形前端
//!
//! 拥有窗口和图形后端，驱动每一帧：
//! 泵窗口事件 → 计时 → 转发尺寸变化 → 宿主更新 → 渲染 → 限帧。
//! 宿主通过四个回调（更新、渲染、尺寸变化、输入）接入，
//! 并通过 [`FrontendHandle`] 在回调中请求关闭、暂停或恢复。

pub mod graphics_frontend;
pub mod handle;

pub use graphics_frontend::{BackendFactory, FrontendState, GraphicsFrontend};
pub use handle::FrontendHandle;
