//! DirectX 12 图形 API 实现模块
//!
//! 目前只有满足后端契约的占位实现，所有平台都可以编译。

pub mod backend;

pub use backend::Dx12Backend;
