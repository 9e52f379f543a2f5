//! 错误处理模块
//!
//! 定义了引擎中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! - `BackendError`：图形后端的封闭错误分类，每个后端操作都返回 `BackendResult`
//! - `ConfigError` / `WindowError`：配置和窗口系统错误
//! - `LumiosError`：引擎顶层错误，包装以上所有错误

use ash::vk;
use thiserror::Error;

/// 引擎统一的 Result 类型
pub type Result<T> = std::result::Result<T, LumiosError>;

/// 后端操作的 Result 类型
///
/// `Ok` 即成功，`Err` 携带具体的失败分类。
pub type BackendResult<T = ()> = std::result::Result<T, BackendError>;

/// 图形后端错误分类
///
/// 这是一个封闭的枚举，所有后端（Vulkan、DirectX 12）共享同一套分类，
/// 前端只依据分类做状态迁移，不关心底层 API 的具体错误码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum BackendError {
    #[error("backend initialization failed")]
    FailedInitialization,

    #[error("logical device creation failed")]
    FailedDeviceCreation,

    #[error("swapchain creation failed")]
    FailedSwapchainCreation,

    #[error("command buffer creation or recording failed")]
    FailedCommandBufferCreation,

    #[error("synchronization object creation failed")]
    FailedSyncCreation,

    #[error("device lost")]
    DeviceLost,

    #[error("out of memory")]
    OutOfMemory,

    #[error("surface lost")]
    SurfaceLost,

    #[error("unknown backend error")]
    Unknown,
}

impl BackendError {
    /// 将 Vulkan 结果码归类为后端错误
    ///
    /// 设备丢失、内存耗尽、表面丢失有各自的分类，
    /// 其余错误码归入调用步骤对应的 `fallback`。
    ///
    /// # 示例
    ///
    /// ```
    /// use ash::vk;
    /// use lumios::core::error::BackendError;
    ///
    /// let err = BackendError::from_vk(vk::Result::ERROR_DEVICE_LOST, BackendError::Unknown);
    /// assert_eq!(err, BackendError::DeviceLost);
    /// ```
    pub fn from_vk(result: vk::Result, fallback: BackendError) -> Self {
        match result {
            vk::Result::ERROR_DEVICE_LOST => BackendError::DeviceLost,
            vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
                BackendError::OutOfMemory
            }
            vk::Result::ERROR_SURFACE_LOST_KHR => BackendError::SurfaceLost,
            _ => fallback,
        }
    }
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 窗口系统相关的错误
#[derive(Debug, Error)]
pub enum WindowError {
    /// 事件循环创建失败
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// 窗口创建失败
    #[error("window creation failed: {0}")]
    Creation(String),

    /// 无法获取原生窗口句柄
    #[error("raw window handle unavailable: {0}")]
    Handle(String),
}

/// Lumios 引擎的错误类型
#[derive(Debug, Error)]
pub enum LumiosError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("graphics backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("window error: {0}")]
    Window(#[from] WindowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("initialization error: {0}")]
    Initialization(String),
}
