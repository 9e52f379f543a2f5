//! 配置管理模块
//!
//! 提供引擎配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (lumios.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "Lumios Engine"
//! resizable = true
//!
//! [render]
//! api = "auto"            # vulkan, dx12, auto
//! present_mode = "fifo"   # immediate, fifo, fifo_relaxed, mailbox
//! msaa_samples = 1
//! enable_validation = true
//! max_frames_in_flight = 2
//!
//! [performance]
//! target_fps = 60
//!
//! [logging]
//! level = "info"          # trace, debug, info, warn, error
//! file_output = false
//! ```
//!
//! 所有数值在加载后都会经过 [`GraphicsConfig::sanitize`]，
//! 与 setter 使用同一套夹取规则。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::{ConfigError, Result};

/// 默认窗口标题
pub const DEFAULT_WINDOW_TITLE: &str = "Lumios Engine";

/// 同时在飞帧数的上下限
pub const MIN_FRAMES_IN_FLIGHT: u32 = 1;
pub const MAX_FRAMES_IN_FLIGHT: u32 = 8;

/// 目标帧率的上下限
pub const MIN_TARGET_FPS: u32 = 30;
pub const MAX_TARGET_FPS: u32 = 300;

/// 图形 API 选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphicsApi {
    /// Vulkan 后端
    #[serde(rename = "vulkan")]
    Vulkan,
    /// DirectX 12 后端
    #[serde(rename = "dx12")]
    DirectX12,
    /// 由引擎自动选择
    #[serde(rename = "auto")]
    AutoSelect,
}

impl GraphicsApi {
    /// 获取 API 名称
    pub fn name(&self) -> &'static str {
        match self {
            GraphicsApi::Vulkan => "Vulkan",
            GraphicsApi::DirectX12 => "DirectX 12",
            GraphicsApi::AutoSelect => "Auto",
        }
    }

    /// 解析为具体的 API
    ///
    /// `AutoSelect` 在所有平台上都解析为 Vulkan。
    pub fn resolve(self) -> GraphicsApi {
        match self {
            GraphicsApi::AutoSelect => GraphicsApi::Vulkan,
            api => api,
        }
    }
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphicsApi {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vulkan" | "vk" => Ok(GraphicsApi::Vulkan),
            "dx12" | "directx12" | "d3d12" => Ok(GraphicsApi::DirectX12),
            "auto" | "autoselect" => Ok(GraphicsApi::AutoSelect),
            other => Err(ConfigError::InvalidValue {
                field: "render.api".to_string(),
                reason: format!("unknown graphics api '{other}'"),
            }),
        }
    }
}

/// 呈现模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    /// 立即呈现，可能撕裂
    Immediate,
    /// 垂直同步队列
    Fifo,
    /// 垂直同步，迟到的帧立即呈现
    FifoRelaxed,
    /// 三重缓冲，只保留最新一帧
    Mailbox,
}

impl PresentMode {
    /// 该模式是否等价于开启垂直同步
    pub fn is_vsync(&self) -> bool {
        matches!(self, PresentMode::Fifo | PresentMode::FifoRelaxed)
    }
}

impl FromStr for PresentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "immediate" => Ok(PresentMode::Immediate),
            "fifo" => Ok(PresentMode::Fifo),
            "fifo_relaxed" => Ok(PresentMode::FifoRelaxed),
            "mailbox" => Ok(PresentMode::Mailbox),
            other => Err(ConfigError::InvalidValue {
                field: "render.present_mode".to_string(),
                reason: format!("unknown present mode '{other}'"),
            }),
        }
    }
}

/// MSAA 采样数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MsaaSamples {
    X1 = 1,
    X2 = 2,
    X4 = 4,
    X8 = 8,
    X16 = 16,
}

impl MsaaSamples {
    /// 采样数
    pub fn count(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for MsaaSamples {
    type Error = ConfigError;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(MsaaSamples::X1),
            2 => Ok(MsaaSamples::X2),
            4 => Ok(MsaaSamples::X4),
            8 => Ok(MsaaSamples::X8),
            16 => Ok(MsaaSamples::X16),
            _ => Err(ConfigError::InvalidValue {
                field: "render.msaa_samples".to_string(),
                reason: "MSAA samples must be 1, 2, 4, 8, or 16".to_string(),
            }),
        }
    }
}

impl From<MsaaSamples> for u32 {
    fn from(samples: MsaaSamples) -> Self {
        samples.count()
    }
}

/// 窗口配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub fullscreen: bool,

    /// 是否可调整大小
    #[serde(default = "default_true")]
    pub resizable: bool,

    /// 是否带系统装饰（标题栏、边框）
    #[serde(default = "default_true")]
    pub decorated: bool,

    #[serde(default)]
    pub maximized: bool,
}

/// 渲染配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 图形 API 选择
    #[serde(default = "default_api")]
    pub api: GraphicsApi,

    /// 呈现模式，同时决定垂直同步
    #[serde(default = "default_present_mode")]
    pub present_mode: PresentMode,

    /// MSAA 采样数
    #[serde(default = "default_msaa")]
    pub msaa_samples: MsaaSamples,

    /// 是否启用验证层
    #[serde(default = "default_true")]
    pub enable_validation: bool,

    /// 是否启用调试标记
    #[serde(default = "default_true")]
    pub enable_debug_markers: bool,

    /// 同时在飞的帧数（1-8）
    #[serde(default = "default_frames_in_flight")]
    pub max_frames_in_flight: u32,

    /// 各向异性过滤
    #[serde(default = "default_true")]
    pub enable_anisotropic_filtering: bool,

    #[serde(default = "default_max_anisotropy")]
    pub max_anisotropy: f32,

    /// 交换链图像的清屏颜色（RGBA）
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 性能配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default)]
    pub enable_gpu_timing: bool,

    #[serde(default)]
    pub enable_cpu_timing: bool,

    /// 目标帧率（30-300），仅在关闭垂直同步时用于限帧
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    #[serde(default)]
    pub adaptive_quality: bool,
}

/// 图形配置
///
/// 前端持有一份，后端在初始化时复制一份。
/// 垂直同步不单独存储，始终由 `present_mode` 推导，
/// 因此二者不可能不一致。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphicsConfig {
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 引擎配置
///
/// 配置文件的顶层结构：图形配置各节加上 `[logging]`。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub graphics: GraphicsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { DEFAULT_WINDOW_TITLE.to_string() }
fn default_true() -> bool { true }
fn default_api() -> GraphicsApi { GraphicsApi::AutoSelect }
fn default_present_mode() -> PresentMode { PresentMode::Fifo }
fn default_msaa() -> MsaaSamples { MsaaSamples::X1 }
fn default_frames_in_flight() -> u32 { 2 }
fn default_max_anisotropy() -> f32 { 16.0 }
fn default_clear_color() -> [f32; 4] { [0.1, 0.1, 0.12, 1.0] }
fn default_target_fps() -> u32 { 60 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "lumios.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            fullscreen: false,
            resizable: true,
            decorated: true,
            maximized: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            api: default_api(),
            present_mode: default_present_mode(),
            msaa_samples: default_msaa(),
            enable_validation: true,
            enable_debug_markers: true,
            max_frames_in_flight: default_frames_in_flight(),
            enable_anisotropic_filtering: true,
            max_anisotropy: default_max_anisotropy(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enable_gpu_timing: false,
            enable_cpu_timing: false,
            target_fps: default_target_fps(),
            adaptive_quality: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl GraphicsConfig {
    /// 设置窗口尺寸，每个维度至少为 1
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window.width = width.max(1);
        self.window.height = height.max(1);
    }

    /// 设置窗口标题，空标题回退为默认标题
    pub fn set_window_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.window.title = if title.is_empty() { default_title() } else { title };
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window.fullscreen = fullscreen;
    }

    pub fn set_api(&mut self, api: GraphicsApi) {
        self.render.api = api;
    }

    /// 开关垂直同步
    ///
    /// 开启映射为 `Fifo`，关闭映射为 `Immediate`。
    pub fn set_vsync(&mut self, enabled: bool) {
        self.render.present_mode = if enabled { PresentMode::Fifo } else { PresentMode::Immediate };
    }

    /// 当前是否开启垂直同步
    pub fn vsync(&self) -> bool {
        self.render.present_mode.is_vsync()
    }

    pub fn set_present_mode(&mut self, mode: PresentMode) {
        self.render.present_mode = mode;
    }

    pub fn set_msaa_samples(&mut self, samples: MsaaSamples) {
        self.render.msaa_samples = samples;
    }

    pub fn set_validation(&mut self, enabled: bool) {
        self.render.enable_validation = enabled;
    }

    /// 设置同时在飞的帧数，夹取到 1-8
    pub fn set_max_frames_in_flight(&mut self, frames: u32) {
        self.render.max_frames_in_flight = frames.clamp(MIN_FRAMES_IN_FLIGHT, MAX_FRAMES_IN_FLIGHT);
    }

    /// 设置目标帧率，夹取到 30-300
    pub fn set_target_fps(&mut self, fps: u32) {
        self.performance.target_fps = fps.clamp(MIN_TARGET_FPS, MAX_TARGET_FPS);
    }

    /// 把直接写入字段（或从文件加载）的值按 setter 的规则重新夹取
    pub fn sanitize(&mut self) {
        self.set_window_size(self.window.width, self.window.height);
        let title = std::mem::take(&mut self.window.title);
        self.set_window_title(title);
        self.set_max_frames_in_flight(self.render.max_frames_in_flight);
        self.set_target_fps(self.performance.target_fps);
        if !self.render.max_anisotropy.is_finite() || self.render.max_anisotropy < 1.0 {
            self.render.max_anisotropy = 1.0;
        }
    }

    /// 返回配置中所有不合法的项
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.window.width == 0 || self.window.height == 0 {
            errors.push("window dimensions must be greater than 0".to_string());
        }
        if self.window.title.is_empty() {
            errors.push("window title must not be empty".to_string());
        }
        if !(MIN_FRAMES_IN_FLIGHT..=MAX_FRAMES_IN_FLIGHT).contains(&self.render.max_frames_in_flight) {
            errors.push(format!(
                "max_frames_in_flight must be within {MIN_FRAMES_IN_FLIGHT}-{MAX_FRAMES_IN_FLIGHT}"
            ));
        }
        if !(MIN_TARGET_FPS..=MAX_TARGET_FPS).contains(&self.performance.target_fps) {
            errors.push(format!("target_fps must be within {MIN_TARGET_FPS}-{MAX_TARGET_FPS}"));
        }
        if self.render.enable_anisotropic_filtering && self.render.max_anisotropy < 1.0 {
            errors.push("max_anisotropy must be at least 1.0".to_string());
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

impl EngineConfig {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回夹取后的 `EngineConfig`，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: EngineConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.graphics.sanitize();
        Ok(config)
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(path = %path.as_ref().display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 验证配置的有效性
    ///
    /// 配置有效返回 `Ok(())`，否则返回第一个错误
    pub fn validate(&self) -> Result<()> {
        match self.graphics.validation_errors().into_iter().next() {
            None => Ok(()),
            Some(reason) => Err(ConfigError::InvalidValue {
                field: "graphics".to_string(),
                reason,
            }
            .into()),
        }
    }
}
