//! Error types for dustfield.
//!
//! Engine operations reject bad arguments up front and leave the particle
//! state untouched. The renderer and the window shell have their own error
//! enums so a GPU failure never leaks into simulation code.

use thiserror::Error;

/// Errors returned by [`Engine`](crate::Engine) mutation operations.
///
/// Every variant is produced before any state is touched, so a rejected
/// call leaves the previous particles, heavy particles and output buffer
/// exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A resize asked for zero particles.
    #[error("invalid particle count {requested}: at least one particle is required")]
    InvalidParticleCount {
        /// The rejected count.
        requested: usize,
    },

    /// A resize asked for more particles than the configured ceiling.
    #[error("particle count {requested} exceeds capacity {capacity}")]
    CapacityExceeded {
        /// The rejected count.
        requested: usize,
        /// The configured ceiling.
        capacity: usize,
    },

    /// A heavy particle command asked for an unsupported polygon size.
    #[error("invalid heavy particle count {requested}: expected 1..={max}")]
    InvalidHeavyCount {
        /// The rejected count.
        requested: usize,
        /// The configured maximum.
        max: usize,
    },

    /// A configuration value is outside the range the step can handle.
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending [`SimConfig`](crate::config::SimConfig) field.
        field: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode the image.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read the file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// Pixel data does not match the declared dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// `width * height * 4`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan/Metal/DX12/WebGPU capable device is required")]
    NoAdapter,
    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable format.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors that can end an interactive session.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create the event loop or run it.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Texture loading failed.
    #[error("texture error: {0}")]
    Texture(#[from] TextureError),
    /// Initial particle setup was rejected.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// Settings file could not be read.
    #[error("failed to read settings: {0}")]
    SettingsIo(#[from] std::io::Error),
    /// Settings file is not valid JSON for [`Settings`](crate::config::Settings).
    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),
}
