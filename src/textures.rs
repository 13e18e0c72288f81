//! Image textures for colouring particles.
//!
//! When [`RenderConfig::read_from_texture`](crate::visuals::RenderConfig)
//! is on, each particle takes the colour of the image pixel underneath its
//! current position. The image is stretched over the whole canvas.
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use std::path::Path;

use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default).
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering. Good for pixel art.
    Nearest,
}

impl FilterMode {
    pub fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Linear => wgpu::FilterMode::Linear,
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// RGBA8 pixels plus sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureConfig {
    /// Raw RGBA pixel data (width * height * 4 bytes), top row first.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
}

impl TextureConfig {
    /// Wrap raw RGBA data.
    ///
    /// ```ignore
    /// // 2x1: white then black
    /// let tex = TextureConfig::from_rgba(vec![255, 255, 255, 255, 0, 0, 0, 255], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected || expected == 0 {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
        })
    }

    /// Load and decode an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        log::info!("loaded texture {} ({}x{})", path.display(), width, height);
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// A 1x1 texture, bound when no image is loaded.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            filter: FilterMode::Nearest,
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self::solid(255, 255, 255, 255)
    }
}
