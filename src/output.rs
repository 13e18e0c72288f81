//! Packed per-frame float buffer handed to the renderer.
//!
//! Each particle owns `channels` consecutive floats: NDC x, NDC y and,
//! in the three channel layout, an opacity value.

use serde::{Deserialize, Serialize};

/// Value written in place of a non-finite coordinate. Lies outside the
/// clip volume so the point is never rasterized.
pub const OFFSCREEN: f32 = -2.0;

/// Per-particle layout of the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// `[x, y]`
    Position,
    /// `[x, y, opacity]`
    #[default]
    PositionOpacity,
}

impl ChannelLayout {
    /// Floats per particle.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            ChannelLayout::Position => 2,
            ChannelLayout::PositionOpacity => 3,
        }
    }

    /// Bytes per particle.
    #[inline]
    pub const fn stride(self) -> usize {
        self.channels() * std::mem::size_of::<f32>()
    }
}

/// Output buffer sized to exactly `channels * particle_count` floats.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: Vec<f32>,
    layout: ChannelLayout,
    particle_count: usize,
}

impl OutputBuffer {
    pub fn new(layout: ChannelLayout) -> Self {
        Self {
            data: Vec::new(),
            layout,
            particle_count: 0,
        }
    }

    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Number of particles the buffer is currently sized for.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Raw bytes for a GPU upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Whether the buffer holds exactly one record per particle.
    #[inline]
    pub fn fits(&self, particle_count: usize) -> bool {
        self.particle_count == particle_count && self.data.len() == self.layout.channels() * particle_count
    }

    /// Resize to `particle_count` records if the size does not already
    /// match. Returns whether a reallocation happened. New slots read as
    /// off-screen points.
    pub fn ensure_size(&mut self, particle_count: usize) -> bool {
        if self.fits(particle_count) {
            return false;
        }
        let len = self.layout.channels() * particle_count;
        self.data.clear();
        self.data.resize(len, OFFSCREEN);
        self.particle_count = particle_count;
        log::debug!(
            "output buffer sized for {} particles ({} floats)",
            particle_count,
            len
        );
        true
    }

    /// Switch layouts. The buffer is emptied and must be resized before
    /// the next write.
    pub fn set_layout(&mut self, layout: ChannelLayout) {
        if layout != self.layout {
            self.layout = layout;
            self.data.clear();
            self.particle_count = 0;
        }
    }

    /// Whether every value is finite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        assert_eq!(ChannelLayout::Position.channels(), 2);
        assert_eq!(ChannelLayout::PositionOpacity.channels(), 3);
        assert_eq!(ChannelLayout::PositionOpacity.stride(), 12);
    }

    #[test]
    fn test_ensure_size() {
        let mut out = OutputBuffer::new(ChannelLayout::PositionOpacity);
        assert!(out.ensure_size(10));
        assert_eq!(out.len(), 30);
        assert!(!out.ensure_size(10));
        assert!(out.ensure_size(4));
        assert_eq!(out.len(), 12);
        assert!(out.fits(4));
        assert!(out.all_finite());
    }

    #[test]
    fn test_layout_switch_requires_resize() {
        let mut out = OutputBuffer::new(ChannelLayout::PositionOpacity);
        out.ensure_size(5);
        out.set_layout(ChannelLayout::Position);
        assert!(!out.fits(5));
        out.ensure_size(5);
        assert_eq!(out.len(), 10);
        assert_eq!(out.as_bytes().len(), 40);
    }
}
