//! Uniform blocks shared with the WGSL shaders.
//!
//! Field order and padding follow WGSL uniform layout rules: every
//! `vec4<f32>` starts on a 16 byte boundary and the block size is a
//! multiple of 16.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::visuals::{Color, RenderConfig};

/// Per-frame parameters of the particle pass.
///
/// ```wgsl
/// struct RenderUniforms {
///     viewport: vec2<f32>,
///     point_size: f32,
///     opacity: f32,
///     color: vec4<f32>,
///     coefficients: vec4<f32>,
///     read_from_texture: u32,
/// }
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    /// Surface size in physical pixels.
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub opacity: f32,
    /// Linear particle colour, alpha unused.
    pub color: [f32; 4],
    /// Per-channel colour multipliers, alpha unused.
    pub coefficients: [f32; 4],
    /// Non-zero to take colour from the bound image.
    pub read_from_texture: u32,
    pub _padding: [u32; 3],
}

impl RenderUniforms {
    pub fn new(render: &RenderConfig, viewport: (u32, u32), coefficients: Vec3) -> Self {
        Self {
            viewport: [viewport.0 as f32, viewport.1 as f32],
            point_size: render.point_size,
            opacity: render.opacity,
            color: rgb_padded(render.particle_color),
            coefficients: coefficients.extend(1.0).to_array(),
            read_from_texture: render.read_from_texture as u32,
            _padding: [0; 3],
        }
    }
}

/// Parameters of the fade pass that produces the motion blur trail.
///
/// ```wgsl
/// struct FadeUniforms {
///     color: vec4<f32>,
/// }
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FadeUniforms {
    /// Linear background colour with the fade alpha in `w`.
    pub color: [f32; 4],
}

impl FadeUniforms {
    pub fn new(render: &RenderConfig) -> Self {
        let [r, g, b] = render.background_color.to_linear().to_array();
        Self {
            color: [r, g, b, render.fade_alpha],
        }
    }
}

fn rgb_padded(color: Color) -> [f32; 4] {
    color.to_linear().extend(1.0).to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_render_uniform_layout() {
        assert_eq!(size_of::<RenderUniforms>(), 64);
        assert_eq!(offset_of!(RenderUniforms, color), 16);
        assert_eq!(offset_of!(RenderUniforms, coefficients), 32);
        assert_eq!(offset_of!(RenderUniforms, read_from_texture), 48);
        assert_eq!(size_of::<FadeUniforms>() % 16, 0);
    }

    #[test]
    fn test_from_config() {
        let mut render = RenderConfig::default();
        render.read_from_texture = true;
        let u = RenderUniforms::new(&render, (800, 600), Vec3::ONE);
        assert_eq!(u.viewport, [800.0, 600.0]);
        assert_eq!(u.point_size, 2.0);
        assert_eq!(u.read_from_texture, 1);
        assert_eq!(u.coefficients, [1.0; 4]);

        let fade = FadeUniforms::new(&render);
        assert_eq!(fade.color[3], render.fade_alpha);
    }
}
