//! Render-side configuration.
//!
//! None of these values affect the simulation. They are handed to the
//! renderer as uniforms every frame.
//!
//! # Usage
//!
//! ```ignore
//! let mut render = RenderConfig::default();
//! render.set_point_size(3.0);
//! render.particle_color = Color::from_hex("#ff8800")?;
//! render.party = true;
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

/// An RGB colour with channels in `0.0..=1.0`.
///
/// Serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub Vec3);

/// A string that is not a `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex colour '{0}', expected #rrggbb")]
pub struct ParseColorError(pub String);

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self(Vec3::new(r, g, b))
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let err = || ParseColorError(hex.to_string());
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| err())
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.0.x), byte(self.0.y), byte(self.0.z))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }

    /// Decode the sRGB channels to linear light, which is what an sRGB
    /// render target expects from shaders and clear values.
    pub fn to_linear(self) -> Vec3 {
        let decode = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        Vec3::new(decode(self.0.x), decode(self.0.y), decode(self.0.z))
    }

    /// As a linear wgpu clear colour with full alpha.
    pub fn to_wgpu(self) -> wgpu::Color {
        let linear = self.to_linear();
        wgpu::Color {
            r: linear.x as f64,
            g: linear.y as f64,
            b: linear.z as f64,
            a: 1.0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// How particle fragments combine with what is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Straight alpha for colour, premultiplied-style accumulation for alpha.
    #[default]
    Alpha,
    /// Colours add up; dense regions glow.
    Additive,
}

impl BlendMode {
    pub fn to_wgpu(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            },
        }
    }
}

/// Parameters for the point renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Point diameter in physical pixels.
    pub point_size: f32,
    /// Global particle opacity.
    pub opacity: f32,
    pub particle_color: Color,
    pub background_color: Color,
    /// Fade the previous frame instead of clearing it.
    pub motion_blur: bool,
    /// Alpha of the background wash painted over the previous frame.
    pub fade_alpha: f32,
    /// Colour particles from the loaded image instead of `particle_color`.
    pub read_from_texture: bool,
    /// Cycle the colour channels over time.
    pub party: bool,
    pub blend_mode: BlendMode,
}

impl RenderConfig {
    pub const POINT_SIZE_RANGE: (f32, f32) = (1.0, 100.0);

    pub fn set_point_size(&mut self, size: f32) {
        let (lo, hi) = Self::POINT_SIZE_RANGE;
        if size.is_finite() {
            self.point_size = size.clamp(lo, hi);
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn set_fade_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.fade_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    /// Bring values that bypassed the setters back into range. Non-finite
    /// values fall back to the defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let (size, opacity, fade) = (self.point_size, self.opacity, self.fade_alpha);
        self.point_size = defaults.point_size;
        self.opacity = defaults.opacity;
        self.fade_alpha = defaults.fade_alpha;
        self.set_point_size(size);
        self.set_opacity(opacity);
        self.set_fade_alpha(fade);
    }

    /// Per-channel colour multipliers at `millis` since start.
    pub fn color_coefficients(&self, millis: f64) -> Vec3 {
        if self.party {
            party_coefficients(millis)
        } else {
            Vec3::ONE
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 2.0,
            opacity: 0.5,
            particle_color: Color::rgb(30.0 / 255.0, 39.0 / 255.0, 46.0 / 255.0),
            background_color: Color::rgb(236.0 / 255.0, 240.0 / 255.0, 241.0 / 255.0),
            motion_blur: true,
            fade_alpha: 0.1,
            read_from_texture: false,
            party: false,
            blend_mode: BlendMode::Alpha,
        }
    }
}

/// Three phase-shifted sines, each swinging between 0.25 and 0.75.
pub fn party_coefficients(millis: f64) -> Vec3 {
    let t = millis / 250.0;
    let wave = |phase: f64| (((t + phase).sin() + 1.0) / 4.0 + 0.25) as f32;
    Vec3::new(wave(0.0), wave(PI), wave(-FRAC_PI_2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.particle_color.to_hex(), "#1e272e");
        assert_eq!(config.background_color.to_hex(), "#ecf0f1");
    }

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex("ff0080").unwrap();
        assert_eq!(c.0.x, 1.0);
        assert_eq!(c.0.y, 0.0);
        assert!((c.0.z - 128.0 / 255.0).abs() < 1e-6);

        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&Color::rgb(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(1.0, 0.0, 0.0));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn test_to_linear_endpoints() {
        let ends = Color::rgb(0.0, 1.0, 0.0).to_linear();
        assert_eq!(ends.x, 0.0);
        assert!((ends.y - 1.0).abs() < 1e-5);
        let mid = Color::rgb(0.5, 0.5, 0.5).to_linear();
        assert!((mid.x - 0.214).abs() < 1e-3);
    }

    #[test]
    fn test_party_range() {
        for i in 0..200 {
            let c = party_coefficients(i as f64 * 37.0);
            for v in c.to_array() {
                assert!((0.25 - 1e-6..=0.75 + 1e-6).contains(&v));
            }
        }
        let c = party_coefficients(0.0);
        assert!((c.x - 0.5).abs() < 1e-6);
        assert!((c.y - 0.5).abs() < 1e-6);
        assert!((c.z - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_coefficients_off() {
        let config = RenderConfig::default();
        assert_eq!(config.color_coefficients(1234.0), Vec3::ONE);
    }

    #[test]
    fn test_setters_clamp() {
        let mut config = RenderConfig::default();
        config.set_point_size(500.0);
        assert_eq!(config.point_size, 100.0);
        config.set_opacity(-1.0);
        assert_eq!(config.opacity, 0.0);
    }

    #[test]
    fn test_sanitize_out_of_range_values() {
        let mut config = RenderConfig {
            point_size: 0.0,
            opacity: f32::NAN,
            fade_alpha: 3.0,
            ..RenderConfig::default()
        };
        config.sanitize();
        assert_eq!(config.point_size, 1.0);
        assert_eq!(config.opacity, RenderConfig::default().opacity);
        assert_eq!(config.fade_alpha, 1.0);
    }
}
