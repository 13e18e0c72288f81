//! Frame accumulation for the motion blur trail.
//!
//! Particles are drawn into an offscreen texture that survives between
//! frames. With motion blur on, each frame first washes that texture with
//! the background colour at low alpha; with it off, the texture is
//! cleared. A fullscreen pass then copies the texture to the surface, so
//! a paused session keeps presenting the last trail.

use wgpu::util::DeviceExt;

use crate::uniforms::FadeUniforms;
use crate::visuals::{Color, RenderConfig};

const FADE_SHADER: &str = include_str!("fade.wgsl");
const BLIT_SHADER: &str = include_str!("blit.wgsl");

/// GPU resources for the accumulation target and its two passes.
pub struct MotionBlur {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    format: wgpu::TextureFormat,
    fade_pipeline: wgpu::RenderPipeline,
    fade_buffer: wgpu::Buffer,
    fade_bind_group: wgpu::BindGroup,
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_bind_group: wgpu::BindGroup,
    /// Contents are undefined until the first clear.
    needs_clear: bool,
    /// Motion blur flag and colours the current trail was drawn with.
    drawn_with: Option<(bool, Color, Color)>,
}

impl MotionBlur {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32, render: &RenderConfig) -> Self {
        let (texture, view) = create_target(device, format, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Accumulation Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Fade pass
        let fade_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fade Uniform Buffer"),
            contents: bytemuck::bytes_of(&FadeUniforms::new(render)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let fade_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fade Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let fade_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fade Bind Group"),
            layout: &fade_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: fade_buffer.as_entire_binding(),
            }],
        });

        let fade_pipeline = fullscreen_pipeline(
            device,
            "Fade",
            FADE_SHADER,
            &fade_layout,
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        // Blit pass
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let blit_bind_group = create_blit_bind_group(device, &blit_layout, &view, &sampler);
        let blit_pipeline = fullscreen_pipeline(device, "Blit", BLIT_SHADER, &blit_layout, format, None);

        Self {
            texture,
            view,
            sampler,
            format,
            fade_pipeline,
            fade_buffer,
            fade_bind_group,
            blit_pipeline,
            blit_layout,
            blit_bind_group,
            needs_clear: true,
            drawn_with: None,
        }
    }

    /// Recreate the accumulation target after a window resize. The trail
    /// restarts from a cleared frame.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (texture, view) = create_target(device, self.format, width, height);
        self.texture = texture;
        self.view = view;
        self.blit_bind_group = create_blit_bind_group(device, &self.blit_layout, &self.view, &self.sampler);
        self.needs_clear = true;
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    /// Begin the pass that draws into the accumulation target. The fade
    /// quad is already drawn when motion blur is on; the caller adds the
    /// particles.
    pub fn scene_pass<'e>(
        &mut self,
        encoder: &'e mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        render: &RenderConfig,
    ) -> wgpu::RenderPass<'e> {
        // turning the blur on or changing a colour restarts the trail
        let drawn_with = Some((render.motion_blur, render.background_color, render.particle_color));
        if self.drawn_with != drawn_with {
            self.drawn_with = drawn_with;
            self.needs_clear = true;
        }
        let clear = self.needs_clear || !render.motion_blur;
        self.needs_clear = false;

        let load = if clear {
            wgpu::LoadOp::Clear(render.background_color.to_wgpu())
        } else {
            queue.write_buffer(&self.fade_buffer, 0, bytemuck::bytes_of(&FadeUniforms::new(render)));
            wgpu::LoadOp::Load
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if !clear {
            pass.set_pipeline(&self.fade_pipeline);
            pass.set_bind_group(0, &self.fade_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        pass
    }

    /// Copy the accumulation target to `target`.
    pub fn blit(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.blit_pipeline);
        pass.set_bind_group(0, &self.blit_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_target(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Accumulation Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    name: &str,
    source: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(name),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(name),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
