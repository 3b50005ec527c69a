use std::borrow::Cow;
use std::num::NonZeroU64;
use std::path::Path;

use crate::render::ScreenQuad;

use super::compile::CompiledProgram;
use super::source::ShaderSources;
use super::uniforms::{DoubleHandle, Mat4Handle, Uniforms, Vec4Handle};
use super::ShaderError;

/// A linked GPU shader program drawing onto the [`ScreenQuad`].
///
/// Owns the render pipeline, one uniform buffer per uniform block, and the
/// CPU-side staging for those buffers. Uniform writes are staged; [`flush`]
/// uploads them and must run before the frame that reads them is submitted.
///
/// [`flush`]: ShaderProgram::flush
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<wgpu::BindGroup>,
    buffers: Vec<wgpu::Buffer>,
    uniforms: Uniforms,
}

impl ShaderProgram {
    /// Reads, compiles and links the annotated shader file at `path`.
    pub fn from_file(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        path: &Path,
    ) -> Result<Self, ShaderError> {
        let sources = ShaderSources::read(path)?;
        log::debug!(
            "{}: stages [{}]",
            path.display(),
            sources.present().map(|(stage, _)| stage.to_string()).collect::<Vec<_>>().join(", ")
        );
        let compiled = CompiledProgram::from_sources(path.display().to_string(), &sources)?;
        Self::new(device, target_format, compiled)
    }

    /// Creates the GPU objects for an already linked program.
    ///
    /// wgpu validation errors raised while building them are returned as
    /// [`ShaderError::Link`]; nothing is kept on failure.
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        compiled: CompiledProgram,
    ) -> Result<Self, ShaderError> {
        let (label, vertex, fragment, layout) = compiled.into_parts();
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} vertex")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(vertex)),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} fragment")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(fragment)),
        });

        // One layout per bind group index; gaps get an empty layout.
        let group_layouts: Vec<wgpu::BindGroupLayout> = (0..layout.group_count())
            .map(|group| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                    .blocks()
                    .iter()
                    .filter(|b| b.group == group)
                    .map(|b| wgpu::BindGroupLayoutEntry {
                        binding: b.binding,
                        visibility: b.visibility,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: NonZeroU64::new(u64::from(b.size)),
                        },
                        count: None,
                    })
                    .collect();

                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{label} bgl {group}")),
                    entries: &entries,
                })
            })
            .collect();

        let buffers: Vec<wgpu::Buffer> = layout
            .blocks()
            .iter()
            .map(|b| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{label} ubo {}:{}", b.group, b.binding)),
                    size: b.buffer_size(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let bind_groups: Vec<wgpu::BindGroup> = group_layouts
            .iter()
            .zip(0u32..)
            .map(|(bgl, group)| {
                let entries: Vec<wgpu::BindGroupEntry> = layout
                    .blocks()
                    .iter()
                    .zip(&buffers)
                    .filter(|(b, _)| b.group == group)
                    .map(|(b, buffer)| wgpu::BindGroupEntry {
                        binding: b.binding,
                        resource: buffer.as_entire_binding(),
                    })
                    .collect();

                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} bind group {group}")),
                    layout: bgl,
                    entries: &entries,
                })
            })
            .collect();

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} pipeline layout")),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &[ScreenQuad::vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(ShaderError::Link(format!("`{label}`: {err}")));
        }

        log::info!(
            "linked shader program `{label}` ({} uniforms in {} blocks)",
            layout.len(),
            layout.blocks().len()
        );

        let uniforms = Uniforms::new(label.clone(), layout);

        Ok(Self {
            label,
            pipeline,
            bind_groups,
            buffers,
            uniforms,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    pub fn set_double(&mut self, name: &str, value: f64) -> Result<(), ShaderError> {
        self.uniforms.set_double(name, value)
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> Result<(), ShaderError> {
        self.uniforms.set_vec4(name, value)
    }

    pub fn set_mat4(&mut self, name: &str, value: [[f32; 4]; 4]) -> Result<(), ShaderError> {
        self.uniforms.set_mat4(name, value)
    }

    pub fn write_double(&mut self, handle: DoubleHandle, value: f64) -> Result<(), ShaderError> {
        self.uniforms.write_double(handle, value)
    }

    pub fn write_vec4(&mut self, handle: Vec4Handle, value: [f32; 4]) -> Result<(), ShaderError> {
        self.uniforms.write_vec4(handle, value)
    }

    pub fn write_mat4(
        &mut self,
        handle: Mat4Handle,
        value: [[f32; 4]; 4],
    ) -> Result<(), ShaderError> {
        self.uniforms.write_mat4(handle, value)
    }

    /// Uploads every uniform block written since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        let buffers = &self.buffers;
        self.uniforms
            .drain_dirty(|block, bytes| queue.write_buffer(&buffers[block], 0, bytes));
    }

    /// Makes this program the one used by subsequent draws on `pass`.
    pub fn activate(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for (group, bind_group) in (0u32..).zip(&self.bind_groups) {
            pass.set_bind_group(group, bind_group, &[]);
        }
    }
}
