use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub pos: [f32; 2], // NDC
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
}

const VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0] },
    QuadVertex { pos: [ 1.0, -1.0] },
    QuadVertex { pos: [-1.0,  1.0] },
    QuadVertex { pos: [ 1.0,  1.0] },
];

const INDICES: [u32; 6] = [0, 1, 2, 1, 2, 3];

/// Two triangles covering clip space, `[-1, 1]` on both axes.
///
/// Vertex attribute 0 carries the NDC position as `vec2`.
pub struct ScreenQuad {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
}

impl ScreenQuad {
    pub fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen quad vbo"),
            contents: bytemuck::cast_slice(&VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen quad ibo"),
            contents: bytemuck::cast_slice(&INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self { vbo, ibo }
    }

    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &QuadVertex::ATTRS,
        }
    }

    /// Issues the indexed draw. The caller activates a program first.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vbo.slice(..));
        pass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(tri: &[u32]) -> f32 {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| VERTICES[i as usize].pos);
        ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
    }

    #[test]
    fn triangles_cover_clip_space() {
        let total: f32 = INDICES.chunks(3).map(area).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn corners_span_both_axes() {
        for corner in [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]] {
            assert!(VERTICES.iter().any(|v| v.pos == corner), "missing {corner:?}");
        }
    }

    #[test]
    fn layout_matches_vertex_size() {
        let layout = ScreenQuad::vertex_layout();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
    }
}
