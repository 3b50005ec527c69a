//! Uniform reflection and CPU-side staging.
//!
//! Uniforms live in GLSL uniform blocks. A uniform's location is the block it
//! belongs to plus its byte offset inside the block, as laid out by the shader
//! compiler. Values are staged in per-block byte buffers and uploaded when the
//! owning program is flushed.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use wgpu::naga;

use super::ShaderError;

/// Float width of a uniform member.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Precision {
    F32,
    F64,
}

impl Precision {
    fn width(self) -> usize {
        match self {
            Precision::F32 => 4,
            Precision::F64 => 8,
        }
    }
}

/// Shape of a uniform member, as far as the setters care.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Scalar(Precision),
    Vec4(Precision),
    Mat4(Precision),
    /// Anything else (ints, vec2, arrays...). Listed, but not writable.
    Other,
}

impl UniformKind {
    fn from_naga(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Self {
        fn precision(scalar: naga::Scalar) -> Option<Precision> {
            match (scalar.kind, scalar.width) {
                (naga::ScalarKind::Float, 4) => Some(Precision::F32),
                (naga::ScalarKind::Float, 8) => Some(Precision::F64),
                _ => None,
            }
        }

        let kind = match module.types[ty].inner {
            naga::TypeInner::Scalar(scalar) => precision(scalar).map(UniformKind::Scalar),
            naga::TypeInner::Vector {
                size: naga::VectorSize::Quad,
                scalar,
            } => precision(scalar).map(UniformKind::Vec4),
            naga::TypeInner::Matrix {
                columns: naga::VectorSize::Quad,
                rows: naga::VectorSize::Quad,
                scalar,
            } => precision(scalar).map(UniformKind::Mat4),
            _ => None,
        };

        kind.unwrap_or(UniformKind::Other)
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, p) = match self {
            UniformKind::Scalar(p) => ("scalar", p),
            UniformKind::Vec4(p) => ("vec4", p),
            UniformKind::Mat4(p) => ("mat4", p),
            UniformKind::Other => return f.write_str("an unsupported type"),
        };
        let p = match p {
            Precision::F32 => "f32",
            Precision::F64 => "f64",
        };
        write!(f, "a {p} {name}")
    }
}

/// One member of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    /// Byte offset inside the block.
    pub offset: u32,
    pub kind: UniformKind,
}

/// A uniform block reflected from a compiled stage.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Size of the block in bytes.
    pub size: u32,
    pub members: Vec<UniformMember>,
    /// Stages that declare this block.
    pub visibility: wgpu::ShaderStages,
}

impl UniformBlock {
    /// Buffer size to allocate: at least 16 bytes, rounded up to 16.
    pub fn buffer_size(&self) -> u64 {
        u64::from(self.size.max(16)).next_multiple_of(16)
    }
}

/// Collects every uniform block declared by `module`.
pub(crate) fn reflect_blocks(
    module: &naga::Module,
    visibility: wgpu::ShaderStages,
) -> Vec<UniformBlock> {
    let mut blocks = Vec::new();

    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &var.binding else { continue };

        let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            log::debug!("skipping non-block uniform {:?}", var.name);
            continue;
        };

        let members = members
            .iter()
            .filter_map(|m| {
                Some(UniformMember {
                    name: m.name.clone()?,
                    offset: m.offset,
                    kind: UniformKind::from_naga(module, m.ty),
                })
            })
            .collect();

        blocks.push(UniformBlock {
            group: binding.group,
            binding: binding.binding,
            size: *span,
            members,
            visibility,
        });
    }

    blocks
}

/// Resolved location of a uniform inside one program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Slot {
    program: u32,
    block: usize,
    offset: usize,
    precision: Precision,
}

/// Handle to a scalar float uniform, from [`Uniforms::double_handle`].
///
/// Writing through a handle skips the name lookup. Handles are typed by
/// uniform kind and only valid for the program that resolved them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DoubleHandle(Slot);

/// Handle to a `vec4` uniform, from [`Uniforms::vec4_handle`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Vec4Handle(Slot);

/// Handle to a `mat4` uniform, from [`Uniforms::mat4_handle`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Mat4Handle(Slot);

/// Uniform layout of a linked program.
#[derive(Debug, Clone, Default)]
pub struct UniformLayout {
    blocks: Vec<UniformBlock>,
    locations: HashMap<String, (usize, usize)>,
}

impl UniformLayout {
    /// Merges the blocks of all stages.
    ///
    /// A block shared by two stages must be declared identically in both.
    /// A name appearing in two different blocks resolves to the first one.
    pub(crate) fn link(stage_blocks: Vec<UniformBlock>) -> Result<Self, ShaderError> {
        let mut blocks: Vec<UniformBlock> = Vec::new();

        for block in stage_blocks {
            match blocks
                .iter_mut()
                .find(|b| b.group == block.group && b.binding == block.binding)
            {
                Some(existing) => {
                    if existing.members != block.members || existing.size != block.size {
                        return Err(ShaderError::Link(format!(
                            "uniform block at set {} binding {} is declared differently across stages",
                            block.group, block.binding
                        )));
                    }
                    existing.visibility |= block.visibility;
                }
                None => blocks.push(block),
            }
        }

        let mut locations = HashMap::new();
        for (b, block) in blocks.iter().enumerate() {
            for (m, member) in block.members.iter().enumerate() {
                if locations.contains_key(&member.name) {
                    log::warn!(
                        "uniform `{}` declared in more than one block; using the first",
                        member.name
                    );
                    continue;
                }
                locations.insert(member.name.clone(), (b, m));
            }
        }

        Ok(Self { blocks, locations })
    }

    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Names of all active uniforms, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.locations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of bind groups the pipeline layout needs.
    pub fn group_count(&self) -> u32 {
        self.blocks.iter().map(|b| b.group + 1).max().unwrap_or(0)
    }

    fn member(&self, name: &str) -> Option<(usize, &UniformMember)> {
        let &(b, m) = self.locations.get(name)?;
        Some((b, &self.blocks[b].members[m]))
    }
}

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

/// Uniform values of one program, staged on the CPU.
#[derive(Debug)]
pub struct Uniforms {
    id: u32,
    program: String,
    layout: UniformLayout,
    data: Vec<Vec<u8>>,
    dirty: Vec<bool>,
}

impl Uniforms {
    pub fn new(program: impl Into<String>, layout: UniformLayout) -> Self {
        let data: Vec<Vec<u8>> = layout
            .blocks
            .iter()
            .map(|b| vec![0u8; b.buffer_size() as usize])
            .collect();
        let dirty = vec![false; data.len()];

        Self {
            id: NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            program: program.into(),
            layout,
            data,
            dirty,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layout.contains(name)
    }

    /// Resolves `name` to a handle for a scalar float uniform.
    pub fn double_handle(&self, name: &str) -> Result<DoubleHandle, ShaderError> {
        self.slot(name, "a scalar", |k| match k {
            UniformKind::Scalar(p) => Some(p),
            _ => None,
        })
        .map(DoubleHandle)
    }

    /// Resolves `name` to a handle for a `vec4` uniform.
    pub fn vec4_handle(&self, name: &str) -> Result<Vec4Handle, ShaderError> {
        self.slot(name, "a vec4", |k| match k {
            UniformKind::Vec4(p) => Some(p),
            _ => None,
        })
        .map(Vec4Handle)
    }

    /// Resolves `name` to a handle for a `mat4` uniform.
    pub fn mat4_handle(&self, name: &str) -> Result<Mat4Handle, ShaderError> {
        self.slot(name, "a mat4", |k| match k {
            UniformKind::Mat4(p) => Some(p),
            _ => None,
        })
        .map(Mat4Handle)
    }

    fn slot(
        &self,
        name: &str,
        expected: &'static str,
        precision_of: impl Fn(UniformKind) -> Option<Precision>,
    ) -> Result<Slot, ShaderError> {
        let Some((block, member)) = self.layout.member(name) else {
            return Err(ShaderError::UniformNotFound {
                name: name.to_string(),
                program: self.program.clone(),
            });
        };

        let Some(precision) = precision_of(member.kind) else {
            return Err(ShaderError::UniformTypeMismatch {
                name: name.to_string(),
                program: self.program.clone(),
                expected,
                actual: member.kind,
            });
        };

        Ok(Slot {
            program: self.id,
            block,
            offset: member.offset as usize,
            precision,
        })
    }

    pub fn set_double(&mut self, name: &str, value: f64) -> Result<(), ShaderError> {
        let h = self.double_handle(name)?;
        self.write_double(h, value)
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> Result<(), ShaderError> {
        let h = self.vec4_handle(name)?;
        self.write_vec4(h, value)
    }

    /// Sets a `mat4` from column-major columns.
    pub fn set_mat4(&mut self, name: &str, value: [[f32; 4]; 4]) -> Result<(), ShaderError> {
        let h = self.mat4_handle(name)?;
        self.write_mat4(h, value)
    }

    pub fn write_double(&mut self, h: DoubleHandle, value: f64) -> Result<(), ShaderError> {
        let Slot { offset, precision, .. } = h.0;
        let bytes = self.block_mut(h.0)?;
        write_float(&mut bytes[offset..], precision, value);
        Ok(())
    }

    pub fn write_vec4(&mut self, h: Vec4Handle, value: [f32; 4]) -> Result<(), ShaderError> {
        let Slot { offset, precision, .. } = h.0;
        let bytes = self.block_mut(h.0)?;
        for (i, v) in value.into_iter().enumerate() {
            write_float(&mut bytes[offset + i * precision.width()..], precision, f64::from(v));
        }
        Ok(())
    }

    pub fn write_mat4(&mut self, h: Mat4Handle, value: [[f32; 4]; 4]) -> Result<(), ShaderError> {
        let Slot { offset, precision, .. } = h.0;
        // Columns of a mat4 are vec4-aligned: 16 bytes for f32, 32 for f64.
        let column_stride = 4 * precision.width();
        let bytes = self.block_mut(h.0)?;
        for (c, column) in value.into_iter().enumerate() {
            for (r, v) in column.into_iter().enumerate() {
                let at = offset + c * column_stride + r * precision.width();
                write_float(&mut bytes[at..], precision, f64::from(v));
            }
        }
        Ok(())
    }

    /// Raw bytes of block `index`.
    pub fn block_bytes(&self, index: usize) -> &[u8] {
        &self.data[index]
    }

    /// Hands every block written since the last call to `upload`.
    pub fn drain_dirty(&mut self, mut upload: impl FnMut(usize, &[u8])) {
        for (i, dirty) in self.dirty.iter_mut().enumerate() {
            if std::mem::take(dirty) {
                upload(i, &self.data[i]);
            }
        }
    }

    fn block_mut(&mut self, slot: Slot) -> Result<&mut [u8], ShaderError> {
        if slot.program != self.id {
            return Err(ShaderError::ForeignHandle {
                program: self.program.clone(),
            });
        }
        self.dirty[slot.block] = true;
        Ok(&mut self.data[slot.block])
    }
}

fn write_float(dst: &mut [u8], precision: Precision, value: f64) {
    match precision {
        Precision::F32 => dst[..4].copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        Precision::F64 => dst[..8].copy_from_slice(bytemuck::bytes_of(&value)),
    }
}
