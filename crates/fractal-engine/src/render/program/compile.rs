//! GLSL → naga compilation, validation and linking.
//!
//! Everything here runs on the CPU; the GPU objects are created from the
//! resulting [`CompiledProgram`] by [`super::ShaderProgram`].

use std::collections::BTreeMap;

use wgpu::naga;

use super::source::{ShaderSources, ShaderStage};
use super::uniforms::{reflect_blocks, UniformLayout};
use super::ShaderError;

/// Shader location of the quad's position attribute.
pub(crate) const QUAD_ATTRIBUTE_LOCATION: u32 = 0;

/// Shader location of the single color target.
const COLOR_TARGET_LOCATION: u32 = 0;

/// Vertex stage used when a source file only provides a fragment stage.
///
/// Forwards the quad position as `v_pos` (location 0) with `y` flipped, so
/// `v_pos` grows rightwards and downwards like screen coordinates.
pub const PASS_THROUGH_VERTEX: &str = "\
#version 450
layout(location = 0) in vec2 a_pos;
layout(location = 0) out vec2 v_pos;

void main() {
    v_pos = vec2(a_pos.x, -a_pos.y);
    gl_Position = vec4(a_pos, 0.0, 1.0);
}
";

/// A validated and linked vertex + fragment pair, not yet on the GPU.
#[derive(Debug)]
pub struct CompiledProgram {
    label: String,
    vertex: naga::Module,
    fragment: naga::Module,
    uniforms: UniformLayout,
    builtin_vertex: bool,
}

impl CompiledProgram {
    /// Compiles every stage present in `sources` and links them.
    ///
    /// Stages compile in fragment, vertex, geometry, tessellation order; the
    /// first failure aborts. A fragment stage is required. Without a vertex
    /// stage, [`PASS_THROUGH_VERTEX`] is used.
    pub fn from_sources(
        label: impl Into<String>,
        sources: &ShaderSources,
    ) -> Result<Self, ShaderError> {
        let label = label.into();

        let mut fragment = None;
        let mut vertex = None;
        for (stage, src) in sources.present() {
            let module = compile_stage(stage, src)?;
            match stage {
                ShaderStage::Fragment => fragment = Some(module),
                ShaderStage::Vertex => vertex = Some(module),
                stage => return Err(ShaderError::UnsupportedStage { stage }),
            }
        }

        let fragment = fragment.ok_or(ShaderError::MissingStage {
            stage: ShaderStage::Fragment,
        })?;

        let builtin_vertex = vertex.is_none();
        let vertex = match vertex {
            Some(module) => module,
            None => {
                log::info!("`{label}` has no vertex stage; using the built-in pass-through");
                compile_stage(ShaderStage::Vertex, PASS_THROUGH_VERTEX)?
            }
        };

        check_interface(&vertex, &fragment)?;

        let mut blocks = reflect_blocks(&vertex, wgpu::ShaderStages::VERTEX);
        blocks.extend(reflect_blocks(&fragment, wgpu::ShaderStages::FRAGMENT));
        let uniforms = UniformLayout::link(blocks)?;

        Ok(Self {
            label,
            vertex,
            fragment,
            uniforms,
            builtin_vertex,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> &UniformLayout {
        &self.uniforms
    }

    /// Whether the vertex stage is [`PASS_THROUGH_VERTEX`].
    pub fn uses_builtin_vertex(&self) -> bool {
        self.builtin_vertex
    }

    pub(crate) fn into_parts(self) -> (String, naga::Module, naga::Module, UniformLayout) {
        (self.label, self.vertex, self.fragment, self.uniforms)
    }
}

/// Compiles one GLSL stage and validates the result.
pub(crate) fn compile_stage(stage: ShaderStage, source: &str) -> Result<naga::Module, ShaderError> {
    let naga_stage = stage
        .naga_stage()
        .ok_or(ShaderError::UnsupportedStage { stage })?;

    let module = naga::front::glsl::Frontend::default()
        .parse(&naga::front::glsl::Options::from(naga_stage), source)
        .map_err(|errors| ShaderError::Compile {
            stage,
            diagnostic: errors.to_string(),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| ShaderError::Compile {
        stage,
        diagnostic: error_chain(&err),
    })?;

    if !module.entry_points.iter().any(|ep| ep.stage == naga_stage) {
        return Err(ShaderError::Compile {
            stage,
            diagnostic: "no entry point (`void main()`) found".to_string(),
        });
    }

    Ok(module)
}

/// Checks the stage interfaces against each other and against what the
/// pipeline provides: the quad's single `vec2` attribute at location 0 and one
/// color target at location 0.
fn check_interface(vertex: &naga::Module, fragment: &naga::Module) -> Result<(), ShaderError> {
    let vertex_ep = entry_point(vertex, naga::ShaderStage::Vertex);
    let fragment_ep = entry_point(fragment, naga::ShaderStage::Fragment);

    let mut attributes = BTreeMap::new();
    let mut outputs = BTreeMap::new();
    if let Some(ep) = vertex_ep {
        for arg in &ep.function.arguments {
            collect_locations(vertex, arg.ty, arg.binding.as_ref(), &mut attributes);
        }
        if let Some(result) = &ep.function.result {
            collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
        }
    }

    let mut inputs = BTreeMap::new();
    let mut targets = BTreeMap::new();
    if let Some(ep) = fragment_ep {
        for arg in &ep.function.arguments {
            collect_locations(fragment, arg.ty, arg.binding.as_ref(), &mut inputs);
        }
        if let Some(result) = &ep.function.result {
            collect_locations(fragment, result.ty, result.binding.as_ref(), &mut targets);
        }
    }

    for (&location, &ty) in &attributes {
        if location != QUAD_ATTRIBUTE_LOCATION {
            return Err(ShaderError::Link(format!(
                "vertex input at location {location} is not provided by the screen quad \
                 (only location {QUAD_ATTRIBUTE_LOCATION})"
            )));
        }
        if !is_float(vertex, ty) {
            return Err(ShaderError::Link(format!(
                "vertex input at location {location} must be a float vector"
            )));
        }
    }

    if let Some(location) = inputs.keys().find(|l| !outputs.contains_key(*l)) {
        return Err(ShaderError::Link(format!(
            "fragment input at location {location} is not written by the vertex stage"
        )));
    }

    if let Some(location) = targets.keys().find(|l| **l != COLOR_TARGET_LOCATION) {
        return Err(ShaderError::Link(format!(
            "fragment output at location {location} has no color target \
             (only location {COLOR_TARGET_LOCATION})"
        )));
    }
    match targets.get(&COLOR_TARGET_LOCATION) {
        Some(&ty) if is_float(fragment, ty) => Ok(()),
        Some(_) => Err(ShaderError::Link(format!(
            "fragment output at location {COLOR_TARGET_LOCATION} must be a float vector"
        ))),
        None => Err(ShaderError::Link(format!(
            "fragment stage writes no color at location {COLOR_TARGET_LOCATION}"
        ))),
    }
}

fn entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.stage == stage)
}

fn is_float(module: &naga::Module, ty: naga::Handle<naga::Type>) -> bool {
    match module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) | naga::TypeInner::Vector { scalar, .. } => {
            scalar.kind == naga::ScalarKind::Float
        }
        _ => false,
    }
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeMap<u32, naga::Handle<naga::Type>>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location, ty);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
