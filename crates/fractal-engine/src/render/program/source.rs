//! Annotated shader source files.
//!
//! One file carries every stage of a program. A directive line containing
//! [`DIRECTIVE_MARKER`] and a stage keyword starts a section; the lines that
//! follow belong to that stage until the next directive:
//!
//! ```text
//! #shader vertex
//! #version 450
//! ...
//! #shader fragment
//! #version 450
//! ...
//! ```

use std::fmt;
use std::path::Path;

use super::ShaderError;

/// Marks a line as a stage directive.
pub const DIRECTIVE_MARKER: &str = "#shader";

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Fragment,
    Vertex,
    Geometry,
    TessControl,
    TessEval,
}

impl ShaderStage {
    /// Every stage, in compile order.
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Fragment,
        ShaderStage::Vertex,
        ShaderStage::Geometry,
        ShaderStage::TessControl,
        ShaderStage::TessEval,
    ];

    /// Directive keywords in matching order. Matching is by substring and the
    /// first hit wins, so `#shader vertex geo` selects the vertex stage.
    const KEYWORDS: [(&'static str, ShaderStage); 5] = [
        ("fragment", ShaderStage::Fragment),
        ("vert", ShaderStage::Vertex),
        ("geo", ShaderStage::Geometry),
        ("tesseval", ShaderStage::TessEval),
        ("tesscontrol", ShaderStage::TessControl),
    ];

    fn index(self) -> usize {
        match self {
            ShaderStage::Fragment => 0,
            ShaderStage::Vertex => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::TessControl => 3,
            ShaderStage::TessEval => 4,
        }
    }

    /// The naga stage this maps to, if wgpu can run it.
    pub(crate) fn naga_stage(self) -> Option<wgpu::naga::ShaderStage> {
        match self {
            ShaderStage::Fragment => Some(wgpu::naga::ShaderStage::Fragment),
            ShaderStage::Vertex => Some(wgpu::naga::ShaderStage::Vertex),
            ShaderStage::Geometry | ShaderStage::TessControl | ShaderStage::TessEval => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Fragment => "fragment",
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::TessControl => "tessellation-control",
            ShaderStage::TessEval => "tessellation-evaluation",
        })
    }
}

/// Per-stage sources split out of one annotated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    stages: [String; 5],
}

impl ShaderSources {
    /// Splits annotated text into stage sources.
    ///
    /// Lines before the first directive are dropped. A directive without a
    /// recognised keyword is dropped too and leaves the current stage as is.
    pub fn parse(text: &str) -> Self {
        let mut sources = Self::default();
        let mut current: Option<ShaderStage> = None;

        for line in text.split_inclusive('\n') {
            if line.contains(DIRECTIVE_MARKER) {
                if let Some(stage) = directive_stage(line) {
                    current = Some(stage);
                }
                continue;
            }

            if let Some(stage) = current {
                sources.stages[stage.index()].push_str(line);
            }
        }

        sources
    }

    /// Reads and splits the file at `path`.
    pub fn read(path: &Path) -> Result<Self, ShaderError> {
        let text = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Source of `stage`, or `None` when the file has no text for it.
    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        let src = self.stages[stage.index()].as_str();
        (!src.is_empty()).then_some(src)
    }

    /// Stages with source text, in compile order.
    pub fn present(&self) -> impl Iterator<Item = (ShaderStage, &str)> + '_ {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| self.get(stage).map(|src| (stage, src)))
    }
}

fn directive_stage(line: &str) -> Option<ShaderStage> {
    ShaderStage::KEYWORDS
        .iter()
        .find(|(keyword, _)| line.contains(keyword))
        .map(|(_, stage)| *stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_stages_in_file_order() {
        let text = "\
#shader vertex
void main() {}
#shader fragment
layout(location = 0) out vec4 c;
void main() { c = vec4(1.0); }
";
        let src = ShaderSources::parse(text);
        assert_eq!(src.get(ShaderStage::Vertex), Some("void main() {}\n"));
        assert_eq!(
            src.get(ShaderStage::Fragment),
            Some("layout(location = 0) out vec4 c;\nvoid main() { c = vec4(1.0); }\n")
        );
        assert_eq!(src.get(ShaderStage::Geometry), None);
    }

    #[test]
    fn lines_before_first_directive_are_dropped() {
        let src = ShaderSources::parse("// header\n#version 450\n#shader fragment\nbody\n");
        assert_eq!(src.get(ShaderStage::Fragment), Some("body\n"));
        assert_eq!(src.present().count(), 1);
    }

    #[test]
    fn repeated_directive_appends_to_same_stage() {
        let src = ShaderSources::parse("#shader fragment\na\n#shader vertex\nv\n#shader fragment\nb\n");
        assert_eq!(src.get(ShaderStage::Fragment), Some("a\nb\n"));
    }

    #[test]
    fn first_keyword_match_wins() {
        // Both "vert" and "geo" appear; vertex is checked first.
        let src = ShaderSources::parse("#shader geometry-from-vertex\nx\n");
        assert_eq!(src.get(ShaderStage::Vertex), Some("x\n"));
        assert_eq!(src.get(ShaderStage::Geometry), None);

        // "fragment" beats everything.
        let src = ShaderSources::parse("#shader fragment (not vert)\ny\n");
        assert_eq!(src.get(ShaderStage::Fragment), Some("y\n"));
    }

    #[test]
    fn tessellation_keywords() {
        let src = ShaderSources::parse("#shader tesscontrol\nc\n#shader tesseval\ne\n");
        assert_eq!(src.get(ShaderStage::TessControl), Some("c\n"));
        assert_eq!(src.get(ShaderStage::TessEval), Some("e\n"));
    }

    #[test]
    fn unknown_directive_keeps_current_stage() {
        let src = ShaderSources::parse("#shader fragment\na\n#shader compute\nb\n");
        assert_eq!(src.get(ShaderStage::Fragment), Some("a\nb\n"));
    }

    #[test]
    fn directive_without_body_leaves_stage_absent() {
        let src = ShaderSources::parse("#shader vertex\n#shader fragment\nf\n");
        assert_eq!(src.get(ShaderStage::Vertex), None);
        let stages: Vec<_> = src.present().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![ShaderStage::Fragment]);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let src = ShaderSources::parse("#shader fragment\nvoid main() {}");
        assert_eq!(src.get(ShaderStage::Fragment), Some("void main() {}"));
    }

    #[test]
    fn read_reports_missing_file() {
        let err = ShaderSources::read(Path::new("/definitely/not/here.glsl")).unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }
}
