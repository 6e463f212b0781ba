pub mod program;
pub mod shader_source;
pub mod triangle;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to read shader file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read shader source")]
    Read(#[source] std::io::Error),
    #[error("Line {line}: shader source appears before any #shader directive")]
    MissingDirective { line: usize },
    #[error("{stage} shader compilation failed: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("Program linking failed: {log}")]
    Link { log: String },
    #[error("Driver error: {0}")]
    Driver(String),
}
