//! Splits a combined shader file into its vertex and fragment sources.
//!
//! The file holds both stages, each introduced by a directive line:
//!
//! ```text
//! #shader vertex
//! ...vertex source...
//! #shader fragment
//! ...fragment source...
//! ```

use super::{ShaderError, ShaderStage};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const DIRECTIVE: &str = "#shader";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| ShaderError::Io { path: path.to_path_buf(), source };

        let file = File::open(path).map_err(io_err)?;
        let source = Self::from_reader(BufReader::new(file)).map_err(|err| match err {
            ShaderError::Read(source) => io_err(source),
            other => other,
        })?;

        debug!("Vertex source from {}:\n{}", path.display(), source.vertex);
        debug!("Fragment source from {}:\n{}", path.display(), source.fragment);
        Ok(source)
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, ShaderError> {
        let mut splitter = Splitter::default();
        for line in reader.lines() {
            splitter.feed(&line.map_err(ShaderError::Read)?)?;
        }
        Ok(splitter.finish())
    }

    pub fn parse(text: &str) -> Result<Self, ShaderError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn get(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn get_mut(&mut self, stage: ShaderStage) -> &mut String {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

/// Reads a directive line. `None` means the line names no known stage.
fn directive_stage(line: &str) -> Option<ShaderStage> {
    if line.contains("vertex") {
        Some(ShaderStage::Vertex)
    } else if line.contains("fragment") {
        Some(ShaderStage::Fragment)
    } else {
        None
    }
}

#[derive(Default)]
struct Splitter {
    current: Option<ShaderStage>,
    line_no: usize,
    out: ShaderSource,
}

impl Splitter {
    fn feed(&mut self, line: &str) -> Result<(), ShaderError> {
        self.line_no += 1;

        if line.contains(DIRECTIVE) {
            match directive_stage(line) {
                Some(stage) => self.current = Some(stage),
                None => warn!(
                    "Line {}: directive without a stage keyword, staying in {}",
                    self.line_no,
                    self.current.map_or("no section".to_string(), |s| s.to_string()),
                ),
            }
            return Ok(());
        }

        match self.current {
            Some(stage) => {
                let buf = self.out.get_mut(stage);
                buf.push_str(line);
                buf.push('\n');
                Ok(())
            }
            // Blank lines ahead of the first directive carry nothing
            None if line.trim().is_empty() => Ok(()),
            None => Err(ShaderError::MissingDirective { line: self.line_no }),
        }
    }

    fn finish(self) -> ShaderSource {
        self.out
    }
}
