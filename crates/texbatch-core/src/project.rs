//! Project descriptors and the document variants built for each project.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A discovered project unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectDescriptor {
    /// Display title taken from the first line of the source document.
    pub name: String,
    /// Directory holding the source document.
    pub entry: PathBuf,
}

impl ProjectDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, entry: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
        }
    }

    /// Path of the project's primary source document.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.entry.join(crate::constants::SOURCE_FILE_NAME)
    }

    /// Path the given variant is rendered to.
    #[must_use]
    pub fn rendered_path(&self, variant: Variant) -> PathBuf {
        self.entry.join(variant.file_name())
    }
}

/// One of the two document layouts generated per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Landscape presentation layout that `\input`s the source.
    Pad,
    /// Exam paper layout with the source body inlined.
    Exam,
}

impl Variant {
    /// Every variant, in submission order.
    pub const ALL: [Variant; 2] = [Variant::Pad, Variant::Exam];

    /// Short lowercase tag used in job ids and output basenames.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Pad => "pad",
            Self::Exam => "exam",
        }
    }

    /// File the variant is rendered to inside the project directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Pad => "pad.tex",
            Self::Exam => "exam.tex",
        }
    }

    /// Job identifier for this variant of the project at `project_index`.
    #[must_use]
    pub fn job_id(self, project_index: usize) -> String {
        format!("{project_index}_{}", self.suffix())
    }

    /// Basename the compiler writes its artifacts under.
    #[must_use]
    pub fn output_basename(self, project_name: &str) -> String {
        format!("{project_name}_{}", self.suffix())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pad => f.write_str("PAD"),
            Self::Exam => f.write_str("EXAM"),
        }
    }
}
