//! Variant rendering: write `pad.tex` and `exam.tex` for a project.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::project::{ProjectDescriptor, Variant};
use crate::template::{Placeholder, Template, TemplateError};

/// Presentation layout. Pulls the source in with `\input{main}`.
pub const PAD_TEMPLATE: Template = Template::new(
    "pad",
    include_str!("../templates/pad.tex"),
    &[Placeholder::Title],
);

/// Exam layout. The source body is inlined at the content anchor.
pub const EXAM_TEMPLATE: Template = Template::new(
    "exam",
    include_str!("../templates/exam.tex"),
    &[Placeholder::Title, Placeholder::Content],
);

/// Layout directives removed from the source before it is inlined into the
/// exam template, which manages page flow itself.
pub const EXAM_STRIPPED_DIRECTIVES: [&str; 2] = [r"\newpage", r"\vfill"];

/// Rendering failures. Each one fails a single variant.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Render `variant` for `project` and return the written path.
pub fn render_variant(project: &ProjectDescriptor, variant: Variant) -> Result<PathBuf, RenderError> {
    match variant {
        Variant::Pad => render_pad(project),
        Variant::Exam => render_exam(project),
    }
}

/// Write `pad.tex`: the presentation template with the title filled in.
pub fn render_pad(project: &ProjectDescriptor) -> Result<PathBuf, RenderError> {
    let text = PAD_TEMPLATE.render(&[(Placeholder::Title, &project.name)])?;
    write_rendered(project.rendered_path(Variant::Pad), &text)
}

/// Write `exam.tex`: the exam template with the title and the stripped source body.
pub fn render_exam(project: &ProjectDescriptor) -> Result<PathBuf, RenderError> {
    let source_path = project.source_path();
    let source = fs::read_to_string(&source_path).map_err(|source| RenderError::Read {
        path: source_path,
        source,
    })?;

    let body = strip_layout_directives(&source);
    let text = EXAM_TEMPLATE.render(&[
        (Placeholder::Title, &project.name),
        (Placeholder::Content, &body),
    ])?;
    write_rendered(project.rendered_path(Variant::Exam), &text)
}

/// Remove every hard page break and vertical fill directive from `source`.
#[must_use]
pub fn strip_layout_directives(source: &str) -> String {
    EXAM_STRIPPED_DIRECTIVES
        .iter()
        .fold(source.to_string(), |text, directive| text.replace(directive, ""))
}

fn write_rendered(path: PathBuf, text: &str) -> Result<PathBuf, RenderError> {
    match fs::write(&path, text) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "rendered document");
            Ok(path)
        }
        Err(source) => Err(RenderError::Write { path, source }),
    }
}
