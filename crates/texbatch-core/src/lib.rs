//! # texbatch-core
//!
//! Building blocks for the texbatch project builder: concurrency planning,
//! project discovery, variant rendering, and compiler invocation.

pub mod cancel;
pub mod compiler;
pub mod constants;
pub mod discovery;
pub mod plan;
pub mod project;
pub mod render;
pub mod template;

// Re-exports
pub use cancel::CancellationToken;
pub use compiler::{CompileJob, CompileResult, Compiler, LatexmkCompiler};
pub use constants::exit_codes;
pub use discovery::{discover, Discovery, DiscoveryWarning};
pub use plan::{detect_logical_cpus, ConcurrencyPlan, PlanOverrides};
pub use project::{ProjectDescriptor, Variant};
pub use render::{render_exam, render_pad, render_variant, RenderError};
pub use template::{Placeholder, Template, TemplateError};
