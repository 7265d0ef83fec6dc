//! # stencil_templates
//!
//! Template rendering and output resolution for stencil.
//!
//! This crate turns template files into generated project files: it renders
//! EJS-style tags against a per-render variable context, derives destination
//! paths by stripping the template suffix, and ensures target directories
//! exist before anything is written.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil_templates::{EngineConfig, RenderContext, TemplateResolver};
//!
//! let ctx = RenderContext::new()
//!     .with_var("baseName", "shop")
//!     .with_var("packageName", "com.acme.shop");
//!
//! let resolver = TemplateResolver::new("templates/server", EngineConfig::default());
//! let result = resolver.resolve_tree("./shop", &ctx).unwrap();
//! for failure in &result.failures {
//!     eprintln!("{}: {}", failure.template.display(), failure.error);
//! }
//! ```
//!
//! Rendering is pure and synchronous; the only side effects in this crate
//! are directory creation and the file writes performed by the resolver.

pub mod config;
pub mod context;
pub mod dirs;
pub mod error;
pub mod paths;
pub mod renderer;
pub mod resolver;

pub use config::{EngineConfig, InvalidPathPolicy, DEFAULT_FALLBACK_DIR, DEFAULT_TEMPLATE_SUFFIX};
pub use context::{HelperFn, RenderContext};
pub use dirs::ensure_directory_exists;
pub use error::{TemplateError, TemplateResult};
pub use paths::resolve_output_path;
pub use renderer::TemplateRenderer;
pub use resolver::{RenderFailure, ResolveResult, TemplateResolver};
