//! Template resolution: rendering template trees into a target directory.
//!
//! The resolver composes the engine's pieces for callers: read a template,
//! render it against a context, derive the destination path by stripping
//! the template suffix, ensure the target directory exists, and write the
//! result. A render failure is fatal only to the file it occurred in; the
//! rest of the tree is still generated and the failure is reported
//! per-file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::context::RenderContext;
use crate::dirs::ensure_directory_exists;
use crate::error::{TemplateError, TemplateResult};
use crate::paths::resolve_output_path;
use crate::renderer::TemplateRenderer;

/// Result of resolving a template tree.
#[derive(Debug)]
pub struct ResolveResult {
    /// Directory the tree was generated into.
    pub target_path: PathBuf,
    /// Files that were written (rendered or copied).
    pub created_files: Vec<PathBuf>,
    /// Templates that failed to render, with their errors.
    pub failures: Vec<RenderFailure>,
}

/// A single template that failed to render during tree resolution.
#[derive(Debug)]
pub struct RenderFailure {
    pub template: PathBuf,
    pub error: TemplateError,
}

/// Resolves templates from a source directory into target directories.
pub struct TemplateResolver {
    templates_path: PathBuf,
    config: EngineConfig,
    renderer: TemplateRenderer,
}

impl TemplateResolver {
    /// Create a resolver rooted at a template source directory.
    pub fn new(templates_path: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self {
            templates_path: templates_path.into(),
            config,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render a single template file into a target directory and return the
    /// destination path that was written.
    pub fn write_rendered(
        &self,
        template_rel: &str,
        target_dir: &str,
        ctx: &RenderContext,
    ) -> TemplateResult<PathBuf> {
        let source_path = self.templates_path.join(template_rel);
        if !source_path.is_file() {
            return Err(TemplateError::NotFound(source_path));
        }

        let rendered = self.render_file(&source_path, ctx)?;
        let target = ensure_directory_exists(target_dir, &self.config)?;
        let dest = target.join(resolve_output_path(
            template_rel,
            &self.config.template_suffix,
        ));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, rendered)?;
        debug!("Rendered {} -> {:?}", template_rel, dest);
        Ok(dest)
    }

    /// Render the whole template tree into a target directory.
    ///
    /// Files carrying the template suffix are rendered, with the suffix
    /// stripped at the destination; all other files are copied verbatim.
    /// A failing template is recorded in [`ResolveResult::failures`] and
    /// generation continues with the remaining files.
    pub fn resolve_tree(
        &self,
        target_dir: &str,
        ctx: &RenderContext,
    ) -> TemplateResult<ResolveResult> {
        let target_path = ensure_directory_exists(target_dir, &self.config)?;
        info!(
            "Generating {:?} into {:?}",
            self.templates_path, target_path
        );

        let mut created_files = Vec::new();
        let mut failures = Vec::new();

        for entry in WalkDir::new(&self.templates_path)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let source = entry.path();
            let relative = source
                .strip_prefix(&self.templates_path)
                .expect("walkdir entries are under the templates root");
            let rel_str = relative.to_string_lossy();
            let dest =
                target_path.join(resolve_output_path(&rel_str, &self.config.template_suffix));

            if source.is_dir() {
                fs::create_dir_all(&dest)?;
                continue;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            if rel_str.ends_with(&self.config.template_suffix) {
                match self.render_file(source, ctx) {
                    Ok(rendered) => {
                        fs::write(&dest, rendered)?;
                        debug!("Rendered {:?}", relative);
                        created_files.push(dest);
                    }
                    Err(error) => {
                        warn!("Failed to render {:?}: {}", source, error);
                        failures.push(RenderFailure {
                            template: source.to_path_buf(),
                            error,
                        });
                    }
                }
            } else {
                fs::copy(source, &dest)?;
                debug!("Copied {:?}", relative);
                created_files.push(dest);
            }
        }

        info!(
            "Created {} files, {} failures",
            created_files.len(),
            failures.len()
        );
        Ok(ResolveResult {
            target_path,
            created_files,
            failures,
        })
    }

    fn render_file(&self, source: &Path, ctx: &RenderContext) -> TemplateResult<String> {
        let content = fs::read_to_string(source)?;
        self.renderer.render(&content, ctx)
    }
}
