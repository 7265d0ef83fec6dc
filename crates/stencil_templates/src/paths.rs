//! Destination path derivation.

/// Derive the destination path for a template path by stripping exactly one
/// trailing template suffix. Paths without the suffix pass through
/// unchanged. Pure; any string is valid input.
pub fn resolve_output_path(template_path: &str, suffix: &str) -> String {
    template_path
        .strip_suffix(suffix)
        .unwrap_or(template_path)
        .to_string()
}
