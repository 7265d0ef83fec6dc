//! Render context construction and the built-in helper set.
//!
//! A [`RenderContext`] carries the variables visible during one render plus
//! the fixed helper functions every template can call. Contexts are built
//! fresh per render and never shared across renders, so values set for one
//! template cannot leak into another.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// A template helper: a named string transform callable from expressions.
pub type HelperFn = fn(&str) -> String;

/// The fixed helper set injected into every context, keyed by the name
/// templates use to call them.
const HELPERS: [(&str, HelperFn); 4] = [
    ("capitalize", capitalize),
    ("camelCase", camel_case),
    ("pascalCase", pascal_case),
    ("escapeHtml", escape_html),
];

/// Variables and helpers visible during a single render.
#[derive(Debug, Clone)]
pub struct RenderContext {
    vars: Map<String, Value>,
    helpers: HashMap<&'static str, HelperFn>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::build(Map::new())
    }
}

impl RenderContext {
    /// Build a context from caller-supplied variables, injecting each
    /// built-in helper only when the base does not already bind that name.
    /// Base values always win over helpers.
    pub fn build(base: Map<String, Value>) -> Self {
        let mut helpers = HashMap::new();
        for (name, f) in HELPERS {
            if !base.contains_key(name) {
                helpers.insert(name, f);
            }
        }
        Self {
            vars: base,
            helpers,
        }
    }

    /// Build an empty context (helpers only).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Look up a helper by its template-facing name. Returns `None` for
    /// unknown names and for helper names shadowed by a base variable.
    pub fn helper(&self, name: &str) -> Option<HelperFn> {
        self.helpers.get(name).copied()
    }
}

/// Uppercase the first character, leave the rest unchanged.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Convert to camelCase: split on `-` and `_`, lowercase the first segment,
/// uppercase the first character of each later segment, join with nothing.
pub fn camel_case(s: &str) -> String {
    let mut out = String::new();
    for (i, part) in s.split(['-', '_']).filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(&part.to_lowercase());
        } else {
            out.push_str(&capitalize(part));
        }
    }
    out
}

/// Convert to PascalCase: same split as [`camel_case`], uppercase the first
/// character of every segment.
pub fn pascal_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|p| !p.is_empty())
        .map(capitalize)
        .collect()
}

/// HTML-escape `&`, `<`, `>`, `"` and `'`. Ampersands are replaced first so
/// already-produced entities are not escaped twice.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
