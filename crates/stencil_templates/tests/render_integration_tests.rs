//! Integration tests for the rendering pipeline.

use std::fs;

use serde_json::json;
use stencil_templates::{
    EngineConfig, RenderContext, TemplateError, TemplateRenderer, TemplateResolver,
};
use tempfile::tempdir;

fn ctx_for_app() -> RenderContext {
    RenderContext::new()
        .with_var("baseName", "online-shop")
        .with_var("packageName", "com.acme.shop")
        .with_var("database", "postgres")
        .with_var("features", json!(["auth", "audit"]))
        .with_var("withFrontend", true)
}

#[test]
fn test_resolve_tree_renders_and_copies() {
    let templates = tempdir().unwrap();
    fs::create_dir_all(templates.path().join("src/main")).unwrap();
    fs::write(
        templates.path().join("src/main/Application.java.ejs"),
        "package <%= packageName %>;\n\npublic class <%= pascalCase(baseName) %>App {}\n",
    )
    .unwrap();
    fs::write(
        templates.path().join("application.yml.ejs"),
        "database: <%= database %>\nfeatures:\n<% for f in features %>  - <%= f %>\n<% end %>",
    )
    .unwrap();
    fs::write(templates.path().join("logo.png"), b"\x89PNG\r\n").unwrap();

    let target = tempdir().unwrap();
    let resolver = TemplateResolver::new(templates.path(), EngineConfig::default());
    let result = resolver
        .resolve_tree(&target.path().to_string_lossy(), &ctx_for_app())
        .unwrap();

    assert!(result.failures.is_empty());
    assert_eq!(result.created_files.len(), 3);

    let app = fs::read_to_string(target.path().join("src/main/Application.java")).unwrap();
    assert_eq!(
        app,
        "package com.acme.shop;\n\npublic class OnlineShopApp {}\n"
    );

    let yml = fs::read_to_string(target.path().join("application.yml")).unwrap();
    assert_eq!(yml, "database: postgres\nfeatures:\n  - auth\n  - audit\n");

    // Non-template files are copied byte for byte under their own name
    assert_eq!(
        fs::read(target.path().join("logo.png")).unwrap(),
        b"\x89PNG\r\n"
    );
}

#[test]
fn test_per_file_failure_does_not_abort_run() {
    let templates = tempdir().unwrap();
    fs::write(templates.path().join("good.txt.ejs"), "name=<%= baseName %>\n").unwrap();
    fs::write(templates.path().join("bad.txt.ejs"), "<%= notDefined %>").unwrap();

    let target = tempdir().unwrap();
    let resolver = TemplateResolver::new(templates.path(), EngineConfig::default());
    let result = resolver
        .resolve_tree(&target.path().to_string_lossy(), &ctx_for_app())
        .unwrap();

    // The failing template is reported with its path and detail...
    assert_eq!(result.failures.len(), 1);
    let failure = &result.failures[0];
    assert!(failure.template.ends_with("bad.txt.ejs"));
    assert!(matches!(
        &failure.error,
        TemplateError::MissingVariable(name) if name == "notDefined"
    ));
    // ...and nothing was written for it, not even partial output
    assert!(!target.path().join("bad.txt").exists());

    // The rest of the run completed
    assert_eq!(
        fs::read_to_string(target.path().join("good.txt")).unwrap(),
        "name=online-shop\n"
    );
}

#[test]
fn test_invalid_target_falls_back() {
    let templates = tempdir().unwrap();
    fs::write(templates.path().join("a.txt.ejs"), "ok").unwrap();

    let workdir = tempdir().unwrap();
    let config = EngineConfig {
        fallback_dir: workdir.path().join("fallback-out"),
        ..EngineConfig::default()
    };
    let resolver = TemplateResolver::new(templates.path(), config.clone());

    let result = resolver.resolve_tree("   ", &RenderContext::new()).unwrap();
    assert_eq!(result.target_path, config.fallback_dir);
    assert_eq!(
        fs::read_to_string(config.fallback_dir.join("a.txt")).unwrap(),
        "ok"
    );
}

#[test]
fn test_escaped_and_raw_interpolation_end_to_end() {
    let renderer = TemplateRenderer::new();
    let ctx = RenderContext::new().with_var("markup", "<div class=\"x\">&nbsp;</div>");

    let escaped = renderer.render("<%= markup %>", &ctx).unwrap();
    assert_eq!(
        escaped,
        "&lt;div class=&quot;x&quot;&gt;&amp;nbsp;&lt;/div&gt;"
    );

    let raw = renderer.render("<%- markup %>", &ctx).unwrap();
    assert_eq!(raw, "<div class=\"x\">&nbsp;</div>");
}

#[test]
fn test_conditional_sections_in_generated_file() {
    let renderer = TemplateRenderer::new();
    let source = "\
dependencies:\n\
<% if database == \"postgres\" %>  - postgresql\n<% end %>\
<% if withFrontend %>  - node\n<% else %>  - none\n<% end %>";

    let out = renderer.render(source, &ctx_for_app()).unwrap();
    assert_eq!(out, "dependencies:\n  - postgresql\n  - node\n");

    let backend_only = ctx_for_app()
        .with_var("database", "mysql")
        .with_var("withFrontend", false);
    let out = renderer.render(source, &backend_only).unwrap();
    assert_eq!(out, "dependencies:\n  - none\n");
}

#[test]
fn test_contexts_do_not_leak_between_renders() {
    let renderer = TemplateRenderer::new();
    let first = RenderContext::new().with_var("name", "one");
    assert_eq!(renderer.render("<%= name %>", &first).unwrap(), "one");

    // A fresh context must not see the previous render's variables
    let second = RenderContext::new();
    assert!(matches!(
        renderer.render("<%= name %>", &second).unwrap_err(),
        TemplateError::MissingVariable(_)
    ));
}
