use roster::hot_reload::watch_views;
use roster::views::{Renderer, TemplateRenderer};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::fixtures::write_views;

/// Replace `users.html` atomically so no reload ever sees a half-written file.
fn replace_view(views: &Path, body: &str) {
    let tmp = views.join("users.html.tmp");
    std::fs::write(&tmp, body).unwrap();
    std::fs::rename(&tmp, views.join("users.html")).unwrap();
}

fn render(renderer: &TemplateRenderer) -> String {
    renderer
        .render("users", &json!({ "title": "Users", "users": [] }))
        .unwrap()
}

#[test]
fn test_watch_views_reload() {
    let dir = tempfile::tempdir().unwrap();
    let views = write_views(dir.path(), &[("users.html", "v1 {{ title }}")]);
    let renderer = Arc::new(TemplateRenderer::from_dir(&views).unwrap());
    assert_eq!(render(&renderer), "v1 Users");

    let watcher = watch_views(Arc::clone(&renderer)).expect("watch_views");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    replace_view(&views, "v2 {{ title }}");

    for _ in 0..40 {
        if render(&renderer) == "v2 Users" {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(render(&renderer), "v2 Users");

    // A broken edit keeps the last good template.
    replace_view(&views, "{% if %}");
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(render(&renderer), "v2 Users");

    drop(watcher);
}

#[test]
fn test_watch_views_needs_directory() {
    let renderer = Arc::new(TemplateRenderer::builtin().unwrap());
    assert!(watch_views(renderer).is_err());
}
