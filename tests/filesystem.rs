use std::fs::File;
use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use scimitar::{Engine, ErrorKind, FileSystemSource, Model, TemplateSource};

mod common;
use common::{world, write_template};

fn cshtml_site() -> (TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "_Layout.cshtml", "root[@RenderBody()]");
    write_template(dir.path(), "views/Folder/_Layout.cshtml", "folder[@RenderBody()]");
    write_template(dir.path(), "views/Folder/X.cshtml", "x @Model.Name");
    write_template(dir.path(), "views/Y.cshtml", "y @Model.Name");
    let engine = Engine::with_source(FileSystemSource::new(dir.path()).with_extension("cshtml"));
    (dir, engine)
}

#[test]
fn nearest_directory_layout_is_used() {
    let (_dir, engine) = cshtml_site();
    assert_eq!(engine.render("views/Folder/X", &world()).unwrap(), "folder[x World]");
    assert_eq!(engine.render("views/Y", &world()).unwrap(), "root[y World]");
}

#[test]
fn lists_templates_without_extension() {
    let (dir, _engine) = cshtml_site();
    let source = FileSystemSource::new(dir.path()).with_extension("cshtml");
    assert_eq!(
        source.list().unwrap(),
        vec!["_Layout", "views/Folder/X", "views/Folder/_Layout", "views/Y"]
    );
}

#[test]
fn precompile_compiles_everything() {
    let (_dir, engine) = cshtml_site();
    assert_eq!(engine.precompile().unwrap(), 4);
}

#[test]
fn precompile_reports_broken_templates() {
    let (dir, engine) = cshtml_site();
    write_template(dir.path(), "views/Broken.cshtml", "@if (true) {");
    let err = engine.precompile().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Compilation { ref path, .. } if path == "views/Broken"));
}

#[test]
fn missing_template_is_not_found() {
    let (_dir, engine) = cshtml_site();
    let err = engine.render("views/Nope", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TemplateNotFound(ref p) if p == "views/Nope"));
}

#[test]
fn modified_templates_are_recompiled() {
    let (dir, engine) = cshtml_site();
    assert_eq!(engine.render("views/Y", &world()).unwrap(), "root[y World]");

    write_template(dir.path(), "views/Y.cshtml", "changed");
    let file = File::options().write(true).open(dir.path().join("views/Y.cshtml")).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();

    assert_eq!(engine.render("views/Y", &world()).unwrap(), "root[changed]");
}

#[test]
fn engine_new_requires_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Engine::new(dir.path().join("nope")).is_err());

    write_template(dir.path(), "hello", "Hello @Model.Name");
    let engine = Engine::new(dir.path()).unwrap();
    assert_eq!(engine.render("hello", &world()).unwrap(), "Hello World");
}
