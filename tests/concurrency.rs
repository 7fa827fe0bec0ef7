use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use scimitar::{Engine, MemorySource, Model, Result, Source, TemplateSource};

mod common;
use common::world;

/// Counts how many times templates are read
#[derive(Debug)]
struct CountingSource {
    inner: MemorySource,
    loads: Arc<AtomicUsize>,
}

impl TemplateSource for CountingSource {
    fn load(&self, path: &str) -> Result<Source> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn revision(&self, path: &str) -> Option<u64> {
        self.inner.revision(path)
    }

    fn list(&self) -> Result<Vec<String>> {
        self.inner.list()
    }
}

fn templates() -> MemorySource {
    MemorySource::from_templates(vec![
        ("_Layout", "<title>@ViewBag.Title</title>@RenderBody()"),
        ("views/page", "@{ ViewBag.Title = Model.Name; }\n@foreach (var i in Model.Items) {@i,}"),
    ])
}

#[test]
fn many_threads_render_the_same_output() {
    let engine = Arc::new(Engine::with_source(templates()));
    let mut model = world();
    model.insert("Items", &vec![1, 2, 3]);
    let expected = engine.render("views/page", &model).unwrap();
    assert_eq!(expected, "<title>World</title>1,2,3,");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let model = model.clone();
            thread::spawn(move || engine.render("views/page", &model).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn first_renders_compile_each_page_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let source = CountingSource { inner: templates(), loads: Arc::clone(&loads) };
    let engine = Arc::new(Engine::with_source(source));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut model = Model::new();
                model.insert("Name", &i);
                model.insert("Items", &vec![i]);
                barrier.wait();
                engine.render("views/page", &model).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<title>{}</title>{},", i, i));
    }
    // The page and the root layout
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
