use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::layout::{self, Layout};
use crate::model::Model;
use crate::page::Page;
use crate::registry::Registry;
use crate::renderer::{PageInstance, Renderer};
use crate::source::{FileSystemSource, MemorySource, TemplateSource};

/// Path given to templates rendered with [`Engine::render_str`]
const ONE_OFF_PATH: &str = "__scimitar_one_off";

/// The main point of interaction in this library.
///
/// An engine owns where templates come from, the cache of compiled pages and the
/// configuration. It is `Send + Sync`: share it behind an `Arc` and render from as many
/// threads as needed.
///
/// ```no_run
/// # use scimitar::{Engine, Model};
/// let engine = Engine::new("templates").unwrap();
/// let mut model = Model::new();
/// model.insert("Name", &"World");
/// let html = engine.render("views/Home/Index", &model).unwrap();
/// ```
#[derive(Debug)]
pub struct Engine {
    source: Arc<dyn TemplateSource>,
    registry: Registry,
    config: Config,
}

impl Engine {
    /// Creates an engine loading templates from the files below `root`, as is:
    /// `views/Home/Index` is the file `<root>/views/Home/Index`.
    ///
    /// Use [`Engine::with_source`] and [`FileSystemSource::with_extension`] to leave the
    /// extension out of template paths.
    pub fn new(root: impl AsRef<Path>) -> Result<Engine> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::msg(format!("Template root {} is not a directory", root.display())));
        }
        Ok(Engine::with_source(FileSystemSource::new(root)))
    }

    /// Creates an engine loading templates from any source
    pub fn with_source(source: impl TemplateSource + 'static) -> Engine {
        Engine { source: Arc::new(source), registry: Registry::new(), config: Config::default() }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: Config) -> Engine {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &dyn TemplateSource {
        self.source.as_ref()
    }

    /// Registers a template from a string, taking precedence over any template of the same
    /// path in the source. The template is compiled right away to report errors early.
    ///
    /// ```
    /// # use scimitar::Engine;
    /// let engine = Engine::default();
    /// engine.register_inline("hello", "Hello @Model.Name!").unwrap();
    /// ```
    pub fn register_inline(&self, path: &str, source: &str) -> Result<()> {
        Page::new_inline(path, source)?;
        self.registry.register_inline(path, source);
        Ok(())
    }

    /// Removes a template registered with [`Engine::register_inline`]
    pub fn unregister_inline(&self, path: &str) -> bool {
        self.registry.unregister_inline(path)
    }

    /// Returns the compiled page for that path, compiling it first if it isn't cached
    /// or its source changed
    pub fn get_or_compile(&self, path: &str) -> Result<Arc<Page>> {
        self.registry.get_or_compile(path, self.source.as_ref(), self.config.check_modifications)
    }

    /// Drops the compiled page of a path, to be called when its source changes.
    /// Renders already using it are not affected.
    pub fn invalidate(&self, path: &str) {
        self.registry.invalidate(path);
    }

    /// Drops every compiled page
    pub fn invalidate_all(&self) {
        self.registry.invalidate_all();
    }

    /// Compiles every template of the source and every inline template,
    /// returning how many were compiled. Stops at the first error.
    pub fn precompile(&self) -> Result<usize> {
        let mut paths = self.source.list()?;
        paths.extend(self.registry.inline_paths());
        paths.sort();
        paths.dedup();

        for path in &paths {
            self.get_or_compile(path)?;
        }
        tracing::debug!(count = paths.len(), "Precompiled templates");
        Ok(paths.len())
    }

    /// Whether a template exists at that path, inline or in the source
    pub fn template_exists(&self, path: &str) -> bool {
        self.registry.exists(path, self.source.as_ref())
    }

    /// The layout that wraps an executed page, if any.
    ///
    /// A layout set by the page is used as is. Otherwise content pages get the nearest
    /// directory-default layout; layouts only do when
    /// [`LayoutConfig::cascade_into_layouts`](crate::LayoutConfig) is set.
    pub fn resolve_layout(&self, instance: &PageInstance) -> Option<String> {
        self.resolve_directive(instance, instance.layout())
    }

    pub(crate) fn resolve_directive(
        &self,
        instance: &PageInstance,
        directive: &Layout,
    ) -> Option<String> {
        let page = instance.page();
        layout::resolve_layout(
            &self.config.layouts,
            &page.path,
            &page.ancestry,
            directive,
            instance.child().is_none() || self.config.layouts.cascade_into_layouts,
            |path| self.template_exists(path),
        )
    }

    /// Renders a page and its layouts
    ///
    /// ```
    /// # use scimitar::{Engine, Model};
    /// let engine = Engine::default();
    /// engine.register_inline("hello", "Hello @Model.Name!").unwrap();
    /// let mut model = Model::new();
    /// model.insert("Name", &"World");
    /// assert_eq!(engine.render("hello", &model).unwrap(), "Hello World!");
    /// ```
    pub fn render(&self, path: &str, model: &Model) -> Result<String> {
        self.render_with_layout(path, model, Layout::Default)
    }

    /// Renders a page with a layout replacing the one it would get otherwise.
    /// `Layout::None` renders the page alone; `Layout::Default` changes nothing.
    pub fn render_with_layout(&self, path: &str, model: &Model, layout: Layout) -> Result<String> {
        let page = self.get_or_compile(path)?;
        self.render_page(&page, model, layout)
    }

    /// Renders a page that was already compiled
    pub fn render_page(&self, page: &Arc<Page>, model: &Model, layout: Layout) -> Result<String> {
        tracing::trace!(page = %page.path, "Rendering page");
        Renderer::new(self, model).with_layout(layout).render(page.clone())
    }

    /// Renders a page and writes the result to `write`. Nothing is written if rendering fails.
    pub fn render_to(
        &self,
        path: &str,
        model: &Model,
        layout: Layout,
        mut write: impl Write,
    ) -> Result<()> {
        let output = self.render_with_layout(path, model, layout)?;
        write.write_all(output.as_bytes()).map_err(Error::io_error)
    }

    /// Renders a template from a string without caching it. It behaves like a page at the
    /// root of the source: it can set a layout and gets the root default layout otherwise.
    ///
    /// ```
    /// # use scimitar::{Engine, Model};
    /// let engine = Engine::default();
    /// let output = engine.render_str("@(1 + 2) apples", &Model::new()).unwrap();
    /// assert_eq!(output, "3 apples");
    /// ```
    pub fn render_str(&self, input: &str, model: &Model) -> Result<String> {
        let page = Arc::new(Page::new_inline(ONE_OFF_PATH, input)?);
        self.render_page(&page, model, Layout::Default)
    }

    /// Executes a single page without its layouts, to look at what it produced
    pub fn execute(&self, path: &str, model: &Model) -> Result<PageInstance<'static>> {
        let page = self.get_or_compile(path)?;
        let mut view_bag = serde_json::Map::new();
        Renderer::new(self, model).execute(page, None, &mut view_bag)
    }
}

impl Default for Engine {
    /// An engine without templates besides the inline ones
    fn default() -> Engine {
        Engine::with_source(MemorySource::new())
    }
}
