//! Executes pages and wraps them in their layouts

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::engine::Engine;
use crate::errors::{Error, Result};
use crate::layout::Layout;
use crate::model::{short_type_name, Model};
use crate::page::Page;

mod call_stack;
mod processor;

#[cfg(test)]
mod tests;

use self::processor::Processor;

/// One execution of a [`Page`] for one render call.
///
/// When the page is a layout, `child` points at the instance it wraps, which is where
/// `RenderBody()` and `RenderSection()` read from.
#[derive(Debug)]
pub struct PageInstance<'a> {
    page: Arc<Page>,
    output: String,
    /// Keyed by lowercased name
    sections: HashMap<String, String>,
    layout: Layout,
    child: Option<&'a PageInstance<'a>>,
}

impl<'a> PageInstance<'a> {
    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    pub fn path(&self) -> &str {
        &self.page.path
    }

    /// What the page wrote outside of its sections
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// The layout the page asked for while executing
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The instance this one wraps, for layouts
    pub fn child(&self) -> Option<&'a PageInstance<'a>> {
        self.child
    }

    /// Whether the page defined that section, case-insensitively
    pub fn is_section_defined(&self, name: &str) -> bool {
        self.sections.contains_key(&name.to_lowercase())
    }

    /// The captured output of a section
    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Renders one page and its chain of layouts against one model
#[derive(Debug)]
pub struct Renderer<'a> {
    engine: &'a Engine,
    model: &'a Model,
    /// Replaces the layout the content page asks for, unless `Layout::Default`
    layout_override: Layout,
}

impl<'a> Renderer<'a> {
    pub fn new(engine: &'a Engine, model: &'a Model) -> Renderer<'a> {
        Renderer { engine, model, layout_override: Layout::Default }
    }

    pub fn with_layout(mut self, layout: Layout) -> Renderer<'a> {
        self.layout_override = layout;
        self
    }

    fn check_model_type(&self, page: &Page) -> Result<()> {
        let (expected, given) = match (page.model_type.as_deref(), self.model.type_name()) {
            (Some(expected), Some(given)) => (short_type_name(expected), given),
            _ => return Ok(()),
        };
        if expected == "dynamic" || expected == "object" || expected == given {
            return Ok(());
        }
        Err(Error::msg(format!(
            "The page expects a model of type `{}` but was given a `{}`",
            expected, given
        )))
    }

    /// Runs a page once, without looking at its layout
    pub(crate) fn execute<'c>(
        &self,
        page: Arc<Page>,
        child: Option<&'c PageInstance<'c>>,
        view_bag: &mut Map<String, Value>,
    ) -> Result<PageInstance<'c>> {
        self.check_model_type(&page).map_err(|e| Error::render(&page.path, e))?;

        let executed = Processor::new(
            &page,
            self.model.as_json(),
            view_bag,
            child,
            self.engine.config().autoescape,
        )
        .render()
        .map_err(|e| Error::render(&page.path, e))?;

        Ok(PageInstance {
            page,
            output: executed.output,
            sections: executed.sections,
            layout: executed.layout,
            child,
        })
    }

    fn layout_of(&self, instance: &PageInstance) -> Option<String> {
        if instance.child.is_none() && !self.layout_override.is_default() {
            return self.engine.resolve_directive(instance, &self.layout_override);
        }
        self.engine.resolve_layout(instance)
    }

    /// Executes the layouts around an instance until one has no layout.
    /// `chain` holds every path rendered so far, starting with the content page.
    fn wrap(
        &self,
        instance: PageInstance,
        chain: &mut Vec<String>,
        view_bag: &mut Map<String, Value>,
    ) -> Result<String> {
        let layout = match self.layout_of(&instance) {
            Some(layout) => layout,
            None => return Ok(instance.into_output()),
        };

        let is_cycle = chain.contains(&layout);
        chain.push(layout);
        if is_cycle {
            return Err(Error::layout_cycle(&chain[0], chain.clone()));
        }

        let path = &chain[chain.len() - 1];
        tracing::trace!(page = %instance.path(), layout = %path, "Wrapping in layout");
        let page = self.engine.get_or_compile(path)?;
        let layout_instance = self.execute(page, Some(&instance), view_bag)?;
        self.wrap(layout_instance, chain, view_bag)
    }

    /// Renders a compiled page and all its layouts
    pub fn render(&self, page: Arc<Page>) -> Result<String> {
        let mut view_bag = Map::new();
        let mut chain = vec![page.path.clone()];
        let instance = self.execute(page, None, &mut view_bag)?;
        self.wrap(instance, &mut chain, &mut view_bag)
    }
}
