//! Glue between an operation handled by an application and the page rendering its result.
//!
//! An operation named `Index` returning a `Product` is rendered by the first of
//! `<views>/Index` and `<views>/Product` that exists.

use std::io::Write;
use std::sync::Arc;

use crate::engine::Engine;
use crate::errors::{Error, Result};
use crate::layout::Layout;
use crate::model::Model;
use crate::utils::join_path;

/// What to render for one handled operation
#[derive(Clone, Debug, PartialEq)]
pub struct ViewRequest {
    /// Name of the operation, the preferred view
    pub operation: String,
    /// Name of the response type, the fallback view. Defaults to the type of a model
    /// built with [`Model::typed`]
    pub response_type: Option<String>,
    /// `Layout::Named` to a bare layout for partial responses, `Layout::None` for none
    pub layout: Layout,
}

impl ViewRequest {
    pub fn new(operation: &str) -> ViewRequest {
        ViewRequest { operation: operation.to_string(), response_type: None, layout: Layout::Default }
    }

    pub fn with_response_type(mut self, response_type: &str) -> ViewRequest {
        self.response_type = Some(response_type.to_string());
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> ViewRequest {
        self.layout = layout;
        self
    }
}

/// Renders operation results with the views of one directory
#[derive(Clone, Debug)]
pub struct Dispatcher {
    engine: Arc<Engine>,
    views_dir: String,
}

impl Dispatcher {
    pub fn new(engine: Arc<Engine>, views_dir: &str) -> Dispatcher {
        Dispatcher { engine, views_dir: views_dir.trim_matches('/').to_string() }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The path of the view rendering a request
    pub fn find_view(&self, request: &ViewRequest, model: &Model) -> Result<String> {
        let by_operation = join_path(&self.views_dir, &request.operation);
        let response_type = request.response_type.as_deref().or_else(|| model.type_name());

        let mut candidates = vec![by_operation.clone()];
        if let Some(type_name) = response_type {
            candidates.push(join_path(&self.views_dir, type_name));
        }

        match candidates.into_iter().find(|path| self.engine.template_exists(path)) {
            Some(path) => Ok(path),
            None => Err(Error::template_not_found(by_operation)),
        }
    }

    /// Renders the view of a request to a string
    pub fn render(&self, request: &ViewRequest, model: &Model) -> Result<String> {
        let view = self.find_view(request, model)?;
        tracing::debug!(operation = %request.operation, view = %view, "Dispatching");
        self.engine.render_with_layout(&view, model, request.layout.clone())
    }

    /// Renders the view of a request and writes it to the response
    pub fn dispatch(&self, request: &ViewRequest, model: &Model, mut write: impl Write) -> Result<()> {
        let output = self.render(request, model)?;
        write.write_all(output.as_bytes()).map_err(Error::io_error)
    }
}
