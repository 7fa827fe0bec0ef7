#![doc(html_root_url = "https://docs.rs/scimitar")]
//! # Scimitar
//!
//! A Razor-flavoured template engine with layouts, sections and directory-default layouts.
//!
//! Templates mix text with `@` transitions: `@Model.Name`, `@(expr)`, `@if`, `@foreach`,
//! `@{ Layout = "..."; }` and `@section Name { ... }`. A page is wrapped by the layout it
//! asks for or, when it asks for none, by the nearest `_Layout` found walking up from its
//! directory. Layouts inject the page with `@RenderBody()` and its sections with
//! `@RenderSection("Name")`.
//!
//! Compiled pages are cached and shared: an [`Engine`] can render from many threads at once
//! and compiles each template only once, even when many threads ask for it first at the
//! same time.
//!
//! ## Example
//!
//! ```rust
//! use scimitar::{Engine, Model};
//!
//! let engine = Engine::default();
//! engine.register_inline("_Layout", "<title>@RenderSection(\"Title\")</title>@RenderBody()").unwrap();
//! engine.register_inline("views/hello", "@section Title {Hi}\nHello, @Model.Name!").unwrap();
//!
//! let mut model = Model::new();
//! model.insert("Name", &"World");
//!
//! let rendered = engine.render("views/hello", &model).unwrap();
//! assert_eq!(rendered, "<title>Hi</title>Hello, World!");
//! ```

mod config;
mod dispatch;
mod engine;
mod errors;
mod layout;
mod model;
mod page;
mod parser;
mod registry;
mod renderer;
mod source;
mod utils;

// Library exports.

pub use crate::config::{Config, LayoutConfig};
pub use crate::dispatch::{Dispatcher, ViewRequest};
pub use crate::engine::Engine;
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::layout::Layout;
pub use crate::model::Model;
pub use crate::page::Page;
pub use crate::renderer::PageInstance;
pub use crate::source::{FileSystemSource, MemorySource, Source, TemplateSource};
pub use crate::utils::escape_html;
// Re-export Value and other useful things from serde
// so apps can build models by hand
pub use serde_json::value::{from_value, to_value, Map, Number, Value};

// Exposes the AST if one needs it but changing the AST is not considered
// a breaking change so it isn't public
#[doc(hidden)]
pub use crate::parser::ast;
