mod errors;
mod sections;

use serde::Serialize;

use crate::engine::Engine;
use crate::errors::Result;
use crate::model::Model;
use crate::source::MemorySource;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub tags: Vec<String>,
}

impl Product {
    pub fn new() -> Product {
        Product {
            name: "Moto G".to_owned(),
            price: 199.5,
            tags: vec!["phone".to_owned(), "android".to_owned()],
        }
    }
}

pub fn render_template(content: &str, model: &Model) -> Result<String> {
    let engine = Engine::default();
    engine.register_inline("hello", content)?;
    engine.render("hello", model)
}

pub fn engine_with(templates: Vec<(&str, &str)>) -> Engine {
    Engine::with_source(MemorySource::from_templates(templates))
}

pub fn world() -> Model {
    let mut model = Model::new();
    model.insert("Name", &"World");
    model
}
