#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_derive::Serialize;

use scimitar::Model;

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

pub fn world() -> Model {
    let mut model = Model::new();
    model.insert("Name", &"World");
    model
}

/// Writes a template below `root`, creating its directories
pub fn write_template(root: &Path, path: &str, content: &str) {
    let file = root.join(path);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(file, content).unwrap();
}
