use std::borrow::Cow;
use std::io::Write;

use serde::ser::Serialize;
use serde_json::value::{to_value, Map, Value};

use crate::errors::{Error, Result as ScimitarResult};

/// The data a page is rendered against, reachable as `Model` in templates.
///
/// A model is usually built from any serializable struct with [`Model::from_serialize`],
/// or from scratch by inserting top-level keys like a map.
///
/// ```rust
/// # use scimitar::Model;
/// let mut model = Model::new();
/// model.insert("Name", &"World");
/// model.insert("Count", &3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    data: Value,
    type_name: Option<String>,
}

impl Model {
    /// Initializes an empty model, an empty JSON object
    pub fn new() -> Self {
        Model { data: Value::Object(Map::new()), type_name: None }
    }

    /// Takes a serde-json `Value` as is
    pub fn from_value(data: Value) -> Self {
        Model { data, type_name: None }
    }

    /// Converts any `Serialize` value into a model
    pub fn from_serialize(value: impl Serialize) -> ScimitarResult<Self> {
        Ok(Model { data: to_value(value)?, type_name: None })
    }

    /// Converts a `Serialize` value and remembers its Rust type name, so pages
    /// declaring `@model SomeType` can check they were given the right kind of model.
    pub fn typed<T: Serialize>(value: &T) -> ScimitarResult<Self> {
        let mut model = Model::from_serialize(value)?;
        model.type_name = Some(short_type_name(std::any::type_name::<T>()).to_string());
        Ok(model)
    }

    /// Inserts something in the model, which needs to be an object.
    /// A model built from a non-object value is turned into an empty object first.
    ///
    /// Panics if the serialization fails.
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) {
        self.try_insert(key, val).unwrap();
    }

    /// Inserts something in the model, returning an error if the serialization fails
    pub fn try_insert<T: Serialize + ?Sized, S: Into<String>>(
        &mut self,
        key: S,
        val: &T,
    ) -> ScimitarResult<()> {
        let value = to_value(val)?;
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        if let Value::Object(ref mut map) = self.data {
            map.insert(key.into(), value);
        }
        Ok(())
    }

    /// Returns the value at a given top-level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Checks if a value exists at a specific top-level key
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The whole model as JSON
    pub fn as_json(&self) -> &Value {
        &self.data
    }

    /// Converts the model into JSON
    pub fn into_json(self) -> Value {
        self.data
    }

    /// The short Rust type name recorded by [`Model::typed`]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }
}

impl Default for Model {
    fn default() -> Model {
        Model::new()
    }
}

impl From<Value> for Model {
    fn from(data: Value) -> Self {
        Model::from_value(data)
    }
}

/// `crate::models::Product<T>` becomes `Product`
pub(crate) fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics).trim()
}

pub trait ValueRender {
    fn render(&self, write: &mut impl Write) -> std::io::Result<()>;

    fn render_to_string(&self) -> ScimitarResult<String> {
        let mut buf = Vec::new();
        self.render(&mut buf).map_err(Error::io_error)?;
        String::from_utf8(buf).map_err(|e| Error::chain("Invalid UTF-8 while rendering a value", e))
    }
}

impl ValueRender for Value {
    fn render(&self, write: &mut impl Write) -> std::io::Result<()> {
        match *self {
            Value::String(ref s) => write!(write, "{}", s),
            Value::Number(ref i) => {
                if let Some(v) = i.as_i64() {
                    write!(write, "{}", v)
                } else if let Some(v) = i.as_u64() {
                    write!(write, "{}", v)
                } else if let Some(v) = i.as_f64() {
                    write!(write, "{}", v)
                } else {
                    unreachable!()
                }
            }
            Value::Bool(i) => write!(write, "{}", if i { "True" } else { "False" }),
            Value::Null => Ok(()),
            Value::Array(ref a) => {
                let mut first = true;
                write!(write, "[")?;
                for i in a.iter() {
                    if !first {
                        write!(write, ", ")?;
                    }
                    first = false;
                    i.render(write)?;
                }
                write!(write, "]")?;
                Ok(())
            }
            Value::Object(_) => write!(write, "{}", self),
        }
    }
}

/// Numeric view of a value, used by comparisons and float math
pub trait ValueNumber {
    fn to_number(&self) -> Result<f64, ()>;
}

impl ValueNumber for Value {
    fn to_number(&self) -> Result<f64, ()> {
        match *self {
            Value::Number(ref i) => Ok(i.as_f64().unwrap()),
            _ => Err(()),
        }
    }
}

/// C#-like truthiness for `@if` and logic operators
pub trait ValueTruthy {
    fn is_truthy(&self) -> bool;
}

impl ValueTruthy for Value {
    fn is_truthy(&self) -> bool {
        match *self {
            Value::Number(ref i) => {
                if i.is_i64() {
                    return i.as_i64().unwrap() != 0;
                }
                if i.is_u64() {
                    return i.as_u64().unwrap() != 0;
                }
                let f = i.as_f64().unwrap();
                f != 0.0 && !f.is_nan()
            }
            Value::Bool(ref i) => *i,
            Value::Null => false,
            Value::String(ref i) => !i.is_empty(),
            Value::Array(ref i) => !i.is_empty(),
            Value::Object(ref i) => !i.is_empty(),
        }
    }
}

/// Borrows when it can, as values mostly come straight from the model
pub type Val<'a> = Cow<'a, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Product {
        name: String,
    }

    #[test]
    fn can_insert_and_get() {
        let mut model = Model::new();
        model.insert("Name", &"World");
        assert_eq!(model.get("Name"), Some(&json!("World")));
        assert!(model.contains_key("Name"));
        assert!(!model.contains_key("Other"));
    }

    #[test]
    fn insert_turns_scalars_into_objects() {
        let mut model = Model::from_value(json!(42));
        model.insert("answer", &42);
        assert_eq!(model.as_json(), &json!({"answer": 42}));
    }

    #[test]
    fn typed_model_remembers_short_type_name() {
        let model = Model::typed(&Product { name: "Moto G".to_string() }).unwrap();
        assert_eq!(model.type_name(), Some("Product"));
        assert_eq!(model.get("name"), Some(&json!("Moto G")));
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name("crate::models::Product"), "Product");
        assert_eq!(short_type_name("alloc::vec::Vec<crate::Product>"), "Vec");
        assert_eq!(short_type_name("Product"), "Product");
    }

    #[test]
    fn render_values() {
        assert_eq!(json!("hey").render_to_string().unwrap(), "hey");
        assert_eq!(json!(1.5).render_to_string().unwrap(), "1.5");
        assert_eq!(json!(true).render_to_string().unwrap(), "True");
        assert_eq!(json!(null).render_to_string().unwrap(), "");
        assert_eq!(json!([1, "a"]).render_to_string().unwrap(), "[1, a]");
    }

    #[test]
    fn truthiness() {
        assert!(!json!(0).is_truthy());
        assert!(!json!("").is_truthy());
        assert!(!json!([]).is_truthy());
        assert!(!json!(null).is_truthy());
        assert!(json!({"a": 1}).is_truthy());
        assert!(json!(0.5).is_truthy());
    }
}
