use std::error::Error as StdError;

use serde_json::json;

use crate::errors::ErrorKind;
use crate::model::Model;

use super::{engine_with, render_template, world, Product};

#[test]
fn missing_model_property_is_unresolved() {
    let err = render_template("Hello @Model.Nmae!", &world()).unwrap_err();
    match err.kind {
        ErrorKind::UnresolvedReference { ref page, ref reference } => {
            assert_eq!(page, "hello");
            assert_eq!(reference, "Model.Nmae");
        }
        _ => panic!("unexpected error {:?}", err),
    }
    assert_eq!(
        err.to_string(),
        "Reference `Model.Nmae` could not be resolved while rendering 'hello'"
    );
}

#[test]
fn unknown_identifier_is_unresolved() {
    let err = render_template("@item", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedReference { ref reference, .. } if reference == "item"));
}

#[test]
fn out_of_bounds_index_is_unresolved() {
    let model = Model::from_value(json!({"Items": [1]}));
    let err = render_template("@Model.Items[3]", &model).unwrap_err();
    assert!(
        matches!(err.kind, ErrorKind::UnresolvedReference { ref reference, .. } if reference == "Model.Items[3]")
    );
}

#[test]
fn unresolved_reference_in_layout_names_the_layout() {
    let engine = engine_with(vec![
        ("_Layout", "@Model.Title @RenderBody()"),
        ("page", "body"),
    ]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedReference { ref page, .. } if page == "_Layout"));
}

#[test]
fn math_on_non_numbers_is_a_render_error() {
    let err = render_template("@(1 - true)", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Render { ref page } if page == "hello"));
    assert_eq!(
        err.source().unwrap().to_string(),
        "`true` was used in a math operation but is a boolean"
    );
}

#[test]
fn division_by_zero_is_a_render_error() {
    let err = render_template("@(1 / 0)", &Model::new()).unwrap_err();
    assert_eq!(err.source().unwrap().to_string(), "Division by zero in `0`");
}

#[test]
fn negating_the_smallest_integer_is_an_overflow() {
    let model = Model::from_value(json!({"X": i64::MIN}));
    let err = render_template("@(-Model.X)", &model).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Render { ref page } if page == "hello"));
    assert_eq!(err.source().unwrap().to_string(), "Integer overflow in `-Model.X`");

    let model = Model::from_value(json!({"X": i64::MAX}));
    assert_eq!(render_template("@(-Model.X)", &model).unwrap(), (-i64::MAX).to_string());
}

#[test]
fn iterating_on_a_number_is_a_render_error() {
    let model = Model::from_value(json!({"Count": 3}));
    let err = render_template("@foreach (var i in Model.Count) {@i}", &model).unwrap_err();
    assert_eq!(
        err.source().unwrap().to_string(),
        "Tried to iterate on `Model.Count` but it is a number"
    );
}

#[test]
fn unknown_function_is_a_render_error() {
    let err = render_template("@Model.Name.Reverse()", &world()).unwrap_err();
    assert_eq!(err.source().unwrap().to_string(), "Unknown method `Model.Name.Reverse`");
}

#[test]
fn layout_must_be_a_string() {
    let err = render_template("@{ Layout = 1; }", &Model::new()).unwrap_err();
    assert_eq!(
        err.source().unwrap().to_string(),
        "`Layout` must be set to a string or null, got a number"
    );
}

#[test]
fn model_type_must_match_the_declared_one() {
    let model = Model::typed(&Product::new()).unwrap();
    let err = render_template("@model Shop.Models.Order\n@Model.Name", &model).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Render { .. }));
    assert_eq!(
        err.source().unwrap().to_string(),
        "The page expects a model of type `Order` but was given a `Product`"
    );

    assert_eq!(render_template("@model Shop.Models.Product\n@Model.Name", &model).unwrap(), "Moto G");
    assert_eq!(render_template("@model dynamic\n@Model.Name", &model).unwrap(), "Moto G");
    // Untyped models are not checked
    let untyped = Model::from_serialize(&Product::new()).unwrap();
    assert_eq!(render_template("@model Order\n@Model.Name", &untyped).unwrap(), "Moto G");
}

#[test]
fn compilation_error_in_layout_is_propagated() {
    let engine = engine_with(vec![("_Layout", "@if (true) {"), ("page", "body")]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Compilation { ref path, .. } if path == "_Layout"));
}

#[test]
fn missing_page_is_not_found() {
    let engine = engine_with(vec![]);
    let err = engine.render("views/missing", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TemplateNotFound(ref p) if p == "views/missing"));
}

#[test]
fn failed_render_does_not_affect_the_next_one() {
    let engine = engine_with(vec![("page", "Hello @Model.Name")]);
    assert!(engine.render("page", &Model::new()).is_err());
    assert_eq!(engine.render("page", &world()).unwrap(), "Hello World");
}
