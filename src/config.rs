use serde::Deserialize;

/// How an [`Engine`](crate::Engine) behaves.
///
/// Every field has a default, so a host can deserialize a partial configuration
/// from whatever format it loads its settings from.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Whether `@expr` output is HTML-escaped. `@Html.Raw(...)` never is
    pub autoescape: bool,
    /// Whether a cached page is checked against the revision of its source
    /// before being reused
    pub check_modifications: bool,
    pub layouts: LayoutConfig,
}

impl Default for Config {
    fn default() -> Config {
        Config { autoescape: true, check_modifications: true, layouts: LayoutConfig::default() }
    }
}

/// Directory-default layouts
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// File name looked up in every directory above a page when it doesn't set a layout
    pub default_layout: String,
    /// File name that, when found in a directory before any default layout, stops the
    /// lookup: pages below that directory get no layout unless they ask for one
    pub opt_out_marker: Option<String>,
    /// Whether layouts that don't set a layout themselves also get the nearest
    /// directory-default layout above them, nesting directory layouts up to the root
    pub cascade_into_layouts: bool,
}

impl Default for LayoutConfig {
    fn default() -> LayoutConfig {
        LayoutConfig {
            default_layout: "_Layout".to_string(),
            opt_out_marker: None,
            cascade_into_layouts: false,
        }
    }
}
