use crate::errors::Result;
use crate::parser::ast::{Node, Section};
use crate::parser::parse;
use crate::utils::{directory_ancestry, normalize_path};

/// The compiled form of one template.
///
/// A page is immutable once built: the registry shares it behind an `Arc` with every
/// render that needs it and replaces it as a whole when its source changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Normalized logical path, `views/home/index`
    pub path: String,
    /// The type declared with `@model`, if any
    pub model_type: Option<String>,
    /// The executable body
    pub ast: Vec<Node>,
    /// Names of the sections this page defines, in order of appearance
    pub sections: Vec<String>,
    /// Revision of the source it was compiled from, to detect stale pages
    pub revision: Option<u64>,
    /// Whether the source was registered inline rather than loaded from a source
    pub from_inline: bool,
    /// Every directory containing the page, from its own up to the root
    pub ancestry: Vec<String>,
}

impl Page {
    /// Compiles a template source
    pub fn new(path: &str, source: &str, revision: Option<u64>) -> Result<Page> {
        let path = normalize_path(path);
        let document = parse(&path, source)?;

        let sections = document
            .nodes
            .iter()
            .filter_map(|node| match *node {
                Node::Section(Section { ref name, .. }) => Some(name.clone()),
                _ => None,
            })
            .collect();

        Ok(Page {
            ancestry: directory_ancestry(&path),
            path,
            model_type: document.model_type,
            ast: document.nodes,
            sections,
            revision,
            from_inline: false,
        })
    }

    /// Compiles a template source registered inline
    pub(crate) fn new_inline(path: &str, source: &str) -> Result<Page> {
        let mut page = Page::new(path, source, None)?;
        page.from_inline = true;
        Ok(page)
    }

    /// Whether this page defines the given section, case-insensitively
    pub fn defines_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}
