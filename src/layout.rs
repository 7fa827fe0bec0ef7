use crate::config::LayoutConfig;
use crate::utils::{join_path, normalize_path};

/// Which layout wraps a page.
///
/// Set by a page with `@{ Layout = "..."; }` or given to a render call as an override.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Nothing was asked for: the nearest directory-default layout applies
    #[default]
    Default,
    /// No layout at all, not even a directory default
    None,
    /// That template, relative to the template root
    Named(String),
}

impl Layout {
    /// A named layout. An empty path means no layout
    pub fn named(path: &str) -> Layout {
        let path = normalize_path(path);
        if path.is_empty() {
            Layout::None
        } else {
            Layout::Named(path)
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Layout::Default
    }
}

impl From<&str> for Layout {
    fn from(path: &str) -> Layout {
        Layout::named(path)
    }
}

impl From<Option<&str>> for Layout {
    fn from(path: Option<&str>) -> Layout {
        path.map_or(Layout::None, Layout::named)
    }
}

/// Finds the layout of a page.
///
/// An explicit directive always wins. Otherwise, and only when `cascade` is set, the
/// directories containing the page are searched from the nearest up to the root for a
/// default layout. A page is never its own default layout.
pub(crate) fn resolve_layout<F>(
    config: &LayoutConfig,
    page_path: &str,
    ancestry: &[String],
    directive: &Layout,
    cascade: bool,
    exists: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    match *directive {
        Layout::Named(ref path) => return Some(normalize_path(path)),
        Layout::None => return None,
        Layout::Default if !cascade => return None,
        Layout::Default => (),
    }

    for dir in ancestry {
        let candidate = join_path(dir, &config.default_layout);
        if candidate != page_path && exists(&candidate) {
            tracing::trace!(page = %page_path, layout = %candidate, "Found directory layout");
            return Some(candidate);
        }
        if let Some(ref marker) = config.opt_out_marker {
            if exists(&join_path(dir, marker)) {
                tracing::trace!(page = %page_path, dir = %dir, "Directory layouts opted out");
                return None;
            }
        }
    }

    None
}
