use std::convert::Into;
use std::error::Error as StdError;
use std::fmt;

/// The kind of an error (non-exhaustive)
#[non_exhaustive]
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum ErrorKind {
    /// Generic error
    Msg(String),
    /// No source could be found for that template path
    TemplateNotFound(String),
    /// The template source is malformed
    Compilation {
        /// Path of the template that failed to compile
        path: String,
        /// 1-based line of the offending location
        line: usize,
        /// 1-based column of the offending location
        column: usize,
        /// What went wrong
        message: String,
    },
    /// An expression referenced something that doesn't exist on the model or in scope
    UnresolvedReference {
        /// The page being executed
        page: String,
        /// The expression as written in the template
        reference: String,
    },
    /// A layout rendered a section its child never defined, without checking first
    MissingSection {
        /// The layout that asked for the section
        page: String,
        /// The section name
        section: String,
    },
    /// Following the layouts of a page came back to a layout already in the chain
    LayoutCycle {
        /// The page the render started from
        page: String,
        /// The full chain, ending with the repeated layout
        chain: Vec<String>,
    },
    /// Any other failure while executing a page. The cause is in `source`
    Render {
        /// The page being executed
        page: String,
    },
    /// An error while serializing a model
    Json(serde_json::Error),
    /// An IO error while writing the rendered output or reading a template
    Io(std::io::ErrorKind),
}

/// The Error type
#[derive(Debug)]
pub struct Error {
    /// Kind of error
    pub kind: ErrorKind,
    source: Option<Box<dyn StdError + Sync + Send>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Msg(ref message) => write!(f, "{}", message),
            ErrorKind::TemplateNotFound(ref name) => write!(f, "Template '{}' not found", name),
            ErrorKind::Compilation { ref path, line, column, ref message } => {
                write!(f, "Failed to compile '{}' at {}:{}: {}", path, line, column, message)
            }
            ErrorKind::UnresolvedReference { ref page, ref reference } => {
                write!(f, "Reference `{}` could not be resolved while rendering '{}'", reference, page)
            }
            ErrorKind::MissingSection { ref page, ref section } => write!(
                f,
                "Section '{}' is required by '{}' but was not defined by the page it wraps",
                section, page
            ),
            ErrorKind::LayoutCycle { ref page, ref chain } => write!(
                f,
                "Layout cycle detected while rendering '{}': {}",
                page,
                chain.join(" -> ")
            ),
            ErrorKind::Render { ref page } => write!(f, "Failed to render '{}'", page),
            ErrorKind::Json(ref e) => write!(f, "{}", e),
            ErrorKind::Io(ref io_error) => {
                write!(f, "Io error while writing rendered value to output: {:?}", io_error)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|c| &**c as &(dyn StdError + 'static))
    }
}

impl Error {
    /// Creates generic error
    pub fn msg(value: impl ToString) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: None }
    }

    /// Creates generic error with a source
    pub fn chain(value: impl ToString, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: Some(source.into()) }
    }

    /// Creates a template not found error
    pub fn template_not_found(path: impl ToString) -> Self {
        Self { kind: ErrorKind::TemplateNotFound(path.to_string()), source: None }
    }

    /// Creates a compilation error pointing at a location in the source
    pub fn compilation(
        path: impl ToString,
        (line, column): (usize, usize),
        message: impl ToString,
    ) -> Self {
        Self {
            kind: ErrorKind::Compilation {
                path: path.to_string(),
                line,
                column,
                message: message.to_string(),
            },
            source: None,
        }
    }

    /// Creates an unresolved reference error
    pub fn unresolved_reference(page: impl ToString, reference: impl ToString) -> Self {
        Self {
            kind: ErrorKind::UnresolvedReference {
                page: page.to_string(),
                reference: reference.to_string(),
            },
            source: None,
        }
    }

    /// Creates a missing section error
    pub fn missing_section(page: impl ToString, section: impl ToString) -> Self {
        Self {
            kind: ErrorKind::MissingSection { page: page.to_string(), section: section.to_string() },
            source: None,
        }
    }

    /// Creates a layout cycle error
    pub fn layout_cycle(page: impl ToString, chain: Vec<String>) -> Self {
        Self { kind: ErrorKind::LayoutCycle { page: page.to_string(), chain }, source: None }
    }

    /// Wraps a runtime failure with the page it happened in.
    /// Errors that already name their page are returned as is.
    pub fn render(page: impl ToString, source: Error) -> Self {
        if source.is_render_error() {
            return source;
        }
        Self { kind: ErrorKind::Render { page: page.to_string() }, source: Some(Box::new(source)) }
    }

    /// Creates an IO error
    pub fn io_error(error: std::io::Error) -> Self {
        Self { kind: ErrorKind::Io(error.kind()), source: Some(Box::new(error)) }
    }

    /// Creates JSON error
    pub fn json(value: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Json(value), source: None }
    }

    /// Whether the error happened while executing a page against a model
    pub fn is_render_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Render { .. }
                | ErrorKind::UnresolvedReference { .. }
                | ErrorKind::MissingSection { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::io_error(error)
    }
}
impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Self::msg(e)
    }
}
impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::msg(e)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e)
    }
}
/// Convenient wrapper around std::Result.
pub type Result<T> = ::std::result::Result<T, Error>;
