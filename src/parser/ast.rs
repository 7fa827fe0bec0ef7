use std::fmt;

/// All math operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MathOperator {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Modulo,
}

impl fmt::Display for MathOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                MathOperator::Add => "+",
                MathOperator::Sub => "-",
                MathOperator::Mul => "*",
                MathOperator::Div => "/",
                MathOperator::Modulo => "%",
            }
        )
    }
}

/// All logic operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LogicOperator {
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// ==
    Eq,
    /// !=
    NotEq,
    /// &&
    And,
    /// ||
    Or,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                LogicOperator::Gt => ">",
                LogicOperator::Gte => ">=",
                LogicOperator::Lt => "<",
                LogicOperator::Lte => "<=",
                LogicOperator::Eq => "==",
                LogicOperator::NotEq => "!=",
                LogicOperator::And => "&&",
                LogicOperator::Or => "||",
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MathExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub operator: MathOperator,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogicExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub operator: LogicOperator,
}

/// An argument of a call, optionally named: `required: false`
#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

/// `target(args)`, where target is usually an ident or a member access
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub target: Box<Expr>,
    pub args: Vec<Arg>,
}

/// An expression, found in `@...`, `@(...)`, conditions and statements
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// `Model`, `ViewBag` or a local variable
    Ident(String),
    /// `expr.name`
    Member(Box<Expr>, String),
    /// `expr[expr]`
    Index(Box<Expr>, Box<Expr>),
    Call(Call),
    /// `!expr`
    Not(Box<Expr>),
    /// `-expr`
    Negate(Box<Expr>),
    Math(MathExpr),
    Logic(LogicExpr),
}

impl Expr {
    /// The name of a call target: `IsSectionDefined` or `Model.Name.ToUpper`
    pub fn dotted_name(&self) -> Option<String> {
        match *self {
            Expr::Ident(ref name) => Some(name.clone()),
            Expr::Member(ref target, ref name) => {
                target.dotted_name().map(|prefix| format!("{}.{}", prefix, name))
            }
            _ => None,
        }
    }
}

// Renders back the expression the way it is written in templates, used in error messages
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expr::Null => write!(f, "null"),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Int(i) => write!(f, "{}", i),
            Expr::Float(v) => write!(f, "{}", v),
            Expr::String(ref s) => write!(f, "{:?}", s),
            Expr::Ident(ref name) => write!(f, "{}", name),
            Expr::Member(ref target, ref name) => write!(f, "{}.{}", target, name),
            Expr::Index(ref target, ref idx) => write!(f, "{}[{}]", target, idx),
            Expr::Call(ref call) => {
                write!(f, "{}(", call.target)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(ref name) = arg.name {
                        write!(f, "{}: ", name)?;
                    }
                    write!(f, "{}", arg.value)?;
                }
                write!(f, ")")
            }
            Expr::Not(ref e) => write!(f, "!{}", e),
            Expr::Negate(ref e) => write!(f, "-{}", e),
            Expr::Math(ref m) => write!(f, "{} {} {}", m.lhs, m.operator, m.rhs),
            Expr::Logic(ref l) => write!(f, "{} {} {}", l.lhs, l.operator, l.rhs),
        }
    }
}

/// Statements found in `@{ ... }` code blocks
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `Layout = "path";`, `Layout = null;`
    Layout(Expr),
    /// `ViewBag.Title = "Home";`
    ViewBag(String, Expr),
    /// `var total = Model.Items.Count;`
    Var(String, Expr),
}

/// A `@section Name { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub name: String,
    pub body: Vec<Node>,
}

/// A `@foreach (var item in Model.Items) { ... }`
#[derive(Clone, Debug, PartialEq)]
pub struct Foreach {
    /// Name of the local variable for the value in the loop
    pub value: String,
    /// Expression being iterated on
    pub container: Expr,
    /// What's in the loop itself
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    /// First item is the if, all the ones after are `else if`
    pub conditions: Vec<(Expr, Vec<Node>)>,
    /// The optional `else` block
    pub otherwise: Option<Vec<Node>>,
}

/// A `@RenderSection("Name", required: false)`
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSection {
    pub name: Expr,
    /// Defaults to `true` when absent
    pub required: Option<Expr>,
}

/// All nodes that can be encountered in a template
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Some actual text
    Text(String),
    /// `@expr` or `@(expr)`, escaped when autoescape is on
    Expr(Expr),
    /// `@Html.Raw(expr)`, never escaped
    Raw(Expr),
    /// The statements of a `@{ ... }` block
    Code(Vec<Statement>),
    Section(Section),
    If(If),
    Foreach(Foreach),
    /// `@RenderBody()`
    RenderBody,
    RenderSection(RenderSection),
}

/// A parsed template
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// The type given to `@model`, if any
    pub model_type: Option<String>,
    pub nodes: Vec<Node>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_display_like_written() {
        let expr = Expr::Member(
            Box::new(Expr::Index(
                Box::new(Expr::Member(Box::new(Expr::Ident("Model".to_string())), "Items".to_string())),
                Box::new(Expr::Int(0)),
            )),
            "Name".to_string(),
        );
        assert_eq!(expr.to_string(), "Model.Items[0].Name");
    }

    #[test]
    fn dotted_name_of_members() {
        let expr = Expr::Member(Box::new(Expr::Ident("Html".to_string())), "Raw".to_string());
        assert_eq!(expr.dotted_name(), Some("Html.Raw".to_string()));
        assert_eq!(Expr::Int(1).dotted_name(), None);
    }
}
