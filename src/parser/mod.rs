use std::collections::HashSet;

use lazy_static::lazy_static;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{Error, Result as ScimitarResult};

// This include forces recompiling this source file if the grammar file changes.
// Uncomment it when doing changes to the .pest file
const _GRAMMAR: &str = include_str!("razor.pest");

#[derive(Parser)]
#[grammar = "parser/razor.pest"]
pub struct RazorParser;

/// The AST of a template
pub mod ast;

#[cfg(test)]
mod tests;

use self::ast::*;

lazy_static! {
    // Later entries bind tighter
    static ref EXPR_PARSER: PrattParser<Rule> = PrattParser::new()
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_eq, Assoc::Left) | Op::infix(Rule::op_ineq, Assoc::Left)) // ==, !=
        .op(Op::infix(Rule::op_lt, Assoc::Left) | Op::infix(Rule::op_lte, Assoc::Left)
            | Op::infix(Rule::op_gt, Assoc::Left) | Op::infix(Rule::op_gte, Assoc::Left)) // <, <=, >, >=
        .op(Op::infix(Rule::op_plus, Assoc::Left) | Op::infix(Rule::op_minus, Assoc::Left)) // +, -
        .op(Op::infix(Rule::op_times, Assoc::Left)
            | Op::infix(Rule::op_slash, Assoc::Left)
            | Op::infix(Rule::op_modulo, Assoc::Left)) // *, /, %
        .op(Op::prefix(Rule::op_not) | Op::prefix(Rule::op_neg)) // !, -
        .op(Op::postfix(Rule::member) | Op::postfix(Rule::index) | Op::postfix(Rule::call));
}

fn location(pair: &Pair<Rule>) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

/// Strings are delimited by double or single quotes and can contain escapes.
/// We need to remove the quotes and resolve the escapes before putting them in the AST
fn unquote(input: &str) -> String {
    let inner = &input[1..input.len() - 1];
    let mut output = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some(other) => output.push(other),
            None => output.push('\\'),
        }
    }
    output
}

fn parse_primary(path: &str, pair: Pair<Rule>) -> ScimitarResult<Expr> {
    let expr = match pair.as_rule() {
        Rule::int => Expr::Int(pair.as_str().parse().map_err(|_| {
            Error::compilation(
                path,
                location(&pair),
                format!("Integer out of bounds: `{}`", pair.as_str()),
            )
        })?),
        Rule::float => Expr::Float(pair.as_str().parse().map_err(|_| {
            Error::compilation(
                path,
                location(&pair),
                format!("Float out of bounds: `{}`", pair.as_str()),
            )
        })?),
        Rule::boolean => Expr::Bool(pair.as_str() == "true"),
        Rule::null => Expr::Null,
        Rule::string => Expr::String(unquote(pair.as_str())),
        Rule::ident => Expr::Ident(pair.as_str().to_string()),
        Rule::group => parse_expr(path, pair.into_inner().next().unwrap())?,
        _ => unreachable!("Got {:?} in parse_primary: {}", pair.as_rule(), pair.as_str()),
    };
    Ok(expr)
}

fn parse_args(path: &str, pair: Pair<Rule>) -> ScimitarResult<Vec<Arg>> {
    let mut args = vec![];
    for arg in pair.into_inner() {
        let mut name = None;
        let mut value = None;
        for p in arg.into_inner() {
            match p.as_rule() {
                Rule::arg_name => name = Some(p.as_str().to_string()),
                Rule::expr => value = Some(parse_expr(path, p)?),
                _ => unreachable!("{:?} not supposed to get there (parse_args)!", p.as_rule()),
            }
        }
        args.push(Arg { name, value: value.unwrap() });
    }
    Ok(args)
}

/// Builds an expression out of a flat list of prefix operators, primaries,
/// postfix accessors and infix operators
fn parse_expr_pairs(path: &str, pairs: Pairs<Rule>) -> ScimitarResult<Expr> {
    EXPR_PARSER
        .map_primary(|primary| parse_primary(path, primary))
        .map_prefix(|op, rhs| {
            let rhs = Box::new(rhs?);
            Ok(match op.as_rule() {
                Rule::op_not => Expr::Not(rhs),
                Rule::op_neg => Expr::Negate(rhs),
                _ => unreachable!(),
            })
        })
        .map_postfix(|lhs, op| {
            let lhs = Box::new(lhs?);
            Ok(match op.as_rule() {
                Rule::member => {
                    Expr::Member(lhs, op.into_inner().next().unwrap().as_str().to_string())
                }
                Rule::index => {
                    Expr::Index(lhs, Box::new(parse_expr(path, op.into_inner().next().unwrap())?))
                }
                Rule::call => Expr::Call(Call { target: lhs, args: parse_args(path, op)? }),
                _ => unreachable!(),
            })
        })
        .map_infix(|lhs, op, rhs| {
            let lhs = Box::new(lhs?);
            let rhs = Box::new(rhs?);
            let math_operator = match op.as_rule() {
                Rule::op_plus => Some(MathOperator::Add),
                Rule::op_minus => Some(MathOperator::Sub),
                Rule::op_times => Some(MathOperator::Mul),
                Rule::op_slash => Some(MathOperator::Div),
                Rule::op_modulo => Some(MathOperator::Modulo),
                _ => None,
            };
            if let Some(operator) = math_operator {
                return Ok(Expr::Math(MathExpr { lhs, operator, rhs }));
            }

            let operator = match op.as_rule() {
                Rule::op_lt => LogicOperator::Lt,
                Rule::op_lte => LogicOperator::Lte,
                Rule::op_gt => LogicOperator::Gt,
                Rule::op_gte => LogicOperator::Gte,
                Rule::op_eq => LogicOperator::Eq,
                Rule::op_ineq => LogicOperator::NotEq,
                Rule::op_and => LogicOperator::And,
                Rule::op_or => LogicOperator::Or,
                _ => unreachable!(),
            };
            Ok(Expr::Logic(LogicExpr { lhs, operator, rhs }))
        })
        .parse(pairs)
}

fn parse_expr(path: &str, pair: Pair<Rule>) -> ScimitarResult<Expr> {
    parse_expr_pairs(path, pair.into_inner())
}

/// Collects nodes, merging consecutive text and optionally eating the
/// newline that follows a directive, a code block or a section
#[derive(Default)]
struct NodeList {
    nodes: Vec<Node>,
    swallow_newline: bool,
}

impl NodeList {
    fn push_text(&mut self, text: &str) {
        let mut text = text;
        if self.swallow_newline {
            text = text.strip_prefix("\r\n").or_else(|| text.strip_prefix('\n')).unwrap_or(text);
            self.swallow_newline = false;
        }
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(ref mut previous)) = self.nodes.last_mut() {
            previous.push_str(text);
            return;
        }
        self.nodes.push(Node::Text(text.to_string()));
    }

    fn push(&mut self, node: Node) {
        self.swallow_newline = false;
        self.nodes.push(node);
    }
}

fn parse_code_block(path: &str, pair: Pair<Rule>) -> ScimitarResult<Node> {
    let mut statements = vec![];

    for p in pair.into_inner() {
        let rule = p.as_rule();
        let mut inner = p.into_inner();
        let statement = match rule {
            Rule::layout_stmt => Statement::Layout(parse_expr(path, inner.next().unwrap())?),
            Rule::view_bag_stmt => {
                let key = inner.next().unwrap().as_str().to_string();
                Statement::ViewBag(key, parse_expr(path, inner.next().unwrap())?)
            }
            Rule::var_stmt => {
                let name = inner.next().unwrap().as_str().to_string();
                Statement::Var(name, parse_expr(path, inner.next().unwrap())?)
            }
            _ => unreachable!("{:?} not supposed to get there (parse_code_block)!", rule),
        };
        statements.push(statement);
    }

    Ok(Node::Code(statements))
}

fn parse_if(path: &str, pair: Pair<Rule>) -> ScimitarResult<Node> {
    let mut conditions = vec![];
    let mut otherwise = None;

    let mut inner = pair.into_inner();
    let condition = parse_expr(path, inner.next().unwrap())?;
    conditions.push((condition, parse_block(path, inner.next().unwrap())?));

    for p in inner {
        match p.as_rule() {
            Rule::else_if => {
                let mut branch = p.into_inner();
                let condition = parse_expr(path, branch.next().unwrap())?;
                conditions.push((condition, parse_block(path, branch.next().unwrap())?));
            }
            Rule::else_block => {
                otherwise = Some(parse_block(path, p.into_inner().next().unwrap())?);
            }
            _ => unreachable!("{:?} not supposed to get there (parse_if)!", p.as_rule()),
        }
    }

    Ok(Node::If(If { conditions, otherwise }))
}

fn parse_foreach(path: &str, pair: Pair<Rule>) -> ScimitarResult<Node> {
    let mut inner = pair.into_inner();
    let value = inner.next().unwrap().as_str().to_string();
    let container = parse_expr(path, inner.next().unwrap())?;
    let body = parse_block(path, inner.next().unwrap())?;

    Ok(Node::Foreach(Foreach { value, container, body }))
}

fn parse_render_section(path: &str, pair: Pair<Rule>) -> ScimitarResult<Node> {
    let mut inner = pair.into_inner();
    let name = parse_expr(path, inner.next().unwrap())?;
    let required = match inner.next() {
        Some(flag) => Some(parse_expr(path, flag.into_inner().next().unwrap())?),
        None => None,
    };

    Ok(Node::RenderSection(RenderSection { name, required }))
}

/// Everything that can appear both at the top level and inside blocks
fn parse_node(path: &str, pair: Pair<Rule>, list: &mut NodeList) -> ScimitarResult<()> {
    match pair.as_rule() {
        Rule::escaped_at => list.push_text("@"),
        Rule::comment => (),
        Rule::code_block => {
            list.push(parse_code_block(path, pair)?);
            list.swallow_newline = true;
        }
        Rule::if_stmt => list.push(parse_if(path, pair)?),
        Rule::foreach_stmt => list.push(parse_foreach(path, pair)?),
        Rule::render_body => list.push(Node::RenderBody),
        Rule::render_section => list.push(parse_render_section(path, pair)?),
        Rule::raw_output => {
            list.push(Node::Raw(parse_expr(path, pair.into_inner().next().unwrap())?))
        }
        Rule::explicit_expr => {
            list.push(Node::Expr(parse_expr(path, pair.into_inner().next().unwrap())?))
        }
        Rule::implicit_expr => list.push(Node::Expr(parse_expr_pairs(path, pair.into_inner())?)),
        _ => unreachable!("unreachable content rule: {:?}", pair.as_rule()),
    };
    Ok(())
}

fn parse_block_content(path: &str, pair: Pair<Rule>, list: &mut NodeList) -> ScimitarResult<()> {
    match pair.as_rule() {
        Rule::block_text => list.push_text(pair.as_str()),
        Rule::braced_text => {
            list.push_text("{");
            for p in pair.into_inner() {
                parse_block_content(path, p, list)?;
            }
            list.push_text("}");
        }
        _ => parse_node(path, pair, list)?,
    };
    Ok(())
}

fn parse_block(path: &str, pair: Pair<Rule>) -> ScimitarResult<Vec<Node>> {
    let mut list = NodeList::default();
    for p in pair.into_inner() {
        parse_block_content(path, p, &mut list)?;
    }
    Ok(list.nodes)
}

fn rename_rule(rule: &Rule) -> String {
    match *rule {
        Rule::EOI => "end of input".to_string(),
        Rule::int => "an integer".to_string(),
        Rule::float => "a float".to_string(),
        Rule::string | Rule::double_quoted_string | Rule::single_quoted_string => {
            "a string".to_string()
        }
        Rule::boolean => "`true` or `false`".to_string(),
        Rule::null => "`null`".to_string(),
        Rule::ident => "an identifier".to_string(),
        Rule::type_name => "a type name".to_string(),
        Rule::expr | Rule::group => "an expression".to_string(),
        Rule::member => "a member access (`.Name`)".to_string(),
        Rule::index => "an index (`[0]`)".to_string(),
        Rule::call | Rule::arg | Rule::arg_name => "a call (`(...)`)".to_string(),
        Rule::op_or => "`||`".to_string(),
        Rule::op_and => "`&&`".to_string(),
        Rule::op_not => "`!`".to_string(),
        Rule::op_neg | Rule::op_minus => "`-`".to_string(),
        Rule::op_lte => "`<=`".to_string(),
        Rule::op_gte => "`>=`".to_string(),
        Rule::op_lt => "`<`".to_string(),
        Rule::op_gt => "`>`".to_string(),
        Rule::op_ineq => "`!=`".to_string(),
        Rule::op_eq => "`==`".to_string(),
        Rule::op_plus => "`+`".to_string(),
        Rule::op_times => "`*`".to_string(),
        Rule::op_slash => "`/`".to_string(),
        Rule::op_modulo => "`%`".to_string(),
        Rule::escaped_at => "`@@`".to_string(),
        Rule::comment => "a comment (`@* ... *@`)".to_string(),
        Rule::explicit_expr => "an explicit expression (`@(...)`)".to_string(),
        Rule::raw_output => "`@Html.Raw(...)`".to_string(),
        Rule::implicit_expr => "an expression (`@Model.Name`)".to_string(),
        Rule::render_body => "`@RenderBody()`".to_string(),
        Rule::render_section | Rule::required_flag => {
            r#"a section render (`@RenderSection("Name")`)"#.to_string()
        }
        Rule::layout_stmt => "a layout assignment (`Layout = \"...\";`)".to_string(),
        Rule::view_bag_stmt => "a ViewBag assignment (`ViewBag.Title = ...;`)".to_string(),
        Rule::var_stmt => "a variable declaration (`var x = ...;`)".to_string(),
        Rule::code_block => "a code block (`@{ ... }`)".to_string(),
        Rule::block | Rule::braced_text => "a block (`{ ... }`)".to_string(),
        Rule::else_if => "`else if`".to_string(),
        Rule::else_block => "`else`".to_string(),
        Rule::if_stmt => "an `@if` statement".to_string(),
        Rule::foreach_stmt => "a `@foreach` loop".to_string(),
        Rule::model_directive => "a model directive (`@model Type`)".to_string(),
        Rule::section => "a section (`@section Name { ... }`)".to_string(),
        Rule::text | Rule::block_text => "some text".to_string(),
        Rule::template => "a template".to_string(),
        // Silent rules never appear in pest errors; keep pest's default naming.
        _ => format!("{:?}", rule),
    }
}

/// Parses a template source into its AST
pub fn parse(path: &str, input: &str) -> ScimitarResult<Document> {
    let mut pairs = match RazorParser::parse(Rule::template, input) {
        Ok(p) => p,
        Err(e) => {
            let line_col = match e.line_col {
                LineColLocation::Pos(pos) => pos,
                LineColLocation::Span(start, _) => start,
            };
            let fancy_e = e.renamed_rules(rename_rule);
            return Err(Error::compilation(path, line_col, fancy_e.variant.message()));
        }
    };

    let mut document = Document::default();
    let mut list = NodeList::default();
    let mut section_names = HashSet::new();

    // We must have at least a `template` pair if we got there
    for p in pairs.next().unwrap().into_inner() {
        match p.as_rule() {
            Rule::model_directive => {
                if document.model_type.is_some() {
                    return Err(Error::compilation(
                        path,
                        location(&p),
                        "`@model` can only be declared once",
                    ));
                }
                document.model_type = Some(p.into_inner().next().unwrap().as_str().to_string());
                list.swallow_newline = true;
            }
            Rule::section => {
                let loc = location(&p);
                let mut inner = p.into_inner();
                let name = inner.next().unwrap().as_str().to_string();
                if !section_names.insert(name.to_lowercase()) {
                    return Err(Error::compilation(
                        path,
                        loc,
                        format!("Section '{}' is already defined", name),
                    ));
                }
                let body = parse_block(path, inner.next().unwrap())?;
                list.push(Node::Section(Section { name, body }));
                list.swallow_newline = true;
            }
            Rule::text => list.push_text(p.as_str()),
            Rule::EOI => (),
            _ => parse_node(path, p, &mut list)?,
        }
    }

    document.nodes = list.nodes;
    Ok(document)
}
