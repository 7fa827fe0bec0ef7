use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::value::Index;
use serde_json::{Map, Number, Value};

use crate::errors::{Error, Result};
use crate::layout::Layout;
use crate::model::{Val, ValueNumber, ValueRender, ValueTruthy};
use crate::page::Page;
use crate::parser::ast::*;
use crate::renderer::call_stack::{CallStack, FrameType};
use crate::renderer::PageInstance;
use crate::utils::escape_html;

/// Gets a member or an item of a value, keeping its lifetime
#[inline]
fn pluck<'a, I: Index>(val: &Val<'a>, index: I) -> Option<Val<'a>> {
    match *val {
        Cow::Borrowed(r) => r.get(index).map(Cow::Borrowed),
        Cow::Owned(ref r) => r.get(index).map(|found| Cow::Owned(found.clone())),
    }
}

fn type_of(value: &Value) -> &'static str {
    match *value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `foreach` over an object gives `{Key, Value}` pairs
fn key_value<'a>(key: &str, value: Value) -> Val<'a> {
    let mut pair = Map::new();
    pair.insert("Key".to_string(), Value::String(key.to_string()));
    pair.insert("Value".to_string(), value);
    Cow::Owned(Value::Object(pair))
}

fn float_value(value: f64) -> Result<Val<'static>> {
    Number::from_f64(value)
        .map(|n| Cow::Owned(Value::Number(n)))
        .ok_or_else(|| Error::msg(format!("`{}` is not a number that can be represented", value)))
}

/// Everything one execution of a page leaves behind
pub struct Executed {
    pub output: String,
    pub sections: HashMap<String, String>,
    pub layout: Layout,
}

/// Executes the AST of one page against a model
pub struct Processor<'a> {
    page: &'a Page,
    model: &'a Value,
    /// Shared by every page of one render call, children write before layouts read
    view_bag: &'a mut Map<String, Value>,
    /// The page being wrapped when executing a layout
    child: Option<&'a PageInstance<'a>>,
    call_stack: CallStack<'a>,
    should_escape: bool,
    sections: HashMap<String, String>,
    layout: Layout,
}

impl<'a> Processor<'a> {
    pub fn new(
        page: &'a Page,
        model: &'a Value,
        view_bag: &'a mut Map<String, Value>,
        child: Option<&'a PageInstance<'a>>,
        should_escape: bool,
    ) -> Self {
        Processor {
            page,
            model,
            view_bag,
            child,
            call_stack: CallStack::new(),
            should_escape,
            sections: HashMap::new(),
            layout: Layout::Default,
        }
    }

    fn render_body(&mut self, body: &'a [Node], buffer: &mut String) -> Result<()> {
        for node in body {
            self.render_node(node, buffer)?;
        }
        Ok(())
    }

    fn render_if(&mut self, if_node: &'a If, buffer: &mut String) -> Result<()> {
        let mut branch = None;
        for (condition, body) in &if_node.conditions {
            if self.eval_as_bool(condition)? {
                branch = Some(body);
                break;
            }
        }

        if let Some(body) = branch.or(if_node.otherwise.as_ref()) {
            self.call_stack.push(FrameType::Block);
            let res = self.render_body(body, buffer);
            self.call_stack.pop();
            res?;
        }
        Ok(())
    }

    fn render_foreach(&mut self, foreach: &'a Foreach, buffer: &mut String) -> Result<()> {
        let container = self.eval_expr(&foreach.container)?;
        let items: Vec<Val<'a>> = match container {
            Cow::Borrowed(Value::Array(items)) => items.iter().map(Cow::Borrowed).collect(),
            Cow::Owned(Value::Array(items)) => items.into_iter().map(Cow::Owned).collect(),
            Cow::Borrowed(Value::Object(map)) => {
                map.iter().map(|(k, v)| key_value(k, v.clone())).collect()
            }
            Cow::Owned(Value::Object(map)) => {
                map.into_iter().map(|(k, v)| key_value(&k, v)).collect()
            }
            other => {
                return Err(Error::msg(format!(
                    "Tried to iterate on `{}` but it is {}",
                    foreach.container,
                    type_of(&other)
                )))
            }
        };

        self.call_stack.push(FrameType::ForLoop);
        let mut res = Ok(());
        for item in items {
            self.call_stack.clear_for_loop();
            self.call_stack.insert(&foreach.value, item);
            res = self.render_body(&foreach.body, buffer);
            if res.is_err() {
                break;
            }
        }
        self.call_stack.pop();
        res
    }

    fn render_section(&mut self, render: &'a RenderSection, buffer: &mut String) -> Result<()> {
        let name = match *self.eval_expr(&render.name)? {
            Value::String(ref s) => s.clone(),
            ref other => {
                return Err(Error::msg(format!(
                    "Section names must be strings, got {} for `{}`",
                    type_of(other),
                    render.name
                )))
            }
        };
        let required = match render.required {
            Some(ref flag) => self.eval_as_bool(flag)?,
            None => true,
        };
        let child = self.child.ok_or_else(|| {
            Error::msg(format!("`RenderSection(\"{}\")` can only be used in a layout", name))
        })?;

        match child.section(&name) {
            Some(content) => buffer.push_str(content),
            None if required => return Err(Error::missing_section(&self.page.path, name)),
            None => (),
        }
        Ok(())
    }

    fn eval_statement(&mut self, statement: &'a Statement) -> Result<()> {
        match *statement {
            Statement::Layout(ref expr) => {
                self.layout = match *self.eval_expr(expr)? {
                    Value::Null => Layout::None,
                    Value::String(ref path) => Layout::named(path),
                    ref other => {
                        return Err(Error::msg(format!(
                            "`Layout` must be set to a string or null, got {}",
                            type_of(other)
                        )))
                    }
                };
            }
            Statement::ViewBag(ref key, ref expr) => {
                let value = self.eval_expr(expr)?.into_owned();
                self.view_bag.insert(key.clone(), value);
            }
            Statement::Var(ref name, ref expr) => {
                let value = self.eval_expr(expr)?;
                self.call_stack.insert(name, value);
            }
        }
        Ok(())
    }

    fn unresolved(&self, expr: &Expr) -> Error {
        Error::unresolved_reference(&self.page.path, expr)
    }

    fn lookup_ident(&self, ident: &str, expr: &Expr) -> Result<Val<'a>> {
        if let Some(local) = self.call_stack.lookup(ident) {
            return Ok(local);
        }
        match ident {
            "Model" => Ok(Cow::Borrowed(self.model)),
            "ViewBag" => Ok(Cow::Owned(Value::Object(self.view_bag.clone()))),
            _ => Err(self.unresolved(expr)),
        }
    }

    fn eval_member(&mut self, target: &'a Expr, name: &str, expr: &'a Expr) -> Result<Val<'a>> {
        // ViewBag is dynamic: unset entries are null
        if let Expr::Ident(ref root) = *target {
            if root == "ViewBag" && !self.call_stack.contains(root) {
                return Ok(Cow::Owned(self.view_bag.get(name).cloned().unwrap_or(Value::Null)));
            }
        }

        let value = self.eval_expr(target)?;
        if let Some(found) = pluck(&value, name) {
            return Ok(found);
        }
        let count = match (name, &*value) {
            ("Count", Value::Array(items)) | ("Length", Value::Array(items)) => Some(items.len()),
            ("Count", Value::Object(map)) => Some(map.len()),
            ("Length", Value::String(s)) => Some(s.chars().count()),
            _ => None,
        };
        match count {
            Some(n) => Ok(Cow::Owned(Value::Number(n.into()))),
            None => Err(self.unresolved(expr)),
        }
    }

    fn eval_index(&mut self, target: &'a Expr, index: &'a Expr, expr: &'a Expr) -> Result<Val<'a>> {
        let value = self.eval_expr(target)?;
        let found = match *self.eval_expr(index)? {
            Value::String(ref key) => pluck(&value, key.as_str()),
            Value::Number(ref n) => match n.as_u64() {
                Some(i) => pluck(&value, i as usize),
                None => None,
            },
            ref other => {
                return Err(Error::msg(format!(
                    "Only strings and positive integers can be used as index, `{}` is {}",
                    index,
                    type_of(other)
                )))
            }
        };
        found.ok_or_else(|| self.unresolved(expr))
    }

    fn eval_call(&mut self, call: &'a Call) -> Result<Val<'a>> {
        match *call.target {
            Expr::Ident(ref name) if name == "IsSectionDefined" => {
                let section = match call.args.first() {
                    Some(arg) if call.args.len() == 1 => self.eval_expr(&arg.value)?,
                    _ => {
                        return Err(Error::msg(
                            "`IsSectionDefined` takes exactly one argument, the section name",
                        ))
                    }
                };
                let defined = match (*section).as_str() {
                    Some(name) => self.child.map_or(false, |child| child.is_section_defined(name)),
                    None => {
                        return Err(Error::msg(format!(
                            "Section names must be strings, got {}",
                            type_of(&section)
                        )))
                    }
                };
                Ok(Cow::Owned(Value::Bool(defined)))
            }
            Expr::Member(ref target, ref method) if call.args.is_empty() => {
                let value = self.eval_expr(target)?;
                let res = match method.as_str() {
                    "ToString" => value.render_to_string()?,
                    "ToUpper" | "ToLower" | "Trim" => {
                        let s = value.as_str().ok_or_else(|| {
                            Error::msg(format!(
                                "`{}()` can only be called on a string, `{}` is {}",
                                method,
                                target,
                                type_of(&value)
                            ))
                        })?;
                        match method.as_str() {
                            "ToUpper" => s.to_uppercase(),
                            "ToLower" => s.to_lowercase(),
                            _ => s.trim().to_string(),
                        }
                    }
                    _ => return Err(Error::msg(format!("Unknown method `{}`", call.target))),
                };
                Ok(Cow::Owned(Value::String(res)))
            }
            _ => Err(Error::msg(format!("Unknown function `{}`", call.target))),
        }
    }

    fn eval_expr(&mut self, expr: &'a Expr) -> Result<Val<'a>> {
        let res = match *expr {
            Expr::Null => Cow::Owned(Value::Null),
            Expr::Bool(b) => Cow::Owned(Value::Bool(b)),
            Expr::Int(i) => Cow::Owned(Value::Number(i.into())),
            Expr::Float(f) => float_value(f)?,
            Expr::String(ref s) => Cow::Owned(Value::String(s.clone())),
            Expr::Ident(ref ident) => self.lookup_ident(ident, expr)?,
            Expr::Member(ref target, ref name) => self.eval_member(target, name, expr)?,
            Expr::Index(ref target, ref index) => self.eval_index(target, index, expr)?,
            Expr::Call(ref call) => self.eval_call(call)?,
            Expr::Not(ref inner) => Cow::Owned(Value::Bool(!self.eval_as_bool(inner)?)),
            Expr::Negate(ref inner) => {
                let value = self.eval_expr(inner)?;
                match value.as_i64() {
                    Some(i) => match i.checked_neg() {
                        Some(n) => Cow::Owned(Value::Number(n.into())),
                        None => {
                            return Err(Error::msg(format!("Integer overflow in `{}`", expr)))
                        }
                    },
                    None => match value.to_number() {
                        Ok(f) => float_value(-f)?,
                        Err(()) => {
                            return Err(Error::msg(format!(
                                "Tried to negate `{}` but it is {}",
                                inner,
                                type_of(&value)
                            )))
                        }
                    },
                }
            }
            Expr::Math(ref math) => self.eval_math(math)?,
            Expr::Logic(_) => Cow::Owned(Value::Bool(self.eval_as_bool(expr)?)),
        };
        Ok(res)
    }

    fn eval_math(&mut self, math: &'a MathExpr) -> Result<Val<'a>> {
        let lhs = self.eval_expr(&math.lhs)?;
        let rhs = self.eval_expr(&math.rhs)?;

        if math.operator == MathOperator::Add && (lhs.is_string() || rhs.is_string()) {
            let mut res = lhs.render_to_string()?;
            res.push_str(&rhs.render_to_string()?);
            return Ok(Cow::Owned(Value::String(res)));
        }

        let not_a_number = |side: &Expr, value: &Value| {
            Error::msg(format!(
                "`{}` was used in a math operation but is {}",
                side,
                type_of(value)
            ))
        };

        if let (Some(l), Some(r)) = (lhs.as_i64(), rhs.as_i64()) {
            let res = match math.operator {
                MathOperator::Add => l.checked_add(r),
                MathOperator::Sub => l.checked_sub(r),
                MathOperator::Mul => l.checked_mul(r),
                MathOperator::Div | MathOperator::Modulo if r == 0 => {
                    return Err(Error::msg(format!("Division by zero in `{}`", math.rhs)))
                }
                MathOperator::Div => l.checked_div(r),
                MathOperator::Modulo => l.checked_rem(r),
            };
            return match res {
                Some(n) => Ok(Cow::Owned(Value::Number(n.into()))),
                None => Err(Error::msg(format!(
                    "Integer overflow in `{} {} {}`",
                    math.lhs, math.operator, math.rhs
                ))),
            };
        }

        let l = lhs.to_number().map_err(|_| not_a_number(&math.lhs, &lhs))?;
        let r = rhs.to_number().map_err(|_| not_a_number(&math.rhs, &rhs))?;
        let res = match math.operator {
            MathOperator::Add => l + r,
            MathOperator::Sub => l - r,
            MathOperator::Mul => l * r,
            MathOperator::Div => l / r,
            MathOperator::Modulo => l % r,
        };
        float_value(res)
    }

    fn eval_as_bool(&mut self, expr: &'a Expr) -> Result<bool> {
        let logic = match *expr {
            Expr::Logic(ref logic) => logic,
            _ => return Ok(self.eval_expr(expr)?.is_truthy()),
        };

        let res = match logic.operator {
            LogicOperator::Or => self.eval_as_bool(&logic.lhs)? || self.eval_as_bool(&logic.rhs)?,
            LogicOperator::And => {
                self.eval_as_bool(&logic.lhs)? && self.eval_as_bool(&logic.rhs)?
            }
            LogicOperator::Gt | LogicOperator::Gte | LogicOperator::Lt | LogicOperator::Lte => {
                let lhs = self.eval_expr(&logic.lhs)?;
                let rhs = self.eval_expr(&logic.rhs)?;
                let ordering = match (&*lhs, &*rhs) {
                    (Value::String(l), Value::String(r)) => l.partial_cmp(r),
                    (l, r) => match (l.to_number(), r.to_number()) {
                        (Ok(l), Ok(r)) => l.partial_cmp(&r),
                        _ => {
                            return Err(Error::msg(format!(
                                "Can't compare {} with {} in `{}`",
                                type_of(l),
                                type_of(r),
                                expr
                            )))
                        }
                    },
                };
                let ordering = match ordering {
                    Some(o) => o,
                    None => return Ok(false),
                };
                match logic.operator {
                    LogicOperator::Gt => ordering.is_gt(),
                    LogicOperator::Gte => ordering.is_ge(),
                    LogicOperator::Lt => ordering.is_lt(),
                    _ => ordering.is_le(),
                }
            }
            LogicOperator::Eq | LogicOperator::NotEq => {
                let lhs = self.eval_expr(&logic.lhs)?;
                let rhs = self.eval_expr(&logic.rhs)?;
                // 1 == 1.0
                let equal = match (lhs.to_number(), rhs.to_number()) {
                    (Ok(l), Ok(r)) => l == r,
                    _ => *lhs == *rhs,
                };
                if logic.operator == LogicOperator::Eq {
                    equal
                } else {
                    !equal
                }
            }
        };

        Ok(res)
    }

    fn write_value(&self, value: &Value, escape: bool, buffer: &mut String) -> Result<()> {
        let rendered = value.render_to_string()?;
        if escape && self.should_escape {
            buffer.push_str(&escape_html(&rendered));
        } else {
            buffer.push_str(&rendered);
        }
        Ok(())
    }

    /// Process the given node, appending the string result to the buffer
    fn render_node(&mut self, node: &'a Node, buffer: &mut String) -> Result<()> {
        match *node {
            Node::Text(ref s) => buffer.push_str(s),
            Node::Expr(ref expr) => {
                let value = self.eval_expr(expr)?;
                self.write_value(&value, true, buffer)?;
            }
            Node::Raw(ref expr) => {
                let value = self.eval_expr(expr)?;
                self.write_value(&value, false, buffer)?;
            }
            Node::Code(ref statements) => {
                for statement in statements {
                    self.eval_statement(statement)?;
                }
            }
            Node::Section(ref section) => {
                let mut captured = String::new();
                self.render_body(&section.body, &mut captured)?;
                self.sections.insert(section.name.to_lowercase(), captured);
            }
            Node::If(ref if_node) => self.render_if(if_node, buffer)?,
            Node::Foreach(ref foreach) => self.render_foreach(foreach, buffer)?,
            Node::RenderBody => match self.child {
                Some(child) => buffer.push_str(child.output()),
                None => return Err(Error::msg("`RenderBody()` can only be used in a layout")),
            },
            Node::RenderSection(ref render) => self.render_section(render, buffer)?,
        };

        Ok(())
    }

    /// Entry point for the rendering
    pub fn render(mut self) -> Result<Executed> {
        let mut output = String::with_capacity(1024);
        let page: &'a Page = self.page;
        self.render_body(&page.ast, &mut output)?;
        Ok(Executed { output, sections: self.sections, layout: self.layout })
    }
}
