use std::collections::HashMap;

use crate::model::Val;

pub type FrameContext<'a> = HashMap<&'a str, Val<'a>>;

/// Enumerates the types of stack frames
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameType {
    /// Top level of the page
    Origin,
    /// Body of an `@if` branch
    Block,
    /// Body of a `@foreach`, cleared on each iteration
    ForLoop,
}

/// Entry in the stack frame
#[derive(Debug)]
pub struct StackFrame<'a> {
    pub kind: FrameType,
    /// Locals declared with `var` or by a `@foreach`
    context: FrameContext<'a>,
}

impl<'a> StackFrame<'a> {
    pub fn new(kind: FrameType) -> Self {
        StackFrame { kind, context: FrameContext::new() }
    }
}

/// The locals visible while executing a page. Inner frames shadow outer ones.
#[derive(Debug)]
pub struct CallStack<'a> {
    stack: Vec<StackFrame<'a>>,
}

impl<'a> CallStack<'a> {
    /// Create the initial call stack
    pub fn new() -> CallStack<'a> {
        CallStack { stack: vec![StackFrame::new(FrameType::Origin)] }
    }

    pub fn push(&mut self, kind: FrameType) {
        self.stack.push(StackFrame::new(kind));
    }

    /// Pop the last frame
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn current_frame_mut(&mut self) -> &mut StackFrame<'a> {
        // There is always the origin frame
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Adds a local to the current frame
    pub fn insert(&mut self, key: &'a str, value: Val<'a>) {
        self.current_frame_mut().context.insert(key, value);
    }

    /// Locals of a loop body only live for one iteration
    pub fn clear_for_loop(&mut self) {
        let frame = self.current_frame_mut();
        if frame.kind == FrameType::ForLoop {
            frame.context.clear();
        }
    }

    pub fn lookup(&self, key: &str) -> Option<Val<'a>> {
        self.stack.iter().rev().find_map(|frame| frame.context.get(key).cloned())
    }

    /// Whether a local with that name is visible
    pub fn contains(&self, key: &str) -> bool {
        self.stack.iter().any(|frame| frame.context.contains_key(key))
    }
}
