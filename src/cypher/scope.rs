//! Variable allocation and role bindings for one translation.
//!
//! `VariableScope` is threaded through every translation step instead of a
//! process-wide counter. It hands out fresh variables and keeps a stack of
//! frames mapping logical roles ("this", "this.actors", "connect.target[2]") to
//! the variable currently playing that role. A frame is pushed when the
//! translator enters a sub-query and popped when it leaves, so lookups only see
//! bindings that are live at that point of the statement.

use super::variable::{Variable, VariableKind};

#[derive(Debug, Default)]
struct Frame {
    bindings: Vec<(String, Variable)>,
}

#[derive(Debug)]
pub struct VariableScope {
    next_id: u32,
    frames: Vec<Frame>,
}

impl Default for VariableScope {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableScope {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            frames: vec![Frame::default()],
        }
    }

    /// A fresh node or relationship variable bound to `role` in the current frame.
    pub fn fresh_entity(&mut self, role: impl Into<String>) -> Variable {
        self.fresh(role, VariableKind::Entity)
    }

    /// A fresh value variable bound to `role` in the current frame.
    pub fn fresh_value(&mut self, role: impl Into<String>) -> Variable {
        self.fresh(role, VariableKind::Value)
    }

    fn fresh(&mut self, role: impl Into<String>, kind: VariableKind) -> Variable {
        let variable = Variable::Generated {
            id: self.next_id,
            kind,
        };
        self.next_id += 1;
        self.bind(role, variable.clone());
        variable
    }

    /// Bind an existing variable (e.g. the root `this`) to a role.
    pub fn bind(&mut self, role: impl Into<String>, variable: Variable) {
        let role = role.into();
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.push((role, variable));
        }
    }

    /// Innermost live binding of `role`.
    pub fn lookup(&self, role: &str) -> Option<&Variable> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.bindings.iter().rev())
            .find(|(bound, _)| bound == role)
            .map(|(_, variable)| variable)
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of variables allocated so far.
    pub fn allocated(&self) -> u32 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_variables_are_unique_across_frames() {
        let mut scope = VariableScope::new();
        let outer = scope.fresh_entity("this.actors");
        scope.push_frame();
        let inner = scope.fresh_entity("this.actors");
        assert_ne!(outer, inner);
        assert_eq!(scope.lookup("this.actors"), Some(&inner));
        scope.pop_frame();
        assert_eq!(scope.lookup("this.actors"), Some(&outer));
        assert_eq!(scope.allocated(), 2);
    }

    #[test]
    fn test_root_frame_is_never_popped() {
        let mut scope = VariableScope::new();
        scope.bind("this", Variable::this());
        scope.pop_frame();
        assert_eq!(scope.depth(), 1);
        assert_eq!(scope.lookup("this"), Some(&Variable::this()));
    }
}
