//! Lexical scope tree.
//!
//! Scopes live in an arena and refer to each other by plain index, so the
//! parent back-pointer of a child never forms an ownership cycle. The
//! analysis pass creates child scopes while descending into bodies; the
//! reference pass re-enters the *same* nodes by stored id, which is what
//! keeps emitted code landing in the file that owns it.
//!
//! Visibility: a node in private mode adds every subsequently written name
//! to its hidden set. Hidden names stay resolvable from inside the owning
//! scope (anywhere on the parent chain) but fail with `HiddenName` when a
//! dotted path reaches them from outside.

use crate::error::CompileError;
use crate::path::AttributePath;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Arena index of one scope node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
enum Binding {
    Value(Value),
    Space(ScopeId),
}

/// What a lookup resolved to: a bound value, or a nested scope (namespace,
/// numbered block space) usable as a path prefix.
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Value),
    Space(ScopeId),
}

#[derive(Debug, Default)]
struct ScopeNode {
    entries: BTreeMap<String, Binding>,
    hidden: BTreeSet<String>,
    parent: Option<ScopeId>,
    private_mode: bool,
}

/// The scope arena plus the cursor of the currently active scope.
#[derive(Debug)]
pub struct ScopeArena {
    nodes: Vec<ScopeNode>,
    current: ScopeId,
    /// Monotonic counter for numbered (anonymous block) spaces.
    local_counter: usize,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    /// A fresh arena containing only the root scope. Builtins are written
    /// into the root before any user code is analyzed.
    pub fn new() -> Self {
        ScopeArena {
            nodes: vec![ScopeNode::default()],
            current: ScopeId(0),
            local_counter: 0,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id.0]
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Bind `value` at the shortest prefix of `path` already visible,
    /// defaulting to the current node. A private-mode node also hides the
    /// written name.
    pub fn write(&mut self, path: &AttributePath, value: Value) -> Result<(), CompileError> {
        self.write_in(self.current, path, value)
    }

    fn write_in(
        &mut self,
        id: ScopeId,
        path: &AttributePath,
        value: Value,
    ) -> Result<(), CompileError> {
        let first = &path.segments()[0];
        if path.len() == 1 {
            let node = self.node_mut(id);
            if node.private_mode {
                node.hidden.insert(first.clone());
            }
            node.entries.insert(first.clone(), Binding::Value(value));
            return Ok(());
        }
        match self.node(id).entries.get(first) {
            Some(Binding::Space(child)) => {
                let child = *child;
                let rest = AttributePath::from_segments(path.segments()[1..].to_vec());
                self.write_in(child, &rest, value)
            }
            Some(Binding::Value(_)) => Err(CompileError::malformed(format!(
                "'{first}' is not a namespace; cannot write '{path}' through it"
            ))),
            None => match self.node(id).parent {
                Some(parent) => self.write_in(parent, path, value),
                None => Err(CompileError::UnboundName {
                    path: path.clone(),
                    prov: None,
                }),
            },
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Resolve `path` by walking this node's content, then its ancestors;
    /// dotted paths recurse into nested spaces, where the hidden set of
    /// each crossed scope applies.
    pub fn get(&self, path: &AttributePath) -> Result<Resolved, CompileError> {
        let first = &path.segments()[0];
        let mut id = self.current;
        loop {
            if self.node(id).entries.contains_key(first) {
                // Found on the parent chain: we are lexically inside the
                // owning scope, so its hidden set does not apply here.
                return self.get_from(id, path, true);
            }
            match self.node(id).parent {
                Some(parent) => id = parent,
                None => {
                    return Err(CompileError::UnboundName {
                        path: path.clone(),
                        prov: None,
                    })
                }
            }
        }
    }

    fn get_from(
        &self,
        id: ScopeId,
        path: &AttributePath,
        inside: bool,
    ) -> Result<Resolved, CompileError> {
        let first = &path.segments()[0];
        let node = self.node(id);
        if !inside && node.hidden.contains(first) {
            return Err(CompileError::HiddenName {
                path: path.clone(),
                prov: None,
            });
        }
        match node.entries.get(first) {
            None => Err(CompileError::UnboundName {
                path: path.clone(),
                prov: None,
            }),
            Some(Binding::Value(v)) => {
                if path.len() == 1 {
                    Ok(Resolved::Value(v.clone()))
                } else {
                    Err(CompileError::malformed(format!(
                        "'{first}' is not a namespace; cannot read '{path}' through it"
                    )))
                }
            }
            Some(Binding::Space(child)) => {
                if path.len() == 1 {
                    Ok(Resolved::Space(*child))
                } else {
                    let rest = AttributePath::from_segments(path.segments()[1..].to_vec());
                    self.get_from(*child, &rest, false)
                }
            }
        }
    }

    /// Membership test for the first segment in the current node only --
    /// deliberately not a full resolution.
    pub fn exists(&self, path: &AttributePath) -> bool {
        self.node(self.current)
            .entries
            .contains_key(&path.segments()[0])
    }

    // ── Space navigation ─────────────────────────────────────────────

    /// Push a fresh named child space (namespace, function) and enter it.
    pub fn enter_named_space(&mut self, name: &str, hide_mode: bool) -> ScopeId {
        let id = self.push_child(hide_mode);
        let node = self.node_mut(self.current);
        if node.private_mode {
            node.hidden.insert(name.to_owned());
        }
        node.entries.insert(name.to_owned(), Binding::Space(id));
        self.current = id;
        id
    }

    /// Push a fresh numbered child space (if-arm, loop body) and enter it.
    /// The returned id re-enters the same node later.
    pub fn enter_local_space(&mut self, hide_mode: bool) -> ScopeId {
        let name = self.local_counter.to_string();
        self.local_counter += 1;
        self.enter_named_space(&name, hide_mode)
    }

    /// Re-enter a space created earlier (second pass descends by id, never
    /// by re-creating).
    pub fn reenter(&mut self, id: ScopeId) {
        debug_assert_eq!(self.node(id).parent, Some(self.current));
        self.current = id;
    }

    fn push_child(&mut self, hide_mode: bool) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            parent: Some(self.current),
            private_mode: hide_mode,
            ..ScopeNode::default()
        });
        id
    }

    /// Pop to the parent scope. Leaving the root is a programming error.
    pub fn leave(&mut self) {
        self.current = self
            .node(self.current)
            .parent
            .expect("leave() called on the root scope");
    }

    pub fn enable_private(&mut self) {
        self.node_mut(self.current).private_mode = true;
    }

    pub fn disable_private(&mut self) {
        self.node_mut(self.current).private_mode = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut arena = ScopeArena::new();
        arena.write(&"x".into(), Value::Int(1)).unwrap();
        arena.enter_named_space("f", false);
        arena.enter_local_space(false);
        match arena.get(&"x".into()).unwrap() {
            Resolved::Value(Value::Int(1)) => {}
            other => panic!("expected Int(1), got {other:?}"),
        }
    }

    #[test]
    fn test_unbound_at_root() {
        let arena = ScopeArena::new();
        let err = arena.get(&"missing".into()).unwrap_err();
        assert!(matches!(err, CompileError::UnboundName { .. }));
    }

    #[test]
    fn test_dotted_read_through_namespace() {
        let mut arena = ScopeArena::new();
        arena.enter_named_space("ns", false);
        arena.write(&"inner".into(), Value::Int(7)).unwrap();
        arena.leave();
        match arena.get(&"ns.inner".into()).unwrap() {
            Resolved::Value(Value::Int(7)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_hidden_name_invisible_from_outside() {
        let mut arena = ScopeArena::new();
        arena.enter_named_space("ns", false);
        arena.enable_private();
        arena.write(&"secret".into(), Value::Int(1)).unwrap();
        // visible from inside the owning scope
        assert!(arena.get(&"secret".into()).is_ok());
        arena.leave();
        let err = arena.get(&"ns.secret".into()).unwrap_err();
        assert!(matches!(err, CompileError::HiddenName { .. }));
    }

    #[test]
    fn test_write_rebinds_in_ancestor() {
        let mut arena = ScopeArena::new();
        arena.enter_named_space("ns", false);
        arena.write(&"v".into(), Value::Int(1)).unwrap();
        arena.enter_local_space(false);
        // dotted write resolves in the enclosing chain
        arena.write(&"ns.v".into(), Value::Int(2)).unwrap();
        match arena.get(&"ns.v".into()).unwrap() {
            Resolved::Value(Value::Int(2)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reenter_same_space() {
        let mut arena = ScopeArena::new();
        let id = arena.enter_local_space(true);
        arena.write(&"local".into(), Value::Int(3)).unwrap();
        arena.leave();
        arena.reenter(id);
        assert!(arena.get(&"local".into()).is_ok());
    }
}
