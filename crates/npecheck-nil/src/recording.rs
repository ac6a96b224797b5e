//! Recording pass: one forward walk of a function body that seeds the
//! check registry and applies nil-comparison guards.
//!
//! Statements are visited in source order, outer before inner, so every
//! slot list ends up ascending by position without sorting.

use npecheck_ast::ast::*;
use npecheck_ast::types::{Shape, TypeOracle};

use crate::chain::{Chain, LinkKind, Path};
use crate::detection::unguarded_links;
use crate::registry::{CheckRegistry, CheckedPosition};

pub struct Recorder<'a> {
    oracle: &'a dyn TypeOracle,
    registry: CheckRegistry,
}

impl<'a> Recorder<'a> {
    pub fn new(oracle: &'a dyn TypeOracle) -> Self {
        Self {
            oracle,
            registry: CheckRegistry::new(),
        }
    }

    /// Run the pass over one function and hand back the populated registry.
    pub fn record_function(mut self, func: &FuncDecl) -> CheckRegistry {
        self.seed_params(&func.params);
        if let Some(body) = &func.body {
            self.record_block(&body.stmts);
        }
        self.registry
    }

    /// Pointer parameters start unguarded at their declaration; `[]*T`
    /// parameters are trusted element-wise. The receiver is not a parameter.
    fn seed_params(&mut self, params: &[Field]) {
        for field in params {
            let shape = self.oracle.shape_of_type(field.type_id);
            for name in field.names.iter().filter(|n| !n.is_blank()) {
                match shape {
                    Shape::Pointer => self
                        .registry
                        .seed(Path::root(&name.name), CheckedPosition::unguarded(name.pos)),
                    Shape::PointerSlice => self
                        .registry
                        .seed(Path::root(&name.name), CheckedPosition::slice_elem(name.pos)),
                    Shape::Value => {}
                }
            }
        }
    }

    fn record_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.record_stmt(stmt);
        }
    }

    fn record_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If(s) => self.record_if(s),
            Stmt::Assign(s) => self.record_assign(s),
            Stmt::Range(s) => self.record_range(s),
            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.record_stmt(init);
                }
                if let Some(cond) = &s.cond {
                    self.record_condition(cond);
                }
                if let Some(post) = &s.post {
                    self.record_stmt(post);
                }
                self.record_block(&s.body.stmts);
            }
            Stmt::Switch(s) => {
                if let Some(init) = &s.init {
                    self.record_stmt(init);
                }
                for clause in &s.clauses {
                    self.record_block(&clause.body);
                }
            }
            Stmt::Expr(_) | Stmt::Unsupported => {}
        }
    }

    fn record_if(&mut self, s: &IfStmt) {
        if let Some(init) = &s.init {
            self.record_stmt(init);
        }
        self.record_condition(&s.cond);
        self.record_block(&s.body.stmts);
        match s.els.as_deref() {
            Some(ElseBranch::If(elif)) => self.record_if(elif),
            Some(ElseBranch::Block(block)) => self.record_block(&block.stmts),
            None => {}
        }
    }

    /// Apply every `x == nil` / `x != nil` found in a condition tree.
    fn record_condition(&mut self, cond: &Expr) {
        for cmp in cond.nil_comparisons() {
            let Some(operand) = cmp.nil_compared_operand() else {
                continue;
            };
            let Some(chain) = Chain::decompose(operand, self.oracle) else {
                continue;
            };
            if !self.registry.is_tracked_root(&chain.root().name) {
                continue;
            }
            let at = chain.root_pos();
            if chain.len() == 1 {
                self.registry.mark_guarded(&chain.path(), at);
                continue;
            }
            // A chain comparison only counts when every link it passes
            // through is already safe to dereference at this point.
            if !unguarded_links(&chain, &self.registry).is_empty() {
                continue;
            }
            let slot = match chain.leaf().kind {
                LinkKind::Pointer => CheckedPosition::guarded(at),
                LinkKind::NonPointer => CheckedPosition::parent_pointer_leaf(),
            };
            self.registry.guard_chain(chain.path(), slot, at);
        }
    }

    fn record_assign(&mut self, s: &AssignStmt) {
        let targets: Vec<Option<&Ident>> = s.lhs.iter().map(Expr::as_ident).collect();
        match s.rhs.as_slice() {
            [single] => self.propagate(&targets, single),
            rhs if rhs.len() == targets.len() => {
                for (target, value) in targets.iter().zip(rhs) {
                    self.propagate(std::slice::from_ref(target), value);
                }
            }
            _ => {}
        }
    }

    fn propagate(&mut self, targets: &[Option<&Ident>], value: &Expr) {
        match value {
            Expr::Selector(_) => {
                if let [Some(dst)] = targets {
                    self.propagate_chain(dst, value);
                }
            }
            Expr::Call(call) => self.propagate_call(targets, call),
            _ => {}
        }
    }

    /// `dst := root.A.B` with a tracked root and a pointer leaf: `dst` gets
    /// a fresh unguarded slot and shares its list with `root.A.B`.
    fn propagate_chain(&mut self, dst: &Ident, value: &Expr) {
        if dst.is_blank() {
            return;
        }
        let Some(chain) = Chain::decompose(value, self.oracle) else {
            return;
        };
        if chain.leaf().kind != LinkKind::Pointer
            || !self.registry.is_tracked_root(&chain.root().name)
        {
            return;
        }
        let derived = Path::root(&dst.name);
        self.registry
            .seed(derived.clone(), CheckedPosition::unguarded(chain.leaf().pos));
        self.registry.alias(derived, chain.path());
    }

    /// `a, b := f(...)`: each target takes the shape of its result, stamped
    /// at the call's closing parenthesis.
    fn propagate_call(&mut self, targets: &[Option<&Ident>], call: &CallExpr) {
        let Some(sig) = callee_ident(call).and_then(|f| self.oracle.signature_of(f)) else {
            return;
        };
        if targets.is_empty() || sig.results.len() != targets.len() {
            return;
        }
        for (target, shape) in targets.iter().zip(&sig.results) {
            let Some(dst) = (*target).filter(|t| !t.is_blank()) else {
                continue;
            };
            let slot = match shape {
                Shape::Pointer => CheckedPosition::unguarded(call.rparen),
                Shape::PointerSlice => CheckedPosition::slice_elem(call.rparen),
                Shape::Value => continue,
            };
            self.registry.seed(Path::root(&dst.name), slot);
        }
    }

    fn record_range(&mut self, s: &RangeStmt) {
        if let Some(value) = s.value.as_ref().and_then(Expr::as_ident) {
            if !value.is_blank() && self.ranges_over_pointers(&s.x) {
                self.registry
                    .seed(Path::root(&value.name), CheckedPosition::unguarded(value.pos));
            }
        }
        self.record_block(&s.body.stmts);
    }

    /// Whether the range source yields possibly-nil pointer elements the
    /// function should be checking.
    fn ranges_over_pointers(&self, x: &Expr) -> bool {
        match x {
            Expr::Ident(id) => self.registry.is_tracked_root(&id.name),
            Expr::Selector(sel) => {
                self.oracle.shape_of(&sel.sel) == Shape::PointerSlice
                    && Chain::decompose(x, self.oracle)
                        .is_some_and(|c| self.registry.is_tracked_root(&c.root().name))
            }
            Expr::Call(call) => callee_ident(call)
                .and_then(|f| self.oracle.signature_of(f))
                .and_then(|sig| sig.single_result())
                == Some(Shape::PointerSlice),
            _ => false,
        }
    }
}

/// The identifier naming the called function: `f` in `f()`, `M` in `x.M()`.
pub(crate) fn callee_ident(call: &CallExpr) -> Option<&Ident> {
    match call.fun.as_ref() {
        Expr::Ident(id) => Some(id),
        Expr::Selector(sel) => Some(&sel.sel),
        _ => None,
    }
}
