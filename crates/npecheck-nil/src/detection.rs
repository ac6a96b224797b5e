//! Detection pass: a read-only walk that checks every access chain against
//! the registry built by the recording pass.

use npecheck_ast::ast::*;
use npecheck_ast::types::TypeOracle;
use npecheck_diagnostics::diagnostic::Diagnostic;

use crate::chain::{Chain, LinkKind};
use crate::registry::CheckRegistry;
use crate::rules;

/// Indices of the links of `chain` that are dereferenced without a covering
/// guard, innermost first.
///
/// The chain is peeled from the leaf: a prefix whose second-to-last link is
/// not a pointer cannot nil-fault there and is skipped. Otherwise the
/// prefix minus its leaf is looked up and the nearest slot strictly before
/// the chain's root position decides. A missing slot is only reported when
/// the root itself is tracked.
pub fn unguarded_links(chain: &Chain, registry: &CheckRegistry) -> Vec<usize> {
    let links = chain.links();
    let at = chain.root_pos();
    let root_tracked = registry.is_tracked_root(&chain.root().name);

    let mut out = Vec::new();
    for len in (2..=links.len()).rev() {
        let deref = len - 2;
        if links[deref].kind == LinkKind::NonPointer {
            continue;
        }
        let guarded = match registry.nearest_before(&chain.prefix_path(len - 1), at) {
            Some(slot) => slot.guarded,
            None => !root_tracked,
        };
        if !guarded {
            out.push(deref);
        }
    }
    out
}

pub struct Detector<'a> {
    oracle: &'a dyn TypeOracle,
    registry: &'a CheckRegistry,
    function: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Detector<'a> {
    pub fn new(oracle: &'a dyn TypeOracle, registry: &'a CheckRegistry, function: &'a str) -> Self {
        Self {
            oracle,
            registry,
            function,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics for one function body, in traversal order.
    pub fn detect_function(mut self, func: &FuncDecl) -> Vec<Diagnostic> {
        if let Some(body) = &func.body {
            self.detect_block(&body.stmts);
        }
        self.diagnostics
    }

    fn detect_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.detect_stmt(stmt);
        }
    }

    fn detect_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(s) => self.check_access(&s.x),
            Stmt::Assign(s) => {
                for value in &s.rhs {
                    self.check_access(value);
                }
            }
            Stmt::If(s) => self.detect_if(s),
            Stmt::Range(s) => {
                self.check_access(&s.x);
                self.detect_block(&s.body.stmts);
            }
            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.detect_stmt(init);
                }
                if let Some(cond) = &s.cond {
                    self.check_access(cond);
                }
                if let Some(post) = &s.post {
                    self.detect_stmt(post);
                }
                self.detect_block(&s.body.stmts);
            }
            Stmt::Switch(s) => {
                if let Some(init) = &s.init {
                    self.detect_stmt(init);
                }
                if let Some(tag) = &s.tag {
                    self.check_access(tag);
                }
                for clause in &s.clauses {
                    for value in &clause.list {
                        self.check_access(value);
                    }
                    self.detect_block(&clause.body);
                }
            }
            Stmt::Unsupported => {}
        }
    }

    fn detect_if(&mut self, s: &IfStmt) {
        if let Some(init) = &s.init {
            self.detect_stmt(init);
        }
        self.check_access(&s.cond);
        self.detect_block(&s.body.stmts);
        match s.els.as_deref() {
            Some(ElseBranch::If(elif)) => self.detect_if(elif),
            Some(ElseBranch::Block(block)) => self.detect_block(&block.stmts),
            None => {}
        }
    }

    /// Check the chain an expression denotes, then the chains in any call
    /// arguments along it. Comparison and boolean operands are checked one
    /// by one.
    fn check_access(&mut self, expr: &Expr) {
        if let Expr::Binary(b) = expr {
            self.check_access(&b.x);
            self.check_access(&b.y);
            return;
        }
        if let Some(chain) = Chain::decompose(expr, self.oracle) {
            self.check_chain(&chain);
        }
        let mut cur = expr;
        loop {
            match cur {
                Expr::Selector(sel) => cur = sel.x.as_ref(),
                Expr::Call(call) => {
                    for arg in &call.args {
                        self.check_access(arg);
                    }
                    cur = call.fun.as_ref();
                }
                _ => break,
            }
        }
    }

    fn check_chain(&mut self, chain: &Chain) {
        for deref in unguarded_links(chain, self.registry) {
            let link = &chain.links()[deref];
            let at = self.oracle.position_of(link.pos);
            let nilable = chain.prefix_path(deref + 1).to_string();
            let accessed = &chain.links()[deref + 1].name;
            tracing::debug!(function = self.function, chain = %chain, link = %link.name, "unguarded dereference");
            self.diagnostics
                .push(rules::build_npe001(&at, self.function, &nilable, accessed));
        }
    }
}
