//! Helpers for building typed syntax trees in tests.
//!
//! Positions are passed explicitly so that a test reads like the Go snippet
//! it models: `sel(id("p", user_ptr, 3, 14), "Name", string, 3, 16)` is
//! `p.Name` on line 3.

use crate::ast::*;
use crate::types::{TypeKind, TypeRef, TypeTable};

/// Accumulates a file's type table.
pub struct FixtureBuilder {
    path: String,
    types: Vec<TypeRef>,
}

impl FixtureBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            types: Vec::new(),
        }
    }

    fn push(&mut self, kind: TypeKind, name: String, elem: u32, results: Vec<u32>) -> u32 {
        let id = self.types.len() as u32 + 1;
        self.types.push(TypeRef {
            id,
            kind,
            name,
            elem,
            params: vec![],
            results,
        });
        id
    }

    /// A non-pointer named or basic type.
    pub fn value(&mut self, name: &str) -> u32 {
        self.push(TypeKind::Named, name.into(), 0, vec![])
    }

    /// `*name`
    pub fn pointer(&mut self, name: &str) -> u32 {
        let elem = self.value(name);
        self.push(TypeKind::Pointer, format!("*{name}"), elem, vec![])
    }

    /// `[]*name`
    pub fn pointer_slice(&mut self, name: &str) -> u32 {
        let elem = self.pointer(name);
        self.push(TypeKind::Slice, format!("[]*{name}"), elem, vec![])
    }

    /// A function type with the given result types.
    pub fn func(&mut self, results: &[u32]) -> u32 {
        self.push(TypeKind::Signature, "func".into(), 0, results.to_vec())
    }

    pub fn table(&self) -> TypeTable {
        TypeTable::new(self.path.clone(), self.types.iter().cloned())
    }

    pub fn finish(self, functions: Vec<FuncDecl>) -> SourceFile {
        SourceFile {
            path: self.path,
            package: "a".into(),
            is_generated: false,
            is_test: false,
            types: self.types,
            functions,
        }
    }
}

pub fn ident(name: &str, type_id: u32, line: u32, column: u32) -> Ident {
    Ident {
        name: name.into(),
        pos: Pos::new(line, column),
        type_id,
    }
}

pub fn id(name: &str, type_id: u32, line: u32, column: u32) -> Expr {
    Expr::Ident(ident(name, type_id, line, column))
}

pub fn nil(line: u32, column: u32) -> Expr {
    id("nil", 0, line, column)
}

pub fn sel(x: Expr, name: &str, type_id: u32, line: u32, column: u32) -> Expr {
    Expr::Selector(SelectorExpr {
        x: Box::new(x),
        sel: ident(name, type_id, line, column),
    })
}

pub fn call(fun: Expr, args: Vec<Expr>, line: u32, column: u32) -> Expr {
    Expr::Call(CallExpr {
        fun: Box::new(fun),
        args,
        rparen: Pos::new(line, column),
    })
}

pub fn lit(value: &str, line: u32, column: u32) -> Expr {
    Expr::Lit(BasicLit {
        pos: Pos::new(line, column),
        value: value.into(),
    })
}

pub fn binary(x: Expr, op: BinOp, y: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        x: Box::new(x),
        op,
        y: Box::new(y),
    })
}

pub fn neq_nil(x: Expr, line: u32, column: u32) -> Expr {
    binary(x, BinOp::Neq, nil(line, column))
}

pub fn eq_nil(x: Expr, line: u32, column: u32) -> Expr {
    binary(x, BinOp::Eql, nil(line, column))
}

pub fn and(x: Expr, y: Expr) -> Expr {
    binary(x, BinOp::LAnd, y)
}

pub fn expr_stmt(x: Expr) -> Stmt {
    Stmt::Expr(ExprStmt { x })
}

/// `lhs... := rhs...`
pub fn define(lhs: Vec<Ident>, rhs: Vec<Expr>) -> Stmt {
    Stmt::Assign(AssignStmt {
        lhs: lhs.into_iter().map(Expr::Ident).collect(),
        tok: AssignTok::Define,
        rhs,
    })
}

/// `lhs... = rhs...`
pub fn assign(lhs: Vec<Expr>, rhs: Vec<Expr>) -> Stmt {
    Stmt::Assign(AssignStmt {
        lhs,
        tok: AssignTok::Assign,
        rhs,
    })
}

pub fn if_stmt(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::If(IfStmt {
        init: None,
        cond,
        body: Block { stmts: body },
        els: None,
    })
}

pub fn if_init(init: Stmt, cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::If(IfStmt {
        init: Some(Box::new(init)),
        cond,
        body: Block { stmts: body },
        els: None,
    })
}

pub fn if_else(cond: Expr, body: Vec<Stmt>, els: Vec<Stmt>) -> Stmt {
    Stmt::If(IfStmt {
        init: None,
        cond,
        body: Block { stmts: body },
        els: Some(Box::new(ElseBranch::Block(Block { stmts: els }))),
    })
}

/// `for _, value := range x { body }`
pub fn range(value: Ident, x: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::Range(RangeStmt {
        key: Some(id("_", 0, value.pos.line, value.pos.column.saturating_sub(3))),
        value: Some(Expr::Ident(value)),
        x,
        body: Block { stmts: body },
    })
}

/// `for cond { body }`
pub fn for_loop(cond: Option<Expr>, body: Vec<Stmt>) -> Stmt {
    Stmt::For(ForStmt {
        init: None,
        cond,
        post: None,
        body: Block { stmts: body },
    })
}

/// `switch tag { case ...: body }`, one entry per clause.
pub fn switch(tag: Option<Expr>, clauses: Vec<Vec<Stmt>>) -> Stmt {
    Stmt::Switch(SwitchStmt {
        init: None,
        tag,
        clauses: clauses
            .into_iter()
            .map(|body| CaseClause { list: vec![], body })
            .collect(),
    })
}

pub fn param(name: &str, type_id: u32, line: u32, column: u32) -> Field {
    Field {
        names: vec![ident(name, type_id, line, column)],
        type_id,
    }
}

pub fn func(name: &str, params: Vec<Field>, body: Vec<Stmt>) -> FuncDecl {
    FuncDecl {
        name: ident(name, 0, 1, 6),
        recv: None,
        params,
        body: Some(Block { stmts: body }),
    }
}

pub fn method(name: &str, recv: Field, params: Vec<Field>, body: Vec<Stmt>) -> FuncDecl {
    FuncDecl {
        recv: Some(recv),
        ..func(name, params, body)
    }
}
