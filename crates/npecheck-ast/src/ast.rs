//! Typed syntax tree for Go function bodies.
//!
//! These types mirror the JSON emitted by the Go bridge: one `SourceFile`
//! per analyzed file, each carrying its own type table and the function
//! declarations found in it. Only the statement and expression shapes the
//! nil-chain analysis looks at are modelled; everything else deserializes
//! to an `Unsupported` node and is skipped.

use serde::{Deserialize, Serialize};

/// Root type - complete analysis input from the Go bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub go_version: String,
    #[serde(default)]
    pub bridge_version: String,
}

impl AnalysisInput {
    /// Parse bridge JSON.
    pub fn from_json(data: &str) -> Result<Self, crate::LoadError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Total number of function declarations across all files.
    pub fn function_count(&self) -> usize {
        self.files.iter().map(|f| f.functions.len()).sum()
    }
}

/// One Go source file with its resolved types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub types: Vec<crate::types::TypeRef>,
    #[serde(default)]
    pub functions: Vec<FuncDecl>,
}

/// Source position (1-based line and column, matching `token.Position`).
///
/// Ordering is lexicographic on `(line, column)`, which is the only notion
/// of "before" the analysis uses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier together with the type the checker resolved for its object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Pos,
    /// Index into the file's type table; 0 means unresolved.
    #[serde(default)]
    pub type_id: u32,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    pub fn is_nil(&self) -> bool {
        self.name == "nil"
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    /// Method receiver. Never seeded as tracked.
    #[serde(default)]
    pub recv: Option<Field>,
    #[serde(default)]
    pub params: Vec<Field>,
    /// `None` for external (assembly / linkname) declarations.
    #[serde(default)]
    pub body: Option<Block>,
}

/// A parameter group: `a, b *T` has two names sharing one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub names: Vec<Ident>,
    #[serde(default)]
    pub type_id: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr(ExprStmt),
    Assign(AssignStmt),
    If(IfStmt),
    Range(RangeStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExprStmt {
    pub x: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignTok {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = ":=")]
    Define,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub tok: AssignTok,
    pub rhs: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    #[serde(default)]
    pub body: Block,
    /// `else` branch: either a nested `If` or a block wrapped in `Else`.
    #[serde(default)]
    pub els: Option<Box<ElseBranch>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum ElseBranch {
    If(IfStmt),
    Block(Block),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeStmt {
    #[serde(default)]
    pub key: Option<Expr>,
    #[serde(default)]
    pub value: Option<Expr>,
    pub x: Expr,
    #[serde(default)]
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    #[serde(default)]
    pub cond: Option<Expr>,
    #[serde(default)]
    pub post: Option<Box<Stmt>>,
    #[serde(default)]
    pub body: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStmt {
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    #[serde(default)]
    pub tag: Option<Expr>,
    #[serde(default)]
    pub clauses: Vec<CaseClause>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseClause {
    /// Empty for `default:`.
    #[serde(default)]
    pub list: Vec<Expr>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Ident(Ident),
    Selector(SelectorExpr),
    Call(CallExpr),
    Binary(BinaryExpr),
    /// A literal of any kind; opaque to the analysis.
    Lit(BasicLit),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorExpr {
    pub x: Box<Expr>,
    pub sel: Ident,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    #[serde(default)]
    pub args: Vec<Expr>,
    pub rparen: Pos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub x: Box<Expr>,
    pub op: BinOp,
    pub y: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicLit {
    pub pos: Pos,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "==")]
    Eql,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "&&")]
    LAnd,
    #[serde(rename = "||")]
    LOr,
    #[serde(rename = "<")]
    Lss,
    #[serde(rename = ">")]
    Gtr,
    #[serde(rename = "<=")]
    Leq,
    #[serde(rename = ">=")]
    Geq,
    #[serde(other)]
    Other,
}

impl BinOp {
    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eql | BinOp::Neq)
    }
}

impl BinaryExpr {
    /// The non-nil operand of `x == nil` / `x != nil` (either side), if this
    /// is such a comparison.
    pub fn nil_compared_operand(&self) -> Option<&Expr> {
        if !self.op.is_equality() {
            return None;
        }
        match (self.x.as_ref(), self.y.as_ref()) {
            (other, Expr::Ident(id)) if id.is_nil() => Some(other),
            (Expr::Ident(id), other) if id.is_nil() => Some(other),
            _ => None,
        }
    }
}

impl Expr {
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(id) => Some(id),
            _ => None,
        }
    }

    /// Starting position of the expression, when it has one.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            Expr::Ident(id) => Some(id.pos),
            Expr::Selector(s) => s.x.pos(),
            Expr::Call(c) => c.fun.pos(),
            Expr::Binary(b) => b.x.pos(),
            Expr::Lit(l) => Some(l.pos),
            Expr::Unsupported => None,
        }
    }

    /// Leaf operands of a boolean / comparison tree, left to right.
    ///
    /// `a != nil && a.B > 0` yields `a`, `nil`, `a.B`, `0`.
    pub fn binary_operands(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        collect_operands(self, &mut out);
        out
    }

    /// All `x == nil` / `x != nil` comparisons inside a condition tree.
    pub fn nil_comparisons(&self) -> Vec<&BinaryExpr> {
        let mut out = Vec::new();
        collect_nil_comparisons(self, &mut out);
        out
    }
}

fn collect_operands<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Binary(b) => {
            collect_operands(&b.x, out);
            collect_operands(&b.y, out);
        }
        other => out.push(other),
    }
}

fn collect_nil_comparisons<'a>(expr: &'a Expr, out: &mut Vec<&'a BinaryExpr>) {
    if let Expr::Binary(b) = expr {
        if b.nil_compared_operand().is_some() {
            out.push(b);
        } else {
            collect_nil_comparisons(&b.x, out);
            collect_nil_comparisons(&b.y, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, line: u32, col: u32) -> Expr {
        Expr::Ident(Ident {
            name: name.into(),
            pos: Pos::new(line, col),
            type_id: 0,
        })
    }

    fn binary(x: Expr, op: BinOp, y: Expr) -> Expr {
        Expr::Binary(BinaryExpr {
            x: Box::new(x),
            op,
            y: Box::new(y),
        })
    }

    #[test]
    fn test_pos_ordering() {
        assert!(Pos::new(3, 9) < Pos::new(4, 1));
        assert!(Pos::new(4, 1) < Pos::new(4, 2));
        assert_eq!(Pos::new(2, 2), Pos::new(2, 2));
    }

    #[test]
    fn test_nil_compared_operand_either_side() {
        let Expr::Binary(lhs_nil) = binary(ident("nil", 1, 4), BinOp::Neq, ident("p", 1, 11))
        else {
            unreachable!()
        };
        assert_eq!(
            lhs_nil.nil_compared_operand().and_then(Expr::as_ident).map(|i| i.name.as_str()),
            Some("p")
        );

        let Expr::Binary(not_nil) = binary(ident("p", 1, 4), BinOp::Gtr, ident("nil", 1, 8)) else {
            unreachable!()
        };
        assert!(not_nil.nil_compared_operand().is_none());
    }

    #[test]
    fn test_nil_comparisons_in_and_chain() {
        let cond = binary(
            binary(ident("a", 1, 4), BinOp::Neq, ident("nil", 1, 9)),
            BinOp::LAnd,
            binary(ident("b", 1, 16), BinOp::Eql, ident("nil", 1, 21)),
        );
        let found = cond.nil_comparisons();
        assert_eq!(found.len(), 2);
        assert_eq!(cond.binary_operands().len(), 4);
    }

    #[test]
    fn test_deserialize_unknown_nodes_are_unsupported() {
        let json = r#"{"stmt": "go", "call": {}}"#;
        let stmt: Stmt = serde_json::from_str(json).unwrap();
        assert!(matches!(stmt, Stmt::Unsupported));

        let json = r#"{"expr": "index"}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert!(matches!(expr, Expr::Unsupported));
    }

    #[test]
    fn test_deserialize_selector_call() {
        let json = r#"{
            "expr": "call",
            "fun": {
                "expr": "selector",
                "x": {"expr": "ident", "name": "p", "pos": {"line": 3, "column": 2}, "type_id": 2},
                "sel": {"name": "Get", "pos": {"line": 3, "column": 4}, "type_id": 5}
            },
            "args": [],
            "rparen": {"line": 3, "column": 8}
        }"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.rparen, Pos::new(3, 8));
        assert_eq!(call.fun.pos(), Some(Pos::new(3, 2)));
    }

    #[test]
    fn test_deserialize_assign_tok() {
        let json = r#"{"stmt": "assign", "lhs": [], "tok": ":=", "rhs": []}"#;
        let Stmt::Assign(assign) = serde_json::from_str(json).unwrap() else {
            panic!("expected assign");
        };
        assert_eq!(assign.tok, AssignTok::Define);
    }
}
