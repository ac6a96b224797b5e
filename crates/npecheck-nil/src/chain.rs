//! Access-chain decomposition.
//!
//! `o.GetUser(ctx).Profile.Name` becomes the root-first chain
//! `[o, GetUser, Profile, Name]`. Call arguments never join the chain; they
//! are decomposed separately by the caller.

use npecheck_ast::ast::{Expr, Ident, Pos};
use npecheck_ast::types::{Kind, Shape, TypeOracle};

/// Whether a dereference *through* a link can nil-fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Pointer,
    NonPointer,
}

/// One segment of an access chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub kind: LinkKind,
    /// The segment is a call whose signature returns exactly one pointer.
    pub returns_single_pointer: bool,
    /// Position of the segment's identifier.
    pub pos: Pos,
}

impl Link {
    /// Classify an identifier. A call segment takes the kind of its single
    /// result; functions with zero or several results are `NonPointer`.
    pub fn classify(ident: &Ident, oracle: &dyn TypeOracle) -> Self {
        let (kind, returns_single_pointer) = match oracle.signature_of(ident) {
            Some(sig) => match sig.single_result() {
                Some(Shape::Pointer) => (LinkKind::Pointer, true),
                _ => (LinkKind::NonPointer, false),
            },
            None => match oracle.kind_of(ident) {
                Kind::Pointer => (LinkKind::Pointer, false),
                Kind::Value => (LinkKind::NonPointer, false),
            },
        };
        Self {
            name: ident.name.clone(),
            kind,
            returns_single_pointer,
            pos: ident.pos,
        }
    }
}

/// Structural registry key: the ordered segment names of a chain prefix.
///
/// Two keys are equal only if every segment is equal, so an identifier that
/// happens to contain a `.` can never collide with a real two-segment path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn root_name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A root-first sequence of links. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    links: Vec<Link>,
}

impl Chain {
    /// Decompose an identifier, a dotted access, or a call on a dotted access.
    ///
    /// Returns `None` when the walk toward the root reaches anything other
    /// than an identifier (index expressions, literals, calls of calls).
    pub fn decompose(expr: &Expr, oracle: &dyn TypeOracle) -> Option<Self> {
        let mut reversed = Vec::new();
        let mut cur = expr;
        loop {
            match cur {
                Expr::Ident(ident) => {
                    reversed.push(Link::classify(ident, oracle));
                    break;
                }
                Expr::Selector(sel) => {
                    reversed.push(Link::classify(&sel.sel, oracle));
                    cur = sel.x.as_ref();
                }
                Expr::Call(call) => match call.fun.as_ref() {
                    fun @ (Expr::Selector(_) | Expr::Ident(_)) => cur = fun,
                    _ => return None,
                },
                _ => return None,
            }
        }
        reversed.reverse();
        Some(Self { links: reversed })
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn root(&self) -> &Link {
        &self.links[0]
    }

    pub fn leaf(&self) -> &Link {
        &self.links[self.links.len() - 1]
    }

    /// The position accesses through this chain are evaluated at.
    pub fn root_pos(&self) -> Pos {
        self.root().pos
    }

    /// Key of the whole chain.
    pub fn path(&self) -> Path {
        self.prefix_path(self.links.len())
    }

    /// Key of the first `len` links.
    pub fn prefix_path(&self, len: usize) -> Path {
        Path::from_segments(self.links[..len].iter().map(|l| l.name.as_str()))
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}
