//! Type system helpers for working with Go types from bridge data.
//!
//! The bridge resolves every identifier's object type and ships a per-file
//! table of `TypeRef`s. `TypeTable` answers the three questions the analysis
//! asks of a type checker through the `TypeOracle` trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Ident, Pos, SourceFile};

/// Type reference with unique ID (unique within one file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: u32,
    pub kind: TypeKind,
    pub name: String,
    /// Element type for pointers, slices, arrays and channels.
    #[serde(default)]
    pub elem: u32,
    /// Parameter types for signatures.
    #[serde(default)]
    pub params: Vec<u32>,
    /// Result types for signatures.
    #[serde(default)]
    pub results: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TypeKind {
    Basic,
    Named,
    Pointer,
    Slice,
    Array,
    Map,
    Chan,
    Struct,
    Interface,
    Signature,
    Tuple,
    #[serde(other)]
    Unknown,
}

/// Whether dereferencing through a value can nil-fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Pointer,
    Value,
}

/// Coarse shape of a type as seen by the nil-chain analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// `*T`
    Pointer,
    /// `[]*T`
    PointerSlice,
    /// Anything else, including unresolved types.
    Value,
}

impl Shape {
    pub fn kind(self) -> Kind {
        match self {
            Shape::Pointer => Kind::Pointer,
            Shape::PointerSlice | Shape::Value => Kind::Value,
        }
    }
}

/// A function signature reduced to parameter and result shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Shape>,
    pub results: Vec<Shape>,
}

impl Signature {
    /// The result shape when the function returns exactly one value.
    pub fn single_result(&self) -> Option<Shape> {
        match self.results.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// File-qualified source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Type-resolution oracle supplied alongside each syntax tree.
///
/// Unknown identifiers must answer `Kind::Value` / `Shape::Value` / `None`
/// so that the analysis stays silent rather than guessing.
pub trait TypeOracle {
    /// Shape of the identifier's object type.
    fn shape_of(&self, ident: &Ident) -> Shape;

    /// Shape of a type expression (used for parameter groups).
    fn shape_of_type(&self, type_id: u32) -> Shape;

    /// Signature of the identifier's object if it is a function or method.
    fn signature_of(&self, ident: &Ident) -> Option<Signature>;

    /// File-qualified position of a node.
    fn position_of(&self, pos: Pos) -> Position;

    fn kind_of(&self, ident: &Ident) -> Kind {
        self.shape_of(ident).kind()
    }
}

/// Type lookup table for one source file.
pub struct TypeTable {
    file: String,
    types: HashMap<u32, TypeRef>,
}

impl TypeTable {
    pub fn from_file(file: &SourceFile) -> Self {
        Self::new(file.path.clone(), file.types.iter().cloned())
    }

    pub fn new(file: impl Into<String>, types: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            file: file.into(),
            types: types.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&TypeRef> {
        self.types.get(&id)
    }

    pub fn is_pointer(&self, id: u32) -> bool {
        self.get(id).is_some_and(|t| t.kind == TypeKind::Pointer)
    }

    /// `[]*T`. Named slice types are not looked through.
    pub fn is_pointer_slice(&self, id: u32) -> bool {
        self.get(id)
            .is_some_and(|t| t.kind == TypeKind::Slice && self.is_pointer(t.elem))
    }

    fn shape(&self, id: u32) -> Shape {
        if self.is_pointer(id) {
            Shape::Pointer
        } else if self.is_pointer_slice(id) {
            Shape::PointerSlice
        } else {
            Shape::Value
        }
    }
}

impl TypeOracle for TypeTable {
    fn shape_of(&self, ident: &Ident) -> Shape {
        self.shape(ident.type_id)
    }

    fn shape_of_type(&self, type_id: u32) -> Shape {
        self.shape(type_id)
    }

    fn signature_of(&self, ident: &Ident) -> Option<Signature> {
        let sig = self.get(ident.type_id)?;
        if sig.kind != TypeKind::Signature {
            return None;
        }
        Some(Signature {
            params: sig.params.iter().map(|&id| self.shape(id)).collect(),
            results: sig.results.iter().map(|&id| self.shape(id)).collect(),
        })
    }

    fn position_of(&self, pos: Pos) -> Position {
        Position {
            file: self.file.clone(),
            line: pos.line,
            column: pos.column,
        }
    }
}
