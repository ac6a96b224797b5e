//! npecheck AST - typed syntax trees for Go nil-chain analysis.
//!
//! The syntax tree and type information are produced by the Go bridge
//! (`go/parser` + `go/types`) and deserialized here. This crate provides:
//! - The serde data model matching the bridge JSON
//! - The `TypeOracle` contract and its default `TypeTable` implementation
//! - Fixture builders for tests

pub mod ast;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixture;
pub mod types;

use std::path::{Path, PathBuf};

/// Errors from loading bridge output.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid bridge JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a bridge JSON file into the owned AST.
pub fn load_json_file(path: &Path) -> Result<ast::AnalysisInput, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ast::AnalysisInput::from_json(&data)
}

/// Load a bridge fixture file from `tests/fixtures/` by name.
#[cfg(any(test, feature = "test-fixtures"))]
pub fn load_bridge_fixture(name: &str) -> ast::AnalysisInput {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let fixture_path = manifest_dir
        .join("../../tests/fixtures")
        .join(format!("{name}.json"));
    load_json_file(&fixture_path).unwrap_or_else(|e| panic!("failed to load fixture {name}: {e}"))
}
