//! Jupyter notebook (.ipynb) model.
//!
//! A [`Notebook`] keeps the document exactly as it was loaded and exposes
//! typed, read-only [`Cell`] views over it. Serializing a notebook writes the
//! original document back, so metadata and unknown keys survive re-execution.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// A loaded notebook document.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    /// Typed views of `raw["cells"]`
    cells: Vec<Cell>,

    /// The document as loaded
    raw: Value,
}

/// Cell kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
    /// Any cell type this tool does not know about.
    #[serde(other)]
    Other,
}

/// A read-only view of one notebook cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    /// Cell type
    pub cell_type: CellType,

    /// Execution count, `None` if the cell never ran
    #[serde(default)]
    pub execution_count: Option<u64>,

    /// Cell source (lines)
    #[serde(default, deserialize_with = "source_lines")]
    pub source: Vec<String>,

    /// Cell outputs, compared structurally and never interpreted
    #[serde(default)]
    pub outputs: Vec<Value>,
}

/// A verification directive placed as a comment on a cell's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `# no-run` on the first code cell: skip output comparison for the notebook.
    NoRun,
    /// `# no-check-output`: skip output comparison for this cell.
    NoCheckOutput,
}

impl Directive {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRun => "no-run",
            Self::NoCheckOutput => "no-check-output",
        }
    }

    /// Match an already trimmed, lower-cased comment.
    pub fn from_comment(comment: &str) -> Option<Self> {
        [Self::NoRun, Self::NoCheckOutput]
            .into_iter()
            .find(|directive| directive.as_str() == comment)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct Document {
    cells: Vec<Cell>,
}

/// nbformat allows source as a list of lines or as one string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Source {
    Lines(Vec<String>),
    Text(String),
}

fn source_lines<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Source::deserialize(deserializer)? {
        Source::Lines(lines) => lines,
        Source::Text(text) => text.split_inclusive('\n').map(str::to_string).collect(),
    })
}

impl Notebook {
    /// Build a notebook from an already parsed JSON document.
    pub fn from_value(raw: Value) -> Result<Self> {
        let document =
            Document::deserialize(&raw).map_err(|e| Error::InvalidNotebook(e.to_string()))?;
        Ok(Self {
            cells: document.cells,
            raw,
        })
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        content.parse().map_err(|e| match e {
            Error::InvalidNotebook(message) => {
                Error::InvalidNotebook(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// All cells in document order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Code cells in document order.
    pub fn code_cells(&self) -> Vec<&Cell> {
        self.cells.iter().filter(|cell| cell.is_code()).collect()
    }

    /// Notebook-level metadata (kernel, language info), if any.
    pub fn metadata(&self) -> Option<&Value> {
        self.raw.get("metadata")
    }

    /// The document as loaded.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

impl FromStr for Notebook {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(s).map_err(|e| Error::InvalidNotebook(e.to_string()))?;
        Self::from_value(raw)
    }
}

impl Serialize for Notebook {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Notebook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::from_value(raw).map_err(serde::de::Error::custom)
    }
}

impl Cell {
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// A cell with no source lines has nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The comment on the first source line: the text after a leading `#`,
    /// trimmed and lower-cased.
    pub fn comment(&self) -> Option<String> {
        let first = self.source.first()?;
        let text = first.strip_prefix('#')?;
        Some(text.trim().to_lowercase())
    }

    pub fn directive(&self) -> Option<Directive> {
        self.comment()
            .and_then(|comment| Directive::from_comment(&comment))
    }

    pub fn has_directive(&self, directive: Directive) -> bool {
        self.directive() == Some(directive)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.execution_count {
            Some(count) => writeln!(f, "In [{count}]:")?,
            None => writeln!(f, "In [ ]:")?,
        }
        for line in &self.source {
            writeln!(f, "> {}", line.trim_end_matches(['\r', '\n']))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notebook(cells: Value) -> Notebook {
        Notebook::from_value(json!({
            "cells": cells,
            "metadata": {"kernelspec": {"name": "ir", "language": "R"}},
            "nbformat": 4,
            "nbformat_minor": 5
        }))
        .unwrap()
    }

    fn code(source: &[&str]) -> Cell {
        serde_json::from_value(json!({
            "cell_type": "code",
            "execution_count": null,
            "source": source,
            "outputs": []
        }))
        .unwrap()
    }

    #[test]
    fn test_code_cells_preserve_order() {
        let nb = notebook(json!([
            {"cell_type": "markdown", "source": ["# Title"]},
            {"cell_type": "code", "execution_count": 1, "source": ["a = 1"], "outputs": []},
            {"cell_type": "raw", "source": ["raw"]},
            {"cell_type": "code", "execution_count": 2, "source": ["b = 2"], "outputs": []},
        ]));

        let code = nb.code_cells();
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].source, vec!["a = 1"]);
        assert_eq!(code[1].source, vec!["b = 2"]);
        assert_eq!(nb.cells().len(), 4);
    }

    #[test]
    fn test_unknown_cell_type_is_not_code() {
        let nb = notebook(json!([{"cell_type": "heading", "source": ["x"]}]));
        assert_eq!(nb.cells()[0].cell_type, CellType::Other);
        assert!(nb.code_cells().is_empty());
    }

    #[test]
    fn test_source_as_single_string() {
        let nb = notebook(json!([
            {"cell_type": "code", "execution_count": 1, "source": "x = 1\nprint(x)", "outputs": []},
            {"cell_type": "code", "execution_count": null, "source": "", "outputs": []},
        ]));
        assert_eq!(nb.cells()[0].source, vec!["x = 1\n", "print(x)"]);
        assert!(nb.cells()[1].is_empty());
    }

    #[test]
    fn test_missing_outputs_and_count_default() {
        let nb = notebook(json!([{"cell_type": "code", "source": ["x"]}]));
        let cell = &nb.cells()[0];
        assert_eq!(cell.execution_count, None);
        assert!(cell.outputs.is_empty());
    }

    #[test]
    fn test_missing_cells_is_invalid() {
        let err = Notebook::from_value(json!({"metadata": {}})).unwrap_err();
        assert!(matches!(err, Error::InvalidNotebook(_)));
    }

    #[test]
    fn test_invalid_json_is_invalid() {
        let err = "{not json".parse::<Notebook>().unwrap_err();
        assert!(matches!(err, Error::InvalidNotebook(_)));
    }

    #[test]
    fn test_serialize_preserves_document() {
        let raw = json!({
            "cells": [{
                "cell_type": "code",
                "execution_count": null,
                "id": "abc",
                "metadata": {"tags": ["slow"]},
                "source": [],
                "outputs": []
            }],
            "metadata": {"language_info": {"name": "julia"}},
            "nbformat": 4,
            "nbformat_minor": 5,
            "x-custom": true
        });
        let nb = Notebook::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&nb).unwrap(), raw);
        assert_eq!(nb.metadata().unwrap()["language_info"]["name"], "julia");
    }

    #[test]
    fn test_comment_parsing() {
        assert_eq!(code(&["#  No-Run  \n", "x = 1"]).comment().as_deref(), Some("no-run"));
        assert_eq!(code(&["x = 1  # no-run"]).comment(), None);
        assert_eq!(code(&[" # no-run"]).comment(), None);
        assert_eq!(code(&[]).comment(), None);
    }

    #[test]
    fn test_directives() {
        assert_eq!(code(&["# NO-CHECK-OUTPUT"]).directive(), Some(Directive::NoCheckOutput));
        assert!(code(&["#no-run"]).has_directive(Directive::NoRun));
        assert!(!code(&["#no-run please"]).has_directive(Directive::NoRun));
        assert_eq!(code(&["# just a comment"]).directive(), None);
        assert_eq!(code(&[]).directive(), None);
    }

    #[test]
    fn test_cell_display() {
        let mut cell = code(&["a = 1\n", "b = 2"]);
        cell.execution_count = Some(3);
        assert_eq!(cell.to_string(), "In [3]:\n> a = 1\n> b = 2\n");
    }
}
