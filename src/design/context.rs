use std::sync::Arc;

use crate::design::model::{CellRecord, TextContent};
use crate::foundation::core::CellId;

#[derive(Debug)]
struct Frame {
    cell: CellId,
    bindings: Vec<(String, String)>,
    parent: Option<Arc<Frame>>,
}

/// Stack of instance parameter bindings from the top cell down to the cell being drawn.
///
/// Cloning is cheap; pushing shares the parent frames.
#[derive(Clone, Debug, Default)]
pub struct VarContext {
    top: Option<Arc<Frame>>,
}

impl VarContext {
    /// Empty context for the top of a hierarchy.
    pub fn root() -> Self {
        Self::default()
    }

    /// Child context entered through an instance of `cell` with the given bindings.
    pub fn push(&self, cell: CellId, bindings: &[(String, String)]) -> Self {
        Self {
            top: Some(Arc::new(Frame {
                cell,
                bindings: bindings.to_vec(),
                parent: self.top.clone(),
            })),
        }
    }

    /// Number of instance frames.
    pub fn depth(&self) -> usize {
        let mut n = 0;
        let mut cur = self.top.as_deref();
        while let Some(f) = cur {
            n += 1;
            cur = f.parent.as_deref();
        }
        n
    }

    /// Cell entered by the innermost frame.
    pub fn current_cell(&self) -> Option<CellId> {
        self.top.as_ref().map(|f| f.cell)
    }

    /// Value of `name`, innermost binding first, then the declared default of `cell`.
    pub fn lookup<'a>(&'a self, name: &str, cell: &'a CellRecord) -> Option<&'a str> {
        let mut cur = self.top.as_deref();
        while let Some(f) = cur {
            if let Some((_, v)) = f.bindings.iter().find(|(k, _)| k == name) {
                return Some(v.as_str());
            }
            cur = f.parent.as_deref();
        }
        cell.param_default(name)
    }

    /// Display string of a text payload; unresolved parameters show as `name=?`.
    pub fn resolve(&self, content: &TextContent, cell: &CellRecord) -> String {
        match content {
            TextContent::Literal(s) => s.clone(),
            TextContent::Param(name) => match self.lookup(name, cell) {
                Some(v) => v.to_owned(),
                None => format!("{name}=?"),
            },
        }
    }
}
