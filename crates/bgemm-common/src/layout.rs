//! GEMM matrix layouts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Memory layout of a 2-D matrix slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Columns are contiguous; `stride` separates rows.
    RowMajor,
    /// Rows are contiguous; `stride` separates columns.
    ColumnMajor,
}

impl Layout {
    /// Packed leading-dimension stride for a `rows x cols` matrix.
    pub const fn default_stride(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColumnMajor => rows,
        }
    }

    /// Length of the dimension that `stride` steps over.
    pub const fn outer_len(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => rows,
            Layout::ColumnMajor => cols,
        }
    }

    /// Length of the contiguous dimension.
    pub const fn inner_len(self, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColumnMajor => rows,
        }
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Layout::RowMajor => "row",
            Layout::ColumnMajor => "col",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
