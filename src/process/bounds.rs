// src/process/bounds.rs

use std::ops::Range;
use thiserror::Error;

use crate::process::utils::comma_count;

/// Commas on a data row of the four-column table.
pub const DATA_ROW_COMMAS: usize = 3;

/// Where the embedded table sits inside a raw export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBounds {
    /// 0-based index of the header line.
    pub header_index: usize,
    /// Contiguous data lines directly after the header. May be zero.
    pub data_row_count: usize,
}

impl TableBounds {
    /// Line range covering the header and every counted data row.
    pub fn table_range(&self) -> Range<usize> {
        self.header_index..self.header_index + 1 + self.data_row_count
    }

    pub fn is_empty(&self) -> bool {
        self.data_row_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("header not found: no line contains all of [{}]", .required.join(", "))]
pub struct HeaderNotFound {
    pub required: Vec<String>,
}

/// Locate the table in `lines`.
///
/// The header is the first line containing every token of `required` as a
/// plain substring, so a metadata line that happens to embed all tokens wins
/// over the real header. Data rows are the lines that follow it with exactly
/// [`DATA_ROW_COMMAS`] commas; counting stops at the first line that differs
/// or at the end of input.
pub fn find_table_bounds<L, C>(lines: &[L], required: &[C]) -> Result<TableBounds, HeaderNotFound>
where
    L: AsRef<str>,
    C: AsRef<str>,
{
    let header_index = lines
        .iter()
        .position(|line| {
            let line = line.as_ref();
            required.iter().all(|col| line.contains(col.as_ref()))
        })
        .ok_or_else(|| HeaderNotFound {
            required: required.iter().map(|c| c.as_ref().to_string()).collect(),
        })?;

    let data_row_count = lines[header_index + 1..]
        .iter()
        .take_while(|line| comma_count(line.as_ref()) == DATA_ROW_COMMAS)
        .count();

    Ok(TableBounds {
        header_index,
        data_row_count,
    })
}
