// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Data tables passed along with an `invoke` command.

use std::{collections::HashMap, fmt};

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};

/// Data table of a step, as sent by the orchestrator.
///
/// Rows are kept exactly as received, the first one usually being a header.
///
/// ```rust
/// use cuke_wire::Table;
///
/// let table = Table::from(vec![
///     vec!["name", "age"],
///     vec!["Alice", "30"],
///     vec!["Bob", "25"],
/// ]);
///
/// assert_eq!(table.rows().len(), 2);
/// assert_eq!(table.hashes()[1]["name"], "Bob");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a new [`Table`] from the given rows.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// All the rows, header included.
    #[must_use]
    pub fn raw(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Consumes this [`Table`] returning all its rows.
    #[must_use]
    pub fn into_raw(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Rows without the header one.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Rows without the header one, each keyed by the header cells.
    #[must_use]
    pub fn hashes(&self) -> Vec<HashMap<&str, &str>> {
        let Some(header) = self.rows.first() else {
            return Vec::new();
        };
        self.rows()
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter().map(String::as_str))
                    .collect()
            })
            .collect()
    }

    /// Interprets a two-column table as key/value pairs.
    ///
    /// Returns [`None`] if any row isn't exactly two cells wide.
    #[must_use]
    pub fn rows_hash(&self) -> Option<HashMap<&str, &str>> {
        self.rows
            .iter()
            .map(|row| match row.as_slice() {
                [key, value] => Some((key.as_str(), value.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Swaps rows and columns. Cells beyond the first row's width are dropped.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let width = self.width();
        let mut columns = vec![Vec::with_capacity(self.rows.len()); width];
        for row in &self.rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell.clone());
            }
        }
        Self::new(columns)
    }

    /// Indicates whether this [`Table`] has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells in the first row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

impl From<Vec<Vec<String>>> for Table {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

impl From<Vec<Vec<&str>>> for Table {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(str::to_owned).collect())
                .collect(),
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "| {} |", row.iter().format(" | "))?;
        }
        Ok(())
    }
}
