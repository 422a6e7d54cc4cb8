//! Side-by-side diff of the current and candidate config.
//!
//! Purely informational: nothing here feeds the change decision.
//!
//! ```text
//! /etc/docker/daemon.json      | candidate
//! ---------------------------------------------------------
//! {                            | {
//!   "debug": false,            | ~
//! ~                            |   "debug": true,
//! }                            | }
//! ```

use std::io::ErrorKind;
use std::path::Path;

use similar::{ChangeTag, TextDiff};

use crate::error::{io_err, SyncError};

/// Between the two columns.
pub const SEPARATOR: &str = " | ";

/// Fills the opposite column of a one-sided line.
pub const PLACEHOLDER: &str = "~";

/// Default total width when the caller does not pick one.
pub const DEFAULT_WIDTH: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Common,
    LeftOnly,
    RightOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

/// Line-level Myers comparison of `old` against `new`.
pub fn classify(old: &str, new: &str) -> Vec<DiffLine> {
    TextDiff::from_lines(old, new)
        .iter_all_changes()
        .map(|change| DiffLine {
            kind: match change.tag() {
                ChangeTag::Equal => DiffKind::Common,
                ChangeTag::Delete => DiffKind::LeftOnly,
                ChangeTag::Insert => DiffKind::RightOnly,
            },
            text: change.value().trim_end_matches(['\r', '\n']).to_string(),
        })
        .collect()
}

/// Two equal-length columns built from classified lines.
pub fn columns(lines: &[DiffLine]) -> (Vec<String>, Vec<String>) {
    let mut left = Vec::with_capacity(lines.len());
    let mut right = Vec::with_capacity(lines.len());
    for line in lines {
        let (l, r) = match line.kind {
            DiffKind::Common => (line.text.as_str(), line.text.as_str()),
            DiffKind::LeftOnly => (line.text.as_str(), PLACEHOLDER),
            DiffKind::RightOnly => (PLACEHOLDER, line.text.as_str()),
        };
        left.push(l.to_string());
        right.push(r.to_string());
    }
    (left, right)
}

/// Width of one column for a total row `width`.
pub fn column_width(width: usize) -> usize {
    (width.saturating_sub(SEPARATOR.len()) / 2).max(1)
}

/// Word-wrap `text` to `width` characters without splitting words.
/// Breaks only at single spaces, so runs of spaces inside a line survive.
///
/// Leading indentation is repeated on continuation rows. An empty line
/// still yields one (empty) row; a word longer than `width` overflows.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let body = text.trim_start();
    let indent = &text[..text.len() - body.len()];

    let mut rows = Vec::new();
    let mut current = indent.to_string();
    let mut has_word = false;
    for word in body.split(' ') {
        let needed = current.chars().count() + usize::from(has_word) + word.chars().count();
        if has_word && needed > width {
            rows.push(std::mem::replace(&mut current, indent.to_string()));
            has_word = false;
        }
        if has_word {
            current.push(' ');
        }
        current.push_str(word);
        has_word = true;
    }
    rows.push(current);
    rows
}

fn join_row(left: &str, right: &str, half: usize) -> String {
    format!("{left:<half$}{SEPARATOR}{right}")
        .trim_end()
        .to_string()
}

/// Render `old` and `new` as two aligned, wrapped columns under a
/// two-row header.
pub fn side_by_side(
    old: &str,
    new: &str,
    width: usize,
    left_title: &str,
    right_title: &str,
) -> Vec<String> {
    let half = column_width(width);
    let (left, right) = columns(&classify(old, new));

    let mut out = vec![
        join_row(left_title, right_title, half),
        "-".repeat(width.max(half * 2 + SEPARATOR.len())),
    ];

    for (l, r) in left.iter().zip(right.iter()) {
        let l = wrap(l, half);
        let r = wrap(r, half);
        for i in 0..l.len().max(r.len()) {
            out.push(join_row(
                l.get(i).map_or("", String::as_str),
                r.get(i).map_or("", String::as_str),
                half,
            ));
        }
    }
    out
}

/// [`side_by_side`] against the file at `path`; a missing file is an
/// empty document.
pub fn diff_against_file(
    path: &Path,
    new: &str,
    width: usize,
    right_title: &str,
) -> Result<Vec<String>, SyncError> {
    let old = read_existing_or_empty(path)?;
    Ok(side_by_side(
        &old,
        new,
        width,
        &path.display().to_string(),
        right_title,
    ))
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
