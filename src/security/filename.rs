//! Workflow filename validation.
//!
//! # Responsibilities
//! - Decide whether a client-supplied filename may be used for a
//!   filesystem lookup under the workflows directory
//! - Report which check rejected a name (for logs and metrics)
//!
//! # Design Decisions
//! - Allow-list, reject by default: a name must positively match
//!   `[A-Za-z0-9_-]+\.json`
//! - Independent checks run in a fixed order; each one is testable alone
//! - The raw string is inspected as-is, never URL-decoded

use std::fmt;

/// Reason a filename was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    Empty,
    AbsolutePath,
    PathSeparator,
    ParentReference,
    ControlCharacter,
    EncodedSequence,
    ShellMetacharacter,
    NotAllowListed,
}

impl Violation {
    /// Stable label used in log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Violation::Empty => "empty",
            Violation::AbsolutePath => "absolute_path",
            Violation::PathSeparator => "path_separator",
            Violation::ParentReference => "parent_reference",
            Violation::ControlCharacter => "control_character",
            Violation::EncodedSequence => "encoded_sequence",
            Violation::ShellMetacharacter => "shell_metacharacter",
            Violation::NotAllowListed => "not_allow_listed",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required (case-sensitive) extension.
pub const WORKFLOW_EXTENSION: &str = ".json";

const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '$', '*', '?', '<', '>', '~', ':'];

// %2e = '.', %2f = '/', %5c = '\', %25 = '%' (double encoding)
const ENCODED_SEQUENCES: &[&str] = &["%2e", "%2f", "%5c", "%25"];

type Check = fn(&str) -> bool;

/// Checks in evaluation order. A check returns `true` when the name violates it.
const CHECKS: &[(Violation, Check)] = &[
    (Violation::Empty, is_empty),
    (Violation::AbsolutePath, is_absolute),
    (Violation::PathSeparator, has_path_separator),
    (Violation::ParentReference, has_parent_reference),
    (Violation::ControlCharacter, has_control_character),
    (Violation::EncodedSequence, has_encoded_sequence),
    (Violation::ShellMetacharacter, has_shell_metacharacter),
    (Violation::NotAllowListed, fails_allow_list),
];

/// Returns `true` if `name` is safe to use as a workflow filename.
pub fn validate(name: &str) -> bool {
    first_violation(name).is_none()
}

/// Returns the first check `name` fails, or `None` if it passes all of them.
pub fn first_violation(name: &str) -> Option<Violation> {
    CHECKS
        .iter()
        .find(|(_, violates)| violates(name))
        .map(|(violation, _)| *violation)
}

fn is_empty(name: &str) -> bool {
    name.is_empty()
}

fn is_absolute(name: &str) -> bool {
    if name.starts_with('/') || name.starts_with('\\') {
        return true;
    }
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

fn has_path_separator(name: &str) -> bool {
    name.contains(['/', '\\'])
}

fn has_parent_reference(name: &str) -> bool {
    name.contains("..")
}

fn has_control_character(name: &str) -> bool {
    name.chars().any(char::is_control)
}

fn has_encoded_sequence(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    ENCODED_SEQUENCES.iter().any(|seq| lowered.contains(seq))
}

fn has_shell_metacharacter(name: &str) -> bool {
    name.contains(SHELL_METACHARACTERS)
}

fn fails_allow_list(name: &str) -> bool {
    match name.strip_suffix(WORKFLOW_EXTENSION) {
        Some(stem) => {
            stem.is_empty()
                || !stem
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        }
        None => true,
    }
}
