// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed error surface for the interlocking core.
//!
//! Construction-time errors (missing referents, duplicate names) are fatal
//! to startup. Steady-state errors (an invalid property update reaching an
//! element through a stray callback) are recovered locally by the caller
//! and never cross a task boundary as a panic.

use std::fmt;

/// Errors raised by the interlocking core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TowerError {
    /// A kind/name pair was looked up but no such element is registered.
    UnknownElement { kind: &'static str, name: String },
    /// `update()` was called with a property not in the element's declared set.
    InvalidProperty { kind: &'static str, name: String, property: &'static str },
    /// `update()` was called on an element that never accepts updates (OuterButton).
    NotUpdatable { kind: &'static str, name: String },
    /// Two elements of the same kind were registered under the same name.
    DuplicateName { kind: &'static str, name: String },
    /// A constructor referenced another element (home signal, turnout, button) by
    /// name and no such element exists.
    MissingReferent { referrer: String, name: String },
}

impl TowerError {
    /// Machine-readable code, analogous to a wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownElement { .. } => "UNKNOWN_ELEMENT",
            Self::InvalidProperty { .. } => "INVALID_PROPERTY",
            Self::NotUpdatable { .. } => "NOT_UPDATABLE",
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
            Self::MissingReferent { .. } => "MISSING_REFERENT",
        }
    }
}

impl fmt::Display for TowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElement { kind, name } => {
                write!(f, "no {kind} named \"{name}\" is registered")
            }
            Self::InvalidProperty { kind, name, property } => {
                write!(f, "property \"{property}\" is not valid for {kind} \"{name}\"")
            }
            Self::NotUpdatable { kind, name } => {
                write!(f, "{kind} \"{name}\" has no updatable properties")
            }
            Self::DuplicateName { kind, name } => {
                write!(f, "a {kind} named \"{name}\" is already registered")
            }
            Self::MissingReferent { referrer, name } => {
                write!(f, "{referrer} references unknown element \"{name}\"")
            }
        }
    }
}

impl std::error::Error for TowerError {}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, TowerError>;
