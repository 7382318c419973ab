// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser adapters.
//!
//! An adapter turns module source text into a [`ModuleTree`]. Adapters are
//! interchangeable: for any input every adapter accepts, they must produce
//! identical trees. Input an adapter cannot handle fails with a
//! [`ParseFailure`] instead of producing a different tree.

pub mod lite;
pub mod oxc;

use std::{fmt, str::FromStr};

use crate::{
    ast::{Item, ModuleTree, Reference},
    error::ParseFailure,
};

pub type ParseFn = fn(&str) -> Result<ModuleTree, ParseFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserKind {
    /// Full ECMAScript parser with semantic analysis.
    #[default]
    Oxc,
    /// Small hand-written recogniser.
    Lite,
}

impl ParserKind {
    pub const ALL: [ParserKind; 2] = [ParserKind::Oxc, ParserKind::Lite];

    pub fn parse_fn(self) -> ParseFn {
        match self {
            ParserKind::Oxc => oxc::parse,
            ParserKind::Lite => lite::parse,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParserKind::Oxc => "oxc",
            ParserKind::Lite => "lite",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oxc" => Ok(ParserKind::Oxc),
            "lite" => Ok(ParserKind::Lite),
            other => Err(format!("unknown parser '{other}', expected 'oxc' or 'lite'")),
        }
    }
}

/// Hands each reference to the item whose span contains it. Items must be
/// in source order; references inside import and export lists are dropped.
pub(crate) fn attach_references(items: &mut [Item], mut references: Vec<Reference>) {
    references.sort_by_key(|reference| reference.span.start);
    let mut references = references.into_iter().peekable();
    for item in items {
        let Some((span, target)) = item.reference_target() else {
            continue;
        };
        while let Some(reference) = references.next_if(|r| r.span.end <= span.end) {
            if reference.span.start >= span.start {
                target.push(reference);
            }
        }
    }
}
