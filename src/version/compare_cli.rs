// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! `dpkg --compare-versions <a> <relation> <b>`'s relation table, a direct
//! port of `enquiry.c`'s `cmpversions`. Kept separate from [super::compare]'s
//! [std::cmp::Ord] implementation since this is the CLI's truth table, not
//! version ordering itself -- a missing/`<unknown>` version is not simply
//! "the blank version" to [std::cmp::Ord], it's a distinct case each
//! relation answers on its own terms.

use std::cmp::Ordering;

use super::Version;

/// One row of the relation table: how to answer depending on where `a` and
/// `b` fall relative to each other, and specially if either (or both) is
/// the blank, uninformative version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Relation {
    if_lesser: bool,
    if_equal: bool,
    if_greater: bool,
    if_none_a: bool,
    if_none_both: bool,
    if_none_b: bool,
}

/// An unrecognised relation token was given to [compare].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("bad relation '{0}'")]
pub struct UnknownRelation(pub String);

fn relation(token: &str) -> Option<Relation> {
    let r = |if_lesser, if_equal, if_greater, if_none_a, if_none_both, if_none_b| Relation {
        if_lesser,
        if_equal,
        if_greater,
        if_none_a,
        if_none_both,
        if_none_b,
    };

    Some(match token {
        "le" | "<" | "<=" => r(true, true, false, true, true, false),
        "lt" | "<<" => r(true, false, false, true, false, false),
        "eq" | "=" => r(false, true, false, false, true, false),
        "ne" => r(true, false, true, true, false, true),
        "ge" | ">" | ">=" => r(false, true, true, false, true, true),
        "gt" | ">>" => r(false, false, true, false, false, true),

        // These treat an empty version as later than any version.
        "le-nl" => r(true, true, false, false, true, true),
        "lt-nl" => r(true, false, false, false, false, true),
        "ge-nl" => r(false, true, true, true, true, false),
        "gt-nl" => r(false, false, true, true, false, false),

        _ => return None,
    })
}

/// `<unknown>` is accepted wherever a version string is expected, treated
/// identically to an empty string: both parse as [Version::blank].
fn parse_operand(text: &str) -> Result<Version, super::Error> {
    if text.is_empty() || text == "<unknown>" {
        Ok(Version::blank())
    } else {
        text.parse()
    }
}

/// Evaluate `<a> <relation> <b>` the way `dpkg --compare-versions` does,
/// returning whether the relation holds. `relation` must be one of `lt`,
/// `le`, `eq`, `ne`, `ge`, `gt`, the `-nl` variants, or the legacy
/// spellings `<`, `<=`, `<<`, `=`, `>`, `>=`, `>>`.
///
/// A version string that parses to the blank version (the empty string or
/// the literal `<unknown>`) is handled specially, per relation, rather than
/// compared in the usual ordering -- see the `-nl` suffix forms, which
/// treat a blank version as later than any concrete one.
pub fn compare(a: &str, relation_token: &str, b: &str) -> Result<bool, CompareVersionsError> {
    let rel = relation(relation_token).ok_or_else(|| UnknownRelation(relation_token.to_owned()))?;
    let a = parse_operand(a).map_err(CompareVersionsError::BadVersion)?;
    let b = parse_operand(b).map_err(CompareVersionsError::BadVersion)?;

    Ok(if !a.is_informative() {
        if b.is_informative() {
            rel.if_none_a
        } else {
            rel.if_none_both
        }
    } else if !b.is_informative() {
        rel.if_none_b
    } else {
        match a.cmp(&b) {
            Ordering::Less => rel.if_lesser,
            Ordering::Equal => rel.if_equal,
            Ordering::Greater => rel.if_greater,
        }
    })
}

/// Everything [compare] can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CompareVersionsError {
    /// `relation` wasn't one of the recognised tokens.
    #[error(transparent)]
    UnknownRelation(#[from] UnknownRelation),
    /// One of the two version operands failed to parse.
    #[error("bad version syntax: {0}")]
    BadVersion(#[source] super::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_lt_holds() {
        assert!(compare("1.0~beta", "lt", "1.0").unwrap());
    }

    #[test]
    fn epoch_beats_upstream_version() {
        assert!(compare("2:1.0", "gt", "1:9.9").unwrap());
    }

    #[test]
    fn nl_variant_treats_empty_as_later() {
        assert!(!compare("", "lt-nl", "1.0").unwrap());
        assert!(compare("", "gt-nl", "1.0").unwrap());
    }

    #[test]
    fn legacy_tokens_match_their_modern_equivalents() {
        assert_eq!(compare("1.0", "<", "2.0").unwrap(), compare("1.0", "le", "2.0").unwrap());
        assert_eq!(compare("1.0", "<<", "2.0").unwrap(), compare("1.0", "lt", "2.0").unwrap());
    }

    #[test]
    fn unknown_literal_is_blank() {
        assert_eq!(compare("<unknown>", "eq", "").unwrap(), compare("", "eq", "").unwrap());
    }

    #[test]
    fn unrecognised_relation_errors() {
        assert!(matches!(
            compare("1.0", "huh", "2.0"),
            Err(CompareVersionsError::UnknownRelation(_))
        ));
    }

    #[test]
    fn bad_version_syntax_errors() {
        assert!(matches!(compare("1.0", "eq", "!!!"), Err(CompareVersionsError::BadVersion(_))));
    }
}

// vim: foldmethod=marker
