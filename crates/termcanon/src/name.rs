//! Hierarchical qualified names (`Nat.add`, `_private.Foo.0.bar`).
//!
//! A name is either anonymous or a string/numeric segment appended to a parent
//! name. Each node owns its parent and carries the hash of the whole chain,
//! computed once at construction. Hosts that already have a hash for a node
//! (for example one that accounts for macro scopes) pass it explicitly with
//! [`Name::str_with_hash`] / [`Name::num_with_hash`].
//!
//! Equality compares the hash as well as the segments, so two names that
//! print identically but come from different provenance stay distinct.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::char as pchar,
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::delimited,
    IResult,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::digest::{numeric_segment_hash, string_segment_hash, ANONYMOUS_NAME_HASH};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Str(Arc<str>),
    Num(u64),
}

#[derive(Debug, PartialEq, Eq)]
struct NameNode {
    prefix: Name,
    segment: Segment,
    hash: u64,
}

#[derive(Clone, Default)]
pub struct Name {
    node: Option<Arc<NameNode>>,
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || (a.hash == b.hash && a == b),
            _ => false,
        }
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

/// Borrowed view of the outermost segment, for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameView<'a> {
    Anonymous,
    Str(&'a Name, &'a str),
    Num(&'a Name, u64),
}

impl Name {
    pub fn anonymous() -> Self {
        Name { node: None }
    }

    pub fn str(prefix: Name, segment: impl Into<Arc<str>>) -> Self {
        let segment = segment.into();
        let hash = string_segment_hash(prefix.hash_value(), &segment);
        Self::str_with_hash(prefix, segment, hash)
    }

    pub fn num(prefix: Name, segment: u64) -> Self {
        let hash = numeric_segment_hash(prefix.hash_value(), segment);
        Self::num_with_hash(prefix, segment, hash)
    }

    pub fn str_with_hash(prefix: Name, segment: impl Into<Arc<str>>, hash: u64) -> Self {
        Name {
            node: Some(Arc::new(NameNode {
                prefix,
                segment: Segment::Str(segment.into()),
                hash,
            })),
        }
    }

    pub fn num_with_hash(prefix: Name, segment: u64, hash: u64) -> Self {
        Name {
            node: Some(Arc::new(NameNode {
                prefix,
                segment: Segment::Num(segment),
                hash,
            })),
        }
    }

    /// Build a name from root-first segments, hashing with the default provider.
    pub fn from_components(segments: impl IntoIterator<Item = Segment>) -> Self {
        segments
            .into_iter()
            .fold(Name::anonymous(), |prefix, segment| match segment {
                Segment::Str(s) => Name::str(prefix, s),
                Segment::Num(n) => Name::num(prefix, n),
            })
    }

    /// Shorthand for string-only dotted names built in code: `Name::mk(["Nat", "add"])`.
    pub fn mk<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        segments
            .into_iter()
            .fold(Name::anonymous(), |prefix, s| Name::str(prefix, s))
    }

    pub fn is_anonymous(&self) -> bool {
        self.node.is_none()
    }

    pub fn view(&self) -> NameView<'_> {
        match &self.node {
            None => NameView::Anonymous,
            Some(node) => match &node.segment {
                Segment::Str(s) => NameView::Str(&node.prefix, &**s),
                Segment::Num(n) => NameView::Num(&node.prefix, *n),
            },
        }
    }

    pub fn prefix(&self) -> Option<&Name> {
        self.node.as_ref().map(|n| &n.prefix)
    }

    pub fn segment(&self) -> Option<&Segment> {
        self.node.as_ref().map(|n| &n.segment)
    }

    /// Hash of the whole chain ending at this node.
    pub fn hash_value(&self) -> u64 {
        match &self.node {
            None => ANONYMOUS_NAME_HASH,
            Some(node) => node.hash,
        }
    }

    /// Segments, root-first.
    pub fn components(&self) -> Vec<&Segment> {
        let mut out = Vec::new();
        let mut cur = self;
        while let Some(node) = &cur.node {
            out.push(&node.segment);
            cur = &node.prefix;
        }
        out.reverse();
        out
    }

    /// Compiler-generated names: some string segment starts with `_`.
    pub fn is_internal(&self) -> bool {
        match self.view() {
            NameView::Anonymous => false,
            NameView::Str(prefix, s) => s.starts_with('_') || prefix.is_internal(),
            NameView::Num(prefix, _) => prefix.is_internal(),
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{self}`#{:016x}", self.hash_value())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            return f.write_str("[anonymous]");
        }
        for (i, segment) in self.components().into_iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Num(n) => write!(f, "{n}")?,
                Segment::Str(s) if needs_guillemets(s) => write!(f, "«{s}»")?,
                Segment::Str(s) => f.write_str(s)?,
            }
        }
        Ok(())
    }
}

fn needs_guillemets(s: &str) -> bool {
    s.is_empty()
        || s == "[anonymous]"
        || s.trim() != s
        || s.contains('.')
        || s.contains('«')
        || s.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameParseError {
    #[error("invalid name `{text}`")]
    Syntax { text: String },
    #[error("numeric segment `{segment}` in `{text}` does not fit in u64")]
    NumericOverflow { text: String, segment: String },
}

enum RawSegment<'a> {
    Quoted(&'a str),
    Plain(&'a str),
}

fn raw_segment(input: &str) -> IResult<&str, RawSegment<'_>> {
    alt((
        map(delimited(tag("«"), take_until("»"), tag("»")), RawSegment::Quoted),
        map(take_while1(|c: char| c != '.' && c != '«'), RawSegment::Plain),
    ))(input)
}

fn raw_name(input: &str) -> IResult<&str, Vec<RawSegment<'_>>> {
    all_consuming(separated_list1(pchar('.'), raw_segment))(input)
}

impl FromStr for Name {
    type Err = NameParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "[anonymous]" {
            return Ok(Name::anonymous());
        }
        let (_, raw) = raw_name(trimmed).map_err(|_| NameParseError::Syntax {
            text: text.to_string(),
        })?;

        let mut name = Name::anonymous();
        for segment in raw {
            name = match segment {
                RawSegment::Quoted(s) => Name::str(name, s),
                RawSegment::Plain(s) if s.bytes().all(|b| b.is_ascii_digit()) => {
                    let n = s.parse::<u64>().map_err(|_| NameParseError::NumericOverflow {
                        text: text.to_string(),
                        segment: s.to_string(),
                    })?;
                    Name::num(name, n)
                }
                RawSegment::Plain(s) => Name::str(name, s),
            };
        }
        Ok(name)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_names() {
        let n: Name = "Nat.add".parse().unwrap();
        assert_eq!(n, Name::mk(["Nat", "add"]));
        assert_eq!(n.to_string(), "Nat.add");
    }

    #[test]
    fn digit_segments_are_numeric() {
        let n: Name = "_private.Foo.0.bar".parse().unwrap();
        let comps = n.components();
        assert_eq!(comps.len(), 4);
        assert_eq!(comps[2], &Segment::Num(0));
        assert!(n.is_internal());
    }

    #[test]
    fn guillemets_quote_awkward_segments() {
        let n: Name = "Foo.«a.b».«7»".parse().unwrap();
        assert_eq!(
            n.components(),
            vec![
                &Segment::Str("Foo".into()),
                &Segment::Str("a.b".into()),
                &Segment::Str("7".into())
            ]
        );
        assert_eq!(n.to_string(), "Foo.«a.b».«7»");
    }

    #[test]
    fn anonymous_spellings() {
        assert!("".parse::<Name>().unwrap().is_anonymous());
        assert!("[anonymous]".parse::<Name>().unwrap().is_anonymous());
        assert_eq!(Name::anonymous().to_string(), "[anonymous]");
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(matches!("Foo..bar".parse::<Name>(), Err(NameParseError::Syntax { .. })));
        assert!(matches!("Foo.".parse::<Name>(), Err(NameParseError::Syntax { .. })));
    }

    #[test]
    fn rejects_oversized_numeric_segments() {
        let err = "Foo.99999999999999999999999".parse::<Name>().unwrap_err();
        assert!(matches!(err, NameParseError::NumericOverflow { .. }));
    }

    #[test]
    fn explicit_hash_distinguishes_same_text() {
        let a = Name::str(Name::anonymous(), "x");
        let b = Name::str_with_hash(Name::anonymous(), "x", 42);
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn internal_check_walks_the_whole_chain() {
        assert!(!Name::mk(["Nat", "add"]).is_internal());
        assert!(Name::mk(["Nat", "_aux"]).is_internal());
        assert!(Name::num(Name::mk(["_x"]), 3).is_internal());
        assert!(!Name::anonymous().is_internal());
    }

    #[test]
    fn segments_that_look_like_syntax_are_quoted() {
        for text in ["[anonymous]", " padded", "trailing\t", "7"] {
            let n = Name::mk([text]);
            let shown = n.to_string();
            assert_eq!(shown, format!("«{text}»"));
            let back: Name = shown.parse().unwrap();
            assert_eq!(back, n, "{shown}");
            assert!(!back.is_anonymous());
        }
        let nested = Name::str(Name::mk(["A"]), " b ");
        assert_eq!(nested.to_string().parse::<Name>().unwrap(), nested);
    }
}
