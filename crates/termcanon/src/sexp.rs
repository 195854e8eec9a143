//! Canonical value model: tagged s-expressions.
//!
//! Every encoder in this crate produces a [`Sexp`]. A list whose first element
//! is an atom of the form `:head` is read as a constructor application named
//! `head`; there is no separate record variant.
//!
//! Grammar of the rendered text:
//! - atom: bare token, no whitespace / parentheses / quotes
//! - string: `"..."` with `\"`, `\\`, `\n`, `\t`, `\r`, `\u{XXXX}` escapes
//! - integer: optional `-`, decimal digits
//! - float: always contains `.` or `e` (`+nan.0`, `+inf.0`, `-inf.0` for
//!   non-finite values)
//! - list: `(` elements separated by one space `)`

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sexp {
    Atom(String),
    Str(String),
    Int(i128),
    Float(f64),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn atom(text: impl Into<String>) -> Self {
        Sexp::Atom(text.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Sexp::Str(text.into())
    }

    pub fn int(value: impl Into<i128>) -> Self {
        Sexp::Int(value.into())
    }

    pub fn float(value: f64) -> Self {
        Sexp::Float(value)
    }

    pub fn list(items: impl IntoIterator<Item = Sexp>) -> Self {
        Sexp::List(items.into_iter().collect())
    }

    /// Build the constructor application `(:head fields...)`.
    pub fn constr(head: &str, fields: impl IntoIterator<Item = Sexp>) -> Self {
        let mut items = vec![Sexp::Atom(format!(":{head}"))];
        items.extend(fields);
        Sexp::List(items)
    }

    /// Constructor name of a tagged list, without the leading `:`.
    pub fn head(&self) -> Option<&str> {
        match self {
            Sexp::List(items) => match items.first() {
                Some(Sexp::Atom(a)) => a.strip_prefix(':'),
                _ => None,
            },
            _ => None,
        }
    }

    /// Fields of a tagged list (everything after the head).
    pub fn fields(&self) -> &[Sexp] {
        match self {
            Sexp::List(items) if self.head().is_some() => &items[1..],
            _ => &[],
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(a) => f.write_str(a),
            Sexp::Str(s) => write_quoted(f, s),
            Sexp::Int(i) => write!(f, "{i}"),
            Sexp::Float(x) => write_float(f, *x),
            Sexp::List(items) => {
                f.write_char('(')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(')')
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{{{:04x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("+nan.0")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "+inf.0" } else { "-inf.0" })
    } else {
        // `Debug` is locale-independent, round-trips, and always keeps a `.` or `e`.
        write!(f, "{x:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_constructor_application() {
        let v = Sexp::constr("var", [Sexp::int(3)]);
        assert_eq!(v.render(), "(:var 3)");
        assert_eq!(v.head(), Some("var"));
        assert_eq!(v.fields(), &[Sexp::Int(3)]);
    }

    #[test]
    fn zero_ary_constructor_has_no_trailing_space() {
        assert_eq!(Sexp::constr("axiom", []).render(), "(:axiom)");
        assert_eq!(Sexp::list([]).render(), "()");
    }

    #[test]
    fn strings_are_escaped() {
        let v = Sexp::string("a \"q\"\\\n\t\u{1}");
        assert_eq!(v.render(), r#""a \"q\"\\\n\t\u{0001}""#);
    }

    #[test]
    fn floats_stay_distinguishable_from_integers() {
        assert_eq!(Sexp::float(1.0).render(), "1.0");
        assert_eq!(Sexp::float(0.25).render(), "0.25");
        assert_eq!(Sexp::float(1e20).render(), "1e20");
        assert_eq!(Sexp::float(f64::NAN).render(), "+nan.0");
        assert_eq!(Sexp::float(f64::NEG_INFINITY).render(), "-inf.0");
    }

    #[test]
    fn large_integers_render_in_decimal() {
        assert_eq!(Sexp::int(u64::MAX).render(), "18446744073709551615");
        assert_eq!(Sexp::int(-7i64).render(), "-7");
    }

    #[test]
    fn plain_lists_have_no_head() {
        let v = Sexp::list([Sexp::atom("a"), Sexp::atom("b")]);
        assert_eq!(v.head(), None);
        assert!(v.fields().is_empty());
        assert_eq!(v.render(), "(a b)");
    }
}
