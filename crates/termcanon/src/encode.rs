//! Canonical encoding of names, levels, terms and declarations.
//!
//! Every function here is total and pure: one `match` arm per IR variant, no
//! `Result`. Adding a variant to the IR is a compile error here until the
//! encoding for it is decided.
//!
//! Shapes:
//! ```text
//! name         (:anonymous) | (:name <parent-hash> <hash> seg...)
//! level        (:level <l>)   l = (:lzero) | (:lsucc l) | (:max l l) | (:imax l l) | <name>
//! term         (:var i) | <name> | (:meta <name>) | (:sort <level>)
//!              | (:const <name> (<level>...)) | (:apply f a...) | (:lambda ty body)
//!              | (:pi ty body) | (:let ty val body) | (:literal n|"s") | (:proj <name> i s)
//! declaration  (:definition <name> <type> <payload>)
//! ```

use std::sync::Arc;

use crate::decl::{DeclKind, Declaration};
use crate::expr::{Expr, Literal};
use crate::level::Level;
use crate::name::{Name, Segment};
use crate::sexp::Sexp;

/// Anything with a canonical encoding. The module encoder and the CLI go
/// through this; the free functions are the per-variant implementations.
pub trait ToSexp {
    fn to_sexp(&self) -> Sexp;
}

impl<T: ToSexp + ?Sized> ToSexp for Arc<T> {
    fn to_sexp(&self) -> Sexp {
        (**self).to_sexp()
    }
}

impl ToSexp for Name {
    fn to_sexp(&self) -> Sexp {
        encode_name(self)
    }
}

impl ToSexp for Level {
    fn to_sexp(&self) -> Sexp {
        encode_level(self)
    }
}

impl ToSexp for Literal {
    fn to_sexp(&self) -> Sexp {
        encode_literal(self)
    }
}

impl ToSexp for Expr {
    fn to_sexp(&self) -> Sexp {
        encode_expr(self)
    }
}

impl ToSexp for Declaration {
    fn to_sexp(&self) -> Sexp {
        encode_declaration(self)
    }
}

// ============================================================================
// Names
// ============================================================================

pub fn encode_name(name: &Name) -> Sexp {
    let Some(parent) = name.prefix() else {
        return Sexp::constr("anonymous", []);
    };
    let mut fields = vec![
        Sexp::int(parent.hash_value()),
        Sexp::int(name.hash_value()),
    ];
    fields.extend(name.components().into_iter().map(segment_token));
    Sexp::constr("name", fields)
}

fn segment_token(segment: &Segment) -> Sexp {
    match segment {
        Segment::Num(n) => Sexp::Atom(format!("#{n}")),
        Segment::Str(s) if is_plain_atom(s) => Sexp::atom(&**s),
        Segment::Str(s) => Sexp::string(&**s),
    }
}

/// Segment text that can be printed bare without colliding with any other
/// token class (`_`, `:head`, `#n`, numbers, strings).
fn is_plain_atom(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    s != "_"
        && !matches!(first, ':' | '#' | '-' | '+')
        && !first.is_ascii_digit()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '(' | ')' | '"' | '\\'))
}

// ============================================================================
// Levels
// ============================================================================

pub fn encode_level(level: &Level) -> Sexp {
    Sexp::constr("level", [level_node(level)])
}

fn level_node(level: &Level) -> Sexp {
    match level {
        Level::Zero => Sexp::constr("lzero", []),
        Level::Succ(l) => Sexp::constr("lsucc", [level_node(l)]),
        Level::Max(l, r) => Sexp::constr("max", [level_node(l), level_node(r)]),
        Level::IMax(l, r) => Sexp::constr("imax", [level_node(l), level_node(r)]),
        Level::Param(name) | Level::MVar(name) => encode_name(name),
    }
}

// ============================================================================
// Terms
// ============================================================================

pub fn encode_literal(lit: &Literal) -> Sexp {
    match lit {
        Literal::Nat(n) => Sexp::constr("literal", [Sexp::int(*n)]),
        Literal::Str(s) => Sexp::constr("literal", [Sexp::string(&**s)]),
    }
}

pub fn encode_expr(expr: &Expr) -> Sexp {
    match expr {
        Expr::BVar(idx) => Sexp::constr("var", [Sexp::int(*idx)]),
        Expr::FVar(name) => encode_name(name),
        Expr::MVar(name) => Sexp::constr("meta", [encode_name(name)]),
        Expr::Sort(level) => Sexp::constr("sort", [encode_level(level)]),
        Expr::Const(name, levels) => Sexp::constr(
            "const",
            [encode_name(name), Sexp::list(levels.iter().map(encode_level))],
        ),
        Expr::App(..) => {
            let mut spine = vec![encode_expr(expr.get_app_fn())];
            spine.extend(expr.get_app_args().into_iter().map(encode_expr));
            Sexp::constr("apply", spine)
        }
        Expr::Lam(_, ty, body) => Sexp::constr("lambda", [encode_expr(ty), encode_expr(body)]),
        Expr::Pi(_, ty, body) => Sexp::constr("pi", [encode_expr(ty), encode_expr(body)]),
        Expr::Let(_, ty, value, body) => Sexp::constr(
            "let",
            [encode_expr(ty), encode_expr(value), encode_expr(body)],
        ),
        Expr::Lit(lit) => encode_literal(lit),
        Expr::MData(_, inner) => encode_expr(inner),
        Expr::Proj(struct_name, idx, s) => Sexp::constr(
            "proj",
            [encode_name(struct_name), Sexp::int(*idx), encode_expr(s)],
        ),
    }
}

// ============================================================================
// Declarations
// ============================================================================

pub fn encode_declaration(decl: &Declaration) -> Sexp {
    Sexp::constr(
        "definition",
        [
            encode_name(&decl.name),
            encode_expr(&decl.ty),
            encode_payload(decl),
        ],
    )
}

fn encode_payload(decl: &Declaration) -> Sexp {
    match &decl.kind {
        DeclKind::Axiom => Sexp::constr("axiom", []),
        DeclKind::Definition { value } | DeclKind::Theorem { value } => {
            Sexp::constr("function", [encode_expr(value)])
        }
        DeclKind::Opaque { value } => Sexp::constr("abstract", [encode_expr(value)]),
        DeclKind::Quot { kind, type_name } => Sexp::constr(
            "quot-info",
            [Sexp::atom(kind.as_str()), encode_name(type_name)],
        ),
        DeclKind::Inductive { constructors } => Sexp::constr(
            "data",
            [
                encode_expr(&decl.ty),
                Sexp::list(constructors.iter().map(encode_declaration)),
            ],
        ),
        DeclKind::Constructor { induct } => Sexp::constr("constructor", [encode_name(induct)]),
        DeclKind::Recursor => Sexp::constr("recursor", [encode_expr(&decl.ty)]),
    }
}
