//! Compiled declarations and modules as exposed by the host.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::name::Name;

/// Which of the four built-in quotient operations a `Quot` declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotKind {
    /// `Quot`
    Type,
    /// `Quot.mk`
    Ctor,
    /// `Quot.lift`
    Lift,
    /// `Quot.ind`
    Ind,
}

impl QuotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotKind::Type => "type",
            QuotKind::Ctor => "ctor",
            QuotKind::Lift => "lift",
            QuotKind::Ind => "ind",
        }
    }
}

impl fmt::Display for QuotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Axiom,
    Definition { value: Arc<Expr> },
    Theorem { value: Arc<Expr> },
    Opaque { value: Arc<Expr> },
    Quot { kind: QuotKind, type_name: Name },
    /// Constructors are full declarations, in declaration order.
    Inductive { constructors: Vec<Declaration> },
    Constructor { induct: Name },
    Recursor,
}

impl DeclKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeclKind::Axiom => "axiom",
            DeclKind::Definition { .. } => "definition",
            DeclKind::Theorem { .. } => "theorem",
            DeclKind::Opaque { .. } => "opaque",
            DeclKind::Quot { .. } => "quot",
            DeclKind::Inductive { .. } => "inductive",
            DeclKind::Constructor { .. } => "constructor",
            DeclKind::Recursor => "recursor",
        }
    }

    /// Value term, for the kinds that carry one.
    pub fn value(&self) -> Option<&Arc<Expr>> {
        match self {
            DeclKind::Definition { value }
            | DeclKind::Theorem { value }
            | DeclKind::Opaque { value } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: Name,
    pub ty: Arc<Expr>,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(name: Name, ty: Expr, kind: DeclKind) -> Self {
        Declaration {
            name,
            ty: Arc::new(ty),
            kind,
        }
    }

    pub fn axiom(name: Name, ty: Expr) -> Self {
        Declaration::new(name, ty, DeclKind::Axiom)
    }

    pub fn definition(name: Name, ty: Expr, value: Expr) -> Self {
        Declaration::new(
            name,
            ty,
            DeclKind::Definition {
                value: Arc::new(value),
            },
        )
    }

    pub fn theorem(name: Name, ty: Expr, value: Expr) -> Self {
        Declaration::new(
            name,
            ty,
            DeclKind::Theorem {
                value: Arc::new(value),
            },
        )
    }
}

/// A module's declaration table, in the host's stable order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleData {
    pub name: Name,
    pub declarations: Vec<Declaration>,
}

impl ModuleData {
    pub fn new(name: Name, declarations: Vec<Declaration>) -> Self {
        ModuleData { name, declarations }
    }
}
