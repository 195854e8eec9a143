//! Term IR
//!
//! The expression tree handed over by the host compiler. Bound variables use
//! de Bruijn indices. Children are `Arc`-shared, so the same subterm can be
//! reachable from several parents; see [`crate::sharing`] for the traversal
//! that respects that sharing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::name::Name;

/// Binder annotation (how a variable is bound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinderInfo {
    /// `(x : A)`
    #[default]
    Default,
    /// `{x : A}`
    Implicit,
    /// `⦃x : A⦄`
    StrictImplicit,
    /// `[x : A]`
    InstImplicit,
}

/// Binder data carried by lambdas, pis and lets. The encoder discards it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binder {
    pub name: Name,
    pub info: BinderInfo,
}

impl Binder {
    pub fn new(name: Name, info: BinderInfo) -> Self {
        Binder { name, info }
    }

    pub fn named(name: &str) -> Self {
        Binder::new(Name::mk([name]), BinderInfo::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Nat(u64),
    Str(Arc<str>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MDataValue {
    Bool(bool),
    Nat(u64),
    Str(Arc<str>),
    Name(Name),
}

pub type MDataMap = Vec<(Name, MDataValue)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bound variable (de Bruijn index, 0 = innermost)
    BVar(u32),
    FVar(Name),
    MVar(Name),
    Sort(Level),
    /// Constant with its universe instantiation
    Const(Name, Vec<Level>),
    App(Arc<Expr>, Arc<Expr>),
    Lam(Binder, Arc<Expr>, Arc<Expr>),
    Pi(Binder, Arc<Expr>, Arc<Expr>),
    /// `let x : ty := value; body`
    Let(Binder, Arc<Expr>, Arc<Expr>, Arc<Expr>),
    Lit(Literal),
    /// Metadata wrapper, transparent for everything downstream
    MData(MDataMap, Arc<Expr>),
    /// Structure projection: owning structure, field index, struct value
    Proj(Name, u32, Arc<Expr>),
}

impl Expr {
    pub fn bvar(idx: u32) -> Self {
        Expr::BVar(idx)
    }

    pub fn fvar(name: Name) -> Self {
        Expr::FVar(name)
    }

    pub fn mvar(name: Name) -> Self {
        Expr::MVar(name)
    }

    pub fn sort(level: Level) -> Self {
        Expr::Sort(level)
    }

    pub fn prop() -> Self {
        Expr::Sort(Level::zero())
    }

    pub fn const_(name: Name, levels: Vec<Level>) -> Self {
        Expr::Const(name, levels)
    }

    pub fn app(func: Expr, arg: Expr) -> Self {
        Expr::App(Arc::new(func), Arc::new(arg))
    }

    /// `f a1 ... an` as a left-nested application chain.
    pub fn app_n(func: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(func, Expr::app)
    }

    pub fn lam(binder: Binder, ty: Expr, body: Expr) -> Self {
        Expr::Lam(binder, Arc::new(ty), Arc::new(body))
    }

    pub fn pi(binder: Binder, ty: Expr, body: Expr) -> Self {
        Expr::Pi(binder, Arc::new(ty), Arc::new(body))
    }

    /// Non-dependent function type `a → b`.
    pub fn arrow(from: Expr, to: Expr) -> Self {
        Expr::pi(Binder::default(), from, to)
    }

    pub fn let_(binder: Binder, ty: Expr, value: Expr, body: Expr) -> Self {
        Expr::Let(binder, Arc::new(ty), Arc::new(value), Arc::new(body))
    }

    pub fn nat_lit(n: u64) -> Self {
        Expr::Lit(Literal::Nat(n))
    }

    pub fn str_lit(s: impl AsRef<str>) -> Self {
        Expr::Lit(Literal::Str(Arc::from(s.as_ref())))
    }

    pub fn mdata(metadata: MDataMap, expr: Expr) -> Self {
        Expr::MData(metadata, Arc::new(expr))
    }

    pub fn proj(struct_name: Name, idx: u32, expr: Expr) -> Self {
        Expr::Proj(struct_name, idx, Arc::new(expr))
    }

    /// Peel off any number of metadata wrappers.
    pub fn strip_mdata(&self) -> &Expr {
        let mut e = self;
        while let Expr::MData(_, inner) = e {
            e = inner.as_ref();
        }
        e
    }

    /// Head of an application spine, looking through metadata in function
    /// position.
    pub fn get_app_fn(&self) -> &Expr {
        let mut e = self.strip_mdata();
        while let Expr::App(f, _) = e {
            e = f.strip_mdata();
        }
        e
    }

    /// Arguments of an application spine, in application order.
    pub fn get_app_args(&self) -> Vec<&Expr> {
        let mut args = Vec::new();
        let mut e = self.strip_mdata();
        while let Expr::App(f, a) = e {
            args.push(a.as_ref());
            e = f.strip_mdata();
        }
        args.reverse();
        args
    }

    /// Leaf kinds are never tracked by the subterm counter.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::BVar(_)
                | Expr::FVar(_)
                | Expr::MVar(_)
                | Expr::Sort(_)
                | Expr::Const(..)
                | Expr::Lit(_)
        )
    }

    /// Direct children in field order.
    pub fn children(&self) -> Vec<&Arc<Expr>> {
        match self {
            Expr::BVar(_)
            | Expr::FVar(_)
            | Expr::MVar(_)
            | Expr::Sort(_)
            | Expr::Const(..)
            | Expr::Lit(_) => Vec::new(),
            Expr::App(f, a) => vec![f, a],
            Expr::Lam(_, ty, body) | Expr::Pi(_, ty, body) => vec![ty, body],
            Expr::Let(_, ty, value, body) => vec![ty, value, body],
            Expr::MData(_, inner) => vec![inner],
            Expr::Proj(_, _, s) => vec![s],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str) -> Expr {
        Expr::const_(Name::mk([name]), vec![])
    }

    #[test]
    fn app_spine_accessors() {
        let e = Expr::app_n(c("f"), [c("a"), c("b"), c("c")]);
        assert_eq!(e.get_app_fn(), &c("f"));
        assert_eq!(e.get_app_args(), vec![&c("a"), &c("b"), &c("c")]);
    }

    #[test]
    fn spine_looks_through_metadata_in_function_position() {
        let inner = Expr::app(c("f"), c("a"));
        let e = Expr::app(Expr::mdata(vec![], inner), c("b"));
        assert_eq!(e.get_app_fn(), &c("f"));
        assert_eq!(e.get_app_args(), vec![&c("a"), &c("b")]);
    }

    #[test]
    fn strip_mdata_removes_nested_wrappers() {
        let e = Expr::mdata(vec![], Expr::mdata(vec![], Expr::nat_lit(1)));
        assert_eq!(e.strip_mdata(), &Expr::nat_lit(1));
    }

    #[test]
    fn children_follow_field_order() {
        let e = Expr::let_(Binder::named("x"), c("T"), c("v"), Expr::bvar(0));
        let kids: Vec<&Expr> = e.children().into_iter().map(|k| k.as_ref()).collect();
        assert_eq!(kids, vec![&c("T"), &c("v"), &Expr::bvar(0)]);
        assert!(Expr::bvar(0).children().is_empty());
        assert!(c("T").is_leaf());
        assert!(!e.is_leaf());
    }
}
