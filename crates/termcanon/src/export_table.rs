//! JSON export tables: the host-side interchange for modules.
//!
//! Levels and terms are listed in flat tables and refer to each other by
//! index. An entry may only refer to entries *before* it, which keeps the
//! graph acyclic, and every reference to the same index resolves to the same
//! `Arc`, so sharing in the table is sharing in the rebuilt [`Expr`] DAG.
//!
//! ```json
//! {
//!   "module": "Demo",
//!   "levels": ["zero", {"succ": 0}, {"param": "u"}],
//!   "exprs": [
//!     {"sort": 1},
//!     {"const": {"name": "Nat", "levels": []}},
//!     {"app": [1, 1]},
//!     {"pi": {"binder": "x", "type": 1, "body": 1}}
//!   ],
//!   "declarations": [
//!     {"name": "Demo.id", "type": 3, "kind": {"definition": {"value": 2}}}
//!   ]
//! }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::decl::{DeclKind, Declaration, ModuleData, QuotKind};
use crate::expr::{Binder, BinderInfo, Expr, Literal, MDataValue};
use crate::level::Level;
use crate::name::Name;

#[derive(Debug, Error)]
pub enum ExportTableError {
    #[error("invalid export table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{table}[{at}] refers to {target_table}[{target}], which is not defined before it")]
    BadReference {
        table: &'static str,
        at: usize,
        target_table: &'static str,
        target: usize,
    },
    #[error("declarations[{at}].constructors[{ctor}] refers to exprs[{target}], which is not defined")]
    BadConstructorReference { at: usize, ctor: usize, target: usize },
}

pub type ExportTableResult<T> = Result<T, ExportTableError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTable {
    pub module: Name,
    #[serde(default)]
    pub levels: Vec<LevelEntry>,
    #[serde(default)]
    pub exprs: Vec<ExprEntry>,
    #[serde(default)]
    pub declarations: Vec<DeclEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelEntry {
    Zero,
    Succ(usize),
    Max(usize, usize),
    Imax(usize, usize),
    Param(Name),
    Mvar(Name),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinderEntry {
    #[serde(default)]
    pub binder: Name,
    #[serde(default)]
    pub info: BinderInfo,
    #[serde(rename = "type")]
    pub ty: usize,
    pub body: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MDataEntryValue {
    Bool(bool),
    Nat(u64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprEntry {
    Bvar(u32),
    Fvar(Name),
    Mvar(Name),
    Sort(usize),
    Const {
        name: Name,
        #[serde(default)]
        levels: Vec<usize>,
    },
    App(usize, usize),
    Lam(BinderEntry),
    Pi(BinderEntry),
    Let {
        #[serde(default)]
        binder: Name,
        #[serde(rename = "type")]
        ty: usize,
        value: usize,
        body: usize,
    },
    NatLit(u64),
    StrLit(String),
    Mdata {
        #[serde(default)]
        data: Vec<(Name, MDataEntryValue)>,
        expr: usize,
    },
    Proj {
        #[serde(rename = "struct")]
        struct_name: Name,
        idx: u32,
        expr: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclEntry {
    pub name: Name,
    #[serde(rename = "type")]
    pub ty: usize,
    pub kind: DeclKindEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKindEntry {
    Axiom,
    Definition { value: usize },
    Theorem { value: usize },
    Opaque { value: usize },
    Quot { kind: QuotKind, type_name: Name },
    Inductive {
        #[serde(default)]
        constructors: Vec<DeclEntry>,
    },
    Constructor { induct: Name },
    Recursor,
}

impl ExportTable {
    pub fn from_json(text: &str) -> ExportTableResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Rebuild the module, resolving every index reference.
    pub fn to_module(&self) -> ExportTableResult<ModuleData> {
        let levels = self.resolve_levels()?;
        let exprs = self.resolve_exprs(&levels)?;
        let declarations = self
            .declarations
            .iter()
            .enumerate()
            .map(|(at, d)| resolve_decl(d, at, None, &exprs))
            .collect::<ExportTableResult<Vec<_>>>()?;
        debug!(
            module = %self.module,
            levels = levels.len(),
            exprs = exprs.len(),
            declarations = declarations.len(),
            "loaded export table"
        );
        Ok(ModuleData::new(self.module.clone(), declarations))
    }

    fn resolve_levels(&self) -> ExportTableResult<Vec<Arc<Level>>> {
        let mut out: Vec<Arc<Level>> = Vec::with_capacity(self.levels.len());
        for (at, entry) in self.levels.iter().enumerate() {
            let get = |target: usize| lookup(&out, "levels", at, "levels", target);
            let level = match entry {
                LevelEntry::Zero => Level::Zero,
                LevelEntry::Succ(l) => Level::Succ(get(*l)?),
                LevelEntry::Max(l, r) => Level::Max(get(*l)?, get(*r)?),
                LevelEntry::Imax(l, r) => Level::IMax(get(*l)?, get(*r)?),
                LevelEntry::Param(n) => Level::Param(n.clone()),
                LevelEntry::Mvar(n) => Level::MVar(n.clone()),
            };
            out.push(Arc::new(level));
        }
        Ok(out)
    }

    fn resolve_exprs(&self, levels: &[Arc<Level>]) -> ExportTableResult<Vec<Arc<Expr>>> {
        let mut out: Vec<Arc<Expr>> = Vec::with_capacity(self.exprs.len());
        for (at, entry) in self.exprs.iter().enumerate() {
            let get = |target: usize| lookup(&out, "exprs", at, "exprs", target);
            let level =
                |target: usize| lookup(levels, "exprs", at, "levels", target).map(|l| (*l).clone());
            let expr = match entry {
                ExprEntry::Bvar(i) => Expr::BVar(*i),
                ExprEntry::Fvar(n) => Expr::FVar(n.clone()),
                ExprEntry::Mvar(n) => Expr::MVar(n.clone()),
                ExprEntry::Sort(l) => Expr::Sort(level(*l)?),
                ExprEntry::Const { name, levels } => Expr::Const(
                    name.clone(),
                    levels
                        .iter()
                        .map(|l| level(*l))
                        .collect::<ExportTableResult<Vec<_>>>()?,
                ),
                ExprEntry::App(f, a) => Expr::App(get(*f)?, get(*a)?),
                ExprEntry::Lam(b) => Expr::Lam(binder(b), get(b.ty)?, get(b.body)?),
                ExprEntry::Pi(b) => Expr::Pi(binder(b), get(b.ty)?, get(b.body)?),
                ExprEntry::Let {
                    binder,
                    ty,
                    value,
                    body,
                } => Expr::Let(
                    Binder::new(binder.clone(), BinderInfo::Default),
                    get(*ty)?,
                    get(*value)?,
                    get(*body)?,
                ),
                ExprEntry::NatLit(n) => Expr::Lit(Literal::Nat(*n)),
                ExprEntry::StrLit(s) => Expr::Lit(Literal::Str(Arc::from(s.as_str()))),
                ExprEntry::Mdata { data, expr } => Expr::MData(
                    data.iter()
                        .map(|(k, v)| (k.clone(), mdata_value(v)))
                        .collect(),
                    get(*expr)?,
                ),
                ExprEntry::Proj {
                    struct_name,
                    idx,
                    expr,
                } => Expr::Proj(struct_name.clone(), *idx, get(*expr)?),
            };
            out.push(Arc::new(expr));
        }
        Ok(out)
    }
}

pub fn load_module_json(text: &str) -> ExportTableResult<ModuleData> {
    ExportTable::from_json(text)?.to_module()
}

fn lookup<T>(
    defined: &[Arc<T>],
    table: &'static str,
    at: usize,
    target_table: &'static str,
    target: usize,
) -> ExportTableResult<Arc<T>> {
    defined
        .get(target)
        .cloned()
        .ok_or(ExportTableError::BadReference {
            table,
            at,
            target_table,
            target,
        })
}

fn binder(entry: &BinderEntry) -> Binder {
    Binder::new(entry.binder.clone(), entry.info)
}

fn mdata_value(v: &MDataEntryValue) -> MDataValue {
    match v {
        MDataEntryValue::Bool(b) => MDataValue::Bool(*b),
        MDataEntryValue::Nat(n) => MDataValue::Nat(*n),
        MDataEntryValue::Str(s) => MDataValue::Str(Arc::from(s.as_str())),
    }
}

/// `ctor` is the position inside the parent's constructor list, for error
/// reporting.
fn resolve_decl(
    entry: &DeclEntry,
    at: usize,
    ctor: Option<usize>,
    exprs: &[Arc<Expr>],
) -> ExportTableResult<Declaration> {
    let get = |target: usize| match ctor {
        None => lookup(exprs, "declarations", at, "exprs", target),
        Some(ctor) => exprs
            .get(target)
            .cloned()
            .ok_or(ExportTableError::BadConstructorReference { at, ctor, target }),
    };
    let kind = match &entry.kind {
        DeclKindEntry::Axiom => DeclKind::Axiom,
        DeclKindEntry::Definition { value } => DeclKind::Definition { value: get(*value)? },
        DeclKindEntry::Theorem { value } => DeclKind::Theorem { value: get(*value)? },
        DeclKindEntry::Opaque { value } => DeclKind::Opaque { value: get(*value)? },
        DeclKindEntry::Quot { kind, type_name } => DeclKind::Quot {
            kind: *kind,
            type_name: type_name.clone(),
        },
        DeclKindEntry::Inductive { constructors } => DeclKind::Inductive {
            constructors: constructors
                .iter()
                .enumerate()
                .map(|(i, c)| resolve_decl(c, at, Some(i), exprs))
                .collect::<ExportTableResult<Vec<_>>>()?,
        },
        DeclKindEntry::Constructor { induct } => DeclKind::Constructor {
            induct: induct.clone(),
        },
        DeclKindEntry::Recursor => DeclKind::Recursor,
    };
    Ok(Declaration {
        name: entry.name.clone(),
        ty: get(entry.ty)?,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_expr;

    const DEMO: &str = r#"{
        "module": "Demo",
        "levels": ["zero", {"succ": 0}, {"param": "u"}, {"max": [1, 2]}],
        "exprs": [
            {"sort": 3},
            {"const": {"name": "Nat", "levels": []}},
            {"app": [1, 1]},
            {"pi": {"binder": "x", "info": "implicit", "type": 1, "body": 1}},
            {"nat_lit": 42},
            {"mdata": {"data": [["k", true]], "expr": 4}},
            {"proj": {"struct": "Prod", "idx": 0, "expr": 2}}
        ],
        "declarations": [
            {"name": "Demo.id", "type": 3, "kind": {"definition": {"value": 2}}},
            {"name": "Demo.ax", "type": 0, "kind": "axiom"},
            {"name": "Demo.T", "type": 0, "kind": {"inductive": {"constructors": [
                {"name": "Demo.T.mk", "type": 1, "kind": {"constructor": {"induct": "Demo.T"}}}
            ]}}},
            {"name": "Quot.lift", "type": 0, "kind": {"quot": {"kind": "lift", "type_name": "Quot"}}}
        ]
    }"#;

    #[test]
    fn loads_every_entry_kind() {
        let module = load_module_json(DEMO).expect("load");
        assert_eq!(module.name, Name::mk(["Demo"]));
        assert_eq!(module.declarations.len(), 4);
        assert_eq!(module.declarations[1].kind, DeclKind::Axiom);

        let DeclKind::Inductive { constructors } = &module.declarations[2].kind else {
            panic!("inductive expected");
        };
        assert_eq!(constructors[0].name, Name::mk(["Demo", "T", "mk"]));

        let DeclKind::Quot { kind, .. } = &module.declarations[3].kind else {
            panic!("quot expected");
        };
        assert_eq!(*kind, QuotKind::Lift);
    }

    #[test]
    fn references_to_one_index_share_one_arc() {
        let module = load_module_json(DEMO).expect("load");
        let DeclKind::Definition { value } = &module.declarations[0].kind else {
            panic!("definition expected");
        };
        let Expr::App(f, a) = value.as_ref() else {
            panic!("app expected");
        };
        assert!(Arc::ptr_eq(f, a));

        let Expr::Pi(binder, ty, _) = module.declarations[0].ty.as_ref() else {
            panic!("pi expected");
        };
        assert!(Arc::ptr_eq(ty, f));
        assert_eq!(binder.info, BinderInfo::Implicit);
    }

    #[test]
    fn metadata_entries_survive_loading_but_not_encoding() {
        let table = ExportTable::from_json(DEMO).unwrap();
        let exprs = table.resolve_exprs(&table.resolve_levels().unwrap()).unwrap();
        assert!(matches!(exprs[5].as_ref(), Expr::MData(data, _) if data.len() == 1));
        assert_eq!(encode_expr(&exprs[5]), encode_expr(&exprs[4]));
    }

    #[test]
    fn forward_references_are_rejected() {
        let text = r#"{"module": "M", "exprs": [{"app": [0, 0]}]}"#;
        let err = load_module_json(text).unwrap_err();
        assert!(matches!(
            err,
            ExportTableError::BadReference {
                table: "exprs",
                at: 0,
                target_table: "exprs",
                target: 0
            }
        ));
    }

    #[test]
    fn dangling_declaration_references_are_rejected() {
        let text = r#"{"module": "M", "declarations": [{"name": "x", "type": 7, "kind": "axiom"}]}"#;
        let err = load_module_json(text).unwrap_err();
        assert!(err.to_string().contains("declarations[0] refers to exprs[7]"));
    }

    #[test]
    fn bad_names_surface_as_json_errors() {
        let text = r#"{"module": "M..N"}"#;
        assert!(matches!(load_module_json(text), Err(ExportTableError::Json(_))));
    }

    #[test]
    fn constructor_references_name_the_constructor() {
        let text = r#"{
            "module": "M",
            "exprs": [{"bvar": 0}],
            "declarations": [
                {"name": "a", "type": 0, "kind": "axiom"},
                {"name": "T", "type": 0, "kind": {"inductive": {"constructors": [
                    {"name": "T.mk", "type": 0, "kind": {"constructor": {"induct": "T"}}},
                    {"name": "T.bad", "type": 5, "kind": {"constructor": {"induct": "T"}}}
                ]}}}
            ]
        }"#;
        let err = load_module_json(text).unwrap_err();
        assert!(matches!(
            err,
            ExportTableError::BadConstructorReference { at: 1, ctor: 1, target: 5 }
        ));
        assert!(err
            .to_string()
            .starts_with("declarations[1].constructors[1] refers to exprs[5]"));
    }
}
