//! Canonical s-expression export of compiled terms.
//!
//! The host compiler hands over an immutable term IR ([`Expr`], [`Level`],
//! [`Name`]) and a declaration table ([`ModuleData`]); this crate maps it to a
//! deterministic tagged s-expression ([`Sexp`]) suitable for downstream
//! tooling:
//!
//! ```text
//! (:module (:module-name <name>) (:definition <name> <type> <payload>) ...)
//! ```
//!
//! Encoding is total and pure. [`sharing`] is a separate memoized pass that
//! measures how much the term DAG is shared; it does not affect the output.
//!
//! [`export_table`] is the JSON interchange used when the terms come from a
//! file instead of an in-process host.

pub mod decl;
pub mod digest;
pub mod encode;
pub mod export_table;
pub mod expr;
pub mod level;
pub mod module;
pub mod name;
pub mod sexp;
pub mod sharing;

pub use decl::{DeclKind, Declaration, ModuleData, QuotKind};
pub use encode::{encode_declaration, encode_expr, encode_level, encode_name, ToSexp};
pub use expr::{Binder, BinderInfo, Expr, Literal, MDataMap, MDataValue};
pub use level::Level;
pub use module::{encode_module, is_exported, InternalPrefix, ModuleEncoder, NameVisibility};
pub use name::{Name, NameParseError, NameView, Segment};
pub use sexp::Sexp;
pub use sharing::{count_subterms, ExprId, SharingReport, SubtermTally};
