//! Module listings and the visibility filter.

use tracing::debug;

use crate::decl::{Declaration, ModuleData};
use crate::encode::{encode_name, ToSexp};
use crate::name::{Name, NameView};
use crate::sexp::Sexp;

/// Host predicate marking string-rooted names as compiler-generated.
pub trait NameVisibility {
    fn is_internal(&self, name: &Name) -> bool;
}

impl<F: Fn(&Name) -> bool> NameVisibility for F {
    fn is_internal(&self, name: &Name) -> bool {
        self(name)
    }
}

/// Default predicate: any string segment starting with `_`
/// (`_private`, `_cstage1`, `_auxLemma`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalPrefix;

impl NameVisibility for InternalPrefix {
    fn is_internal(&self, name: &Name) -> bool {
        name.is_internal()
    }
}

/// Anonymous and numeric-rooted names are always kept; string-rooted names
/// are kept unless the host flags them internal.
pub fn is_exported(name: &Name, visibility: &impl NameVisibility) -> bool {
    match name.view() {
        NameView::Anonymous | NameView::Num(..) => true,
        NameView::Str(..) => !visibility.is_internal(name),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleEncoder<V = InternalPrefix> {
    visibility: V,
    include_internal: bool,
}

impl ModuleEncoder<InternalPrefix> {
    pub fn new() -> Self {
        ModuleEncoder::default()
    }
}

impl<V: NameVisibility> ModuleEncoder<V> {
    pub fn with_visibility(visibility: V) -> Self {
        ModuleEncoder {
            visibility,
            include_internal: false,
        }
    }

    /// Skip the visibility filter entirely.
    pub fn include_internal(mut self, yes: bool) -> Self {
        self.include_internal = yes;
        self
    }

    pub fn keeps(&self, decl: &Declaration) -> bool {
        self.include_internal || is_exported(&decl.name, &self.visibility)
    }

    pub fn kept<'m>(&'m self, module: &'m ModuleData) -> impl Iterator<Item = &'m Declaration> + 'm {
        module.declarations.iter().filter(move |d| self.keeps(d))
    }

    /// `(:module (:module-name <name>) <definition>...)`, table order preserved.
    pub fn encode(&self, module: &ModuleData) -> Sexp {
        encode_kept(module, self.kept(module))
    }
}

pub fn encode_module(module: &ModuleData, visibility: &impl NameVisibility) -> Sexp {
    encode_kept(
        module,
        module
            .declarations
            .iter()
            .filter(|d| is_exported(&d.name, visibility)),
    )
}

fn encode_kept<'m>(module: &ModuleData, kept: impl Iterator<Item = &'m Declaration>) -> Sexp {
    let mut items = vec![Sexp::constr("module-name", [encode_name(&module.name)])];
    items.extend(kept.map(ToSexp::to_sexp));
    debug!(
        module = %module.name,
        total = module.declarations.len(),
        kept = items.len() - 1,
        "encoded module"
    );
    Sexp::constr("module", items)
}
