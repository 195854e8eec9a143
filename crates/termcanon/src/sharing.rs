//! Subterm frequency counter.
//!
//! A memoized pass over a term DAG that records how often each internal node
//! is reached again after its first visit. Revisited nodes are not descended
//! into, so the cost is bounded by the number of distinct nodes instead of the
//! number of paths.
//!
//! Node identity is the `Arc` allocation, not structural equality: comparing
//! shared subterms by content would reintroduce the path blowup. The tally
//! keeps a clone of every tracked `Arc`, so an address cannot be freed and
//! reused by a different node while the tally is alive.
//!
//! The counter is an analysis utility. It never changes what
//! [`crate::encode`] emits.

use std::sync::Arc;

use ahash::AHashMap;

use crate::expr::Expr;

/// Allocation identity of a shared term node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn of(expr: &Arc<Expr>) -> Self {
        ExprId(Arc::as_ptr(expr) as usize)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    expr: Arc<Expr>,
    count: u64,
    /// Position in first-visit order.
    order: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SubtermTally {
    entries: AHashMap<ExprId, Entry>,
    expansions: usize,
}

impl SubtermTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revisit count for `expr`; `None` if it was never tracked (leaves, or
    /// nodes outside the counted terms).
    pub fn count(&self, expr: &Arc<Expr>) -> Option<u64> {
        self.entries.get(&ExprId::of(expr)).map(|e| e.count)
    }

    /// Number of tracked internal nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes whose children were traversed. Equals [`Self::len`];
    /// exposed separately so callers can check the bound directly.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Sum of all revisit counts.
    pub fn total_revisits(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Nodes reached at least twice, in first-visit order.
    pub fn shared(&self) -> Vec<(&Arc<Expr>, u64)> {
        let mut out: Vec<&Entry> = self.entries.values().filter(|e| e.count > 0).collect();
        out.sort_by_key(|e| e.order);
        out.into_iter().map(|e| (&e.expr, e.count)).collect()
    }

    /// Summary with the `top_k` most revisited nodes (ties keep first-visit
    /// order).
    pub fn report(&self, top_k: usize) -> SharingReport {
        let mut shared = self.shared();
        shared.sort_by(|a, b| b.1.cmp(&a.1));
        SharingReport {
            tracked: self.len(),
            shared: shared.len(),
            total_revisits: self.total_revisits(),
            top: shared
                .into_iter()
                .take(top_k)
                .map(|(e, count)| (Arc::clone(e), count))
                .collect(),
        }
    }

    fn visit(&mut self, term: &Arc<Expr>) {
        let id = ExprId::of(term);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.count += 1;
            return;
        }
        if term.is_leaf() {
            return;
        }
        let order = self.entries.len();
        self.entries.insert(
            id,
            Entry {
                expr: Arc::clone(term),
                count: 0,
                order,
            },
        );
        self.expansions += 1;
        for child in term.children() {
            self.visit(child);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SharingReport {
    pub tracked: usize,
    pub shared: usize,
    pub total_revisits: u64,
    pub top: Vec<(Arc<Expr>, u64)>,
}

/// Fold one term into the tally. Seed with [`SubtermTally::new`]; thread the
/// result through further calls to count several roots together.
pub fn count_subterms(mut tally: SubtermTally, term: &Arc<Expr>) -> SubtermTally {
    tally.visit(term);
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Binder;
    use crate::name::Name;

    fn c(name: &str) -> Arc<Expr> {
        Arc::new(Expr::const_(Name::mk([name]), vec![]))
    }

    fn pi(ty: &Arc<Expr>, body: &Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Pi(Binder::default(), Arc::clone(ty), Arc::clone(body)))
    }

    #[test]
    fn leaves_are_not_tracked() {
        let leaf = c("Nat");
        let t = pi(&leaf, &leaf);
        let tally = count_subterms(SubtermTally::new(), &t);
        assert_eq!(tally.len(), 1);
        assert_eq!(tally.count(&leaf), None);
        assert_eq!(tally.count(&t), Some(0));
    }

    #[test]
    fn shared_node_counts_revisits_and_is_expanded_once() {
        let inner = pi(&c("A"), &c("B"));
        let t = Arc::new(Expr::App(Arc::clone(&inner), Arc::clone(&inner)));
        let tally = count_subterms(SubtermTally::new(), &t);
        assert_eq!(tally.count(&inner), Some(1));
        assert_eq!(tally.expansions(), 2);
        assert_eq!(tally.shared().len(), 1);
    }

    #[test]
    fn structurally_equal_but_distinct_nodes_are_separate_keys() {
        let a = pi(&c("A"), &c("B"));
        let b = pi(&c("A"), &c("B"));
        assert_eq!(a, b);
        let t = Arc::new(Expr::App(Arc::clone(&a), Arc::clone(&b)));
        let tally = count_subterms(SubtermTally::new(), &t);
        assert_eq!(tally.count(&a), Some(0));
        assert_eq!(tally.count(&b), Some(0));
        assert_eq!(tally.len(), 3);
    }

    #[test]
    fn tally_threads_through_several_roots() {
        let shared = pi(&c("A"), &c("B"));
        let r1 = Arc::new(Expr::MData(vec![], Arc::clone(&shared)));
        let r2 = Arc::new(Expr::Proj(Name::mk(["S"]), 0, Arc::clone(&shared)));
        let tally = count_subterms(count_subterms(SubtermTally::new(), &r1), &r2);
        assert_eq!(tally.count(&shared), Some(1));
        assert_eq!(tally.len(), 3);
    }

    #[test]
    fn report_orders_by_revisits() {
        let x = pi(&c("X"), &c("X"));
        let y = pi(&c("Y"), &c("Y"));
        let body = Arc::new(Expr::Let(
            Binder::default(),
            Arc::clone(&x),
            Arc::clone(&y),
            Arc::new(Expr::App(Arc::clone(&y), Arc::clone(&x))),
        ));
        let t = Arc::new(Expr::App(Arc::clone(&body), Arc::clone(&y)));
        let report = count_subterms(SubtermTally::new(), &t).report(1);
        assert_eq!(report.shared, 2);
        assert_eq!(report.total_revisits, 3);
        assert_eq!(report.top.len(), 1);
        assert!(Arc::ptr_eq(&report.top[0].0, &y));
        assert_eq!(report.top[0].1, 2);
    }
}
