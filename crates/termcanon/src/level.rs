//! Universe levels.
//!
//! ```text
//! inductive Level where
//!   | zero
//!   | succ  (l : Level)
//!   | max   (l r : Level)
//!   | imax  (l r : Level)
//!   | param (name : Name)
//!   | mvar  (name : Name)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::name::Name;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Zero,
    Succ(Arc<Level>),
    Max(Arc<Level>, Arc<Level>),
    IMax(Arc<Level>, Arc<Level>),
    Param(Name),
    MVar(Name),
}

impl Level {
    pub fn zero() -> Self {
        Level::Zero
    }

    pub fn succ(l: Level) -> Self {
        Level::Succ(Arc::new(l))
    }

    pub fn max(l: Level, r: Level) -> Self {
        Level::Max(Arc::new(l), Arc::new(r))
    }

    pub fn imax(l: Level, r: Level) -> Self {
        Level::IMax(Arc::new(l), Arc::new(r))
    }

    pub fn param(name: Name) -> Self {
        Level::Param(name)
    }

    pub fn mvar(name: Name) -> Self {
        Level::MVar(name)
    }

    /// `succ^n zero`
    pub fn of_nat(n: u32) -> Self {
        (0..n).fold(Level::Zero, |l, _| Level::succ(l))
    }

    pub fn depth(&self) -> usize {
        match self {
            Level::Zero | Level::Param(_) | Level::MVar(_) => 0,
            Level::Succ(l) => 1 + l.depth(),
            Level::Max(l, r) | Level::IMax(l, r) => 1 + l.depth().max(r.depth()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Zero => write!(f, "0"),
            Level::Succ(l) => {
                // Collapse `succ (succ zero)` into `2`.
                let mut inner = l.as_ref();
                let mut count = 1u64;
                while let Level::Succ(next) = inner {
                    count += 1;
                    inner = next;
                }
                if let Level::Zero = inner {
                    write!(f, "{count}")
                } else {
                    write!(f, "(succ {l})")
                }
            }
            Level::Max(l, r) => write!(f, "(max {l} {r})"),
            Level::IMax(l, r) => write!(f, "(imax {l} {r})"),
            Level::Param(n) => write!(f, "{n}"),
            Level::MVar(n) => write!(f, "?{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerals_collapse_in_display() {
        assert_eq!(Level::of_nat(0).to_string(), "0");
        assert_eq!(Level::of_nat(3).to_string(), "3");
        let u = Level::param(Name::mk(["u"]));
        assert_eq!(Level::succ(u.clone()).to_string(), "(succ u)");
        assert_eq!(Level::imax(u, Level::zero()).to_string(), "(imax u 0)");
    }

    #[test]
    fn depth_follows_the_longest_branch() {
        let l = Level::max(Level::of_nat(2), Level::param(Name::mk(["v"])));
        assert_eq!(l.depth(), 3);
    }
}
