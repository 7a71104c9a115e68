//! Cost algebra over expected result counts.

use std::cmp::Ordering;
use std::fmt;

/// Expected number of results of probing an index, or a sentinel mandating
/// index use when no estimate exists.
///
/// Sentinels absorb through [`IndexCosts::combine`]: once any side of a
/// combination is enforced, the result is [`IndexCosts::EnforceDynamic`].
/// Ordering places the sentinels below every concrete count so that picking
/// the cheapest of several candidate accesses always selects an enforced one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IndexCosts {
    /// Index use is mandated; the decision was made at compile time,
    /// independent of any run-time value.
    EnforceStatic,
    /// Index use is mandated; the probe value is only known at run time.
    EnforceDynamic,
    /// Concrete estimate: 0 proves an empty result, smaller is cheaper.
    Results(u64),
}

impl IndexCosts {
    /// The provably-empty result.
    pub const ZERO: IndexCosts = IndexCosts::Results(0);

    /// Constructs a concrete cost from an expected result count.
    ///
    /// A negative count is a programming error, not a recoverable condition.
    pub fn of(results: i64) -> Self {
        assert!(results >= 0, "negative result estimate: {results}");
        IndexCosts::Results(results as u64)
    }

    /// The concrete estimate, absent for enforcement sentinels.
    pub fn results(self) -> Option<u64> {
        match self {
            IndexCosts::Results(n) => Some(n),
            _ => None,
        }
    }

    /// True for the enforcement sentinels.
    pub fn enforced(self) -> bool {
        !matches!(self, IndexCosts::Results(_))
    }

    /// Merges the costs of two probe values evaluated against the same index.
    /// Concrete counts add (saturating); anything involving a sentinel stays
    /// enforced with an unknown estimate.
    pub fn combine(a: IndexCosts, b: IndexCosts) -> IndexCosts {
        match (a, b) {
            (IndexCosts::Results(x), IndexCosts::Results(y)) => {
                IndexCosts::Results(x.saturating_add(y))
            }
            _ => IndexCosts::EnforceDynamic,
        }
    }

    /// True when probing would visit more entries than scanning all `total`
    /// nodes. A soft veto: rewriting stays possible, just not worthwhile.
    pub fn too_expensive(self, total: u64) -> bool {
        matches!(self, IndexCosts::Results(n) if n > total)
    }

    fn order_key(self) -> i128 {
        match self {
            IndexCosts::EnforceDynamic => -2,
            IndexCosts::EnforceStatic => -1,
            IndexCosts::Results(n) => i128::from(n),
        }
    }
}

impl Ord for IndexCosts {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for IndexCosts {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IndexCosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexCosts::EnforceStatic | IndexCosts::EnforceDynamic => f.write_str("enforced"),
            IndexCosts::Results(n) => write!(f, "{n}"),
        }
    }
}
