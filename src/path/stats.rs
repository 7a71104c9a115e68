//! Per-path value statistics: occurrence counts, numeric ranges, and the
//! inferred value kind with its bounded category histogram.

use rustc_hash::FxHashMap;

use crate::primitives::bytes::{buf::Cursor, token, vnum};
use crate::types::{Result, XylemError};

use super::SummaryOptions;

/// Inferred kind of the values observed under one path.
///
/// Kinds only ever move forward through this ordering; once a path has been
/// classified as [`ValueKind::Text`] it never reverts.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ValueKind {
    /// All values parsed as integers.
    Integer = 0,
    /// All values parsed as doubles.
    Double = 1,
    /// Values form a small set of distinct strings.
    Category = 2,
    /// Arbitrary text.
    Text = 3,
}

impl ValueKind {
    /// Returns the persisted ordinal.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    fn try_from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ValueKind::Integer),
            1 => Ok(ValueKind::Double),
            2 => Ok(ValueKind::Category),
            3 => Ok(ValueKind::Text),
            _ => Err(XylemError::Corruption("unknown value kind ordinal")),
        }
    }

    /// True for kinds that carry a meaningful numeric range.
    pub fn numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Double)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::Category => "category",
            ValueKind::Text => "text",
        };
        f.write_str(label)
    }
}

/// Insertion-ordered histogram of distinct values with occurrence counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Categories {
    index: FxHashMap<String, usize>,
    entries: Vec<(String, u32)>,
}

impl Categories {
    fn new() -> Self {
        Self::default()
    }

    /// Folds one value in. Returns `false` if admitting the value would grow
    /// the histogram beyond `max`; the histogram is left unchanged in that
    /// case and the caller is expected to drop it.
    fn add(&mut self, value: &str, max: usize) -> bool {
        if let Some(&slot) = self.index.get(value) {
            self.entries[slot].1 = self.entries[slot].1.saturating_add(1);
            return true;
        }
        if self.entries.len() >= max {
            return false;
        }
        self.index.insert(value.to_string(), self.entries.len());
        self.entries.push((value.to_string(), 1));
        true
    }

    /// Number of distinct values tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no values have been tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Occurrence count of one value.
    pub fn get(&self, value: &str) -> Option<u32> {
        self.index.get(value).map(|&slot| self.entries[slot].1)
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(v, n)| (v.as_str(), *n))
    }
}

/// Statistics attached to one path node.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueStats {
    /// Number of occurrences of the path.
    pub count: u32,
    kind: ValueKind,
    /// Smallest numeric value observed.
    pub min: f64,
    /// Largest numeric value observed.
    pub max: f64,
    /// Longest observed value in bytes.
    pub max_len: usize,
    categories: Option<Categories>,
}

impl Default for ValueStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueStats {
    /// Creates empty statistics in the initial [`ValueKind::Integer`] state.
    pub fn new() -> Self {
        Self {
            count: 0,
            kind: ValueKind::Integer,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            max_len: 0,
            categories: Some(Categories::new()),
        }
    }

    /// Current inferred value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The category histogram, if still being tracked.
    pub fn categories(&self) -> Option<&Categories> {
        self.categories.as_ref()
    }

    /// Folds one observed value into the inference state.
    ///
    /// The histogram is maintained from the first value on, whatever the
    /// current kind, so a later downgrade to [`ValueKind::Category`] sees a
    /// complete value set. Overflowing `max_categories` drops the histogram
    /// for good; from the category state that also forces
    /// [`ValueKind::Text`].
    pub fn add(&mut self, value: &str, opts: &SummaryOptions) {
        self.max_len = self.max_len.max(value.len());

        if let Some(cats) = &mut self.categories {
            if !cats.add(value, opts.max_categories) {
                self.categories = None;
                if self.kind == ValueKind::Category {
                    self.kind = ValueKind::Text;
                }
            }
        }

        let trimmed = value.trim();
        if self.kind == ValueKind::Integer {
            if let Ok(n) = trimmed.parse::<i64>() {
                self.extend(n as f64);
                return;
            }
            self.kind = ValueKind::Double;
        }
        if self.kind == ValueKind::Double {
            if let Ok(d) = trimmed.parse::<f64>() {
                self.extend(d);
                return;
            }
            if self.categories.is_some() {
                self.kind = ValueKind::Category;
            } else {
                self.kind = ValueKind::Text;
            }
        }
    }

    fn extend(&mut self, d: f64) {
        if d < self.min {
            self.min = d;
        }
        if d > self.max {
            self.max = d;
        }
    }

    /// Writes everything but the occurrence count (which the owning node
    /// serializes in its fixed position).
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        vnum::encode(u32::from(self.kind.as_u8()), out);
        if self.kind.numeric() {
            token::put(fmt_num(self.min).as_bytes(), out);
            token::put(fmt_num(self.max).as_bytes(), out);
        }
        vnum::encode(self.max_len as u32, out);
        if self.kind == ValueKind::Category {
            let cats = self.categories.as_ref().expect("category kind keeps its histogram");
            vnum::encode(cats.len() as u32, out);
            for (value, count) in cats.iter() {
                token::put(value.as_bytes(), out);
                vnum::encode(count, out);
            }
        }
    }

    /// Reads the counterpart of [`ValueStats::write`].
    pub(crate) fn read(count: u32, cur: &mut Cursor<'_>) -> Result<Self> {
        let ordinal = vnum::decode(cur)?;
        let kind = ValueKind::try_from_u8(u8::try_from(ordinal).map_err(|_| {
            XylemError::Corruption("value kind ordinal out of range")
        })?)?;
        let (min, max) = if kind.numeric() {
            (read_num(cur)?, read_num(cur)?)
        } else {
            (f64::INFINITY, f64::NEG_INFINITY)
        };
        let max_len = vnum::decode(cur)? as usize;
        let categories = if kind == ValueKind::Category {
            let len = vnum::decode(cur)? as usize;
            let mut cats = Categories::new();
            for _ in 0..len {
                let value = token::take_str(cur)?;
                let count = vnum::decode(cur)?;
                let slot = cats.entries.len();
                if cats.index.insert(value.to_string(), slot).is_some() {
                    return Err(XylemError::Corruption("duplicate category value"));
                }
                cats.entries.push((value.to_string(), count));
            }
            Some(cats)
        } else {
            None
        };
        Ok(Self {
            count,
            kind,
            min,
            max,
            max_len,
            categories,
        })
    }
}

/// Formats a numeric bound as canonical decimal text: integral values without
/// a trailing fraction, everything else in the shortest round-tripping form.
fn fmt_num(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn read_num(cur: &mut Cursor<'_>) -> Result<f64> {
    let offset = cur.offset();
    token::take_str(cur)?
        .parse::<f64>()
        .map_err(|_| XylemError::CorruptionAt {
            offset,
            reason: "malformed numeric bound",
        })
}
