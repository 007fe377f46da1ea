//! # Interval Algebra
//!
//! Closed/open bounded intervals over a totally ordered [`Value`](crate::value::Value)
//! domain with ±∞ sentinels.
//!
//! Rather than the stringly-typed `(lo, lop, rop, hi)` 4-tuple described in
//! the CPrefSQL original, `Interval` is a tagged sum type — `Equal`,
//! `NotEqual`, or `Range` — so overlap and split logic pattern-match
//! exhaustively instead of branching on operator strings (see DESIGN.md).
//! The three canonical forms still line up with the tuple notation:
//!   - Equality:    `(v, =, =, v)`   → `Interval::Equal(v)`
//!   - Disequality: `(v, <>, <>, v)` → `Interval::NotEqual(v)`
//!   - Range:       `(lo, op, op, hi)` → `Interval::Range { .. }`

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One endpoint of a range interval: a finite value or a ±∞ sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    NegInf,
    Finite(Value),
    PosInf,
}

impl Endpoint {
    pub fn finite(&self) -> Option<&Value> {
        match self {
            Endpoint::Finite(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::NegInf => write!(f, "-INF"),
            Endpoint::PosInf => write!(f, "+INF"),
            Endpoint::Finite(v) => write!(f, "{v}"),
        }
    }
}

/// -∞ is never "after" anything; +∞ is never "before" anything; all other
/// comparisons reduce to `Value` ordering. Cross-variant `Value`s (which
/// never occur in a well-formed theory) compare as unordered.
impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Endpoint::NegInf, Endpoint::NegInf) => Some(Ordering::Equal),
            (Endpoint::NegInf, _) => Some(Ordering::Less),
            (_, Endpoint::NegInf) => Some(Ordering::Greater),
            (Endpoint::PosInf, Endpoint::PosInf) => Some(Ordering::Equal),
            (Endpoint::PosInf, _) => Some(Ordering::Greater),
            (_, Endpoint::PosInf) => Some(Ordering::Less),
            (Endpoint::Finite(a), Endpoint::Finite(b)) => a.partial_cmp(b),
        }
    }
}

/// Strictness of a range endpoint operator: `<` (exclusive) or `<=`
/// (inclusive). `=` and `<>` only ever appear on degenerate single-point
/// intervals and are represented by `Interval::Equal`/`Interval::NotEqual`
/// instead of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeOp {
    Lt,
    Le,
}

impl RangeOp {
    pub fn includes_equal(self) -> bool {
        matches!(self, RangeOp::Le)
    }

    /// The complementary operator across a cut point: a boundary that was
    /// included on one side of a split must be excluded on the other.
    pub fn flip(self) -> RangeOp {
        match self {
            RangeOp::Lt => RangeOp::Le,
            RangeOp::Le => RangeOp::Lt,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RangeOp::Lt => "<",
            RangeOp::Le => "<=",
        }
    }
}

/// A closed/open bounded interval, or one of its two degenerate forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// `(v, =, =, v)`
    Equal(Value),
    /// `(v, <>, <>, v)`, interpreted as the whole domain minus `{v}`.
    NotEqual(Value),
    /// `(lo, lo_op, hi_op, hi)` with `lo < hi` (equal endpoints always
    /// collapse to `Equal` — see [`Interval::range`]).
    Range {
        lo: Endpoint,
        lo_op: RangeOp,
        hi_op: RangeOp,
        hi: Endpoint,
    },
}

impl Interval {
    pub fn equal(v: Value) -> Self {
        Interval::Equal(v)
    }

    pub fn not_equal(v: Value) -> Self {
        Interval::NotEqual(v)
    }

    /// `A < v` → `(-∞, <=, <, v)`
    pub fn less_than(v: Value) -> Self {
        Interval::Range {
            lo: Endpoint::NegInf,
            lo_op: RangeOp::Le,
            hi_op: RangeOp::Lt,
            hi: Endpoint::Finite(v),
        }
    }

    /// `A <= v` → `(-∞, <=, <=, v)`
    pub fn less_equal(v: Value) -> Self {
        Interval::Range {
            lo: Endpoint::NegInf,
            lo_op: RangeOp::Le,
            hi_op: RangeOp::Le,
            hi: Endpoint::Finite(v),
        }
    }

    /// `A > v` → `(v, <, <=, +∞)`
    pub fn greater_than(v: Value) -> Self {
        Interval::Range {
            lo: Endpoint::Finite(v),
            lo_op: RangeOp::Lt,
            hi_op: RangeOp::Le,
            hi: Endpoint::PosInf,
        }
    }

    /// `A >= v` → `(v, <=, <=, +∞)`
    pub fn greater_equal(v: Value) -> Self {
        Interval::Range {
            lo: Endpoint::Finite(v),
            lo_op: RangeOp::Le,
            hi_op: RangeOp::Le,
            hi: Endpoint::PosInf,
        }
    }

    /// General `x op1 A op2 y` range form. Collapses to `Equal` when
    /// `lo == hi` (the invariant in spec §3: a range with equal endpoints
    /// must be the equality form).
    pub fn range(lo: Endpoint, lo_op: RangeOp, hi_op: RangeOp, hi: Endpoint) -> Self {
        make_range(lo, lo_op, hi_op, hi).unwrap_or_else(|| {
            // Only reachable for malformed input (lo > hi); fall back to
            // the degenerate empty-at-lo equality so callers never panic.
            Interval::Range {
                lo: Endpoint::NegInf,
                lo_op: RangeOp::Le,
                hi_op: RangeOp::Lt,
                hi: Endpoint::NegInf,
            }
        })
    }

    /// Render as `{lo}{lop}{attribute}{rop}{hi}`, matching the canonical
    /// predicate string used for rule/formula/comparison equality and
    /// hashing (spec §3).
    pub fn to_predicate_string(&self, attribute: &str) -> String {
        match self {
            Interval::Equal(v) => format!("{v}={attribute}={v}"),
            Interval::NotEqual(v) => format!("{v}<>{attribute}<>{v}"),
            Interval::Range { lo, lo_op, hi_op, hi } => {
                format!("{lo}{}{attribute}{}{hi}", lo_op.symbol(), hi_op.symbol())
            }
        }
    }

    fn bounds(&self) -> (Endpoint, RangeOp, RangeOp, Endpoint) {
        match self {
            Interval::Equal(v) => (
                Endpoint::Finite(v.clone()),
                RangeOp::Le,
                RangeOp::Le,
                Endpoint::Finite(v.clone()),
            ),
            Interval::NotEqual(v) => (
                Endpoint::Finite(v.clone()),
                RangeOp::Le,
                RangeOp::Le,
                Endpoint::Finite(v.clone()),
            ),
            Interval::Range { lo, lo_op, hi_op, hi } => {
                (lo.clone(), *lo_op, *hi_op, hi.clone())
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_predicate_string("A"))
    }
}

fn make_range(lo: Endpoint, lo_op: RangeOp, hi_op: RangeOp, hi: Endpoint) -> Option<Interval> {
    match (&lo, &hi) {
        (Endpoint::Finite(a), Endpoint::Finite(b)) => match a.partial_cmp(b) {
            Some(Ordering::Less) => Some(Interval::Range { lo, lo_op, hi_op, hi }),
            Some(Ordering::Equal) => {
                if lo_op.includes_equal() && hi_op.includes_equal() {
                    Some(Interval::Equal(a.clone()))
                } else {
                    None
                }
            }
            _ => None,
        },
        _ => Some(Interval::Range { lo, lo_op, hi_op, hi }),
    }
}

fn tighter_lo(lo1: &Endpoint, op1: RangeOp, lo2: &Endpoint, op2: RangeOp) -> (Endpoint, RangeOp) {
    match lo1.partial_cmp(lo2) {
        Some(Ordering::Greater) => (lo1.clone(), op1),
        Some(Ordering::Less) => (lo2.clone(), op2),
        _ => (
            lo1.clone(),
            if op1 == RangeOp::Lt || op2 == RangeOp::Lt {
                RangeOp::Lt
            } else {
                RangeOp::Le
            },
        ),
    }
}

fn tighter_hi(hi1: &Endpoint, op1: RangeOp, hi2: &Endpoint, op2: RangeOp) -> (Endpoint, RangeOp) {
    match hi1.partial_cmp(hi2) {
        Some(Ordering::Less) => (hi1.clone(), op1),
        Some(Ordering::Greater) => (hi2.clone(), op2),
        _ => (
            hi1.clone(),
            if op1 == RangeOp::Lt || op2 == RangeOp::Lt {
                RangeOp::Lt
            } else {
                RangeOp::Le
            },
        ),
    }
}

fn endpoint_inside(ep: &Endpoint, interval: &Interval) -> bool {
    match interval {
        Interval::Equal(v) => matches!(ep, Endpoint::Finite(x) if x == v),
        Interval::NotEqual(v) => match ep {
            Endpoint::Finite(x) => x != v,
            _ => true,
        },
        Interval::Range { lo, lo_op, hi_op, hi } => {
            after_left(ep, lo, *lo_op) && before_right(ep, hi, *hi_op)
        }
    }
}

fn after_left(ep: &Endpoint, lo: &Endpoint, lo_op: RangeOp) -> bool {
    match lo {
        Endpoint::NegInf => true,
        Endpoint::PosInf => matches!(ep, Endpoint::PosInf),
        Endpoint::Finite(l) => match ep {
            Endpoint::NegInf => false,
            Endpoint::PosInf => true,
            Endpoint::Finite(v) => match l.partial_cmp(v) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => lo_op.includes_equal(),
                _ => false,
            },
        },
    }
}

fn before_right(ep: &Endpoint, hi: &Endpoint, hi_op: RangeOp) -> bool {
    match hi {
        Endpoint::PosInf => true,
        Endpoint::NegInf => matches!(ep, Endpoint::NegInf),
        Endpoint::Finite(h) => match ep {
            Endpoint::PosInf => false,
            Endpoint::NegInf => true,
            Endpoint::Finite(v) => match h.partial_cmp(v) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => hi_op.includes_equal(),
                _ => false,
            },
        },
    }
}

/// `cmp_op` in the grammar: `<` `<=` `>` `>=` `=` `<>`. Lives here rather
/// than in `ast` because it is the argument to [`parse_interval`], the
/// interval-algebra operation that turns a comparison operator into a
/// canonical [`Interval`] (the table in spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// `parse_interval(op, value)`: the canonicalization table from spec §4.1.
///
/// `A=v` → `(v,=,=,v)`; `A<>v` → `(v,<>,<>,v)`; `A<v` → `(-∞,<=,<,v)`;
/// `A<=v` → `(-∞,<=,<=,v)`; `A>v` → `(v,<,<=,+∞)`; `A>=v` → `(v,<=,<=,+∞)`.
/// The remaining table row, `x op1 A op2 y`, is covered by [`Interval::range`]
/// directly since it already carries both endpoints.
pub fn parse_interval(op: CmpOp, value: Value) -> Interval {
    match op {
        CmpOp::Eq => Interval::equal(value),
        CmpOp::Ne => Interval::not_equal(value),
        CmpOp::Lt => Interval::less_than(value),
        CmpOp::Le => Interval::less_equal(value),
        CmpOp::Gt => Interval::greater_than(value),
        CmpOp::Ge => Interval::greater_equal(value),
    }
}

/// Either an [`Interval`] or a plain [`Value`]; `intersect` accepts any
/// combination (spec §4.1: interval/interval, interval/value, value/value).
pub enum Operand<'a> {
    Interval(&'a Interval),
    Value(&'a Value),
}

/// A read-only view over an attribute→(interval-or-value) mapping. Both
/// [`crate::records::Record`] (attribute→`Value`) and
/// [`crate::formula::Formula`] (attribute→`Interval`) implement this, so
/// `Rule` dominance logic (see `rule::Rule::satisfies_core`) is written once
/// and used against either concrete records or the partial formulas derived
/// from them.
pub trait AttributeView {
    fn operand(&self, attribute: &str) -> Option<Operand<'_>>;
}

impl<'a> From<&'a Interval> for Operand<'a> {
    fn from(i: &'a Interval) -> Self {
        Operand::Interval(i)
    }
}

impl<'a> From<&'a Value> for Operand<'a> {
    fn from(v: &'a Value) -> Self {
        Operand::Value(v)
    }
}

/// Check if there is interval or value overlap. Symmetric in its
/// arguments (property tested in `tests/`).
pub fn intersect<'a>(a: impl Into<Operand<'a>>, b: impl Into<Operand<'a>>) -> bool {
    match (a.into(), b.into()) {
        (Operand::Interval(i1), Operand::Interval(i2)) => interval_intersect(i1, i2),
        (Operand::Interval(i), Operand::Value(v)) | (Operand::Value(v), Operand::Interval(i)) => {
            endpoint_inside(&Endpoint::Finite(v.clone()), i)
        }
        (Operand::Value(v1), Operand::Value(v2)) => v1 == v2,
    }
}

fn interval_intersect(i1: &Interval, i2: &Interval) -> bool {
    match (i1, i2) {
        (Interval::Equal(a), Interval::Equal(b)) => a == b,
        (Interval::NotEqual(a), Interval::Equal(b)) | (Interval::Equal(b), Interval::NotEqual(a)) => {
            a != b
        }
        (Interval::Equal(v), _) => endpoint_inside(&Endpoint::Finite(v.clone()), i2),
        (_, Interval::Equal(v)) => endpoint_inside(&Endpoint::Finite(v.clone()), i1),
        // A disequality overlaps everything except its own equality point
        // (handled above); any other pairing is an overlap by definition.
        (Interval::NotEqual(_), _) | (_, Interval::NotEqual(_)) => true,
        (Interval::Range { .. }, Interval::Range { .. }) => {
            let (lo1, lo1_op, hi1_op, hi1) = i1.bounds();
            let (lo2, lo2_op, hi2_op, hi2) = i2.bounds();
            // Overlap iff max(lo1,lo2) <= min(hi1,hi2), honoring both sides'
            // strictness at a shared boundary point (spec §4.1: an endpoint
            // counts only when its adjacent operator includes equality).
            let (ov_lo, ov_lo_op) = tighter_lo(&lo1, lo1_op, &lo2, lo2_op);
            let (ov_hi, ov_hi_op) = tighter_hi(&hi1, hi1_op, &hi2, hi2_op);
            make_range(ov_lo, ov_lo_op, ov_hi_op, ov_hi).is_some()
        }
    }
}

/// If `i = (v, <>, <>, v)`, return its two-way split into
/// `[(-∞,<=,<,v), (v,<,<=,+∞)]`; otherwise an empty `Vec`.
pub fn split_neq(i: &Interval) -> Vec<Interval> {
    match i {
        Interval::NotEqual(v) => vec![Interval::less_than(v.clone()), Interval::greater_than(v.clone())],
        _ => Vec::new(),
    }
}

/// Partition `s` against an overlapping, non-equal fixed interval `f`
/// into up to three disjoint sub-intervals: the portion of `s` left of
/// `f`, the `s ∩ f` overlap, and the portion of `s` right of `f`.
/// Disequality operands must already be eliminated via [`split_neq`]
/// before calling this (the two-phase normalization in `Theory::split_rules`
/// guarantees that ordering).
pub fn split_interval(s: &Interval, f: &Interval) -> Vec<Interval> {
    let (s_lo, s_lo_op, s_hi_op, s_hi) = s.bounds();
    let (f_lo, f_lo_op, f_hi_op, f_hi) = f.bounds();

    let (ov_lo, ov_lo_op) = tighter_lo(&s_lo, s_lo_op, &f_lo, f_lo_op);
    let (ov_hi, ov_hi_op) = tighter_hi(&s_hi, s_hi_op, &f_hi, f_hi_op);

    let mut parts = Vec::with_capacity(3);
    if let Some(left) = make_range(s_lo, s_lo_op, ov_lo_op.flip(), ov_lo.clone()) {
        parts.push(left);
    }
    if let Some(mid) = make_range(ov_lo, ov_lo_op, ov_hi_op, ov_hi.clone()) {
        parts.push(mid);
    }
    if let Some(right) = make_range(ov_hi, ov_hi_op.flip(), s_hi_op, s_hi) {
        parts.push(right);
    }
    parts
}

fn lo_at_least_as_tight(
    outer_lo: &Endpoint,
    outer_op: RangeOp,
    inner_lo: &Endpoint,
    inner_op: RangeOp,
) -> bool {
    match outer_lo.partial_cmp(inner_lo) {
        Some(Ordering::Less) => true,
        Some(Ordering::Equal) => outer_op.includes_equal() || !inner_op.includes_equal(),
        _ => false,
    }
}

fn hi_at_least_as_tight(
    outer_hi: &Endpoint,
    outer_op: RangeOp,
    inner_hi: &Endpoint,
    inner_op: RangeOp,
) -> bool {
    match outer_hi.partial_cmp(inner_hi) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => outer_op.includes_equal() || !inner_op.includes_equal(),
        _ => false,
    }
}

/// True iff every value satisfying `inner` also satisfies `outer` — i.e.
/// `inner` is a subset of `outer`. Used by essentiality pruning (spec
/// §4.4: a comparison is more generic than another when its formulas
/// subsume the other's attribute-by-attribute).
pub fn contains(outer: &Interval, inner: &Interval) -> bool {
    match (outer, inner) {
        (Interval::Equal(a), Interval::Equal(b)) => a == b,
        (Interval::Equal(_), _) => false,
        (Interval::NotEqual(a), Interval::Equal(b)) => a != b,
        (Interval::NotEqual(a), Interval::NotEqual(b)) => a == b,
        (Interval::NotEqual(a), Interval::Range { .. }) => {
            !endpoint_inside(&Endpoint::Finite(a.clone()), inner)
        }
        (Interval::Range { .. }, Interval::Equal(b)) => {
            endpoint_inside(&Endpoint::Finite(b.clone()), outer)
        }
        (Interval::Range { .. }, Interval::NotEqual(_)) => false,
        (Interval::Range { .. }, Interval::Range { .. }) => {
            let (o_lo, o_lo_op, o_hi_op, o_hi) = outer.bounds();
            let (i_lo, i_lo_op, i_hi_op, i_hi) = inner.bounds();
            lo_at_least_as_tight(&o_lo, o_lo_op, &i_lo, i_lo_op)
                && hi_at_least_as_tight(&o_hi, o_hi_op, &i_hi, i_hi_op)
        }
    }
}
