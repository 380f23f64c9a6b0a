//! Per-group aggregate state: computed at the leaves, folded upward into
//! parents.

use std::cmp::Ordering;

use crate::column::{format_compact, Column, Duration};
use crate::value::{compare_floats, format_float, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    RowCount,
    SubgroupCount,
    Sum,
    Avg,
    Min,
    Max,
}

/// An aggregate bound to a column. The pseudo-aggregates `RowCount` and
/// `SubgroupCount` read group shape rather than cells and bind to no
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggSpec {
    pub column: String,
    pub kind: Aggregate,
}

impl AggSpec {
    pub fn new(column: impl Into<String>, kind: Aggregate) -> Self { Self { column: column.into(), kind } }

    pub fn row_count() -> Self { Self { column: String::new(), kind: Aggregate::RowCount } }

    pub fn subgroup_count() -> Self { Self { column: String::new(), kind: Aggregate::SubgroupCount } }

    /// Rendering label: `Sum(amount)`, `RowCount`.
    pub fn label(&self) -> String {
        let name = match self.kind {
            Aggregate::RowCount => return "RowCount".to_string(),
            Aggregate::SubgroupCount => return "SubgroupCount".to_string(),
            Aggregate::Sum => "Sum",
            Aggregate::Avg => "Avg",
            Aggregate::Min => "Min",
            Aggregate::Max => "Max",
        };
        format!("{}({})", name, self.column)
    }
}

/// A typed numeric accumulator for Sum/Avg. The variant tracks the source
/// column type so integers stay exact and durations render as durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumAcc {
    Int(i64),
    Uint(u64),
    Float(f64),
    Nanos(i64),
}

impl NumAcc {
    fn from_value(v: &Value) -> Option<NumAcc> {
        match v {
            Value::Uint32(n) => Some(NumAcc::Uint(*n as u64)),
            Value::Uint64(n) => Some(NumAcc::Uint(*n)),
            Value::Int64(n) => Some(NumAcc::Int(*n)),
            Value::Float64(f) => Some(NumAcc::Float(*f)),
            Value::Duration(d) => Some(NumAcc::Nanos(d.nanos())),
            _ => None,
        }
    }

    fn add(self, other: NumAcc) -> NumAcc {
        match (self, other) {
            (NumAcc::Int(a), NumAcc::Int(b)) => NumAcc::Int(a.wrapping_add(b)),
            (NumAcc::Uint(a), NumAcc::Uint(b)) => NumAcc::Uint(a.wrapping_add(b)),
            (NumAcc::Float(a), NumAcc::Float(b)) => NumAcc::Float(a + b),
            (NumAcc::Nanos(a), NumAcc::Nanos(b)) => NumAcc::Nanos(a.wrapping_add(b)),
            // mixed variants cannot arise from one column; fall back numerically
            (a, b) => NumAcc::Float(a.as_f64() + b.as_f64()),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            NumAcc::Int(n) => n as f64,
            NumAcc::Uint(n) => n as f64,
            NumAcc::Float(f) => f,
            NumAcc::Nanos(n) => n as f64,
        }
    }

    fn compare(self, other: NumAcc) -> Ordering {
        match (self, other) {
            (NumAcc::Int(a), NumAcc::Int(b)) => a.cmp(&b),
            (NumAcc::Uint(a), NumAcc::Uint(b)) => a.cmp(&b),
            (NumAcc::Nanos(a), NumAcc::Nanos(b)) => a.cmp(&b),
            (a, b) => compare_floats(a.as_f64(), b.as_f64()),
        }
    }

    fn render(self) -> String {
        match self {
            NumAcc::Int(n) => n.to_string(),
            NumAcc::Uint(n) => n.to_string(),
            NumAcc::Float(f) => format_float(f),
            NumAcc::Nanos(n) => format_compact(Duration::from_nanos(n)),
        }
    }

    fn divided_by(self, n: u64) -> NumAcc {
        match self {
            NumAcc::Nanos(sum) => NumAcc::Nanos(if n == 0 { 0 } else { sum / n as i64 }),
            other => NumAcc::Float(other.as_f64() / n as f64),
        }
    }
}

/// Accumulated aggregate state for one group.
#[derive(Debug, Clone, PartialEq)]
pub enum AggValue {
    Count(u64),
    Subgroups(u64),
    Sum(NumAcc),
    Avg { sum: NumAcc, n: u64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl AggValue {
    /// Compute the aggregate directly over a leaf group. Cells that cannot
    /// be read are skipped; NaN floats are excluded from Min/Max but flow
    /// through Sum per IEEE rules.
    pub(crate) fn leaf(spec: &AggSpec, column: Option<&Column>, indices: &[u32], child_count: u64) -> AggValue {
        match spec.kind {
            Aggregate::RowCount => AggValue::Count(indices.len() as u64),
            Aggregate::SubgroupCount => AggValue::Subgroups(child_count),
            Aggregate::Sum | Aggregate::Avg => {
                let mut sum: Option<NumAcc> = None;
                let mut n = 0u64;
                if let Some(col) = column {
                    for &i in indices {
                        let Some(acc) = col.value(i).ok().as_ref().and_then(NumAcc::from_value) else { continue };
                        sum = Some(match sum {
                            Some(s) => s.add(acc),
                            None => acc,
                        });
                        n += 1;
                    }
                }
                let sum = sum.unwrap_or(NumAcc::Int(0));
                if spec.kind == Aggregate::Sum {
                    AggValue::Sum(sum)
                } else {
                    AggValue::Avg { sum, n }
                }
            }
            Aggregate::Min | Aggregate::Max => {
                let want_min = spec.kind == Aggregate::Min;
                let mut extreme: Option<Value> = None;
                let mut saw_nan = false;
                if let Some(col) = column {
                    for &i in indices {
                        let Ok(v) = col.value(i) else { continue };
                        if matches!(v, Value::Float64(f) if f.is_nan()) {
                            saw_nan = true;
                            continue;
                        }
                        extreme = Some(match extreme {
                            None => v,
                            Some(cur) => {
                                let replace = if want_min { v.compare(&cur) == Ordering::Less } else { v.compare(&cur) == Ordering::Greater };
                                if replace {
                                    v
                                } else {
                                    cur
                                }
                            }
                        });
                    }
                }
                // an all-NaN column still reports NaN rather than nothing
                if extreme.is_none() && saw_nan {
                    extreme = Some(Value::Float64(f64::NAN));
                }
                if want_min {
                    AggValue::Min(extreme)
                } else {
                    AggValue::Max(extreme)
                }
            }
        }
    }

    /// Fold a child's state into a parent's. Variants always match because
    /// both came from the same spec.
    pub(crate) fn fold(&self, other: &AggValue) -> AggValue {
        match (self, other) {
            (AggValue::Count(a), AggValue::Count(b)) => AggValue::Count(a + b),
            (AggValue::Subgroups(a), AggValue::Subgroups(b)) => AggValue::Subgroups(a + b),
            (AggValue::Sum(a), AggValue::Sum(b)) => AggValue::Sum(a.add(*b)),
            (AggValue::Avg { sum: s1, n: n1 }, AggValue::Avg { sum: s2, n: n2 }) => AggValue::Avg { sum: s1.add(*s2), n: n1 + n2 },
            (AggValue::Min(a), AggValue::Min(b)) => AggValue::Min(fold_extreme(a, b, true)),
            (AggValue::Max(a), AggValue::Max(b)) => AggValue::Max(fold_extreme(a, b, false)),
            (a, _) => a.clone(),
        }
    }

    /// Numeric comparison for aggregate-driven block sorting. An undefined
    /// average (n = 0) sorts after defined ones.
    pub fn compare(&self, other: &AggValue) -> Ordering {
        match (self, other) {
            (AggValue::Count(a), AggValue::Count(b)) => a.cmp(b),
            (AggValue::Subgroups(a), AggValue::Subgroups(b)) => a.cmp(b),
            (AggValue::Sum(a), AggValue::Sum(b)) => a.compare(*b),
            (AggValue::Avg { sum: s1, n: n1 }, AggValue::Avg { sum: s2, n: n2 }) => {
                // 0/0 is NaN, which the float order already puts last
                compare_floats(s1.as_f64() / *n1 as f64, s2.as_f64() / *n2 as f64)
            }
            (AggValue::Min(a), AggValue::Min(b)) | (AggValue::Max(a), AggValue::Max(b)) => match (a, b) {
                (Some(a), Some(b)) => a.compare(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            _ => Ordering::Equal,
        }
    }

    pub fn render(&self) -> String {
        match self {
            AggValue::Count(n) | AggValue::Subgroups(n) => n.to_string(),
            AggValue::Sum(sum) => sum.render(),
            AggValue::Avg { n: 0, .. } => "undefined".to_string(),
            AggValue::Avg { sum, n } => sum.divided_by(*n).render(),
            AggValue::Min(v) | AggValue::Max(v) => match v {
                Some(v) => v.to_string(),
                None => "undefined".to_string(),
            },
        }
    }
}

/// Min/Max folding ignores NaN sides: a NaN extreme only survives when
/// every contributing leaf was all-NaN.
fn fold_extreme(a: &Option<Value>, b: &Option<Value>, want_min: bool) -> Option<Value> {
    let nan = |v: &Option<Value>| matches!(v, Some(Value::Float64(f)) if f.is_nan());
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (a, b) if nan(a) => b.clone(),
        (a, b) if nan(b) => a.clone(),
        (Some(a), Some(b)) => {
            let pick_a = if want_min { a.compare(b) != Ordering::Greater } else { a.compare(b) != Ordering::Less };
            Some(if pick_a { a.clone() } else { b.clone() })
        }
    }
}
