//! Uncompiled conditions and the condition compiler.
//!
//! A [`Condition`] names fields and carries loosely typed values. Compiling
//! it against a [`Schema`] resolves names, casts values to field types,
//! precompiles matchers, flattens nested branches of the same kind,
//! rewrites sibling leaves into cheaper equivalents and assigns node ids in
//! pre-order.
//!
//! Sibling rewrites, applied per branch after flattening:
//!
//! - AND: repeated upper or lower bounds keep the tighter one, `<=` and
//!   `>=` fold into a range, ranges narrow, IN lists intersect and NOT IN
//!   lists unite
//! - OR: IN lists unite, absorbing equalities on the same field
//! - both: a one-element IN becomes `=`, a one-element NOT IN becomes `!=`
//!
//! Equalities under an OR stay separate leaves. A branch left with a single
//! child is replaced by it.

use std::cmp::Ordering;

use keyscan_codec::{FieldType, Value};

use super::mode::FilterMode;
use super::node::{Filter, FilterTree, FilterTreeNode, FilterValue};
use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use crate::types::NodeId;

/// A condition on table rows, before compilation.
///
/// ```
/// use keyscan_codec::FieldType;
/// use keyscan_core::{Condition, Schema};
///
/// let schema = Schema::builder("users")
///     .primary_key("id")
///     .field("age", FieldType::Int32)
///     .build()
///     .unwrap();
///
/// let cond = Condition::and(vec![
///     Condition::ge("age", 18),
///     Condition::lt("id", 100u64),
/// ]);
/// let tree = cond.compile(&schema).unwrap();
/// assert_eq!(tree.to_string(), "(age >= 18 AND id < 100)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// All children must hold. An empty list always holds.
    And(Vec<Condition>),
    /// Any child must hold. An empty list never holds.
    Or(Vec<Condition>),
    /// A single field condition.
    Leaf {
        /// Field name.
        field: String,
        /// Comparison mode.
        mode: FilterMode,
        /// Operand.
        value: FilterValue,
    },
}

impl Condition {
    /// Creates a leaf condition.
    pub fn leaf(field: impl Into<String>, mode: FilterMode, value: FilterValue) -> Self {
        Condition::Leaf {
            field: field.into(),
            mode,
            value,
        }
    }

    /// Conjunction of `children`.
    pub fn and(children: Vec<Condition>) -> Self {
        Condition::And(children)
    }

    /// Disjunction of `children`.
    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Or(children)
    }

    fn scalar(field: impl Into<String>, mode: FilterMode, v: impl Into<Value>) -> Self {
        Self::leaf(field, mode, FilterValue::Scalar(v.into()))
    }

    /// `field = v`
    pub fn equal(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::Equal, v)
    }

    /// `field != v`
    pub fn not_equal(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::NotEqual, v)
    }

    /// `field < v`
    pub fn lt(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::Lt, v)
    }

    /// `field <= v`
    pub fn le(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::Le, v)
    }

    /// `field > v`
    pub fn gt(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::Gt, v)
    }

    /// `field >= v`
    pub fn ge(field: impl Into<String>, v: impl Into<Value>) -> Self {
        Self::scalar(field, FilterMode::Ge, v)
    }

    /// `lo <= field <= hi`
    pub fn range(field: impl Into<String>, lo: impl Into<Value>, hi: impl Into<Value>) -> Self {
        Self::leaf(field, FilterMode::Range, FilterValue::Range(lo.into(), hi.into()))
    }

    /// `field IN (values)`
    pub fn in_list<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::leaf(field, FilterMode::In, FilterValue::List(values))
    }

    /// `field NOT IN (values)`
    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::leaf(field, FilterMode::NotIn, FilterValue::List(values))
    }

    /// `field ~ /pattern/`
    pub fn regexp(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::leaf(field, FilterMode::Regexp, FilterValue::Pattern(pattern.into()))
    }

    /// Parses a `field.mode` key and a textual value, as found in query
    /// strings.
    ///
    /// A key without a recognised mode suffix means equality. List operands
    /// (`in`, `ni`) and range bounds (`rg`) are comma separated.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields, malformed values or a range
    /// without exactly two bounds.
    pub fn parse(key: &str, raw: &str, schema: &Schema) -> CoreResult<Self> {
        let (name, mode) = match key.rsplit_once('.') {
            Some((name, tag)) if FilterMode::parse(tag) != FilterMode::Invalid => {
                (name, FilterMode::parse(tag))
            }
            _ => (key, FilterMode::Equal),
        };
        let ty = schema.resolve(name)?.ty;
        let value = match mode {
            FilterMode::In | FilterMode::NotIn => FilterValue::List(
                raw.split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| ty.parse_value(part))
                    .collect::<Result<_, _>>()?,
            ),
            FilterMode::Range => {
                let parts: Vec<&str> = raw.split(',').collect();
                let [lo, hi] = parts.as_slice() else {
                    return Err(CoreError::invalid_condition(format!(
                        "range on {name} needs two bounds, got {raw:?}"
                    )));
                };
                FilterValue::Range(ty.parse_value(lo)?, ty.parse_value(hi)?)
            }
            FilterMode::Regexp => FilterValue::Pattern(raw.to_string()),
            _ => FilterValue::Scalar(ty.parse_value(raw)?),
        };
        Ok(Self::leaf(name, mode, value))
    }

    /// Compiles the condition against `schema`.
    ///
    /// The root of the result is always a branch: a single leaf is wrapped
    /// in an AND, a condition that always holds becomes an empty AND and one
    /// that never holds becomes an empty OR.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields, values that do not cast to the
    /// field type, operand shapes that do not fit the mode, and patterns
    /// that do not compile or target non-text fields.
    pub fn compile(&self, schema: &Schema) -> CoreResult<FilterTree> {
        let root = match normalize(self, schema)? {
            Pending::True => Pending::Branch(false, Vec::new()),
            Pending::False => Pending::Branch(true, Vec::new()),
            leaf @ Pending::Leaf(_) => Pending::Branch(false, vec![leaf]),
            branch => branch,
        };
        let mut next = 0u32;
        Ok(FilterTree::new(assign_ids(root, &mut next)))
    }
}

/// Intermediate tree without node ids.
enum Pending {
    True,
    False,
    Leaf(Filter),
    Branch(bool, Vec<Pending>),
}

fn normalize(cond: &Condition, schema: &Schema) -> CoreResult<Pending> {
    let (or_kind, children) = match cond {
        Condition::Leaf { field, mode, value } => {
            let filter = compile_leaf(schema, field, *mode, value)?;
            return collapse_single(filter, schema).map(Pending::Leaf);
        }
        Condition::And(children) => (false, children),
        Condition::Or(children) => (true, children),
    };

    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match normalize(child, schema)? {
            // Neutral element of the branch kind.
            Pending::True if !or_kind => {}
            Pending::False if or_kind => {}
            // Absorbing element.
            Pending::True => return Ok(Pending::True),
            Pending::False => return Ok(Pending::False),
            Pending::Branch(kind, nested) if kind == or_kind => out.extend(nested),
            other => out.push(other),
        }
    }

    let mut out = simplify(out, or_kind, schema)?;
    if out.len() == 1 {
        if let Some(only) = out.pop() {
            return Ok(only);
        }
    }
    Ok(match out.len() {
        0 if or_kind => Pending::False,
        0 => Pending::True,
        _ => Pending::Branch(or_kind, out),
    })
}

/// Merges leaves on the same field into the earliest of them, keeping the
/// order of everything else.
fn simplify(children: Vec<Pending>, or_kind: bool, schema: &Schema) -> CoreResult<Vec<Pending>> {
    let mut out: Vec<Pending> = Vec::with_capacity(children.len());
    for child in children {
        let Pending::Leaf(filter) = child else {
            out.push(child);
            continue;
        };
        let mut merged = false;
        for slot in &mut out {
            let Pending::Leaf(prev) = slot else { continue };
            if prev.field_id != filter.field_id {
                continue;
            }
            let rewrite = if or_kind {
                merge_any(prev, &filter)
            } else {
                merge_all(prev, &filter)
            };
            if let Some((mode, value)) = rewrite {
                *prev = rebuild(prev, mode, value, schema)?;
                merged = true;
                break;
            }
        }
        if !merged {
            out.push(Pending::Leaf(filter));
        }
    }

    out.into_iter()
        .map(|node| match node {
            Pending::Leaf(filter) => collapse_single(filter, schema).map(Pending::Leaf),
            other => Ok(other),
        })
        .collect()
}

type Rewrite = Option<(FilterMode, FilterValue)>;

fn merge_all(prev: &Filter, next: &Filter) -> Rewrite {
    use FilterMode::{Ge, Gt, In, Le, Lt, NotIn};
    use FilterValue::{List, Scalar};

    match (prev.mode, &prev.value, next.mode, &next.value) {
        (Le, Scalar(a), Le, Scalar(b)) => Some((Le, Scalar(lower(a, b)?.clone()))),
        (Lt, Scalar(a), Lt, Scalar(b)) => Some((Lt, Scalar(lower(a, b)?.clone()))),
        (Ge, Scalar(a), Ge, Scalar(b)) => Some((Ge, Scalar(higher(a, b)?.clone()))),
        (Gt, Scalar(a), Gt, Scalar(b)) => Some((Gt, Scalar(higher(a, b)?.clone()))),
        (Ge, Scalar(lo), Le, Scalar(hi)) | (Le, Scalar(hi), Ge, Scalar(lo)) => between(lo, hi),
        (FilterMode::Range, FilterValue::Range(lo, hi), Ge, Scalar(v))
        | (Ge, Scalar(v), FilterMode::Range, FilterValue::Range(lo, hi)) => {
            between(higher(lo, v)?, hi)
        }
        (FilterMode::Range, FilterValue::Range(lo, hi), Le, Scalar(v))
        | (Le, Scalar(v), FilterMode::Range, FilterValue::Range(lo, hi)) => {
            between(lo, lower(hi, v)?)
        }
        (
            FilterMode::Range,
            FilterValue::Range(a_lo, a_hi),
            FilterMode::Range,
            FilterValue::Range(b_lo, b_hi),
        ) => between(higher(a_lo, b_lo)?, lower(a_hi, b_hi)?),
        (In, List(a), In, List(b)) => {
            let both = a.iter().filter(|v| contains(b, v)).cloned().collect();
            Some((In, List(both)))
        }
        (NotIn, List(a), NotIn, List(b)) => Some((NotIn, List(unite(a, b)))),
        _ => None,
    }
}

fn merge_any(prev: &Filter, next: &Filter) -> Rewrite {
    use FilterMode::{Equal, In};
    use FilterValue::{List, Scalar};

    let values = match (prev.mode, &prev.value, next.mode, &next.value) {
        (In, List(a), In, List(b)) => unite(a, b),
        (In, List(a), Equal, Scalar(v)) | (Equal, Scalar(v), In, List(a)) => {
            unite(a, std::slice::from_ref(v))
        }
        _ => return None,
    };
    Some((In, List(values)))
}

fn lower<'v>(a: &'v Value, b: &'v Value) -> Option<&'v Value> {
    match a.compare(b)? {
        Ordering::Greater => Some(b),
        _ => Some(a),
    }
}

fn higher<'v>(a: &'v Value, b: &'v Value) -> Option<&'v Value> {
    match a.compare(b)? {
        Ordering::Less => Some(b),
        _ => Some(a),
    }
}

/// An inverted range stays as two leaves.
fn between(lo: &Value, hi: &Value) -> Rewrite {
    match lo.compare(hi)? {
        Ordering::Greater => None,
        _ => Some((
            FilterMode::Range,
            FilterValue::Range(lo.clone(), hi.clone()),
        )),
    }
}

fn contains(values: &[Value], v: &Value) -> bool {
    values.iter().any(|w| w.compare(v) == Some(Ordering::Equal))
}

fn unite(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut values: Vec<Value> = a.iter().chain(b).cloned().collect();
    sort_values(&mut values);
    values
}

fn sort_values(values: &mut Vec<Value>) {
    values.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    values.dedup_by(|a, b| a.compare(b) == Some(Ordering::Equal));
}

fn collapse_single(filter: Filter, schema: &Schema) -> CoreResult<Filter> {
    let mode = match filter.mode {
        FilterMode::In => FilterMode::Equal,
        FilterMode::NotIn => FilterMode::NotEqual,
        _ => return Ok(filter),
    };
    match &filter.value {
        FilterValue::List(values) => match values.as_slice() {
            [only] => rebuild(&filter, mode, FilterValue::Scalar(only.clone()), schema),
            _ => Ok(filter),
        },
        _ => Ok(filter),
    }
}

fn rebuild(filter: &Filter, mode: FilterMode, value: FilterValue, schema: &Schema) -> CoreResult<Filter> {
    let field = schema
        .field(filter.field_id)
        .ok_or_else(|| CoreError::unknown_field(filter.name.as_str()))?;
    Filter::new(field, mode, value)
}

fn compile_leaf(schema: &Schema, name: &str, mode: FilterMode, value: &FilterValue) -> CoreResult<Filter> {
    let field = schema.resolve(name)?;
    let ty = field.ty;
    if mode == FilterMode::Invalid {
        return Err(CoreError::invalid_condition(format!("invalid mode on {name}")));
    }
    let value = match value {
        FilterValue::Scalar(v) => FilterValue::Scalar(ty.cast(v)?),
        FilterValue::Range(lo, hi) => FilterValue::Range(ty.cast(lo)?, ty.cast(hi)?),
        FilterValue::List(values) => {
            let mut cast = values
                .iter()
                .map(|v| ty.cast(v))
                .collect::<Result<Vec<_>, _>>()?;
            sort_values(&mut cast);
            FilterValue::List(cast)
        }
        FilterValue::Pattern(p) => {
            if !matches!(ty, FieldType::Text | FieldType::Bytes) {
                return Err(CoreError::invalid_condition(format!(
                    "pattern on non-text field {name}"
                )));
            }
            FilterValue::Pattern(p.clone())
        }
    };
    Filter::new(field, mode, value)
}

fn assign_ids(node: Pending, next: &mut u32) -> FilterTreeNode {
    let id = NodeId::new(*next);
    *next += 1;
    match node {
        Pending::Leaf(filter) => FilterTreeNode::leaf(id, filter),
        Pending::Branch(or_kind, children) => FilterTreeNode::Branch {
            id,
            or_kind,
            children: children.into_iter().map(|c| assign_ids(c, next)).collect(),
        },
        // Constants only survive at the root, which compile() rewrites.
        Pending::True => FilterTreeNode::and(id, Vec::new()),
        Pending::False => FilterTreeNode::or(id, Vec::new()),
    }
}
