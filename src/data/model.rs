use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Well-known columns of the vehicle population file
// ---------------------------------------------------------------------------

pub const MAKE: &str = "Make";
pub const MODEL: &str = "Model";
pub const MODEL_YEAR: &str = "Model Year";
pub const EV_TYPE: &str = "Electric Vehicle Type";
pub const ELECTRIC_RANGE: &str = "Electric Range";
pub const BASE_MSRP: &str = "Base MSRP";
pub const COUNTY: &str = "County";

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a record
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, coerced from the source text.
/// Used as a `BTreeMap` key downstream, so `FieldValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeMap/BTreeSet --
// Equality follows `cmp` so it agrees with `Hash` on floats.

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

/// Plain rendering used for table cells, search matching and CSV output.
/// `Null` renders as an empty string.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => Ok(()),
        }
    }
}

impl FieldValue {
    /// Coerce a raw text cell: integers, then finite floats, then booleans,
    /// otherwise text. Empty cells become `Null`.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            // "NaN" / "inf" parse as floats but are not numeric-looking data.
            if f.is_finite() {
                return FieldValue::float(f);
            }
        }
        if s == "true" || s == "false" {
            return FieldValue::Bool(s == "true");
        }
        FieldValue::String(s.to_string())
    }

    /// Float cell with `-0.0` folded into `0.0`.
    pub fn float(f: f64) -> Self {
        FieldValue::Float(if f == 0.0 { 0.0 } else { f })
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source file
// ---------------------------------------------------------------------------

/// A single vehicle entry. Identity is its position in the [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Dynamic columns: column_name → value.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// Value of a column, `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Numeric value of a column; missing, null or text cells yield `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FieldValue::as_f64)
    }

    /// Value of a column for grouping; missing and null cells yield `None`.
    pub fn present(&self, column: &str) -> Option<&FieldValue> {
        self.get(column).filter(|v| !v.is_null())
    }

    /// Stringified cell, blank when the column is absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.to_string()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

/// The full parsed dataset. Loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records, in file order.
    pub records: Vec<Record>,
    /// Column names in source header order.
    pub columns: Vec<String>,
}

impl Dataset {
    /// Build a dataset, keeping `columns` as the header order and appending
    /// any column that only shows up inside the records.
    pub fn new(records: Vec<Record>, mut columns: Vec<String>) -> Self {
        for rec in &records {
            for col in rec.fields.keys() {
                if !columns.iter().any(|c| c == col) {
                    columns.push(col.clone());
                }
            }
        }
        Dataset { records, columns }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
