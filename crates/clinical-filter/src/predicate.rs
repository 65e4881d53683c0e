//! Predicate shapes a value token can resolve to.

use std::fmt;

/// A scalar value compared against a document field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// Text value (`"Var"`, `"Pozitif"`, `"1"`).
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Decimal value.
    Decimal(f64),
    /// Boolean value.
    Bool(bool),
}

impl FieldValue {
    /// Returns the textual form used for full-text style comparisons.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// The match rule bound to one value token of a category.
///
/// Field sets are ordered and, once validated by
/// [`CategoryFieldMap`](crate::CategoryFieldMap), never empty. Multi-field
/// variants match when ANY of their fields matches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predicate {
    /// At least one field is present and non-null.
    Exists {
        /// Candidate fields.
        fields: Vec<String>,
    },
    /// The field equals the given value.
    Equals {
        /// Field name.
        field: String,
        /// Expected value.
        value: FieldValue,
    },
    /// The field is numeric and strictly greater than `bound`.
    GreaterThan {
        /// Field name.
        field: String,
        /// Exclusive lower bound.
        bound: f64,
    },
    /// At least one field is present AND equals the sentinel value.
    ExistsAndEquals {
        /// Candidate fields.
        fields: Vec<String>,
        /// Sentinel value, e.g. `"1"`.
        value: FieldValue,
    },
}

impl Predicate {
    /// Creates an existence predicate over any of `fields`.
    pub fn exists<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::Exists {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an equality predicate.
    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a strictly-greater-than range predicate.
    pub fn greater_than(field: impl Into<String>, bound: f64) -> Self {
        Predicate::GreaterThan {
            field: field.into(),
            bound,
        }
    }

    /// Creates a compound exists-and-equals predicate over any of `fields`.
    pub fn exists_and_equals<I, S>(fields: I, value: impl Into<FieldValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::ExistsAndEquals {
            fields: fields.into_iter().map(Into::into).collect(),
            value: value.into(),
        }
    }

    /// Returns the document fields this predicate reads.
    pub fn fields(&self) -> &[String] {
        match self {
            Predicate::Exists { fields } | Predicate::ExistsAndEquals { fields, .. } => fields,
            Predicate::Equals { field, .. } | Predicate::GreaterThan { field, .. } => {
                std::slice::from_ref(field)
            }
        }
    }

    /// Short name of the predicate shape.
    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::Exists { .. } => "exists",
            Predicate::Equals { .. } => "equals",
            Predicate::GreaterThan { .. } => "range",
            Predicate::ExistsAndEquals { .. } => "exists-and-equals",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Exists { fields } => write!(f, "exists({})", fields.join(" | ")),
            Predicate::Equals { field, value } => write!(f, "{} = {}", field, value),
            Predicate::GreaterThan { field, bound } => write!(f, "{} > {}", field, bound),
            Predicate::ExistsAndEquals { fields, value } => {
                write!(f, "exists({}) = {}", fields.join(" | "), value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists_display() {
        let p = Predicate::exists(["HAI1", "HAI2", "HAI3"]);
        assert_eq!(p.to_string(), "exists(HAI1 | HAI2 | HAI3)");
        assert_eq!(p.kind(), "exists");
    }

    #[test]
    fn test_equals_display() {
        let p = Predicate::equals("COVID", "Var");
        assert_eq!(p.to_string(), "COVID = \"Var\"");
    }

    #[test]
    fn test_greater_than_display() {
        let p = Predicate::greater_than("APRI", 0.0);
        assert_eq!(p.to_string(), "APRI > 0");
        assert_eq!(p.kind(), "range");
    }

    #[test]
    fn test_exists_and_equals_display() {
        let p = Predicate::exists_and_equals(["HbsAG1", "HbsAG2"], "1");
        assert_eq!(p.to_string(), "exists(HbsAG1 | HbsAG2) = \"1\"");
    }

    #[test]
    fn test_fields() {
        assert_eq!(
            Predicate::exists(["A", "B"]).fields(),
            &["A".to_string(), "B".to_string()]
        );
        assert_eq!(
            Predicate::greater_than("FIB4", 0.0).fields(),
            &["FIB4".to_string()]
        );
        assert_eq!(
            Predicate::equals("HPV", "Var").fields(),
            &["HPV".to_string()]
        );
    }

    #[test]
    fn test_field_value_as_text() {
        assert_eq!(FieldValue::from("Evet").as_text(), "Evet");
        assert_eq!(FieldValue::from(1_i64).as_text(), "1");
        assert_eq!(FieldValue::from(true).as_text(), "true");
        assert_eq!(FieldValue::from(1.5).as_text(), "1.5");
    }
}
