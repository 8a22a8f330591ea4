use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::ColumnKind;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringOperator {
    #[default]
    Contains,
    NotContains,
    Equals,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl StringOperator {
    pub const ALL: [StringOperator; 7] = [
        StringOperator::Contains,
        StringOperator::Equals,
        StringOperator::StartsWith,
        StringOperator::EndsWith,
        StringOperator::NotContains,
        StringOperator::IsEmpty,
        StringOperator::IsNotEmpty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StringOperator::Contains => "Contains",
            StringOperator::NotContains => "Does not contain",
            StringOperator::Equals => "Equals",
            StringOperator::StartsWith => "Starts with",
            StringOperator::EndsWith => "Ends with",
            StringOperator::IsEmpty => "Is empty",
            StringOperator::IsNotEmpty => "Is not empty",
        }
    }

    pub fn takes_operand(&self) -> bool {
        !matches!(self, StringOperator::IsEmpty | StringOperator::IsNotEmpty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberOperator {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Between,
    IsEmpty,
    IsNotEmpty,
}

impl NumberOperator {
    pub const ALL: [NumberOperator; 9] = [
        NumberOperator::Equals,
        NumberOperator::NotEquals,
        NumberOperator::GreaterThan,
        NumberOperator::LessThan,
        NumberOperator::GreaterThanOrEqual,
        NumberOperator::LessThanOrEqual,
        NumberOperator::Between,
        NumberOperator::IsEmpty,
        NumberOperator::IsNotEmpty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NumberOperator::Equals => "Equals",
            NumberOperator::NotEquals => "Not equal to",
            NumberOperator::GreaterThan => "Greater than",
            NumberOperator::LessThan => "Less than",
            NumberOperator::GreaterThanOrEqual => "Greater or equal",
            NumberOperator::LessThanOrEqual => "Less or equal",
            NumberOperator::Between => "Between",
            NumberOperator::IsEmpty => "Is empty",
            NumberOperator::IsNotEmpty => "Is not empty",
        }
    }

    pub fn takes_operand(&self) -> bool {
        !matches!(self, NumberOperator::IsEmpty | NumberOperator::IsNotEmpty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOperator {
    #[default]
    Equals,
    Before,
    After,
    Between,
    IsEmpty,
    IsNotEmpty,
}

impl DateOperator {
    pub const ALL: [DateOperator; 6] = [
        DateOperator::Equals,
        DateOperator::Before,
        DateOperator::After,
        DateOperator::Between,
        DateOperator::IsEmpty,
        DateOperator::IsNotEmpty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DateOperator::Equals => "On",
            DateOperator::Before => "Before",
            DateOperator::After => "After",
            DateOperator::Between => "Between",
            DateOperator::IsEmpty => "Is empty",
            DateOperator::IsNotEmpty => "Is not empty",
        }
    }

    pub fn takes_operand(&self) -> bool {
        !matches!(self, DateOperator::IsEmpty | DateOperator::IsNotEmpty)
    }
}

/// Selected token of a boolean filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanChoice {
    #[default]
    All,
    True,
    False,
    Empty,
}

impl BooleanChoice {
    pub const ALL: [BooleanChoice; 4] = [
        BooleanChoice::All,
        BooleanChoice::True,
        BooleanChoice::False,
        BooleanChoice::Empty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BooleanChoice::All => "All",
            BooleanChoice::True => "True",
            BooleanChoice::False => "False",
            BooleanChoice::Empty => "Empty",
        }
    }
}

// ---------------------------------------------------------------------------
// Filter definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StringFilter {
    pub operator: StringOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFilter {
    pub operator: NumberOperator,
    pub value: String,
    /// Upper bound, only read by `between`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanFilter {
    pub value: BooleanChoice,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryFilter {
    #[serde(rename = "value")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFilter {
    pub operator: DateOperator,
    pub value: String,
    /// End of the range, only read by `between`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

/// Predicate definition for one column, tagged by the column kind it was
/// created for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterDefinition {
    String(StringFilter),
    Number(NumberFilter),
    Integer(NumberFilter),
    Float(NumberFilter),
    Boolean(BooleanFilter),
    Category(CategoryFilter),
    Date(DateFilter),
    #[serde(rename = "datetime")]
    DateTime(DateFilter),
}

impl FilterDefinition {
    /// Starting point of a filter popover for a column of `kind`.
    pub fn default_for(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::String => FilterDefinition::String(StringFilter::default()),
            ColumnKind::Number => FilterDefinition::Number(NumberFilter::default()),
            ColumnKind::Integer => FilterDefinition::Integer(NumberFilter::default()),
            ColumnKind::Float => FilterDefinition::Float(NumberFilter::default()),
            ColumnKind::Boolean => FilterDefinition::Boolean(BooleanFilter::default()),
            ColumnKind::Category => FilterDefinition::Category(CategoryFilter::default()),
            ColumnKind::Date => FilterDefinition::Date(DateFilter::default()),
            ColumnKind::Datetime => FilterDefinition::DateTime(DateFilter::default()),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            FilterDefinition::String(_) => ColumnKind::String,
            FilterDefinition::Number(_) => ColumnKind::Number,
            FilterDefinition::Integer(_) => ColumnKind::Integer,
            FilterDefinition::Float(_) => ColumnKind::Float,
            FilterDefinition::Boolean(_) => ColumnKind::Boolean,
            FilterDefinition::Category(_) => ColumnKind::Category,
            FilterDefinition::Date(_) => ColumnKind::Date,
            FilterDefinition::DateTime(_) => ColumnKind::Datetime,
        }
    }
}

impl fmt::Display for FilterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDefinition::String(s) if s.operator.takes_operand() => {
                write!(f, "{} \"{}\"", s.operator.label(), s.value)
            }
            FilterDefinition::String(s) => f.write_str(s.operator.label()),
            FilterDefinition::Number(n)
            | FilterDefinition::Integer(n)
            | FilterDefinition::Float(n) => match (n.operator, &n.value2) {
                (NumberOperator::Between, Some(hi)) => write!(f, "between {} and {hi}", n.value),
                (op, _) if op.takes_operand() => write!(f, "{} {}", op.label(), n.value),
                (op, _) => f.write_str(op.label()),
            },
            FilterDefinition::Boolean(b) => f.write_str(b.value.label()),
            FilterDefinition::Category(c) => write!(f, "{} selected", c.values.len()),
            FilterDefinition::Date(d) | FilterDefinition::DateTime(d) => {
                match (d.operator, &d.value2) {
                    (DateOperator::Between, Some(end)) => {
                        write!(f, "between {} and {end}", d.value)
                    }
                    (op, _) if op.takes_operand() => write!(f, "{} {}", op.label(), d.value),
                    (op, _) => f.write_str(op.label()),
                }
            }
        }
    }
}

/// A filter definition bound to the column it constrains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    #[serde(flatten)]
    pub definition: FilterDefinition,
}

impl ColumnFilter {
    pub fn kind(&self) -> ColumnKind {
        self.definition.kind()
    }
}

// ---------------------------------------------------------------------------
// Filter store
// ---------------------------------------------------------------------------

/// Active filters keyed by column name. A missing column means no constraint.
pub type FilterSet = BTreeMap<String, ColumnFilter>;

/// Holds the filters applied to the current dataset.
///
/// Clearing a filter removes the entry; a filter whose operand is empty stays
/// stored but evaluates as inactive.
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    filters: FilterSet,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the filter for `column`.
    pub fn set_filter(&mut self, column: impl Into<String>, definition: FilterDefinition) {
        let column = column.into();
        self.filters.insert(
            column.clone(),
            ColumnFilter {
                column,
                definition,
            },
        );
    }

    /// Remove the filter for `column`. Returns whether one was present.
    pub fn clear_filter(&mut self, column: &str) -> bool {
        self.filters.remove(column).is_some()
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, column: &str) -> Option<&FilterDefinition> {
        self.filters.get(column).map(|f| &f.definition)
    }

    pub fn is_filtered(&self, column: &str) -> bool {
        self.filters.contains_key(column)
    }

    pub fn active_filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_column_kind() {
        assert_eq!(
            FilterDefinition::default_for(ColumnKind::Integer),
            FilterDefinition::Integer(NumberFilter::default())
        );
        for kind in [ColumnKind::Number, ColumnKind::Integer, ColumnKind::Float] {
            assert_eq!(FilterDefinition::default_for(kind).kind(), kind);
        }
        assert_eq!(
            FilterDefinition::default_for(ColumnKind::Boolean),
            FilterDefinition::Boolean(BooleanFilter {
                value: BooleanChoice::All
            })
        );
        assert_eq!(
            FilterDefinition::default_for(ColumnKind::Datetime).kind(),
            ColumnKind::Datetime
        );
    }

    #[test]
    fn definitions_parse_from_json() {
        let number: FilterDefinition = serde_json::from_str(
            r#"{"type":"integer","operator":"between","value":"20","value2":"40"}"#,
        )
        .unwrap();
        assert_eq!(
            number,
            FilterDefinition::Integer(NumberFilter {
                operator: NumberOperator::Between,
                value: "20".into(),
                value2: Some("40".into()),
            })
        );
        assert_eq!(number.kind(), ColumnKind::Integer);

        let category: FilterDefinition =
            serde_json::from_str(r#"{"type":"category","value":["active"]}"#).unwrap();
        assert_eq!(
            category,
            FilterDefinition::Category(CategoryFilter {
                values: vec!["active".into()]
            })
        );

        let string: FilterDefinition =
            serde_json::from_str(r#"{"type":"string","operator":"startsWith","value":"Al"}"#)
                .unwrap();
        assert_eq!(string.kind(), ColumnKind::String);
    }

    #[test]
    fn store_set_replace_and_clear() {
        let mut store = FilterStore::new();
        store.set_filter("age", FilterDefinition::default_for(ColumnKind::Number));
        store.set_filter("age", FilterDefinition::default_for(ColumnKind::Number));
        store.set_filter("name", FilterDefinition::default_for(ColumnKind::String));
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_filters()["age"].column, "age");

        assert!(store.clear_filter("age"));
        assert!(!store.clear_filter("age"));
        assert!(!store.is_filtered("age"));
        assert!(store.is_filtered("name"));
    }
}
