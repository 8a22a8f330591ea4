use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::filter::{
    BooleanChoice, BooleanFilter, CategoryFilter, DateFilter, DateOperator, FilterDefinition,
    FilterSet, NumberFilter, NumberOperator, StringFilter, StringOperator,
};
use super::model::{CellValue, Row, leading_number};

// ---------------------------------------------------------------------------
// Row-level evaluation
// ---------------------------------------------------------------------------

/// Whether `row` satisfies every filter in `filters`.
///
/// A column missing from the row is evaluated as `Null`.
pub fn evaluate(row: &Row, filters: &FilterSet) -> bool {
    filters.values().all(|filter| {
        let cell = row.get(&filter.column).unwrap_or(&CellValue::Null);
        filter.definition.matches(cell)
    })
}

/// Indices of rows passing all filters, in row order.
pub fn filtered_indices(rows: &[Row], filters: &FilterSet) -> Vec<usize> {
    if filters.is_empty() {
        return (0..rows.len()).collect();
    }
    rows.iter()
        .enumerate()
        .filter(|(_, row)| evaluate(row, filters))
        .map(|(i, _)| i)
        .collect()
}

/// The subsequence of `rows` passing all filters.
pub fn filter_rows(rows: &[Row], filters: &FilterSet) -> Vec<Row> {
    rows.iter()
        .filter(|row| evaluate(row, filters))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Per-kind predicates
// ---------------------------------------------------------------------------

impl FilterDefinition {
    /// Whether this filter would constrain any row at all.
    ///
    /// Missing or unparseable operands make a filter inactive.
    pub fn is_active(&self) -> bool {
        match self {
            FilterDefinition::String(f) => !f.operator.takes_operand() || !f.value.is_empty(),
            FilterDefinition::Number(f)
            | FilterDefinition::Integer(f)
            | FilterDefinition::Float(f) => {
                if !f.operator.takes_operand() {
                    return true;
                }
                let lower = parse_number(&f.value).is_some();
                match f.operator {
                    NumberOperator::Between => {
                        lower && f.value2.as_deref().and_then(parse_number).is_some()
                    }
                    _ => lower,
                }
            }
            FilterDefinition::Boolean(f) => f.value != BooleanChoice::All,
            FilterDefinition::Category(f) => !f.values.is_empty(),
            FilterDefinition::Date(f) | FilterDefinition::DateTime(f) => {
                if !f.operator.takes_operand() {
                    return true;
                }
                let start = parse_timestamp(&f.value).is_some();
                match f.operator {
                    DateOperator::Between => {
                        start && f.value2.as_deref().and_then(parse_timestamp).is_some()
                    }
                    _ => start,
                }
            }
        }
    }

    /// Evaluate the predicate against one cell. Never panics.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterDefinition::String(f) => matches_string(f, cell),
            FilterDefinition::Number(f)
            | FilterDefinition::Integer(f)
            | FilterDefinition::Float(f) => matches_number(f, cell),
            FilterDefinition::Boolean(f) => matches_boolean(f, cell),
            FilterDefinition::Category(f) => matches_category(f, cell),
            FilterDefinition::Date(f) | FilterDefinition::DateTime(f) => matches_date(f, cell),
        }
    }
}

fn matches_string(filter: &StringFilter, cell: &CellValue) -> bool {
    let test = |predicate: fn(&str, &str) -> bool| {
        let needle = filter.value.to_lowercase();
        needle.is_empty() || predicate(&cell.as_text().to_lowercase(), &needle)
    };

    match filter.operator {
        StringOperator::Contains => test(|text, needle| text.contains(needle)),
        StringOperator::NotContains => test(|text, needle| !text.contains(needle)),
        StringOperator::Equals => test(|text, needle| text == needle),
        StringOperator::StartsWith => test(|text, needle| text.starts_with(needle)),
        StringOperator::EndsWith => test(|text, needle| text.ends_with(needle)),
        StringOperator::IsEmpty => cell.is_blank(),
        StringOperator::IsNotEmpty => !cell.is_blank(),
    }
}

fn matches_number(filter: &NumberFilter, cell: &CellValue) -> bool {
    // A valid operand against a non-numeric cell always fails.
    let compare = |predicate: fn(f64, f64) -> bool| match parse_number(&filter.value) {
        Some(operand) => cell.as_f64().is_some_and(|value| predicate(value, operand)),
        None => true,
    };

    match filter.operator {
        NumberOperator::Equals => compare(|value, operand| value == operand),
        NumberOperator::NotEquals => compare(|value, operand| value != operand),
        NumberOperator::GreaterThan => compare(|value, operand| value > operand),
        NumberOperator::LessThan => compare(|value, operand| value < operand),
        NumberOperator::GreaterThanOrEqual => compare(|value, operand| value >= operand),
        NumberOperator::LessThanOrEqual => compare(|value, operand| value <= operand),
        NumberOperator::Between => {
            let lower = parse_number(&filter.value);
            let upper = filter.value2.as_deref().and_then(parse_number);
            match (lower, upper) {
                (Some(lo), Some(hi)) => cell.as_f64().is_some_and(|v| v >= lo && v <= hi),
                _ => true,
            }
        }
        NumberOperator::IsEmpty => cell.is_blank(),
        NumberOperator::IsNotEmpty => !cell.is_blank(),
    }
}

fn matches_boolean(filter: &BooleanFilter, cell: &CellValue) -> bool {
    match filter.value {
        BooleanChoice::All => true,
        BooleanChoice::True => cell.as_text().to_lowercase() == "true",
        BooleanChoice::False => cell.as_text().to_lowercase() == "false",
        BooleanChoice::Empty => cell.is_blank(),
    }
}

fn matches_category(filter: &CategoryFilter, cell: &CellValue) -> bool {
    if filter.values.is_empty() {
        return true;
    }
    let text = cell.as_text().to_lowercase();
    filter.values.iter().any(|v| v.to_lowercase() == text)
}

fn matches_date(filter: &DateFilter, cell: &CellValue) -> bool {
    let compare = |predicate: fn(NaiveDateTime, NaiveDateTime) -> bool| {
        match parse_timestamp(&filter.value) {
            Some(operand) => {
                parse_timestamp(&cell.as_text()).is_some_and(|value| predicate(value, operand))
            }
            None => true,
        }
    };

    match filter.operator {
        DateOperator::Equals => compare(|value, operand| value.date() == operand.date()),
        DateOperator::Before => compare(|value, operand| value < operand),
        DateOperator::After => compare(|value, operand| value > operand),
        DateOperator::Between => {
            let start = parse_timestamp(&filter.value);
            let end = filter.value2.as_deref().and_then(parse_timestamp);
            match (start, end) {
                (Some(start), Some(end)) => parse_timestamp(&cell.as_text())
                    .is_some_and(|value| value >= start && value <= end),
                _ => true,
            }
        }
        DateOperator::IsEmpty => cell.is_blank(),
        DateOperator::IsNotEmpty => !cell.is_blank(),
    }
}

// ---------------------------------------------------------------------------
// Operand parsing
// ---------------------------------------------------------------------------

/// Parse a numeric operand from its leading number, so `"26a"` is 26.
/// Blank and non-numeric inputs yield `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    leading_number(raw)
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date or timestamp as naive wall-clock time.
///
/// RFC 3339 inputs keep the clock time of their own offset, so
/// `2024-03-15T23:30:00-03:00` stays on the 15th. Date-only inputs resolve
/// to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{ColumnFilter, FilterStore};

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    fn single(column: &str, json: &str) -> FilterSet {
        let mut store = FilterStore::new();
        let definition: FilterDefinition = serde_json::from_str(json).unwrap();
        store.set_filter(column, definition);
        store.active_filters().clone()
    }

    #[test]
    fn string_operators_ignore_case() {
        let cell = text("Maria Silva");
        let check = |op: StringOperator, value: &str| {
            FilterDefinition::String(StringFilter {
                operator: op,
                value: value.into(),
            })
            .matches(&cell)
        };
        assert!(check(StringOperator::Contains, "SILVA"));
        assert!(check(StringOperator::Equals, "maria silva"));
        assert!(check(StringOperator::StartsWith, "mar"));
        assert!(check(StringOperator::EndsWith, "VA"));
        assert!(!check(StringOperator::NotContains, "ria"));
        assert!(!check(StringOperator::Equals, "maria"));
    }

    #[test]
    fn empty_string_operand_is_inactive() {
        let filter = FilterDefinition::String(StringFilter {
            operator: StringOperator::Equals,
            value: String::new(),
        });
        assert!(!filter.is_active());
        assert!(filter.matches(&text("anything")));
        assert!(filter.matches(&CellValue::Null));
    }

    #[test]
    fn string_emptiness_checks() {
        let empty = FilterDefinition::String(StringFilter {
            operator: StringOperator::IsEmpty,
            value: String::new(),
        });
        assert!(empty.is_active());
        assert!(empty.matches(&CellValue::Null));
        assert!(empty.matches(&text("")));
        assert!(!empty.matches(&text(" x ")));
    }

    #[test]
    fn numeric_comparisons() {
        let cell = CellValue::Integer(30);
        let check = |op: NumberOperator, value: &str| {
            FilterDefinition::Number(NumberFilter {
                operator: op,
                value: value.into(),
                value2: None,
            })
            .matches(&cell)
        };
        assert!(check(NumberOperator::Equals, "30"));
        assert!(check(NumberOperator::Equals, "30.0"));
        assert!(check(NumberOperator::NotEquals, "29"));
        assert!(check(NumberOperator::GreaterThan, "26"));
        assert!(!check(NumberOperator::LessThan, "30"));
        assert!(check(NumberOperator::LessThanOrEqual, "30"));
        assert!(check(NumberOperator::GreaterThanOrEqual, " 30 "));
    }

    #[test]
    fn unparseable_numeric_operand_passes_all() {
        let filter = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::GreaterThan,
            value: "abc".into(),
            value2: None,
        });
        assert!(!filter.is_active());
        assert!(filter.matches(&CellValue::Integer(1)));
        assert!(filter.matches(&text("not a number")));
    }

    #[test]
    fn numbers_are_read_from_their_leading_digits() {
        let older = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::GreaterThan,
            value: "26".into(),
            value2: None,
        });
        assert!(older.matches(&text("30 anos")));
        assert!(!older.matches(&text("20 anos")));

        let sloppy = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::GreaterThan,
            value: "26a".into(),
            value2: None,
        });
        assert!(sloppy.is_active());
        let rows = vec![
            row(&[("age", CellValue::Integer(30))]),
            row(&[("age", CellValue::Integer(20))]),
        ];
        let filters = single("age", r#"{"type":"number","operator":"greaterThan","value":"26a"}"#);
        assert_eq!(filtered_indices(&rows, &filters), vec![0]);
    }

    #[test]
    fn between_with_bad_upper_bound_passes_all() {
        let filter = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::Between,
            value: "10".into(),
            value2: Some("ten".into()),
        });
        assert!(!filter.is_active());
        assert!(filter.matches(&CellValue::Integer(1000)));

        let missing = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::Between,
            value: "10".into(),
            value2: None,
        });
        assert!(missing.matches(&CellValue::Integer(1000)));
    }

    #[test]
    fn between_is_inclusive() {
        let filter = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::Between,
            value: "20".into(),
            value2: Some("40".into()),
        });
        assert!(filter.matches(&CellValue::Integer(20)));
        assert!(filter.matches(&CellValue::Float(40.0)));
        assert!(!filter.matches(&CellValue::Float(40.5)));
    }

    #[test]
    fn non_numeric_cells_fail_valid_comparisons() {
        let not_equal = FilterDefinition::Number(NumberFilter {
            operator: NumberOperator::NotEquals,
            value: "5".into(),
            value2: None,
        });
        assert!(!not_equal.matches(&text("n/a")));
        assert!(!not_equal.matches(&CellValue::Null));
        assert!(not_equal.matches(&text("6")));
    }

    #[test]
    fn boolean_tokens() {
        let pick = |choice| FilterDefinition::Boolean(BooleanFilter { value: choice });
        assert!(pick(BooleanChoice::All).matches(&text("whatever")));
        assert!(pick(BooleanChoice::True).matches(&CellValue::Bool(true)));
        assert!(pick(BooleanChoice::True).matches(&text("TRUE")));
        assert!(!pick(BooleanChoice::True).matches(&CellValue::Bool(false)));
        assert!(pick(BooleanChoice::False).matches(&text("false")));
        assert!(pick(BooleanChoice::Empty).matches(&CellValue::Null));
        assert!(pick(BooleanChoice::Empty).matches(&text("")));
        assert!(!pick(BooleanChoice::Empty).matches(&CellValue::Bool(false)));
    }

    #[test]
    fn category_membership_ignores_case() {
        let filter = FilterDefinition::Category(CategoryFilter {
            values: vec!["active".into(), "Pending".into()],
        });
        assert!(filter.matches(&text("Active")));
        assert!(filter.matches(&text("PENDING")));
        assert!(!filter.matches(&text("closed")));

        let none = FilterDefinition::Category(CategoryFilter { values: vec![] });
        assert!(none.matches(&text("closed")));
    }

    #[test]
    fn date_equality_uses_calendar_day() {
        let filter = FilterDefinition::Date(DateFilter {
            operator: DateOperator::Equals,
            value: "2024-03-15".into(),
            value2: None,
        });
        assert!(filter.matches(&text("2024-03-15T18:45:00")));
        assert!(filter.matches(&text("2024-03-15")));
        assert!(!filter.matches(&text("2024-03-16")));
        assert!(!filter.matches(&text("yesterday")));

        // Late evening west of UTC is still the same calendar day.
        assert!(filter.matches(&text("2024-03-15T23:30:00-03:00")));
        assert!(!filter.matches(&text("2024-03-16T01:00:00+02:00")));
    }

    #[test]
    fn datetime_ranges() {
        let filter = FilterDefinition::DateTime(DateFilter {
            operator: DateOperator::Between,
            value: "2024-01-01T08:00".into(),
            value2: Some("2024-01-01T17:00".into()),
        });
        assert!(filter.matches(&text("2024-01-01 08:00:00")));
        assert!(filter.matches(&text("2024-01-01T12:30:00Z")));
        assert!(!filter.matches(&text("2024-01-01T17:00:01")));

        let before = FilterDefinition::DateTime(DateFilter {
            operator: DateOperator::Before,
            value: "2024-01-01T08:00".into(),
            value2: None,
        });
        assert!(before.matches(&text("2023-12-31")));
        assert!(!before.matches(&text("2024-01-01T08:00")));
    }

    #[test]
    fn unparseable_dates_in_operands_pass_all() {
        let after = FilterDefinition::Date(DateFilter {
            operator: DateOperator::After,
            value: "15/03/2024".into(),
            value2: None,
        });
        assert!(!after.is_active());
        assert!(after.matches(&text("1999-01-01")));

        let open_range = FilterDefinition::Date(DateFilter {
            operator: DateOperator::Between,
            value: "2024-01-01".into(),
            value2: Some(String::new()),
        });
        assert!(open_range.matches(&text("1999-01-01")));
    }

    #[test]
    fn missing_columns_read_as_null() {
        let filters = single("active", r#"{"type":"boolean","value":"empty"}"#);
        assert!(evaluate(&row(&[("name", text("Bob"))]), &filters));
    }

    #[test]
    fn all_filters_must_pass() {
        let mut filters = single("age", r#"{"type":"number","operator":"greaterThan","value":"18"}"#);
        filters.insert(
            "name".into(),
            ColumnFilter {
                column: "name".into(),
                definition: FilterDefinition::String(StringFilter {
                    operator: StringOperator::StartsWith,
                    value: "a".into(),
                }),
            },
        );
        let rows = vec![
            row(&[("name", text("Alice")), ("age", CellValue::Integer(30))]),
            row(&[("name", text("Ana")), ("age", CellValue::Integer(12))]),
            row(&[("name", text("Bob")), ("age", CellValue::Integer(40))]),
        ];
        assert_eq!(filtered_indices(&rows, &filters), vec![0]);
    }

    #[test]
    fn timestamp_forms() {
        assert!(parse_timestamp("2024-02-29").is_some());
        assert!(parse_timestamp("2024/02/29").is_some());
        assert!(parse_timestamp("2024-02-29T10:15").is_some());
        assert!(parse_timestamp("2024-02-29 10:15:30.250").is_some());
        assert!(parse_timestamp("2024-02-29T10:15:30-03:00").is_some());
        assert!(parse_timestamp("2023-02-29").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
