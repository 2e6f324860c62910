//! Filter engine
//!
//! A document matches a filter set iff, for every filter, at least one of
//! its results under the filter's scheme satisfies the predicate. Documents
//! without results for a filter's scheme are never excluded by it.
//!
//! Predicates are evaluated over display values:
//! - `Equals`: case-insensitive text, exact numbers, list elements
//! - `Contains`: case-insensitive substring; record lists probe every
//!   string sub-field and then the raw JSON
//! - `Range`: inclusive bounds on numeric displays; anything else passes

use crate::error::FilterError;
use runboard_scheme::{
    decode_value, format_display_value, ClassificationResult, ClassificationScheme, DisplayValue,
    DocumentId, FieldKind, RunId, SchemeId, TypedValue,
};
use runboard_store::ResultStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Display value equals the filter value
    Equals,
    /// Display value contains the filter text
    Contains,
    /// Numeric display value within bounds
    Range,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::Range => "range",
        })
    }
}

/// Filter value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FilterValue {
    /// No value yet; the filter matches everything
    #[default]
    Empty,
    /// Number
    Number(f64),
    /// Text
    Text(String),
    /// Inclusive numeric range
    Range {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

impl FilterValue {
    fn shape(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Range { .. } => "range",
        }
    }

    fn fits(&self, operator: FilterOperator) -> bool {
        matches!(
            (operator, self),
            (FilterOperator::Equals, Self::Number(_) | Self::Text(_))
                | (FilterOperator::Contains, Self::Text(_))
                | (FilterOperator::Range, Self::Range { .. })
        )
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Operators a field kind supports; the first is the default
#[must_use]
pub fn legal_operators(kind: FieldKind) -> &'static [FilterOperator] {
    use FilterOperator::{Contains, Equals, Range};
    match kind {
        FieldKind::Number | FieldKind::Binary => &[Equals, Range],
        FieldKind::TextList | FieldKind::LabelSet => &[Contains, Equals],
        FieldKind::EntityStatementList => &[Contains],
        FieldKind::Text => &[Equals, Contains],
    }
}

/// One filter criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Scheme whose results are tested
    pub scheme_id: SchemeId,
    /// Operator
    pub operator: FilterOperator,
    /// Operand
    #[serde(default)]
    pub value: FilterValue,
}

impl Filter {
    /// Create filter
    #[inline]
    #[must_use]
    pub fn new(scheme_id: SchemeId, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            scheme_id,
            operator,
            value,
        }
    }

    /// `Equals` filter
    #[inline]
    #[must_use]
    pub fn equals(scheme_id: SchemeId, value: impl Into<FilterValue>) -> Self {
        Self::new(scheme_id, FilterOperator::Equals, value.into())
    }

    /// `Contains` filter
    #[inline]
    #[must_use]
    pub fn contains(scheme_id: SchemeId, text: impl Into<String>) -> Self {
        Self::new(
            scheme_id,
            FilterOperator::Contains,
            FilterValue::Text(text.into()),
        )
    }

    /// `Range` filter
    #[inline]
    #[must_use]
    pub fn range(scheme_id: SchemeId, min: f64, max: f64) -> Self {
        Self::new(scheme_id, FilterOperator::Range, FilterValue::Range { min, max })
    }

    /// Point the filter at another scheme
    ///
    /// Resets the operator to the scheme's default and clears the value.
    pub fn retarget(&mut self, scheme: &ClassificationScheme) {
        self.scheme_id = scheme.id;
        self.operator = scheme
            .kind()
            .and_then(|kind| legal_operators(kind).first().copied())
            .unwrap_or(FilterOperator::Equals);
        self.value = FilterValue::Empty;
    }

    /// Check the filter against the loaded schemes
    ///
    /// An `Empty` value is valid (the filter is simply not yet active).
    ///
    /// # Errors
    /// Returns the first problem found: unknown scheme, scheme without
    /// fields, operator illegal for the field kind, value shape or range
    /// bounds.
    pub fn validate(&self, schemes: &[ClassificationScheme]) -> Result<(), FilterError> {
        let scheme = schemes
            .iter()
            .find(|s| s.id == self.scheme_id)
            .ok_or(FilterError::UnknownScheme(self.scheme_id))?;
        let kind = scheme
            .kind()
            .ok_or(FilterError::NoActiveField(scheme.id))?;

        if !legal_operators(kind).contains(&self.operator) {
            return Err(FilterError::IllegalOperator {
                operator: self.operator,
                kind,
            });
        }

        match &self.value {
            FilterValue::Empty => Ok(()),
            value if !value.fits(self.operator) => Err(FilterError::ValueShape {
                operator: self.operator,
                found: value.shape(),
            }),
            FilterValue::Range { min, max } if min > max => Err(FilterError::InvalidRange {
                min: *min,
                max: *max,
            }),
            _ => Ok(()),
        }
    }

    /// Whether this filter takes part in evaluation
    fn is_active(&self, schemes: &HashMap<SchemeId, &ClassificationScheme>) -> bool {
        if !schemes.contains_key(&self.scheme_id) {
            tracing::debug!(scheme_id = %self.scheme_id, "Ignoring filter on unknown scheme");
            return false;
        }
        if self.value == FilterValue::Empty {
            return false;
        }
        if !self.value.fits(self.operator) {
            tracing::warn!(
                scheme_id = %self.scheme_id,
                operator = %self.operator,
                value = self.value.shape(),
                "Ignoring malformed filter"
            );
            return false;
        }
        true
    }
}

/// Documents matching every filter
///
/// With no active filters, every document present in `results` matches.
#[must_use]
pub fn apply(
    filters: &[Filter],
    results: &[ClassificationResult],
    schemes: &[ClassificationScheme],
) -> BTreeSet<DocumentId> {
    let by_id: HashMap<SchemeId, &ClassificationScheme> =
        schemes.iter().map(|s| (s.id, s)).collect();
    let active: Vec<&Filter> = filters.iter().filter(|f| f.is_active(&by_id)).collect();

    let mut by_document: BTreeMap<DocumentId, Vec<&ClassificationResult>> = BTreeMap::new();
    for result in results {
        by_document.entry(result.document_id).or_default().push(result);
    }

    by_document
        .into_iter()
        .filter(|(_, doc_results)| {
            active.iter().all(|filter| {
                let scheme = by_id[&filter.scheme_id];
                let mut relevant = doc_results
                    .iter()
                    .filter(|r| r.scheme_id == filter.scheme_id)
                    .peekable();
                relevant.peek().is_none() || relevant.any(|r| satisfies(filter, r, scheme))
            })
        })
        .map(|(document_id, _)| document_id)
        .collect()
}

fn satisfies(filter: &Filter, result: &ClassificationResult, scheme: &ClassificationScheme) -> bool {
    let display = format_display_value(&result.value, scheme);

    match (&filter.value, display) {
        (FilterValue::Range { min, max }, Some(display)) => display
            .rounded()
            .map_or(true, |n| *min <= n && n <= *max),
        (FilterValue::Range { .. }, None) => true,
        (_, None) => false,
        (FilterValue::Number(n), Some(display)) => {
            equals_number(*n, &display, &typed(result, scheme))
        }
        (FilterValue::Text(text), Some(display)) => match filter.operator {
            FilterOperator::Contains => contains_text(text, &display, result, scheme),
            _ => equals_text(text, &display, &typed(result, scheme), scheme),
        },
        (FilterValue::Empty, Some(_)) => true,
    }
}

fn typed(result: &ClassificationResult, scheme: &ClassificationScheme) -> Option<TypedValue> {
    decode_value(&result.value, scheme).ok().flatten()
}

#[allow(clippy::float_cmp)]
fn equals_number(n: f64, display: &DisplayValue, typed: &Option<TypedValue>) -> bool {
    let numeric = display
        .as_number()
        .or_else(|| typed.as_ref().and_then(TypedValue::as_number))
        .is_some_and(|value| value == n);

    numeric || display.text().trim() == number_text(n)
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

#[allow(clippy::float_cmp)]
fn equals_text(
    text: &str,
    display: &DisplayValue,
    typed: &Option<TypedValue>,
    scheme: &ClassificationScheme,
) -> bool {
    let needle = text.trim();
    if let (Some(n), Ok(wanted)) = (display.as_number(), needle.parse::<f64>()) {
        if n == wanted {
            return true;
        }
    }
    if display.text().trim().eq_ignore_ascii_case(needle) {
        return true;
    }
    list_elements(typed, scheme)
        .iter()
        .any(|element| element.trim().eq_ignore_ascii_case(needle))
}

fn list_elements(typed: &Option<TypedValue>, scheme: &ClassificationScheme) -> Vec<String> {
    match typed {
        Some(TypedValue::TextList(items)) => items.clone(),
        Some(TypedValue::LabelSet(choices)) => {
            let labels = scheme
                .active_field()
                .map(|f| f.labels.as_slice())
                .unwrap_or_default();
            choices.iter().map(|c| c.resolve(labels)).collect()
        }
        Some(TypedValue::EntityStatements(records)) => {
            records.iter().filter_map(|r| r.entity.clone()).collect()
        }
        _ => Vec::new(),
    }
}

fn contains_text(
    text: &str,
    display: &DisplayValue,
    result: &ClassificationResult,
    scheme: &ClassificationScheme,
) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);

    if scheme.kind() == Some(FieldKind::EntityStatementList) {
        match typed(result, scheme) {
            Some(TypedValue::EntityStatements(records)) => {
                if records.iter().any(|r| r.text_fields().any(hit)) {
                    return true;
                }
            }
            Some(TypedValue::Summary(summary)) => {
                if hit(summary.as_str()) {
                    return true;
                }
            }
            _ => {}
        }
        return hit(display.text().as_str()) || hit(result.value.to_string().as_str());
    }

    hit(display.text().as_str())
}

/// Filter engine bound to a set of schemes
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    schemes: Vec<ClassificationScheme>,
}

impl FilterEngine {
    /// Create engine for the given schemes
    #[inline]
    #[must_use]
    pub fn new(schemes: Vec<ClassificationScheme>) -> Self {
        Self { schemes }
    }

    /// Loaded schemes
    #[inline]
    #[must_use]
    pub fn schemes(&self) -> &[ClassificationScheme] {
        &self.schemes
    }

    /// Documents matching every filter
    #[must_use]
    pub fn apply(&self, filters: &[Filter], results: &[ClassificationResult]) -> BTreeSet<DocumentId> {
        apply(filters, results, &self.schemes)
    }

    /// Apply filters to a store snapshot, optionally restricted to one run
    #[must_use]
    pub fn apply_to_store(
        &self,
        filters: &[Filter],
        store: &ResultStore,
        run_id: Option<RunId>,
    ) -> BTreeSet<DocumentId> {
        let results = match run_id {
            Some(run_id) => store.by_run(run_id),
            None => store.snapshot(),
        };
        self.apply(filters, &results)
    }

    /// Results belonging to matching documents, in input order
    #[must_use]
    pub fn filter_results(
        &self,
        filters: &[Filter],
        results: &[ClassificationResult],
    ) -> Vec<ClassificationResult> {
        let matched = self.apply(filters, results);
        results
            .iter()
            .filter(|r| matched.contains(&r.document_id))
            .cloned()
            .collect()
    }

    /// Validate every filter
    ///
    /// # Errors
    /// Returns the first invalid filter's error
    pub fn validate(&self, filters: &[Filter]) -> Result<(), FilterError> {
        filters.iter().try_for_each(|f| f.validate(&self.schemes))
    }
}
