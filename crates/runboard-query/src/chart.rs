//! Aggregation / chart builder
//!
//! Buckets results by UTC calendar day and produces one [`ChartPoint`] per
//! day, ascending. In [`ChartMode::Individual`] each scheme contributes one
//! representative value per day; in [`ChartMode::Grouped`] each scheme
//! contributes a histogram of its display labels.

use runboard_scheme::{
    decode_value, format_display_value, ClassificationResult, ClassificationScheme, DisplayValue,
    DocumentId, SchemeId, TypedValue,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Label used when a result has no displayable value
pub const NO_DATA_LABEL: &str = "N/A";

const SUMMARY_LABEL_CHARS: usize = 30;

/// Aggregation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartMode {
    /// One representative value per (day, scheme)
    #[default]
    Individual,
    /// Per-day histogram of labels per scheme
    Grouped,
}

/// Value plotted for a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartValue {
    /// Histogram count
    Count(usize),
    /// Numeric display value
    Number(f64),
    /// Non-numeric display value
    Label(String),
}

/// Aggregate for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// UTC calendar day
    pub date: chrono::NaiveDate,
    /// Day as `YYYY-MM-DD`
    pub date_string: String,
    /// Total results on this day
    pub count: usize,
    /// Distinct documents with results on this day
    pub documents: Vec<DocumentId>,
    /// Series values keyed by scheme name (individual) or
    /// `{scheme}_{label}` (grouped)
    pub values: BTreeMap<String, ChartValue>,
    /// Per-document display strings keyed by scheme name
    pub document_values: BTreeMap<DocumentId, BTreeMap<String, String>>,
}

impl ChartPoint {
    fn new(date: chrono::NaiveDate) -> Self {
        Self {
            date,
            date_string: date.format("%Y-%m-%d").to_string(),
            count: 0,
            documents: Vec::new(),
            values: BTreeMap::new(),
            document_values: BTreeMap::new(),
        }
    }
}

/// Build chart points from results
///
/// Results of unknown schemes count toward `count` and `documents` only.
#[must_use]
pub fn build_series(
    results: &[ClassificationResult],
    schemes: &[ClassificationScheme],
    mode: ChartMode,
) -> Vec<ChartPoint> {
    let by_id: HashMap<SchemeId, &ClassificationScheme> =
        schemes.iter().map(|s| (s.id, s)).collect();

    let mut by_day: BTreeMap<chrono::NaiveDate, Vec<&ClassificationResult>> = BTreeMap::new();
    for result in results {
        by_day
            .entry(result.timestamp.date_naive())
            .or_default()
            .push(result);
    }

    by_day
        .into_iter()
        .map(|(date, day_results)| {
            let mut point = ChartPoint::new(date);
            point.count = day_results.len();
            point.documents = day_results
                .iter()
                .map(|r| r.document_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            for result in &day_results {
                if let Some(scheme) = by_id.get(&result.scheme_id) {
                    point
                        .document_values
                        .entry(result.document_id)
                        .or_default()
                        .insert(scheme.name.clone(), display_label(result, scheme));
                }
            }

            match mode {
                ChartMode::Individual => fill_individual(&mut point, &day_results, &by_id),
                ChartMode::Grouped => fill_grouped(&mut point, &day_results, &by_id),
            }
            point
        })
        .collect()
}

fn fill_individual(
    point: &mut ChartPoint,
    day_results: &[&ClassificationResult],
    schemes: &HashMap<SchemeId, &ClassificationScheme>,
) {
    let mut representative: BTreeMap<SchemeId, &ClassificationResult> = BTreeMap::new();
    for result in day_results {
        if !schemes.contains_key(&result.scheme_id) {
            continue;
        }
        let replace = representative
            .get(&result.scheme_id)
            .map_or(true, |current| result.timestamp >= current.timestamp);
        if replace {
            representative.insert(result.scheme_id, *result);
        }
    }

    for (scheme_id, result) in representative {
        let Some(scheme) = schemes.get(&scheme_id) else {
            continue;
        };
        let value = match format_display_value(&result.value, scheme) {
            Some(DisplayValue::Number(n)) => ChartValue::Number(n),
            Some(other) => ChartValue::Label(other.text()),
            None => ChartValue::Label(NO_DATA_LABEL.to_string()),
        };
        point.values.insert(scheme.name.clone(), value);
    }
}

fn fill_grouped(
    point: &mut ChartPoint,
    day_results: &[&ClassificationResult],
    schemes: &HashMap<SchemeId, &ClassificationScheme>,
) {
    for result in day_results {
        let Some(scheme) = schemes.get(&result.scheme_id) else {
            continue;
        };
        for label in grouped_labels(result, scheme) {
            let key = format!("{}_{}", scheme.name, label);
            let slot = point.values.entry(key).or_insert(ChartValue::Count(0));
            if let ChartValue::Count(n) = slot {
                *n += 1;
            }
        }
    }
}

fn grouped_labels(result: &ClassificationResult, scheme: &ClassificationScheme) -> Vec<String> {
    let labels = scheme
        .active_field()
        .map(|f| f.labels.as_slice())
        .unwrap_or_default();

    match decode_value(&result.value, scheme) {
        Ok(None) => vec![NO_DATA_LABEL.to_string()],
        Ok(Some(TypedValue::EntityStatements(records))) => {
            let entities: Vec<String> = records
                .iter()
                .filter_map(|r| r.entity.as_deref())
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(|e| format!("Entity: {e}"))
                .collect();
            if entities.is_empty() {
                vec![format!("{} items", records.len())]
            } else {
                entities
            }
        }
        Ok(Some(TypedValue::LabelSet(choices))) if !choices.is_empty() => {
            choices.iter().map(|c| c.resolve(labels)).collect()
        }
        Ok(Some(TypedValue::Summary(summary))) => vec![truncate_label(&summary)],
        _ => vec![display_label(result, scheme)],
    }
}

fn display_label(result: &ClassificationResult, scheme: &ClassificationScheme) -> String {
    format_display_value(&result.value, scheme)
        .map_or_else(|| NO_DATA_LABEL.to_string(), |d| d.text())
}

fn truncate_label(text: &str) -> String {
    if text.chars().count() > SUMMARY_LABEL_CHARS {
        let head: String = text.chars().take(SUMMARY_LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use runboard_scheme::{Field, ResultId, RunId};
    use serde_json::{json, Value};

    const SENTIMENT: SchemeId = SchemeId(1);
    const MENTIONS: SchemeId = SchemeId(2);
    const SCORE: SchemeId = SchemeId(3);

    fn schemes() -> Vec<ClassificationScheme> {
        vec![
            ClassificationScheme::new(SENTIMENT, "Sentiment").with_field(Field::binary("positive")),
            ClassificationScheme::new(MENTIONS, "Mentions")
                .with_field(Field::entity_statements("mentions")),
            ClassificationScheme::new(SCORE, "Score")
                .with_field(Field::number("score").with_scale(0.0, 10.0)),
        ]
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 8, 0, 0).unwrap()
    }

    fn result(id: i64, doc: i64, scheme: SchemeId, at: DateTime<Utc>, value: Value) -> ClassificationResult {
        ClassificationResult::new(ResultId(id), DocumentId(doc), scheme, RunId::generate(), value)
            .with_timestamp(at)
    }

    #[test]
    fn later_result_wins_individual_mode() {
        let results = vec![
            result(1, 1, SENTIMENT, day(3), json!(0.2)),
            result(2, 2, SENTIMENT, day(3) + Duration::hours(2), json!(0.9)),
        ];
        let points = build_series(&results, &schemes(), ChartMode::Individual);
        assert_eq!(points.len(), 1);
        assert_eq!(
            points[0].values.get("Sentiment"),
            Some(&ChartValue::Label("Positive".into()))
        );
        assert_eq!(points[0].count, 2);
        assert_eq!(points[0].documents, vec![DocumentId(1), DocumentId(2)]);
    }

    #[test]
    fn equal_timestamps_resolve_to_last_processed() {
        let results = vec![
            result(1, 1, SCORE, day(3), json!(4)),
            result(2, 2, SCORE, day(3), json!(7)),
        ];
        let points = build_series(&results, &schemes(), ChartMode::Individual);
        assert_eq!(points[0].values.get("Score"), Some(&ChartValue::Number(7.0)));
    }

    #[test]
    fn points_are_ascending_by_day() {
        let results = vec![
            result(1, 1, SCORE, day(5), json!(1)),
            result(2, 1, SCORE, day(2), json!(2)),
        ];
        let points = build_series(&results, &schemes(), ChartMode::Individual);
        let dates: Vec<_> = points.iter().map(|p| p.date_string.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-02", "2024-06-05"]);
    }

    #[test]
    fn grouped_mode_counts_labels_and_entities() {
        let results = vec![
            result(1, 1, SENTIMENT, day(1), json!(0.9)),
            result(2, 2, SENTIMENT, day(1), json!(0.8)),
            result(3, 3, SENTIMENT, day(1), json!(null)),
            result(4, 1, MENTIONS, day(1), json!([
                {"entity": "NATO", "statement": "a"},
                {"entity": "EU", "statement": "b"}
            ])),
            result(5, 2, MENTIONS, day(1), json!([{"statement": "x"}, {"statement": "y"}])),
        ];
        let points = build_series(&results, &schemes(), ChartMode::Grouped);
        let values = &points[0].values;

        assert_eq!(values.get("Sentiment_Positive"), Some(&ChartValue::Count(2)));
        assert_eq!(values.get("Sentiment_N/A"), Some(&ChartValue::Count(1)));
        assert_eq!(values.get("Mentions_Entity: NATO"), Some(&ChartValue::Count(1)));
        assert_eq!(values.get("Mentions_Entity: EU"), Some(&ChartValue::Count(1)));
        assert_eq!(values.get("Mentions_2 items"), Some(&ChartValue::Count(1)));
    }

    #[test]
    fn grouped_summaries_are_truncated() {
        let results = vec![result(
            1,
            1,
            MENTIONS,
            day(1),
            json!({"default_field": "A very long free text summary that keeps going"}),
        )];
        let points = build_series(&results, &schemes(), ChartMode::Grouped);
        let keys: Vec<_> = points[0].values.keys().cloned().collect();
        assert_eq!(keys, vec!["Mentions_A very long free text summary ...".to_string()]);
    }

    #[test]
    fn chart_points_survive_json_round_trip() {
        let results = vec![
            result(1, 1, SCORE, day(4), json!(7)),
            result(2, 2, SENTIMENT, day(4), json!(0.9)),
        ];
        for mode in [ChartMode::Individual, ChartMode::Grouped] {
            let points = build_series(&results, &schemes(), mode);
            let encoded = serde_json::to_string(&points).unwrap();
            let decoded: Vec<ChartPoint> = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, points);
        }
    }

    #[test]
    fn unknown_schemes_only_count() {
        let results = vec![
            result(1, 1, SchemeId(99), day(1), json!(1)),
            result(2, 2, SCORE, day(1), json!(null)),
        ];
        let points = build_series(&results, &schemes(), ChartMode::Individual);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[0].values.len(), 1);
        assert_eq!(
            points[0].values.get("Score"),
            Some(&ChartValue::Label(NO_DATA_LABEL.into()))
        );
        assert_eq!(
            points[0].document_values[&DocumentId(2)].get("Score").map(String::as_str),
            Some("N/A")
        );
        assert!(!points[0].document_values.contains_key(&DocumentId(1)));
    }
}
