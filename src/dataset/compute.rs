//! Pure statistical computations over a [`Dataset`], one function per
//! [`JobKind`]. None of these ever panic on missing data — only a
//! programming bug could panic here, and that is caught at the worker
//! boundary.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use super::{Dataset, TableEntry};
use crate::job::{JobArgs, JobKind};

/// Questions where a *lower* value is the better outcome.
const QUESTIONS_BEST_IS_MIN: &[&str] = &[
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Questions where a *higher* value is the better outcome.
const QUESTIONS_BEST_IS_MAX: &[&str] = &[
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic physical activity and engage in muscle-strengthening activities on 2 or more days a week",
    "Percent of adults who achieve at least 300 minutes a week of moderate-intensity aerobic physical activity or 150 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who engage in muscle-strengthening activities on 2 or more days a week",
];

/// Route a job's `(kind, args)` to the matching computation.
pub fn dispatch(dataset: &Dataset, kind: JobKind, args: &JobArgs) -> Value {
    match kind {
        JobKind::StatesMean => states_mean(dataset, &args.question),
        JobKind::StateMean => state_mean(dataset, &args.question, args.state.as_deref().unwrap_or("")),
        JobKind::Best5 => best5(dataset, &args.question),
        JobKind::Worst5 => worst5(dataset, &args.question),
        JobKind::GlobalMean => global_mean(dataset, &args.question),
        JobKind::DiffFromMean => diff_from_mean(dataset, &args.question),
        JobKind::StateDiffFromMean => {
            state_diff_from_mean(dataset, &args.question, args.state.as_deref().unwrap_or(""))
        }
        JobKind::MeanByCategory => mean_by_category(dataset, &args.question, None),
        JobKind::StateMeanByCategory => {
            mean_by_category(dataset, &args.question, args.state.as_deref())
        }
    }
}

fn per_state_means(entries: &[TableEntry], question: &str) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for entry in entries {
        if entry.question != question {
            continue;
        }
        let Some(value) = entry.data_value else {
            continue;
        };
        *totals.entry(entry.location_desc.clone()).or_insert(0.0) += value;
        *counts.entry(entry.location_desc.clone()).or_insert(0) += 1;
    }

    totals
        .into_iter()
        .map(|(state, total)| {
            let count = counts[&state] as f64;
            (state, total / count)
        })
        .collect()
}

fn sorted_map(mut pairs: Vec<(String, f64)>, ascending: bool) -> Value {
    pairs.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    let mut map = Map::new();
    for (state, mean) in pairs {
        map.insert(state, json!(mean));
    }
    Value::Object(map)
}

pub fn states_mean(dataset: &Dataset, question: &str) -> Value {
    let means = per_state_means(dataset.entries(), question);
    sorted_map(means.into_iter().collect(), true)
}

pub fn state_mean(dataset: &Dataset, question: &str, state: &str) -> Value {
    let values: Vec<f64> = dataset
        .entries()
        .iter()
        .filter(|e| e.question == question && e.location_desc == state)
        .filter_map(|e| e.data_value)
        .collect();

    if values.is_empty() {
        return json!({ state: Value::Null });
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    json!({ state: mean })
}

fn best_or_worst(dataset: &Dataset, question: &str, want_best: bool) -> Value {
    let has_rows = dataset.entries().iter().any(|e| e.question == question && e.data_value.is_some());
    if !has_rows {
        return json!({ "error": "No data available for the given question" });
    }

    let ascending = if QUESTIONS_BEST_IS_MIN.contains(&question) {
        want_best
    } else if QUESTIONS_BEST_IS_MAX.contains(&question) {
        !want_best
    } else {
        return json!({ "error": "Question not found in predefined lists" });
    };

    let means = per_state_means(dataset.entries(), question);
    let mut pairs: Vec<(String, f64)> = means.into_iter().collect();
    pairs.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    pairs.truncate(5);

    let mut map = Map::new();
    for (state, mean) in pairs {
        map.insert(state, json!(mean));
    }
    Value::Object(map)
}

pub fn best5(dataset: &Dataset, question: &str) -> Value {
    best_or_worst(dataset, question, true)
}

pub fn worst5(dataset: &Dataset, question: &str) -> Value {
    best_or_worst(dataset, question, false)
}

fn global_mean_value(dataset: &Dataset, question: &str) -> Option<f64> {
    let values: Vec<f64> = dataset
        .entries()
        .iter()
        .filter(|e| e.question == question)
        .filter_map(|e| e.data_value)
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn global_mean(dataset: &Dataset, question: &str) -> Value {
    match global_mean_value(dataset, question) {
        Some(mean) => json!({ "global_mean": mean }),
        None => json!({ "global_mean": Value::Null }),
    }
}

pub fn diff_from_mean(dataset: &Dataset, question: &str) -> Value {
    let Some(global) = global_mean_value(dataset, question) else {
        return json!({ "error": "No data available for the given question" });
    };

    let means = per_state_means(dataset.entries(), question);
    let pairs: Vec<(String, f64)> = means
        .into_iter()
        .map(|(state, mean)| (state, global - mean))
        .collect();

    sorted_map(pairs, false)
}

pub fn state_diff_from_mean(dataset: &Dataset, question: &str, state: &str) -> Value {
    let Some(global) = global_mean_value(dataset, question) else {
        return json!({ "error": "No data available for the given question" });
    };

    let state_values: Vec<f64> = dataset
        .entries()
        .iter()
        .filter(|e| e.question == question && e.location_desc == state)
        .filter_map(|e| e.data_value)
        .collect();

    if state_values.is_empty() {
        return json!({ state: Value::Null });
    }
    let state_mean = state_values.iter().sum::<f64>() / state_values.len() as f64;
    json!({ state: global - state_mean })
}

fn category_priority(category: &str) -> i32 {
    match category {
        "Age (years)" => 1,
        "Education" => 2,
        "Gender" => 3,
        "Income" => 4,
        "Race/Ethnicity" => 5,
        "Total" => 6,
        _ => 99,
    }
}

fn age_priority(value: &str) -> i32 {
    match value {
        "18 - 24" => 1,
        "25 - 34" => 2,
        "35 - 44" => 3,
        "45 - 54" => 4,
        "55 - 64" => 5,
        "65 or older" => 6,
        _ => 99,
    }
}

fn education_priority(value: &str) -> i32 {
    match value {
        "Less than high school" => 1,
        "High school graduate" => 2,
        "Some college or technical school" => 3,
        "College graduate" => 4,
        _ => 99,
    }
}

fn income_priority(value: &str) -> i32 {
    match value {
        "Less than $15,000" => 1,
        "$15,000 - $24,999" => 2,
        "$25,000 - $34,999" => 3,
        "$35,000 - $49,999" => 4,
        "$50,000 - $74,999" => 5,
        "$75,000 or greater" => 6,
        "Data not reported" => 7,
        _ => 99,
    }
}

fn value_priority(category: &str, value: &str) -> i32 {
    match category {
        "Age (years)" => age_priority(value),
        "Education" => education_priority(value),
        "Income" => income_priority(value),
        _ => 99,
    }
}

/// Shared implementation for `mean_by_category` (`state = None`) and
/// `state_mean_by_category` (`state = Some(..)`).
pub fn mean_by_category(dataset: &Dataset, question: &str, state: Option<&str>) -> Value {
    let mut totals: HashMap<(String, String, String), f64> = HashMap::new();
    let mut counts: HashMap<(String, String, String), u32> = HashMap::new();

    for entry in dataset.entries() {
        if entry.question != question {
            continue;
        }
        if let Some(state) = state {
            if entry.location_desc != state {
                continue;
            }
        }
        let Some(value) = entry.data_value else {
            continue;
        };
        let key = (
            entry.location_desc.clone(),
            entry.stratification_category1.clone(),
            entry.stratification1.clone(),
        );
        *totals.entry(key.clone()).or_insert(0.0) += value;
        *counts.entry(key).or_insert(0) += 1;
    }

    if totals.is_empty() {
        return json!({ "error": "No data available for the given question" });
    }

    let mut rows: Vec<((String, String, String), f64)> = totals
        .into_iter()
        .map(|(key, total)| {
            let count = counts[&key] as f64;
            (key, total / count)
        })
        .collect();

    rows.sort_by(|(a, _), (b, _)| {
        let (a_state, a_cat, a_val) = a;
        let (b_state, b_cat, b_val) = b;
        a_state
            .cmp(b_state)
            .then_with(|| category_priority(a_cat).cmp(&category_priority(b_cat)))
            .then_with(|| {
                value_priority(a_cat, a_val).cmp(&value_priority(b_cat, b_val))
            })
            .then_with(|| a_val.cmp(b_val))
    });

    let mut map = Map::new();
    for (key, mean) in rows {
        map.insert(format!("{key:?}"), json!(mean));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TableEntry;

    fn entry(location: &str, question: &str, value: Option<f64>) -> TableEntry {
        TableEntry {
            index: 0,
            year_start: 2015,
            year_end: 2015,
            location_abbr: location.chars().take(2).collect(),
            location_desc: location.to_string(),
            datasource: "BRFSS".into(),
            classification: "Obesity / Weight Status".into(),
            topic: "Obesity".into(),
            question: question.to_string(),
            data_value: value,
            stratification_category1: "Total".into(),
            stratification1: "Total".into(),
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::from_entries(vec![
            entry("Alabama", "Q1", Some(30.0)),
            entry("Alabama", "Q1", Some(40.0)),
            entry("Alaska", "Q1", Some(10.0)),
            entry("Alaska", "Q1", None),
            entry("Arizona", "Other", Some(99.0)),
        ])
    }

    #[test]
    fn states_mean_averages_per_state_and_sorts_ascending() {
        let dataset = sample_dataset();
        let result = states_mean(&dataset, "Q1");
        let obj = result.as_object().unwrap();
        let keys: Vec<&String> = obj.keys().collect();
        assert_eq!(keys, vec!["Alaska", "Alabama"]);
        assert_eq!(obj["Alabama"], json!(35.0));
        assert_eq!(obj["Alaska"], json!(10.0));
    }

    #[test]
    fn state_mean_missing_state_returns_null() {
        let dataset = sample_dataset();
        let result = state_mean(&dataset, "Q1", "Nowhere");
        assert_eq!(result, json!({ "Nowhere": null }));
    }

    #[test]
    fn global_mean_averages_every_row() {
        let dataset = sample_dataset();
        let result = global_mean(&dataset, "Q1");
        assert_eq!(result, json!({ "global_mean": 80.0 / 3.0 }));
    }

    #[test]
    fn global_mean_with_no_data_is_null() {
        let dataset = sample_dataset();
        let result = global_mean(&dataset, "Nonexistent");
        assert_eq!(result, json!({ "global_mean": null }));
    }

    #[test]
    fn best5_rejects_unlisted_questions() {
        let dataset = sample_dataset();
        let result = best5(&dataset, "Q1");
        assert_eq!(
            result,
            json!({ "error": "Question not found in predefined lists" })
        );
    }

    #[test]
    fn best5_orders_min_is_best_ascending() {
        let dataset = Dataset::from_entries(vec![
            entry("Alabama", QUESTIONS_BEST_IS_MIN[0], Some(30.0)),
            entry("Alaska", QUESTIONS_BEST_IS_MIN[0], Some(10.0)),
            entry("Arizona", QUESTIONS_BEST_IS_MIN[0], Some(20.0)),
        ]);
        let result = best5(&dataset, QUESTIONS_BEST_IS_MIN[0]);
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Alaska", "Arizona", "Alabama"]);
    }

    #[test]
    fn diff_from_mean_sorted_descending() {
        let dataset = sample_dataset();
        let result = diff_from_mean(&dataset, "Q1");
        let obj = result.as_object().unwrap();
        let global = 80.0 / 3.0;
        assert_eq!(obj["Alaska"], json!(global - 10.0));
        assert_eq!(obj["Alabama"], json!(global - 35.0));
        let keys: Vec<&String> = obj.keys().collect();
        assert_eq!(keys, vec!["Alaska", "Alabama"]);
    }

    #[test]
    fn mean_by_category_keys_are_debug_tuples() {
        let dataset = sample_dataset();
        let result = mean_by_category(&dataset, "Q1", None);
        let obj = result.as_object().unwrap();
        assert!(obj.contains_key(&format!("{:?}", ("Alabama", "Total", "Total"))));
    }

    #[test]
    fn state_mean_by_category_filters_to_one_state() {
        let dataset = sample_dataset();
        let result = mean_by_category(&dataset, "Q1", Some("Alabama"));
        let obj = result.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key(&format!("{:?}", ("Alabama", "Total", "Total"))));
    }
}
