// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-firmware usage extraction strategies.

use serde_json::{Map, Value};

use super::UsageFields;

const SECONDS_PER_HOUR: f64 = 3600.0;

type Extract = fn(&Map<String, Value>) -> UsageFields;

/// Strategies in priority order.
const STRATEGIES: &[(&str, Extract)] = &[
    ("print.statistics", print_statistics),
    ("print.print_job", print_job),
    ("print.get_print_stats", print_stats_reply),
    ("info.get_version", info_module),
    ("system.get_printer_info", system_total_usage),
    ("pushing.print_stats", pushing_print_stats),
];

/// Names of the extraction strategies, in the order they are tried.
#[must_use]
pub fn strategy_names() -> impl Iterator<Item = &'static str> {
    STRATEGIES.iter().map(|(name, _)| *name)
}

/// Runs every strategy over one inbound message; the first value found
/// for each counter wins.
#[must_use]
pub fn extract_usage(message: &Map<String, Value>) -> UsageFields {
    STRATEGIES
        .iter()
        .fold(UsageFields::default(), |acc, (name, extract)| {
            let found = extract(message);
            if !found.is_empty() {
                tracing::trace!(strategy = name, ?found, "usage counters matched");
            }
            acc.or(found)
        })
}

fn print_statistics(message: &Map<String, Value>) -> UsageFields {
    seconds_and_count(path(message, &["print", "statistics"]), "total_time", "total_prints")
}

fn print_job(message: &Map<String, Value>) -> UsageFields {
    seconds_and_count(path(message, &["print", "print_job"]), "total_time", "total_prints")
}

fn print_stats_reply(message: &Map<String, Value>) -> UsageFields {
    let Some(stats) = reply(message, "print", "get_print_stats").and_then(|p| p.get("stats"))
    else {
        return UsageFields::default();
    };
    UsageFields {
        print_hours: float(stats.get("total_hours")),
        total_prints: count(stats.get("total_jobs")),
        power_on_hours: None,
    }
}

fn info_module(message: &Map<String, Value>) -> UsageFields {
    let stats = reply(message, "info", "get_version")
        .and_then(|info| info.get("module"))
        .and_then(Value::as_array)
        .and_then(|modules| {
            modules
                .iter()
                .find(|m| m.get("name").and_then(Value::as_str) == Some("printer"))
        })
        .and_then(|printer| printer.get("statistics"));
    let Some(stats) = stats else {
        return UsageFields::default();
    };
    UsageFields {
        print_hours: float(stats.get("print_time")),
        total_prints: count(stats.get("print_count")),
        power_on_hours: float(stats.get("power_on_time")),
    }
}

fn system_total_usage(message: &Map<String, Value>) -> UsageFields {
    let Some(usage) = reply(message, "system", "get_printer_info")
        .and_then(|s| s.get("printer"))
        .and_then(|p| p.get("total_usage"))
    else {
        return UsageFields::default();
    };
    UsageFields {
        print_hours: float(usage.get("print_hours")),
        total_prints: count(usage.get("job_count")),
        power_on_hours: float(usage.get("power_on_hours")),
    }
}

fn pushing_print_stats(message: &Map<String, Value>) -> UsageFields {
    let stats = path(message, &["pushing", "print_stats"]);
    let Some(stats) = stats else {
        return UsageFields::default();
    };
    UsageFields {
        print_hours: float(stats.get("accumulated_time")).map(|s| s / SECONDS_PER_HOUR),
        total_prints: count(stats.get("total_jobs")),
        power_on_hours: None,
    }
}

fn seconds_and_count(section: Option<&Value>, seconds_key: &str, count_key: &str) -> UsageFields {
    let Some(section) = section else {
        return UsageFields::default();
    };
    UsageFields {
        print_hours: float(section.get(seconds_key)).map(|s| s / SECONDS_PER_HOUR),
        total_prints: count(section.get(count_key)),
        power_on_hours: None,
    }
}

/// Walks nested objects by key.
fn path<'a>(message: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    rest.iter()
        .try_fold(message.get(*first)?, |value, key| value.get(*key))
}

/// Returns a section only if it is the reply to `command`.
fn reply<'a>(message: &'a Map<String, Value>, section: &str, command: &str) -> Option<&'a Value> {
    message
        .get(section)
        .filter(|s| s.get("command").and_then(Value::as_str) == Some(command))
}

fn float(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f: &f64| f.is_finite())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn run(value: &Value) -> UsageFields {
        extract_usage(value.as_object().unwrap())
    }

    #[test]
    fn strategies_listed_in_priority_order() {
        let names: Vec<_> = strategy_names().collect();
        assert_eq!(names.first(), Some(&"print.statistics"));
        assert_eq!(names.last(), Some(&"pushing.print_stats"));
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn non_finite_strings_are_not_counters() {
        for bad in ["NaN", "inf", "-infinity"] {
            let u = run(&json!({"print": {"command": "get_print_stats", "stats": {"total_hours": bad}}}));
            assert_eq!(u.print_hours, None, "{bad}");
        }
        let u = run(&json!({"print": {"statistics": {"total_time": "NaN", "total_prints": 3}}}));
        assert_eq!(u.print_hours, None);
        assert_eq!(u.total_prints, Some(3));
    }

    #[test]
    fn print_statistics_seconds_to_hours() {
        let u = run(&json!({"print": {"statistics": {"total_time": 5400, "total_prints": 12}}}));
        assert_eq!(u.print_hours, Some(1.5));
        assert_eq!(u.total_prints, Some(12));
    }

    #[test]
    fn print_job_uses_same_keys() {
        let u = run(&json!({"print": {"print_job": {"total_time": "3600"}}}));
        assert_eq!(u.print_hours, Some(1.0));
        assert!(u.total_prints.is_none());
    }

    #[test]
    fn print_stats_requires_command() {
        let stats = json!({"total_hours": 42.5, "total_jobs": 9});
        assert!(run(&json!({"print": {"stats": stats.clone()}})).is_empty());
        let u = run(&json!({"print": {"command": "get_print_stats", "stats": stats}}));
        assert_eq!(u.print_hours, Some(42.5));
        assert_eq!(u.total_prints, Some(9));
    }

    #[test]
    fn info_module_printer_entry() {
        let msg = json!({"info": {"command": "get_version", "module": [
            {"name": "ota", "statistics": {"print_time": 1}},
            {"name": "printer", "statistics": {"print_time": "120.5", "print_count": 40, "power_on_time": 300}}
        ]}});
        let u = run(&msg);
        assert_eq!(u.print_hours, Some(120.5));
        assert_eq!(u.total_prints, Some(40));
        assert_eq!(u.power_on_hours, Some(300.0));
    }

    #[test]
    fn system_total_usage() {
        let msg = json!({"system": {"command": "get_printer_info", "printer": {
            "total_usage": {"print_hours": 10, "job_count": 2, "power_on_hours": 50}
        }}});
        let u = run(&msg);
        assert_eq!(u.print_hours, Some(10.0));
        assert_eq!(u.power_on_hours, Some(50.0));
    }

    #[test]
    fn pushing_accumulated_time() {
        let u = run(&json!({"pushing": {"print_stats": {"accumulated_time": 7200, "total_jobs": 3}}}));
        assert_eq!(u.print_hours, Some(2.0));
        assert_eq!(u.total_prints, Some(3));
    }

    #[test]
    fn first_strategy_wins_per_field() {
        let msg = json!({
            "print": {"statistics": {"total_time": 3600}},
            "pushing": {"print_stats": {"accumulated_time": 72000, "total_jobs": 8}}
        });
        let u = run(&msg);
        assert_eq!(u.print_hours, Some(1.0));
        assert_eq!(u.total_prints, Some(8));
    }

    #[test]
    fn garbage_is_ignored() {
        let u = run(&json!({"print": {"statistics": {"total_time": "lots", "total_prints": -1}}}));
        assert!(u.is_empty());
    }
}
