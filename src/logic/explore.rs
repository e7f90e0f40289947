//! Explore - EDA summaries and the dashboard data contract
//!
//! The dashboard itself lives outside this crate. It gets the merged table,
//! a selector built from the distinct values of a categorical column, and per
//! selection three series: traffic over time, event frequency and attack
//! category distribution. Chart series are only produced for columns the
//! table actually has.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::SchemaError;
use crate::logic::table::Table;

// ============================================================================
// SELECTION
// ============================================================================

/// Distinct non-missing values in first-appearance order
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<String>, SchemaError> {
    let idx = table.require_column(column)?;
    let mut seen = Vec::new();
    for value in table.column(idx).flatten() {
        if !seen.contains(value) {
            seen.push(value.clone());
        }
    }
    Ok(seen)
}

/// Rows whose `column` equals `value`
pub fn filter_by(table: &Table, column: &str, value: &str) -> Result<Table, SchemaError> {
    let idx = table.require_column(column)?;
    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|&r| table.cell(r, idx) == Some(value))
        .collect();
    Ok(table.select_rows(&rows))
}

/// Occurrences per value, most frequent first (ties in first-appearance order)
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>, SchemaError> {
    let idx = table.require_column(column)?;
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in table.column(idx).flatten() {
        let count = counts.entry(value.as_str()).or_insert(0);
        if *count == 0 {
            order.push(value.clone());
        }
        *count += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| {
            let c = counts.get(v.as_str()).copied().unwrap_or_default();
            (v, c)
        })
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(result)
}

// ============================================================================
// TIME SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficPoint {
    pub timestamp: DateTime<Utc>,
    pub volume: f64,
}

/// Unix seconds (integer or fractional) or a date-time string
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<f64>() {
        if !secs.is_finite() {
            return None;
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        return DateTime::from_timestamp(whole as i64, nanos);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Volume over time, sorted by timestamp. Rows without a usable time or
/// volume are left out.
pub fn traffic_series(table: &Table, time_column: &str, volume_column: &str) -> Result<Vec<TrafficPoint>, SchemaError> {
    let t = table.require_column(time_column)?;
    let v = table.require_column(volume_column)?;

    let mut points: Vec<TrafficPoint> = (0..table.n_rows())
        .filter_map(|r| {
            let timestamp = parse_timestamp(table.cell(r, t)?)?;
            let volume = table.cell(r, v)?.trim().parse::<f64>().ok()?;
            Some(TrafficPoint { timestamp, volume })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

// ============================================================================
// SUMMARY STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN for a single value
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// count / mean / std / min / max for every column whose values are all numeric
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let values: Vec<f64> = table
                .column(idx)
                .flatten()
                .map(|s| s.trim().parse::<f64>().ok())
                .collect::<Option<_>>()?;
            if values.is_empty() {
                return None;
            }

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let std = if values.len() > 1 {
                (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            } else {
                f64::NAN
            };

            Some(ColumnSummary {
                column: name.clone(),
                count: values.len(),
                mean,
                std,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        })
        .collect()
}

// ============================================================================
// DASHBOARD CONTRACT
// ============================================================================

/// Which columns feed each chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewColumns {
    /// Selector column (protocol)
    pub selector: String,
    pub time: String,
    pub volume: String,
    pub event: String,
    pub category: String,
}

impl Default for ViewColumns {
    fn default() -> Self {
        Self {
            selector: "proto".to_string(),
            time: "Stime".to_string(),
            volume: "sbytes".to_string(),
            event: "service".to_string(),
            category: "Attack category".to_string(),
        }
    }
}

/// Everything one dashboard selection renders. A chart whose column is
/// absent from the table is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub selection: Option<String>,
    pub rows: usize,
    pub traffic: Option<Vec<TrafficPoint>>,
    pub event_frequency: Option<Vec<(String, usize)>>,
    pub category_distribution: Option<Vec<(String, usize)>>,
}

/// Selector options for the dashboard dropdown
pub fn selector_options(table: &Table, columns: &ViewColumns) -> Result<Vec<String>, SchemaError> {
    distinct_values(table, &columns.selector)
}

/// Chart data for one selection (`None` = whole table)
pub fn dashboard_view(table: &Table, columns: &ViewColumns, selection: Option<&str>) -> Result<DashboardView, SchemaError> {
    let filtered = match selection {
        Some(value) => filter_by(table, &columns.selector, value)?,
        None => table.clone(),
    };

    let traffic = if filtered.has_column(&columns.time) && filtered.has_column(&columns.volume) {
        Some(traffic_series(&filtered, &columns.time, &columns.volume)?)
    } else {
        None
    };
    let counts = |column: &str| -> Result<Option<Vec<(String, usize)>>, SchemaError> {
        if filtered.has_column(column) {
            value_counts(&filtered, column).map(Some)
        } else {
            Ok(None)
        }
    };

    Ok(DashboardView {
        selection: selection.map(str::to_string),
        rows: filtered.n_rows(),
        traffic,
        event_frequency: counts(&columns.event)?,
        category_distribution: counts(&columns.category)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::table::fixture;

    fn merged() -> Table {
        fixture(
            "merged",
            &["proto", "Stime", "sbytes", "Attack category"],
            &[
                &[Some("udp"), Some("1421927416"), Some("100"), Some("Exploits")],
                &[Some("tcp"), Some("1421927414"), Some("300"), Some("Normal")],
                &[Some("udp"), Some("1421927415"), Some("200"), Some("Exploits")],
                &[Some("tcp"), None, Some("50"), Some("Fuzzers")],
                &[None, Some("1421927417"), Some("75"), Some("Normal")],
            ],
        )
    }

    #[test]
    fn test_distinct_values_first_appearance() {
        assert_eq!(distinct_values(&merged(), "proto").unwrap(), vec!["udp", "tcp"]);
        assert_eq!(
            distinct_values(&merged(), "service"),
            Err(SchemaError::missing("merged", "service"))
        );
    }

    #[test]
    fn test_filter_by_keeps_matching_rows() {
        let udp = filter_by(&merged(), "proto", "udp").unwrap();
        assert_eq!(udp.n_rows(), 2);
        assert_eq!(udp.cell(1, 2), Some("200"));
        assert_eq!(filter_by(&merged(), "proto", "icmp").unwrap().n_rows(), 0);
    }

    #[test]
    fn test_value_counts_descending() {
        let counts = value_counts(&merged(), "Attack category").unwrap();
        assert_eq!(
            counts,
            vec![
                ("Exploits".to_string(), 2),
                ("Normal".to_string(), 2),
                ("Fuzzers".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_traffic_series_sorted_by_time() {
        let series = traffic_series(&merged(), "Stime", "sbytes").unwrap();
        let volumes: Vec<f64> = series.iter().map(|p| p.volume).collect();
        assert_eq!(volumes, vec![300.0, 200.0, 100.0, 75.0]);
        assert_eq!(series[0].timestamp.timestamp(), 1_421_927_414);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("0").unwrap().timestamp(), 0);
        assert_eq!(parse_timestamp("1.5").unwrap().timestamp_subsec_millis(), 500);
        assert_eq!(parse_timestamp("1970-01-01 00:01:00").unwrap().timestamp(), 60);
        assert_eq!(parse_timestamp("1970-01-01T00:00:10Z").unwrap().timestamp(), 10);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_describe_numeric_columns_only() {
        let summary = describe(&merged());
        let names: Vec<&str> = summary.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["Stime", "sbytes"]);

        let sbytes = &summary[1];
        assert_eq!(sbytes.count, 5);
        assert_eq!(sbytes.mean, 145.0);
        assert_eq!((sbytes.min, sbytes.max), (50.0, 300.0));
        assert!((sbytes.std - 103.6822_f64).abs() < 1e-3);
    }

    #[test]
    fn test_dashboard_view_for_selection() {
        let columns = ViewColumns::default();
        assert_eq!(selector_options(&merged(), &columns).unwrap(), vec!["udp", "tcp"]);

        let view = dashboard_view(&merged(), &columns, Some("tcp")).unwrap();
        assert_eq!(view.rows, 2);
        assert_eq!(view.traffic.as_ref().map(Vec::len), Some(1));
        assert!(view.event_frequency.is_none());
        assert_eq!(
            view.category_distribution,
            Some(vec![("Normal".to_string(), 1), ("Fuzzers".to_string(), 1)])
        );
    }
}
