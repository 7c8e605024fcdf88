//! Campaign weekly tracking: a schema-light parallel of the scorecard.
//! Metric identity is a string key from the group's configurable
//! definition list, and one JSON object row holds all of a campaign's
//! values for a week.

use crate::calendar::format_value;
use crate::models::{CampaignMetricDefinition, CampaignWeekData, DataType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug)]
pub struct CampaignAggregation {
    week_endings: Vec<NaiveDate>,
    by_week: HashMap<NaiveDate, CampaignWeekData>,
}

impl CampaignAggregation {
    pub fn build(week_data: &[CampaignWeekData], week_endings: &[NaiveDate]) -> Self {
        let by_week = week_data
            .iter()
            .map(|row| (row.week_ending, row.clone()))
            .collect();
        Self {
            week_endings: week_endings.to_vec(),
            by_week,
        }
    }

    pub fn week_endings(&self) -> &[NaiveDate] {
        &self.week_endings
    }

    pub fn week_row(&self, week_ending: NaiveDate) -> Option<&CampaignWeekData> {
        self.by_week.get(&week_ending)
    }

    /// A key can be absent or explicitly JSON null; both read as no
    /// value.
    pub fn metric_value(&self, week_ending: NaiveDate, metric_key: &str) -> Option<f64> {
        self.by_week
            .get(&week_ending)
            .and_then(|row| row.data.get(metric_key))
            .and_then(serde_json::Value::as_f64)
    }

    pub fn metric_total(&self, metric_key: &str) -> f64 {
        self.week_endings
            .iter()
            .filter_map(|week| self.metric_value(*week, metric_key))
            .sum()
    }
}

/// Campaign cells render percentages scaled with one decimal; every
/// other type renders as a plain grouped number.
pub fn format_metric_value(value: Option<f64>, data_type: DataType) -> String {
    match value {
        None => String::new(),
        Some(value) => match data_type {
            DataType::Percentage => format!("{:.1}%", value * 100.0),
            _ => format_value(Some(value), DataType::Count),
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCellView {
    pub week_ending: NaiveDate,
    pub value: Option<f64>,
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetricRow {
    pub metric: CampaignMetricDefinition,
    pub cells: Vec<CampaignCellView>,
    pub total: f64,
    pub display_total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignView {
    pub campaign_id: String,
    pub week_endings: Vec<NaiveDate>,
    pub rows: Vec<CampaignMetricRow>,
}

pub fn build_campaign_view(
    campaign_id: &str,
    metrics: &[CampaignMetricDefinition],
    week_data: &[CampaignWeekData],
    week_endings: &[NaiveDate],
) -> CampaignView {
    let aggregation = CampaignAggregation::build(week_data, week_endings);
    let rows = metrics
        .iter()
        .map(|metric| {
            let cells = week_endings
                .iter()
                .map(|week| {
                    let value = aggregation.metric_value(*week, &metric.metric_key);
                    CampaignCellView {
                        week_ending: *week,
                        value,
                        display: format_metric_value(value, metric.data_type),
                    }
                })
                .collect();
            let total = aggregation.metric_total(&metric.metric_key);
            CampaignMetricRow {
                metric: metric.clone(),
                cells,
                total,
                display_total: if total > 0.0 {
                    format_metric_value(Some(total), metric.data_type)
                } else {
                    "-".to_string()
                },
            }
        })
        .collect();

    CampaignView {
        campaign_id: campaign_id.to_string(),
        week_endings: week_endings.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn week(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).expect("valid date")
    }

    fn week_row(week_ending: NaiveDate, data: serde_json::Value) -> CampaignWeekData {
        CampaignWeekData {
            id: format!("w-{week_ending}"),
            campaign_id: "c1".to_string(),
            week_ending,
            data,
            entered_by: "user-a".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn metric(key: &str, data_type: DataType) -> CampaignMetricDefinition {
        CampaignMetricDefinition {
            id: format!("m-{key}"),
            group_id: "g1".to_string(),
            metric_key: key.to_string(),
            label: key.to_string(),
            data_type,
            is_required: true,
            display_order: 0,
        }
    }

    #[test]
    fn totals_sum_the_keyed_field_across_weeks() {
        let rows = [
            week_row(week(2), serde_json::json!({"outreach": 40, "connects": 5})),
            week_row(week(9), serde_json::json!({"outreach": 60})),
        ];
        let agg = CampaignAggregation::build(&rows, &[week(2), week(9)]);
        assert_eq!(agg.metric_total("outreach"), 100.0);
        assert_eq!(agg.metric_total("connects"), 5.0);
        assert_eq!(agg.metric_total("meetings"), 0.0);
    }

    #[test]
    fn null_and_missing_keys_read_as_no_value() {
        let rows = [week_row(week(2), serde_json::json!({"outreach": null}))];
        let agg = CampaignAggregation::build(&rows, &[week(2)]);
        assert_eq!(agg.metric_value(week(2), "outreach"), None);
        assert_eq!(agg.metric_value(week(2), "connects"), None);
        assert_eq!(agg.metric_value(week(9), "outreach"), None);
    }

    #[test]
    fn metric_display_formats_by_type() {
        assert_eq!(format_metric_value(Some(1234.0), DataType::Count), "1,234");
        assert_eq!(format_metric_value(Some(0.125), DataType::Percentage), "12.5%");
        assert_eq!(format_metric_value(None, DataType::Count), "");
    }

    #[test]
    fn view_rows_follow_definition_order() {
        let metrics = [
            metric("outreach", DataType::Count),
            metric("conversion", DataType::Percentage),
        ];
        let rows = [week_row(week(2), serde_json::json!({"outreach": 40, "conversion": 0.2}))];
        let view = build_campaign_view("c1", &metrics, &rows, &[week(2)]);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].cells[0].display, "40");
        assert_eq!(view.rows[0].display_total, "40");
        assert_eq!(view.rows[1].cells[0].display, "20.0%");
    }
}
