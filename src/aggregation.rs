//! In-memory aggregation over a template's entries and goals: lookup
//! maps, calculated-measure evaluation, weekly totals, section and
//! company rollups, and the derived dashboard series.

use crate::calendar::{format_value, percent_to_goal};
use crate::models::{
    CalculationFormula, DataType, GoalStatus, MeasureKind, ScorecardEntry, ScorecardGoal,
    ScorecardMeasure, ScorecardSection, ScorecardTemplate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const WEEKS_PER_QUARTER: f64 = 13.0;

#[derive(Debug)]
pub struct ScorecardAggregation {
    week_endings: Vec<NaiveDate>,
    aggregate: HashMap<(String, NaiveDate), f64>,
    cell_entries: HashMap<(String, NaiveDate), ScorecardEntry>,
    user_entries: HashMap<(String, NaiveDate, String), ScorecardEntry>,
    goal_values: HashMap<String, f64>,
    goal_ids: HashMap<String, String>,
}

impl ScorecardAggregation {
    pub fn build(
        template: &ScorecardTemplate,
        entries: &[ScorecardEntry],
        goals: &[ScorecardGoal],
        week_endings: &[NaiveDate],
    ) -> Self {
        let mut aggregate: HashMap<(String, NaiveDate), f64> = HashMap::new();
        let mut cell_entries: HashMap<(String, NaiveDate), ScorecardEntry> = HashMap::new();
        let mut user_entries: HashMap<(String, NaiveDate, String), ScorecardEntry> = HashMap::new();

        for entry in entries {
            let cell = (entry.measure_id.clone(), entry.week_ending);
            *aggregate.entry(cell.clone()).or_insert(0.0) += entry.value;
            cell_entries.entry(cell).or_insert_with(|| entry.clone());
            user_entries.insert(
                (entry.measure_id.clone(), entry.week_ending, entry.user_id.clone()),
                entry.clone(),
            );
        }

        // Calculated measures derive from already-aggregated values,
        // resolved by name within their own section.
        for section in &template.sections {
            let name_to_id: HashMap<&str, &str> = section
                .measures
                .iter()
                .map(|measure| (measure.name.as_str(), measure.id.as_str()))
                .collect();
            for measure in &section.measures {
                let MeasureKind::Calculated { formula: Some(formula) } = &measure.kind else {
                    continue;
                };
                match formula {
                    CalculationFormula::Sum { source_measures } => {
                        for week in week_endings {
                            let sum = source_measures
                                .iter()
                                .filter_map(|name| name_to_id.get(name.as_str()))
                                .filter_map(|id| aggregate.get(&((*id).to_string(), *week)))
                                .sum();
                            aggregate.insert((measure.id.clone(), *week), sum);
                        }
                    }
                    CalculationFormula::Ratio { numerator, denominator } => {
                        for week in week_endings {
                            let numerator_value = name_to_id
                                .get(numerator.as_str())
                                .and_then(|id| aggregate.get(&((*id).to_string(), *week)))
                                .copied()
                                .unwrap_or(0.0);
                            let denominator_value = name_to_id
                                .get(denominator.as_str())
                                .and_then(|id| aggregate.get(&((*id).to_string(), *week)))
                                .copied()
                                .unwrap_or(0.0);
                            let ratio = if denominator_value > 0.0 {
                                numerator_value / denominator_value
                            } else {
                                0.0
                            };
                            aggregate.insert((measure.id.clone(), *week), ratio);
                        }
                    }
                }
            }
        }

        let mut goal_values = HashMap::new();
        let mut goal_ids = HashMap::new();
        for goal in goals {
            goal_values.insert(goal.measure_id.clone(), goal.goal_value);
            goal_ids.insert(goal.measure_id.clone(), goal.id.clone());
        }

        Self {
            week_endings: week_endings.to_vec(),
            aggregate,
            cell_entries,
            user_entries,
            goal_values,
            goal_ids,
        }
    }

    pub fn week_endings(&self) -> &[NaiveDate] {
        &self.week_endings
    }

    pub fn cell_value(&self, measure_id: &str, week_ending: NaiveDate) -> Option<f64> {
        self.aggregate
            .get(&(measure_id.to_string(), week_ending))
            .copied()
    }

    /// The entry the detail panel binds to when a cell is inspected.
    pub fn entry_for_cell(
        &self,
        measure_id: &str,
        week_ending: NaiveDate,
    ) -> Option<&ScorecardEntry> {
        self.cell_entries.get(&(measure_id.to_string(), week_ending))
    }

    pub fn user_entry(
        &self,
        measure_id: &str,
        week_ending: NaiveDate,
        user_id: &str,
    ) -> Option<&ScorecardEntry> {
        self.user_entries
            .get(&(measure_id.to_string(), week_ending, user_id.to_string()))
    }

    pub fn goal_value(&self, measure_id: &str) -> Option<f64> {
        self.goal_values.get(measure_id).copied()
    }

    pub fn goal_id(&self, measure_id: &str) -> Option<&str> {
        self.goal_ids.get(measure_id).map(String::as_str)
    }

    /// Total across the requested weeks. Ratio measures divide overall
    /// numerator by overall denominator rather than summing weekly
    /// ratios.
    pub fn measure_total(&self, section: &ScorecardSection, measure: &ScorecardMeasure) -> f64 {
        if let MeasureKind::Calculated {
            formula: Some(CalculationFormula::Ratio { numerator, denominator }),
        } = &measure.kind
        {
            let find = |name: &str| {
                section
                    .measures
                    .iter()
                    .find(|candidate| candidate.name == name)
                    .map(|candidate| candidate.id.clone())
            };
            if let (Some(numerator_id), Some(denominator_id)) =
                (find(numerator), find(denominator))
            {
                let mut total_numerator = 0.0;
                let mut total_denominator = 0.0;
                for week in &self.week_endings {
                    total_numerator += self.cell_value(&numerator_id, *week).unwrap_or(0.0);
                    total_denominator += self.cell_value(&denominator_id, *week).unwrap_or(0.0);
                }
                return if total_denominator > 0.0 {
                    total_numerator / total_denominator
                } else {
                    0.0
                };
            }
        }

        self.week_endings
            .iter()
            .filter_map(|week| self.cell_value(&measure.id, *week))
            .sum()
    }

    pub fn section_rollup(&self, section: &ScorecardSection) -> RollupTotals {
        let ids: Vec<&str> = rollup_measures(&section.measures)
            .map(|measure| measure.id.as_str())
            .collect();
        self.rollup_for(&ids)
    }

    pub fn company_rollup(&self, template: &ScorecardTemplate) -> RollupTotals {
        let ids: Vec<&str> = template
            .sections
            .iter()
            .flat_map(|section| rollup_measures(&section.measures))
            .map(|measure| measure.id.as_str())
            .collect();
        self.rollup_for(&ids)
    }

    fn rollup_for(&self, measure_ids: &[&str]) -> RollupTotals {
        let mut week_totals = BTreeMap::new();
        for week in &self.week_endings {
            let total = measure_ids
                .iter()
                .filter_map(|id| self.cell_value(id, *week))
                .sum();
            week_totals.insert(*week, total);
        }
        let goal_total = measure_ids
            .iter()
            .filter_map(|id| self.goal_value(id))
            .sum();
        let grand_total = week_totals.values().sum();
        RollupTotals {
            week_totals,
            goal_total,
            grand_total,
        }
    }
}

/// Measures that participate in rollups: accumulated, non-percentage
/// (ratios are not additive across measures).
fn rollup_measures(measures: &[ScorecardMeasure]) -> impl Iterator<Item = &ScorecardMeasure> {
    measures
        .iter()
        .filter(|measure| !measure.kind.is_calculated())
        .filter(|measure| measure.data_type != DataType::Percentage)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupTotals {
    pub week_totals: BTreeMap<NaiveDate, f64>,
    pub goal_total: f64,
    pub grand_total: f64,
}

impl RollupTotals {
    pub fn percent_to_goal(&self) -> Option<f64> {
        if self.goal_total == 0.0 {
            None
        } else {
            Some(percent_to_goal(self.grand_total, self.goal_total))
        }
    }

    pub fn status(&self) -> Option<GoalStatus> {
        self.percent_to_goal().map(GoalStatus::from_percent)
    }
}

// ─── Assembled view ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub week_ending: NaiveDate,
    pub value: Option<f64>,
    pub display: String,
    pub entry_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureView {
    pub measure_id: String,
    pub name: String,
    pub data_type: DataType,
    pub calculated: bool,
    pub owner_user_id: Option<String>,
    pub cells: Vec<CellView>,
    pub goal: Option<f64>,
    pub goal_id: Option<String>,
    pub total: f64,
    pub display_total: String,
    pub percent_to_goal: Option<f64>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupView {
    pub label: String,
    pub data_type: DataType,
    pub week_totals: Vec<CellView>,
    pub goal_total: f64,
    pub grand_total: f64,
    pub percent_to_goal: Option<f64>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub section_id: String,
    pub name: String,
    pub rollup: RollupView,
    pub measures: Vec<MeasureView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardView {
    pub group_id: String,
    pub quarter: String,
    pub week_endings: Vec<NaiveDate>,
    pub sections: Vec<SectionView>,
    pub company: RollupView,
}

/// Shared display type for a rollup row: the single type its measures
/// agree on, else plain count.
fn section_display_type(measures: &[ScorecardMeasure]) -> DataType {
    let mut types = measures
        .iter()
        .filter(|measure| !measure.kind.is_calculated())
        .map(|measure| measure.data_type);
    match types.next() {
        Some(first) if types.all(|data_type| data_type == first) => first,
        _ => DataType::Count,
    }
}

pub fn build_view(
    group_id: &str,
    template: &ScorecardTemplate,
    entries: &[ScorecardEntry],
    goals: &[ScorecardGoal],
    week_endings: &[NaiveDate],
    quarter: &str,
) -> ScorecardView {
    let aggregation = ScorecardAggregation::build(template, entries, goals, week_endings);

    let sections = template
        .sections
        .iter()
        .map(|section| {
            let rollup = aggregation.section_rollup(section);
            let measures = section
                .measures
                .iter()
                .map(|measure| measure_view(section, measure, &aggregation))
                .collect();
            SectionView {
                section_id: section.id.clone(),
                name: section.name.clone(),
                rollup: rollup_view(
                    section.name.clone(),
                    section_display_type(&section.measures),
                    rollup,
                ),
                measures,
            }
        })
        .collect();

    let all_measures: Vec<ScorecardMeasure> = template.measures().cloned().collect();
    let company = rollup_view(
        "Company".to_string(),
        section_display_type(&all_measures),
        aggregation.company_rollup(template),
    );

    ScorecardView {
        group_id: group_id.to_string(),
        quarter: quarter.to_string(),
        week_endings: week_endings.to_vec(),
        sections,
        company,
    }
}

fn measure_view(
    section: &ScorecardSection,
    measure: &ScorecardMeasure,
    aggregation: &ScorecardAggregation,
) -> MeasureView {
    let calculated = measure.kind.is_calculated();
    let cells = aggregation
        .week_endings()
        .iter()
        .map(|week| {
            let value = aggregation.cell_value(&measure.id, *week);
            let display = if calculated {
                match value {
                    Some(value) if value > 0.0 => format_value(Some(value), measure.data_type),
                    _ => "-".to_string(),
                }
            } else {
                format_value(Some(value.unwrap_or(0.0)), measure.data_type)
            };
            CellView {
                week_ending: *week,
                value,
                display,
                entry_id: aggregation
                    .entry_for_cell(&measure.id, *week)
                    .map(|entry| entry.id.clone()),
            }
        })
        .collect();

    let goal = aggregation.goal_value(&measure.id);
    let total = aggregation.measure_total(section, measure);
    let percent = match goal {
        Some(goal) if goal != 0.0 => Some(percent_to_goal(total, goal)),
        _ => None,
    };
    let display_total = if total > 0.0 {
        format_value(Some(total), measure.data_type)
    } else {
        "-".to_string()
    };

    MeasureView {
        measure_id: measure.id.clone(),
        name: measure.name.clone(),
        data_type: measure.data_type,
        calculated,
        owner_user_id: measure.owner_user_id.clone(),
        cells,
        goal,
        goal_id: aggregation.goal_id(&measure.id).map(ToString::to_string),
        total,
        display_total,
        percent_to_goal: percent,
        status: percent.map(GoalStatus::from_percent),
    }
}

fn rollup_view(label: String, data_type: DataType, totals: RollupTotals) -> RollupView {
    let week_totals = totals
        .week_totals
        .iter()
        .map(|(week, value)| CellView {
            week_ending: *week,
            value: Some(*value),
            display: if *value > 0.0 {
                format_value(Some(*value), data_type)
            } else {
                "-".to_string()
            },
            entry_id: None,
        })
        .collect();
    let percent = totals.percent_to_goal();
    RollupView {
        label,
        data_type,
        week_totals,
        goal_total: totals.goal_total,
        grand_total: totals.grand_total,
        percent_to_goal: percent,
        status: percent.map(GoalStatus::from_percent),
    }
}

// ─── Dashboard derivations ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgressItem {
    pub measure_id: String,
    pub label: String,
    pub actual: f64,
    pub goal: f64,
    pub data_type: DataType,
    pub percent_to_goal: f64,
    pub status: GoalStatus,
}

/// Goal-progress items for the dashboard: one per non-calculated
/// measure that has a goal, optionally restricted to one section.
pub fn goal_progress(
    template: &ScorecardTemplate,
    aggregation: &ScorecardAggregation,
    section_filter: Option<&str>,
) -> Vec<GoalProgressItem> {
    let mut items = Vec::new();
    for section in &template.sections {
        if let Some(filter) = section_filter {
            if section.id != filter {
                continue;
            }
        }
        for measure in &section.measures {
            if measure.kind.is_calculated() {
                continue;
            }
            let Some(goal) = aggregation.goal_value(&measure.id).filter(|goal| *goal != 0.0)
            else {
                continue;
            };
            let actual = aggregation.measure_total(section, measure);
            let percent = percent_to_goal(actual, goal);
            items.push(GoalProgressItem {
                measure_id: measure.id.clone(),
                label: format!("{}: {}", section.name, measure.name),
                actual,
                goal,
                data_type: measure.data_type,
                percent_to_goal: percent,
                status: GoalStatus::from_percent(percent),
            });
        }
    }
    items
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub week_ending: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    pub label: String,
    pub data_type: DataType,
    pub goal_pace_per_week: f64,
    pub points: Vec<TrendPoint>,
}

/// Weekly trend series for the leading progress items, with the flat
/// per-week pace a measure must hold to land its quarterly goal.
pub fn trend_series(
    items: &[GoalProgressItem],
    aggregation: &ScorecardAggregation,
    limit: usize,
) -> Vec<TrendSeries> {
    items
        .iter()
        .take(limit)
        .map(|item| TrendSeries {
            label: item.label.clone(),
            data_type: item.data_type,
            goal_pace_per_week: item.goal / WEEKS_PER_QUARTER,
            points: aggregation
                .week_endings()
                .iter()
                .map(|week| TrendPoint {
                    week_ending: *week,
                    value: aggregation.cell_value(&item.measure_id, *week).unwrap_or(0.0),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeUpdateStatus {
    pub user_id: String,
    pub has_updated: bool,
}

/// Meeting-review indicator: has each attendee entered anything for the
/// meeting's week-ending.
pub fn attendee_update_status(
    entries: &[ScorecardEntry],
    attendee_user_ids: &[String],
    week_ending: NaiveDate,
) -> Vec<AttendeeUpdateStatus> {
    attendee_user_ids
        .iter()
        .map(|user_id| AttendeeUpdateStatus {
            user_id: user_id.clone(),
            has_updated: entries
                .iter()
                .any(|entry| &entry.user_id == user_id && entry.week_ending == week_ending),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeasureKind, RollupType};
    use chrono::{DateTime, NaiveDate, Utc};

    fn week(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).expect("valid date")
    }

    fn stamp() -> DateTime<Utc> {
        Utc::now()
    }

    fn measure(id: &str, section_id: &str, name: &str, data_type: DataType) -> ScorecardMeasure {
        ScorecardMeasure {
            id: id.to_string(),
            section_id: section_id.to_string(),
            name: name.to_string(),
            data_type,
            rollup_type: RollupType::Sum,
            owner_user_id: None,
            kind: MeasureKind::Accumulated,
            display_order: 0,
        }
    }

    fn entry(measure_id: &str, user_id: &str, week_ending: NaiveDate, value: f64) -> ScorecardEntry {
        ScorecardEntry {
            id: format!("e-{measure_id}-{week_ending}-{user_id}"),
            measure_id: measure_id.to_string(),
            user_id: user_id.to_string(),
            week_ending,
            value,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn goal(measure_id: &str, value: f64) -> ScorecardGoal {
        ScorecardGoal {
            id: format!("g-{measure_id}"),
            measure_id: measure_id.to_string(),
            quarter: "2026-Q1".to_string(),
            goal_value: value,
            set_by: "user-a".to_string(),
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn two_section_template() -> ScorecardTemplate {
        ScorecardTemplate {
            id: "t1".to_string(),
            group_id: "group-1".to_string(),
            name: "Weekly".to_string(),
            description: None,
            is_active: true,
            sections: vec![
                ScorecardSection {
                    id: "s1".to_string(),
                    template_id: "t1".to_string(),
                    name: "Sales".to_string(),
                    display_order: 0,
                    measures: vec![
                        measure("m1", "s1", "Calls", DataType::Count),
                        measure("m2", "s1", "Revenue", DataType::Currency),
                        ScorecardMeasure {
                            kind: MeasureKind::Calculated { formula: None },
                            ..measure("m4", "s1", "Derived", DataType::Count)
                        },
                    ],
                },
                ScorecardSection {
                    id: "s2".to_string(),
                    template_id: "t1".to_string(),
                    name: "Marketing".to_string(),
                    display_order: 1,
                    measures: vec![measure("m3", "s2", "Leads", DataType::Count)],
                },
            ],
        }
    }

    #[test]
    fn company_rollup_is_sum_of_measures_and_skips_calculated() {
        let template = two_section_template();
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 500.0),
            entry("m3", "u1", week(2), 3.0),
            // entries on a calculated measure never roll up
            entry("m4", "u1", week(2), 999.0),
        ];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &[week(2)]);

        let company = agg.company_rollup(&template);
        assert_eq!(company.week_totals[&week(2)], 513.0);

        let sales = agg.section_rollup(&template.sections[0]);
        assert_eq!(sales.week_totals[&week(2)], 510.0);

        let marketing = agg.section_rollup(&template.sections[1]);
        assert_eq!(marketing.week_totals[&week(2)], 3.0);
    }

    #[test]
    fn multiple_users_sum_into_one_cell() {
        let template = two_section_template();
        let entries = vec![
            entry("m1", "u1", week(2), 4.0),
            entry("m1", "u2", week(2), 6.0),
        ];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &[week(2)]);
        assert_eq!(agg.cell_value("m1", week(2)), Some(10.0));
        assert_eq!(agg.user_entry("m1", week(2), "u2").map(|e| e.value), Some(6.0));
        // Detail panel binds to the first entry fetched for the cell.
        assert_eq!(
            agg.entry_for_cell("m1", week(2)).map(|e| e.user_id.as_str()),
            Some("u1")
        );
    }

    #[test]
    fn percentage_measures_stay_out_of_rollups() {
        let mut template = two_section_template();
        template.sections[0]
            .measures
            .push(measure("m5", "s1", "Win Rate", DataType::Percentage));
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m5", "u1", week(2), 0.5),
        ];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &[week(2)]);
        assert_eq!(agg.section_rollup(&template.sections[0]).week_totals[&week(2)], 10.0);
    }

    #[test]
    fn sum_formula_fills_calculated_cells() {
        let mut template = two_section_template();
        template.sections[0].measures[2].kind = MeasureKind::Calculated {
            formula: Some(CalculationFormula::Sum {
                source_measures: vec!["Calls".to_string(), "Revenue".to_string()],
            }),
        };
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 500.0),
        ];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &[week(2)]);
        assert_eq!(agg.cell_value("m4", week(2)), Some(510.0));
    }

    #[test]
    fn ratio_total_divides_overall_sums() {
        let mut template = two_section_template();
        template.sections[0].measures[2].kind = MeasureKind::Calculated {
            formula: Some(CalculationFormula::Ratio {
                numerator: "Revenue".to_string(),
                denominator: "Calls".to_string(),
            }),
        };
        let weeks = [week(2), week(9)];
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 500.0),
            entry("m1", "u1", week(9), 40.0),
            entry("m2", "u1", week(9), 500.0),
        ];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &weeks);

        // Weekly cells are weekly ratios...
        assert_eq!(agg.cell_value("m4", week(2)), Some(50.0));
        assert_eq!(agg.cell_value("m4", week(9)), Some(12.5));
        // ...but the row total is overall numerator / overall denominator.
        let section = &template.sections[0];
        let total = agg.measure_total(section, &section.measures[2]);
        assert_eq!(total, 20.0);
    }

    #[test]
    fn ratio_with_zero_denominator_is_zero() {
        let mut template = two_section_template();
        template.sections[0].measures[2].kind = MeasureKind::Calculated {
            formula: Some(CalculationFormula::Ratio {
                numerator: "Revenue".to_string(),
                denominator: "Calls".to_string(),
            }),
        };
        let entries = vec![entry("m2", "u1", week(2), 500.0)];
        let agg = ScorecardAggregation::build(&template, &entries, &[], &[week(2)]);
        assert_eq!(agg.cell_value("m4", week(2)), Some(0.0));
    }

    #[test]
    fn rollup_goal_totals_and_status() {
        let template = two_section_template();
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 500.0),
        ];
        let goals = vec![goal("m2", 1000.0)];
        let agg = ScorecardAggregation::build(&template, &entries, &goals, &[week(2)]);

        let sales = agg.section_rollup(&template.sections[0]);
        // Measures without a goal contribute zero to the goal rollup.
        assert_eq!(sales.goal_total, 1000.0);
        assert_eq!(sales.grand_total, 510.0);
        assert_eq!(sales.percent_to_goal(), Some(0.51));
        assert_eq!(sales.status(), Some(GoalStatus::Critical));

        let marketing = agg.section_rollup(&template.sections[1]);
        assert_eq!(marketing.goal_total, 0.0);
        assert_eq!(marketing.percent_to_goal(), None);
    }

    #[test]
    fn view_assembles_totals_and_tiers() {
        let template = two_section_template();
        let weeks = [week(2), week(9)];
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 500.0),
            entry("m1", "u1", week(9), 20.0),
        ];
        let goals = vec![goal("m2", 1000.0)];
        let view = build_view("group-1", &template, &entries, &goals, &weeks, "2026-Q1");

        let sales = &view.sections[0];
        let calls = &sales.measures[0];
        let revenue = &sales.measures[1];
        assert_eq!(calls.total, 30.0);
        assert_eq!(revenue.total, 500.0);
        assert_eq!(revenue.percent_to_goal, Some(0.5));
        assert_eq!(revenue.status, Some(GoalStatus::Critical));
        assert_eq!(revenue.display_total, "$500");

        assert_eq!(sales.rollup.week_totals[0].value, Some(510.0));
        assert_eq!(sales.rollup.week_totals[1].value, Some(20.0));
        assert_eq!(view.company.grand_total, 530.0);
    }

    #[test]
    fn dashboard_progress_skips_goal_less_measures() {
        let template = two_section_template();
        let entries = vec![
            entry("m1", "u1", week(2), 10.0),
            entry("m2", "u1", week(2), 950.0),
        ];
        let goals = vec![goal("m2", 1000.0)];
        let agg = ScorecardAggregation::build(&template, &entries, &goals, &[week(2)]);

        let items = goal_progress(&template, &agg, None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Sales: Revenue");
        assert_eq!(items[0].status, GoalStatus::Good);

        let trends = trend_series(&items, &agg, 3);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].goal_pace_per_week, 1000.0 / WEEKS_PER_QUARTER);
        assert_eq!(trends[0].points[0].value, 950.0);
    }

    #[test]
    fn attendee_status_reflects_week_entries() {
        let entries = vec![entry("m1", "u1", week(2), 5.0)];
        let statuses = attendee_update_status(
            &entries,
            &["u1".to_string(), "u2".to_string()],
            week(2),
        );
        assert!(statuses[0].has_updated);
        assert!(!statuses[1].has_updated);
    }
}
