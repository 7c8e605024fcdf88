use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Count,
    Currency,
    Percentage,
    Decimal,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Decimal => "decimal",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "currency" => Self::Currency,
            "percentage" => Self::Percentage,
            "decimal" => Self::Decimal,
            _ => Self::Count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollupType {
    Sum,
    Average,
    Latest,
}

impl RollupType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Latest => "latest",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "average" => Self::Average,
            "latest" => Self::Latest,
            _ => Self::Sum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl WeekDay {
    /// Sunday-based index, matching the stored setting values.
    pub fn index(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
        }
    }

    /// Unknown values fall back to Friday, the platform default.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "sunday" => Self::Sunday,
            "monday" => Self::Monday,
            "tuesday" => Self::Tuesday,
            "wednesday" => Self::Wednesday,
            "thursday" => Self::Thursday,
            "saturday" => Self::Saturday,
            _ => Self::Friday,
        }
    }
}

/// Derivation recipe for a calculated measure, stored as JSON alongside
/// the measure row. Source measures are referenced by name and resolved
/// within the measure's own section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CalculationFormula {
    Sum { source_measures: Vec<String> },
    Ratio { numerator: String, denominator: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MeasureKind {
    /// Entered weekly and summed into rollups.
    Accumulated,
    /// Read-only derived display cells, never part of rollups.
    Calculated { formula: Option<CalculationFormula> },
}

impl MeasureKind {
    pub fn is_calculated(&self) -> bool {
        matches!(self, Self::Calculated { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardTemplate {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub sections: Vec<ScorecardSection>,
}

impl ScorecardTemplate {
    pub fn measures(&self) -> impl Iterator<Item = &ScorecardMeasure> {
        self.sections.iter().flat_map(|section| section.measures.iter())
    }

    pub fn find_measure(&self, measure_id: &str) -> Option<&ScorecardMeasure> {
        self.measures().find(|measure| measure.id == measure_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardSection {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub display_order: i64,
    pub measures: Vec<ScorecardMeasure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardMeasure {
    pub id: String,
    pub section_id: String,
    pub name: String,
    pub data_type: DataType,
    pub rollup_type: RollupType,
    pub owner_user_id: Option<String>,
    pub kind: MeasureKind,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeasurePayload {
    pub id: Option<String>,
    pub section_id: String,
    pub name: String,
    pub data_type: DataType,
    pub rollup_type: RollupType,
    pub owner_user_id: Option<String>,
    pub kind: MeasureKind,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardEntry {
    pub id: String,
    pub measure_id: String,
    pub user_id: String,
    pub week_ending: NaiveDate,
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `save_entry` did with the parsed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum EntrySaveOutcome {
    Inserted { entry_id: String },
    Updated { entry_id: String },
    Deleted { entry_id: String },
    Unchanged,
    /// Nothing entered and nothing stored: cell stays blank.
    NoValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardGoal {
    pub id: String,
    pub measure_id: String,
    pub quarter: String,
    pub goal_value: f64,
    pub set_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveGoalPayload {
    pub goal_id: Option<String>,
    pub measure_id: String,
    pub quarter: String,
    pub goal_value: f64,
    pub set_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalChangeRecord {
    pub id: String,
    pub goal_id: String,
    pub previous_value: f64,
    pub new_value: f64,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    pub id: String,
    pub entry_id: String,
    pub line_name: String,
    pub line_value: Option<f64>,
    pub notes: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CampaignStatus {
    Active,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub leads_count_total: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignPayload {
    pub group_id: String,
    pub name: String,
    pub leads_count_total: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetricDefinition {
    pub id: String,
    pub group_id: String,
    pub metric_key: String,
    pub label: String,
    pub data_type: DataType,
    pub is_required: bool,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCampaignMetricPayload {
    pub id: Option<String>,
    pub group_id: String,
    pub metric_key: String,
    pub label: String,
    pub data_type: DataType,
    pub is_required: bool,
    pub display_order: i64,
}

/// One row per (campaign, week-ending): all metric values for the week
/// live together in one JSON object keyed by metric key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignWeekData {
    pub id: String,
    pub campaign_id: String,
    pub week_ending: NaiveDate,
    pub data: serde_json::Value,
    pub entered_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RockRecord {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub group_id: String,
    pub quarter_id: String,
    pub status: String,
    pub rolled_from_rock_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RockMilestone {
    pub id: String,
    pub rock_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RockIdea {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub suggested_owner_id: Option<String>,
    pub promoted_to_rock_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub week_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    Good,
    Warning,
    Critical,
}

impl GoalStatus {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 0.9 {
            Self::Good
        } else if percent >= 0.7 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CalculationFormula, GoalStatus, WeekDay};

    #[test]
    fn week_day_round_trips_through_setting_value() {
        for day in [
            WeekDay::Sunday,
            WeekDay::Monday,
            WeekDay::Tuesday,
            WeekDay::Wednesday,
            WeekDay::Thursday,
            WeekDay::Friday,
            WeekDay::Saturday,
        ] {
            assert_eq!(WeekDay::parse(day.as_str()), day);
        }
        assert_eq!(WeekDay::parse("not-a-day"), WeekDay::Friday);
        assert_eq!(WeekDay::parse("MONDAY"), WeekDay::Monday);
    }

    #[test]
    fn goal_status_tiers() {
        assert_eq!(GoalStatus::from_percent(1.2), GoalStatus::Good);
        assert_eq!(GoalStatus::from_percent(0.9), GoalStatus::Good);
        assert_eq!(GoalStatus::from_percent(0.89), GoalStatus::Warning);
        assert_eq!(GoalStatus::from_percent(0.7), GoalStatus::Warning);
        assert_eq!(GoalStatus::from_percent(0.5), GoalStatus::Critical);
    }

    #[test]
    fn calculation_formula_json_shape() {
        let sum: CalculationFormula =
            serde_json::from_str(r#"{"type":"sum","source_measures":["Calls","Emails"]}"#)
                .expect("sum formula");
        assert_eq!(
            sum,
            CalculationFormula::Sum {
                source_measures: vec!["Calls".to_string(), "Emails".to_string()]
            }
        );

        let ratio: CalculationFormula =
            serde_json::from_str(r#"{"type":"ratio","numerator":"Wins","denominator":"Calls"}"#)
                .expect("ratio formula");
        assert_eq!(
            ratio,
            CalculationFormula::Ratio {
                numerator: "Wins".to_string(),
                denominator: "Calls".to_string()
            }
        );
    }
}
