//! Composition root: owns the database handle and the cache hub, and
//! exposes every operation the shell drives — cached reads, cell and
//! goal commits with key invalidation, campaign tracking, the opaque
//! stored procedures, and the periodic cache refresh loop.

use crate::aggregation::{
    attendee_update_status, build_view, goal_progress, trend_series, AttendeeUpdateStatus,
    GoalProgressItem, ScorecardAggregation, ScorecardView, TrendSeries,
};
use crate::cache::{CacheHub, CacheKey};
use crate::calendar::{
    format_currency_full, parse_input_value, week_ending, week_endings_for_month,
};
use crate::campaign::{build_campaign_view, CampaignView};
use crate::db::{Database, WEEK_ENDING_DAY_KEY};
use crate::details::{reconcile, Reconciliation};
use crate::errors::{AppError, AppResult};
use crate::grid::{CellCommit, GridCell, GridController, GridLayout};
use crate::models::{
    Campaign, CampaignMetricDefinition, CampaignStatus, CampaignWeekData, CreateCampaignPayload,
    DataType, EntryDetail, EntrySaveOutcome, GoalChangeRecord, SaveCampaignMetricPayload,
    SaveGoalPayload, ScorecardEntry, ScorecardGoal, ScorecardTemplate, WeekDay,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetailPanel {
    pub entry: ScorecardEntry,
    pub display_value: String,
    pub details: Vec<EntryDetail>,
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalEditorContext {
    pub goal_id: Option<String>,
    pub measure_id: String,
    pub measure_name: String,
    pub data_type: DataType,
    pub quarter: String,
    pub current_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingReview {
    pub week_ending: NaiveDate,
    pub view: ScorecardView,
    pub attendee_statuses: Vec<AttendeeUpdateStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardDashboard {
    pub progress: Vec<GoalProgressItem>,
    pub trends: Vec<TrendSeries>,
}

#[derive(Clone)]
pub struct ScorecardCore {
    db: Arc<Database>,
    cache: Arc<CacheHub>,
}

impl ScorecardCore {
    pub fn new(db_path: &Path) -> AppResult<Self> {
        Ok(Self::with_database(Arc::new(Database::new(db_path)?)))
    }

    pub fn with_database(db: Arc<Database>) -> Self {
        Self {
            db,
            cache: Arc::new(CacheHub::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn cache(&self) -> &CacheHub {
        &self.cache
    }

    fn cached<T, F>(&self, key: CacheKey, fetch: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Database) -> AppResult<T>,
    {
        if let Some(value) = self.cache.get(&key) {
            if let Ok(decoded) = serde_json::from_value(value) {
                return Ok(decoded);
            }
        }
        let fresh = fetch(&self.db)?;
        self.cache.put(key, serde_json::to_value(&fresh)?);
        Ok(fresh)
    }

    // ─── Settings & calendar ────────────────────────────────────────────────

    pub fn scorecard_settings(&self, group_id: &str) -> AppResult<BTreeMap<String, String>> {
        let key = CacheKey::Settings {
            group_id: group_id.to_string(),
        };
        self.cached(key, |db| db.get_scorecard_settings(group_id))
    }

    pub fn week_ending_day(&self, group_id: &str) -> AppResult<WeekDay> {
        let settings = self.scorecard_settings(group_id)?;
        Ok(settings
            .get(WEEK_ENDING_DAY_KEY)
            .map(|raw| WeekDay::parse(raw))
            .unwrap_or(WeekDay::Friday))
    }

    pub fn set_week_ending_day(&self, group_id: &str, day: WeekDay) -> AppResult<()> {
        self.db
            .upsert_scorecard_setting(group_id, WEEK_ENDING_DAY_KEY, day.as_str())?;
        self.cache.invalidate(&CacheKey::Settings {
            group_id: group_id.to_string(),
        });
        Ok(())
    }

    /// Week-ending columns for a month, using the group's configured
    /// ending weekday.
    pub fn month_week_endings(
        &self,
        group_id: &str,
        year: i32,
        month0: u32,
    ) -> AppResult<Vec<NaiveDate>> {
        let day = self.week_ending_day(group_id)?;
        Ok(week_endings_for_month(year, month0, day))
    }

    // ─── Scorecard reads ────────────────────────────────────────────────────

    /// `Ok(None)` means the group has no active template yet — a valid
    /// "not configured" state, not a failure.
    pub fn active_template(&self, group_id: &str) -> AppResult<Option<ScorecardTemplate>> {
        let key = CacheKey::Template {
            group_id: group_id.to_string(),
        };
        self.cached(key, |db| db.get_active_template(group_id))
    }

    pub fn entries(
        &self,
        group_id: &str,
        week_endings: &[NaiveDate],
    ) -> AppResult<Vec<ScorecardEntry>> {
        let key = CacheKey::Entries {
            group_id: group_id.to_string(),
            week_endings: week_endings.to_vec(),
        };
        self.cached(key, |db| db.list_entries(group_id, week_endings))
    }

    pub fn goals(&self, group_id: &str, quarter: &str) -> AppResult<Vec<ScorecardGoal>> {
        let key = CacheKey::Goals {
            group_id: group_id.to_string(),
            quarter: quarter.to_string(),
        };
        self.cached(key, |db| db.list_goals(group_id, quarter))
    }

    pub fn scorecard_view(
        &self,
        group_id: &str,
        week_endings: &[NaiveDate],
        quarter: &str,
    ) -> AppResult<Option<ScorecardView>> {
        let Some(template) = self.active_template(group_id)? else {
            return Ok(None);
        };
        let entries = self.entries(group_id, week_endings)?;
        let goals = self.goals(group_id, quarter)?;
        Ok(Some(build_view(
            group_id,
            &template,
            &entries,
            &goals,
            week_endings,
            quarter,
        )))
    }

    pub fn dashboard(
        &self,
        group_id: &str,
        week_endings: &[NaiveDate],
        quarter: &str,
        section_filter: Option<&str>,
    ) -> AppResult<Option<ScorecardDashboard>> {
        let Some(template) = self.active_template(group_id)? else {
            return Ok(None);
        };
        let entries = self.entries(group_id, week_endings)?;
        let goals = self.goals(group_id, quarter)?;
        let aggregation = ScorecardAggregation::build(&template, &entries, &goals, week_endings);
        let progress = goal_progress(&template, &aggregation, section_filter);
        let trends = trend_series(&progress, &aggregation, 3);
        Ok(Some(ScorecardDashboard { progress, trends }))
    }

    /// Read-only scorecard for a meeting's week plus per-attendee
    /// update indicators.
    pub fn meeting_review(
        &self,
        group_id: &str,
        meeting_date: NaiveDate,
        attendee_user_ids: &[String],
        quarter: &str,
    ) -> AppResult<Option<MeetingReview>> {
        let day = self.week_ending_day(group_id)?;
        let meeting_week = week_ending(meeting_date, day);
        let Some(view) = self.scorecard_view(group_id, &[meeting_week], quarter)? else {
            return Ok(None);
        };
        let entries = self.entries(group_id, &[meeting_week])?;
        Ok(Some(MeetingReview {
            week_ending: meeting_week,
            view,
            attendee_statuses: attendee_update_status(&entries, attendee_user_ids, meeting_week),
        }))
    }

    // ─── Grid editing ───────────────────────────────────────────────────────

    /// A grid controller over the active template, seeded with the
    /// current user's own entry values (cells edit per-user figures,
    /// the grid displays the aggregate).
    pub fn scorecard_grid(
        &self,
        group_id: &str,
        week_endings: &[NaiveDate],
        current_user: Option<&str>,
        read_only: bool,
    ) -> AppResult<Option<GridController>> {
        let Some(template) = self.active_template(group_id)? else {
            return Ok(None);
        };
        let layout =
            GridLayout::for_template(&template, current_user, read_only, week_endings.to_vec());
        let mut controller = GridController::new(layout);

        if let Some(user) = current_user {
            let entries = self.entries(group_id, week_endings)?;
            let aggregation = ScorecardAggregation::build(&template, &entries, &[], week_endings);
            let mut values = HashMap::new();
            for (row, measure) in template.measures().enumerate() {
                for (col, week) in week_endings.iter().enumerate() {
                    if let Some(entry) = aggregation.user_entry(&measure.id, *week, user) {
                        values.insert(GridCell { row, col }, entry.value.to_string());
                    }
                }
            }
            controller.set_values(values);
        }

        Ok(Some(controller))
    }

    /// Apply a committed draft and invalidate the entries key for this
    /// (group, week-set) scope so open views refetch. The aggregate is
    /// never patched locally; the refetch is what updates it.
    pub fn commit_cell(
        &self,
        group_id: &str,
        user_id: &str,
        commit: &CellCommit,
        week_endings: &[NaiveDate],
    ) -> AppResult<EntrySaveOutcome> {
        let outcome = self.db.save_entry(
            &commit.row_key,
            user_id,
            commit.week_ending,
            &commit.raw,
            commit.data_type,
        )?;
        self.cache.invalidate(&CacheKey::Entries {
            group_id: group_id.to_string(),
            week_endings: week_endings.to_vec(),
        });
        Ok(outcome)
    }

    // ─── Goals ──────────────────────────────────────────────────────────────

    pub fn open_goal_editor(
        &self,
        group_id: &str,
        measure_id: &str,
        quarter: &str,
    ) -> AppResult<Option<GoalEditorContext>> {
        let Some(template) = self.active_template(group_id)? else {
            return Ok(None);
        };
        let Some(measure) = template.find_measure(measure_id) else {
            return Ok(None);
        };
        let goals = self.goals(group_id, quarter)?;
        let current = goals.iter().find(|goal| goal.measure_id == measure_id);
        Ok(Some(GoalEditorContext {
            goal_id: current.map(|goal| goal.id.clone()),
            measure_id: measure.id.clone(),
            measure_name: measure.name.clone(),
            data_type: measure.data_type,
            quarter: quarter.to_string(),
            current_value: current.map(|goal| goal.goal_value),
        }))
    }

    /// Save a goal; on updates, additionally try to attach the
    /// operator's reason to the newest change-log row. The attachment
    /// is best-effort and logged rather than surfaced on failure.
    pub fn save_goal(
        &self,
        group_id: &str,
        payload: SaveGoalPayload,
        reason: Option<&str>,
    ) -> AppResult<ScorecardGoal> {
        let is_update = payload.goal_id.is_some();
        let quarter = payload.quarter.clone();
        let goal = self.db.save_goal(payload)?;

        if is_update {
            if let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) {
                if let Err(error) = self.db.attach_goal_change_reason(&goal.id, reason) {
                    tracing::warn!(goal_id = %goal.id, error = %error, "failed to attach goal change reason");
                }
            }
        }

        self.cache.invalidate(&CacheKey::Goals {
            group_id: group_id.to_string(),
            quarter,
        });
        Ok(goal)
    }

    pub fn goal_history(&self, goal_id: &str) -> AppResult<Vec<GoalChangeRecord>> {
        self.db.goal_change_log(goal_id)
    }

    // ─── Line items ─────────────────────────────────────────────────────────

    /// The detail panel bound to a cell's entry. A cell with no entry
    /// yet has nothing to itemize; the panel stays inert (`Ok(None)`).
    pub fn entry_detail_panel(&self, entry_id: Option<&str>) -> AppResult<Option<EntryDetailPanel>> {
        let Some(entry_id) = entry_id else {
            return Ok(None);
        };
        let Some(entry) = self.db.get_entry(entry_id)? else {
            return Ok(None);
        };
        let key = CacheKey::EntryDetails {
            entry_id: entry_id.to_string(),
        };
        let details = self.cached(key, |db| db.list_entry_details(entry_id))?;
        Ok(Some(EntryDetailPanel {
            reconciliation: reconcile(Some(entry.value), &details),
            display_value: format_currency_full(Some(entry.value)),
            entry,
            details,
        }))
    }

    pub fn add_line_item(
        &self,
        entry_id: &str,
        line_name: &str,
        value_input: &str,
        notes: Option<&str>,
    ) -> AppResult<EntryDetail> {
        let value = parse_input_value(value_input, DataType::Currency);
        let detail = self.db.add_entry_detail(entry_id, line_name, value, notes)?;
        self.cache.invalidate(&CacheKey::EntryDetails {
            entry_id: entry_id.to_string(),
        });
        Ok(detail)
    }

    pub fn update_line_item(
        &self,
        entry_id: &str,
        detail_id: &str,
        line_name: &str,
        value_input: &str,
        notes: Option<&str>,
    ) -> AppResult<()> {
        let value = parse_input_value(value_input, DataType::Currency);
        self.db
            .update_entry_detail(detail_id, line_name, value, notes)?;
        self.cache.invalidate(&CacheKey::EntryDetails {
            entry_id: entry_id.to_string(),
        });
        Ok(())
    }

    pub fn delete_line_item(&self, entry_id: &str, detail_id: &str) -> AppResult<bool> {
        let deleted = self.db.delete_entry_detail(detail_id)?;
        self.cache.invalidate(&CacheKey::EntryDetails {
            entry_id: entry_id.to_string(),
        });
        Ok(deleted)
    }

    // ─── Campaigns ──────────────────────────────────────────────────────────

    pub fn campaigns(&self, group_id: &str) -> AppResult<Vec<Campaign>> {
        let key = CacheKey::Campaigns {
            group_id: group_id.to_string(),
        };
        self.cached(key, |db| db.list_campaigns(group_id))
    }

    pub fn create_campaign(&self, payload: CreateCampaignPayload) -> AppResult<Campaign> {
        let campaign = self.db.create_campaign(
            &payload.group_id,
            &payload.name,
            payload.leads_count_total,
        )?;
        self.cache.invalidate(&CacheKey::Campaigns {
            group_id: payload.group_id,
        });
        Ok(campaign)
    }

    pub fn archive_campaign(&self, group_id: &str, campaign_id: &str) -> AppResult<Campaign> {
        let campaign = self
            .db
            .set_campaign_status(campaign_id, CampaignStatus::Archived)?;
        self.cache.invalidate(&CacheKey::Campaigns {
            group_id: group_id.to_string(),
        });
        Ok(campaign)
    }

    pub fn reactivate_campaign(&self, group_id: &str, campaign_id: &str) -> AppResult<Campaign> {
        let campaign = self
            .db
            .set_campaign_status(campaign_id, CampaignStatus::Active)?;
        self.cache.invalidate(&CacheKey::Campaigns {
            group_id: group_id.to_string(),
        });
        Ok(campaign)
    }

    pub fn ensure_core_campaign_metrics(&self, group_id: &str) -> AppResult<()> {
        self.db.ensure_core_campaign_metrics(group_id)?;
        self.cache.invalidate(&CacheKey::CampaignMetrics {
            group_id: group_id.to_string(),
        });
        Ok(())
    }

    pub fn campaign_metrics(&self, group_id: &str) -> AppResult<Vec<CampaignMetricDefinition>> {
        let key = CacheKey::CampaignMetrics {
            group_id: group_id.to_string(),
        };
        self.cached(key, |db| db.list_campaign_metrics(group_id))
    }

    pub fn save_campaign_metric(
        &self,
        payload: SaveCampaignMetricPayload,
    ) -> AppResult<CampaignMetricDefinition> {
        let group_id = payload.group_id.clone();
        let metric = self.db.save_campaign_metric(payload)?;
        self.cache
            .invalidate(&CacheKey::CampaignMetrics { group_id });
        Ok(metric)
    }

    pub fn delete_campaign_metric(&self, group_id: &str, metric_id: &str) -> AppResult<()> {
        self.db.delete_campaign_metric(metric_id)?;
        self.cache.invalidate(&CacheKey::CampaignMetrics {
            group_id: group_id.to_string(),
        });
        Ok(())
    }

    pub fn campaign_week_data(
        &self,
        campaign_id: &str,
        week_endings: &[NaiveDate],
    ) -> AppResult<Vec<CampaignWeekData>> {
        let key = CacheKey::CampaignData {
            campaign_id: campaign_id.to_string(),
            week_endings: week_endings.to_vec(),
        };
        self.cached(key, |db| db.list_campaign_week_data(campaign_id, week_endings))
    }

    pub fn campaign_view(
        &self,
        group_id: &str,
        campaign_id: &str,
        week_endings: &[NaiveDate],
    ) -> AppResult<CampaignView> {
        let metrics = self.campaign_metrics(group_id)?;
        let week_data = self.campaign_week_data(campaign_id, week_endings)?;
        Ok(build_campaign_view(
            campaign_id,
            &metrics,
            &week_data,
            week_endings,
        ))
    }

    pub fn campaign_grid(
        &self,
        group_id: &str,
        campaign_id: &str,
        week_endings: &[NaiveDate],
        current_user: Option<&str>,
    ) -> AppResult<GridController> {
        let campaign = self
            .db
            .get_campaign(campaign_id)?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", campaign_id)))?;
        let metrics = self.campaign_metrics(group_id)?;
        let layout = GridLayout::for_campaign(
            &metrics,
            campaign.status,
            current_user,
            week_endings.to_vec(),
        );
        let mut controller = GridController::new(layout);

        let week_data = self.campaign_week_data(campaign_id, week_endings)?;
        let aggregation = crate::campaign::CampaignAggregation::build(&week_data, week_endings);
        let mut values = HashMap::new();
        for (row, metric) in metrics.iter().enumerate() {
            for (col, week) in week_endings.iter().enumerate() {
                if let Some(value) = aggregation.metric_value(*week, &metric.metric_key) {
                    values.insert(GridCell { row, col }, value.to_string());
                }
            }
        }
        controller.set_values(values);

        Ok(controller)
    }

    pub fn commit_campaign_cell(
        &self,
        campaign_id: &str,
        entered_by: &str,
        commit: &CellCommit,
        week_endings: &[NaiveDate],
    ) -> AppResult<()> {
        let parsed = parse_input_value(&commit.raw, commit.data_type);
        self.db.save_campaign_cell(
            campaign_id,
            commit.week_ending,
            &commit.row_key,
            parsed,
            entered_by,
        )?;
        self.cache.invalidate(&CacheKey::CampaignData {
            campaign_id: campaign_id.to_string(),
            week_endings: week_endings.to_vec(),
        });
        Ok(())
    }

    // ─── Stored procedures ──────────────────────────────────────────────────
    //
    // Opaque, atomic, no retries here; failures carry the procedure's
    // own message and leave prior state untouched.

    pub fn start_new_week(
        &self,
        user_id: &str,
        group_id: &str,
        week_date: NaiveDate,
    ) -> AppResult<String> {
        self.db.start_new_week(user_id, group_id, week_date)
    }

    pub fn roll_forward_rock(&self, rock_id: &str, new_quarter_id: &str) -> AppResult<String> {
        self.db.roll_forward_rock(rock_id, new_quarter_id)
    }

    pub fn promote_rock_idea(
        &self,
        idea_id: &str,
        quarter_id: &str,
        owner_id: &str,
    ) -> AppResult<String> {
        self.db.promote_rock_idea(idea_id, quarter_id, owner_id)
    }

    // ─── Background refresh ─────────────────────────────────────────────────

    /// Re-fetch cached resources older than `max_age` on a fixed
    /// period, so already-open views converge without user action.
    pub fn start_refresh_loop(&self, period: std::time::Duration, max_age: chrono::Duration) {
        let core = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                for key in core.cache.stale_keys(max_age) {
                    if let Err(error) = core.refresh_key(&key) {
                        tracing::warn!(key = %key.as_string(), error = %error, "cache refresh failed");
                    }
                }
            }
        });
    }

    fn refresh_key(&self, key: &CacheKey) -> AppResult<()> {
        let value = match key {
            CacheKey::Template { group_id } => {
                serde_json::to_value(self.db.get_active_template(group_id)?)?
            }
            CacheKey::Entries { group_id, week_endings } => {
                serde_json::to_value(self.db.list_entries(group_id, week_endings)?)?
            }
            CacheKey::Goals { group_id, quarter } => {
                serde_json::to_value(self.db.list_goals(group_id, quarter)?)?
            }
            CacheKey::EntryDetails { entry_id } => {
                serde_json::to_value(self.db.list_entry_details(entry_id)?)?
            }
            CacheKey::Settings { group_id } => {
                serde_json::to_value(self.db.get_scorecard_settings(group_id)?)?
            }
            CacheKey::Campaigns { group_id } => {
                serde_json::to_value(self.db.list_campaigns(group_id)?)?
            }
            CacheKey::CampaignMetrics { group_id } => {
                serde_json::to_value(self.db.list_campaign_metrics(group_id)?)?
            }
            CacheKey::CampaignData { campaign_id, week_endings } => {
                serde_json::to_value(self.db.list_campaign_week_data(campaign_id, week_endings)?)?
            }
        };
        self.cache.put(key.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MeasureKind, RollupType, SaveMeasurePayload};

    fn core() -> ScorecardCore {
        ScorecardCore::with_database(Arc::new(Database::in_memory().expect("open database")))
    }

    fn week(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).expect("valid date")
    }

    fn seed_template(core: &ScorecardCore, group_id: &str) -> (String, String) {
        let template = core
            .db()
            .create_template(group_id, "Weekly", None, true)
            .expect("template");
        let section = core
            .db()
            .add_section(&template.id, "Sales", 0)
            .expect("section");
        let calls = core
            .db()
            .save_measure(SaveMeasurePayload {
                id: None,
                section_id: section.id.clone(),
                name: "Calls".to_string(),
                data_type: DataType::Count,
                rollup_type: RollupType::Sum,
                owner_user_id: None,
                kind: MeasureKind::Accumulated,
                display_order: 0,
            })
            .expect("measure");
        (template.id, calls.id)
    }

    #[test]
    fn unconfigured_group_is_none_not_an_error() {
        let core = core();
        let view = core
            .scorecard_view("group-x", &[week(2)], "2026-Q1")
            .expect("view call");
        assert!(view.is_none());
        assert!(core
            .scorecard_grid("group-x", &[week(2)], Some("user-a"), false)
            .expect("grid call")
            .is_none());
    }

    #[test]
    fn commit_invalidates_the_entries_key() {
        let core = core();
        let (_, calls_id) = seed_template(&core, "group-1");
        let weeks = [week(2)];

        // Prime the cache, then watch for the invalidation event.
        core.entries("group-1", &weeks).expect("prime entries");
        let mut events = core.cache().subscribe();

        let commit = CellCommit {
            row_key: calls_id,
            data_type: DataType::Count,
            week_ending: week(2),
            raw: "10".to_string(),
        };
        let outcome = core
            .commit_cell("group-1", "user-a", &commit, &weeks)
            .expect("commit");
        assert!(matches!(outcome, EntrySaveOutcome::Inserted { .. }));
        assert_eq!(
            events.try_recv().expect("invalidation event"),
            "scorecard-entries-group-1-2026-01-02"
        );

        let view = core
            .scorecard_view("group-1", &weeks, "2026-Q1")
            .expect("view")
            .expect("configured");
        assert_eq!(view.sections[0].measures[0].total, 10.0);
    }

    #[test]
    fn stale_cache_values_are_refetched_by_key() {
        let core = core();
        seed_template(&core, "group-1");
        core.entries("group-1", &[week(2)]).expect("prime");

        let stale = core.cache().stale_keys(chrono::Duration::seconds(-1));
        assert!(!stale.is_empty());
        for key in stale {
            core.refresh_key(&key).expect("refresh");
        }
        assert!(core
            .cache()
            .stale_keys(chrono::Duration::seconds(60))
            .is_empty());
    }

    #[tokio::test]
    async fn refresh_loop_converges_cached_reads() {
        let core = core();
        let (_, calls_id) = seed_template(&core, "group-1");
        let weeks = [week(2)];
        assert!(core.entries("group-1", &weeks).expect("prime").is_empty());

        // Write behind the cache's back; the loop should pick it up.
        core.db()
            .save_entry(&calls_id, "user-a", week(2), "5", DataType::Count)
            .expect("entry");
        core.start_refresh_loop(
            std::time::Duration::from_millis(10),
            chrono::Duration::zero(),
        );
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(core.entries("group-1", &weeks).expect("read").len(), 1);
    }

    #[test]
    fn goal_reason_attaches_only_on_updates() {
        let core = core();
        let (_, calls_id) = seed_template(&core, "group-1");

        let created = core
            .save_goal(
                "group-1",
                SaveGoalPayload {
                    goal_id: None,
                    measure_id: calls_id.clone(),
                    quarter: "2026-Q1".to_string(),
                    goal_value: 100.0,
                    set_by: "user-a".to_string(),
                },
                Some("ignored on create"),
            )
            .expect("create goal");
        assert!(core.goal_history(&created.id).expect("history").is_empty());

        let updated = core
            .save_goal(
                "group-1",
                SaveGoalPayload {
                    goal_id: Some(created.id.clone()),
                    measure_id: calls_id,
                    quarter: "2026-Q1".to_string(),
                    goal_value: 150.0,
                    set_by: "user-a".to_string(),
                },
                Some("raised after strong January"),
            )
            .expect("update goal");
        assert_eq!(updated.goal_value, 150.0);

        let history = core.goal_history(&created.id).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_value, 100.0);
        assert_eq!(history[0].new_value, 150.0);
        assert_eq!(
            history[0].reason.as_deref(),
            Some("raised after strong January")
        );
    }
}
