use crate::calendar::{format_date, parse_input_value};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Campaign, CampaignMetricDefinition, CampaignStatus, CampaignWeekData, DataType, EntryDetail,
    EntrySaveOutcome, FocusSnapshot, GoalChangeRecord, MeasureKind, RockIdea, RockMilestone,
    RockRecord, RollupType, SaveCampaignMetricPayload, SaveGoalPayload, SaveMeasurePayload,
    ScorecardEntry, ScorecardGoal, ScorecardMeasure, ScorecardSection, ScorecardTemplate, WeekDay,
};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

pub const WEEK_ENDING_DAY_KEY: &str = "week_ending_day";

/// Core campaign metric columns every group starts with. Required
/// metrics cannot be deleted and their keys never change.
static CORE_CAMPAIGN_METRICS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("outreach", "Outreach"),
        ("connects", "Connects"),
        ("meetings", "Meetings"),
        ("potentials", "Potentials"),
    ]
});

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    // ─── Settings ────────────────────────────────────────────────────────────

    pub fn get_scorecard_settings(&self, group_id: &str) -> AppResult<BTreeMap<String, String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT setting_key, setting_value FROM scorecard_settings WHERE group_id = ?1",
        )?;
        let mut rows = stmt.query([group_id])?;
        let mut settings = BTreeMap::new();
        while let Some(row) = rows.next()? {
            settings.insert(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
        }
        Ok(settings)
    }

    pub fn upsert_scorecard_setting(
        &self,
        group_id: &str,
        setting_key: &str,
        setting_value: &str,
    ) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scorecard_settings (id, group_id, setting_key, setting_value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(group_id, setting_key)
             DO UPDATE SET setting_value = excluded.setting_value, updated_at = excluded.updated_at",
            params![Uuid::new_v4().to_string(), group_id, setting_key, setting_value, now],
        )?;
        Ok(())
    }

    pub fn week_ending_day(&self, group_id: &str) -> AppResult<WeekDay> {
        let settings = self.get_scorecard_settings(group_id)?;
        Ok(settings
            .get(WEEK_ENDING_DAY_KEY)
            .map(|raw| WeekDay::parse(raw))
            .unwrap_or(WeekDay::Friday))
    }

    // ─── Templates, sections, measures ──────────────────────────────────────

    pub fn create_template(
        &self,
        group_id: &str,
        name: &str,
        description: Option<&str>,
        is_active: bool,
    ) -> AppResult<ScorecardTemplate> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        if is_active {
            conn.execute(
                "UPDATE scorecard_templates SET is_active = 0, updated_at = ?1 WHERE group_id = ?2",
                params![now, group_id],
            )?;
        }
        conn.execute(
            "INSERT INTO scorecard_templates (id, group_id, name, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, group_id, name, description, is_active as i32, now],
        )?;
        Ok(ScorecardTemplate {
            id,
            group_id: group_id.to_string(),
            name: name.to_string(),
            description: description.map(ToString::to_string),
            is_active,
            sections: Vec::new(),
        })
    }

    pub fn add_section(
        &self,
        template_id: &str,
        name: &str,
        display_order: i64,
    ) -> AppResult<ScorecardSection> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scorecard_sections (id, template_id, name, display_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, template_id, name, display_order, now],
        )?;
        Ok(ScorecardSection {
            id,
            template_id: template_id.to_string(),
            name: name.to_string(),
            display_order,
            measures: Vec::new(),
        })
    }

    pub fn save_measure(&self, payload: SaveMeasurePayload) -> AppResult<ScorecardMeasure> {
        let now = Utc::now().to_rfc3339();
        let id = payload.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let (is_calculated, formula_json) = match &payload.kind {
            MeasureKind::Accumulated => (0, None),
            MeasureKind::Calculated { formula } => (
                1,
                formula
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
            ),
        };

        let conn = self.lock()?;
        let exists = conn
            .query_row(
                "SELECT COUNT(1) FROM scorecard_measures WHERE id = ?1",
                [id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;

        if exists {
            conn.execute(
                "UPDATE scorecard_measures
                 SET section_id = ?1, name = ?2, data_type = ?3, rollup_type = ?4,
                     owner_user_id = ?5, is_calculated = ?6, calculation_formula = ?7,
                     display_order = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    payload.section_id,
                    payload.name,
                    payload.data_type.as_str(),
                    payload.rollup_type.as_str(),
                    payload.owner_user_id,
                    is_calculated,
                    formula_json,
                    payload.display_order,
                    now,
                    id,
                ],
            )?;
        } else {
            conn.execute(
                "INSERT INTO scorecard_measures (
                   id, section_id, name, data_type, rollup_type, owner_user_id,
                   is_calculated, calculation_formula, display_order, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    id,
                    payload.section_id,
                    payload.name,
                    payload.data_type.as_str(),
                    payload.rollup_type.as_str(),
                    payload.owner_user_id,
                    is_calculated,
                    formula_json,
                    payload.display_order,
                    now,
                ],
            )?;
        }

        Ok(ScorecardMeasure {
            id,
            section_id: payload.section_id,
            name: payload.name,
            data_type: payload.data_type,
            rollup_type: payload.rollup_type,
            owner_user_id: payload.owner_user_id,
            kind: payload.kind,
            display_order: payload.display_order,
        })
    }

    /// The group's one active template with sections and measures in
    /// display order. `None` means "not configured yet", a valid state
    /// distinct from a fetch failure.
    pub fn get_active_template(&self, group_id: &str) -> AppResult<Option<ScorecardTemplate>> {
        let conn = self.lock()?;
        let header: Option<(String, String, Option<String>)> = conn
            .query_row(
                "SELECT id, name, description FROM scorecard_templates
                 WHERE group_id = ?1 AND is_active = 1",
                [group_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((template_id, name, description)) = header else {
            return Ok(None);
        };

        let mut section_stmt = conn.prepare(
            "SELECT id, template_id, name, display_order FROM scorecard_sections
             WHERE template_id = ?1 ORDER BY display_order ASC",
        )?;
        let mut sections = section_stmt
            .query_map([&template_id], |row| {
                Ok(ScorecardSection {
                    id: row.get(0)?,
                    template_id: row.get(1)?,
                    name: row.get(2)?,
                    display_order: row.get(3)?,
                    measures: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut measure_stmt = conn.prepare(
            "SELECT id, section_id, name, data_type, rollup_type, owner_user_id,
                    is_calculated, calculation_formula, display_order
             FROM scorecard_measures WHERE section_id = ?1 ORDER BY display_order ASC",
        )?;
        for section in &mut sections {
            section.measures = measure_stmt
                .query_map([&section.id], parse_measure_row)?
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(Some(ScorecardTemplate {
            id: template_id,
            group_id: group_id.to_string(),
            name,
            description,
            is_active: true,
            sections,
        }))
    }

    fn active_measure_ids(&self, group_id: &str) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT m.id FROM scorecard_measures m
             JOIN scorecard_sections s ON s.id = m.section_id
             JOIN scorecard_templates t ON t.id = s.template_id
             WHERE t.group_id = ?1 AND t.is_active = 1",
        )?;
        let ids = stmt
            .query_map([group_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ─── Entries ────────────────────────────────────────────────────────────

    /// Entries scoped to the group's active template for the requested
    /// week-endings. An unconfigured group yields an empty list.
    pub fn list_entries(
        &self,
        group_id: &str,
        week_endings: &[NaiveDate],
    ) -> AppResult<Vec<ScorecardEntry>> {
        let measure_ids = self.active_measure_ids(group_id)?;
        if measure_ids.is_empty() || week_endings.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let query = format!(
            "SELECT id, measure_id, user_id, week_ending, value, created_at, updated_at
             FROM scorecard_entries
             WHERE measure_id IN ({}) AND week_ending IN ({})
             ORDER BY week_ending ASC, created_at ASC",
            placeholders(measure_ids.len()),
            placeholders_from(week_endings.len(), measure_ids.len() + 1),
        );
        let mut params_vec: Vec<String> = measure_ids;
        params_vec.extend(week_endings.iter().map(|week| format_date(*week)));

        let mut stmt = conn.prepare(&query)?;
        let entries = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), parse_entry_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn find_entry(
        &self,
        measure_id: &str,
        user_id: &str,
        week_ending: NaiveDate,
    ) -> AppResult<Option<ScorecardEntry>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, measure_id, user_id, week_ending, value, created_at, updated_at
             FROM scorecard_entries
             WHERE measure_id = ?1 AND user_id = ?2 AND week_ending = ?3",
            params![measure_id, user_id, format_date(week_ending)],
            parse_entry_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn get_entry(&self, entry_id: &str) -> AppResult<Option<ScorecardEntry>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, measure_id, user_id, week_ending, value, created_at, updated_at
             FROM scorecard_entries WHERE id = ?1",
            [entry_id],
            parse_entry_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Parse-and-save for one grid cell. A parsed value of `None` or
    /// exactly zero deletes any prior entry so "not yet entered" stays
    /// distinguishable from "entered as zero"; otherwise the entry is
    /// inserted or updated in place.
    pub fn save_entry(
        &self,
        measure_id: &str,
        user_id: &str,
        week_ending: NaiveDate,
        raw_input: &str,
        data_type: DataType,
    ) -> AppResult<EntrySaveOutcome> {
        self.check_measure_editable(measure_id, user_id)?;

        let parsed = parse_input_value(raw_input, data_type);
        let existing = self.find_entry(measure_id, user_id, week_ending)?;
        let effective = parsed.filter(|value| *value != 0.0);

        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        match (effective, existing) {
            (None, Some(entry)) => {
                conn.execute("DELETE FROM scorecard_entries WHERE id = ?1", [&entry.id])?;
                Ok(EntrySaveOutcome::Deleted { entry_id: entry.id })
            }
            (None, None) => Ok(EntrySaveOutcome::NoValue),
            (Some(value), Some(entry)) => {
                if value == entry.value {
                    return Ok(EntrySaveOutcome::Unchanged);
                }
                conn.execute(
                    "UPDATE scorecard_entries SET value = ?1, updated_at = ?2 WHERE id = ?3",
                    params![value, now, entry.id],
                )?;
                Ok(EntrySaveOutcome::Updated { entry_id: entry.id })
            }
            (Some(value), None) => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO scorecard_entries (id, measure_id, user_id, week_ending, value, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![id, measure_id, user_id, format_date(week_ending), value, now],
                )?;
                Ok(EntrySaveOutcome::Inserted { entry_id: id })
            }
        }
    }

    /// Row-level authorization the hosted backend would enforce: owned
    /// measures accept entries from their owner only, calculated
    /// measures from nobody.
    fn check_measure_editable(&self, measure_id: &str, user_id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        let found: Option<(Option<String>, i64)> = conn
            .query_row(
                "SELECT owner_user_id, is_calculated FROM scorecard_measures WHERE id = ?1",
                [measure_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((owner, is_calculated)) = found else {
            return Err(AppError::NotFound(format!("measure {}", measure_id)));
        };
        if is_calculated != 0 {
            return Err(AppError::Policy(
                "calculated measures are derived and cannot be entered".to_string(),
            ));
        }
        if let Some(owner) = owner {
            if owner != user_id {
                return Err(AppError::Policy(
                    "measure entries are restricted to the measure owner".to_string(),
                ));
            }
        }
        Ok(())
    }

    // ─── Goals ──────────────────────────────────────────────────────────────

    pub fn list_goals(&self, group_id: &str, quarter: &str) -> AppResult<Vec<ScorecardGoal>> {
        let measure_ids = self.active_measure_ids(group_id)?;
        if measure_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let query = format!(
            "SELECT id, measure_id, quarter, goal_value, set_by, created_at, updated_at
             FROM scorecard_goals WHERE measure_id IN ({}) AND quarter = ?{}",
            placeholders(measure_ids.len()),
            measure_ids.len() + 1,
        );
        let mut params_vec: Vec<String> = measure_ids;
        params_vec.push(quarter.to_string());

        let mut stmt = conn.prepare(&query)?;
        let goals = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), parse_goal_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    pub fn get_goal(&self, goal_id: &str) -> AppResult<Option<ScorecardGoal>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, measure_id, quarter, goal_value, set_by, created_at, updated_at
             FROM scorecard_goals WHERE id = ?1",
            [goal_id],
            parse_goal_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Update in place when a goal id is supplied, else insert scoped to
    /// (measure, quarter). Updates append a change-log row in the same
    /// transaction; the optional operator reason is attached afterwards
    /// via [`Database::attach_goal_change_reason`], a deliberately
    /// separate best-effort write.
    pub fn save_goal(&self, payload: SaveGoalPayload) -> AppResult<ScorecardGoal> {
        let now = Utc::now();
        let mut conn = self.lock()?;

        if let Some(goal_id) = &payload.goal_id {
            let tx = conn.transaction()?;
            let previous: Option<f64> = tx
                .query_row(
                    "SELECT goal_value FROM scorecard_goals WHERE id = ?1",
                    [goal_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(previous) = previous else {
                return Err(AppError::NotFound(format!("goal {}", goal_id)));
            };
            tx.execute(
                "UPDATE scorecard_goals SET goal_value = ?1, updated_at = ?2 WHERE id = ?3",
                params![payload.goal_value, now.to_rfc3339(), goal_id],
            )?;
            tx.execute(
                "INSERT INTO goal_change_log (id, goal_id, previous_value, new_value, changed_by, changed_at, reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
                params![
                    Uuid::new_v4().to_string(),
                    goal_id,
                    previous,
                    payload.goal_value,
                    payload.set_by,
                    now.to_rfc3339(),
                ],
            )?;
            tx.commit()?;
            drop(conn);
            return self
                .get_goal(goal_id)?
                .ok_or_else(|| AppError::NotFound(format!("goal {}", goal_id)));
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO scorecard_goals (id, measure_id, quarter, goal_value, set_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                payload.measure_id,
                payload.quarter,
                payload.goal_value,
                payload.set_by,
                now.to_rfc3339(),
            ],
        )?;
        Ok(ScorecardGoal {
            id,
            measure_id: payload.measure_id,
            quarter: payload.quarter,
            goal_value: payload.goal_value,
            set_by: payload.set_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach a free-text reason to the newest change-log row for a
    /// goal. Not atomic with the goal update; concurrent edits of the
    /// same goal can attach the reason to the other edit's row.
    pub fn attach_goal_change_reason(&self, goal_id: &str, reason: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let newest: Option<String> = conn
            .query_row(
                "SELECT id FROM goal_change_log WHERE goal_id = ?1
                 ORDER BY changed_at DESC LIMIT 1",
                [goal_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(log_id) = newest else {
            return Ok(false);
        };
        let changed = conn.execute(
            "UPDATE goal_change_log SET reason = ?1 WHERE id = ?2",
            params![reason, log_id],
        )?;
        Ok(changed > 0)
    }

    pub fn goal_change_log(&self, goal_id: &str) -> AppResult<Vec<GoalChangeRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, goal_id, previous_value, new_value, changed_by, changed_at, reason
             FROM goal_change_log WHERE goal_id = ?1 ORDER BY changed_at DESC",
        )?;
        let records = stmt
            .query_map([goal_id], |row| {
                Ok(GoalChangeRecord {
                    id: row.get(0)?,
                    goal_id: row.get(1)?,
                    previous_value: row.get(2)?,
                    new_value: row.get(3)?,
                    changed_by: row.get(4)?,
                    changed_at: parse_time(&row.get::<_, String>(5)?)?,
                    reason: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // ─── Entry details (line items) ─────────────────────────────────────────

    pub fn list_entry_details(&self, entry_id: &str) -> AppResult<Vec<EntryDetail>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, entry_id, line_name, line_value, notes, display_order
             FROM scorecard_entry_details WHERE entry_id = ?1 ORDER BY display_order ASC",
        )?;
        let details = stmt
            .query_map([entry_id], parse_detail_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(details)
    }

    /// Appends after the current maximum display order. Deletions leave
    /// gaps; orders are never renumbered.
    pub fn add_entry_detail(
        &self,
        entry_id: &str,
        line_name: &str,
        line_value: Option<f64>,
        notes: Option<&str>,
    ) -> AppResult<EntryDetail> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let next_order: i64 = conn.query_row(
            "SELECT COALESCE(MAX(display_order), 0) + 1 FROM scorecard_entry_details WHERE entry_id = ?1",
            [entry_id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO scorecard_entry_details (id, entry_id, line_name, line_value, notes, display_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![id, entry_id, line_name, line_value, notes, next_order, now],
        )?;
        Ok(EntryDetail {
            id,
            entry_id: entry_id.to_string(),
            line_name: line_name.to_string(),
            line_value,
            notes: notes.map(ToString::to_string),
            display_order: next_order,
        })
    }

    pub fn update_entry_detail(
        &self,
        detail_id: &str,
        line_name: &str,
        line_value: Option<f64>,
        notes: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE scorecard_entry_details
             SET line_name = ?1, line_value = ?2, notes = ?3, updated_at = ?4 WHERE id = ?5",
            params![line_name, line_value, notes, Utc::now().to_rfc3339(), detail_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("entry detail {}", detail_id)));
        }
        Ok(())
    }

    pub fn delete_entry_detail(&self, detail_id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM scorecard_entry_details WHERE id = ?1",
            [detail_id],
        )?;
        Ok(changed > 0)
    }

    // ─── Campaigns ──────────────────────────────────────────────────────────

    pub fn create_campaign(
        &self,
        group_id: &str,
        name: &str,
        leads_count_total: Option<i64>,
    ) -> AppResult<Campaign> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO campaigns (id, group_id, name, status, leads_count_total, created_at, archived_at)
             VALUES (?1, ?2, ?3, 'active', ?4, ?5, NULL)",
            params![id, group_id, name, leads_count_total, now.to_rfc3339()],
        )?;
        Ok(Campaign {
            id,
            group_id: group_id.to_string(),
            name: name.to_string(),
            status: CampaignStatus::Active,
            leads_count_total,
            created_at: now,
            archived_at: None,
        })
    }

    pub fn list_campaigns(&self, group_id: &str) -> AppResult<Vec<Campaign>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, group_id, name, status, leads_count_total, created_at, archived_at
             FROM campaigns WHERE group_id = ?1 ORDER BY created_at DESC",
        )?;
        let campaigns = stmt
            .query_map([group_id], parse_campaign_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(campaigns)
    }

    pub fn get_campaign(&self, campaign_id: &str) -> AppResult<Option<Campaign>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, group_id, name, status, leads_count_total, created_at, archived_at
             FROM campaigns WHERE id = ?1",
            [campaign_id],
            parse_campaign_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Archiving stamps `archived_at`; reactivation clears it.
    pub fn set_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> AppResult<Campaign> {
        let archived_at = match status {
            CampaignStatus::Archived => Some(Utc::now().to_rfc3339()),
            CampaignStatus::Active => None,
        };
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE campaigns SET status = ?1, archived_at = ?2 WHERE id = ?3",
            params![status.as_str(), archived_at, campaign_id],
        )?;
        drop(conn);
        if changed == 0 {
            return Err(AppError::NotFound(format!("campaign {}", campaign_id)));
        }
        self.get_campaign(campaign_id)?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", campaign_id)))
    }

    // ─── Campaign metric definitions ────────────────────────────────────────

    pub fn ensure_core_campaign_metrics(&self, group_id: &str) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        for (order, (key, label)) in CORE_CAMPAIGN_METRICS.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO campaign_metric_definitions
                   (id, group_id, metric_key, label, data_type, is_required, display_order, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'count', 1, ?5, ?6)",
                params![Uuid::new_v4().to_string(), group_id, key, label, order as i64, now],
            )?;
        }
        Ok(())
    }

    pub fn list_campaign_metrics(&self, group_id: &str) -> AppResult<Vec<CampaignMetricDefinition>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, group_id, metric_key, label, data_type, is_required, display_order
             FROM campaign_metric_definitions WHERE group_id = ?1 ORDER BY display_order ASC",
        )?;
        let metrics = stmt
            .query_map([group_id], parse_metric_definition_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metrics)
    }

    /// Inserts a new metric column or updates an existing one. A
    /// metric's key is immutable after creation; updates only touch the
    /// label, data type, and display order.
    pub fn save_campaign_metric(
        &self,
        payload: SaveCampaignMetricPayload,
    ) -> AppResult<CampaignMetricDefinition> {
        let conn = self.lock()?;
        if let Some(id) = &payload.id {
            let existing: Option<(String, i64)> = conn
                .query_row(
                    "SELECT metric_key, is_required FROM campaign_metric_definitions WHERE id = ?1",
                    [id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((metric_key, is_required)) = existing else {
                return Err(AppError::NotFound(format!("campaign metric {}", id)));
            };
            conn.execute(
                "UPDATE campaign_metric_definitions
                 SET label = ?1, data_type = ?2, display_order = ?3 WHERE id = ?4",
                params![payload.label, payload.data_type.as_str(), payload.display_order, id],
            )?;
            return Ok(CampaignMetricDefinition {
                id: id.clone(),
                group_id: payload.group_id,
                metric_key,
                label: payload.label,
                data_type: payload.data_type,
                is_required: is_required != 0,
                display_order: payload.display_order,
            });
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO campaign_metric_definitions
               (id, group_id, metric_key, label, data_type, is_required, display_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                payload.group_id,
                payload.metric_key,
                payload.label,
                payload.data_type.as_str(),
                payload.is_required as i32,
                payload.display_order,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(CampaignMetricDefinition {
            id,
            group_id: payload.group_id,
            metric_key: payload.metric_key,
            label: payload.label,
            data_type: payload.data_type,
            is_required: payload.is_required,
            display_order: payload.display_order,
        })
    }

    pub fn delete_campaign_metric(&self, metric_id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        let required: Option<i64> = conn
            .query_row(
                "SELECT is_required FROM campaign_metric_definitions WHERE id = ?1",
                [metric_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(required) = required else {
            return Err(AppError::NotFound(format!("campaign metric {}", metric_id)));
        };
        if required != 0 {
            return Err(AppError::Policy(
                "required core metrics cannot be deleted".to_string(),
            ));
        }
        conn.execute(
            "DELETE FROM campaign_metric_definitions WHERE id = ?1",
            [metric_id],
        )?;
        Ok(())
    }

    // ─── Campaign weekly data ───────────────────────────────────────────────

    pub fn list_campaign_week_data(
        &self,
        campaign_id: &str,
        week_endings: &[NaiveDate],
    ) -> AppResult<Vec<CampaignWeekData>> {
        if week_endings.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        let query = format!(
            "SELECT id, campaign_id, week_ending, data, entered_by, created_at, updated_at
             FROM campaign_weekly_data
             WHERE campaign_id = ?1 AND week_ending IN ({})
             ORDER BY week_ending ASC",
            placeholders_from(week_endings.len(), 2),
        );
        let mut params_vec: Vec<String> = vec![campaign_id.to_string()];
        params_vec.extend(week_endings.iter().map(|week| format_date(*week)));

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params_vec.iter()), parse_week_data_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Merge one metric value into the week's JSON object. The weekly
    /// row is created lazily on the first non-null value; blanking a key
    /// in an existing row stores JSON null for it.
    pub fn save_campaign_cell(
        &self,
        campaign_id: &str,
        week_ending: NaiveDate,
        metric_key: &str,
        value: Option<f64>,
        entered_by: &str,
    ) -> AppResult<()> {
        let campaign = self
            .get_campaign(campaign_id)?
            .ok_or_else(|| AppError::NotFound(format!("campaign {}", campaign_id)))?;
        if campaign.status == CampaignStatus::Archived {
            return Err(AppError::Policy(
                "archived campaigns are read-only".to_string(),
            ));
        }

        let json_value = value
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);

        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let existing: Option<(String, String)> = conn
            .query_row(
                "SELECT id, data FROM campaign_weekly_data
                 WHERE campaign_id = ?1 AND week_ending = ?2",
                params![campaign_id, format_date(week_ending)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            Some((row_id, raw)) => {
                let mut data = match serde_json::from_str::<serde_json::Value>(&raw) {
                    Ok(serde_json::Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                };
                data.insert(metric_key.to_string(), json_value);
                conn.execute(
                    "UPDATE campaign_weekly_data SET data = ?1, updated_at = ?2 WHERE id = ?3",
                    params![
                        serde_json::to_string(&serde_json::Value::Object(data))?,
                        now,
                        row_id
                    ],
                )?;
            }
            None => {
                if json_value.is_null() {
                    return Ok(());
                }
                let data = serde_json::json!({ metric_key: json_value });
                conn.execute(
                    "INSERT INTO campaign_weekly_data (id, campaign_id, week_ending, data, entered_by, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        campaign_id,
                        format_date(week_ending),
                        serde_json::to_string(&data)?,
                        entered_by,
                        now,
                    ],
                )?;
            }
        }
        Ok(())
    }

    // ─── Stored procedures ──────────────────────────────────────────────────
    //
    // Each runs in one transaction and returns a new identifier or a
    // descriptive error; nothing is applied on failure.

    pub fn start_new_week(
        &self,
        user_id: &str,
        group_id: &str,
        week_date: NaiveDate,
    ) -> AppResult<String> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT id FROM focus_snapshots
                 WHERE user_id = ?1 AND group_id = ?2 AND is_current = 1",
                params![user_id, group_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(previous_id) = &previous {
            tx.execute(
                "UPDATE focus_snapshots SET is_current = 0 WHERE id = ?1",
                [previous_id],
            )?;
        }

        let snapshot_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO focus_snapshots (id, user_id, group_id, week_date, is_current, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![snapshot_id, user_id, group_id, format_date(week_date), now],
        )?;

        if let Some(previous_id) = &previous {
            let items: Vec<(String, Option<f64>, Option<String>, Option<String>, i64)> = {
                let mut stmt = tx.prepare(
                    "SELECT company_subject, prospect_value, pipeline_status, weekly_action, sort_order
                     FROM focus_items WHERE snapshot_id = ?1 ORDER BY sort_order ASC",
                )?;
                let rows = stmt
                    .query_map([previous_id], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };
            for (subject, value, status, action, sort_order) in items {
                tx.execute(
                    "INSERT INTO focus_items (id, snapshot_id, company_subject, prospect_value, pipeline_status, weekly_action, sort_order, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        Uuid::new_v4().to_string(),
                        snapshot_id,
                        subject,
                        value,
                        status,
                        action,
                        sort_order,
                        now,
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(snapshot_id)
    }

    pub fn roll_forward_rock(&self, rock_id: &str, new_quarter_id: &str) -> AppResult<String> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let rock: Option<(String, String, String)> = tx
            .query_row(
                "SELECT title, owner_id, group_id FROM rocks WHERE id = ?1",
                [rock_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((title, owner_id, group_id)) = rock else {
            return Err(AppError::Procedure(format!("rock {} not found", rock_id)));
        };

        let quarter_exists: i64 = tx.query_row(
            "SELECT COUNT(1) FROM quarters WHERE id = ?1",
            [new_quarter_id],
            |row| row.get(0),
        )?;
        if quarter_exists == 0 {
            return Err(AppError::Procedure(format!(
                "target quarter {} does not exist",
                new_quarter_id
            )));
        }

        let new_rock_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO rocks (id, title, owner_id, group_id, quarter_id, status, rolled_from_rock_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'on_track', ?6, ?7, ?7)",
            params![new_rock_id, title, owner_id, group_id, new_quarter_id, rock_id, now],
        )?;

        let milestones: Vec<(String, Option<String>, i64)> = {
            let mut stmt = tx.prepare(
                "SELECT title, due_date, sort_order FROM milestones
                 WHERE rock_id = ?1 ORDER BY sort_order ASC",
            )?;
            let rows = stmt
                .query_map([rock_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        for (milestone_title, due_date, sort_order) in milestones {
            tx.execute(
                "INSERT INTO milestones (id, rock_id, title, due_date, status, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    new_rock_id,
                    milestone_title,
                    due_date,
                    sort_order,
                    now,
                ],
            )?;
        }

        tx.execute(
            "UPDATE rocks SET status = 'rolled', updated_at = ?1 WHERE id = ?2",
            params![now, rock_id],
        )?;

        tx.commit()?;
        Ok(new_rock_id)
    }

    pub fn promote_rock_idea(
        &self,
        idea_id: &str,
        quarter_id: &str,
        owner_id: &str,
    ) -> AppResult<String> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let idea: Option<(String, String, Option<String>)> = tx
            .query_row(
                "SELECT group_id, description, promoted_to_rock_id FROM rock_ideas WHERE id = ?1",
                [idea_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((group_id, description, promoted)) = idea else {
            return Err(AppError::Procedure(format!("rock idea {} not found", idea_id)));
        };
        if promoted.is_some() {
            return Err(AppError::Procedure(format!(
                "rock idea {} was already promoted",
                idea_id
            )));
        }

        let quarter_exists: i64 = tx.query_row(
            "SELECT COUNT(1) FROM quarters WHERE id = ?1",
            [quarter_id],
            |row| row.get(0),
        )?;
        if quarter_exists == 0 {
            return Err(AppError::Procedure(format!(
                "target quarter {} does not exist",
                quarter_id
            )));
        }

        let rock_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO rocks (id, title, owner_id, group_id, quarter_id, status, rolled_from_rock_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'on_track', NULL, ?6, ?6)",
            params![rock_id, description, owner_id, group_id, quarter_id, now],
        )?;
        tx.execute(
            "UPDATE rock_ideas SET promoted_to_rock_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![rock_id, now, idea_id],
        )?;

        tx.commit()?;
        Ok(rock_id)
    }

    // ─── Fixtures for the procedure tables ──────────────────────────────────

    pub fn create_quarter(
        &self,
        label: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO quarters (id, label, start_date, end_date, is_current) VALUES (?1, ?2, ?3, ?4, 0)",
            params![id, label, format_date(start_date), format_date(end_date)],
        )?;
        Ok(id)
    }

    pub fn create_rock(
        &self,
        title: &str,
        owner_id: &str,
        group_id: &str,
        quarter_id: &str,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO rocks (id, title, owner_id, group_id, quarter_id, status, rolled_from_rock_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'on_track', NULL, ?6, ?6)",
            params![id, title, owner_id, group_id, quarter_id, now],
        )?;
        Ok(id)
    }

    pub fn add_milestone(
        &self,
        rock_id: &str,
        title: &str,
        due_date: Option<NaiveDate>,
        sort_order: i64,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO milestones (id, rock_id, title, due_date, status, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)",
            params![id, rock_id, title, due_date.map(format_date), sort_order, now],
        )?;
        Ok(id)
    }

    pub fn create_rock_idea(
        &self,
        group_id: &str,
        description: &str,
        suggested_owner_id: Option<&str>,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO rock_ideas (id, group_id, description, suggested_owner_id, promoted_to_rock_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
            params![id, group_id, description, suggested_owner_id, now],
        )?;
        Ok(id)
    }

    pub fn get_rock(&self, rock_id: &str) -> AppResult<Option<RockRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, owner_id, group_id, quarter_id, status, rolled_from_rock_id
             FROM rocks WHERE id = ?1",
            [rock_id],
            |row| {
                Ok(RockRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    owner_id: row.get(2)?,
                    group_id: row.get(3)?,
                    quarter_id: row.get(4)?,
                    status: row.get(5)?,
                    rolled_from_rock_id: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn list_milestones(&self, rock_id: &str) -> AppResult<Vec<RockMilestone>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, rock_id, title, due_date, status, sort_order
             FROM milestones WHERE rock_id = ?1 ORDER BY sort_order ASC",
        )?;
        let milestones = stmt
            .query_map([rock_id], |row| {
                Ok(RockMilestone {
                    id: row.get(0)?,
                    rock_id: row.get(1)?,
                    title: row.get(2)?,
                    due_date: row.get(3)?,
                    status: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(milestones)
    }

    pub fn get_rock_idea(&self, idea_id: &str) -> AppResult<Option<RockIdea>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, group_id, description, suggested_owner_id, promoted_to_rock_id
             FROM rock_ideas WHERE id = ?1",
            [idea_id],
            |row| {
                Ok(RockIdea {
                    id: row.get(0)?,
                    group_id: row.get(1)?,
                    description: row.get(2)?,
                    suggested_owner_id: row.get(3)?,
                    promoted_to_rock_id: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn current_focus_snapshot(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> AppResult<Option<FocusSnapshot>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, user_id, group_id, week_date, is_current FROM focus_snapshots
             WHERE user_id = ?1 AND group_id = ?2 AND is_current = 1",
            params![user_id, group_id],
            |row| {
                Ok(FocusSnapshot {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    group_id: row.get(2)?,
                    week_date: row.get(3)?,
                    is_current: row.get::<_, i64>(4)? != 0,
                })
            },
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn add_focus_item(
        &self,
        snapshot_id: &str,
        company_subject: &str,
        prospect_value: Option<f64>,
        sort_order: i64,
    ) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO focus_items (id, snapshot_id, company_subject, prospect_value, pipeline_status, weekly_action, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?6)",
            params![id, snapshot_id, company_subject, prospect_value, sort_order, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    pub fn focus_item_count(&self, snapshot_id: &str) -> AppResult<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM focus_items WHERE snapshot_id = ?1",
            [snapshot_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn placeholders(count: usize) -> String {
    placeholders_from(count, 1)
}

fn placeholders_from(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|index| format!("?{}", index))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_measure_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScorecardMeasure> {
    let is_calculated: i64 = row.get(6)?;
    let formula_raw: Option<String> = row.get(7)?;
    let kind = if is_calculated != 0 {
        MeasureKind::Calculated {
            formula: formula_raw.and_then(|raw| serde_json::from_str(&raw).ok()),
        }
    } else {
        MeasureKind::Accumulated
    };
    Ok(ScorecardMeasure {
        id: row.get(0)?,
        section_id: row.get(1)?,
        name: row.get(2)?,
        data_type: DataType::parse(&row.get::<_, String>(3)?),
        rollup_type: RollupType::parse(&row.get::<_, String>(4)?),
        owner_user_id: row.get(5)?,
        kind,
        display_order: row.get(8)?,
    })
}

fn parse_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScorecardEntry> {
    Ok(ScorecardEntry {
        id: row.get(0)?,
        measure_id: row.get(1)?,
        user_id: row.get(2)?,
        week_ending: row.get(3)?,
        value: row.get(4)?,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
        updated_at: parse_time(&row.get::<_, String>(6)?)?,
    })
}

fn parse_goal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScorecardGoal> {
    Ok(ScorecardGoal {
        id: row.get(0)?,
        measure_id: row.get(1)?,
        quarter: row.get(2)?,
        goal_value: row.get(3)?,
        set_by: row.get(4)?,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
        updated_at: parse_time(&row.get::<_, String>(6)?)?,
    })
}

fn parse_detail_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryDetail> {
    Ok(EntryDetail {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        line_name: row.get(2)?,
        line_value: row.get(3)?,
        notes: row.get(4)?,
        display_order: row.get(5)?,
    })
}

fn parse_campaign_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        status: CampaignStatus::parse(&row.get::<_, String>(3)?),
        leads_count_total: row.get(4)?,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
        archived_at: row
            .get::<_, Option<String>>(6)?
            .map(|raw| parse_time(&raw))
            .transpose()?,
    })
}

fn parse_metric_definition_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<CampaignMetricDefinition> {
    Ok(CampaignMetricDefinition {
        id: row.get(0)?,
        group_id: row.get(1)?,
        metric_key: row.get(2)?,
        label: row.get(3)?,
        data_type: DataType::parse(&row.get::<_, String>(4)?),
        is_required: row.get::<_, i64>(5)? != 0,
        display_order: row.get(6)?,
    })
}

fn parse_week_data_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CampaignWeekData> {
    Ok(CampaignWeekData {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        week_ending: row.get(2)?,
        data: serde_json::from_str::<serde_json::Value>(&row.get::<_, String>(3)?)
            .unwrap_or(serde_json::json!({})),
        entered_by: row.get(4)?,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
        updated_at: parse_time(&row.get::<_, String>(6)?)?,
    })
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}
