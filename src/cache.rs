//! Explicit fetch cache replacing ambient string-keyed client caching:
//! typed keys derived from (resource kind, scoping ids, week set), with
//! invalidation events subscribers can watch to refetch. Owned by the
//! composition root and passed where it is needed.

use crate::calendar::format_date;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Template { group_id: String },
    Entries { group_id: String, week_endings: Vec<NaiveDate> },
    Goals { group_id: String, quarter: String },
    EntryDetails { entry_id: String },
    Settings { group_id: String },
    Campaigns { group_id: String },
    CampaignMetrics { group_id: String },
    CampaignData { campaign_id: String, week_endings: Vec<NaiveDate> },
}

impl CacheKey {
    pub fn as_string(&self) -> String {
        match self {
            Self::Template { group_id } => format!("scorecard-template-{group_id}"),
            Self::Entries { group_id, week_endings } => {
                format!("scorecard-entries-{group_id}-{}", join_weeks(week_endings))
            }
            Self::Goals { group_id, quarter } => {
                format!("scorecard-goals-{group_id}-{quarter}")
            }
            Self::EntryDetails { entry_id } => format!("entry-details-{entry_id}"),
            Self::Settings { group_id } => format!("scorecard-settings-{group_id}"),
            Self::Campaigns { group_id } => format!("campaigns-{group_id}"),
            Self::CampaignMetrics { group_id } => format!("campaign-metrics-{group_id}"),
            Self::CampaignData { campaign_id, week_endings } => {
                format!("campaign-data-{campaign_id}-{}", join_weeks(week_endings))
            }
        }
    }
}

fn join_weeks(week_endings: &[NaiveDate]) -> String {
    week_endings
        .iter()
        .map(|week| format_date(*week))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone)]
struct CachedResource {
    value: serde_json::Value,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CacheHub {
    resources: Mutex<HashMap<CacheKey, CachedResource>>,
    events: broadcast::Sender<String>,
}

impl CacheHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            resources: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let resources = self.resources.lock().ok()?;
        resources.get(key).map(|resource| resource.value.clone())
    }

    pub fn put(&self, key: CacheKey, value: serde_json::Value) {
        if let Ok(mut resources) = self.resources.lock() {
            resources.insert(
                key,
                CachedResource {
                    value,
                    fetched_at: Utc::now(),
                },
            );
        }
    }

    /// Drop the cached value and tell subscribers the key changed so
    /// open views refetch and converge on server state.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Ok(mut resources) = self.resources.lock() {
            resources.remove(key);
        }
        let _ = self.events.send(key.as_string());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    /// Keys whose cached value is older than `max_age`, for the
    /// periodic refresh loop.
    pub fn stale_keys(&self, max_age: Duration) -> Vec<CacheKey> {
        let cutoff = Utc::now() - max_age;
        match self.resources.lock() {
            Ok(resources) => resources
                .iter()
                .filter(|(_, resource)| resource.fetched_at < cutoff)
                .map(|(key, _)| key.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for CacheHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn weeks() -> Vec<NaiveDate> {
        vec![
            NaiveDate::from_ymd_opt(2026, 1, 2).expect("valid date"),
            NaiveDate::from_ymd_opt(2026, 1, 9).expect("valid date"),
        ]
    }

    #[test]
    fn keys_encode_scope_and_week_set() {
        let key = CacheKey::Entries {
            group_id: "g1".to_string(),
            week_endings: weeks(),
        };
        assert_eq!(key.as_string(), "scorecard-entries-g1-2026-01-02,2026-01-09");
    }

    #[test]
    fn put_get_invalidate_round_trip() {
        let cache = CacheHub::new();
        let key = CacheKey::Template {
            group_id: "g1".to_string(),
        };
        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), serde_json::json!({"name": "Weekly"}));
        assert_eq!(
            cache.get(&key),
            Some(serde_json::json!({"name": "Weekly"}))
        );

        cache.invalidate(&key);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn invalidation_notifies_subscribers() {
        let cache = CacheHub::new();
        let key = CacheKey::Goals {
            group_id: "g1".to_string(),
            quarter: "2026-Q1".to_string(),
        };
        let mut events = cache.subscribe();
        cache.invalidate(&key);
        assert_eq!(events.try_recv().expect("event"), "scorecard-goals-g1-2026-Q1");
    }

    #[test]
    fn stale_keys_respect_the_age_cutoff() {
        let cache = CacheHub::new();
        let key = CacheKey::Campaigns {
            group_id: "g1".to_string(),
        };
        cache.put(key.clone(), serde_json::json!([]));
        assert!(cache.stale_keys(Duration::seconds(60)).is_empty());
        assert_eq!(cache.stale_keys(Duration::seconds(-1)), vec![key]);
    }
}
