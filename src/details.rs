//! Line-item reconciliation: an entry's itemized detail rows against
//! its recorded aggregate value. A mismatch is a warning for the user,
//! never auto-corrected.

use crate::models::EntryDetail;
use serde::{Deserialize, Serialize};

/// Discrepancies under a cent are rounding noise, not mismatches.
pub const MISMATCH_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub line_item_sum: f64,
    pub mismatch: bool,
}

pub fn reconcile(entry_value: Option<f64>, details: &[EntryDetail]) -> Reconciliation {
    let line_item_sum: f64 = details
        .iter()
        .filter_map(|detail| detail.line_value)
        .sum();
    let mismatch = match entry_value {
        Some(value) => {
            !details.is_empty() && (line_item_sum - value).abs() > MISMATCH_TOLERANCE
        }
        None => false,
    };
    Reconciliation {
        line_item_sum,
        mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(value: Option<f64>, order: i64) -> EntryDetail {
        EntryDetail {
            id: format!("d{order}"),
            entry_id: "entry-1".to_string(),
            line_name: format!("Line {order}"),
            line_value: value,
            notes: None,
            display_order: order,
        }
    }

    #[test]
    fn exact_sum_is_not_a_mismatch() {
        let details = [detail(Some(60.0), 1), detail(Some(40.0), 2)];
        let result = reconcile(Some(100.0), &details);
        assert_eq!(result.line_item_sum, 100.0);
        assert!(!result.mismatch);
    }

    #[test]
    fn sub_cent_drift_is_tolerated() {
        let details = [detail(Some(100.005), 1)];
        assert!(!reconcile(Some(100.0), &details).mismatch);
    }

    #[test]
    fn real_drift_is_flagged() {
        let details = [detail(Some(105.0), 1)];
        assert!(reconcile(Some(100.0), &details).mismatch);
    }

    #[test]
    fn value_less_lines_count_as_zero() {
        let details = [detail(Some(100.0), 1), detail(None, 2)];
        assert!(!reconcile(Some(100.0), &details).mismatch);
    }

    #[test]
    fn no_details_means_no_mismatch() {
        assert!(!reconcile(Some(100.0), &[]).mismatch);
        assert!(!reconcile(None, &[]).mismatch);
    }
}
