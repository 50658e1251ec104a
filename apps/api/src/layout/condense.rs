//! Condensation advice: which roles to cut back toward the bullet floor on overflow.
//!
//! Advisory only: [`suggest_condensation`] never mutates its input. The pipeline
//! applies suggestions with [`apply_condensation`] and re-simulates.
//!
//! Roles are condensed oldest-first. Recency comes from `Role::end_date` when any
//! role carries one (`None` = current role, treated as newest); list position
//! (roles arrive newest-first) breaks ties and is the whole ordering when no dates exist.

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::layout::config::LayoutConfig;
use crate::layout::types::{saturating_sum, Role};

/// A proposal to trim one role to its cheapest bullets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensationSuggestion {
    pub role_id: String,
    pub current_count: usize,
    pub suggested_count: usize,
    /// Indices into the role's current bullets to keep, ascending.
    pub keep_indices: Vec<usize>,
    pub lines_saved: u32,
}

/// Suggests per-role bullet reductions until `target_lines` would be reclaimed.
pub fn suggest_condensation(
    roles: &[Role],
    target_lines: u32,
    config: &LayoutConfig,
) -> Vec<CondensationSuggestion> {
    let floor = config.min_bullets_per_role;
    let mut suggestions = Vec::new();
    let mut saved = 0u32;

    for idx in oldest_first(roles) {
        if saved >= target_lines {
            break;
        }
        let role = &roles[idx];
        if role.bullets.len() <= floor {
            continue;
        }

        let mut by_cost: Vec<usize> = (0..role.bullets.len()).collect();
        by_cost.sort_by_key(|&i| (role.bullets[i].line_cost, i));
        let mut keep_indices: Vec<usize> = by_cost.into_iter().take(floor).collect();
        keep_indices.sort_unstable();

        let kept_lines =
            saturating_sum(keep_indices.iter().map(|&i| role.bullets[i].line_cost));
        let lines_saved = role.bullet_lines().saturating_sub(kept_lines);
        saved = saved.saturating_add(lines_saved);

        suggestions.push(CondensationSuggestion {
            role_id: role.role_id.clone(),
            current_count: role.bullets.len(),
            suggested_count: keep_indices.len(),
            keep_indices,
            lines_saved,
        });
    }

    suggestions
}

/// Applies suggestions in place, keeping each role's remaining bullets in order.
///
/// Suggestions naming an unknown role are ignored. Returns lines reclaimed.
pub fn apply_condensation(roles: &mut [Role], suggestions: &[CondensationSuggestion]) -> u32 {
    let mut reclaimed = 0u32;
    for suggestion in suggestions {
        let Some(role) = roles.iter_mut().find(|r| r.role_id == suggestion.role_id) else {
            continue;
        };
        let before = role.bullet_lines();
        let kept = suggestion
            .keep_indices
            .iter()
            .filter_map(|&i| role.bullets.get(i).cloned())
            .collect();
        role.bullets = kept;
        reclaimed = reclaimed.saturating_add(before.saturating_sub(role.bullet_lines()));
    }
    reclaimed
}

/// Role indices ordered oldest to newest.
pub(crate) fn oldest_first(roles: &[Role]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..roles.len()).rev().collect();
    if roles.iter().any(|r| r.end_date.is_some()) {
        // Stable: equal dates keep the reversed list order.
        order.sort_by_key(|&i| roles[i].end_date.unwrap_or(NaiveDate::MAX));
    }
    order
}

/// Role indices ordered newest to oldest.
pub(crate) fn newest_first(roles: &[Role]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..roles.len()).collect();
    if roles.iter().any(|r| r.end_date.is_some()) {
        order.sort_by_key(|&i| Reverse(roles[i].end_date.unwrap_or(NaiveDate::MAX)));
    }
    order
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
