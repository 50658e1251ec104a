//! Layout pipeline: one deterministic pass from scored candidates to a layout decision.
//!
//! Flow: estimate sections → allocate each role → simulate →
//!       (overflow) condense → simulate → (still overflow) compress → simulate.
//!
//! Everything here is synchronous and CPU-bound. The HTTP handler runs it via
//! `tokio::task::spawn_blocking`.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::layout::allocator::{allocate_bullets, AllocationStrategy};
use crate::layout::compressor::{compress_roles_to_fit, CompressionReport};
use crate::layout::condense::{
    apply_condensation, newest_first, suggest_condensation, CondensationSuggestion,
};
use crate::layout::config::LayoutConfig;
use crate::layout::estimator::LineEstimator;
use crate::layout::page_split::simulate_layout;
use crate::layout::types::{Bullet, LayoutError, ResumeLayout, Role};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// A scored bullet candidate as supplied by the content stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateInput {
    pub text: String,
    pub score: f32,
    /// Caller-measured line cost. Estimated from `text` when absent.
    #[serde(default)]
    pub line_cost: Option<u32>,
}

/// One job entry with its candidate bullets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInput {
    pub role_id: String,
    /// Header cost in lines. Defaults to `job_header_lines`.
    #[serde(default)]
    pub header_lines: Option<u32>,
    /// `None` means a current role.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Per-role allocation budget for bullets. Defaults to whatever the document has left.
    #[serde(default)]
    pub line_budget: Option<u32>,
    pub candidates: Vec<CandidateInput>,
}

/// Full input for one layout plan. Roles are expected newest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub roles: Vec<RoleInput>,
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Per-role record of how the allocator chose its bullets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAllocation {
    pub role_id: String,
    pub budget: u32,
    pub candidate_count: usize,
    pub selected_count: usize,
    pub strategy: AllocationStrategy,
}

/// The final plan: layout decision plus everything that was done to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPlan {
    pub layout: ResumeLayout,
    /// Roles in placement order with their final bullets.
    pub roles: Vec<Role>,
    pub summary_lines: u32,
    pub skills_lines: u32,
    pub allocations: Vec<RoleAllocation>,
    pub condensation: Vec<CondensationSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionReport>,
    /// Simulations run, including the first.
    pub simulation_passes: u8,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Plans the two-page layout for one request.
///
/// Errors only on malformed input (blank or duplicate role ids). Every layout
/// problem is reported through `layout.violations` instead.
pub fn plan_layout(
    request: &LayoutRequest,
    config: &LayoutConfig,
) -> Result<LayoutPlan, LayoutError> {
    validate_request(request)?;

    let estimator = LineEstimator::new(config);
    let summary_lines = estimator.summary_lines(&request.summary);
    let skills_lines = estimator.skills_lines(&request.skills);

    let fixed_lines: u32 = [summary_lines, skills_lines]
        .into_iter()
        .filter(|&lines| lines > 0)
        .map(|lines| lines.saturating_add(config.section_header_lines))
        .fold(0, u32::saturating_add);
    let document_budget = config.page1_budget.saturating_add(config.page2_usable());
    let mut remaining = document_budget.saturating_sub(fixed_lines);

    let mut allocation_violations = Vec::new();
    let mut allocations = Vec::with_capacity(request.roles.len());
    let mut roles = Vec::with_capacity(request.roles.len());

    for idx in newest_first_inputs(&request.roles) {
        let input = &request.roles[idx];
        let header_lines = input.header_lines.unwrap_or(config.job_header_lines);
        let budget = input
            .line_budget
            .unwrap_or_else(|| remaining.saturating_sub(header_lines));

        let candidates: Vec<Bullet> = input
            .candidates
            .iter()
            .map(|c| match c.line_cost {
                Some(cost) => Bullet::with_line_cost(c.text.clone(), c.score, cost),
                None => Bullet::new(c.text.clone(), c.score, config),
            })
            .collect();

        let allocation = allocate_bullets(
            &candidates,
            budget,
            config.min_bullets_per_role,
            config.max_bullets_per_role,
        );

        allocation_violations.extend(
            allocation
                .violations
                .iter()
                .map(|v| format!("role '{}': {v}", input.role_id)),
        );
        allocations.push(RoleAllocation {
            role_id: input.role_id.clone(),
            budget,
            candidate_count: candidates.len(),
            selected_count: allocation.selected.len(),
            strategy: allocation.strategy,
        });

        remaining = remaining.saturating_sub(header_lines.saturating_add(allocation.lines_used));
        roles.push(Role {
            role_id: input.role_id.clone(),
            header_lines,
            end_date: input.end_date,
            bullets: allocation.selected,
        });
    }

    let mut layout = simulate_layout(summary_lines, skills_lines, &roles, config);
    let mut simulation_passes = 1u8;
    let mut condensation = Vec::new();
    let mut compression = None;

    let overflow = layout.overflow_lines();
    if overflow > 0 {
        condensation = suggest_condensation(&roles, overflow, config);
        let reclaimed = apply_condensation(&mut roles, &condensation);
        debug!(
            overflow,
            reclaimed,
            roles_condensed = condensation.len(),
            "Applied condensation"
        );
        layout = simulate_layout(summary_lines, skills_lines, &roles, config);
        simulation_passes += 1;
    }

    let overflow = layout.overflow_lines();
    if overflow > 0 && config.compression_enabled {
        let report =
            compress_roles_to_fit(&mut roles, overflow, config.compression_preserve_first, config);
        debug!(
            overflow,
            saved = report.lines_saved,
            rewritten = report.changes.len(),
            "Applied compression"
        );
        layout = simulate_layout(summary_lines, skills_lines, &roles, config);
        simulation_passes += 1;
        compression = Some(report);
    }

    let layout = layout.with_violations(allocation_violations);

    if layout.fits_in_budget {
        info!(
            total_lines = layout.total_lines,
            passes = simulation_passes,
            "Layout fits in budget"
        );
    } else {
        warn!(
            violations = layout.violations.len(),
            overflow = layout.overflow_lines(),
            passes = simulation_passes,
            "Layout returned with violations"
        );
    }

    Ok(LayoutPlan {
        layout,
        roles,
        summary_lines,
        skills_lines,
        allocations,
        condensation,
        compression,
        simulation_passes,
    })
}

fn validate_request(request: &LayoutRequest) -> Result<(), LayoutError> {
    let mut seen = HashSet::new();
    for role in &request.roles {
        if role.role_id.trim().is_empty() {
            return Err(LayoutError::MissingField("role_id".to_string()));
        }
        if !seen.insert(role.role_id.as_str()) {
            return Err(LayoutError::DuplicateRole(role.role_id.clone()));
        }
    }
    Ok(())
}

/// Newest-first order for the inputs, honoring `end_date` when present.
fn newest_first_inputs(inputs: &[RoleInput]) -> Vec<usize> {
    let probes: Vec<Role> = inputs
        .iter()
        .map(|r| Role {
            role_id: r.role_id.clone(),
            header_lines: 0,
            end_date: r.end_date,
            bullets: Vec::new(),
        })
        .collect();
    newest_first(&probes)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candidate(text: &str, score: f32, line_cost: Option<u32>) -> CandidateInput {
        CandidateInput {
            text: text.to_string(),
            score,
            line_cost,
        }
    }

    fn make_role(id: &str, costs: &[u32]) -> RoleInput {
        RoleInput {
            role_id: id.to_string(),
            header_lines: None,
            end_date: None,
            line_budget: None,
            candidates: costs
                .iter()
                .enumerate()
                .map(|(i, &c)| make_candidate(&format!("{id} bullet {i}"), 0.5, Some(c)))
                .collect(),
        }
    }

    #[test]
    fn test_small_request_fits_on_page1() {
        let config = LayoutConfig::default();
        let request = LayoutRequest {
            summary: "Backend engineer focused on storage systems.".to_string(),
            skills: vec!["Rust".to_string(), "Postgres".to_string()],
            roles: vec![make_role("acme", &[1, 1, 2])],
        };
        let plan = plan_layout(&request, &config).unwrap();
        assert!(plan.layout.fits_in_budget, "{:?}", plan.layout.violations);
        assert_eq!(plan.summary_lines, 1);
        assert_eq!(plan.skills_lines, 1);
        // (1 + 1) + (1 + 1) + (2 + 4)
        assert_eq!(plan.layout.page1.lines_used, 10);
        assert_eq!(plan.simulation_passes, 1);
        assert!(plan.condensation.is_empty());
        assert!(plan.compression.is_none());
    }

    #[test]
    fn test_blank_role_id_rejected() {
        let config = LayoutConfig::default();
        let request = LayoutRequest {
            roles: vec![make_role("  ", &[1])],
            ..LayoutRequest::default()
        };
        assert_eq!(
            plan_layout(&request, &config).unwrap_err(),
            LayoutError::MissingField("role_id".to_string())
        );
    }

    #[test]
    fn test_duplicate_role_id_rejected() {
        let config = LayoutConfig::default();
        let request = LayoutRequest {
            roles: vec![make_role("acme", &[1]), make_role("acme", &[1])],
            ..LayoutRequest::default()
        };
        assert!(matches!(
            plan_layout(&request, &config),
            Err(LayoutError::DuplicateRole(_))
        ));
    }

    #[test]
    fn test_overflow_triggers_condensation() {
        // Explicit per-role budgets let the allocator over-commit the document.
        let config = LayoutConfig {
            page1_budget: 10,
            page2_budget: 10,
            compression_enabled: false,
            ..LayoutConfig::default()
        };
        let mut newer = make_role("newer", &[1, 1, 1, 1]);
        newer.line_budget = Some(4);
        let mut older = make_role("older", &[1, 1, 3, 3]);
        older.line_budget = Some(8);
        let request = LayoutRequest {
            roles: vec![newer, older],
            ..LayoutRequest::default()
        };

        let plan = plan_layout(&request, &config).unwrap();
        // newer: 2 + 4 = 6 on page 1. older can start in the 4 left (2 + 1 + 1)
        // but needs 10 whole, so it lands on page 2, which it fills exactly.
        assert!(plan.condensation.is_empty());
        assert!(plan.layout.fits_in_budget, "{:?}", plan.layout.violations);

        let config = LayoutConfig {
            page2_budget: 8,
            ..config
        };
        let plan = plan_layout(&request, &config).unwrap();
        assert_eq!(plan.condensation.len(), 1);
        assert_eq!(plan.condensation[0].role_id, "older");
        assert_eq!(plan.roles[1].bullets.len(), 2);
        assert_eq!(plan.simulation_passes, 2);
        // Condensed to 2 + 1 + 1, "older" now fits the rest of page 1.
        assert_eq!(plan.layout.page_of("older"), Some(1));
        assert!(plan.layout.fits_in_budget, "{:?}", plan.layout.violations);
    }

    #[test]
    fn test_compression_runs_when_condensation_is_not_enough() {
        let config = LayoutConfig {
            page1_budget: 6,
            page2_budget: 6,
            chars_per_line: 20,
            min_bullets_per_role: 2,
            compression_preserve_first: 0,
            ..LayoutConfig::default()
        };
        let wordy = "Utilized Go in order to build a wide variety of internal services";
        let request = LayoutRequest {
            roles: vec![
                RoleInput {
                    line_budget: Some(12),
                    candidates: vec![
                        make_candidate(wordy, 0.9, None),
                        make_candidate(wordy, 0.8, None),
                    ],
                    ..make_role("only", &[])
                },
            ],
            ..LayoutRequest::default()
        };
        let plan = plan_layout(&request, &config).unwrap();
        // Each wordy bullet costs 5; role = 2 + 10 = 12 on page 2 (6 usable).
        let report = plan.compression.expect("compression should have run");
        assert_eq!(report.changes.len(), 2);
        assert!(plan.roles[0].bullets.iter().all(|b| b.was_compressed));
        assert_eq!(plan.simulation_passes, 3);
        assert!(!plan.layout.fits_in_budget);
    }

    #[test]
    fn test_end_dates_reorder_roles() {
        let config = LayoutConfig::default();
        let mut old = make_role("old", &[1, 1]);
        old.end_date = NaiveDate::from_ymd_opt(2015, 1, 1);
        let current = make_role("current", &[1, 1]);
        let request = LayoutRequest {
            roles: vec![old, current],
            ..LayoutRequest::default()
        };
        let plan = plan_layout(&request, &config).unwrap();
        let ids: Vec<&str> = plan.roles.iter().map(|r| r.role_id.as_str()).collect();
        assert_eq!(ids, vec!["current", "old"]);
    }

    #[test]
    fn test_allocation_violations_surface_in_layout() {
        let config = LayoutConfig::default();
        let request = LayoutRequest {
            roles: vec![make_role("acme", &[0, 1, 1])],
            ..LayoutRequest::default()
        };
        let plan = plan_layout(&request, &config).unwrap();
        assert!(!plan.layout.fits_in_budget);
        assert!(plan.layout.violations[0].starts_with("role 'acme': dropped bullet 0"));
    }

    #[test]
    fn test_huge_caller_costs_reported_not_panicking() {
        let config = LayoutConfig::default();
        let mut giant = make_role("giant", &[1, u32::MAX]);
        giant.header_lines = Some(u32::MAX);
        let mut greedy = make_role("greedy", &[1, u32::MAX, 1]);
        greedy.line_budget = Some(u32::MAX);
        let request = LayoutRequest {
            roles: vec![make_role("acme", &[1, 1]), greedy, giant],
            ..LayoutRequest::default()
        };

        let plan = plan_layout(&request, &config).unwrap();
        assert_eq!(plan.roles[1].bullets.len(), 2);
        assert_eq!(plan.layout.page_of("giant"), Some(2));
        assert!(!plan.layout.fits_in_budget);
        assert!(plan.layout.overflow_lines() > 0);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let config = LayoutConfig {
            page1_budget: 12,
            page2_budget: 12,
            ..LayoutConfig::default()
        };
        let request = LayoutRequest {
            summary: "Engineer. ".repeat(12),
            skills: vec!["Rust".to_string(); 5],
            roles: vec![
                make_role("a", &[2, 1, 3, 1, 2]),
                make_role("b", &[1, 1, 1, 1]),
                make_role("c", &[3, 3]),
            ],
        };
        let first = serde_json::to_string(&plan_layout(&request, &config).unwrap()).unwrap();
        let second = serde_json::to_string(&plan_layout(&request, &config).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
