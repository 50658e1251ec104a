//! Value-density bullet allocation for a single role.
//!
//! Algorithm:
//! 1. Drop candidates that cannot be priced (zero line cost, non-finite score)
//! 2. Rank by `score / line_cost`, ties broken by input position
//! 3. Greedily accept while under `max` and within the line budget
//! 4. If the greedy pick is short of `min`, fall back to the cheapest `min`
//!    candidates when they fit. Meeting the floor beats maximizing value.
//!
//! The selection is returned in input order, not rank order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::types::{saturating_sum, Bullet};

/// Which pass produced the final selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStrategy {
    DensityGreedy,
    FloorGuarantee,
}

/// Result of allocating one role's bullets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub selected: Vec<Bullet>,
    pub lines_used: u32,
    pub strategy: AllocationStrategy,
    pub violations: Vec<String>,
}

/// Selects bullets for one role under `budget` lines and `[min, max]` count bounds.
pub fn allocate_bullets(
    candidates: &[Bullet],
    budget: u32,
    min: usize,
    max: usize,
) -> Allocation {
    let mut violations = Vec::new();

    let priced: Vec<(usize, &Bullet)> = candidates
        .iter()
        .enumerate()
        .filter(|(i, b)| {
            if b.line_cost == 0 {
                violations.push(format!(
                    "dropped bullet {i}: non-positive line cost ({})",
                    b.line_cost
                ));
                false
            } else if !b.score.is_finite() {
                violations.push(format!("dropped bullet {i}: score is not a finite number"));
                false
            } else {
                true
            }
        })
        .collect();

    let mut ranked = priced.clone();
    // sort_by is stable, so equal densities keep input order.
    ranked.sort_by(|(_, a), (_, b)| b.value_density().total_cmp(&a.value_density()));

    let mut picked: Vec<usize> = Vec::new();
    let mut used = 0u32;
    for (idx, bullet) in &ranked {
        if picked.len() >= max {
            break;
        }
        // An addition that overflows cannot fit any budget.
        if let Some(next) = used.checked_add(bullet.line_cost).filter(|&n| n <= budget) {
            used = next;
            picked.push(*idx);
        }
    }

    let mut strategy = AllocationStrategy::DensityGreedy;
    let floor = min.min(max).min(priced.len());

    if picked.len() < floor {
        let mut by_cost = priced.clone();
        by_cost.sort_by_key(|(i, b)| (b.line_cost, *i));
        let cheapest: Vec<(usize, &Bullet)> = by_cost.into_iter().take(floor).collect();
        let cheapest_cost = saturating_sum(cheapest.iter().map(|(_, b)| b.line_cost));

        if cheapest_cost <= budget {
            debug!(
                greedy = picked.len(),
                floor,
                budget,
                "Density pick below floor; switching to cheapest-first subset"
            );
            picked = cheapest.iter().map(|(i, _)| *i).collect();
            used = cheapest_cost;
            strategy = AllocationStrategy::FloorGuarantee;
        } else {
            violations.push(format!(
                "only {} of {} minimum bullets fit in {} lines",
                picked.len(),
                min,
                budget
            ));
        }
    } else if priced.len() < min {
        violations.push(format!(
            "only {} usable bullets supplied, minimum is {}",
            priced.len(),
            min
        ));
    }

    picked.sort_unstable();
    let selected = picked.iter().map(|&i| candidates[i].clone()).collect();

    Allocation {
        selected,
        lines_used: used,
        strategy,
        violations,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
