//! Core layout data types shared by the allocator, simulator, and shrink stages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::config::LayoutConfig;
use crate::layout::estimator::LineEstimator;

/// Input errors that indicate a caller bug rather than a layout problem.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("duplicate role id: {0}")]
    DuplicateRole(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Bullets and roles
// ────────────────────────────────────────────────────────────────────────────

/// A scored achievement bullet.
///
/// `line_cost` is derived from `text` through the [`LineEstimator`] and must be
/// refreshed whenever the text changes (see [`Bullet::set_text`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub text: String,
    /// Relevance score in [0, 1], supplied by the scoring stage.
    pub score: f32,
    pub line_cost: u32,
    /// True once the compressor has rewritten `text`.
    #[serde(default)]
    pub was_compressed: bool,
    /// Text as it was before the first compression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
}

impl Bullet {
    /// Creates a bullet whose line cost is estimated from its text.
    pub fn new(text: impl Into<String>, score: f32, config: &LayoutConfig) -> Self {
        let text = text.into();
        let line_cost = LineEstimator::new(config).bullet_lines(&text);
        Self::with_line_cost(text, score, line_cost)
    }

    /// Creates a bullet with a caller-measured line cost.
    pub fn with_line_cost(text: impl Into<String>, score: f32, line_cost: u32) -> Self {
        Self {
            text: text.into(),
            score,
            line_cost,
            was_compressed: false,
            original_text: None,
        }
    }

    /// Score per line spent.
    pub fn value_density(&self) -> f32 {
        if self.line_cost == 0 {
            return 0.0;
        }
        self.score / self.line_cost as f32
    }

    /// Replaces the text with a compressed rewrite and re-estimates the line cost.
    pub fn set_text(&mut self, text: String, config: &LayoutConfig) {
        if self.original_text.is_none() {
            self.original_text = Some(self.text.clone());
        }
        self.line_cost = LineEstimator::new(config).bullet_lines(&text);
        self.text = text;
        self.was_compressed = true;
    }
}

/// A job entry with its currently selected bullets.
///
/// Roles are supplied newest-first. `end_date` is an optional recency signal
/// (`None` = current role) that the condensation stage prefers over list position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub role_id: String,
    pub header_lines: u32,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub bullets: Vec<Bullet>,
}

impl Role {
    /// Summed bullet cost, saturating at `u32::MAX`.
    pub fn bullet_lines(&self) -> u32 {
        saturating_sum(self.bullets.iter().map(|b| b.line_cost))
    }

    /// Header plus every bullet.
    pub fn total_lines(&self) -> u32 {
        self.header_lines.saturating_add(self.bullet_lines())
    }

    /// Summed cost of the `n` cheapest bullets (all bullets if fewer than `n`).
    pub fn cheapest_lines(&self, n: usize) -> u32 {
        let mut costs: Vec<u32> = self.bullets.iter().map(|b| b.line_cost).collect();
        costs.sort_unstable();
        saturating_sum(costs.into_iter().take(n))
    }
}

/// Sums caller-supplied line counts without wrapping.
pub(crate) fn saturating_sum(lines: impl IntoIterator<Item = u32>) -> u32 {
    lines.into_iter().fold(0, u32::saturating_add)
}

// ────────────────────────────────────────────────────────────────────────────
// Simulation output
// ────────────────────────────────────────────────────────────────────────────

/// Where one role landed and what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub role_id: String,
    pub header_lines: u32,
    pub bullet_count: usize,
    pub lines: u32,
}

/// One simulated page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: u8,
    pub lines_used: u32,
    pub lines_available: u32,
    /// Summary and skills sections, headers included. Always zero on page 2.
    pub section_lines: u32,
    pub roles: Vec<RoleSummary>,
    pub violations: Vec<String>,
}

impl PageLayout {
    pub fn new(page_number: u8, lines_available: u32) -> Self {
        Self {
            page_number,
            lines_used: 0,
            lines_available,
            section_lines: 0,
            roles: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.lines_available.saturating_sub(self.lines_used)
    }

    pub fn overflow_lines(&self) -> u32 {
        self.lines_used.saturating_sub(self.lines_available)
    }
}

/// The full two-page layout decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeLayout {
    pub page1: PageLayout,
    pub page2: PageLayout,
    pub total_lines: u32,
    /// True iff `violations` is empty.
    pub fits_in_budget: bool,
    pub violations: Vec<String>,
}

impl ResumeLayout {
    /// Assembles the layout from both pages plus document-level violations.
    pub fn from_pages(page1: PageLayout, page2: PageLayout, extra: Vec<String>) -> Self {
        let violations: Vec<String> = extra
            .into_iter()
            .chain(page1.violations.iter().cloned())
            .chain(page2.violations.iter().cloned())
            .collect();
        Self {
            total_lines: page1.lines_used.saturating_add(page2.lines_used),
            fits_in_budget: violations.is_empty(),
            page1,
            page2,
            violations,
        }
    }

    /// Lines over budget across both pages.
    pub fn overflow_lines(&self) -> u32 {
        self.page1
            .overflow_lines()
            .saturating_add(self.page2.overflow_lines())
    }

    /// Prepends violations raised before simulation (e.g. by the allocator).
    pub fn with_violations(mut self, earlier: Vec<String>) -> Self {
        if earlier.is_empty() {
            return self;
        }
        let mut violations = earlier;
        violations.append(&mut self.violations);
        self.violations = violations;
        self.fits_in_budget = false;
        self
    }

    /// Page number (1 or 2) that holds the given role.
    pub fn page_of(&self, role_id: &str) -> Option<u8> {
        if self.page1.roles.iter().any(|r| r.role_id == role_id) {
            Some(1)
        } else if self.page2.roles.iter().any(|r| r.role_id == role_id) {
            Some(2)
        } else {
            None
        }
    }
}
