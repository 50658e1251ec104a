//! Layout configuration: the immutable parameter set every layout call reads.
//!
//! Built once per process (from env via [`LayoutConfig::from_lookup`]) and shared
//! read-only. Validation fails fast on bad budgets and inverted bullet bounds.
//! `chars_per_line` is the one exception: a zero value is repaired to the default
//! so a bad deploy setting degrades estimates instead of refusing to start.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Fallback characters-per-line when the configured value is unusable.
pub const DEFAULT_CHARS_PER_LINE: u32 = 75;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("page {page} budget must be greater than zero")]
    NonPositiveBudget { page: u8 },

    #[error("min_bullets_per_role ({min}) exceeds max_bullets_per_role ({max})")]
    BulletBoundsInverted { min: usize, max: usize },

    #[error("page 2 footer reserve ({footer}) leaves no room in a {budget}-line page")]
    FooterExceedsBudget { footer: u32, budget: u32 },

    #[error("compression_target_reduction must be within [0, 1], got {0}")]
    InvalidReduction(f32),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Named numeric parameters for the two-page layout.
///
/// All line quantities are physical text lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page1_budget: u32,
    pub page2_budget: u32,
    /// Lines reserved at the bottom of page 2 (footer, contact strip).
    pub page2_footer_lines: u32,
    pub chars_per_line: u32,
    pub job_header_lines: u32,
    pub section_header_lines: u32,
    /// Fixed overhead charged per bullet regardless of text length.
    pub bullet_chrome_lines: u32,
    pub min_bullets_per_role: usize,
    pub max_bullets_per_role: usize,
    /// Bullets that must follow a job header on the same page.
    pub min_bullets_after_job_header: usize,
    pub max_summary_lines: u32,
    pub max_skills_lines: u32,
    pub compression_enabled: bool,
    /// Fraction of bullet lines the compressor aims to reclaim when no explicit target is given.
    pub compression_target_reduction: f32,
    /// Highest-priority bullets per role that compression never touches.
    pub compression_preserve_first: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page1_budget: 50,
            page2_budget: 55,
            page2_footer_lines: 0,
            chars_per_line: DEFAULT_CHARS_PER_LINE,
            job_header_lines: 2,
            section_header_lines: 1,
            bullet_chrome_lines: 1,
            min_bullets_per_role: 2,
            max_bullets_per_role: 6,
            min_bullets_after_job_header: 2,
            max_summary_lines: 4,
            max_skills_lines: 3,
            compression_enabled: true,
            compression_target_reduction: 0.20,
            compression_preserve_first: 1,
        }
    }
}

impl LayoutConfig {
    /// Validates the config, repairing `chars_per_line` and rejecting everything else invalid.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.page1_budget == 0 {
            return Err(ConfigError::NonPositiveBudget { page: 1 });
        }
        if self.page2_budget == 0 {
            return Err(ConfigError::NonPositiveBudget { page: 2 });
        }
        if self.page2_footer_lines >= self.page2_budget {
            return Err(ConfigError::FooterExceedsBudget {
                footer: self.page2_footer_lines,
                budget: self.page2_budget,
            });
        }
        if self.min_bullets_per_role > self.max_bullets_per_role {
            return Err(ConfigError::BulletBoundsInverted {
                min: self.min_bullets_per_role,
                max: self.max_bullets_per_role,
            });
        }
        if !(0.0..=1.0).contains(&self.compression_target_reduction) {
            return Err(ConfigError::InvalidReduction(
                self.compression_target_reduction,
            ));
        }
        if self.chars_per_line == 0 {
            warn!(
                fallback = DEFAULT_CHARS_PER_LINE,
                "chars_per_line must be positive; using fallback"
            );
            self.chars_per_line = DEFAULT_CHARS_PER_LINE;
        }
        Ok(self)
    }

    /// Builds a validated config from a key lookup (normally the process env).
    ///
    /// Missing keys keep their defaults. A present but unparsable value is an error,
    /// except for `LAYOUT_CHARS_PER_LINE`, which falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let chars_per_line = match lookup("LAYOUT_CHARS_PER_LINE") {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                warn!(value = %raw, "LAYOUT_CHARS_PER_LINE is not a positive integer; using fallback");
                DEFAULT_CHARS_PER_LINE
            }),
            None => defaults.chars_per_line,
        };

        let config = Self {
            page1_budget: parse_key(&lookup, "LAYOUT_PAGE1_BUDGET", defaults.page1_budget)?,
            page2_budget: parse_key(&lookup, "LAYOUT_PAGE2_BUDGET", defaults.page2_budget)?,
            page2_footer_lines: parse_key(
                &lookup,
                "LAYOUT_PAGE2_FOOTER_LINES",
                defaults.page2_footer_lines,
            )?,
            chars_per_line,
            job_header_lines: parse_key(
                &lookup,
                "LAYOUT_JOB_HEADER_LINES",
                defaults.job_header_lines,
            )?,
            section_header_lines: parse_key(
                &lookup,
                "LAYOUT_SECTION_HEADER_LINES",
                defaults.section_header_lines,
            )?,
            bullet_chrome_lines: parse_key(
                &lookup,
                "LAYOUT_BULLET_CHROME_LINES",
                defaults.bullet_chrome_lines,
            )?,
            min_bullets_per_role: parse_key(
                &lookup,
                "LAYOUT_MIN_BULLETS_PER_ROLE",
                defaults.min_bullets_per_role,
            )?,
            max_bullets_per_role: parse_key(
                &lookup,
                "LAYOUT_MAX_BULLETS_PER_ROLE",
                defaults.max_bullets_per_role,
            )?,
            min_bullets_after_job_header: parse_key(
                &lookup,
                "LAYOUT_MIN_BULLETS_AFTER_JOB_HEADER",
                defaults.min_bullets_after_job_header,
            )?,
            max_summary_lines: parse_key(
                &lookup,
                "LAYOUT_MAX_SUMMARY_LINES",
                defaults.max_summary_lines,
            )?,
            max_skills_lines: parse_key(
                &lookup,
                "LAYOUT_MAX_SKILLS_LINES",
                defaults.max_skills_lines,
            )?,
            compression_enabled: parse_key(
                &lookup,
                "LAYOUT_COMPRESSION_ENABLED",
                defaults.compression_enabled,
            )?,
            compression_target_reduction: parse_key(
                &lookup,
                "LAYOUT_COMPRESSION_TARGET_REDUCTION",
                defaults.compression_target_reduction,
            )?,
            compression_preserve_first: parse_key(
                &lookup,
                "LAYOUT_COMPRESSION_PRESERVE_FIRST",
                defaults.compression_preserve_first,
            )?,
        };

        config.validated()
    }

    /// Characters per line, never zero even on an unvalidated config.
    pub fn effective_chars_per_line(&self) -> u32 {
        if self.chars_per_line == 0 {
            DEFAULT_CHARS_PER_LINE
        } else {
            self.chars_per_line
        }
    }

    /// Usable lines on page 2 after the footer reserve.
    pub fn page2_usable(&self) -> u32 {
        self.page2_budget.saturating_sub(self.page2_footer_lines)
    }
}

fn parse_key<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(default),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
