//! Bullet compression: last-resort text shortening to reclaim lines.
//!
//! # Rules
//! - A fixed, ordered table of precompiled patterns, each applied once per pass
//! - Patterns are lowercase-only: capitalized words after the first are never rewritten
//! - The first word is matched in lowercase and its capital restored afterwards
//! - Passes repeat until the text stops changing, so the output is a fixed point
//! - Text longer than `MAX_COMPRESSIBLE_CHARS` is returned untouched
//!
//! `regex` matches in linear time, so every rule is bounded regardless of input.
//! Every rule and normalization step only shortens the text, so the pass loop terminates.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::condense::oldest_first;
use crate::layout::config::LayoutConfig;
use crate::layout::types::{Bullet, Role};

/// Inputs above this many chars skip compression entirely.
pub const MAX_COMPRESSIBLE_CHARS: usize = 600;

struct CompressionRule {
    pattern: Regex,
    replacement: &'static str,
}

#[rustfmt::skip]
const RULE_TABLE: &[(&str, &str)] = &[
    // Pure filler removal
    (r"\bsuccessfully\s+", ""),
    (r"\b(?:very|really|extremely)\s+", ""),
    (r"\bin the process of\s+", ""),
    (r"\ba total of\s+", ""),
    // Connective tightening
    (r"\bso as to\b", "to"),
    (r"\bin an effort to\b", "to"),
    (r"\bin order to\b", "to"),
    (r"\bfor the purpose of\b", "for"),
    (r"\bdue to the fact that\b", "because"),
    (r"\bprior to\b", "before"),
    (r"\bas well as\b", "and"),
    (r"\bin collaboration with\b", "with"),
    (r"\bwith the help of\b", "with"),
    (r"\bon a (daily|weekly|monthly) basis\b", "$1"),
    (r"\b(?:that|which) resulted in\b", "yielding"),
    (r"\bresulting in\b", "yielding"),
    (r"\ba (?:wide |broad )?variety of\b", "various"),
    (r"\ba (?:large )?number of\b", "many"),
    (r"\bapproximately\s+(\d)", "~$1"),
    // Verb tightening
    (r"\butilized\b", "used"),
    (r"\butilizing\b", "using"),
    (r"\butilizes\b", "uses"),
    (r"\butilize\b", "use"),
];

static RULES: LazyLock<Vec<CompressionRule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(pattern, replacement)| CompressionRule {
            pattern: Regex::new(pattern).expect("compression rule must be a valid regex"),
            replacement,
        })
        .collect()
});

static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,;:]|\.\s|\.$)").expect("valid regex"));

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One bullet rewritten by the compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    pub index: usize,
    pub lines_before: u32,
    pub lines_after: u32,
}

/// Outcome of a compression pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub target_lines: u32,
    pub lines_saved: u32,
    pub changes: Vec<BulletChange>,
}

impl CompressionReport {
    pub fn target_met(&self) -> bool {
        self.lines_saved >= self.target_lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text compression
// ────────────────────────────────────────────────────────────────────────────

/// Shortens `text` with the rule table, then normalizes whitespace.
///
/// Idempotent: `compress_text(&compress_text(t)) == compress_text(t)`.
pub fn compress_text(text: &str) -> String {
    let len = text.chars().count();
    if len > MAX_COMPRESSIBLE_CHARS {
        return text.to_string();
    }

    // A changing pass either shortens the text or only lowercases its first
    // letter, which can happen at most once in a row.
    let mut current = text.to_string();
    for _ in 0..=2 * len + 1 {
        let next = compress_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    restore_leading_capital(text, &current)
}

/// One pass: lowercase the first letter, apply every rule once, normalize spacing.
fn compress_pass(text: &str) -> String {
    let mut out = lowercase_first_ascii(text.trim());
    for rule in RULES.iter() {
        out = rule
            .pattern
            .replace_all(&out, rule.replacement)
            .into_owned();
    }

    out = MULTI_SPACE.replace_all(&out, " ").into_owned();
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out.trim().to_string()
}

fn lowercase_first_ascii(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            std::iter::once(first.to_ascii_lowercase()).chain(chars).collect()
        }
        _ => text.to_string(),
    }
}

/// Re-capitalizes the first letter when the original sentence started with a capital.
fn restore_leading_capital(original: &str, compressed: &str) -> String {
    let starts_upper = original
        .trim_start()
        .chars()
        .next()
        .is_some_and(char::is_uppercase);
    let mut chars = compressed.chars();
    match chars.next() {
        Some(first) if starts_upper && first.is_ascii_lowercase() => {
            std::iter::once(first.to_ascii_uppercase()).chain(chars).collect()
        }
        _ => compressed.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Budget-driven compression
// ────────────────────────────────────────────────────────────────────────────

/// Compresses bullets longest-first until `target_lines` are reclaimed.
///
/// The first `preserve_first_n` bullets are never touched. Line costs are
/// re-estimated after each rewrite; selection and order are unchanged.
pub fn compress_bullets_to_fit(
    bullets: &mut [Bullet],
    target_lines: u32,
    preserve_first_n: usize,
    config: &LayoutConfig,
) -> CompressionReport {
    let mut report = CompressionReport {
        target_lines,
        ..CompressionReport::default()
    };
    if target_lines == 0 {
        return report;
    }

    let mut order: Vec<usize> = (preserve_first_n.min(bullets.len())..bullets.len()).collect();
    order.sort_by_key(|&i| (std::cmp::Reverse(bullets[i].line_cost), i));

    for idx in order {
        if report.lines_saved >= target_lines {
            break;
        }
        let bullet = &mut bullets[idx];
        let compressed = compress_text(&bullet.text);
        if compressed == bullet.text {
            continue;
        }

        let lines_before = bullet.line_cost;
        bullet.set_text(compressed, config);
        let lines_after = bullet.line_cost;
        report.lines_saved = report
            .lines_saved
            .saturating_add(lines_before.saturating_sub(lines_after));
        report.changes.push(BulletChange {
            role_id: None,
            index: idx,
            lines_before,
            lines_after,
        });
    }

    report
}

/// Compresses across roles, oldest role first, until `target_lines` are reclaimed.
pub fn compress_roles_to_fit(
    roles: &mut [Role],
    target_lines: u32,
    preserve_first_n: usize,
    config: &LayoutConfig,
) -> CompressionReport {
    let mut report = CompressionReport {
        target_lines,
        ..CompressionReport::default()
    };

    for idx in oldest_first(roles) {
        if report.lines_saved >= target_lines {
            break;
        }
        let role = &mut roles[idx];
        let remaining = target_lines - report.lines_saved;
        let role_report =
            compress_bullets_to_fit(&mut role.bullets, remaining, preserve_first_n, config);
        if !role_report.changes.is_empty() {
            debug!(
                role = %role.role_id,
                saved = role_report.lines_saved,
                rewritten = role_report.changes.len(),
                "Compressed role bullets"
            );
        }
        report.lines_saved = report.lines_saved.saturating_add(role_report.lines_saved);
        report
            .changes
            .extend(role_report.changes.into_iter().map(|change| BulletChange {
                role_id: Some(role.role_id.clone()),
                ..change
            }));
    }

    report
}

/// Default reclaim target: `compression_target_reduction` of the given bullet lines, rounded up.
pub fn compression_target(total_bullet_lines: u32, config: &LayoutConfig) -> u32 {
    (total_bullet_lines as f32 * config.compression_target_reduction).ceil() as u32
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
