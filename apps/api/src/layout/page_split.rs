//! Page split simulation: places summary, skills, and roles across two pages.
//!
//! # Placement rules
//! - Summary then skills open page 1 (section header charged only when non-empty)
//! - Roles go newest-first, whole: a role's header and bullets share one page
//! - Orphan guard: a role only starts on page 1 if the header plus its
//!   `min_bullets_after_job_header` cheapest bullets still fit there
//! - Pages fill front-to-back. Once a role moves to page 2, every later role follows.
//! - Overflow is recorded as a violation; the layout is still returned

use tracing::debug;

use crate::layout::config::LayoutConfig;
use crate::layout::types::{PageLayout, ResumeLayout, Role, RoleSummary};

/// Simulates the two-page layout for already-selected content.
///
/// `summary_lines` and `skills_lines` are the estimator's body-line counts
/// (zero means the section is omitted).
pub fn simulate_layout(
    summary_lines: u32,
    skills_lines: u32,
    roles: &[Role],
    config: &LayoutConfig,
) -> ResumeLayout {
    let mut page1 = PageLayout::new(1, config.page1_budget);
    let mut page2 = PageLayout::new(2, config.page2_usable());

    for section in [summary_lines, skills_lines] {
        if section > 0 {
            let lines = config.section_header_lines.saturating_add(section);
            page1.section_lines = page1.section_lines.saturating_add(lines);
            page1.lines_used = page1.lines_used.saturating_add(lines);
        }
    }

    let mut on_page1 = true;
    for role in roles {
        let summary = summarize(role);

        if on_page1 {
            let needed_to_start = role
                .header_lines
                .saturating_add(role.cheapest_lines(config.min_bullets_after_job_header));

            if page1.remaining() < needed_to_start {
                debug!(
                    role = %role.role_id,
                    remaining = page1.remaining(),
                    needed = needed_to_start,
                    "Orphan risk on page 1; moving role to page 2"
                );
                page1.violations.push(format!(
                    "orphaned header avoided: role '{}' needs {} lines to start but page 1 has {} left; moved to page 2",
                    role.role_id,
                    needed_to_start,
                    page1.remaining()
                ));
                on_page1 = false;
            } else if summary.lines <= page1.remaining() {
                page1.lines_used = page1.lines_used.saturating_add(summary.lines);
                page1.roles.push(summary);
                continue;
            } else {
                debug!(
                    role = %role.role_id,
                    lines = summary.lines,
                    remaining = page1.remaining(),
                    "Role does not fit page 1 whole; moving to page 2"
                );
                on_page1 = false;
            }
        }

        page2.lines_used = page2.lines_used.saturating_add(summary.lines);
        page2.roles.push(summary);
    }

    for page in [&mut page1, &mut page2] {
        if page.lines_used > page.lines_available {
            page.violations.push(format!(
                "page {} overflow: {} lines used of {} available ({} over)",
                page.page_number,
                page.lines_used,
                page.lines_available,
                page.overflow_lines()
            ));
        }
    }

    ResumeLayout::from_pages(page1, page2, Vec::new())
}

fn summarize(role: &Role) -> RoleSummary {
    RoleSummary {
        role_id: role.role_id.clone(),
        header_lines: role.header_lines,
        bullet_count: role.bullets.len(),
        lines: role.total_lines(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
