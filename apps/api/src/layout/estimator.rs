//! Line estimation: converts text length into physical line counts.
//!
//! Character-count based: `ceil(chars / chars_per_line)`. Coarser than a glyph-width
//! wrap, but deterministic and font-agnostic, which is what the allocation stages need.
//! Length is counted in `char`s so multi-byte text is not over-charged.

use crate::layout::config::LayoutConfig;

/// Pure line-count estimator bound to one config.
#[derive(Debug, Clone, Copy)]
pub struct LineEstimator<'a> {
    config: &'a LayoutConfig,
}

impl<'a> LineEstimator<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Wrapped text lines for `text`, with no chrome and no cap.
    pub fn text_lines(&self, text: &str) -> u32 {
        let chars = text.chars().count() as u32;
        chars.div_ceil(self.config.effective_chars_per_line())
    }

    /// Lines for one bullet: chrome plus wrapped text. Empty text costs the chrome alone.
    pub fn bullet_lines(&self, text: &str) -> u32 {
        self.config
            .bullet_chrome_lines
            .saturating_add(self.text_lines(text))
    }

    /// Lines for the summary paragraph, capped at `max_summary_lines`.
    pub fn summary_lines(&self, text: &str) -> u32 {
        self.text_lines(text.trim()).min(self.config.max_summary_lines)
    }

    /// Lines for the comma-joined skills list, capped at `max_skills_lines`.
    pub fn skills_lines<S: AsRef<str>>(&self, skills: &[S]) -> u32 {
        let joined = skills
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        self.text_lines(&joined).min(self.config.max_skills_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> LayoutConfig {
        LayoutConfig {
            chars_per_line: 10,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_empty_bullet_costs_chrome_only() {
        let config = make_config();
        assert_eq!(LineEstimator::new(&config).bullet_lines(""), 1);
    }

    #[test]
    fn test_bullet_lines_rounds_up() {
        let config = make_config();
        let est = LineEstimator::new(&config);
        assert_eq!(est.bullet_lines("0123456789"), 2); // exactly one line + chrome
        assert_eq!(est.bullet_lines("0123456789a"), 3); // one char over wraps
    }

    #[test]
    fn test_multibyte_counted_by_char() {
        let config = make_config();
        // 10 chars, 20 bytes
        assert_eq!(LineEstimator::new(&config).text_lines("éééééééééé"), 1);
    }

    #[test]
    fn test_summary_capped() {
        let config = make_config(); // max_summary_lines = 4
        let long = "x".repeat(200);
        assert_eq!(LineEstimator::new(&config).summary_lines(&long), 4);
        assert_eq!(LineEstimator::new(&config).summary_lines("   "), 0);
    }

    #[test]
    fn test_skills_joined_and_capped() {
        let config = make_config(); // max_skills_lines = 3
        let est = LineEstimator::new(&config);
        // "Rust, Go" = 8 chars → 1 line
        assert_eq!(est.skills_lines(&["Rust", "Go"]), 1);
        let many: Vec<String> = (0..40).map(|i| format!("skill{i}")).collect();
        assert_eq!(est.skills_lines(&many), 3);
        let empty: [&str; 0] = [];
        assert_eq!(est.skills_lines(&empty), 0);
    }

    #[test]
    fn test_zero_chars_per_line_uses_fallback() {
        let config = LayoutConfig {
            chars_per_line: 0,
            ..LayoutConfig::default()
        };
        // 150 chars at fallback 75 → 2 lines + 1 chrome
        assert_eq!(LineEstimator::new(&config).bullet_lines(&"x".repeat(150)), 3);
    }
}
