//! Data shapes shared by the cache, the code host and the screens.

mod github;
mod history;
mod insight;

pub use github::{CiRun, CiState, PullRequest, PullState, RepoActivity};
pub use history::{DeployOutcome, DeployRecord, StandupRecord};
pub use insight::{DeployAssessment, PullInsight, ReviewVerdict, RiskLevel, RunDiagnosis};

/// Truncate to at most `max` characters, appending `…` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("héllo wörld", 6), "héllo…");
    }
}
