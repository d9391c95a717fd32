//! Assistant (chat completion) abstraction.
//!
//! Screens describe *what* they need as an [`AssistantRequest`]. The
//! implementation turns it into a prompt, streams text increments into the
//! supplied channel, and returns the full reply.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::DashResult;
use crate::models::{
    truncate_chars, CiRun, DeployAssessment, PullInsight, PullRequest, RepoActivity, RiskLevel,
    RunDiagnosis,
};

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Send a request. Text increments go to `deltas` as they arrive; a
    /// closed receiver is not an error.
    async fn send(
        &self,
        request: AssistantRequest,
        deltas: mpsc::UnboundedSender<String>,
    ) -> DashResult<AssistantReply>;
}

#[derive(Debug, Clone)]
pub enum AssistantRequest {
    AnalyzePull {
        pull: PullRequest,
        diff: String,
    },
    DiagnoseRun {
        run: CiRun,
        log: String,
    },
    Standup {
        date: NaiveDate,
        activity: Vec<RepoActivity>,
        open_pulls: usize,
        failing_runs: usize,
    },
    AssessDeploy {
        repo: String,
        environment: String,
        git_ref: String,
        open_pulls: usize,
        failing_runs: usize,
    },
    /// Free-form question from context chat. The only request kept in the
    /// conversation history.
    Ask {
        question: String,
    },
}

impl AssistantRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantRequest::AnalyzePull { .. } => "analyze_pull",
            AssistantRequest::DiagnoseRun { .. } => "diagnose_run",
            AssistantRequest::Standup { .. } => "standup",
            AssistantRequest::AssessDeploy { .. } => "assess_deploy",
            AssistantRequest::Ask { .. } => "ask",
        }
    }

    pub fn is_conversational(&self) -> bool {
        matches!(self, AssistantRequest::Ask { .. })
    }

    /// User-message text sent to the model.
    pub fn prompt(&self) -> String {
        match self {
            AssistantRequest::AnalyzePull { pull, diff } => format!(
                "Review pull request {} \"{}\" by {} ({} files, +{} -{}).\n\n\
                 Diff:\n{}\n\n\
                 Reply with only a JSON object: {{\"summary\": one sentence, \
                 \"risk\": \"LOW\"|\"MEDIUM\"|\"HIGH\", \"concern\": short string or null}}",
                pull.reference(),
                pull.title,
                pull.author,
                pull.files_changed,
                pull.additions,
                pull.deletions,
                truncate_chars(diff, 6000),
            ),
            AssistantRequest::DiagnoseRun { run, log } => format!(
                "CI run #{} of workflow \"{}\" on {} ({}) failed.\n\n\
                 Failed jobs and steps:\n{}\n\n\
                 Reply with only a JSON object: {{\"diagnosis\": what broke in one sentence, \
                 \"fix\": the smallest fix, \"caused_by\": likely commit or change}}",
                run.run_id,
                run.workflow,
                run.repo,
                run.branch,
                truncate_chars(log, 3000),
            ),
            AssistantRequest::Standup {
                date,
                activity,
                open_pulls,
                failing_runs,
            } => {
                let mut prompt = format!(
                    "Write my standup for {}. Open PRs awaiting review: {}. Failing CI runs: {}.\n",
                    date.format("%A %b %d"),
                    open_pulls,
                    failing_runs
                );
                for repo in activity.iter().filter(|a| !a.is_empty()) {
                    prompt.push_str(&format!("\n{}:\n", repo.repo));
                    for commit in repo.commits.iter().take(15) {
                        prompt.push_str(&format!("- commit: {}\n", commit));
                    }
                    for merged in &repo.merged_pulls {
                        prompt.push_str(&format!("- merged: {}\n", merged));
                    }
                }
                if activity.iter().all(RepoActivity::is_empty) {
                    prompt.push_str("\nNo commits or merges in the lookback window.\n");
                }
                prompt.push_str(
                    "\nFormat as three short sections: Yesterday, Today, Blockers. \
                     Plain text bullets, no markdown headers.",
                );
                prompt
            }
            AssistantRequest::AssessDeploy {
                repo,
                environment,
                git_ref,
                open_pulls,
                failing_runs,
            } => format!(
                "Assess deploying {}@{} to {}. Open PRs: {}. Failing CI runs: {}.\n\n\
                 Reply with only a JSON object: {{\"confidence\": integer 0-100, \
                 \"risk\": \"LOW\"|\"MEDIUM\"|\"HIGH\", \"analysis\": two short sentences}}",
                repo, git_ref, environment, open_pulls, failing_runs
            ),
            AssistantRequest::Ask { question } => question.clone(),
        }
    }
}

/// Full reply text plus the JSON object embedded in it, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    fields: Map<String, Value>,
}

impl AssistantReply {
    /// Parse the outermost `{...}` in `text` as a JSON object. Models often
    /// wrap JSON in prose or code fences, so both are tolerated.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let fields = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                match serde_json::from_str::<Value>(&text[start..=end]) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                }
            }
            _ => Map::new(),
        };
        Self { text, fields }
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// A string field. Numbers and booleans are stringified; null is `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// An integer field, accepting numeric strings like `"85"` or `"85%"`.
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        }
    }

    /// Lines of the plain text, trimmed, blanks dropped.
    pub fn lines(&self) -> Vec<String> {
        self.text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    fn first_line(&self) -> String {
        self.lines().into_iter().next().unwrap_or_default()
    }

    pub fn pull_insight(&self) -> PullInsight {
        PullInsight {
            summary: self.field("summary").unwrap_or_else(|| self.first_line()),
            risk: self
                .field("risk")
                .map(|r| RiskLevel::parse(&r))
                .unwrap_or_default(),
            concern: self.field("concern"),
        }
    }

    pub fn run_diagnosis(&self) -> RunDiagnosis {
        RunDiagnosis {
            diagnosis: self.field("diagnosis").unwrap_or_else(|| self.first_line()),
            fix: self.field("fix").unwrap_or_default(),
            caused_by: self.field("caused_by").unwrap_or_default(),
        }
    }

    pub fn deploy_assessment(&self) -> DeployAssessment {
        DeployAssessment {
            confidence: self.integer("confidence").unwrap_or(0).clamp(0, 100) as u8,
            risk: self
                .field("risk")
                .map(|r| RiskLevel::parse(&r))
                .unwrap_or_default(),
            analysis: self.field("analysis").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parses_fenced_json() {
        let reply = AssistantReply::from_text(
            "Here you go:\n```json\n{\"summary\": \"Adds retries\", \"risk\": \"medium\", \"concern\": null}\n```",
        );
        let insight = reply.pull_insight();
        assert_eq!(insight.summary, "Adds retries");
        assert_eq!(insight.risk, RiskLevel::Medium);
        assert_eq!(insight.concern, None);
    }

    #[test]
    fn test_reply_without_json_falls_back_to_text() {
        let reply = AssistantReply::from_text("\nFlaky test in auth module.\nRerun it.");
        assert!(!reply.has_fields());
        assert_eq!(reply.run_diagnosis().diagnosis, "Flaky test in auth module.");
        assert_eq!(reply.lines().len(), 2);
    }

    #[test]
    fn test_confidence_accepts_strings_and_clamps() {
        let reply = AssistantReply::from_text(r#"{"confidence": "85%", "risk": "LOW"}"#);
        assert_eq!(reply.deploy_assessment().confidence, 85);

        let reply = AssistantReply::from_text(r#"{"confidence": 140}"#);
        assert_eq!(reply.deploy_assessment().confidence, 100);

        let reply = AssistantReply::from_text(r#"{"confidence": 72.6}"#);
        assert_eq!(reply.integer("confidence"), Some(73));
    }

    #[test]
    fn test_ask_prompt_is_question() {
        let request = AssistantRequest::Ask {
            question: "What broke last?".to_string(),
        };
        assert_eq!(request.prompt(), "What broke last?");
        assert!(request.is_conversational());
        assert_eq!(request.kind(), "ask");
    }

    #[test]
    fn test_standup_prompt_mentions_empty_window() {
        let request = AssistantRequest::Standup {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            activity: vec![RepoActivity {
                repo: "octo/widgets".to_string(),
                ..Default::default()
            }],
            open_pulls: 2,
            failing_runs: 0,
        };
        let prompt = request.prompt();
        assert!(prompt.contains("Monday Mar 02"));
        assert!(prompt.contains("No commits"));
        assert!(!request.is_conversational());
    }
}
