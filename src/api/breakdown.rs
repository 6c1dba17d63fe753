use log::warn;
use serde::{Deserialize, Serialize};

use crate::notify::Notification;

use super::ApiError;

/// One actionable step of a broken-down task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Subtask {
    fn titled(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownPlan {
    pub subtasks: Vec<Subtask>,
    /// True when the endpoint was unreachable and the canned plan was used.
    pub fallback: bool,
}

/// Deployments answer in one of a few shapes: free text under
/// `task_breakdown` or `breakdown`, or structured `subtasks`. Accept all of
/// them and normalize to `Vec<Subtask>`.
#[derive(Debug, Deserialize)]
struct BreakdownResponse {
    success: Option<bool>,
    task_breakdown: Option<String>,
    breakdown: Option<String>,
    subtasks: Option<Vec<Subtask>>,
}

pub struct TaskBreakdownClient {
    client: reqwest::Client,
    base_url: String,
}

impl TaskBreakdownClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Asks the backend to split `task` into steps. An unreachable endpoint
    /// degrades to the canned plan; a reachable endpoint answering badly is
    /// an error.
    pub async fn break_down(&self, task: &str) -> Result<BreakdownPlan, ApiError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ApiError::EmptyInput);
        }

        let url = format!("{}/task_breakdown", self.base_url);
        // Both body keys are in use across deployments; send both.
        let body = serde_json::json!({ "text": task, "task": task });
        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("task breakdown endpoint unreachable, using fallback plan: {err}");
                return Ok(BreakdownPlan {
                    subtasks: fallback_subtasks(task),
                    fallback: true,
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let parsed: BreakdownResponse = response
            .json()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        Ok(BreakdownPlan {
            subtasks: normalize_response(parsed)?,
            fallback: false,
        })
    }
}

fn normalize_response(response: BreakdownResponse) -> Result<Vec<Subtask>, ApiError> {
    if let Some(subtasks) = response.subtasks {
        if !subtasks.is_empty() {
            return Ok(subtasks);
        }
    }
    if response.success == Some(false) {
        return Err(ApiError::InvalidResponse(
            "backend reported failure".into(),
        ));
    }
    let text = response
        .task_breakdown
        .or(response.breakdown)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidResponse("no breakdown in response".into()))?;
    Ok(split_bullets(&text))
}

/// Splits backend free text into bullet items, stripping leading `-` / `•`.
fn split_bullets(text: &str) -> Vec<Subtask> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '•'])
                .trim_start()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .map(|line| Subtask {
            title: line,
            description: String::new(),
        })
        .collect()
}

/// Canned plan shown when the backend is unreachable.
fn fallback_subtasks(task: &str) -> Vec<Subtask> {
    vec![
        Subtask::titled(
            format!("Clarify what \"{task}\" actually requires"),
            "Write down the end result you want in one sentence.",
        ),
        Subtask::titled(
            "Split it into small chunks",
            "Aim for pieces you can finish inside one Pomodoro session.",
        ),
        Subtask::titled(
            "Start the first chunk now",
            "Momentum beats planning. Set a timer and begin.",
        ),
        Subtask::titled(
            "Review and adjust",
            "After each session, check the plan still makes sense.",
        ),
    ]
}

pub fn success_notification() -> Notification {
    Notification::success("Task broken down!", "Here's your simple action plan.")
}

pub fn error_notification() -> Notification {
    Notification::error("Error", "Could not break down the task. Try again later.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<Subtask>, ApiError> {
        normalize_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn structured_subtasks_win_over_free_text() {
        let subtasks = parse(
            r#"{"success":true,"task_breakdown":"- ignored","subtasks":[{"title":"Outline","description":"Sketch the sections"}]}"#,
        )
        .unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].title, "Outline");
        assert_eq!(subtasks[0].description, "Sketch the sections");
    }

    #[test]
    fn task_breakdown_text_splits_into_bullets() {
        let subtasks =
            parse(r#"{"success":true,"task_breakdown":"- Read the brief\n• Draft an outline\n\n- Write"}"#)
                .unwrap();
        let titles: Vec<_> = subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Read the brief", "Draft an outline", "Write"]);
    }

    #[test]
    fn breakdown_key_variant_is_accepted() {
        let subtasks = parse(r#"{"breakdown":"- One\n- Two"}"#).unwrap();
        assert_eq!(subtasks.len(), 2);
    }

    #[test]
    fn subtasks_without_description_default_to_empty() {
        let subtasks = parse(r#"{"subtasks":[{"title":"Just a title"}]}"#).unwrap();
        assert_eq!(subtasks[0].description, "");
    }

    #[test]
    fn reported_failure_is_an_error() {
        let err = parse(r#"{"success":false}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn missing_breakdown_is_an_error() {
        let err = parse(r#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn fallback_plan_mentions_the_task() {
        let plan = fallback_subtasks("write thesis");
        assert!(plan[0].title.contains("write thesis"));
        assert_eq!(plan.len(), 4);
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_fallback() {
        // Port 9 (discard) refuses connections on any sane test host.
        let client = TaskBreakdownClient::new("http://127.0.0.1:9");
        let plan = client.break_down("pack for the move").await.unwrap();
        assert!(plan.fallback);
        assert_eq!(plan.subtasks.len(), 4);
    }

    #[tokio::test]
    async fn blank_task_is_rejected_before_any_request() {
        let client = TaskBreakdownClient::new("http://127.0.0.1:9");
        let err = client.break_down("   ").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyInput));
    }
}
