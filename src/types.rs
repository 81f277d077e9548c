use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// The agent used when the caller does not pick one.
pub const DEFAULT_AGENT: &str = "deep-research-pro-preview-12-2025";

/// The API key used to authenticate every request.
///
/// The secret is never printed; `Debug` shows a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret, for building the auth header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The work to submit: a free-text query and the agent that should run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub input: String,
    pub agent: String,
}

impl TaskSpec {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            agent: DEFAULT_AGENT.to_string(),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }
}

/// Opaque identifier assigned by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The lifecycle state of a task as observed by polling.
///
/// Only the two terminal states are named. Every other label the API reports is
/// kept verbatim in `InProgress`, so new intermediate states need no code change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Completed,
    Failed,
    InProgress(String),
}

impl Status {
    /// Normalizes a raw status label, ignoring case.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("completed") {
            Status::Completed
        } else if label.eq_ignore_ascii_case("failed") {
            Status::Failed
        } else {
            Status::InProgress(label.to_string())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Completed => f.write_str("completed"),
            Status::Failed => f.write_str("failed"),
            Status::InProgress(label) => f.write_str(label),
        }
    }
}

/// One piece of a task's output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputFragment {
    /// The fragment type reported by the API, e.g. "text".
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The normalized view of a remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub status: Status,
    pub outputs: Vec<OutputFragment>,
    pub error: Option<String>,
}

impl Task {
    /// The text of the last output fragment, if it carries any.
    pub fn final_text(&self) -> Option<&str> {
        self.outputs
            .last()
            .and_then(|fragment| fragment.text.as_deref())
            .filter(|text| !text.is_empty())
    }
}

/// (Internal) Request body for creating a background interaction.
#[derive(Serialize, Debug)]
pub(crate) struct CreateInteractionRequest<'a> {
    pub(crate) input: &'a str,
    pub(crate) agent: &'a str,
    pub(crate) background: bool,
}

/// (Internal) An interaction as it appears on the wire.
///
/// The id arrives either flat (`id`) or as the last segment of a resource
/// `name` such as `interactions/abc123`.
#[derive(Deserialize, Debug)]
pub(crate) struct InteractionResource {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) outputs: Option<Vec<OutputFragment>>,
    #[serde(default)]
    pub(crate) error: Option<serde_json::Value>,
}

impl TryFrom<InteractionResource> for Task {
    type Error = TransportError;

    fn try_from(resource: InteractionResource) -> Result<Self, Self::Error> {
        let id = resource
            .id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                resource
                    .name
                    .as_deref()
                    .and_then(|name| name.rsplit('/').next())
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| TransportError::MalformedResponse {
                detail: "response carries neither `id` nor `name`".to_string(),
            })?;

        let status = resource
            .status
            .as_deref()
            .map(Status::from_label)
            .unwrap_or_else(|| Status::InProgress("unspecified".to_string()));

        Ok(Task {
            id: TaskId::new(id),
            status,
            outputs: resource.outputs.unwrap_or_default(),
            error: resource.error.as_ref().and_then(error_detail),
        })
    }
}

/// Flattens the `error` field, which is either a string or an object with a `message`.
pub(crate) fn error_detail(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(message)) => Some(message.clone()),
            _ => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}
