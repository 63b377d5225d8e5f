//! Event factory.
//!
//! The factory is the only way to build an [`Event`]. It stamps identifiers,
//! timestamps, and versions, and validates each payload against the rules of
//! its event type, reporting every offending field at once.

use crate::SharedClock;
use crate::agent::domain::{AgentId, AgentRole, AgentStatus};
use crate::event::domain::{
    AgentPayload, CodePayload, CollaborationPayload, CorrelationId, Event, EventCategory,
    EventId, EventParts, EventPayload, EventType, MessagePayload, SessionPayload, Severity,
    SystemPayload, TaskPayload,
};
use crate::task::domain::{Task, TaskStatus};
use crate::validation::{FieldProblem, IssueCollector, ValidationError};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Builds validated events stamped with the injected clock.
#[derive(Clone)]
pub struct EventFactory {
    clock: SharedClock,
}

impl std::fmt::Debug for EventFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFactory").finish_non_exhaustive()
    }
}

impl EventFactory {
    /// Creates a factory that stamps events with `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Returns the factory's clock.
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    fn draft(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: EventPayload,
    ) -> EventDraft {
        EventDraft {
            clock: SharedClock::clone(&self.clock),
            event_type,
            source: source.into(),
            target: None,
            correlation_id: None,
            version: 1,
            metadata: BTreeMap::new(),
            payload,
        }
    }

    /// Starts a task lifecycle event.
    pub fn task(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: TaskPayload,
    ) -> EventDraft {
        let correlation_id = CorrelationId::from(payload.task_id);
        self.draft(event_type, source, EventPayload::Task(payload))
            .with_correlation_id(correlation_id)
    }

    /// Starts a task lifecycle event describing `task` as it is now.
    ///
    /// The event is correlated by the task identifier.
    pub fn task_snapshot(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        task: &Task,
    ) -> EventDraft {
        self.task(
            event_type,
            source,
            TaskPayload {
                task_id: task.id(),
                title: task.title().to_owned(),
                status: task.status(),
                priority: task.priority(),
                agent_id: None,
                result: None,
                error: None,
            },
        )
    }

    /// Starts an agent lifecycle event.
    pub fn agent(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: AgentPayload,
    ) -> EventDraft {
        self.draft(event_type, source, EventPayload::Agent(payload))
    }

    /// Starts an agent status change event.
    pub fn agent_status_changed(
        &self,
        source: impl Into<String>,
        agent_id: AgentId,
        role: AgentRole,
        previous: AgentStatus,
        current: AgentStatus,
    ) -> EventDraft {
        self.agent(
            EventType::AgentStatusChanged,
            source,
            AgentPayload {
                agent_id,
                role,
                status: current,
                previous_status: Some(previous),
            },
        )
    }

    /// Starts a message event.
    pub fn message(&self, source: impl Into<String>, payload: MessagePayload) -> EventDraft {
        self.draft(EventType::MessageSent, source, EventPayload::Message(payload))
    }

    /// Starts a collaboration event.
    pub fn collaboration(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: CollaborationPayload,
    ) -> EventDraft {
        self.draft(event_type, source, EventPayload::Collaboration(payload))
    }

    /// Starts a system diagnostics event.
    pub fn system(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: SystemPayload,
    ) -> EventDraft {
        self.draft(event_type, source, EventPayload::System(payload))
    }

    /// Starts a `system.error_occurred` event.
    pub fn system_error(
        &self,
        source: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> EventDraft {
        self.system(
            EventType::ErrorOccurred,
            source,
            SystemPayload {
                severity: Severity::Error,
                message: message.into(),
                details,
            },
        )
    }

    /// Starts a session event.
    pub fn session(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: SessionPayload,
    ) -> EventDraft {
        self.draft(event_type, source, EventPayload::Session(payload))
    }

    /// Starts a code artefact event.
    pub fn code(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: CodePayload,
    ) -> EventDraft {
        self.draft(event_type, source, EventPayload::Code(payload))
    }

    /// Starts an event from an untyped JSON payload.
    ///
    /// The payload object is checked against the field schema of the type's
    /// category before it is decoded.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every missing or mistyped field,
    /// or the decoder's complaint when a field holds an unacceptable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use agora::SharedClock;
    /// use agora::event::domain::EventType;
    /// use agora::event::services::EventFactory;
    /// use mockable::DefaultClock;
    /// use serde_json::json;
    /// use std::sync::Arc;
    ///
    /// let clock: SharedClock = Arc::new(DefaultClock);
    /// let factory = EventFactory::new(clock);
    /// let err = factory
    ///     .from_json(EventType::MessageSent, "chat", json!({ "content": 42 }))
    ///     .expect_err("sender is missing and content is mistyped");
    /// assert!(err.has_field("payload.sender"));
    /// assert!(err.has_field("payload.content"));
    /// ```
    pub fn from_json(
        &self,
        event_type: EventType,
        source: impl Into<String>,
        payload: Value,
    ) -> Result<EventDraft, ValidationError> {
        let Value::Object(fields) = payload else {
            return Err(ValidationError::single(
                "payload",
                FieldProblem::Mistyped { expected: "object" },
            ));
        };
        let category = event_type.category();
        check_schema(&fields, schema_for(category))?;
        let tagged = json!({ "category": category.as_str(), "data": Value::Object(fields) });
        let decoded: EventPayload = serde_json::from_value(tagged).map_err(|err| {
            ValidationError::single("payload", FieldProblem::Invalid(err.to_string()))
        })?;
        Ok(self.draft(event_type, source, decoded))
    }
}

/// Event under construction.
#[derive(Clone)]
#[must_use]
pub struct EventDraft {
    clock: SharedClock,
    event_type: EventType,
    source: String,
    target: Option<String>,
    correlation_id: Option<CorrelationId>,
    version: u32,
    metadata: BTreeMap<String, Value>,
    payload: EventPayload,
}

impl std::fmt::Debug for EventDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDraft")
            .field("event_type", &self.event_type)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("correlation_id", &self.correlation_id)
            .field("version", &self.version)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl EventDraft {
    /// Addresses the event to a recipient.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Joins the event to an existing causal chain.
    pub const fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Overrides the default version of 1.
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validates the draft and builds the event.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every offending field.
    pub fn build(self) -> Result<Event, ValidationError> {
        let mut issues = IssueCollector::new();
        issues.require_text("source", &self.source);
        if self
            .target
            .as_deref()
            .is_some_and(|target| target.trim().is_empty())
        {
            issues.push(
                "target",
                FieldProblem::Invalid("must not be blank".to_owned()),
            );
        }
        if self.version == 0 {
            issues.push(
                "version",
                FieldProblem::Invalid("must be at least 1".to_owned()),
            );
        }
        let expected = self.event_type.category();
        let found = self.payload.category();
        if expected == found {
            validate_payload(self.event_type, &self.payload, &mut issues);
        } else {
            issues.push(
                "payload",
                FieldProblem::Invalid(format!(
                    "{} requires a {expected} payload, found {found}",
                    self.event_type
                )),
            );
        }
        issues.finish()?;

        Ok(Event::assemble(EventParts {
            id: EventId::new(),
            event_type: self.event_type,
            source: self.source.trim().to_owned(),
            target: self.target,
            timestamp: self.clock.utc(),
            correlation_id: self.correlation_id.unwrap_or_default(),
            version: self.version,
            metadata: self.metadata,
            payload: self.payload,
        }))
    }
}

fn validate_payload(event_type: EventType, payload: &EventPayload, issues: &mut IssueCollector) {
    match payload {
        EventPayload::Task(task) => validate_task(event_type, task, issues),
        EventPayload::Agent(agent) => {
            if event_type == EventType::AgentStatusChanged && agent.previous_status.is_none() {
                issues.push("payload.previous_status", FieldProblem::Missing);
            }
        }
        EventPayload::Message(message) => {
            issues.require_text("payload.content", &message.content);
        }
        EventPayload::Collaboration(collaboration) => {
            issues.require_text("payload.topic", &collaboration.topic);
            if collaboration.participants.is_empty() {
                issues.push("payload.participants", FieldProblem::Missing);
            }
            if event_type == EventType::CollaborationCompleted
                && collaboration.succeeded.is_none()
            {
                issues.push("payload.succeeded", FieldProblem::Missing);
            }
        }
        EventPayload::System(system) => {
            issues.require_text("payload.message", &system.message);
        }
        EventPayload::Session(session) => {
            issues.require_text("payload.session_id", &session.session_id);
        }
        EventPayload::Code(code) => {
            issues.require_text("payload.language", &code.language);
            issues.require_text("payload.content", &code.content);
            if event_type == EventType::CodeReviewed && code.approved.is_none() {
                issues.push("payload.approved", FieldProblem::Missing);
            }
        }
    }
}

fn validate_task(event_type: EventType, task: &TaskPayload, issues: &mut IssueCollector) {
    issues.require_text("payload.title", &task.title);
    let expected_status = match event_type {
        EventType::TaskAssigned => Some(TaskStatus::Assigned),
        EventType::TaskStarted => Some(TaskStatus::InProgress),
        EventType::TaskCompleted => Some(TaskStatus::Completed),
        EventType::TaskFailed => Some(TaskStatus::Failed),
        EventType::TaskCancelled => Some(TaskStatus::Cancelled),
        _ => None,
    };
    if let Some(expected) = expected_status.filter(|expected| task.status != *expected) {
        issues.push(
            "payload.status",
            FieldProblem::Invalid(format!("{event_type} requires status {expected}")),
        );
    }
    if matches!(event_type, EventType::TaskAssigned | EventType::TaskStarted)
        && task.agent_id.is_none()
    {
        issues.push("payload.agent_id", FieldProblem::Missing);
    }
    if event_type == EventType::TaskFailed
        && task.error.as_deref().is_none_or(|error| error.trim().is_empty())
    {
        issues.push("payload.error", FieldProblem::Missing);
    }
}

#[derive(Debug, Clone, Copy)]
enum JsonKind {
    String,
    Bool,
    Array,
    Any,
}

impl JsonKind {
    const fn expected(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Array => "array",
            Self::Any => "any value",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

struct FieldRule {
    name: &'static str,
    kind: JsonKind,
    required: bool,
}

const fn required(name: &'static str, kind: JsonKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: JsonKind) -> FieldRule {
    FieldRule {
        name,
        kind,
        required: false,
    }
}

const TASK_SCHEMA: &[FieldRule] = &[
    required("task_id", JsonKind::String),
    required("title", JsonKind::String),
    required("status", JsonKind::String),
    required("priority", JsonKind::String),
    optional("agent_id", JsonKind::String),
    optional("result", JsonKind::Any),
    optional("error", JsonKind::String),
];

const AGENT_SCHEMA: &[FieldRule] = &[
    required("agent_id", JsonKind::String),
    required("role", JsonKind::String),
    required("status", JsonKind::String),
    optional("previous_status", JsonKind::String),
];

const MESSAGE_SCHEMA: &[FieldRule] = &[
    required("sender", JsonKind::String),
    optional("recipient", JsonKind::String),
    required("content", JsonKind::String),
];

const COLLABORATION_SCHEMA: &[FieldRule] = &[
    required("initiator", JsonKind::String),
    required("participants", JsonKind::Array),
    required("topic", JsonKind::String),
    optional("succeeded", JsonKind::Bool),
    optional("outcome", JsonKind::String),
];

const SYSTEM_SCHEMA: &[FieldRule] = &[
    required("severity", JsonKind::String),
    required("message", JsonKind::String),
    optional("details", JsonKind::Any),
];

const SESSION_SCHEMA: &[FieldRule] = &[
    required("session_id", JsonKind::String),
    optional("user", JsonKind::String),
    optional("summary", JsonKind::String),
];

const CODE_SCHEMA: &[FieldRule] = &[
    required("language", JsonKind::String),
    required("content", JsonKind::String),
    optional("path", JsonKind::String),
    optional("approved", JsonKind::Bool),
    optional("notes", JsonKind::String),
];

const fn schema_for(category: EventCategory) -> &'static [FieldRule] {
    match category {
        EventCategory::Task => TASK_SCHEMA,
        EventCategory::Agent => AGENT_SCHEMA,
        EventCategory::Message => MESSAGE_SCHEMA,
        EventCategory::Collaboration => COLLABORATION_SCHEMA,
        EventCategory::System => SYSTEM_SCHEMA,
        EventCategory::Session => SESSION_SCHEMA,
        EventCategory::Code => CODE_SCHEMA,
    }
}

fn check_schema(fields: &Map<String, Value>, schema: &[FieldRule]) -> Result<(), ValidationError> {
    let mut issues = IssueCollector::new();
    for rule in schema {
        let path = format!("payload.{}", rule.name);
        match fields.get(rule.name) {
            None | Some(Value::Null) if rule.required => issues.push(path, FieldProblem::Missing),
            None | Some(Value::Null) => {}
            Some(value) if !rule.kind.accepts(value) => issues.push(
                path,
                FieldProblem::Mistyped {
                    expected: rule.kind.expected(),
                },
            ),
            Some(_) => {}
        }
    }
    issues.finish()
}
