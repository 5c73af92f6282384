//! Event listing with optional field-selector filtering

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use kube::api::{Api, ListParams};
use serde::{Deserialize, Serialize};

use super::{format_time, to_snapshot, ResourceClient};
use crate::session::SessionState;
use crate::{Error, Result};

/// Optional server-side filter for event listings
///
/// Either half may be set independently; an empty selector (or `None` passed
/// to [`EventClient::list`]) applies no filter at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSelector {
    /// Match the event's own `metadata.name`
    pub name: Option<String>,
    /// Match the kind of the object the event is about
    pub involved_kind: Option<String>,
}

impl EventSelector {
    /// Render as a Kubernetes field selector, `None` when nothing is set
    fn to_field_selector(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            parts.push(format!("metadata.name={}", name));
        }
        if let Some(kind) = self.involved_kind.as_deref().filter(|k| !k.is_empty()) {
            parts.push(format!("involvedObject.kind={}", kind));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

/// Condensed view of one event
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct EventInfo {
    /// Kind of the involved object (`Pod`, `Deployment`, ...)
    pub kind: String,
    /// Event name
    pub name: String,
    /// Machine-readable reason (`BackOff`, `Scheduled`, ...)
    pub reason: String,
    /// Human-readable message
    pub message: String,
    /// When the event last occurred
    pub last_timestamp: String,
    /// How many times the event occurred
    pub count: i32,
    /// Event type (`Normal` or `Warning`)
    pub type_: String,
}

/// Event adapter
///
/// Events are emitted by the cluster, not by clients: `create`/`update`/
/// `delete` are reserved and fail with `NotImplemented`.
#[derive(Clone, Debug)]
pub struct EventClient {
    state: SessionState,
}

impl EventClient {
    pub(crate) fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// The deferred error, if one is recorded
    pub fn err(&self) -> Option<&Error> {
        self.state.err()
    }

    /// List events in `namespace`, optionally filtered by `selector`
    pub async fn list(
        &self,
        namespace: &str,
        selector: Option<&EventSelector>,
    ) -> Result<Vec<EventInfo>> {
        let client = self.state.client()?;
        let api: Api<Event> = Api::namespaced(client.clone(), namespace);

        let mut params = ListParams::default();
        if let Some(fields) = selector.and_then(EventSelector::to_field_selector) {
            params = params.fields(&fields);
        }

        let events = api.list(&params).await?;
        Ok(events.items.iter().map(project_event).collect())
    }
}

#[async_trait]
impl ResourceClient for EventClient {
    fn set_err(&mut self, err: Error) {
        self.state.record_err(err);
    }

    async fn create(&self, _manifest: &str) -> Result<()> {
        Err(Error::NotImplemented("event create"))
    }

    async fn update(&self, _manifest: &str) -> Result<()> {
        Err(Error::NotImplemented("event update"))
    }

    async fn delete(&self, _namespace: &str, _name: &str) -> Result<()> {
        Err(Error::NotImplemented("event delete"))
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<String> {
        let client = self.state.client()?;
        let api: Api<Event> = Api::namespaced(client.clone(), namespace);
        let event = api.get(name).await?;
        to_snapshot(&event)
    }
}

fn project_event(event: &Event) -> EventInfo {
    EventInfo {
        kind: event.involved_object.kind.clone().unwrap_or_default(),
        name: event.metadata.name.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        last_timestamp: format_time(event.last_timestamp.as_ref()),
        count: event.count.unwrap_or_default(),
        type_: event.type_.clone().unwrap_or_default(),
    }
}
