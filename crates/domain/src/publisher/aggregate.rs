//! Publisher aggregate and its commands.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;

use crate::aggregate::{Aggregate, Lifecycle};
use crate::command::Command;
use crate::value_objects::{MAX_NAME_CHARS, validate_name};

use super::{
    PublisherError, PublisherEvent,
    events::{
        PublisherCreatedData, PublisherRestoredData, PublisherSoftDeletedData,
        PublisherUpdatedData,
    },
};

#[derive(Debug, Clone)]
pub struct CreatePublisher {
    pub publisher_id: AggregateId,
    pub name: String,
}

impl CreatePublisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            publisher_id: AggregateId::new(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePublisher {
    pub publisher_id: AggregateId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SoftDeletePublisher {
    pub publisher_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct RestorePublisher {
    pub publisher_id: AggregateId,
}

macro_rules! publisher_command {
    ($($command:ty),* $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Publisher;

                fn aggregate_id(&self) -> AggregateId {
                    self.publisher_id
                }
            }
        )*
    };
}

publisher_command!(
    CreatePublisher,
    UpdatePublisher,
    SoftDeletePublisher,
    RestorePublisher
);

/// Publisher aggregate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Publisher {
    id: Option<AggregateId>,
    version: Version,
    lifecycle: Lifecycle,
    name: String,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Publisher {
    type Event = PublisherEvent;
    type Error = PublisherError;

    fn aggregate_type() -> &'static str {
        "Publisher"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            PublisherEvent::PublisherCreated(data) => {
                self.id = Some(data.publisher_id);
                self.name = data.name;
                self.updated_at = Some(data.created_at);
            }
            PublisherEvent::PublisherUpdated(data) => {
                self.name = data.name;
                self.updated_at = Some(data.updated_at);
            }
            PublisherEvent::PublisherSoftDeleted(data) => {
                self.lifecycle = Lifecycle::Deleted;
                self.updated_at = Some(data.deleted_at);
            }
            PublisherEvent::PublisherRestored(data) => {
                self.lifecycle = Lifecycle::Active;
                self.updated_at = Some(data.restored_at);
            }
        }
    }
}

impl Publisher {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn create(&self, cmd: &CreatePublisher) -> Result<Vec<PublisherEvent>, PublisherError> {
        if self.id.is_some() {
            return Err(PublisherError::AlreadyCreated);
        }

        Ok(vec![PublisherEvent::PublisherCreated(PublisherCreatedData {
            publisher_id: cmd.publisher_id,
            name: validate_name("name", &cmd.name, MAX_NAME_CHARS)?,
            created_at: Utc::now(),
        })])
    }

    pub fn update(&self, cmd: &UpdatePublisher) -> Result<Vec<PublisherEvent>, PublisherError> {
        self.ensure_active()?;

        Ok(vec![PublisherEvent::PublisherUpdated(PublisherUpdatedData {
            name: validate_name("name", &cmd.name, MAX_NAME_CHARS)?,
            updated_at: Utc::now(),
        })])
    }

    pub fn soft_delete(&self) -> Result<Vec<PublisherEvent>, PublisherError> {
        self.ensure_active()?;

        Ok(vec![PublisherEvent::PublisherSoftDeleted(
            PublisherSoftDeletedData {
                deleted_at: Utc::now(),
            },
        )])
    }

    pub fn restore(&self) -> Result<Vec<PublisherEvent>, PublisherError> {
        if !self.is_deleted() {
            return Err(PublisherError::NotDeleted);
        }

        Ok(vec![PublisherEvent::PublisherRestored(PublisherRestoredData {
            restored_at: Utc::now(),
        })])
    }

    fn ensure_active(&self) -> Result<(), PublisherError> {
        if self.is_deleted() {
            return Err(PublisherError::Deleted);
        }
        Ok(())
    }
}
