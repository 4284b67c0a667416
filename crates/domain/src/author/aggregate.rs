//! Author aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, CatalogSettings};
use event_store::Version;

use crate::aggregate::{Aggregate, Lifecycle};
use crate::value_objects::{MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS, Translations, validate_name};

use super::{
    AuthorError, AuthorEvent, CreateAuthor, UpdateAuthor,
    events::{AuthorCreatedData, AuthorRestoredData, AuthorSoftDeletedData, AuthorUpdatedData},
};

/// Author aggregate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
    id: Option<AggregateId>,
    version: Version,
    lifecycle: Lifecycle,
    name: String,
    biography: Translations,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Author {
    type Event = AuthorEvent;
    type Error = AuthorError;

    fn aggregate_type() -> &'static str {
        "Author"
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
            AuthorEvent::AuthorCreated(data) => {
                self.id = Some(data.author_id);
                self.name = data.name;
                self.biography = data.biography;
                self.updated_at = Some(data.created_at);
            }
            AuthorEvent::AuthorUpdated(data) => {
                self.name = data.name;
                self.biography = data.biography;
                self.updated_at = Some(data.updated_at);
            }
            AuthorEvent::AuthorSoftDeleted(data) => {
                self.lifecycle = Lifecycle::Deleted;
                self.updated_at = Some(data.deleted_at);
            }
            AuthorEvent::AuthorRestored(data) => {
                self.lifecycle = Lifecycle::Active;
                self.updated_at = Some(data.restored_at);
            }
        }
    }
}

impl Author {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn biography(&self) -> &Translations {
        &self.biography
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
}

impl Author {
    pub fn create(
        &self,
        cmd: &CreateAuthor,
        settings: &CatalogSettings,
    ) -> Result<Vec<AuthorEvent>, AuthorError> {
        if self.id.is_some() {
            return Err(AuthorError::AlreadyCreated);
        }

        let name = validate_name("name", &cmd.name, MAX_NAME_CHARS)?;
        cmd.biography
            .validate("biography", settings, MAX_DESCRIPTION_CHARS, false)?;

        Ok(vec![AuthorEvent::AuthorCreated(AuthorCreatedData {
            author_id: cmd.author_id,
            name,
            biography: cmd.biography.clone(),
            created_at: Utc::now(),
        })])
    }

    pub fn update(
        &self,
        cmd: &UpdateAuthor,
        settings: &CatalogSettings,
    ) -> Result<Vec<AuthorEvent>, AuthorError> {
        self.ensure_active()?;

        let name = validate_name("name", &cmd.name, MAX_NAME_CHARS)?;
        cmd.biography
            .validate("biography", settings, MAX_DESCRIPTION_CHARS, false)?;

        Ok(vec![AuthorEvent::AuthorUpdated(AuthorUpdatedData {
            name,
            biography: cmd.biography.clone(),
            updated_at: Utc::now(),
        })])
    }

    pub fn soft_delete(&self) -> Result<Vec<AuthorEvent>, AuthorError> {
        self.ensure_active()?;

        Ok(vec![AuthorEvent::AuthorSoftDeleted(AuthorSoftDeletedData {
            deleted_at: Utc::now(),
        })])
    }

    pub fn restore(&self) -> Result<Vec<AuthorEvent>, AuthorError> {
        if !self.is_deleted() {
            return Err(AuthorError::NotDeleted);
        }

        Ok(vec![AuthorEvent::AuthorRestored(AuthorRestoredData {
            restored_at: Utc::now(),
        })])
    }

    fn ensure_active(&self) -> Result<(), AuthorError> {
        if self.is_deleted() {
            return Err(AuthorError::Deleted);
        }
        Ok(())
    }
}
