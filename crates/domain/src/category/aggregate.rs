//! Category aggregate and its commands.

use chrono::{DateTime, Utc};
use common::{AggregateId, CatalogSettings};
use event_store::Version;

use crate::aggregate::{Aggregate, Lifecycle};
use crate::command::Command;
use crate::value_objects::{MAX_CATEGORY_NAME_CHARS, Translations};

use super::{
    CategoryError, CategoryEvent,
    events::{
        CategoryCreatedData, CategoryRestoredData, CategorySoftDeletedData, CategoryUpdatedData,
    },
};

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub category_id: AggregateId,
    pub name: Translations,
}

impl CreateCategory {
    pub fn new(name: Translations) -> Self {
        Self {
            category_id: AggregateId::new(),
            name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCategory {
    pub category_id: AggregateId,
    pub name: Translations,
}

#[derive(Debug, Clone)]
pub struct SoftDeleteCategory {
    pub category_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct RestoreCategory {
    pub category_id: AggregateId,
}

macro_rules! category_command {
    ($($command:ty),* $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Category;

                fn aggregate_id(&self) -> AggregateId {
                    self.category_id
                }
            }
        )*
    };
}

category_command!(
    CreateCategory,
    UpdateCategory,
    SoftDeleteCategory,
    RestoreCategory
);

/// Category aggregate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    id: Option<AggregateId>,
    version: Version,
    lifecycle: Lifecycle,
    name: Translations,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Category {
    type Event = CategoryEvent;
    type Error = CategoryError;

    fn aggregate_type() -> &'static str {
        "Category"
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
            CategoryEvent::CategoryCreated(data) => {
                self.id = Some(data.category_id);
                self.name = data.name;
                self.updated_at = Some(data.created_at);
            }
            CategoryEvent::CategoryUpdated(data) => {
                self.name = data.name;
                self.updated_at = Some(data.updated_at);
            }
            CategoryEvent::CategorySoftDeleted(data) => {
                self.lifecycle = Lifecycle::Deleted;
                self.updated_at = Some(data.deleted_at);
            }
            CategoryEvent::CategoryRestored(data) => {
                self.lifecycle = Lifecycle::Active;
                self.updated_at = Some(data.restored_at);
            }
        }
    }
}

impl Category {
    pub fn name(&self) -> &Translations {
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

    pub fn create(
        &self,
        cmd: &CreateCategory,
        settings: &CatalogSettings,
    ) -> Result<Vec<CategoryEvent>, CategoryError> {
        if self.id.is_some() {
            return Err(CategoryError::AlreadyCreated);
        }
        cmd.name
            .validate("name", settings, MAX_CATEGORY_NAME_CHARS, true)?;

        Ok(vec![CategoryEvent::CategoryCreated(CategoryCreatedData {
            category_id: cmd.category_id,
            name: cmd.name.clone(),
            created_at: Utc::now(),
        })])
    }

    pub fn update(
        &self,
        cmd: &UpdateCategory,
        settings: &CatalogSettings,
    ) -> Result<Vec<CategoryEvent>, CategoryError> {
        self.ensure_active()?;
        cmd.name
            .validate("name", settings, MAX_CATEGORY_NAME_CHARS, true)?;

        Ok(vec![CategoryEvent::CategoryUpdated(CategoryUpdatedData {
            name: cmd.name.clone(),
            updated_at: Utc::now(),
        })])
    }

    pub fn soft_delete(&self) -> Result<Vec<CategoryEvent>, CategoryError> {
        self.ensure_active()?;

        Ok(vec![CategoryEvent::CategorySoftDeleted(
            CategorySoftDeletedData {
                deleted_at: Utc::now(),
            },
        )])
    }

    pub fn restore(&self) -> Result<Vec<CategoryEvent>, CategoryError> {
        if !self.is_deleted() {
            return Err(CategoryError::NotDeleted);
        }

        Ok(vec![CategoryEvent::CategoryRestored(CategoryRestoredData {
            restored_at: Utc::now(),
        })])
    }

    fn ensure_active(&self) -> Result<(), CategoryError> {
        if self.is_deleted() {
            return Err(CategoryError::Deleted);
        }
        Ok(())
    }
}
