//! Author commands.

use common::AggregateId;

use crate::command::Command;
use crate::value_objects::Translations;

use super::Author;

#[derive(Debug, Clone)]
pub struct CreateAuthor {
    pub author_id: AggregateId,
    pub name: String,
    pub biography: Translations,
}

impl CreateAuthor {
    pub fn new(name: impl Into<String>, biography: Translations) -> Self {
        Self {
            author_id: AggregateId::new(),
            name: name.into(),
            biography,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateAuthor {
    pub author_id: AggregateId,
    pub name: String,
    pub biography: Translations,
}

#[derive(Debug, Clone)]
pub struct SoftDeleteAuthor {
    pub author_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct RestoreAuthor {
    pub author_id: AggregateId,
}

macro_rules! author_command {
    ($($command:ty),* $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Author;

                fn aggregate_id(&self) -> AggregateId {
                    self.author_id
                }
            }
        )*
    };
}

author_command!(CreateAuthor, UpdateAuthor, SoftDeleteAuthor, RestoreAuthor);
