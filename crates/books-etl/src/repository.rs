//! Key-value persistence of books
//!
//! Items are keyed by `(author, genre)`: partition key `author`, sort key
//! `genre`. Saving is a blind upsert with no read before the write and no
//! condition expression, so the last write for a key wins.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::book::BookEntity;

pub const ATTR_AUTHOR: &str = "author";
pub const ATTR_GENRE: &str = "genre";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_PERIOD: &str = "period";

/// Storage for book entities keyed by `(author, genre)`
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Create or overwrite the entity at its key
    async fn save(&self, entity: &BookEntity) -> Result<()>;

    async fn find_by_author_and_genre(&self, author: &str, genre: &str) -> Result<Option<BookEntity>>;

    /// Remove the entity at the key; removing an absent key is not an error
    async fn delete(&self, author: &str, genre: &str) -> Result<()>;
}

/// DynamoDB-backed repository for one table
#[derive(Clone)]
pub struct DynamoBookRepository {
    client: Client,
    table_name: String,
}

impl DynamoBookRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

fn key_attributes(author: &str, genre: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_AUTHOR.to_string(), AttributeValue::S(author.to_string())),
        (ATTR_GENRE.to_string(), AttributeValue::S(genre.to_string())),
    ])
}

/// Item attributes for an entity
pub fn to_item(entity: &BookEntity) -> HashMap<String, AttributeValue> {
    let mut item = key_attributes(&entity.author, &entity.genre);
    item.insert(ATTR_TITLE.to_string(), AttributeValue::S(entity.title.clone()));
    item.insert(ATTR_PERIOD.to_string(), AttributeValue::S(entity.period.clone()));
    item
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(other) => Err(anyhow!("Attribute '{}' is not a string: {:?}", name, other)),
        None => Err(anyhow!("Attribute '{}' is missing", name)),
    }
}

/// Rebuild an entity from item attributes
///
/// Key attributes are required; `title` and `period` default to empty.
pub fn from_item(item: &HashMap<String, AttributeValue>) -> Result<BookEntity> {
    let optional = |name: &str| -> Result<String> {
        if item.contains_key(name) {
            string_attr(item, name)
        } else {
            Ok(String::new())
        }
    };

    Ok(BookEntity {
        author: string_attr(item, ATTR_AUTHOR)?,
        genre: string_attr(item, ATTR_GENRE)?,
        title: optional(ATTR_TITLE)?,
        period: optional(ATTR_PERIOD)?,
    })
}

#[async_trait]
impl BookRepository for DynamoBookRepository {
    #[instrument(skip(self, entity), fields(author = %entity.author, genre = %entity.genre))]
    async fn save(&self, entity: &BookEntity) -> Result<()> {
        if !entity.has_complete_key() {
            bail!(
                "Book key is incomplete: author={:?}, genre={:?} (both must be non-empty)",
                entity.author,
                entity.genre
            );
        }

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(entity)))
            .send()
            .await
            .with_context(|| format!("Failed to put item into DynamoDB table {}", self.table_name))?;

        debug!(table = %self.table_name, "Saved book");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_author_and_genre(&self, author: &str, genre: &str) -> Result<Option<BookEntity>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(author, genre)))
            .send()
            .await
            .with_context(|| format!("Failed to get item from DynamoDB table {}", self.table_name))?;

        response.item().map(from_item).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, author: &str, genre: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(author, genre)))
            .send()
            .await
            .with_context(|| format!("Failed to delete item from DynamoDB table {}", self.table_name))?;

        debug!(table = %self.table_name, "Deleted book");
        Ok(())
    }
}
