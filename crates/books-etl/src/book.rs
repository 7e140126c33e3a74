//! Book record and persistence entity
//!
//! [`Book`] is one parsed CSV row. [`BookEntity`] is the same data in the
//! shape the key-value table stores, keyed by `(author, genre)`. Converting
//! between them is a plain field move in either direction.

use serde::{Deserialize, Serialize};

/// One CSV row
///
/// Columns are matched by header name. The Portuguese headers of the first
/// feeds (`titulo`, `autor`, `genero`, `periodo`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Book {
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(alias = "autor")]
    pub author: String,
    #[serde(alias = "genero")]
    pub genre: String,
    #[serde(alias = "periodo")]
    pub period: String,
}

/// Persistence shape of a [`Book`]
///
/// `author` is the partition key and `genre` the sort key. Two books sharing
/// both overwrite each other, last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookEntity {
    pub author: String,
    pub genre: String,
    pub title: String,
    pub period: String,
}

impl BookEntity {
    /// Whether both key attributes are present
    pub fn has_complete_key(&self) -> bool {
        !self.author.trim().is_empty() && !self.genre.trim().is_empty()
    }
}

impl From<Book> for BookEntity {
    fn from(book: Book) -> Self {
        Self {
            author: book.author,
            genre: book.genre,
            title: book.title,
            period: book.period,
        }
    }
}

impl From<BookEntity> for Book {
    fn from(entity: BookEntity) -> Self {
        Self {
            title: entity.title,
            author: entity.author,
            genre: entity.genre,
            period: entity.period,
        }
    }
}
