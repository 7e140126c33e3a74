//! CSV file processing pipeline
//!
//! One run reads a file from the object store, parses it into books and
//! upserts every book into the repository, strictly in file order:
//!
//! ```text
//! read ──(absent)──────────────────────────────► NotFound
//!   │
//! parse ─(error)───────────────────────────────► Processing
//!   │
//! map + save, row by row ─(first failed save)──► Processing
//!   │
//! done (row count)
//! ```
//!
//! A panic inside any collaborator is caught at the run boundary and
//! reported as `Processing` too, so callers only ever see two error kinds.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::book::{Book, BookEntity};
use crate::error::{ProcessError, ProcessResult};
use crate::parser::RecordParser;
use crate::repository::BookRepository;
use crate::storage::ObjectReader;

/// Sequences reader, parser and repository for one file at a time
#[derive(Clone)]
pub struct BookApplication {
    reader: Arc<dyn ObjectReader>,
    parser: Arc<dyn RecordParser>,
    repository: Arc<dyn BookRepository>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

impl BookApplication {
    pub fn new(
        reader: Arc<dyn ObjectReader>,
        parser: Arc<dyn RecordParser>,
        repository: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            reader,
            parser,
            repository,
        }
    }

    /// Process one CSV file end to end, returning the number of books saved
    ///
    /// # Errors
    ///
    /// - [`ProcessError::NotFound`] when the reader has nothing for `file_name`;
    ///   neither parser nor repository is invoked.
    /// - [`ProcessError::Processing`] when parsing fails (no saves happen), when
    ///   a save fails (earlier rows stay saved, later rows are never attempted),
    ///   or when a collaborator panics.
    #[instrument(skip(self))]
    pub async fn process_csv_file(&self, file_name: &str) -> ProcessResult<usize> {
        info!(file_name, "Starting CSV file processing");

        let outcome = AssertUnwindSafe(self.run(file_name))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ProcessError::processing(
                    format!("Unexpected error while processing file: {}", file_name),
                    panic_message(payload),
                ))
            });

        match &outcome {
            Ok(count) => info!(file_name, count, "Processing completed successfully"),
            Err(e @ ProcessError::NotFound { .. }) => error!(error = %e, file_name, "File not found"),
            Err(e) => error!(error = ?e, file_name, "Failed to process file"),
        }

        outcome
    }

    async fn run(&self, file_name: &str) -> ProcessResult<usize> {
        let data = self.read_file(file_name).await?;
        let books = self.parse_books(file_name, &data)?;
        self.save_books(books).await
    }

    async fn read_file(&self, file_name: &str) -> ProcessResult<Vec<u8>> {
        info!(file_name, "Reading file from object store");

        let data = self
            .reader
            .read_bytes(file_name)
            .await
            .ok_or_else(|| ProcessError::not_found(file_name))?;

        info!(file_name, bytes = data.len(), "File read from object store");
        Ok(data)
    }

    fn parse_books(&self, file_name: &str, data: &[u8]) -> ProcessResult<Vec<Book>> {
        info!(file_name, "Parsing CSV into books");

        let books = self.parser.parse(data).map_err(|e| {
            ProcessError::processing(format!("Failed to parse CSV file: {}", file_name), e)
        })?;

        if books.is_empty() {
            warn!(file_name, "No books found in CSV file");
        } else {
            info!(file_name, count = books.len(), "CSV parsed");
        }

        Ok(books)
    }

    async fn save_books(&self, books: Vec<Book>) -> ProcessResult<usize> {
        let total = books.len();
        info!(count = total, "Saving books");

        // No transaction spans this loop: rows saved before a failure stay
        // saved. Re-running the file is safe because every save is an upsert.
        for book in books {
            let entity = BookEntity::from(book);
            self.save_entity(&entity).await?;
        }

        info!(count = total, "All books saved");
        Ok(total)
    }

    async fn save_entity(&self, entity: &BookEntity) -> ProcessResult<()> {
        match self.repository.save(entity).await {
            Ok(()) => {
                debug!(author = %entity.author, genre = %entity.genre, "Book saved");
                Ok(())
            },
            Err(e) => {
                error!(error = ?e, author = %entity.author, genre = %entity.genre, "Failed to save book");
                Err(ProcessError::processing(
                    format!("Failed to save book: author={}, genre={}", entity.author, entity.genre),
                    e,
                ))
            },
        }
    }
}
