//! Books ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Batch job that loads a CSV file of books from an S3 bucket and upserts
//! every row into a DynamoDB table keyed by `(author, genre)`.
//!
//! # Components
//!
//! - [`storage`]: object store reader, absent or unreadable objects are `None`
//! - [`parser`]: CSV body to [`book::Book`] rows
//! - [`book`]: row and persistence entity, with the mapping between them
//! - [`repository`]: key-value writer plus lookup and delete by key
//! - [`application`]: the pipeline and its error translation
//!
//! # Example
//!
//! ```no_run
//! use books_etl::{aws, config::Config, BookApplication, CsvParser, DynamoBookRepository, S3Bucket};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("application.yaml")?;
//!     let sdk_config = aws::load_sdk_config(&config.aws).await;
//!
//!     let app = BookApplication::new(
//!         Arc::new(S3Bucket::new(aws::s3_client(&sdk_config, &config.aws), config.store.clone())),
//!         Arc::new(CsvParser::new()),
//!         Arc::new(DynamoBookRepository::new(aws::dynamodb_client(&sdk_config), &config.table_name)),
//!     );
//!
//!     let saved = app.process_csv_file("books.csv").await?;
//!     println!("{saved} books saved");
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod aws;
pub mod book;
pub mod config;
pub mod error;
pub mod parser;
pub mod repository;
pub mod storage;

pub use application::BookApplication;
pub use book::{Book, BookEntity};
pub use error::{ProcessError, ProcessResult};
pub use parser::{CsvParser, RecordParser};
pub use repository::{BookRepository, DynamoBookRepository};
pub use storage::{ObjectReader, S3Bucket, StoreUrl};
