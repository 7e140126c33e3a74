//! Recording fakes for pipeline tests
//!
//! Each fake counts its calls so tests can assert which stages ran and how
//! many times.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use books_etl::{Book, BookEntity, BookRepository, CsvParser, ObjectReader, RecordParser};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("books_etl=debug")))
        .with_test_writer()
        .try_init();
}

pub fn book(title: &str, author: &str, genre: &str, period: &str) -> Book {
    Book {
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        period: period.to_string(),
    }
}

/// Object store holding a fixed set of named objects
#[derive(Default)]
pub struct FakeReader {
    objects: HashMap<String, Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeReader {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(name.to_string(), data.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectReader for FakeReader {
    async fn read_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.calls.lock().unwrap().push(name.to_string());
        self.objects.get(name).cloned()
    }
}

/// Parser that delegates to the real CSV parser or fails on demand
pub struct CountingParser {
    fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl CountingParser {
    pub fn real() -> Self {
        Self {
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordParser for CountingParser {
    fn parse(&self, data: &[u8]) -> Result<Vec<Book>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => CsvParser::new().parse(data),
        }
    }
}

/// How the fake repository misbehaves on a given 1-based save call
#[derive(Clone, Copy)]
pub enum Fault {
    Error(usize),
    Panic(usize),
}

/// In-memory repository that records every save in call order
#[derive(Default)]
pub struct RecordingRepository {
    fault: Option<Fault>,
    pub saved: Mutex<Vec<BookEntity>>,
    pub table: Mutex<HashMap<(String, String), BookEntity>>,
    pub calls: AtomicUsize,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fault: Some(Fault::Error(call)),
            ..Self::default()
        }
    }

    pub fn panicking_on(call: usize) -> Self {
        Self {
            fault: Some(Fault::Panic(call)),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<BookEntity> {
        self.saved.lock().unwrap().clone()
    }

    pub fn stored_len(&self) -> usize {
        self.table.lock().unwrap().len()
    }
}

#[async_trait]
impl BookRepository for RecordingRepository {
    async fn save(&self, entity: &BookEntity) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        match self.fault {
            Some(Fault::Error(n)) if n == call => return Err(anyhow!("DynamoDB unavailable")),
            Some(Fault::Panic(n)) if n == call => panic!("connection pool poisoned"),
            _ => {},
        }

        // Same contract as the DynamoDB writer
        if !entity.has_complete_key() {
            return Err(anyhow!("Book key is incomplete"));
        }

        self.saved.lock().unwrap().push(entity.clone());
        self.table
            .lock()
            .unwrap()
            .insert((entity.author.clone(), entity.genre.clone()), entity.clone());
        Ok(())
    }

    async fn find_by_author_and_genre(&self, author: &str, genre: &str) -> Result<Option<BookEntity>> {
        Ok(self
            .table
            .lock()
            .unwrap()
            .get(&(author.to_string(), genre.to_string()))
            .cloned())
    }

    async fn delete(&self, author: &str, genre: &str) -> Result<()> {
        self.table
            .lock()
            .unwrap()
            .remove(&(author.to_string(), genre.to_string()));
        Ok(())
    }
}
