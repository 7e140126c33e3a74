//! Books ETL - load one CSV file of books from S3 into DynamoDB

use books_common::logging::{init_logging, LogConfig, LogLevel};
use books_etl::{
    aws,
    config::{Config, DEFAULT_CONFIG_FILE},
    error::EXIT_CONFIG,
    BookApplication, CsvParser, DynamoBookRepository, S3Bucket,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "books-etl")]
#[command(author, version, about = "Load a CSV file of books from S3 into DynamoDB")]
struct Cli {
    /// Object name of the CSV file, relative to the configured store URL
    file_name: String,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "BOOKS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("books-etl")
        .build();

    // Environment variables take precedence over flags
    let log_config = match log_config.clone().merge_env() {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Ignoring invalid logging environment: {:#}", e);
            log_config
        },
    };

    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, path = %cli.config.display(), "Failed to load configuration");
            return ExitCode::from(EXIT_CONFIG);
        },
    };

    info!(
        store_url = %config.store,
        table = %config.table_name,
        "Configuration loaded"
    );

    let sdk_config = aws::load_sdk_config(&config.aws).await;

    let app = BookApplication::new(
        Arc::new(S3Bucket::new(
            aws::s3_client(&sdk_config, &config.aws),
            config.store.clone(),
        )),
        Arc::new(CsvParser::new()),
        Arc::new(DynamoBookRepository::new(
            aws::dynamodb_client(&sdk_config),
            config.table_name.clone(),
        )),
    );

    match app.process_csv_file(&cli.file_name).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_code()),
    }
}
