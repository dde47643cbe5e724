pub mod assign;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod http;
pub mod id;
pub mod import;
pub mod models;
pub mod parse;
pub mod resolve;
pub mod tag;


use std::{fs, io, net::SocketAddr, path::PathBuf, time::Duration};

use models::{AddressId, CartId, CustomerId, ModelKind};
use parse::ParseError;
use serde::{Deserialize, Serialize};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqlitePool, Transaction,
};
use tag::FullTag;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub http_address: SocketAddr,
}

impl Config {
    pub fn expand_paths(&mut self) -> Result<(), Error> {
        self.database_path = PathBuf::from(
            shellexpand::full(&self.database_path.to_string_lossy())
                .map_err(|_| Error::Expansion(self.database_path.to_string_lossy().to_string()))?
                .to_string(),
        );

        Ok(())
    }
}

pub struct Pricetag {
    pub pool: SqlitePool,
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl Pricetag {
    pub async fn from_path(config_path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = config_path.into();

        info!("Loading config from {path:?}");

        let text = fs::read_to_string(&path)?;

        let config: Config = toml::from_str(&text)?;

        let mut pricetag = Self::from_config(config).await?;
        pricetag.config_path = Some(path);

        Ok(pricetag)
    }

    pub async fn from_config(mut config: Config) -> Result<Self, Error> {
        config.expand_paths()?;

        debug!("Loaded config: {config:?}");

        if let Some(directory) = config.database_path.parent() {
            fs::create_dir_all(directory)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::migrate!().run(&pool).await?;

        Ok(Pricetag {
            pool,
            config_path: None,
            config,
        })
    }

    /// Takes the write lock up front; writes read their document first.
    /// Concurrent writers wait up to [`BUSY_TIMEOUT`] for it.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, Error> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("could not deserialize config file")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Migration(#[from] MigrateError),
    #[error("could not expand {0}")]
    Expansion(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("tag '{0}' not found")]
    TagNotFound(String),
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),
    #[error("address {0} not found")]
    AddressNotFound(AddressId),
    #[error("cart {0} not found")]
    CartNotFound(CartId),
    #[error("tag '{0}' already exists")]
    DuplicateTag(FullTag),
    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TagNotFound(_)
            | Error::CustomerNotFound(_)
            | Error::AddressNotFound(_)
            | Error::CartNotFound(_) => ErrorKind::NotFound,
            Error::DuplicateTag(_) => ErrorKind::Conflict,
            Error::Validation { .. } | Error::Parse(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    pub fn model(&self) -> Option<ModelKind> {
        match self {
            Error::TagNotFound(_) | Error::DuplicateTag(_) => Some(ModelKind::Tag),
            Error::CustomerNotFound(_) => Some(ModelKind::Customer),
            Error::AddressNotFound(_) => Some(ModelKind::Address),
            Error::CartNotFound(_) => Some(ModelKind::Cart),
            _ => None,
        }
    }
}
