//! Service layer for business logic
//!
//! Shared between the HTTP handlers and the CLI.

pub mod bulk;
pub mod code_generator;
mod link_service;
pub mod resolver;
pub mod sweeper;

pub use bulk::{BulkOutcome, BulkProcessor, BulkRow, DecodedRow, RowDecodeError};
pub use code_generator::{CodeGenerator, validate_custom_code};
pub use link_service::*;
pub use resolver::{ResolveOutcome, Resolver};
pub use sweeper::Sweeper;

use std::sync::Arc;

use crate::cache::CacheFactory;
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::storage::LinkStore;

/// All services wired over one store and one cache
#[derive(Clone)]
pub struct AppServices {
    pub links: Arc<LinkService>,
    pub resolver: Arc<Resolver>,
    pub bulk: Arc<BulkProcessor>,
    pub sweeper: Arc<Sweeper>,
}

impl AppServices {
    pub fn build(store: Arc<dyn LinkStore>, config: &StaticConfig) -> Result<Self> {
        let cache = CacheFactory::create(&config.cache);
        let generator = CodeGenerator::from_config(&config.codes)?;
        let settings = LinkSettings::from_config(config)?;

        let links = Arc::new(LinkService::new(
            store.clone(),
            cache.clone(),
            generator,
            settings,
        ));
        let resolver = Arc::new(Resolver::new(store.clone(), cache));
        let bulk = Arc::new(BulkProcessor::new(
            links.clone(),
            config.bulk.max_rows,
            config.bulk.concurrency,
        ));
        let sweeper = Arc::new(Sweeper::new(store, config.links.sweep_grace()?));

        Ok(Self {
            links,
            resolver,
            bulk,
            sweeper,
        })
    }
}
