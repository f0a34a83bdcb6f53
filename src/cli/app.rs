//! Wiring of configuration, storage and collaborators for CLI commands.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::compute::{HttpComputeBackend, MockComputeBackend};
use crate::adapters::notifier::{notifier_from_config, LogNotifier};
use crate::adapters::publisher::{HttpLayerPublisher, MockLayerPublisher};
use crate::adapters::sqlite::{create_migrated_test_pool, initialize_database, repositories};
use crate::domain::models::Config;
use crate::domain::ports::{ComputeBackend, LayerPublisher, Notifier, TaskRecordFilter};
use crate::infrastructure::config::{ConfigLoader, MapConfigStore};
use crate::services::map_engine::{EngineServices, Repositories};
use crate::services::orchestrator::Orchestrator;
use crate::services::plugin::PluginFactory;

/// Everything a command needs, built once per invocation.
pub struct App {
    pub config: Config,
    pub config_dir: PathBuf,
    pub repos: Repositories,
}

impl App {
    /// Open the database (applying pending migrations) for `config`.
    pub async fn open(config: Config, config_path: Option<&Path>) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.path))?;
        Ok(Self {
            config_dir: ConfigLoader::config_dir(config_path),
            config,
            repos: repositories(pool),
        })
    }

    /// Orchestrator over the configured compute backend, publisher and notifier.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let backend = HttpComputeBackend::new(&self.config.compute).context("Failed to build compute client")?;
        let publisher = HttpLayerPublisher::new(&self.config.publisher).context("Failed to build publisher client")?;
        Ok(self.orchestrator_with(
            self.repos.clone(),
            Arc::new(backend),
            Arc::new(publisher),
            notifier_from_config(&self.config.notifier),
        ))
    }

    /// Orchestrator over an in-memory copy of the store with in-memory
    /// collaborators. Nothing it does is persisted or sent anywhere.
    pub async fn dry_run_orchestrator(&self) -> Result<Orchestrator> {
        let pool = create_migrated_test_pool()
            .await
            .context("Failed to create scratch database")?;
        let scratch = repositories(pool);

        for area in self.repos.areas.list(false).await? {
            scratch.areas.insert(&area).await?;
        }
        for record in self.repos.tasks.list(TaskRecordFilter::default()).await? {
            scratch.tasks.insert(&record).await?;
        }

        Ok(self.orchestrator_with(
            scratch,
            Arc::new(MockComputeBackend::new()),
            Arc::new(MockLayerPublisher::new()),
            Arc::new(LogNotifier),
        ))
    }

    /// Orchestrator over explicit repositories and collaborators, with the
    /// configured catalog and plugin map configuration.
    pub fn orchestrator_with(
        &self,
        repos: Repositories,
        backend: Arc<dyn ComputeBackend>,
        publisher: Arc<dyn LayerPublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Orchestrator {
        let services = Arc::new(EngineServices::new(
            repos,
            backend,
            publisher,
            notifier,
            &self.config.publisher.workspace,
        ));
        let store = MapConfigStore::new(&self.config_dir, &self.config.plugins_dir);
        let factory = PluginFactory::from_store(self.config.catalog.clone(), &store);
        Orchestrator::new(services, factory)
    }
}
