//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `ChatService` is generic over the table and model traits; AppState pins it
//! to the concrete infra implementations.

use std::path::Path;
use std::sync::Arc;

use catsim_core::chat::service::ChatService;
use catsim_infra::config::{database_url, load_config, resolve_data_dir};
use catsim_infra::llm::{AnyChatModel, bedrock_token_from_env, build_chat_model};
use catsim_infra::sqlite::conversation::SqliteConversationTable;
use catsim_infra::sqlite::pool::DatabasePool;
use catsim_types::config::CatsimConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteConversationTable, AnyChatModel>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<CatsimConfig>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize from the environment: resolve the data directory, load the
    /// configuration, pick the model, connect to the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await?;
        let model = build_chat_model(&config.model, bedrock_token_from_env())?;

        Self::build(&data_dir, config, model).await
    }

    /// Wire the state from already-resolved parts.
    ///
    /// Creates the conversation table if it does not exist yet.
    pub async fn build(
        data_dir: &Path,
        config: CatsimConfig,
        model: AnyChatModel,
    ) -> anyhow::Result<Self> {
        let db_url = database_url(&config, data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;

        let table = SqliteConversationTable::new(db_pool.clone(), &config.table_name)?;
        table.ensure_schema().await?;

        tracing::info!(
            table = %config.table_name,
            model = %config.model.provider,
            data_dir = %data_dir.display(),
            "Application state initialized"
        );

        let chat_service =
            ChatService::new(table, model).with_allow_empty_message(config.allow_empty_message);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
            db_pool,
        })
    }
}
