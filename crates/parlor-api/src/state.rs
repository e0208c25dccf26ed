//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over the repository and gateway traits, but
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use parlor_core::chat::store::ChatStore;
use parlor_core::identity::IdentityProvider;
use parlor_core::service::bot::BotService;
use parlor_infra::config::{load_global_config, resolve_data_dir};
use parlor_infra::identity::LocalIdentity;
use parlor_infra::llm::openai::OpenAiGateway;
use parlor_infra::sqlite::bot::SqliteBotRepository;
use parlor_infra::sqlite::chat::SqliteChatRepository;
use parlor_infra::sqlite::pool::DatabasePool;
use parlor_types::config::GlobalConfig;
use parlor_types::identity::UserId;

/// Concrete type aliases for the service generics pinned to infra.
pub type ConcreteBotService = BotService<SqliteBotRepository, SqliteChatRepository>;
pub type ConcreteChatStore = ChatStore<SqliteChatRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub bot_service: Arc<ConcreteBotService>,
    pub chat_store: Arc<ConcreteChatStore>,
    pub gateway: Arc<OpenAiGateway>,
    pub identity: LocalIdentity,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parlor.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let bot_repo = SqliteBotRepository::new(db_pool.clone());
        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        let bot_service = BotService::new(bot_repo, chat_repo);

        let chat_store = ChatStore::new(SqliteChatRepository::new(db_pool.clone()));

        // The key is read once at startup and handed to the gateway wrapped
        // in SecretString; an empty key surfaces as an auth failure on the
        // first completion rather than at launch.
        let api_key = match std::env::var(&config.completion.api_key_env) {
            Ok(key) => SecretString::from(key),
            Err(_) => {
                tracing::warn!(
                    var = %config.completion.api_key_env,
                    "Completion API key env var not set; completions will fail"
                );
                SecretString::from(String::new())
            }
        };
        let gateway = OpenAiGateway::new(&config.completion, api_key);

        let identity = LocalIdentity::from_config(&config.identity);

        Ok(Self {
            bot_service: Arc::new(bot_service),
            chat_store: Arc::new(chat_store),
            gateway: Arc::new(gateway),
            identity,
            config,
            data_dir,
            db_pool,
        })
    }

    /// The user the CLI acts as, from `[identity]` in config.toml.
    pub fn current_user(&self) -> UserId {
        self.identity
            .current_user()
            .unwrap_or_else(|| UserId::new("local"))
    }
}
