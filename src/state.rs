use crate::{
    config::Config,
    services::{CallService, MessageService},
    store::{
        memory::{MemoryMessageStore, MemoryUserDirectory},
        MessageStore, UserDirectory,
    },
    websocket::{presence::PresenceBroadcaster, router::DeliveryRouter, ConnectionRegistry},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub router: DeliveryRouter,
    pub presence: PresenceBroadcaster,
    pub messages: Arc<MessageService>,
    pub calls: CallService,
    pub directory: Arc<dyn UserDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble the full service graph on top of the in-memory stores.
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_stores(
            config,
            Arc::new(MemoryMessageStore::new()),
            Arc::new(MemoryUserDirectory::new()),
        )
    }

    /// Assemble the service graph against caller-provided stores. Tests use
    /// this to keep a handle on the concrete store for seeding fixtures.
    pub fn with_stores(
        config: Arc<Config>,
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let registry = ConnectionRegistry::new();
        let router = DeliveryRouter::new(registry.clone());
        let presence = PresenceBroadcaster::new(registry.clone(), directory.clone());
        let messages = Arc::new(MessageService::new(
            store,
            directory.clone(),
            router.clone(),
            &config,
        ));
        let calls = CallService::new(router.clone());

        Self {
            registry,
            router,
            presence,
            messages,
            calls,
            directory,
            config,
        }
    }
}
