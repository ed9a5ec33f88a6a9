//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::EventBus;
use crate::persistence::Store;
use crate::service::{
    AccountService, BadgeEngine, CatalogService, CheckInService, Clock, ExpirySweeper,
    RandomCodeGenerator, RedemptionService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage backend.
    pub store: Store,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Check-in settlement.
    pub check_ins: Arc<CheckInService>,
    /// Badge evaluation.
    pub badges: Arc<BadgeEngine>,
    /// Redemption lifecycle.
    pub redemptions: Arc<RedemptionService>,
    /// Catalog reads and writes.
    pub catalog: Arc<CatalogService>,
    /// Account read views.
    pub accounts: Arc<AccountService>,
    /// Expiry sweeper shared by the background loop and the admin endpoint.
    pub sweeper: Arc<ExpirySweeper>,
}

impl AppState {
    /// Wires every service on top of `store` and `clock`.
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let catalog = CatalogService::new(
            store.clone(),
            Arc::clone(&clock),
            config.catalog_cache_ttl(),
        );
        let codes = Arc::new(RandomCodeGenerator::new(
            config.policy.redemption_code_prefix.clone(),
            config.policy.redemption_code_length,
        ));
        let redemptions = RedemptionService::new(
            store.clone(),
            Arc::clone(&clock),
            event_bus.clone(),
            codes,
            catalog.clone(),
        );
        let sweeper = ExpirySweeper::new(
            store.clone(),
            Arc::clone(&clock),
            redemptions.clone(),
            catalog.clone(),
        );

        Self {
            check_ins: Arc::new(CheckInService::new(
                store.clone(),
                Arc::clone(&clock),
                event_bus.clone(),
                config.policy.clone(),
            )),
            badges: Arc::new(BadgeEngine::new(store.clone(), clock, event_bus.clone())),
            accounts: Arc::new(AccountService::new(store.clone(), catalog.clone())),
            redemptions: Arc::new(redemptions),
            catalog: Arc::new(catalog),
            sweeper: Arc::new(sweeper),
            store,
            event_bus,
        }
    }
}
