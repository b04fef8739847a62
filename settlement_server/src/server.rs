use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use log::*;
use settlement_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    SettlementFlowApi,
    SqliteDatabase,
};
use transfer_tools::TransferApi;

use crate::{
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    integrations::PayoutDispatcher,
    routes::{health, ChargeWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let transfer_api =
        TransferApi::new(config.transfer_config.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let payouts = PayoutDispatcher::new(transfer_api);
    let handlers = EventHandlers::new(config.event_buffer_size, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, payouts, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The server's own subscribers to the settlement hooks. Operational logging only; anything user-facing goes
/// through the notification collaborator inside the pipeline.
fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_settled(|ev| {
        info!("🪝️ Order {} settled for {}.", ev.order.order_id, ev.order.total_amount);
        Box::pin(async {})
    });
    hooks.on_order_annulled(|ev| {
        info!("🪝️ Order {} annulled as {}.", ev.order.order_id, ev.status);
        Box::pin(async {})
    });
    hooks.on_payout_failed(|ev| {
        warn!("🪝️ Payout of {} to shop {} for order {} failed: {}", ev.amount, ev.shop_id, ev.order_id, ev.message);
        Box::pin(async {})
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    payouts: PayoutDispatcher,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let webhook_auth = config.webhook_auth.clone();
    let proxy_config = ProxyConfig::from(&config);
    let srv = HttpServer::new(move || {
        let api = SettlementFlowApi::new(db.clone(), payouts.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("msg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(webhook_auth.clone()))
            .app_data(web::Data::new(proxy_config))
            .service(health)
            .service(ChargeWebhookRoute::<SqliteDatabase, PayoutDispatcher>::new())
    })
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("🚀️ Server started at {}:{}", config.host, config.port);
    Ok(srv)
}
