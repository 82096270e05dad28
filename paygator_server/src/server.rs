use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::future::join_all;
use log::*;
use paygator_engine::{events::EventProducers, PaygatorDatabase, PaymentApi, PayoutFlowApi};

use crate::{
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    integrations::mobile_money::{create_payout_event_handlers, MobileMoneyDisburser},
    middleware::{ApiKey, ApiKeyMiddlewareFactory},
    routes::{
        health,
        AuditLogRoute,
        CreatePaymentRoute,
        DistributePaymentsRoute,
        PaymentByIdRoute,
        PaymentWebhookRoute,
        PayoutsForPaymentRoute,
        ProcessVendorB2cRoute,
        SearchPaymentsRoute,
        SearchPayoutsRoute,
    },
};

#[cfg(feature = "postgres")]
pub type ServerDatabase = paygator_engine::PostgresDatabase;
#[cfg(not(feature = "postgres"))]
pub type ServerDatabase = paygator_engine::SqliteDatabase;

const MAX_DB_CONNECTIONS: u32 = 25;
const EVENT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let mut db = ServerDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("🗃️ Running database migrations");
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let disburser = MobileMoneyDisburser::new(config.mobile_money.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_payout_event_handlers();
    let producers = handlers.producers();
    let tasks = handlers.start_handlers();
    info!("📬️ Payout event handlers started");
    let srv = create_server_instance(config, db.clone(), disburser, producers)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    // The producers went away with the server, so the handlers finish once their queues are empty
    if tokio::time::timeout(EVENT_FLUSH_TIMEOUT, join_all(tasks)).await.is_err() {
        warn!("📬️ Payout event handlers did not finish within {EVENT_FLUSH_TIMEOUT:?}");
    }
    if let Err(e) = db.close().await {
        warn!("🗃️ Could not close the database cleanly. {e}");
    }
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: ServerDatabase,
    disburser: MobileMoneyDisburser,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let payout_config = config.payouts.payout_config()?;
    info!(
        "🪛️ Vendor payouts accept {} numbers with prefixes {}",
        payout_config.phone_rules.country_code(),
        payout_config.phone_rules.accepted_prefixes().join(",")
    );
    let api_key = ApiKey::new(config.api_key.clone());
    let proxy_config = ProxyConfig::from_config(&config);
    let srv = HttpServer::new(move || {
        let payment_api = PaymentApi::new(db.clone());
        let payout_api = PayoutFlowApi::new(db.clone(), disburser.clone(), payout_config.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("paygator::access_log"))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(payout_api))
            .app_data(web::Data::new(api_key.clone()))
            .app_data(web::Data::new(proxy_config));
        let public_scope = web::scope("/api/v1")
            .service(ProcessVendorB2cRoute::<ServerDatabase, MobileMoneyDisburser>::new())
            .service(CreatePaymentRoute::<ServerDatabase>::new())
            .service(PaymentByIdRoute::<ServerDatabase>::new())
            .service(PaymentWebhookRoute::<ServerDatabase>::new());
        // Routes that require the API key
        let admin_scope = web::scope("/admin/api")
            .wrap(ApiKeyMiddlewareFactory::new())
            .service(SearchPaymentsRoute::<ServerDatabase>::new())
            .service(PayoutsForPaymentRoute::<ServerDatabase, MobileMoneyDisburser>::new())
            .service(SearchPayoutsRoute::<ServerDatabase, MobileMoneyDisburser>::new())
            .service(AuditLogRoute::<ServerDatabase>::new())
            .service(DistributePaymentsRoute::<ServerDatabase, MobileMoneyDisburser>::new());
        app.service(health).service(public_scope).service(admin_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidQuery(err.to_string()).into())
}
