use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{
    accrual::HttpAccrualResolver,
    AccountApi,
    AuthApi,
    OrderFlowApi,
    SqliteDatabase,
    WithdrawalApi,
};
use tokio::sync::watch;

use crate::{
    accrual_worker::start_accrual_worker,
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        BalanceRoute,
        LoginRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawAliasRoute,
        WithdrawRoute,
    },
};

/// Opens (and if necessary creates and migrates) the database, starts the accrual worker and serves the API until
/// the server is stopped. The worker is then signalled and awaited before returning.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_directory(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate database. {e}")))?;
    let resolver = HttpAccrualResolver::new(&config.accrual_system_address, config.resolver_timeout)
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    info!("🚀️ Using the accrual resolver at {}", resolver.base_url());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = start_accrual_worker(db.clone(), resolver, config.poll_interval, shutdown_rx);
    let srv = create_server_instance(config, db)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));

    info!("🚀️ HTTP server has stopped. Waiting for the accrual worker to finish");
    if shutdown_tx.send(true).is_err() {
        warn!("🚀️ The accrual worker had already stopped");
    }
    if let Err(e) = worker.await {
        error!("🚀️ The accrual worker did not shut down cleanly. {e}");
    }
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let withdrawal_api = WithdrawalApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SubmitOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(WithdrawAliasRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported with the same `{"error"}` body as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

/// SQLite creates missing database files, but not missing directories.
fn ensure_database_directory(url: &str) -> Result<(), ServerError> {
    let path = match url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
        Some(p) if !p.starts_with(":memory:") => p.split('?').next().unwrap_or(p),
        _ => return Ok(()),
    };
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
