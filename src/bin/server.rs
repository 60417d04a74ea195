use std::{error::Error, net::SocketAddr};

use chrono::Duration;
use foodgram_sdk::{
    api::{routes, AppContext},
    config::Config,
    connection::{establish_connection, run_migrations},
    jwt::TokenIssuer,
};
use log::{error, info};
use tokio::signal::ctrl_c;

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let address: SocketAddr = config.bind_address.parse()?;

    let pool = establish_connection(&config).await?;
    run_migrations(&pool).await?;

    let issuer = TokenIssuer::new(
        config.token_secret.as_bytes(),
        Duration::hours(config.token_lifetime_hours),
    )?;
    let ctx = AppContext::new(pool.clone(), issuer);

    let (address, server) =
        warp::serve(routes(ctx)).try_bind_with_graceful_shutdown(address, shutdown_signal())?;
    info!("Server running on {address}");

    server.await;
    pool.close().await;
    info!("Server stopped");

    Ok(())
}
