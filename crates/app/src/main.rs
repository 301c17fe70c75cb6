mod cli;
mod config;
mod http;
mod jobs;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::http::HttpError;
use crate::jobs::JobError;
use crate::wiring::WiringError;
use folio_infra::db::run_migrations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] folio_infra::db::DbPoolError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = config::AppConfig::from_env()?;
    let state = wiring::build_state(config)?;
    if cli.migrate {
        if let Some(pool) = state.db.as_ref() {
            run_migrations(pool).await?;
        }
    }

    let api_task = cli.mode.run_api().then(|| {
        let addr = state.config.http_addr;
        let http_state = state.clone();
        tokio::spawn(async move {
            info!(%addr, "http server starting");
            http::serve(addr, http_state).await
        })
    });

    let worker_task = cli.mode.run_worker().then(|| {
        let worker_state = state.clone();
        tokio::spawn(async move {
            info!("worker scheduler starting");
            jobs::start(worker_state).await
        })
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    match (api_task, worker_task) {
        (Some(mut api), Some(worker)) => {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                }
                res = &mut api => {
                    res??;
                }
                res = worker => {
                    res??;
                    info!("worker has no jobs; serving api only");
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("shutdown signal received");
                        }
                        res = &mut api => {
                            res??;
                        }
                    }
                }
            }
        }
        (Some(api), None) => {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                }
                res = api => {
                    res??;
                }
            }
        }
        (None, Some(worker)) => {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                }
                res = worker => {
                    res??;
                }
            }
        }
        (None, None) => {
            info!("no mode selected; exiting");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}
