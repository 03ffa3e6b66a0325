use std::path::PathBuf;

use axum::routing::get;
use clap::{Parser, Subcommand};
use recipe_api::config::Configuration;
use recipe_api::database::Database;
use recipe_api::readiness::wait_for_storage;
use recipe_api::{AppState, app, telemetry};
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the YAML configuration file.
    #[arg(long, short, global = true, default_value = "config.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Wait for the database, apply migrations and serve HTTP (default).
    Serve,
    /// Block until the database accepts connections, then exit.
    WaitForDb,
    /// Create a user with staff and superuser rights.
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::setup_logging();

    let args = Args::parse();
    let config = Configuration::default().path(args.config).read();

    let db = Database::new(&config.postgres)?;
    wait_for_storage(&db.postgres, config.readiness.poll_interval()).await;

    match args.cmd.unwrap_or(Commands::Serve) {
        Commands::WaitForDb => Ok(()),
        Commands::CreateSuperuser { email, password } => {
            db.migrate().await?;
            let state = AppState::postgres(config, &db)?;
            state.users.create_superuser(&email, &password).await?;
            Ok(())
        },
        Commands::Serve => {
            db.migrate().await?;
            let address = config.address.clone();
            let state = AppState::postgres(config, &db)?;

            let handle = telemetry::setup_metrics_recorder()?;
            let app = app(state)
                .route("/metrics", get(move || std::future::ready(handle.render())));

            let listener = TcpListener::bind(&address).await?;
            tracing::info!(%address, "server started");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
