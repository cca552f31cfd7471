//! Student records service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use student_records::api::{create_router, AppState, ServiceInfo, API_PREFIX};
use student_records::config::{Config, StoreBackend};
use student_records::db::{run_migrations, Database};
use student_records::metrics;
use student_records::students::{InMemoryStudentStore, PgStudentStore, StudentStore};
use student_records::utils::shutdown_signal;

/// Student records REST service.
#[derive(Parser, Debug)]
#[command(name = "student-records")]
#[command(about = "CRUD API for student records backed by PostgreSQL")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP listening port for `serve` (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Create the students table and trigger, then exit.
    Migrate,

    /// Check configuration validity and database reachability.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let config = Config::load();
    init_tracing(args.verbose, config.as_ref().ok());

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Handle subcommands
    match args.command {
        Some(Command::Serve) | None => cmd_serve(config, args.port).await,
        Some(Command::Migrate) => cmd_migrate(config).await,
        Some(Command::CheckConfig) => cmd_check_config(config).await,
    }
}

fn init_tracing(verbose: bool, config: Option<&Config>) {
    let filter = if verbose {
        EnvFilter::new("student_records=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.map(|c| c.rust_log.as_str()).unwrap_or("info"))
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_some_and(|c| c.log_json) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn validate(config: &Config) -> anyhow::Result<()> {
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        anyhow::anyhow!("Configuration validation failed: {}", e)
    })
}

/// Connect to PostgreSQL, logging what to check when it is unreachable.
async fn connect(config: &Config) -> anyhow::Result<Database> {
    Database::connect(&config.database()).await.map_err(|e| {
        error!("Database connection failed. Please check:");
        error!("1. PostgreSQL is running on {}:{}", config.db_host, config.db_port);
        error!("2. Database exists: {}", config.db_name);
        error!("3. Credentials are correct");
        e.into()
    })
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }
    validate(&config)?;

    info!("Environment: {}", config.app_env);
    info!("Store backend: {}", config.store_backend);

    let metrics_handle = if config.metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let (store, database): (Arc<dyn StudentStore>, Option<Database>) = match config.store_backend
    {
        StoreBackend::Postgres => {
            let db = connect(&config).await.map_err(|e| {
                error!("Failed to start server: {}", e);
                e
            })?;
            if config.db_auto_migrate {
                if let Err(e) = run_migrations(db.pool()).await {
                    error!("Migration failed: {}", e);
                    db.close().await;
                    return Err(e.into());
                }
            }
            let store: Arc<dyn StudentStore> = Arc::new(PgStudentStore::from_database(&db));
            (store, Some(db))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, records will not survive a restart");
            let store: Arc<dyn StudentStore> = Arc::new(InMemoryStudentStore::new());
            (store, None)
        }
    };

    let mut state = AppState::new(store).with_service(ServiceInfo {
        name: config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.app_env.clone(),
    });
    if let Some(handle) = metrics_handle {
        state = state.with_metrics(handle);
    }

    let frontend = config.frontend_path();
    let router = create_router(state, frontend.as_deref());

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            if let Some(db) = &database {
                db.close().await;
            }
            return Err(e.into());
        }
    };

    info!("{} server running on port {}", config.service_name, config.port);
    info!("Frontend: http://localhost:{}", config.port);
    info!("API: http://localhost:{}{}", config.port, API_PREFIX);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(db) = &database {
        db.close().await;
    }

    served?;
    Ok(())
}

/// Create the schema and exit.
async fn cmd_migrate(config: Config) -> anyhow::Result<()> {
    validate(&config)?;
    let db = connect(&config).await?;

    let result = run_migrations(db.pool()).await;
    db.close().await;

    result.map_err(|e| {
        error!("Migration failed: {}", e);
        e.into()
    })
}

/// Check configuration validity.
async fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("STUDENT RECORDS - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Environment: {}", config.app_env);
    println!("  Service: {}", config.service_name);
    println!("  Port: {}", config.port);
    println!("  Store Backend: {}", config.store_backend);
    println!(
        "  Database: {}@{}:{}/{}",
        config.db_user, config.db_host, config.db_port, config.db_name
    );
    let password = if config.db_password.is_empty() {
        "(empty)"
    } else {
        "********"
    };
    println!("  Password: {}", password);
    println!("  Pool Size: {}", config.db_max_connections);
    println!(
        "  Timeouts: idle {}ms, connect {}ms",
        config.db_idle_timeout_ms, config.db_connect_timeout_ms
    );
    println!(
        "  Frontend: {}",
        config
            .frontend_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(disabled)".to_string())
    );
    let metrics_state = if config.metrics_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("  Metrics: {}", metrics_state);
    println!("----------------------------------------------------------------------");

    if config.store_backend == StoreBackend::Postgres {
        print!("Connecting to database... ");
        match Database::connect(&config.database()).await {
            Ok(db) => {
                let ping = db.ping().await;
                db.close().await;
                match ping {
                    Ok(()) => println!("OK"),
                    Err(e) => {
                        println!("FAILED");
                        println!("  Error: {}", e);
                        return Err(anyhow::anyhow!("Database ping failed"));
                    }
                }
            }
            Err(e) => {
                println!("FAILED");
                println!("  Error: {}", e);
                return Err(anyhow::anyhow!("Database connection failed"));
            }
        }
    }

    println!("======================================================================");
    Ok(())
}
