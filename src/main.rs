use agroportal::application::hierarchy::HierarchyResolver;
use agroportal::application::session::{Credentials, SessionContext, SessionServices};
use agroportal::config::WorkflowConfig;
use agroportal::domain::catalog::Catalog;
use agroportal::domain::hierarchy::{HierarchyTables, MenuId};
use agroportal::domain::ledger::{ItemKind, OwnedItems};
use agroportal::domain::ports::{CatalogLookup, SessionStoreBox};
use agroportal::error::Result as PortalResult;
use agroportal::infrastructure::in_memory::{
    FailurePoint, InMemoryLedgerStore, InMemorySessionStore, RecordingNotificationSink,
    SimulatedPurchaseGateway,
};
use agroportal::infrastructure::json_file::JsonFileSessionStore;
use agroportal::interfaces::csv::hierarchy_reader::HierarchyReader;
use agroportal::interfaces::csv::report_writer::StatusReportWriter;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List active menus
    Menus {
        /// Menus CSV file
        menus: PathBuf,
    },
    /// List the submenu options for a selected menu
    Submenus {
        #[arg(long)]
        menus: PathBuf,
        #[arg(long)]
        submenus: PathBuf,
        #[arg(long)]
        menu_id: MenuId,
    },
    /// Print the effective status of every screen as CSV
    Report {
        #[arg(long)]
        menus: PathBuf,
        #[arg(long)]
        submenus: PathBuf,
        #[arg(long)]
        screens: PathBuf,
    },
    /// List marketplace modules not yet owned
    Catalog {
        /// Catalog JSON file; the built-in catalog is used when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long = "owned-module")]
        owned_modules: Vec<String>,
    },
    /// Purchase a module, service or package
    Purchase(PurchaseArgs),
}

#[derive(Args)]
struct PurchaseArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: ItemKind,
    #[arg(long)]
    id: String,
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// JSON file the session ledger is loaded from and saved to
    #[arg(long)]
    session: Option<PathBuf>,
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[arg(long, default_value = "demo")]
    tenant: String,
    #[arg(long, default_value = "admin")]
    user: String,
    #[arg(long, default_value = "admin123")]
    password: String,
    /// Workflow timing as JSON (milliseconds)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the simulated network delays
    #[arg(long)]
    instant: bool,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Make the simulated gateway fail at this step
    #[arg(long, value_enum)]
    fail_at: Option<FailAt>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailAt {
    Purchase,
    Activation,
}

fn parse_kind(s: &str) -> std::result::Result<ItemKind, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Menus { menus } => {
            let resolver = HierarchyResolver::new(HierarchyTables {
                menus: read_table(&menus)?,
                ..HierarchyTables::default()
            });
            let options = resolver.list_active_menus();
            if options.is_empty() {
                println!("no menus available");
            }
            for option in options {
                println!("{},{}", option.id, option.name);
            }
        }
        Command::Submenus {
            menus,
            submenus,
            menu_id,
        } => {
            let resolver = HierarchyResolver::new(HierarchyTables {
                menus: read_table(&menus)?,
                submenus: read_table(&submenus)?,
                ..HierarchyTables::default()
            });
            resolver.menu(menu_id).into_diagnostic()?;
            for option in resolver.list_submenus_for_menu(Some(menu_id)) {
                println!("{},{},{}", option.id, option.name, option.menu_id);
            }
        }
        Command::Report {
            menus,
            submenus,
            screens,
        } => {
            let resolver = HierarchyResolver::new(HierarchyTables {
                menus: read_table(&menus)?,
                submenus: read_table(&submenus)?,
                screens: read_table(&screens)?,
            });
            let stdout = io::stdout();
            let mut writer = StatusReportWriter::new(stdout.lock());
            writer
                .write_statuses(resolver.screen_statuses())
                .into_diagnostic()?;
        }
        Command::Catalog {
            catalog,
            owned_modules,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let owned = OwnedItems::with_modules(owned_modules);
            for module in catalog.available_modules_for_tenant(&owned) {
                println!(
                    "{},{},{} {}",
                    module.id,
                    module.name,
                    module.price.value(),
                    module.currency
                );
            }
        }
        Command::Purchase(args) => purchase(args).await?,
    }

    Ok(())
}

async fn purchase(args: PurchaseArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => WorkflowConfig::from_json_file(path).into_diagnostic()?,
        None => WorkflowConfig::default(),
    };
    if args.instant {
        config = WorkflowConfig {
            phase_timeout: config.phase_timeout,
            ..WorkflowConfig::instant()
        };
    }
    if let Some(ms) = args.timeout_ms {
        config.phase_timeout = Duration::from_millis(ms);
    }

    let mut gateway = SimulatedPurchaseGateway::new(config.purchase_delay, config.activation_delay);
    if let Some(point) = args.fail_at {
        gateway = gateway.failing_at(match point {
            FailAt::Purchase => FailurePoint::Purchase,
            FailAt::Activation => FailurePoint::Activation,
        });
    }

    let sink = Arc::new(RecordingNotificationSink::new());
    let services = SessionServices {
        catalog: Arc::new(load_catalog(args.catalog.as_deref())?),
        ledger: Arc::new(InMemoryLedgerStore::new()),
        sink: sink.clone(),
        gateway: Box::new(gateway),
        session_store: session_store(&args).into_diagnostic()?,
        config,
        observer: None,
    };
    let credentials = Credentials {
        tenant_id: args.tenant,
        username: args.user,
        password: args.password,
    };

    let session = SessionContext::sign_in(credentials, services)
        .await
        .into_diagnostic()?;
    let outcome = session.purchase(args.kind, &args.id).await;

    for modal in sink.history() {
        eprintln!("[{}] {}: {}", modal.kind, modal.title, modal.message);
    }
    let receipt = outcome.into_diagnostic()?;
    if receipt.already_owned {
        eprintln!("note: {} was already owned", receipt.display_name);
    }

    let owned = session.owned().await.into_diagnostic()?;
    println!("{}", serde_json::to_string_pretty(&owned).into_diagnostic()?);
    Ok(())
}

fn session_store(args: &PurchaseArgs) -> PortalResult<SessionStoreBox> {
    if let Some(db_path) = &args.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use agroportal::infrastructure::rocksdb::RocksDBSessionStore;
            return Ok(Box::new(RocksDBSessionStore::open(db_path)?));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = db_path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            return Ok(Box::new(InMemorySessionStore::new()));
        }
    }

    Ok(match &args.session {
        Some(path) => Box::new(JsonFileSessionStore::new(path)),
        None => Box::new(InMemorySessionStore::new()),
    })
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).into_diagnostic()?;
            Catalog::from_json(&json).into_diagnostic()
        }
        None => Ok(Catalog::builtin()),
    }
}

/// Reads a hierarchy CSV, reporting bad rows on stderr and keeping the rest.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).into_diagnostic()?;
    let mut rows = Vec::new();
    for row in HierarchyReader::new(file).records() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => eprintln!("Error reading record in {}: {}", path.display(), e),
        }
    }
    Ok(rows)
}
