use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use stockpile_api::{
    config::{self, AppConfig},
    events::EventSender,
    models::{AlertItem, StockItem, Transfer},
    services::{
        alerts::SweepOutcome,
        ledger::StockFilter,
        transfers::TransferCommand,
        AlertSweeper, StockLedger, TransferEngine,
    },
    store::{self, RecordStore},
};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(cli.data_dir).await?;

    match cli.command {
        Commands::Transfer(args) => handle_transfer(&context, args, cli.json).await?,
        Commands::Sweep => handle_sweep(&context, cli.json).await?,
        Commands::Alerts(command) => handle_alerts_command(&context, command, cli.json).await?,
        Commands::Stock(command) => handle_stock_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "stockpile",
    about = "Operate on the stockpile data directory without the HTTP server",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[arg(
        long,
        global = true,
        help = "Data directory to use instead of the configured one"
    )]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move units of a product between two warehouses
    Transfer(TransferArgs),
    /// Regenerate unresolved low-stock alerts
    Sweep,
    #[command(subcommand)]
    Alerts(AlertsCommands),
    #[command(subcommand)]
    Stock(StockCommands),
}

#[derive(Args)]
struct TransferArgs {
    #[arg(long, help = "Product id")]
    product: i64,
    #[arg(long, help = "Source warehouse id")]
    from: i64,
    #[arg(long, help = "Destination warehouse id")]
    to: i64,
    #[arg(long, help = "Units to move")]
    quantity: i64,
}

#[derive(Subcommand)]
enum AlertsCommands {
    List(ListAlertsArgs),
    Resolve(ResolveAlertArgs),
}

#[derive(Args)]
struct ListAlertsArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Only unresolved alerts")]
    open: bool,
}

#[derive(Args)]
struct ResolveAlertArgs {
    /// Alert id
    id: i64,
    #[arg(long, action = ArgAction::SetTrue, help = "Mark the alert unresolved again")]
    reopen: bool,
}

#[derive(Subcommand)]
enum StockCommands {
    List(ListStockArgs),
    Adjust(AdjustStockArgs),
}

#[derive(Args)]
struct ListStockArgs {
    #[arg(long, help = "Only rows for this product")]
    product: Option<i64>,
    #[arg(long, help = "Only rows held in this warehouse")]
    warehouse: Option<i64>,
}

#[derive(Args)]
struct AdjustStockArgs {
    #[arg(long, help = "Product id")]
    product: i64,
    #[arg(long, help = "Warehouse id")]
    warehouse: i64,
    #[arg(long, allow_hyphen_values = true, help = "Signed change in units")]
    delta: i64,
}

struct CliContext {
    config: AppConfig,
    store: Arc<RecordStore>,
    event_sender: EventSender,
}

impl CliContext {
    async fn initialize(data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }

        let store = store::open_from_app_config(&config)
            .await
            .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;

        let (event_sender, mut event_rx) = EventSender::channel(32);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "stockpile_cli", event = ?event, "received async event");
            }
        });

        Ok(Self {
            config,
            store: Arc::new(store),
            event_sender,
        })
    }

    fn ledger(&self) -> StockLedger {
        StockLedger::new(self.store.clone(), self.event_sender.clone())
    }

    fn transfers(&self) -> TransferEngine {
        TransferEngine::new(self.store.clone(), self.event_sender.clone())
    }

    fn alerts(&self) -> AlertSweeper {
        AlertSweeper::new(
            self.store.clone(),
            self.event_sender.clone(),
            self.config.default_reorder_point,
        )
    }
}

async fn handle_transfer(context: &CliContext, args: TransferArgs, json: bool) -> Result<()> {
    let cmd = TransferCommand {
        product_id: args.product,
        from_warehouse_id: args.from,
        to_warehouse_id: args.to,
        quantity: args.quantity,
    };
    let transfer = context
        .transfers()
        .execute(cmd)
        .await
        .map_err(|e| anyhow!(e.response_message()))
        .context("transfer rejected")?;

    if json {
        print_json(&transfer)?;
    } else {
        render_transfer(&transfer);
    }
    Ok(())
}

async fn handle_sweep(context: &CliContext, json: bool) -> Result<()> {
    let new_alerts = context.alerts().sweep().await.context("sweep failed")?;
    let outcome = SweepOutcome::new(new_alerts);

    if json {
        print_json(&outcome)?;
    } else {
        println!("{}", outcome.message);
        outcome.new_alerts.iter().for_each(render_alert);
    }
    Ok(())
}

async fn handle_alerts_command(
    context: &CliContext,
    command: AlertsCommands,
    json: bool,
) -> Result<()> {
    match command {
        AlertsCommands::List(args) => {
            let alerts: Vec<AlertItem> = context
                .alerts()
                .list()
                .await
                .context("failed to read alerts")?
                .into_iter()
                .filter(|alert| !args.open || !alert.resolved)
                .collect();
            if json {
                print_json(&alerts)?;
            } else if alerts.is_empty() {
                println!("No alerts");
            } else {
                alerts.iter().for_each(render_alert);
            }
        }
        AlertsCommands::Resolve(args) => {
            let alert = context
                .alerts()
                .set_resolved(args.id, !args.reopen)
                .await
                .map_err(|e| anyhow!(e.response_message()))?;
            if json {
                print_json(&alert)?;
            } else {
                render_alert(&alert);
            }
        }
    }
    Ok(())
}

async fn handle_stock_command(
    context: &CliContext,
    command: StockCommands,
    json: bool,
) -> Result<()> {
    match command {
        StockCommands::List(args) => {
            let filter = StockFilter {
                product_id: args.product,
                warehouse_id: args.warehouse,
            };
            let rows = context
                .ledger()
                .list(&filter)
                .await
                .context("failed to read stock")?;
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No stock rows");
            } else {
                rows.iter().for_each(render_stock);
            }
        }
        StockCommands::Adjust(args) => {
            let row = context
                .ledger()
                .adjust(args.product, args.warehouse, args.delta)
                .await
                .map_err(|e| anyhow!(e.response_message()))?;
            match (row, json) {
                (Some(row), true) => print_json(&row)?,
                (Some(row), false) => render_stock(&row),
                (None, true) => print_json(&serde_json::Value::Null)?,
                (None, false) => println!(
                    "No stock row for product {} in warehouse {}; nothing to adjust",
                    args.product, args.warehouse
                ),
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_transfer(transfer: &Transfer) {
    println!(
        "- Transfer {} • product {} • {} -> {} • {} units • {}",
        transfer.id,
        transfer.product_id,
        transfer.from_warehouse_id,
        transfer.to_warehouse_id,
        transfer.quantity,
        transfer.date.to_rfc3339()
    );
}

fn render_alert(alert: &AlertItem) {
    let scope = match alert.scope.warehouse_id() {
        Some(id) => format!("warehouse {}", id),
        None => "all warehouses".to_string(),
    };
    println!(
        "- Alert {} • {} • {} • {}{}",
        alert.id,
        alert.status,
        scope,
        alert.message,
        if alert.resolved { " (resolved)" } else { "" }
    );
}

fn render_stock(row: &StockItem) {
    println!(
        "- Stock {} • product {} • warehouse {} • {} units",
        row.id, row.product_id, row.warehouse_id, row.quantity
    );
}
