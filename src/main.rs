//! # Ticket Printer CLI
//!
//! Command-line interface for printing bus tickets on Bluetooth ESC/POS
//! printers.
//!
//! ## Usage
//!
//! ```bash
//! # List nearby devices, printers only
//! ticket-printer scan --printers-only
//!
//! # Show what a ticket will look like
//! ticket-printer preview ticket.json
//!
//! # Print, picking the printer interactively
//! ticket-printer print ticket.json
//!
//! # Print to a known printer
//! ticket-printer print ticket.json --address 00:11:22:33:44:55
//!
//! # HTTP API, with a simulated printer
//! ticket-printer serve --listen 0.0.0.0:8080 --mock
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use ticket_printer::{
    TicketPrinterError,
    adapter::{BluetoothAdapter, BluezAdapter, MockAdapter, ScanEvent},
    config::SessionConfig,
    device::{PairedPayload, RawDevice},
    discovery::DeviceDiscovery,
    permission::HostPermissions,
    printer::PaperSize,
    selector::{DeviceSelector, FixedAddress, Selection, SelectionPrompt, SelectorView},
    server::{self, AppState, ServerConfig},
    session::{FailureReason, PrintSession},
    ticket::{SystemClock, Ticket},
};

/// Bus ticket printing for Bluetooth ESC/POS printers
#[derive(Parser, Debug)]
#[command(name = "ticket-printer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Paper width: 58 or 80
    #[arg(long, global = true, value_parser = PaperSize::parse)]
    paper: Option<PaperSize>,

    /// Use a simulated adapter with one printer instead of BlueZ
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan for Bluetooth devices
    Scan {
        /// Only list devices that look like printers
        #[arg(long)]
        printers_only: bool,
    },

    /// Fill in ticket id, confirmation code and date, and print the ticket JSON
    Issue {
        /// Ticket JSON file
        ticket: PathBuf,
    },

    /// Show the receipt as text
    Preview {
        /// Ticket JSON file
        ticket: PathBuf,
    },

    /// Print a ticket
    Print {
        /// Ticket JSON file
        ticket: PathBuf,

        /// Printer address; asks interactively when omitted
        #[arg(long)]
        address: Option<String>,

        /// Start the device list filtered to printers
        #[arg(long)]
        printers_only: bool,
    },

    /// Start the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        if let TicketPrinterError::Print(reason) = &e
            && let Some(hint) = reason.hint()
        {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), TicketPrinterError> {
    let cli = Cli::parse();

    let mut config = SessionConfig::load_or_default(cli.config.as_deref())?;
    if let Some(paper) = cli.paper {
        config.paper = paper;
    }
    let adapter = adapter(cli.mock);

    match cli.command {
        Commands::Scan { printers_only } => {
            let discovery = DeviceDiscovery::new(adapter, config.discovery());
            let mut selector = DeviceSelector::new().with_printers_only(printers_only);
            selector.begin_scan();
            println!("Scanning for devices...");
            let result = discovery.scan().await;
            selector.finish_scan(&result);
            print_view(&selector);
            result?;
        }

        Commands::Issue { ticket } => {
            let mut ticket = load_ticket(&ticket)?;
            ticket.fill_generated(&SystemClock, &mut rand::rng());
            println!("{}", serde_json::to_string_pretty(&ticket)?);
        }

        Commands::Preview { ticket } => {
            let ticket = load_ticket(&ticket)?;
            let session = PrintSession::new(adapter, Arc::new(HostPermissions), &config);
            print!("{}", session.formatter().preview(&ticket));
        }

        Commands::Print {
            ticket,
            address,
            printers_only,
        } => {
            let mut ticket = load_ticket(&ticket)?;
            ticket.fill_generated(&SystemClock, &mut rand::rng());
            let missing = ticket.missing_fields();
            if !missing.is_empty() {
                tracing::warn!(?missing, "Ticket has empty fields, printing placeholders");
            }

            let session = PrintSession::new(adapter, Arc::new(HostPermissions), &config)
                .with_printers_only(printers_only);
            let result = match address {
                Some(address) => session.start(&ticket, &mut FixedAddress(address)).await,
                None => session.start(&ticket, &mut StdinPrompt).await,
            };

            match result {
                Ok(report) => println!(
                    "Printed ticket {} on {} ({} commands, {} bytes)",
                    ticket.ticket_id, report.device.name, report.commands, report.bytes
                ),
                Err(FailureReason::SelectionCancelled) => println!("Cancelled."),
                Err(reason) => return Err(TicketPrinterError::Print(reason)),
            }
        }

        Commands::Serve { listen } => {
            let state = AppState::new(adapter, Arc::new(HostPermissions), &config);
            server::serve(
                ServerConfig {
                    listen_addr: listen,
                },
                Arc::new(state),
            )
            .await?;
        }
    }

    Ok(())
}

fn adapter(mock: bool) -> Arc<dyn BluetoothAdapter> {
    if mock {
        tracing::info!("Using simulated Bluetooth adapter");
        Arc::new(
            MockAdapter::new()
                .paired(PairedPayload::Json(
                    r#"[{"name":"POS-58 Printer","address":"66:22:C8:01:02:03"}]"#.into(),
                ))
                .scan_events(vec![
                    ScanEvent::Found(RawDevice::new(Some("Galaxy A14"), "A4:C3:F0:11:22:33")),
                    ScanEvent::Complete,
                ]),
        )
    } else {
        Arc::new(BluezAdapter::new())
    }
}

fn load_ticket(path: &Path) -> Result<Ticket, TicketPrinterError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_view(selector: &DeviceSelector) {
    match selector.view() {
        SelectorView::Devices { devices } => {
            for (i, device) in devices.iter().enumerate() {
                println!(
                    "  {:>2}. {:<24} {}{}{}",
                    i + 1,
                    device.name,
                    device.address,
                    if device.paired { "  paired" } else { "" },
                    if device.is_printer { "  [printer]" } else { "" },
                );
            }
        }
        view => {
            if let Some(message) = view.message() {
                println!("{}", message);
            }
        }
    }
}

/// Lets the operator pick a device on stdin.
struct StdinPrompt;

#[async_trait]
impl SelectionPrompt for StdinPrompt {
    async fn choose(&mut self, selector: &mut DeviceSelector) -> Selection {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print_view(selector);
            println!("Device number, 'p' to toggle printers only, 'q' to cancel:");

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                _ => return Selection::Cancelled,
            };
            match line.trim() {
                "" | "q" => return Selection::Cancelled,
                "p" => selector.toggle_printers_only(),
                choice => {
                    let picked = choice
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| selector.visible().get(i).map(|d| d.address.clone()));
                    match picked {
                        Some(address) => return Selection::Chosen(address),
                        None => println!("No device {}", choice),
                    }
                }
            }
        }
    }
}
