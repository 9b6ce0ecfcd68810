//! Command-line shell around the reminder pipeline.
//!
//! The shell stays thin: argument parsing, config resolution, and printing.
//! All record rules live in `store`, all composition in `reminder`, all
//! outbound behavior in `dispatch`.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::config::Config;
use crate::config::settings::{DEFAULT_SETTINGS_FILE, Settings};
use crate::dispatch::automation::WhatsAppSession;
use crate::dispatch::{DispatchMode, SendState, send_batch};
use crate::pipeline::prepare_due_reminders;
use crate::reminder::{GeminiClient, Tone};
use crate::store::{self, ClientRecord, CsvStore, DUE_DATE_FORMAT, format_due_date};

#[derive(Debug, Parser)]
#[command(
    name = "duebot",
    version,
    about = "Tracks client dues, drafts AI payment reminders, and builds UPI + WhatsApp links."
)]
pub struct Cli {
    /// Settings file (defaults to ./duebot.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a client, or update the existing one with the same phone.
    Add {
        #[arg(long)]
        name: String,
        /// Phone with country code; spaces and hyphens are stripped.
        #[arg(long)]
        phone: String,
        /// Due date as DD-MM-YYYY.
        #[arg(long)]
        due: String,
        /// Advance already paid.
        #[arg(long, default_value = "0")]
        advance: Decimal,
        /// Promotional note woven into the reminder.
        #[arg(long, default_value = "")]
        offer: String,
    },
    /// List all client records.
    List,
    /// Delete a client record by name.
    Remove { name: String },
    /// Show clients due on a date (today when omitted).
    Due {
        /// DD-MM-YYYY.
        #[arg(long)]
        on: Option<String>,
    },
    /// Compose reminders for due clients and print their WhatsApp links.
    Remind {
        #[arg(long, value_enum)]
        tone: Option<Tone>,
        /// Treat this date as "today" (DD-MM-YYYY).
        #[arg(long)]
        on: Option<String>,
        /// Open each link in the default browser.
        #[arg(long)]
        open: bool,
    },
    /// Compose reminders and send them through WhatsApp Web automation.
    Send {
        #[arg(long, value_enum)]
        tone: Option<Tone>,
        /// Treat this date as "today" (DD-MM-YYYY).
        #[arg(long)]
        on: Option<String>,
    },
}

fn parse_cli_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT)
        .with_context(|| format!("invalid date '{raw}', expected DD-MM-YYYY"))
}

fn resolve_date(on: Option<&str>) -> anyhow::Result<NaiveDate> {
    match on {
        Some(raw) => parse_cli_date(raw),
        None => Ok(Local::now().date_naive()),
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let settings = Settings::load(&settings_path)?;
    let mut config = Config::resolve(&settings)?;
    let store = CsvStore::new(config.store_path.clone());

    match cli.command {
        Command::Add {
            name,
            phone,
            due,
            advance,
            offer,
        } => {
            if advance < Decimal::ZERO {
                bail!("advance must not be negative");
            }
            let due_date = parse_cli_date(&due)?;

            let mut records = store.load()?.into_records();
            let record = ClientRecord::new(name, phone, Some(due_date), advance, offer);
            let outcome = store::upsert(&mut records, record, Local::now().naive_local());
            store.save(&records)?;

            match outcome {
                store::UpsertOutcome::Inserted => println!("Client added."),
                store::UpsertOutcome::Updated => {
                    println!("Existing client updated (matched by phone).")
                }
            }
        }

        Command::List => {
            let records = store.load()?.into_records();
            if records.is_empty() {
                println!("No clients yet.");
                return Ok(());
            }
            for record in &records {
                println!(
                    "{}  {}  due {}  advance {}  {}",
                    record.name,
                    record.phone,
                    record.due_date.map(format_due_date).unwrap_or_else(|| "-".to_string()),
                    record.advance,
                    record.offer
                );
            }
        }

        Command::Remove { name } => {
            let mut records = store.load()?.into_records();
            if !store::remove_by_name(&mut records, &name) {
                bail!("no client named '{name}'");
            }
            store.save(&records)?;
            println!("Client removed.");
        }

        Command::Due { on } => {
            let date = resolve_date(on.as_deref())?;
            let records = store.load()?.into_records();
            let due = store::due_on(&records, date);
            if due.is_empty() {
                println!("No payments due on {}.", format_due_date(date));
                return Ok(());
            }
            for record in due {
                println!("{}  {}  advance {}", record.name, record.phone, record.advance);
            }
        }

        Command::Remind { tone, on, open } => {
            if let Some(tone) = tone {
                config.tone = tone;
            }
            let api_key = config.take_api_key()?;
            let generator = GeminiClient::new(api_key, config.model.clone())?;
            let today = resolve_date(on.as_deref())?;

            let reminders = prepare_due_reminders(&store, &generator, &config, today).await?;
            if reminders.is_empty() {
                println!("No payments due on {}.", format_due_date(today));
                return Ok(());
            }

            for reminder in &reminders {
                println!("-- {} ({})", reminder.name, reminder.phone);
                println!("{}", reminder.message);
                println!("{}", reminder.wa_link);
                println!();
                if open {
                    open::that(&reminder.wa_link)
                        .with_context(|| format!("failed to open link for {}", reminder.name))?;
                }
            }
        }

        Command::Send { tone, on } => {
            if config.dispatch.mode != DispatchMode::Automated {
                bail!(
                    "dispatch mode is '{}'; set DUEBOT_DISPATCH_MODE=automated \
                     (or dispatch.mode in duebot.toml) to enable automated sends",
                    config.dispatch.mode.as_str()
                );
            }
            if let Some(tone) = tone {
                config.tone = tone;
            }
            let api_key = config.take_api_key()?;
            let generator = GeminiClient::new(api_key, config.model.clone())?;
            let today = resolve_date(on.as_deref())?;

            let reminders = prepare_due_reminders(&store, &generator, &config, today).await?;
            if reminders.is_empty() {
                println!("No payments due on {}.", format_due_date(today));
                return Ok(());
            }

            if let Some(qr) = &config.dispatch.qr_image {
                tracing::info!(path = %qr.display(), "QR image configured for attachments");
            }

            let session = WhatsAppSession::launch(config.dispatch.pacing.clone()).await?;
            let reports = send_batch(&session, &reminders, &config.dispatch.pacing).await;

            let mut failed = 0usize;
            for report in &reports {
                match report.state {
                    SendState::Sent => println!("sent    {} ({})", report.name, report.phone),
                    SendState::Failed => {
                        failed += 1;
                        println!(
                            "failed  {} ({}): {}",
                            report.name,
                            report.phone,
                            report.detail.as_deref().unwrap_or("unknown error")
                        );
                    }
                    SendState::Pending | SendState::Sending => {}
                }
            }
            if failed > 0 {
                println!(
                    "{failed} of {} sends failed; trigger a new run to retry them.",
                    reports.len()
                );
            }
        }
    }

    Ok(())
}
