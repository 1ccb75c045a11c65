//! leadcap - capture leads and their pictures, online or offline.
//!
//! Usage:
//!   leadcap submit --salutation FEMALE --first-name Erika ... --privacy-accepted
//!   leadcap add-images photo1.jpg photo2.heic
//!   leadcap sync
//!   leadcap status
//!   leadcap discard
//!   leadcap watch
//!
//! Configuration comes from LEADCAP_API_URL, LEADCAP_DRAFT_DB, LEADCAP_DRAFT_QUOTA_BYTES,
//! LEADCAP_PROBE_INTERVAL_SECS and LEADCAP_HTTP_TIMEOUT_SECS (a .env file is honoured).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use leadcap_client::network::{health_url, probe};
use leadcap_client::{
    init_tracing, primary_action_enabled, primary_action_label, status_message, ClientConfig,
    ClientError, HttpLeadApi, NetworkMonitor, NewImage, Orchestrator, SqliteDraftRepository,
    SubmitOutcome, SyncOutcome,
};
use leadcap_core::models::Salutation;
use leadcap_core::validation::{mime_for_file_name, LeadForm};

#[derive(Parser)]
#[command(name = "leadcap")]
#[command(about = "Capture leads and their pictures, with offline drafts")]
struct Cli {
    /// Treat the device as offline without probing the server
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and submit the lead form (stored locally when offline)
    Submit {
        #[arg(long)]
        salutation: Option<Salutation>,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        postal_code: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// Privacy policy accepted
        #[arg(long)]
        privacy_accepted: bool,
        /// Newsletter single opt-in
        #[arg(long)]
        newsletter: bool,
    },
    /// Queue pictures in the local draft
    AddImages {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Create the lead if needed and upload every queued picture
    Sync,
    /// Show the draft and connectivity
    Status,
    /// Delete the local draft
    Discard,
    /// Keep probing the server and upload queued pictures whenever it becomes reachable
    Watch,
}

async fn read_image(path: &Path) -> anyhow::Result<NewImage> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?
        .to_string();
    let mime_type = mime_for_file_name(&file_name)
        .with_context(|| format!("Unsupported image type: {}", file_name))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    Ok(NewImage {
        file_name,
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Print the user-facing message (and field errors) before handing the error to `main`.
fn report(err: ClientError) -> anyhow::Error {
    if let ClientError::Validation(fields) = &err {
        for (field, message) in fields {
            eprintln!("  {}: {}", field, message);
        }
    }
    eprintln!("{}", err.user_message());
    anyhow::Error::new(err)
}

fn print_sync(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Offline => println!("{}", status_message(false)),
        SyncOutcome::NothingToSync => println!("Keine Offline-Anfrage vorhanden."),
        SyncOutcome::NoImages { lead_id } => {
            println!("Anfrage {} gesendet. Keine Bilder in der Warteschlange.", lead_id)
        }
        SyncOutcome::Interrupted {
            lead_id,
            attached,
            remaining,
        } => println!(
            "Anfrage {}: {} Bild(er) hochgeladen, {} bleiben lokal gespeichert.",
            lead_id, attached, remaining
        ),
        SyncOutcome::Completed { lead_id, attached } => {
            println!("Anfrage {}: {} Bild(er) hochgeladen.", lead_id, attached)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let drafts = Arc::new(
        SqliteDraftRepository::open(&config.draft_db_path, config.draft_quota_bytes)
            .await
            .with_context(|| {
                format!("Failed to open draft store {}", config.draft_db_path.display())
            })?,
    );
    let api = HttpLeadApi::from_config(&config)?;

    let online = !cli.offline && probe(api.client(), &health_url(api.base_url())).await;

    let orchestrator = Arc::new(
        Orchestrator::restore(
            drafts.clone(),
            Arc::new(api.clone()),
            NetworkMonitor::new(online),
        )
        .await?,
    );

    match cli.command {
        Commands::Submit {
            salutation,
            first_name,
            last_name,
            postal_code,
            email,
            phone,
            privacy_accepted,
            newsletter,
        } => {
            let form = LeadForm {
                salutation,
                first_name,
                last_name,
                postal_code,
                email,
                phone,
                privacy_accepted,
                newsletter_single_opt_in: newsletter,
            };
            match orchestrator.submit_form(&form).await.map_err(report)? {
                SubmitOutcome::SavedOffline => {
                    println!("Offline gespeichert. Die Anfrage wird gesendet, sobald eine Verbindung besteht.")
                }
                SubmitOutcome::Created { lead_id } => println!("Anfrage {} gesendet.", lead_id),
            }
        }
        Commands::AddImages { files } => {
            let mut images = Vec::with_capacity(files.len());
            for path in &files {
                images.push(read_image(path).await?);
            }
            let draft = orchestrator.add_images(images).await.map_err(report)?;
            println!(
                "{} Bild(er) lokal gespeichert ({} Bytes).",
                draft.images.len(),
                draft.image_bytes()
            );
        }
        Commands::Sync => {
            let outcome = orchestrator.sync().await.map_err(report)?;
            print_sync(outcome);
        }
        Commands::Status => {
            let snapshot = orchestrator.snapshot().await.map_err(report)?;
            println!("{}", status_message(snapshot.is_online));
            println!("Status: {:?}", snapshot.state);
            match snapshot.lead_id {
                Some(lead_id) => println!("Anfrage: {}", lead_id),
                None if snapshot.has_draft => println!("Anfrage: noch nicht gesendet"),
                None => println!("Anfrage: keine"),
            }
            println!(
                "Bilder in Warteschlange: {} ({} von {} Bytes)",
                snapshot.pending_images,
                snapshot.pending_bytes,
                drafts.quota_bytes()
            );
            let enabled = if primary_action_enabled(&snapshot) {
                "verfügbar"
            } else {
                "nicht verfügbar"
            };
            println!("{}: {}", primary_action_label(&snapshot), enabled);
        }
        Commands::Discard => {
            orchestrator.discard().await.map_err(report)?;
            println!("Offline-Anfrage verworfen.");
        }
        Commands::Watch => {
            let network = orchestrator.network();
            println!("{}", status_message(network.is_online()));
            let probe_task =
                network.spawn_probe(api.client().clone(), api.base_url(), config.probe_interval);
            let sync_task = orchestrator.spawn_auto_sync();

            if network.is_online() {
                match orchestrator.resume().await {
                    Ok(outcome) => print_sync(outcome),
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for ctrl-c")?;
            probe_task.abort();
            sync_task.abort();
        }
    }

    Ok(())
}
