//! identicon: manage saved identicons with offline support
//!
//! Every invocation is one application load: pending local changes are
//! pushed (or the list is refreshed) before the command runs.
//!
//! Usage:
//!   identicon list
//!   identicon add alice
//!   identicon --offline remove bob
//!   identicon status

use clap::Parser;
use identicon_sync::auth::StaticToken;
use identicon_sync::cli::{ClientArgs, ClientCommand};
use identicon_sync::config::ClientConfig;
use identicon_sync::connectivity::{self, Connectivity, ManualConnectivity};
use identicon_sync::remote::HttpRemote;
use identicon_sync::store::LocalStore;
use identicon_sync::sync::{MutationOutcome, SyncContext, SyncEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    args.apply(&mut config);

    let store = LocalStore::open_or_degrade(&config.database)?;

    if args.command == ClientCommand::Status {
        let status = store.flag().status()?;
        let items = store.mirror().list_all()?;
        println!("state: {}", status);
        match store.flag().last_synced_at()? {
            Some(at) => println!("last synced: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("last synced: never"),
        }
        print_list(&items, args.json)?;
        return Ok(());
    }

    let oracle: Arc<dyn Connectivity> = match config.offline {
        Some(offline) => Arc::new(ManualConnectivity::new(!offline)),
        None => Arc::new(connectivity::probe(
            &config.server_url,
            Duration::from_millis(config.probe_timeout_ms),
        )),
    };
    let remote = HttpRemote::new(
        &config.server_url,
        Duration::from_millis(config.request_timeout_ms),
    )?;

    let ctx = SyncContext::new(
        &store,
        oracle,
        Arc::new(StaticToken::new(config.token.clone())),
        Arc::new(remote),
    );
    let engine = SyncEngine::new(ctx);

    if args.command == ClientCommand::Logout {
        engine.logout().await;
        println!("Local list cleared.");
        if config.token.is_some() {
            println!(
                "The token from the config file or IDENTICON_TOKEN is still set and will be used on the next run; remove it to stay logged out."
            );
        }
        return Ok(());
    }

    let reconciled = engine.reconcile().await;
    tracing::info!("Load: {:?}", reconciled);

    match &args.command {
        ClientCommand::Add { value } => {
            report(engine.add_item(value).await, "add", value);
        }
        ClientCommand::Remove { value } => {
            report(engine.remove_item(value).await, "remove", value);
        }
        _ => {}
    }

    print_list(&engine.displayed().await, args.json)?;
    eprintln!("state: {}", store.flag().status()?);
    Ok(())
}

fn report(outcome: MutationOutcome, verb: &str, value: &str) {
    match outcome {
        MutationOutcome::Rejected => eprintln!("Nothing to {} for {:?}", verb, value),
        MutationOutcome::Confirmed => {}
        MutationOutcome::Deferred => eprintln!("Changed locally, will sync later"),
        MutationOutcome::Unauthenticated => eprintln!("Changed locally, login required to sync"),
        MutationOutcome::RemoteRejected => {
            eprintln!("Server did not accept {} of {:?}", verb, value)
        }
    }
}

fn print_list(items: &[String], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}", item);
        }
    }
    Ok(())
}
