//! Terminal front-end for the ticket wizard.
//!
//! Reads one command per line from stdin. Notifications raised by a command
//! are printed after it runs; uploads continue in the background and report
//! when the next command is entered.

use std::sync::Arc;
use std::time::Duration;
use ticket_wizard::command::{Command, CommandError, HELP};
use ticket_wizard::config::WizardConfig;
use ticket_wizard::navigation::WizardStep;
use ticket_wizard::reducer::{WizardAction, WizardEnvironment, WizardReducer, WizardState};
use ticket_wizard::storage::JsonFileStorage;
use ticket_wizard::upload::{HttpUploadGateway, ImageFile, MockUploadGateway, UploadGateway};
use ticket_wizard::view::{render_catalog, render_state};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard_core::environment::SystemClock;
use wizard_runtime::{Store, StoreError};

type WizardStore = Store<WizardState, WizardAction, WizardEnvironment, WizardReducer>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with command output.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_wizard=info,wizard_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WizardConfig::from_env();
    info!(
        store_dir = %config.store_dir.display(),
        upload_endpoint = %config.upload.endpoint,
        offline = config.upload.offline,
        "Configuration loaded"
    );

    let uploader: Arc<dyn UploadGateway> = if config.upload.offline {
        Arc::new(MockUploadGateway::new())
    } else {
        Arc::new(HttpUploadGateway::new(&config.upload)?)
    };
    let env = WizardEnvironment::new(
        Arc::new(JsonFileStorage::new(&config.store_dir)),
        uploader,
        Arc::new(SystemClock),
    );
    let store = Store::new(WizardState::default(), WizardReducer::new(), env);

    println!("{HELP}\n");
    dispatch(&store, WizardAction::Start).await?;
    let mut shown_step = report(&store, None).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Tickets) => print!("{}", render_catalog()),
            Ok(Command::Show) => print!("{}", store.state(render_state).await),
            Ok(Command::Dispatch(action)) => dispatch(&store, action).await?,
            Ok(Command::Upload(path)) => match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let file = ImageFile::from_path_bytes(&path, bytes);
                    dispatch(&store, WizardAction::BeginUpload { file }).await?;
                },
                Err(error) => eprintln!("cannot read {}: {error}", path.display()),
            },
            Err(CommandError::Empty) => {},
            Err(error) => eprintln!("{error}"),
        }
        shown_step = report(&store, Some(shown_step)).await?;
    }

    if let Err(error) = store.shutdown(Duration::from_secs(5)).await {
        warn!(%error, "Exiting with uploads still in flight");
    }
    Ok(())
}

/// Sends an action without waiting for the effects it starts
async fn dispatch(store: &WizardStore, action: WizardAction) -> Result<(), StoreError> {
    store.send(action).await.map(drop)
}

/// Prints pending notifications, and the step summary if the step changed
async fn report(store: &WizardStore, shown: Option<WizardStep>) -> Result<WizardStep, StoreError> {
    let (step, notifications, summary) = store
        .state(|state| {
            (
                state.step,
                state.notifications.clone(),
                render_state(state),
            )
        })
        .await;

    for notification in &notifications {
        println!("{notification}");
    }
    if !notifications.is_empty() {
        let seen = notifications.len();
        dispatch(store, WizardAction::DismissNotifications { seen }).await?;
    }
    if shown != Some(step) {
        print!("{summary}");
    }
    Ok(step)
}
