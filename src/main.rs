use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{info, warn};

use streamlabs_oauth::config::{
    create_shared_property_store, PropertyStore, Settings, ACCESS_TOKEN_KEY, CLIENT_ID_KEY,
};
use streamlabs_oauth::datastore::{convert_datastore, FileStore};
use streamlabs_oauth::streamlabs::{create_shared_client, OAuthCoordinator, StreamlabsClient};
use streamlabs_oauth::web::{self, AppState};

/// Streamlabs OAuth endpoint and donation/points API bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the OAuth callback endpoint (default)
    Serve,

    /// Copy every value from one JSON datastore file into another
    ConvertStore {
        /// Datastore to copy from
        #[arg(long)]
        source: PathBuf,

        /// Datastore to copy into (created if missing)
        #[arg(long)]
        destination: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let level = if args.debug {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(level)
        .init();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(Settings::from_env()).await,
        Command::ConvertStore {
            source,
            destination,
        } => convert_store(source, destination).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    info!(
        "Loading properties from {}...",
        settings.properties_path.display()
    );
    let properties =
        create_shared_property_store(PropertyStore::load(&settings.properties_path).await?);

    let client = StreamlabsClient::new(settings.api_url.clone());
    client.set_donation_pull_limit(settings.donation_pull_limit);
    client.set_currency_code(settings.currency_code.clone());

    if properties.has_property(ACCESS_TOKEN_KEY).await {
        client.set_access_token(properties.get_property(ACCESS_TOKEN_KEY, "").await);
        info!("Loaded stored Streamlabs access token");
    } else {
        info!("No Streamlabs access token yet, authorize via /streamlabsoauth");
    }

    if !properties.has_property(CLIENT_ID_KEY).await {
        warn!("{} is not set, Streamlabs authorization will fail", CLIENT_ID_KEY);
    }

    let client = create_shared_client(client);
    let state = AppState {
        oauth: OAuthCoordinator::new(client, properties.clone(), settings.secure),
        properties,
    };

    web::start_web_server(settings.bind_addr, state).await
}

async fn convert_store(source: PathBuf, destination: PathBuf) -> Result<()> {
    info!(
        "Converting datastore {} into {}",
        source.display(),
        destination.display()
    );

    let source = FileStore::open(&source).await?;
    let destination = FileStore::open(&destination).await?;

    let report = convert_datastore(&destination, source).await?;
    destination.flush().await?;

    info!(
        "Wrote {} keys across {} tables to {}",
        report.keys,
        report.tables,
        destination.path().display()
    );

    Ok(())
}
