use std::error::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use bletransfer::adapters::crypto::{FileKeyStore, P256Identity, P256Verifier};
use bletransfer::adapters::transport::link;
use bletransfer::application::handshake::Role;
use bletransfer::application::session::SessionState;
use bletransfer::config::SessionConfig;
use bletransfer::domain::{PeerDescriptor, ServerInfo};
use bletransfer::runtime::{SessionEvent, spawn_link_reader, spawn_session};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

#[derive(Parser)]
#[command(name = "bletransfer")]
#[command(about = "Authenticated chunked file transfer over a short-range link", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or create the server identity and print its discovery record
    Keygen {
        /// PKCS#8 PEM key file (created if missing)
        #[arg(short, long)]
        key: PathBuf,
        /// Advertised device name
        #[arg(short, long, default_value = "bletransfer")]
        name: String,
        #[arg(long, default_value = "")]
        device_id: String,
        #[arg(long, default_value = "")]
        owner: String,
    },
    /// Authenticate and transfer a file between two in-process sessions
    Loopback {
        /// File to send
        #[arg(short, long)]
        input: PathBuf,
        /// Where the server writes what it received
        #[arg(short, long)]
        output: PathBuf,
        /// Negotiated write size of the simulated link
        #[arg(long, default_value = "182")]
        chunk_size: NonZeroUsize,
        /// Server identity key file; an ephemeral key is used if omitted
        #[arg(short, long)]
        key: Option<PathBuf>,
        /// Session config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Keygen {
            key,
            name,
            device_id,
            owner,
        } => {
            let identity = FileKeyStore::new(key).load_or_generate(&mut OsRng)?;
            let info = ServerInfo::describe(
                name,
                identity.public_key_pem(),
                device_id,
                owner,
                env!("CARGO_PKG_VERSION"),
            );
            println!("{}", info.to_json()?);
        }
        Commands::Loopback {
            input,
            output,
            chunk_size,
            key,
            config,
        } => {
            let config = match config {
                Some(path) => SessionConfig::from_json_file(path)?,
                None => SessionConfig::default(),
            };
            let server_id = match key {
                Some(path) => FileKeyStore::new(path).load_or_generate(&mut OsRng)?,
                None => P256Identity::generate(&mut OsRng)?,
            };
            let payload = std::fs::read(&input)?;
            let received = loopback(server_id, payload, chunk_size, config).await?;
            std::fs::write(&output, &received)?;
            info!(bytes = received.len(), path = %output.display(), "file written");
        }
    }

    Ok(())
}

async fn loopback(
    server_id: P256Identity,
    payload: Vec<u8>,
    chunk_size: NonZeroUsize,
    config: SessionConfig,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let record = ServerInfo::describe("loopback", server_id.public_key_pem(), "", "", "");
    let peer = PeerDescriptor::from_json(&record.to_json()?)?;
    let client_id = P256Identity::generate(&mut OsRng)?;

    let (central, peripheral) = link(chunk_size);
    let (server, mut server_events, _) =
        spawn_session(server_id, P256Verifier, OsRng, peripheral.transport, config);
    let (client, mut client_events, _) =
        spawn_session(client_id, P256Verifier, OsRng, central.transport, config);
    spawn_link_reader(peripheral.inbound, server.clone());
    spawn_link_reader(central.inbound, client.clone());

    server.start(Role::Server, None).await?;
    server.connected().await?;
    client.start(Role::Client, Some(peer)).await?;
    client.connected().await?;

    wait_for_state(&mut client_events, SessionState::Authenticated).await?;
    let report = client.send_file(payload).await?;
    info!(
        bytes = report.bytes,
        chunks = report.data_chunks,
        sentinel = report.sentinel_sent,
        "payload sent"
    );

    let deadline = config.step_timeout.unwrap_or(Duration::from_secs(30));
    let received = tokio::time::timeout(deadline, async {
        while let Some(event) = server_events.recv().await {
            if let SessionEvent::FileReceived(file) = event {
                return Some(file);
            }
        }
        None
    })
    .await?
    .ok_or("server session ended before the file completed")?;

    client.stop().await?;
    server.stop().await?;
    Ok(received)
}

async fn wait_for_state(
    events: &mut UnboundedReceiver<SessionEvent>,
    want: SessionState,
) -> Result<(), Box<dyn Error>> {
    while let Some(event) = events.recv().await {
        if let SessionEvent::Update(update) = event {
            if let Some(failure) = update.error {
                return Err(format!("handshake failed: {failure}").into());
            }
            if update.state == want {
                return Ok(());
            }
        }
    }
    Err("session ended".into())
}
