use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::mpsc;

use learnfil_p2p::common::NetworkEvent;
use learnfil_p2p::network::{ProgressListener, send_message};

#[derive(Parser)]
#[command(
    name = "learnfil-p2p",
    version,
    about = "LearnFIL peer-to-peer progress updates"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a listener for inbound progress updates
    Listen {
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Derive the host identity from a fixed seed (insecure, test only)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Send a one-shot progress update to a listener
    Send {
        #[arg(long)]
        destination: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        lesson: String,
        #[arg(long)]
        status: String,
        /// Derive the host identity from a fixed seed (insecure, test only)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Listen { port, seed } => run_listen(port, seed).await?,
        Command::Send {
            destination,
            user,
            lesson,
            status,
            seed,
        } => {
            send_message(&destination, &user, &lesson, &status, seed).await?;
            println!("Progress update sent successfully");
        }
    }

    Ok(())
}

async fn run_listen(port: u16, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let (event_tx, mut event_rx) = mpsc::channel(64);

    // Printer task: consumes network events, writes operator output.
    tokio::spawn(async move {
        let mut announced = false;
        while let Some(event) = event_rx.recv().await {
            print_event(event, &mut announced);
        }
    });

    let listener = ProgressListener::new(port, seed, event_tx);

    tokio::select! {
        result = listener.run() => result?,
        _ = signal::ctrl_c() => {
            log::info!("Received shutdown signal, stopping listener...");
        }
    }

    Ok(())
}

fn print_event(event: NetworkEvent, announced: &mut bool) {
    match event {
        NetworkEvent::Listening { peer_id, address } => {
            if !*announced {
                println!("LearnFIL P2P listener running");
                println!("Peer ID: {peer_id}");
                *announced = true;
            }
            println!("Listening on {address}");
            println!("Send a progress update from another terminal with:");
            println!(
                "  learnfil-p2p send --destination {address} \
                 --user alice --lesson lesson-001 --status completed"
            );
        }
        NetworkEvent::ProgressReceived { peer, message } => {
            println!("Received progress update from {peer}");
            println!("  User: {}", message.user);
            println!("  Lesson: {}", message.lesson_id);
            println!("  Status: {}", message.status);
            println!("  Timestamp: {}", message.timestamp);
        }
        NetworkEvent::ReceiveFailed { peer, error } => {
            println!("Discarded invalid progress update from {peer}: {error}");
        }
    }
}
