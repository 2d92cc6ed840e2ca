//! DudelDu - standalone SHOUTcast/ICY streaming server.
//!
//! Streams playlists of media files to most Icecast-compatible clients
//! (VLC, ServeStream, ...). Playlists are simple JSON files, items are
//! normal media files on disk or URLs, metadata (artist and title) is sent
//! to clients that ask for it, and basic authentication is supported.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dudeldu_core::{EngineConfig, FilePlaylistFactory, Server, StreamHandler};
use tokio::signal;

/// DudelDu - a simple audio streaming server using the SHOUTcast protocol.
#[derive(Parser, Debug)]
#[command(name = "dudeldu")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Authentication can also be defined via the \
    environment variable: DUDELDU_AUTH=\"<user>:<pass>\"")]
struct Args {
    /// Playlist definition file (JSON).
    playlist: PathBuf,

    /// Server hostname to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on.
    #[arg(long, default_value_t = 9091)]
    port: u16,

    /// Authentication as <user>:<pass>.
    #[arg(long, env = "DUDELDU_AUTH", default_value = "", hide_env_values = true)]
    auth: String,

    /// Loop playlists.
    #[arg(long = "loop")]
    loop_playlist: bool,

    /// Shuffle playlists.
    #[arg(long)]
    shuffle: bool,

    /// Prefix all item paths with a string.
    #[arg(long = "pp", default_value = "")]
    path_prefix: String,

    /// Thread pool size (advisory).
    #[arg(long = "tps", default_value_t = 10)]
    thread_pool_size: usize,

    /// Frame queue size (advisory).
    #[arg(long = "fqs", default_value_t = 10000)]
    frame_queue_size: usize,

    /// Enable extra debugging output.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    log::info!("DudelDu {}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Serving playlist {} on {}:{}",
        args.playlist.display(),
        args.host,
        args.port
    );
    log::info!("Thread pool size: {}", args.thread_pool_size);
    log::info!("Frame queue size: {}", args.frame_queue_size);
    log::info!("Loop playlist: {}", args.loop_playlist);
    log::info!("Shuffle playlist: {}", args.shuffle);
    log::info!("Path prefix: {}", args.path_prefix);
    if !args.auth.is_empty() {
        log::info!("Required authentication: {}", args.auth);
    }

    let config = EngineConfig::default();
    let factory = FilePlaylistFactory::new(&args.playlist, &args.path_prefix, config.frame_size)
        .await
        .context("Failed to load playlist definition")?;

    let credential = (!args.auth.is_empty()).then(|| args.auth.clone());
    let handler = StreamHandler::new(
        Arc::new(factory),
        config,
        args.loop_playlist,
        args.shuffle,
        credential,
    );

    let server = Arc::new(Server::new(Arc::new(handler)));
    let addr = format!("{}:{}", args.host, args.port);

    let run_server = Arc::clone(&server);
    let mut server_task = tokio::spawn(async move { run_server.run(&addr, None).await });

    tokio::select! {
        result = &mut server_task => {
            result.context("Server task failed")??;
        }
        _ = shutdown_signal() => {
            log::info!("Shutting down");
            server.shutdown();
            server_task.await.context("Server task failed")??;
        }
    }

    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
