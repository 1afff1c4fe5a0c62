//! # Emoji Art CLI
//!
//! Opens a document, applies one command and prints the result.

use clap::Parser;
use emojiart_cli::{CliArgs, CliConfig, EmojiArtApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: `emojiart=info,emojiart_core=info`).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,emojiart=info,emojiart_cli=info,emojiart_core=info")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(args);

    tracing::debug!(
        "Opening {} in {} ({}x{})",
        config.document,
        config.data_dir.display(),
        config.viewport.width,
        config.viewport.height
    );

    let mut app = EmojiArtApp::open(config, tokio::runtime::Handle::current())?;
    let output = app.run().await?;
    print!("{output}");
    Ok(())
}
