use std::env;
use std::process::ExitCode;

use anyhow::Context;
use carebook_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use carebook_server::{ServerBuilder, init_tracing};

/// Exit status when the server cannot start or stops on an error.
const FAILURE_EXIT_CODE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "carebook server failed");
            eprintln!("carebook-server: {err:#}");
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("carebook-server: ignoring unreadable .env file: {e}"),
    }
}

async fn serve() -> anyhow::Result<()> {
    let config_path = config_path(env::args().skip(1), env::var("CAREBOOK_CONFIG").ok())?;
    let cfg = load_config(Some(&config_path))
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("invalid configuration ({config_path})"))?;

    init_tracing(&cfg.logging.level);
    tracing::info!(
        config = %config_path,
        backend = ?cfg.storage.backend,
        storage_path = %cfg.storage.path.display(),
        addr = %cfg.addr(),
        "starting carebook server"
    );

    let server = ServerBuilder::new()
        .with_config(cfg)
        .build()
        .await
        .context("patient store could not be opened")?;
    server.run().await?;

    tracing::info!("carebook server stopped");
    Ok(())
}

/// `--config <path>` or `--config=<path>`, then `CAREBOOK_CONFIG`, then
/// `carebook.toml` in the working directory.
fn config_path(
    mut args: impl Iterator<Item = String>,
    from_env: Option<String>,
) -> anyhow::Result<String> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().context("--config needs a path");
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(path.to_owned());
        }
    }
    Ok(from_env
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned()))
}
