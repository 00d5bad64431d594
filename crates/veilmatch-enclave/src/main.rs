//! VeilMatch enclave replay runner.
//!
//! Usage: `veilmatch-enclave [config.json] < triggers.ndjson > results.ndjson`
//!
//! Secrets come from `VEILMATCH_ENCLAVE_KEY`, `VEILMATCH_SETTLEMENT_SECRET`
//! and `VEILMATCH_REPORT_KEY`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{error, info};
use veilmatch_enclave::config::load_validated;
use veilmatch_enclave::logging::{LogConfig, init_logging};
use veilmatch_enclave::{
    HttpRestingOrderSource, MemoryOrderStore, ReplayRunner, RestingOrderSource, build_handler,
};
use veilmatch_types::constants::{ENGINE_NAME, VERSION};
use veilmatch_types::{EnclaveSecrets, Result};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Enclave runner stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let secrets = EnclaveSecrets::from_env()?;
    let config = load_validated(config_path.as_deref(), &secrets)?;

    let store = config.backend.base_url.is_none().then(MemoryOrderStore::new);
    let source: Arc<dyn RestingOrderSource> = match &store {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(HttpRestingOrderSource::from_config(&config.backend)?),
    };
    let handler = build_handler(&config, &secrets, source)?;
    info!(
        engine = ENGINE_NAME,
        version = VERSION,
        public_key = %handler.public_key_hex(),
        memory_pool = store.is_some(),
        "Enclave ready"
    );

    let runner = ReplayRunner::new(handler, store);
    let processed = runner
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    info!(processed, "Input exhausted");
    Ok(())
}
