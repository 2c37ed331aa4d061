// ============================================================================
// Capsheet - Market caps CoinMarketCap -> Google Sheets
// ============================================================================
// Toutes les 5 minutes (heure pile, :05, :10, ...) :
// - lit les symboles dans la ligne 6 du tableur
// - récupère leurs market caps sur CoinMarketCap
// - écrit les valeurs en ligne 7 et un timestamp en A1
//
// CONCEPTS RUST CLÉS :
// 1. Fail fast : une configuration invalide arrête le process
// 2. Async dans sync : tokio::runtime::Runtime pour la boucle async
// 3. Dépendances explicites : session et client construits une fois
//    puis prêtés au scheduler
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use capsheet::api::CoinMarketCapClient;
use capsheet::config::Config;
use capsheet::logging::{self, LOG_DIR};
use capsheet::scheduler::{Scheduler, SystemClock};
use capsheet::sheets::SheetSession;

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // stdout toujours actif, fichier de log si ./logs est utilisable
    logging::init(Path::new(LOG_DIR));

    // Configuration : toute erreur ici termine le process
    let config = Config::from_env().context("Invalid configuration")?;
    info!(?config, "Configuration loaded");

    // Une erreur de démarrage est affichée une seule fois, sur stderr,
    // par le retour de main
    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(run(config))
}

/// Ouvre les connexions une seule fois, puis tourne indéfiniment
async fn run(config: Config) -> Result<()> {
    let quotes = CoinMarketCapClient::new(&config.cmc_api_key)?;

    let sheet = SheetSession::open(&config.credentials, config.spreadsheet.clone())
        .await
        .context("Failed to open spreadsheet")?;

    info!(
        spreadsheet = %sheet.spreadsheet(),
        sheet = %sheet.sheet_title(),
        ticker_row = config.layout.ticker_row,
        market_cap_row = config.layout.market_cap_row,
        timestamp_cell = %config.layout.timestamp_cell,
        "Capsheet started"
    );

    let clock = SystemClock;
    let mut scheduler = Scheduler::new(&sheet, &quotes, &config.layout, &clock);
    scheduler.run_forever().await;

    Ok(())
}
