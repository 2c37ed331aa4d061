// ============================================================================
// Logging : stdout + fichier avec rotation quotidienne
// ============================================================================
// Deux sorties :
// - stdout : lignes de progression lisibles (niveau info), toujours actives
// - fichier : logs détaillés avec rotation quotidienne, si le répertoire
//   est utilisable
//
// CONCEPTS RUST :
// 1. Option<Layer> est lui-même un Layer : None = couche absente
// 2. Builder faillible au lieu d'un constructeur qui panique
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Répertoire des logs, relatif au répertoire courant
pub const LOG_DIR: &str = "./logs";

/// Préfixe des fichiers : capsheet.log.AAAA-MM-JJ
pub const LOG_FILE_PREFIX: &str = "capsheet.log";

/// Filtre par défaut : debug pour capsheet, info pour les dépendances
const DEFAULT_FILTER: &str = "capsheet=debug,info";

/// Ouvre l'appender du fichier de log, sans paniquer
///
/// Échoue si le répertoire ne peut pas être créé (ex: un fichier porte
/// déjà ce nom) ou si le fichier du jour ne peut pas être ouvert.
pub fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))
}

/// Initialise le système de logging
///
/// La sortie stdout est toujours installée. Le fichier n'est qu'un
/// complément : s'il est indisponible, un avertissement part sur stderr.
///
/// # Utilisation
/// ```bash
/// # Voir les logs détaillés en temps réel
/// tail -f ./logs/capsheet.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=capsheet=trace cargo run
/// ```
pub fn init(log_dir: &Path) {
    let file_layer = match file_appender(log_dir) {
        Ok(appender) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: capsheet::cycle)
                .with_line_number(true), // Inclut le numéro de ligne
        ),
        Err(e) => {
            eprintln!("⚠️  Warning: file logging disabled: {:#}", e);
            eprintln!("   Continuing with stdout only...");
            None
        }
    };
    let file_enabled = file_layer.is_some();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .compact()
        .with_filter(LevelFilter::INFO);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .try_init();

    if let Err(e) = installed {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        return;
    }

    if file_enabled {
        info!(log_dir = %log_dir.display(), "Logging initialised");
    } else {
        warn!(log_dir = %log_dir.display(), "Logging initialised without log file");
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
