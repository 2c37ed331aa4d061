// ============================================================================
// Module : error
// ============================================================================
// Erreurs typées du programme
//
// Deux niveaux :
// - ConfigError : fatale au démarrage (le process s'arrête)
// - CycleError : locale à un cycle (loggée, le scheduler continue)
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère Display + std::error::Error
// - #[error("...")] définit le message de chaque variant
// - anyhow reste utilisé au bord de l'application (main) pour le contexte
// ============================================================================

use thiserror::Error;

/// Erreur de configuration (démarrage)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable d'environnement absente ou vide
    #[error("Missing {0}")]
    Missing(&'static str),

    /// Document d'identifiants Google illisible
    #[error("{var} is not a valid service-account credential document: {reason}")]
    InvalidCredentials { var: &'static str, reason: String },

    /// URL de tableur sans identifiant reconnaissable
    #[error("cannot extract a spreadsheet key from {0:?}")]
    InvalidSheetUrl(String),
}

/// Erreur d'un cycle de mise à jour
///
/// CONCEPT : Classification explicite
/// - Le scheduler logge la catégorie (category()) plutôt qu'un message opaque
#[derive(Debug, Error)]
pub enum CycleError {
    /// Échec réseau : connexion, timeout, corps illisible
    #[error("network failure calling {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Réponse de l'API de prix sans l'enveloppe attendue
    #[error("malformed price response (HTTP {status}): {body}")]
    MalformedResponse { status: u16, body: String },

    /// Le tableur a refusé une lecture ou une écriture
    #[error("spreadsheet {operation} failed (HTTP {status}): {body}")]
    Sheet {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Impossible d'obtenir un jeton d'accès Google
    #[error("service-account authentication failed: {0}")]
    Auth(String),
}

impl CycleError {
    /// Libellé stable de la catégorie, pour les logs
    pub fn category(&self) -> &'static str {
        match self {
            CycleError::Network { .. } => "network",
            CycleError::MalformedResponse { .. } => "malformed-response",
            CycleError::Sheet { .. } => "spreadsheet",
            CycleError::Auth(_) => "auth",
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
