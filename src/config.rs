// ============================================================================
// Module : config
// ============================================================================
// Charge la configuration depuis les variables d'environnement
//
// Variables lues :
// - CMC_API_KEY        : clé de l'API CoinMarketCap
// - GOOGLE_CREDENTIALS : JSON du compte de service Google
// - SHEET_URL          : URL du tableur (ou SHEET_KEY : son identifiant)
//
// CONCEPT RUST : Fail fast
// - Toute erreur ici est fatale : main() la remonte et le process s'arrête
// - Rien n'est réessayé
// ============================================================================

use std::fmt;

use tracing::debug;

use crate::error::ConfigError;
use crate::models::StampZone;
use crate::sheets::auth::ServiceAccountKey;

pub const ENV_API_KEY: &str = "CMC_API_KEY";
pub const ENV_CREDENTIALS: &str = "GOOGLE_CREDENTIALS";
pub const ENV_SHEET_URL: &str = "SHEET_URL";
pub const ENV_SHEET_KEY: &str = "SHEET_KEY";

// ============================================================================
// Disposition de la feuille
// ============================================================================

/// Emplacements fixes dans la première feuille du tableur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Ligne contenant les symboles (1-indexée)
    pub ticker_row: u32,

    /// Ligne où écrire les market caps (1-indexée)
    pub market_cap_row: u32,

    /// Cellule du timestamp (notation A1)
    pub timestamp_cell: String,

    /// Devise de conversion demandée à CoinMarketCap
    pub currency: String,

    /// Fuseau du timestamp
    pub zone: StampZone,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            ticker_row: 6,
            market_cap_row: 7,
            timestamp_cell: "A1".to_string(),
            currency: "USD".to_string(),
            zone: StampZone::utc(),
        }
    }
}

// ============================================================================
// Identifiant du tableur
// ============================================================================

/// Clé stable d'un tableur Google Sheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    /// Accepte une URL complète ou directement la clé
    ///
    /// Exemple :
    /// https://docs.google.com/spreadsheets/d/1AbC-xyz/edit#gid=0 -> "1AbC-xyz"
    pub fn parse(url_or_key: &str) -> Result<Self, ConfigError> {
        let input = url_or_key.trim();

        if let Some((_, rest)) = input.split_once("/spreadsheets/d/") {
            let key = rest
                .split(|c| c == '/' || c == '?' || c == '#')
                .next()
                .unwrap_or_default();

            if key.is_empty() {
                return Err(ConfigError::InvalidSheetUrl(input.to_string()));
            }
            return Ok(Self(key.to_string()));
        }

        // Une URL qui n'a pas la forme attendue n'est pas une clé
        if input.is_empty() || input.contains("://") || input.contains('/') {
            return Err(ConfigError::InvalidSheetUrl(input.to_string()));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Configuration complète
// ============================================================================

/// Configuration chargée une seule fois au démarrage
#[derive(Clone)]
pub struct Config {
    pub cmc_api_key: String,
    pub credentials: ServiceAccountKey,
    pub spreadsheet: SpreadsheetId,
    pub layout: SheetLayout,
}

// La clé d'API n'apparaît jamais en clair dans les logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cmc_api_key", &redact(&self.cmc_api_key))
            .field("service_account", &self.credentials.client_email)
            .field("spreadsheet", &self.spreadsheet)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Config {
    /// Lit la configuration depuis l'environnement du process
    ///
    /// Un fichier .env optionnel est chargé d'abord ; les variables déjà
    /// définies dans l'environnement restent prioritaires.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Construit la configuration à partir d'une fonction de lookup
    ///
    /// CONCEPT RUST : Injection par closure
    /// - from_env() passe std::env::var
    /// - les tests passent une HashMap, sans toucher à l'environnement global
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());

        let cmc_api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let credentials_json = get(ENV_CREDENTIALS).ok_or(ConfigError::Missing(ENV_CREDENTIALS))?;
        let credentials = ServiceAccountKey::from_json(&credentials_json).map_err(|reason| {
            ConfigError::InvalidCredentials {
                var: ENV_CREDENTIALS,
                reason,
            }
        })?;

        let spreadsheet = match (get(ENV_SHEET_URL), get(ENV_SHEET_KEY)) {
            (Some(url), _) => SpreadsheetId::parse(&url)?,
            (None, Some(key)) => SpreadsheetId::parse(&key)?,
            (None, None) => return Err(ConfigError::Missing(ENV_SHEET_URL)),
        };

        Ok(Self {
            cmc_api_key: cmc_api_key.trim().to_string(),
            credentials,
            spreadsheet,
            layout: SheetLayout::default(),
        })
    }
}

/// Ne garde que les 4 derniers caractères d'un secret
fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("...{}", suffix)
}

// ============================================================================
// Tests unitaires
// ============================================================================
