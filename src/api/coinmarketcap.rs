// ============================================================================
// API Client : CoinMarketCap
// ============================================================================
// Récupère les market caps depuis l'endpoint "quotes/latest"
//
// Réponse attendue (extrait) :
// {
//   "status": { "error_code": 0, ... },
//   "data": {
//     "BTC": { "quote": { "USD": { "market_cap": 1234567890.12 } } },
//     ...
//   }
// }
//
// CONCEPTS RUST :
// 1. async/await : appel HTTP non-bloquant
// 2. serde_json::Value : JSON dynamique (les symboles sont des clés libres)
// 3. Trait QuoteSource : permet de remplacer l'API par un faux dans les tests
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument};

use crate::error::CycleError;

pub const CMC_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
pub const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";

/// Timeout de la requête de prix
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

// ============================================================================
// Réponse
// ============================================================================

/// Contenu de l'enveloppe "data" : symbole -> objet de cotation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteResponse {
    data: Map<String, Value>,
}

impl QuoteResponse {
    /// Parse le corps brut de la réponse HTTP
    ///
    /// Le statut HTTP n'est pas décisif : seule la présence de l'objet
    /// "data" l'est. Sans lui, la réponse est rejetée avec son corps brut.
    pub fn from_body(status: u16, body: &str) -> Result<Self, CycleError> {
        let malformed = || CycleError::MalformedResponse {
            status,
            body: body.to_string(),
        };

        let mut json: Value = serde_json::from_str(body).map_err(|_| malformed())?;

        match json.get_mut("data").map(Value::take) {
            Some(Value::Object(data)) => Ok(Self { data }),
            _ => Err(malformed()),
        }
    }

    /// Nombre de symboles présents dans la réponse
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Market cap d'un symbole dans la devise donnée
    ///
    /// None si le symbole est absent ou si le champ
    /// quote.<devise>.market_cap n'est pas un nombre fini.
    ///
    /// CONCEPT RUST : Option chaining avec ?
    /// - chaque étape peut échouer, le premier None court-circuite
    pub fn market_cap(&self, symbol: &str, currency: &str) -> Option<f64> {
        let entry = self.data.get(symbol)?;

        // L'API v2 renvoie une liste par symbole : on prend la première entrée
        let entry = match entry {
            Value::Array(entries) => entries.first()?,
            other => other,
        };

        let value = entry.get("quote")?.get(currency)?.get("market_cap")?;
        coerce_f64(value)
    }
}

/// Convertit un nombre JSON (ou une chaîne numérique) en f64 fini
fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}

// ============================================================================
// Source de cotations
// ============================================================================

/// Fournisseur de market caps
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Une seule requête pour tous les symboles
    async fn latest_quotes(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<QuoteResponse, CycleError>;
}

/// Client HTTP CoinMarketCap
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapClient {
    /// Crée le client sur l'API publique
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(CMC_BASE_URL, api_key)
    }

    /// Crée le client sur une URL de base donnée (tests)
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for CoinMarketCap")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl QuoteSource for CoinMarketCapClient {
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    async fn latest_quotes(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<QuoteResponse, CycleError> {
        let url = format!("{}{}", self.base_url, QUOTES_PATH);
        let joined = symbols.join(",");
        debug!(url = %url, symbols = %joined, "Requesting latest quotes");

        // skip_invalid : un symbole inconnu est omis au lieu de faire
        // échouer toute la requête
        let response = self
            .client
            .get(&url)
            .header("Accepts", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("symbol", joined.as_str()),
                ("convert", currency),
                ("skip_invalid", "true"),
            ])
            .send()
            .await
            .map_err(|source| CycleError::Network {
                service: "coinmarketcap",
                source,
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let body = response.text().await.map_err(|source| CycleError::Network {
            service: "coinmarketcap",
            source,
        })?;

        match QuoteResponse::from_body(status.as_u16(), &body) {
            Ok(quotes) => {
                info!(returned = quotes.len(), "Quotes fetched");
                Ok(quotes)
            }
            Err(e) => {
                error!(status = %status, body = %body, "API error: response has no data envelope");
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
