// ============================================================================
// Client Google Sheets
// ============================================================================
// Session authentifiée sur un tableur, ouverte une fois au démarrage
// et réutilisée par tous les cycles.
//
// API utilisée (Sheets v4) :
// - GET  /v4/spreadsheets/{id}?fields=sheets.properties.title
// - GET  /v4/spreadsheets/{id}/values/{range}
// - PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW
// ============================================================================

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::SpreadsheetId;
use crate::error::CycleError;
use crate::models::CellValue;
use crate::sheets::a1;
use crate::sheets::auth::{ServiceAccountAuth, ServiceAccountKey};
use crate::sheets::SheetBackend;

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Timeout des appels au tableur
const SHEETS_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Structures JSON de l'API Sheets
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Réponse d'une lecture de plage
///
/// "values" est absent quand la plage est entièrement vide
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Corps d'une écriture de plage
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<CellValue>],
}

// ============================================================================
// Session
// ============================================================================

/// Session sur la première feuille d'un tableur
pub struct SheetSession {
    client: Client,
    base_url: Url,
    spreadsheet: SpreadsheetId,
    sheet_title: String,
    auth: ServiceAccountAuth,
}

impl SheetSession {
    /// Ouvre le tableur sur l'API Google publique
    pub async fn open(key: &ServiceAccountKey, spreadsheet: SpreadsheetId) -> Result<Self> {
        Self::open_at(SHEETS_BASE_URL, key, spreadsheet).await
    }

    /// Ouvre le tableur en visant une URL de base donnée (tests)
    ///
    /// Sélectionne la première feuille : son titre sert de préfixe
    /// à toutes les plages.
    #[instrument(skip(key), fields(account = %key.client_email))]
    pub async fn open_at(
        base_url: &str,
        key: &ServiceAccountKey,
        spreadsheet: SpreadsheetId,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Sheets base URL {}", base_url))?;

        let client = Client::builder()
            .timeout(SHEETS_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for Google Sheets")?;

        let auth = ServiceAccountAuth::new(client.clone(), key)?;
        let token = auth
            .access_token()
            .await
            .context("Failed to authenticate service account")?;

        let url = spreadsheet_url(&base_url, &spreadsheet, &[])?;
        debug!(url = %url, "Fetching spreadsheet metadata");

        let response = client
            .get(url)
            .bearer_auth(&token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .context("Failed to reach Google Sheets")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Cannot open spreadsheet {}: HTTP {} {}",
                spreadsheet,
                status,
                body
            ));
        }

        let meta: SpreadsheetMeta = response
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        let sheet_title = meta
            .sheets
            .into_iter()
            .next()
            .map(|sheet| sheet.properties.title)
            .with_context(|| format!("Spreadsheet {} has no sheet", spreadsheet))?;

        info!(spreadsheet = %spreadsheet, sheet = %sheet_title, "Spreadsheet opened");

        Ok(Self {
            client,
            base_url,
            spreadsheet,
            sheet_title,
            auth,
        })
    }

    /// Titre de la feuille sélectionnée
    pub fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    pub fn spreadsheet(&self) -> &SpreadsheetId {
        &self.spreadsheet
    }

    fn values_url(&self, range: &str) -> std::result::Result<Url, CycleError> {
        let range = a1::qualified(&self.sheet_title, range);
        spreadsheet_url(&self.base_url, &self.spreadsheet, &["values", &range])
            .map_err(|e| CycleError::Sheet {
                operation: "build-url",
                status: 0,
                body: e.to_string(),
            })
    }

    /// Vérifie le statut HTTP, retourne le corps
    async fn check(
        operation: &'static str,
        response: reqwest::Response,
    ) -> std::result::Result<String, CycleError> {
        let status = response.status();
        let body = response.text().await.map_err(|source| CycleError::Network {
            service: "google-sheets",
            source,
        })?;

        if !status.is_success() {
            return Err(CycleError::Sheet {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl SheetBackend for SheetSession {
    #[instrument(skip(self), fields(sheet = %self.sheet_title))]
    async fn row_values(&self, row: u32) -> std::result::Result<Vec<String>, CycleError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(&a1::whole_row(row))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await
            .map_err(|source| CycleError::Network {
                service: "google-sheets",
                source,
            })?;

        let body = Self::check("read", response).await?;
        let range: ValueRange = serde_json::from_str(&body).map_err(|e| CycleError::Sheet {
            operation: "read",
            status: 200,
            body: format!("unexpected body ({}): {}", e, body),
        })?;

        let cells = range
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(cell_to_string)
            .collect::<Vec<_>>();

        debug!(cells = cells.len(), "Row read");
        Ok(cells)
    }

    #[instrument(skip(self, values), fields(sheet = %self.sheet_title, rows = values.len()))]
    async fn update(
        &self,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> std::result::Result<(), CycleError> {
        let token = self.auth.access_token().await?;
        let qualified = a1::qualified(&self.sheet_title, range);
        let url = self.values_url(range)?;

        let body = ValueRangeUpdate {
            range: &qualified,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(|source| CycleError::Network {
                service: "google-sheets",
                source,
            })?;

        Self::check("write", response).await?;
        debug!("Range written");
        Ok(())
    }
}

/// {base}/v4/spreadsheets/{id}/{extra...}, chaque segment encodé
fn spreadsheet_url(base: &Url, spreadsheet: &SpreadsheetId, extra: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot be a base URL", base))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet.as_str()])
        .extend(extra);
    Ok(url)
}

/// Les valeurs formatées sont des chaînes ; les autres types sont convertis
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_url_encodes_range() {
        let base = Url::parse("https://sheets.googleapis.com").unwrap();
        let id = SpreadsheetId::parse("KEY").unwrap();

        let url = spreadsheet_url(&base, &id, &["values", "'My Sheet'!A7:D7"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/KEY/values/'My%20Sheet'!A7:D7"
        );

        let meta = spreadsheet_url(&base, &id, &[]).unwrap();
        assert_eq!(meta.path(), "/v4/spreadsheets/KEY");
    }

    #[test]
    fn test_update_body_shape() {
        let values = vec![vec![
            CellValue::Number(1.5),
            CellValue::Empty,
            CellValue::error(),
        ]];
        let body = ValueRangeUpdate {
            range: "'Sheet1'!A7:C7",
            major_dimension: "ROWS",
            values: &values,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "range": "'Sheet1'!A7:C7",
                "majorDimension": "ROWS",
                "values": [[1.5, "", "ERROR"]]
            })
        );
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(serde_json::json!("BTC")), "BTC");
        assert_eq!(cell_to_string(serde_json::json!(null)), "");
        assert_eq!(cell_to_string(serde_json::json!(42)), "42");
    }
}
