// ============================================================================
// Cycle de mise à jour
// ============================================================================
// Un cycle complet :
// 1. Lit la ligne des symboles
// 2. Demande les market caps en une seule requête
// 3. Reconstruit la ligne de sortie, position par position
// 4. Écrit la ligne (un seul appel)
// 5. Écrit le timestamp (un seul appel)
//
// Politique d'échec :
// - une erreur d'API ou réseau arrête le cycle AVANT toute écriture
// - un symbole introuvable donne "ERROR" dans sa cellule seulement
// ============================================================================

use tracing::{info, instrument, warn};

use crate::api::{QuoteResponse, QuoteSource};
use crate::config::SheetLayout;
use crate::error::CycleError;
use crate::models::{CellValue, OutputRow, Stamp, TickerRow};
use crate::scheduler::Clock;
use crate::sheets::{a1, SheetBackend};

/// Résultat d'un cycle terminé sans erreur
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Aucun symbole dans la ligne : rien n'a été demandé ni écrit
    NoSymbols,

    /// Ligne et timestamp écrits
    Updated {
        /// Symboles distincts demandés
        symbols: usize,
        /// Cellules écrites avec une market cap
        values: usize,
        /// Cellules écrites avec le marqueur d'erreur
        errors: usize,
        stamp: Stamp,
    },
}

/// Construit la ligne de sortie alignée sur la ligne de symboles
///
/// - cellule vide -> ""
/// - symbole trouvé -> market cap (f64)
/// - symbole absent ou valeur invalide -> "ERROR"
pub fn build_output_row(row: &TickerRow, quotes: &QuoteResponse, currency: &str) -> OutputRow {
    row.positions()
        .map(|position| match position {
            None => CellValue::Empty,
            Some(symbol) => match quotes.market_cap(symbol, currency) {
                Some(market_cap) => CellValue::Number(market_cap),
                None => {
                    warn!(symbol, currency, "No usable market cap for symbol");
                    CellValue::error()
                }
            },
        })
        .collect()
}

/// Exécute un cycle de mise à jour
///
/// CONCEPT RUST : &dyn Trait
/// - le cycle ne connaît ni Google ni CoinMarketCap, seulement les traits
/// - la session et le client sont construits une fois dans main()
#[instrument(skip_all, fields(ticker_row = layout.ticker_row, target_row = layout.market_cap_row))]
pub async fn run_update_cycle(
    sheet: &dyn SheetBackend,
    quotes: &dyn QuoteSource,
    layout: &SheetLayout,
    clock: &dyn Clock,
) -> Result<CycleOutcome, CycleError> {
    info!("Updating...");

    let row = TickerRow::new(sheet.row_values(layout.ticker_row).await?);
    let symbols = row.symbols();

    if symbols.is_empty() {
        info!(cells = row.len(), "No coins found.");
        return Ok(CycleOutcome::NoSymbols);
    }

    let response = quotes.latest_quotes(&symbols, &layout.currency).await?;
    let output = build_output_row(&row, &response, &layout.currency);

    let range = a1::row_range(layout.market_cap_row, output.len());
    let errors = output.error_count();
    let values = output.value_count();
    sheet.update(&range, &[output.cells().to_vec()]).await?;

    let stamp = Stamp::new(clock.now(), &layout.zone);
    sheet
        .update(
            &layout.timestamp_cell,
            &[vec![CellValue::Text(stamp.to_string())]],
        )
        .await?;

    info!(
        range = %range,
        symbols = symbols.len(),
        values,
        errors,
        "Updated at {}",
        stamp.time_string()
    );

    Ok(CycleOutcome::Updated {
        symbols: symbols.len(),
        values,
        errors,
        stamp,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ERROR_MARKER;
    use crate::scheduler::tests::FakeClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // Faux tableur : mémorise les écritures
    // ------------------------------------------------------------------

    #[derive(Default)]
    pub(crate) struct FakeSheet {
        pub row: Vec<String>,
        pub writes: Mutex<Vec<(String, Vec<Vec<CellValue>>)>>,
        pub fail_writes: bool,
    }

    impl FakeSheet {
        pub(crate) fn with_row(cells: &[&str]) -> Self {
            Self {
                row: cells.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }
        }

        pub(crate) fn writes(&self) -> Vec<(String, Vec<Vec<CellValue>>)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SheetBackend for FakeSheet {
        async fn row_values(&self, _row: u32) -> Result<Vec<String>, CycleError> {
            Ok(self.row.clone())
        }

        async fn update(&self, range: &str, values: &[Vec<CellValue>]) -> Result<(), CycleError> {
            if self.fail_writes {
                return Err(CycleError::Sheet {
                    operation: "write",
                    status: 403,
                    body: "PERMISSION_DENIED".to_string(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((range.to_string(), values.to_vec()));
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Fausse API de prix : réponses programmées, appels comptés
    // ------------------------------------------------------------------

    pub(crate) struct FakeQuotes {
        pub responses: Mutex<Vec<Result<QuoteResponse, CycleError>>>,
        pub calls: AtomicUsize,
        pub last_symbols: Mutex<Vec<String>>,
    }

    impl FakeQuotes {
        pub(crate) fn new(responses: Vec<Result<QuoteResponse, CycleError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                last_symbols: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn latest_quotes(
            &self,
            symbols: &[String],
            _currency: &str,
        ) -> Result<QuoteResponse, CycleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_symbols.lock().unwrap() = symbols.to_vec();

            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(QuoteResponse::default());
            }
            responses.remove(0)
        }
    }

    pub(crate) fn btc_eth_quotes() -> QuoteResponse {
        let body = json!({
            "data": {
                "BTC": { "quote": { "USD": { "market_cap": 123456.0 } } },
                "ETH": { "quote": { "USD": { "market_cap": 98765.0 } } }
            }
        });
        QuoteResponse::from_body(200, &body.to_string()).unwrap()
    }

    pub(crate) fn malformed() -> CycleError {
        CycleError::MalformedResponse {
            status: 401,
            body: r#"{"status":{"error_code":1001}}"#.to_string(),
        }
    }

    fn clock() -> FakeClock {
        FakeClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap())
    }

    // ------------------------------------------------------------------
    // build_output_row
    // ------------------------------------------------------------------

    #[test]
    fn test_output_row_example() {
        let row = TickerRow::from(vec!["BTC", "", "ETH", "FAKE"]);
        let output = build_output_row(&row, &btc_eth_quotes(), "USD");

        assert_eq!(
            output.cells(),
            &[
                CellValue::Number(123456.0),
                CellValue::Empty,
                CellValue::Number(98765.0),
                CellValue::Text(ERROR_MARKER.to_string()),
            ]
        );
    }

    #[test]
    fn test_padded_symbol_resolves() {
        // Les espaces autour du symbole ne comptent pas
        let row = TickerRow::from(vec![" BTC ", "", "ETH\t"]);
        let output = build_output_row(&row, &btc_eth_quotes(), "USD");

        assert_eq!(
            output.cells(),
            &[
                CellValue::Number(123456.0),
                CellValue::Empty,
                CellValue::Number(98765.0),
            ]
        );
        assert_eq!(output.error_count(), 0);
    }

    #[tokio::test]
    async fn test_padded_symbols_are_requested_trimmed() {
        let sheet = FakeSheet::with_row(&[" BTC ", " ETH"]);
        let quotes = FakeQuotes::new(vec![Ok(btc_eth_quotes())]);

        run_update_cycle(&sheet, &quotes, &SheetLayout::default(), &clock())
            .await
            .unwrap();

        assert_eq!(*quotes.last_symbols.lock().unwrap(), vec!["BTC", "ETH"]);
        assert_eq!(
            sheet.writes()[0].1,
            vec![vec![CellValue::Number(123456.0), CellValue::Number(98765.0)]]
        );
    }

    #[test]
    fn test_output_row_keeps_length_and_blanks() {
        let rows: Vec<Vec<&str>> = vec![
            vec![],
            vec!["", "", ""],
            vec!["BTC"],
            vec!["", "BTC", " ", "XRP", ""],
            vec![" ETH ", "ETH", "", "BTC"],
        ];

        for cells in rows {
            let row = TickerRow::from(cells.clone());
            let output = build_output_row(&row, &btc_eth_quotes(), "USD");

            assert_eq!(output.len(), cells.len());
            for (input, cell) in cells.iter().zip(output.cells()) {
                assert_eq!(input.trim().is_empty(), cell.is_empty(), "input {:?}", input);
            }
        }
    }

    #[test]
    fn test_bad_symbol_does_not_affect_siblings() {
        let body = json!({
            "data": {
                "BTC": { "quote": { "USD": { "market_cap": 1.0 } } },
                "DOGE": { "quote": { "USD": { "market_cap": "oops" } } },
                "ETH": { "quote": { "USD": { "market_cap": 2.0 } } }
            }
        });
        let quotes = QuoteResponse::from_body(200, &body.to_string()).unwrap();
        let row = TickerRow::from(vec!["BTC", "DOGE", "ETH"]);

        let output = build_output_row(&row, &quotes, "USD");
        assert_eq!(output.cells()[0], CellValue::Number(1.0));
        assert!(output.cells()[1].is_error());
        assert_eq!(output.cells()[2], CellValue::Number(2.0));
    }

    // ------------------------------------------------------------------
    // run_update_cycle
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_cycle_writes_row_then_stamp() {
        let sheet = FakeSheet::with_row(&["BTC", "", "ETH", "FAKE"]);
        let quotes = FakeQuotes::new(vec![Ok(btc_eth_quotes())]);
        let layout = SheetLayout::default();

        let outcome = run_update_cycle(&sheet, &quotes, &layout, &clock())
            .await
            .unwrap();

        match outcome {
            CycleOutcome::Updated { symbols, values, errors, stamp } => {
                assert_eq!(symbols, 3);
                assert_eq!(values, 2);
                assert_eq!(errors, 1);
                assert_eq!(stamp.to_string(), "Last update: 2024-05-01 12:05:00 UTC");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(quotes.calls(), 1);
        assert_eq!(*quotes.last_symbols.lock().unwrap(), vec!["BTC", "ETH", "FAKE"]);

        let writes = sheet.writes();
        assert_eq!(writes.len(), 2);

        assert_eq!(writes[0].0, "A7:D7");
        assert_eq!(
            writes[0].1,
            vec![vec![
                CellValue::Number(123456.0),
                CellValue::Empty,
                CellValue::Number(98765.0),
                CellValue::error(),
            ]]
        );

        assert_eq!(writes[1].0, "A1");
        assert_eq!(
            writes[1].1,
            vec![vec![CellValue::Text(
                "Last update: 2024-05-01 12:05:00 UTC".to_string()
            )]]
        );
    }

    #[tokio::test]
    async fn test_empty_row_skips_everything() {
        for cells in [vec![], vec!["", "  "]] {
            let sheet = FakeSheet::with_row(&cells);
            let quotes = FakeQuotes::new(vec![]);

            let outcome = run_update_cycle(&sheet, &quotes, &SheetLayout::default(), &clock())
                .await
                .unwrap();

            assert_eq!(outcome, CycleOutcome::NoSymbols);
            assert_eq!(quotes.calls(), 0);
            assert!(sheet.writes().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_response_writes_nothing() {
        let sheet = FakeSheet::with_row(&["BTC"]);
        let quotes = FakeQuotes::new(vec![Err(malformed())]);

        let err = run_update_cycle(&sheet, &quotes, &SheetLayout::default(), &clock())
            .await
            .unwrap_err();

        assert_eq!(err.category(), "malformed-response");
        assert!(sheet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_stops_before_stamp() {
        let sheet = FakeSheet {
            row: vec!["BTC".to_string()],
            fail_writes: true,
            ..Default::default()
        };
        let quotes = FakeQuotes::new(vec![Ok(btc_eth_quotes())]);

        let err = run_update_cycle(&sheet, &quotes, &SheetLayout::default(), &clock())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "spreadsheet");
    }
}
