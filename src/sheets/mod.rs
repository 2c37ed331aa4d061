// ============================================================================
// Module : sheets
// ============================================================================
// Accès au tableur (Google Sheets) :
// - auth   : compte de service -> access token
// - a1     : notation des cellules et plages
// - client : session HTTP sur la première feuille
// ============================================================================

use async_trait::async_trait;

use crate::error::CycleError;
use crate::models::CellValue;

pub mod a1;
pub mod auth;
pub mod client;

pub use client::SheetSession;

/// Opérations du tableur utilisées par un cycle
///
/// CONCEPT RUST : Trait comme frontière
/// - SheetSession l'implémente sur l'API Google
/// - les tests l'implémentent en mémoire
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Lit les valeurs d'une ligne (1-indexée) de la feuille sélectionnée
    ///
    /// Les cellules vides en fin de ligne ne sont pas retournées.
    async fn row_values(&self, row: u32) -> Result<Vec<String>, CycleError>;

    /// Écrit un bloc de valeurs (lignes de cellules) dans une plage A1
    async fn update(&self, range: &str, values: &[Vec<CellValue>]) -> Result<(), CycleError>;
}
