// ============================================================================
// Module : models
// ============================================================================
// Structures de données d'un cycle de mise à jour
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod cell;       // Valeurs de cellules et ligne de sortie
pub mod stamp;      // Texte de timestamp "Last update: ..."
pub mod ticker_row; // Ligne de symboles lue dans la feuille

// Re-export des structures principales pour simplifier les imports
// On peut faire : use capsheet::models::TickerRow;
pub use cell::{CellValue, OutputRow, ERROR_MARKER};
pub use stamp::{Stamp, StampZone};
pub use ticker_row::TickerRow;
