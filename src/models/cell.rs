// ============================================================================
// Structures : CellValue / OutputRow
// ============================================================================
// Valeurs écrites dans la ligne des market caps (ex: ligne 7)
//
// CONCEPTS RUST :
// 1. Enum avec données : une cellule est un nombre, un texte ou vide
// 2. #[serde(untagged)] : sérialise la valeur "nue" (123.0, "ERROR", "")
//    au lieu de {"Number": 123.0}
// ============================================================================

use serde::{Serialize, Serializer};

/// Marqueur écrit à la place d'une market cap introuvable
pub const ERROR_MARKER: &str = "ERROR";

/// Valeur d'une cellule à écrire dans le tableur
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Market cap (en devise cible)
    Number(f64),

    /// Texte libre (marqueur d'erreur, timestamp)
    Text(String),

    /// Cellule vide (écrite comme "")
    Empty,
}

impl CellValue {
    /// Cellule contenant le marqueur d'erreur
    pub fn error() -> Self {
        CellValue::Text(ERROR_MARKER.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Text(text) if text == ERROR_MARKER)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

// CONCEPT RUST : Serialize implémenté à la main
// - Empty doit devenir "" (et non null) pour effacer la cellule
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(value) => serializer.serialize_f64(*value),
            CellValue::Text(text) => serializer.serialize_str(text),
            CellValue::Empty => serializer.serialize_str(""),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text.to_string())
        }
    }
}

/// Ligne de sortie, alignée position par position sur la TickerRow
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutputRow {
    cells: Vec<CellValue>,
}

impl OutputRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Nombre de cellules contenant le marqueur d'erreur
    pub fn error_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_error()).count()
    }

    /// Nombre de market caps effectivement écrites
    pub fn value_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, CellValue::Number(_)))
            .count()
    }
}

impl FromIterator<CellValue> for OutputRow {
    fn from_iter<I: IntoIterator<Item = CellValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_serialization() {
        let row: OutputRow = vec![
            CellValue::Number(123456.0),
            CellValue::Empty,
            CellValue::error(),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[123456.0,"","ERROR"]"#);
    }

    #[test]
    fn test_counts() {
        let row = OutputRow::new(vec![
            CellValue::from(1.0),
            CellValue::from(""),
            CellValue::error(),
            CellValue::from(2.5),
        ]);

        assert_eq!(row.len(), 4);
        assert_eq!(row.value_count(), 2);
        assert_eq!(row.error_count(), 1);
        assert!(row.cells()[1].is_empty());
    }
}
