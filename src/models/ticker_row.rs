// ============================================================================
// Structure : TickerRow
// ============================================================================
// Représente la ligne de symboles lue dans la feuille (ex: ligne 6)
//
// CONCEPTS RUST :
// 1. Newtype : Vec<String> enveloppé pour lui donner un sens métier
// 2. Iterators : filter / map / collect pour extraire les symboles
// 3. Les cellules vides restent dans la ligne : leur position compte
// ============================================================================

use std::collections::HashSet;

/// Ligne de symboles telle que lue dans le tableur
///
/// Les entrées vides sont conservées : elles servent de "trous"
/// positionnels que la ligne de sortie doit reproduire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerRow {
    cells: Vec<String>,
}

impl TickerRow {
    /// Crée une ligne à partir des valeurs brutes des cellules
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Nombre de cellules (vides comprises)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Itère sur chaque position : None pour une cellule vide,
    /// Some(symbole nettoyé) sinon
    ///
    /// CONCEPT RUST : impl Trait en retour
    /// - Le type concret de l'itérateur reste caché à l'appelant
    pub fn positions(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.cells.iter().map(|cell| {
            let symbol = cell.trim();
            if symbol.is_empty() {
                None
            } else {
                Some(symbol)
            }
        })
    }

    /// Retourne les symboles non vides, nettoyés, sans doublon,
    /// dans l'ordre de première apparition
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.positions()
            .flatten()
            .filter(|symbol| seen.insert(*symbol))
            .map(str::to_string)
            .collect()
    }
}

impl From<Vec<String>> for TickerRow {
    fn from(cells: Vec<String>) -> Self {
        Self::new(cells)
    }
}

impl From<Vec<&str>> for TickerRow {
    fn from(cells: Vec<&str>) -> Self {
        Self::new(cells.into_iter().map(str::to_string).collect())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
