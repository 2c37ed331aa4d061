// ============================================================================
// Notation A1
// ============================================================================
// Conversion (ligne, colonne) -> "B7", plages de ligne "A7:D7",
// et préfixe de feuille "'Sheet 1'!A7:D7"
// ============================================================================

/// Lettres de colonne pour un index 1-indexé (1 -> A, 27 -> AA)
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col.max(1);

    // Base 26 "bijective" : pas de zéro, Z suit Y puis AA suit Z
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }

    letters.iter().rev().collect()
}

/// Cellule A1 d'une position (ligne, colonne), 1-indexées
pub fn rowcol_to_a1(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row.max(1))
}

/// Plage couvrant `len` cellules d'une ligne à partir de la colonne 1
///
/// Exemple : row_range(7, 4) -> "A7:D7"
pub fn row_range(row: u32, len: usize) -> String {
    let last = u32::try_from(len.max(1)).unwrap_or(u32::MAX);
    format!("{}:{}", rowcol_to_a1(row, 1), rowcol_to_a1(row, last))
}

/// Plage d'une ligne entière (ex: "6:6")
pub fn whole_row(row: u32) -> String {
    format!("{0}:{0}", row.max(1))
}

/// Préfixe une plage avec le nom de la feuille
///
/// Les apostrophes du titre sont doublées, comme l'exige l'API Sheets
pub fn qualified(sheet_title: &str, range: &str) -> String {
    format!("'{}'!{}", sheet_title.replace('\'', "''"), range)
}
