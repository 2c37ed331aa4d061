// ============================================================================
// Structure : Stamp
// ============================================================================
// Texte "Last update: ..." écrit dans la cellule de timestamp (ex: A1)
//
// CONCEPTS RUST :
// 1. chrono::FixedOffset : fuseau à décalage fixe (pas de changement d'heure)
// 2. Display : permet d'écrire le stamp avec {} ou .to_string()
// ============================================================================

use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Préfixe du texte de timestamp
pub const STAMP_LABEL: &str = "Last update:";

/// Format d'affichage de la date
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fuseau fixe dans lequel le timestamp est rendu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampZone {
    offset: FixedOffset,
    label: String,
}

impl StampZone {
    /// Crée un fuseau à partir d'un décalage en secondes (est positif)
    ///
    /// Retourne None si le décalage sort de ±24h
    pub fn new(offset_seconds: i32, label: impl Into<String>) -> Option<Self> {
        Some(Self {
            offset: FixedOffset::east_opt(offset_seconds)?,
            label: label.into(),
        })
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            label: "UTC".to_string(),
        }
    }
}

impl Default for StampZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Timestamp d'un cycle réussi, rendu dans un fuseau fixe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    local: DateTime<FixedOffset>,
    zone_label: String,
}

impl Stamp {
    pub fn new(now: DateTime<Utc>, zone: &StampZone) -> Self {
        Self {
            local: now.with_timezone(&zone.offset),
            zone_label: zone.label.clone(),
        }
    }

    /// Partie date/heure seule, sans le libellé (utile pour les logs)
    pub fn time_string(&self) -> String {
        format!("{} {}", self.local.format(STAMP_FORMAT), self.zone_label)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", STAMP_LABEL, self.time_string())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamp_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let stamp = Stamp::new(now, &StampZone::utc());

        assert_eq!(stamp.to_string(), "Last update: 2024-03-09 14:05:00 UTC");
        assert_eq!(stamp.time_string(), "2024-03-09 14:05:00 UTC");
    }

    #[test]
    fn test_stamp_fixed_offset_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 22, 30, 15).unwrap();
        let zone = StampZone::new(2 * 3600, "UTC+2").unwrap();
        let stamp = Stamp::new(now, &zone);

        assert_eq!(stamp.to_string(), "Last update: 2024-03-10 00:30:15 UTC+2");
    }

    #[test]
    fn test_invalid_offset() {
        assert!(StampZone::new(25 * 3600, "bad").is_none());
    }
}
