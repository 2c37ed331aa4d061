// ============================================================================
// Capsheet - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // API CoinMarketCap
pub mod config;    // Configuration (variables d'environnement)
pub mod cycle;     // Cycle de mise à jour
pub mod error;     // Erreurs typées
pub mod logging;   // stdout + fichier de log
pub mod models;    // Structures de données
pub mod scheduler; // Boucle alignée sur 5 minutes
pub mod sheets;    // Google Sheets (auth + client)
