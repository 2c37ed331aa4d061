// ============================================================================
// Module : api
// ============================================================================
// Clients des APIs de prix
// ============================================================================

pub mod coinmarketcap; // Client CoinMarketCap (quotes/latest)

// Re-export des types principaux
pub use coinmarketcap::{CoinMarketCapClient, QuoteResponse, QuoteSource};
