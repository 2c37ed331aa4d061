// ============================================================================
// Scheduler
// ============================================================================
// Boucle infinie alignée sur l'horloge murale : un cycle toutes les
// 5 minutes pile (12:00, 12:05, 12:10, ...)
//
// Deux états :
// - Idle    : calcule l'attente jusqu'à la prochaine frontière, dort
// - Running : exécute un cycle ; toute erreur est loggée puis ignorée
//
// CONCEPT RUST : Horloge injectée
// - le trait Clock fournit now() et sleep()
// - SystemClock pour le vrai programme, une fausse horloge dans les tests
//   (aucune vraie attente)
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, error, info};

use crate::api::QuoteSource;
use crate::config::SheetLayout;
use crate::cycle::{run_update_cycle, CycleOutcome};
use crate::sheets::SheetBackend;

/// Période entre deux cycles, en secondes
pub const CYCLE_PERIOD_SECS: u64 = 300;

// ============================================================================
// Horloge
// ============================================================================

/// Source de temps du scheduler
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Horloge système (chrono + tokio)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Calcul de la prochaine frontière
// ============================================================================

/// Secondes jusqu'au prochain multiple de 5 minutes
///
/// 300 - (secondes dans l'heure mod 300) : toujours dans ]0, 300].
/// Pile sur une frontière, on attend la suivante (300).
pub fn seconds_until_next_boundary(now: DateTime<Utc>) -> u64 {
    let within_hour = u64::from(now.minute() * 60 + now.second());
    CYCLE_PERIOD_SECS - (within_hour % CYCLE_PERIOD_SECS)
}

/// Instant exact de la prochaine frontière de 5 minutes
pub fn next_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let whole_second = now.with_nanosecond(0).unwrap_or(now);
    // seconds_until_next_boundary() <= 300 : la conversion ne peut pas déborder
    whole_second + chrono::Duration::seconds(seconds_until_next_boundary(now) as i64)
}

/// Durée exacte à dormir pour se réveiller sur la frontière
///
/// Tient compte des fractions de seconde : le réveil tombe à :00.000
pub fn sleep_until_next_boundary(now: DateTime<Utc>) -> Duration {
    (next_boundary(now) - now)
        .to_std()
        .unwrap_or_else(|_| Duration::from_secs(CYCLE_PERIOD_SECS))
}

// ============================================================================
// Scheduler
// ============================================================================

/// Enchaîne attente et cycles, indéfiniment
///
/// CONCEPT RUST : Références avec lifetime
/// - le scheduler emprunte la session, le client et l'horloge
/// - tout est construit dans main() et vit aussi longtemps que la boucle
pub struct Scheduler<'a> {
    sheet: &'a dyn SheetBackend,
    quotes: &'a dyn QuoteSource,
    layout: &'a SheetLayout,
    clock: &'a dyn Clock,
    cycles: u64,
    failures: u64,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        sheet: &'a dyn SheetBackend,
        quotes: &'a dyn QuoteSource,
        layout: &'a SheetLayout,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            sheet,
            quotes,
            layout,
            clock,
            cycles: 0,
            failures: 0,
        }
    }

    /// Nombre de cycles exécutés (réussis ou non)
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Nombre de cycles terminés en erreur
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Un passage Idle -> Running -> Idle
    ///
    /// Retourne None si le cycle a échoué (l'erreur est déjà loggée)
    pub async fn tick(&mut self) -> Option<CycleOutcome> {
        let now = self.clock.now();
        let wait = sleep_until_next_boundary(now);
        info!(
            next_run = %next_boundary(now).format("%H:%M:%S"),
            wait_secs = wait.as_secs_f64(),
            "Waiting for next run"
        );

        self.clock.sleep(wait).await;
        self.run_now().await
    }

    /// Exécute un cycle immédiatement, sans attendre la frontière
    pub async fn run_now(&mut self) -> Option<CycleOutcome> {
        self.cycles += 1;
        debug!(cycle = self.cycles, "Starting update cycle");

        match run_update_cycle(self.sheet, self.quotes, self.layout, self.clock).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.failures += 1;
                error!(
                    cycle = self.cycles,
                    category = e.category(),
                    error = %e,
                    "Update cycle failed"
                );
                None
            }
        }
    }

    /// Boucle sans fin : seul un arrêt externe du process la termine
    pub async fn run_forever(&mut self) {
        info!(period_secs = CYCLE_PERIOD_SECS, "Scheduler started");
        loop {
            self.tick().await;
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
