//! backend/mod.rs — Abstraction du backend de traçage (§4.1)
//!
//! Deux stratégies pour intercepter l'exécution de la VM :
//! - `SettraceBackend` : un callback unique invoqué pour chaque événement de
//!   frame (ligne, appel, retour, exception) — toujours disponible, coût
//!   constant par instruction tracée.
//! - `MonitoringBackend` : s'appuie sur une API à base de "tool slot" pour
//!   n'activer que les événements réellement utiles par unité de code,
//!   avec un sentinel de désactivation par site — plus rapide, mais
//!   nécessite un support explicite côté VM.
//!
//! `select_backend` essaie `Monitoring` en priorité et retombe sur `Settrace`
//! si la VM ne le supporte pas ou si l'appelant épingle explicitement
//! `Settrace`.

pub mod monitoring;
pub mod settrace;

use crate::error::DebugResult;
use crate::state::StepMode;
use std::collections::HashSet;

pub use monitoring::MonitoringBackend;
pub use settrace::SettraceBackend;

/// Statistiques diagnostiques exposées par un backend, pour inspection/tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendStatistics {
    pub events_delivered: u64,
    pub files_tracked: usize,
    pub backend_name: &'static str,
}

/// Contrat commun aux deux stratégies de traçage.
pub trait TracingBackend: Send {
    /// Installe le backend. Doit être idempotent pour une même instance.
    fn install(&mut self) -> DebugResult<()>;

    /// Indique si `install` a réussi sur cette instance.
    fn is_installed(&self) -> bool;

    /// Désinstalle le backend et restaure l'état global du process pour
    /// permettre une réinstallation ultérieure.
    fn shutdown(&mut self);

    /// Met à jour l'ensemble des lignes de breakpoint pour un fichier.
    fn update_breakpoints(&mut self, filepath: &str, lines: HashSet<u32>);

    /// Met à jour l'ensemble des breakpoints de fonction.
    fn update_function_breakpoints(&mut self, functions: HashSet<String>);

    /// Configure le mode de stepping courant.
    fn set_stepping(&mut self, mode: StepMode);

    /// Indique au backend quelles expressions de read-watch sont actives
    /// (pour les backends qui peuvent filtrer au niveau du bytecode).
    fn sync_read_watchpoints(&mut self, expressions: HashSet<String>);

    /// Configure les filtres d'exception actifs (raised/uncaught).
    fn set_conditions(&mut self, exception_filters: HashSet<String>);

    /// Capture le contexte d'exécution courant pour le step controller.
    fn capture_step_context(&self) -> Option<(String, u32, usize)>;

    fn get_statistics(&self) -> BackendStatistics;
}

/// Choix de backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingBackendKind {
    Settrace,
    Monitoring,
}

/// Sélectionne un backend de traçage. Essaie `Monitoring` sauf si l'appelant
/// épingle `Settrace` ou si `Monitoring` échoue à s'installer (slot déjà pris,
/// VM sans support) — dans ce cas, repli sur `Settrace` avec un avertissement.
pub fn select_backend(requested: Option<TracingBackendKind>) -> Box<dyn TracingBackend> {
    match requested {
        Some(TracingBackendKind::Settrace) => {
            let mut backend = SettraceBackend::new();
            let _ = backend.install();
            Box::new(backend)
        }
        Some(TracingBackendKind::Monitoring) | None => {
            let mut backend = MonitoringBackend::new();
            match backend.install() {
                Ok(()) => Box::new(backend),
                Err(err) => {
                    #[cfg(feature = "trace")]
                    log::warn!("monitoring backend unavailable ({err}), falling back to settrace");
                    let _ = err;
                    let mut backend = SettraceBackend::new();
                    let _ = backend.install();
                    Box::new(backend)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Le slot d'outil `Monitoring` est un singleton process-wide (voir
    // monitoring.rs) : sérialise les tests qui en dépendent.
    static SLOT_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn pinned_settrace_is_honored() {
        let backend = select_backend(Some(TracingBackendKind::Settrace));
        assert_eq!(backend.get_statistics().backend_name, "settrace");
        assert!(backend.is_installed());
    }

    #[test]
    fn default_selection_prefers_monitoring_or_falls_back() {
        let _guard = SLOT_TEST_LOCK.lock();
        let backend = select_backend(None);
        let name = backend.get_statistics().backend_name;
        assert!(name == "monitoring" || name == "settrace");
        assert!(backend.is_installed());
    }

    #[test]
    fn fallback_to_settrace_is_installed_when_monitoring_slot_is_held() {
        let _guard = SLOT_TEST_LOCK.lock();
        let mut holder = MonitoringBackend::new();
        holder.install().unwrap();

        let backend = select_backend(Some(TracingBackendKind::Monitoring));
        assert_eq!(backend.get_statistics().backend_name, "settrace");
        assert!(backend.is_installed());

        holder.shutdown();
    }
}
