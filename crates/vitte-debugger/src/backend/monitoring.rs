//! backend/monitoring.rs — Backend de traçage par emplacement d'outil exclusif (§4.1)
//!
//! Grounded sur `monitoring_backend.py` : réclame un emplacement d'outil
//! exclusif dans l'exécuteur (ici modélisé par un `AtomicBool` global, faute
//! de table d'outils littérale côté VM), puis n'active les événements que
//! pour les unités de code réellement porteuses d'un breakpoint — un site
//! sans breakpoint renvoie un sentinel `Disable` plutôt que de continuer à
//! générer des événements.

use super::{BackendStatistics, TracingBackend};
use crate::error::{DebugResult, DebuggerError};
use crate::state::StepMode;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Un seul outil de monitoring peut être installé à la fois dans tout le
/// process, à l'image de l'emplacement d'outil exclusif de l'exécuteur
/// d'origine.
static TOOL_SLOT_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Résultat de la décision d'un callback ligne-par-ligne : soit on continue
/// de recevoir les événements pour ce site, soit on demande au runtime de
/// les désactiver (site sans aucun breakpoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCallbackResult {
    Continue,
    Disable,
}

/// Backend de traçage par tool-slot exclusif, avec registre de code
/// découvert paresseusement et snapshots immuables de lignes de breakpoint
/// par fichier (copy-on-write : chaque mise à jour remplace l'`Arc` entier
/// plutôt que de muter la collection en place).
pub struct MonitoringBackend {
    claimed: bool,
    code_registry: HashMap<String, HashSet<String>>,
    breakpoint_lines: RwLock<HashMap<String, Arc<HashSet<u32>>>>,
    function_breakpoints: HashSet<String>,
    read_watch_expressions: HashSet<String>,
    exception_filters: HashSet<String>,
    stepping: StepMode,
    events_delivered: u64,
}

impl MonitoringBackend {
    pub fn new() -> Self {
        Self {
            claimed: false,
            code_registry: HashMap::new(),
            breakpoint_lines: RwLock::new(HashMap::new()),
            function_breakpoints: HashSet::new(),
            read_watch_expressions: HashSet::new(),
            exception_filters: HashSet::new(),
            stepping: StepMode::Continue,
            events_delivered: 0,
        }
    }

    /// Appelé lorsqu'une unité de code est rencontrée pour la première fois
    /// (équivalent `PY_START`) ; enregistre son nom dans le registre paresseux.
    pub fn note_code_unit_entry(&mut self, filepath: &str, unit: &str) {
        self.code_registry.entry(filepath.to_string()).or_default().insert(unit.to_string());
    }

    /// Décision prise à chaque site de ligne : continue si la ligne est un
    /// breakpoint actif, sinon demande la désactivation du site.
    pub fn decide_line(&mut self, filepath: &str, line: u32) -> LineCallbackResult {
        self.events_delivered += 1;
        let guard = self.breakpoint_lines.read();
        match guard.get(filepath) {
            Some(lines) if lines.contains(&line) => LineCallbackResult::Continue,
            _ => LineCallbackResult::Disable,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

impl Default for MonitoringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MonitoringBackend {
    fn drop(&mut self) {
        if self.claimed {
            TOOL_SLOT_CLAIMED.store(false, Ordering::SeqCst);
        }
    }
}

impl TracingBackend for MonitoringBackend {
    fn install(&mut self) -> DebugResult<()> {
        if self.claimed {
            return Ok(());
        }
        if TOOL_SLOT_CLAIMED.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return Err(DebuggerError::BackendInstall("monitoring tool slot already held".into()));
        }
        self.claimed = true;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.claimed
    }

    fn shutdown(&mut self) {
        if self.claimed {
            TOOL_SLOT_CLAIMED.store(false, Ordering::SeqCst);
            self.claimed = false;
        }
        self.code_registry.clear();
        self.breakpoint_lines.write().clear();
        self.function_breakpoints.clear();
        self.read_watch_expressions.clear();
        self.exception_filters.clear();
    }

    fn update_breakpoints(&mut self, filepath: &str, lines: HashSet<u32>) {
        self.breakpoint_lines.write().insert(filepath.to_string(), Arc::new(lines));
    }

    fn update_function_breakpoints(&mut self, functions: HashSet<String>) {
        self.function_breakpoints = functions;
    }

    fn set_stepping(&mut self, mode: StepMode) {
        self.stepping = mode;
    }

    fn sync_read_watchpoints(&mut self, expressions: HashSet<String>) {
        self.read_watch_expressions = expressions;
    }

    fn set_conditions(&mut self, exception_filters: HashSet<String>) {
        self.exception_filters = exception_filters;
    }

    fn capture_step_context(&self) -> Option<(String, u32, usize)> {
        None
    }

    fn get_statistics(&self) -> BackendStatistics {
        BackendStatistics {
            events_delivered: self.events_delivered,
            files_tracked: self.breakpoint_lines.read().len(),
            backend_name: "monitoring",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Le slot d'outil est un singleton process-wide : les tests qui
    // l'installent doivent se sérialiser entre eux (le test runner exécute
    // les tests d'un même binaire sur plusieurs threads par défaut).
    static SLOT_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn double_install_same_instance_is_idempotent() {
        let _guard = SLOT_TEST_LOCK.lock();
        let mut b = MonitoringBackend::new();
        b.install().unwrap();
        b.install().unwrap();
        assert!(b.is_claimed());
        b.shutdown();
    }

    #[test]
    fn second_instance_fails_while_slot_held() {
        let _guard = SLOT_TEST_LOCK.lock();
        let mut first = MonitoringBackend::new();
        first.install().unwrap();
        let mut second = MonitoringBackend::new();
        assert!(second.install().is_err());
        first.shutdown();
    }

    #[test]
    fn drop_releases_slot() {
        let _guard = SLOT_TEST_LOCK.lock();
        {
            let mut b = MonitoringBackend::new();
            b.install().unwrap();
        }
        let mut again = MonitoringBackend::new();
        assert!(again.install().is_ok());
        again.shutdown();
    }

    #[test]
    fn line_without_breakpoint_disables() {
        let mut b = MonitoringBackend::new();
        b.update_breakpoints("a.vt", [5].into_iter().collect());
        assert_eq!(b.decide_line("a.vt", 5), LineCallbackResult::Continue);
        assert_eq!(b.decide_line("a.vt", 6), LineCallbackResult::Disable);
    }
}
