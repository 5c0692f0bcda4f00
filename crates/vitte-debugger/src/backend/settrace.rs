//! backend/settrace.rs — Backend de traçage "legacy" (§4.1)
//!
//! Toujours disponible : un callback unique est invoqué pour chaque
//! événement de frame, sans désactivation sélective par site. La version
//! `Monitoring` est strictement une optimisation par-dessus ce comportement
//! de référence.

use super::{BackendStatistics, TracingBackend};
use crate::error::DebugResult;
use crate::state::StepMode;
use std::collections::{HashMap, HashSet};

/// Backend de traçage basé sur un callback global, à la manière d'un hook
/// per-frame-event invoqué pour chaque instruction tracée.
#[derive(Debug)]
pub struct SettraceBackend {
    installed: bool,
    breakpoints: HashMap<String, HashSet<u32>>,
    function_breakpoints: HashSet<String>,
    read_watch_expressions: HashSet<String>,
    exception_filters: HashSet<String>,
    stepping: StepMode,
    events_delivered: u64,
}

impl Default for SettraceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SettraceBackend {
    pub fn new() -> Self {
        Self {
            installed: false,
            breakpoints: HashMap::new(),
            function_breakpoints: HashSet::new(),
            read_watch_expressions: HashSet::new(),
            exception_filters: HashSet::new(),
            stepping: StepMode::Continue,
            events_delivered: 0,
        }
    }

    /// Enregistre la livraison d'un événement (appelé par l'intégration VM
    /// à chaque invocation du callback global). Exposé pour les tests et
    /// l'intégration côté `debugger.rs`.
    pub fn record_event(&mut self) {
        self.events_delivered += 1;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl TracingBackend for SettraceBackend {
    fn install(&mut self) -> DebugResult<()> {
        self.installed = true;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.installed
    }

    fn shutdown(&mut self) {
        self.installed = false;
        self.breakpoints.clear();
        self.function_breakpoints.clear();
        self.read_watch_expressions.clear();
        self.exception_filters.clear();
    }

    fn update_breakpoints(&mut self, filepath: &str, lines: HashSet<u32>) {
        self.breakpoints.insert(filepath.to_string(), lines);
    }

    fn update_function_breakpoints(&mut self, functions: HashSet<String>) {
        self.function_breakpoints = functions;
    }

    fn set_stepping(&mut self, mode: StepMode) {
        self.stepping = mode;
    }

    fn sync_read_watchpoints(&mut self, expressions: HashSet<String>) {
        // Le backend settrace n'a pas d'accès sélectif au bytecode : il se
        // contente de mémoriser la demande pour que l'appelant sache que la
        // surveillance de lecture reste "best effort" (inspection à chaque
        // ligne plutôt qu'au niveau de l'opcode).
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
            files_tracked: self.breakpoints.len(),
            backend_name: "settrace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        let mut b = SettraceBackend::new();
        b.install().unwrap();
        b.install().unwrap();
        assert!(b.is_installed());
    }

    #[test]
    fn shutdown_clears_state() {
        let mut b = SettraceBackend::new();
        b.install().unwrap();
        b.update_breakpoints("a.vt", [1, 2].into_iter().collect());
        b.shutdown();
        assert!(!b.is_installed());
        assert_eq!(b.get_statistics().files_tracked, 0);
    }

    #[test]
    fn tracks_event_count() {
        let mut b = SettraceBackend::new();
        b.record_event();
        b.record_event();
        assert_eq!(b.get_statistics().events_delivered, 2);
    }

    #[test]
    fn backend_name_is_settrace() {
        let b = SettraceBackend::new();
        assert_eq!(b.get_statistics().backend_name, "settrace");
    }
}
