//! exception.rs — Gestion des breakpoints d'exception (§4.7)
//!
//! Centralise la configuration "raised"/"uncaught" et la construction des
//! structures `ExceptionInfo` exposées à l'événement `stopped`. Porté depuis
//! le gestionnaire d'exceptions historique ; la détection "sera gérée plus
//! haut dans la pile" reste la responsabilité de l'appelant (inspection de
//! bytecode/AST hors du périmètre de ce module), qui fournit juste le
//! verdict via `FrameHandling`.

use std::collections::HashMap;

/// Configuration des filtres d'exception DAP (`raised`, `uncaught`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExceptionBreakpointConfig {
    pub break_on_raised: bool,
    pub break_on_uncaught: bool,
}

impl ExceptionBreakpointConfig {
    pub fn is_enabled(self) -> bool {
        self.break_on_raised || self.break_on_uncaught
    }

    /// Configure à partir des identifiants de filtre DAP (`["raised", "uncaught"]`).
    pub fn set_from_filters<S: AsRef<str>>(&mut self, filters: &[S]) {
        self.break_on_raised = filters.iter().any(|f| f.as_ref() == "raised");
        self.break_on_uncaught = filters.iter().any(|f| f.as_ref() == "uncaught");
    }
}

/// Verdict de savoir si la frame courante (ou une frame appelante) gérera
/// l'exception. Produit par l'inspecteur de bytecode de l'appelant ;
/// `Unknown` est traité de façon conservatrice comme "gérée" (on ne s'arrête pas).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHandling {
    Handled,
    Unhandled,
    Unknown,
}

/// Détails de l'exception exposés dans `ExceptionInfo.details`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionDetails {
    pub message: String,
    pub type_name: String,
    pub full_type_name: String,
    pub source: String,
    pub stack_trace: Vec<String>,
}

/// Structure DAP-compatible décrivant une exception arrêtée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub exception_id: String,
    pub description: String,
    pub break_mode: &'static str,
    pub details: ExceptionDetails,
}

/// Une exception levée, telle que fournie par le moteur d'exécution.
#[derive(Debug, Clone)]
pub struct RaisedException {
    pub type_name: String,
    pub module: String,
    pub message: String,
    pub source_path: String,
    pub stack_trace: Vec<String>,
}

/// Gestionnaire d'exceptions : configuration + état per-thread.
#[derive(Debug, Default)]
pub struct ExceptionHandler {
    pub config: ExceptionBreakpointConfig,
    info_by_thread: HashMap<i64, ExceptionInfo>,
}

impl ExceptionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Décide s'il faut s'arrêter sur cette exception.
    pub fn should_break(&self, handling: FrameHandling) -> bool {
        if !self.config.is_enabled() {
            return false;
        }
        if self.config.break_on_raised {
            return true;
        }
        if self.config.break_on_uncaught {
            return matches!(handling, FrameHandling::Unhandled);
        }
        false
    }

    pub fn break_mode(&self) -> &'static str {
        if self.config.break_on_raised { "always" } else { "unhandled" }
    }

    pub fn build_exception_info(&self, exc: &RaisedException) -> ExceptionInfo {
        ExceptionInfo {
            exception_id: exc.type_name.clone(),
            description: exc.message.clone(),
            break_mode: self.break_mode(),
            details: ExceptionDetails {
                message: exc.message.clone(),
                type_name: exc.type_name.clone(),
                full_type_name: format!("{}.{}", exc.module, exc.type_name),
                source: exc.source_path.clone(),
                stack_trace: exc.stack_trace.clone(),
            },
        }
    }

    pub fn exception_text(&self, exc: &RaisedException) -> String {
        format!("{}: {}", exc.type_name, exc.message)
    }

    pub fn store_exception_info(&mut self, thread_id: i64, info: ExceptionInfo) {
        self.info_by_thread.insert(thread_id, info);
    }

    pub fn exception_info(&self, thread_id: i64) -> Option<&ExceptionInfo> {
        self.info_by_thread.get(&thread_id)
    }

    pub fn clear_exception_info(&mut self, thread_id: i64) {
        self.info_by_thread.remove(&thread_id);
    }

    pub fn clear_all(&mut self) {
        self.info_by_thread.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RaisedException {
        RaisedException {
            type_name: "ValueError".into(),
            module: "builtins".into(),
            message: "invalid value".into(),
            source_path: "/app/main.vt".into(),
            stack_trace: vec!["line 1".into(), "line 2".into()],
        }
    }

    #[test]
    fn disabled_by_default() {
        let h = ExceptionHandler::new();
        assert!(!h.should_break(FrameHandling::Unhandled));
    }

    #[test]
    fn raised_mode_breaks_always() {
        let mut h = ExceptionHandler::new();
        h.config.set_from_filters(&["raised"]);
        assert!(h.should_break(FrameHandling::Handled));
        assert!(h.should_break(FrameHandling::Unhandled));
        assert_eq!(h.break_mode(), "always");
    }

    #[test]
    fn uncaught_mode_breaks_only_when_unhandled() {
        let mut h = ExceptionHandler::new();
        h.config.set_from_filters(&["uncaught"]);
        assert!(!h.should_break(FrameHandling::Handled));
        assert!(!h.should_break(FrameHandling::Unknown));
        assert!(h.should_break(FrameHandling::Unhandled));
        assert_eq!(h.break_mode(), "unhandled");
    }

    #[test]
    fn builds_exception_info() {
        let h = ExceptionHandler::new();
        let info = h.build_exception_info(&sample());
        assert_eq!(info.exception_id, "ValueError");
        assert_eq!(info.details.full_type_name, "builtins.ValueError");
        assert_eq!(info.details.stack_trace.len(), 2);
    }

    #[test]
    fn exception_text_format() {
        let h = ExceptionHandler::new();
        assert_eq!(h.exception_text(&sample()), "ValueError: invalid value");
    }

    #[test]
    fn per_thread_info_lifecycle() {
        let mut h = ExceptionHandler::new();
        let info = h.build_exception_info(&sample());
        h.store_exception_info(7, info.clone());
        assert_eq!(h.exception_info(7), Some(&info));
        h.clear_exception_info(7);
        assert_eq!(h.exception_info(7), None);
    }
}
