//! dispatch.rs — Registre de commandes (§4.11)
//!
//! Modèle purement en-process : encoder/décoder la trame JSON préfixée par
//! une longueur est la responsabilité de la feature `ipc` (§6), pas de ce
//! module. Un gestionnaire par commande, enregistrés dans un registre
//! ordonné par priorité ; une commande inconnue produit un message d'erreur
//! stable plutôt qu'un panic.

#![cfg(feature = "serde")]

pub mod handlers;

use crate::debugger::CoreDebugger;
use crate::error::{DebugResult, DebuggerError};
use serde_json::Value;
use std::collections::HashMap;

/// Un gestionnaire de commande. Retourne `Ok(None)` quand il a déjà émis
/// lui-même les événements nécessaires (pas de corps de réponse à produire),
/// `Ok(Some(body))` pour une réponse `success: true` avec corps, ou `Err` —
/// converti en réponse d'échec par `dispatch`, jamais en panic.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, debugger: &CoreDebugger, args: &Value) -> DebugResult<Option<Value>>;
}

impl<F> CommandHandler for F
where
    F: Fn(&CoreDebugger, &Value) -> DebugResult<Option<Value>> + Send + Sync,
{
    fn handle(&self, debugger: &CoreDebugger, args: &Value) -> DebugResult<Option<Value>> {
        self(debugger, args)
    }
}

/// Résultat synthétisé par `dispatch`, prêt à être sérialisé en réponse DAP-like.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub success: bool,
    pub body: Option<Value>,
    pub message: Option<String>,
}

/// Registre de gestionnaires, ordonné par priorité décroissante au sein de
/// chaque nom de commande (le premier gestionnaire enregistré à priorité
/// égale gagne ; un gestionnaire ultérieur peut intercepter en déclarant une
/// priorité plus élevée).
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Vec<(i32, Box<dyn CommandHandler>)>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: impl Into<String>, priority: i32, handler: Box<dyn CommandHandler>) {
        let entry = self.handlers.entry(command.into()).or_default();
        entry.push((priority, handler));
        entry.sort_by(|a, b| b.0.cmp(&a.0));
    }

    /// Exécute la commande nommée avec la plus haute priorité enregistrée.
    pub fn dispatch(&self, debugger: &CoreDebugger, name: &str, args: &Value) -> DispatchResponse {
        let Some(candidates) = self.handlers.get(name) else {
            return DispatchResponse {
                success: false,
                body: None,
                message: Some(DebuggerError::UnknownCommand(name.to_string()).to_string()),
            };
        };
        let Some((_, handler)) = candidates.first() else {
            return DispatchResponse {
                success: false,
                body: None,
                message: Some(DebuggerError::UnknownCommand(name.to_string()).to_string()),
            };
        };

        match handler.handle(debugger, args) {
            Ok(body) => DispatchResponse { success: true, body, message: None },
            Err(err) => DispatchResponse { success: false, body: None, message: Some(err.to_string()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TracingBackendKind;
    use crate::debugger::SessionHooks;

    fn debugger() -> CoreDebugger {
        CoreDebugger::new(Some(TracingBackendKind::Settrace), SessionHooks::default())
    }

    #[test]
    fn unknown_command_reports_stable_message() {
        let registry = CommandRegistry::new();
        let dbg = debugger();
        let resp = registry.dispatch(&dbg, "frobnicate", &Value::Null);
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Unknown command: frobnicate"));
    }

    #[test]
    fn registered_handler_runs_and_returns_body() {
        let mut registry = CommandRegistry::new();
        registry.register("ping", 0, Box::new(|_: &CoreDebugger, _: &Value| Ok(Some(serde_json::json!({"pong": true})))));
        let dbg = debugger();
        let resp = registry.dispatch(&dbg, "ping", &Value::Null);
        assert!(resp.success);
        assert_eq!(resp.body, Some(serde_json::json!({"pong": true})));
    }

    #[test]
    fn higher_priority_handler_wins() {
        let mut registry = CommandRegistry::new();
        registry.register("cmd", 0, Box::new(|_: &CoreDebugger, _: &Value| Ok(Some(Value::from("low")))));
        registry.register("cmd", 10, Box::new(|_: &CoreDebugger, _: &Value| Ok(Some(Value::from("high")))));
        let dbg = debugger();
        let resp = registry.dispatch(&dbg, "cmd", &Value::Null);
        assert_eq!(resp.body, Some(Value::from("high")));
    }

    #[test]
    fn handler_error_becomes_failed_response_not_panic() {
        let mut registry = CommandRegistry::new();
        registry.register("boom", 0, Box::new(|_: &CoreDebugger, _: &Value| {
            Err(DebuggerError::Evaluation("nope".into()))
        }));
        let dbg = debugger();
        let resp = registry.dispatch(&dbg, "boom", &Value::Null);
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("evaluation error: nope"));
    }
}
