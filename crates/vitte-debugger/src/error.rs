//! error.rs — Taxonomie d'erreurs du débogueur
//!
//! Quatre familles, calquées sur la politique de propagation du débogueur :
//! - `Protocol` / `UnknownCommand` : jamais fatales, deviennent une réponse `success: false`.
//! - `PolicyBlocked` : rejet du bac à sable de l'évaluateur de conditions.
//! - `Evaluation` : une condition/expression a levé une erreur ; traitée comme "non remplie".
//! - `BackendInstall` : échec d'installation du backend de trace ; déclenche un repli Settrace.
//! - `Io` / `Json` : erreurs de canal IPC ; la session est marquée terminée.
//!
//! Rien ici ne doit jamais faire paniquer la boucle de dispatch : chaque variante
//! correspond à un point de capture documenté dans `dispatch.rs`/`resolver.rs`/`backend/`.

use thiserror::Error;

/// Erreur du cœur du débogueur.
#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error("protocol error: {message}")]
    Protocol { message: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("expression blocked by policy")]
    PolicyBlocked,

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("tracing backend install failed: {0}")]
    BackendInstall(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Résultat standard du crate.
pub type DebugResult<T> = std::result::Result<T, DebuggerError>;

/// Chaîne d'erreur stable renvoyée à la frontière `evaluate`/`setVariable`
/// lorsqu'une expression est bloquée par la politique de bac à sable.
pub const POLICY_BLOCKED_MESSAGE: &str = "<error: Evaluation blocked by policy>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_message() {
        let e = DebuggerError::UnknownCommand("frobnicate".into());
        assert_eq!(e.to_string(), "Unknown command: frobnicate");
    }

    #[test]
    fn policy_blocked_message_is_stable() {
        assert_eq!(POLICY_BLOCKED_MESSAGE, "<error: Evaluation blocked by policy>");
    }
}
