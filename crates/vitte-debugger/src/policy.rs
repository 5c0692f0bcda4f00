//! policy.rs — Bac à sable pour l'évaluateur de conditions (§4.5)
//!
//! Politique de liste noire de tokens appliquée à la chaîne brute de l'expression
//! (en minuscules), avant toute tentative d'évaluation. Reprend exactement la
//! liste de l'implémentation d'origine (`_DISALLOWED_EVAL_TOKENS`), qui inclut
//! à la fois `"import "` et `"import("`.
//!
//! Les conditions de breakpoint et les logpoints autorisent les builtins
//! (`allow_builtins = true`) ; `setVariable` ne les autorise pas.

use crate::error::{DebugResult, DebuggerError};
use crate::eval::{eval_expr, EvalEnv, Value};

/// Tokens interdits, recherchés comme sous-chaînes dans l'expression mise en minuscules.
pub const DISALLOWED_TOKENS: &[&str] = &[
    "__",
    "import ",
    "import(",
    "open(",
    "exec(",
    "eval(",
    "compile(",
    "globals(",
    "locals(",
    "vars(",
    "os.",
    "sys.",
    "subprocess",
    "socket",
];

/// Vérifie qu'une expression ne contient aucun token interdit.
///
/// Retourne `Err(DebuggerError::PolicyBlocked)` au premier token trouvé.
pub fn enforce_policy(expression: &str) -> DebugResult<()> {
    let lowered = expression.to_lowercase();
    if DISALLOWED_TOKENS.iter().any(|tok| lowered.contains(tok)) {
        return Err(DebuggerError::PolicyBlocked);
    }
    Ok(())
}

/// Évalue une expression sous la politique de bac à sable.
///
/// - Une expression vide ou composée uniquement d'espaces est rejetée.
/// - `allow_builtins` ne change rien au comportement du petit évaluateur actuel
///   (il n'expose pas de builtins dangereux par construction) mais reste le
///   point d'extension si l'environnement en gagne un jour (cf. §4.5).
pub fn evaluate_with_policy(
    expression: &str,
    env: &dyn EvalEnv,
    allow_builtins: bool,
) -> DebugResult<Value> {
    let expr = expression.trim();
    if expr.is_empty() {
        return Err(DebuggerError::Evaluation("expression cannot be empty".into()));
    }
    enforce_policy(expr)?;
    let _ = allow_builtins; // point d'extension, cf. doc ci-dessus
    eval_expr(expr, env).map_err(|e| DebuggerError::Evaluation(e.to_string()))
}

/// Évalue une expression et retourne sa "vérité" (utilisé par le Resolver).
///
/// Toute erreur d'évaluation (y compris un rejet de politique) est traitée
/// comme "condition non remplie", jamais propagée.
pub fn evaluate_condition(expression: &str, env: &dyn EvalEnv) -> bool {
    match evaluate_with_policy(expression, env, true) {
        Ok(v) => v.truthy(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<String, Value>);
    impl EvalEnv for MapEnv {
        fn get_var(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
    }

    fn env(pairs: &[(&str, Value)]) -> MapEnv {
        MapEnv(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn rejects_dunder_and_import() {
        assert!(enforce_policy("__import__('os')").is_err());
        assert!(enforce_policy("import os").is_err());
        assert!(enforce_policy("import(os)").is_err());
        assert!(enforce_policy("os.system('x')").is_err());
        assert!(enforce_policy("sys.exit()").is_err());
        assert!(enforce_policy("subprocess.run()").is_err());
        assert!(enforce_policy("socket.socket()").is_err());
        assert!(enforce_policy("open('f')").is_err());
    }

    #[test]
    fn allows_plain_expressions() {
        assert!(enforce_policy("x + 1 > 3").is_ok());
    }

    #[test]
    fn rejects_empty_expression() {
        let e = env(&[]);
        assert!(matches!(
            evaluate_with_policy("   ", &e, true),
            Err(DebuggerError::Evaluation(_))
        ));
    }

    #[test]
    fn evaluate_condition_never_propagates_errors() {
        let e = env(&[("x", Value::Int(1))]);
        assert!(!evaluate_condition("os.getenv('X')", &e));
        assert!(!evaluate_condition("nonexistent_var", &e));
        assert!(evaluate_condition("x == 1", &e));
    }
}
