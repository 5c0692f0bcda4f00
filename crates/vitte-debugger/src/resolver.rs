//! resolver.rs — Résolveur de breakpoints (§4.2)
//!
//! Moteur sans état, consommant un `BreakpointMeta` et un environnement
//! d'évaluation optionnel. Contrat :
//!
//! 1. Incrémente le compteur de hits (sauf si l'appelant désactive l'auto-incrément).
//! 2. Si un prédicat de hit-count est présent, l'évalue contre le nouveau compteur.
//!    Grammaire : `N` (== N), `==N`, `>=N`, `%N` (tous les N). Échec de parsing
//!    → *fail open* (considéré comme rempli).
//! 3. Si une condition est présente, l'évalue dans l'environnement ; un résultat
//!    faux ou une erreur d'évaluation ⇒ CONTINUE. Pas d'environnement alors
//!    qu'une condition est posée ⇒ CONTINUE.
//! 4. Si un message de log est présent, le rend et retourne CONTINUE (les
//!    logpoints ne s'arrêtent jamais), quel que soit le résultat de la condition.
//! 5. Sinon STOP.

use crate::eval::{format_log_message, EvalEnv};
use crate::policy::evaluate_condition;

/// Bundle de métadonnées associé à n'importe quel type de breakpoint.
#[derive(Debug, Clone, Default)]
pub struct BreakpointMeta {
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
    pub hit_count: u64,
}

/// Action décidée par le résolveur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveAction {
    Stop,
    Continue,
    /// Aucun breakpoint n'était applicable (l'appelant n'a fourni aucune méta).
    Skip,
}

/// Résultat complet d'une résolution : l'action, plus le texte de log rendu
/// le cas échéant (pour que l'appelant l'achemine vers un émetteur `output`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub action: ResolveAction,
    pub rendered_log: Option<String>,
}

impl ResolveResult {
    fn stop() -> Self {
        Self { action: ResolveAction::Stop, rendered_log: None }
    }
    fn cont() -> Self {
        Self { action: ResolveAction::Continue, rendered_log: None }
    }
    fn skip() -> Self {
        Self { action: ResolveAction::Skip, rendered_log: None }
    }
    fn logged(msg: String) -> Self {
        Self { action: ResolveAction::Continue, rendered_log: Some(msg) }
    }
}

/// Résout un hit de breakpoint étant donné sa méta (mutable, pour l'incrément
/// du compteur de hits) et un environnement d'évaluation optionnel.
pub fn resolve(meta: Option<&mut BreakpointMeta>, env: Option<&dyn EvalEnv>) -> ResolveResult {
    let Some(meta) = meta else {
        return ResolveResult::skip();
    };

    meta.hit_count += 1;

    if let Some(hit_cond) = &meta.hit_condition {
        if !evaluate_hit_condition(hit_cond, meta.hit_count) {
            return ResolveResult::cont();
        }
    }

    if let Some(cond) = &meta.condition {
        match env {
            Some(env) => {
                if !evaluate_condition(cond, env) {
                    return ResolveResult::cont();
                }
            }
            None => return ResolveResult::cont(),
        }
    }

    if let Some(template) = &meta.log_message {
        let rendered = match env {
            Some(env) => format_log_message(template, env).unwrap_or_else(|_| "<error>".into()),
            None => "<error>".into(),
        };
        return ResolveResult::logged(rendered);
    }

    ResolveResult::stop()
}

/// Évalue un prédicat de hit-count contre le compteur courant.
///
/// Grammaire supportée : `%n`, `==n`, `>=n`, `n` (équivalent à `==n`).
/// Échec de *parsing* ⇒ `true` (fail-open), conformément à la politique de
/// l'implémentation d'origine. `%0` parse correctement (`n=0`) et n'est donc
/// *pas* un échec de parsing : `n > 0` est requis pour remplir le prédicat,
/// donc `%0` ne s'arrête jamais.
pub fn evaluate_hit_condition(expr: &str, hit_count: u64) -> bool {
    let s = expr.trim();

    if let Some(rest) = s.strip_prefix('%') {
        return match rest.trim().parse::<u64>() {
            Ok(n) if n > 0 => hit_count % n == 0,
            Ok(0) => false, // `%0` parse correctement : jamais rempli, ce n'est pas un échec de parsing
            Err(_) => true,
        };
    }
    if let Some(rest) = s.strip_prefix("==") {
        return match rest.trim().parse::<u64>() {
            Ok(n) => hit_count == n,
            Err(_) => true,
        };
    }
    if let Some(rest) = s.strip_prefix(">=") {
        return match rest.trim().parse::<u64>() {
            Ok(n) => hit_count >= n,
            Err(_) => true,
        };
    }
    match s.parse::<u64>() {
        Ok(n) => hit_count == n,
        Err(_) => true,
    }
}

/// Construit l'ensemble des noms candidats pour un match de breakpoint
/// de fonction : `{func}`, `{module}.{func}`, `{Class}.{func}`,
/// `{module}.{Class}.{func}`.
pub fn function_candidate_names(
    func: &str,
    module: Option<&str>,
    class_name: Option<&str>,
) -> Vec<String> {
    let mut names = vec![func.to_string()];
    if let Some(m) = module {
        if !m.is_empty() {
            names.push(format!("{m}.{func}"));
        }
    }
    if let Some(c) = class_name {
        names.push(format!("{c}.{func}"));
        if let Some(m) = module {
            if !m.is_empty() {
                names.push(format!("{m}.{c}.{func}"));
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Value;
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
    fn hit_condition_grammar() {
        assert!(evaluate_hit_condition("%3", 3));
        assert!(!evaluate_hit_condition("%3", 4));
        assert!(evaluate_hit_condition("==2", 2));
        assert!(!evaluate_hit_condition("==2", 3));
        assert!(evaluate_hit_condition(">=2", 2));
        assert!(evaluate_hit_condition(">=2", 5));
        assert!(!evaluate_hit_condition(">=2", 1));
        assert!(evaluate_hit_condition("4", 4));
        assert!(!evaluate_hit_condition("4", 5));
    }

    #[test]
    fn hit_condition_fails_open() {
        assert!(evaluate_hit_condition("garbage", 1));
        assert!(evaluate_hit_condition("%nope", 1));
    }

    #[test]
    fn modulo_zero_parses_and_never_stops() {
        assert!(!evaluate_hit_condition("%0", 0));
        assert!(!evaluate_hit_condition("%0", 1));
        assert!(!evaluate_hit_condition("%0", 100));
    }

    #[test]
    fn skip_when_no_meta() {
        let r = resolve(None, None);
        assert_eq!(r.action, ResolveAction::Skip);
    }

    #[test]
    fn hit_count_predicate_blocks_until_met() {
        let mut meta = BreakpointMeta { hit_condition: Some("%3".into()), ..Default::default() };
        for expect_stop in [false, false, true, false, false, true] {
            let r = resolve(Some(&mut meta), None);
            assert_eq!(r.action == ResolveAction::Stop, expect_stop);
        }
        assert_eq!(meta.hit_count, 6);
    }

    #[test]
    fn condition_false_continues_but_still_increments() {
        let mut meta = BreakpointMeta { condition: Some("i >= 3".into()), ..Default::default() };
        let e = env(&[("i", Value::Int(1))]);
        let r = resolve(Some(&mut meta), Some(&e));
        assert_eq!(r.action, ResolveAction::Continue);
        assert_eq!(meta.hit_count, 1);
    }

    #[test]
    fn condition_true_stops() {
        let mut meta = BreakpointMeta { condition: Some("i >= 3".into()), ..Default::default() };
        let e = env(&[("i", Value::Int(4))]);
        let r = resolve(Some(&mut meta), Some(&e));
        assert_eq!(r.action, ResolveAction::Stop);
    }

    #[test]
    fn condition_without_env_continues() {
        let mut meta = BreakpointMeta { condition: Some("i >= 3".into()), ..Default::default() };
        let r = resolve(Some(&mut meta), None);
        assert_eq!(r.action, ResolveAction::Continue);
    }

    #[test]
    fn logpoint_never_stops() {
        let mut meta = BreakpointMeta { log_message: Some("i={i}".into()), ..Default::default() };
        let e = env(&[("i", Value::Int(7))]);
        let r = resolve(Some(&mut meta), Some(&e));
        assert_eq!(r.action, ResolveAction::Continue);
        assert_eq!(r.rendered_log.as_deref(), Some("i=7"));
    }

    #[test]
    fn s1_conditional_breakpoint_skip_then_stop() {
        // program: x = 0; for i in range(5): x = i ; bp at `x = i` with i >= 3
        let mut meta = BreakpointMeta { condition: Some("i >= 3".into()), ..Default::default() };
        let mut stops = 0;
        for i in 0..5 {
            let e = env(&[("i", Value::Int(i))]);
            if resolve(Some(&mut meta), Some(&e)).action == ResolveAction::Stop {
                stops += 1;
            }
        }
        assert_eq!(stops, 2);
        assert_eq!(meta.hit_count, 5);
    }

    #[test]
    fn function_candidate_names_all_forms() {
        let names = function_candidate_names("run", Some("main"), Some("App"));
        assert!(names.contains(&"run".to_string()));
        assert!(names.contains(&"main.run".to_string()));
        assert!(names.contains(&"App.run".to_string()));
        assert!(names.contains(&"main.App.run".to_string()));
    }
}
