//! watch.rs — État des data-watchpoints (§4.3)
//!
//! Suit, par frame (identifiée par son `FrameId`), la dernière valeur connue
//! de chaque nom ou expression surveillé. À chaque événement LINE, l'appelant
//! redemande la valeur courante et `record` compare avec l'ancienne pour
//! décider s'il faut émettre un événement `stopped(reason: "data breakpoint")`.
//!
//! Les write-watchpoints comparent les valeurs ; les read-watchpoints n'ont
//! pas de valeur "précédente" à comparer et sont déclenchés par l'inspection
//! du bytecode (cf. `AccessKind::Read`/`ReadWrite`, géré par l'appelant via
//! `access` lors de l'enregistrement).

use crate::eval::Value;
use std::collections::HashMap;

/// Type d'accès qui déclenche un data-watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Write,
    Read,
    ReadWrite,
}

/// Une valeur surveillée : soit une valeur évaluée avec succès, soit un
/// marqueur d'erreur d'évaluation (auto-égal, pour que deux erreurs
/// consécutives ne soient jamais vues comme un "changement").
#[derive(Debug, Clone, PartialEq)]
pub enum WatchedValue {
    Value(Value),
    EvalError,
}

/// Un watchpoint unique : la clé textuelle (nom de variable ou expression),
/// le type d'accès surveillé, et le dernier snapshot connu.
#[derive(Debug, Clone)]
pub struct Watchpoint {
    pub key: String,
    pub access: AccessKind,
    last: Option<WatchedValue>,
}

impl Watchpoint {
    pub fn new(key: impl Into<String>, access: AccessKind) -> Self {
        Self { key: key.into(), access, last: None }
    }
}

/// Snapshot des watchpoints actifs pour une frame donnée (identifiée par
/// son `FrameId`, opaque ici : l'appelant fournit n'importe quel `u64` stable
/// tant que la frame est vivante).
#[derive(Debug, Default)]
pub struct FrameWatchState {
    by_frame: HashMap<i64, Vec<Watchpoint>>,
}

impl FrameWatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un watchpoint pour une frame. Remplace un watchpoint
    /// existant de même clé dans la même frame.
    pub fn watch(&mut self, frame_id: i64, key: impl Into<String>, access: AccessKind) {
        let key = key.into();
        let list = self.by_frame.entry(frame_id).or_default();
        if let Some(existing) = list.iter_mut().find(|w| w.key == key) {
            existing.access = access;
            existing.last = None;
        } else {
            list.push(Watchpoint::new(key, access));
        }
    }

    pub fn unwatch(&mut self, frame_id: i64, key: &str) {
        if let Some(list) = self.by_frame.get_mut(&frame_id) {
            list.retain(|w| w.key != key);
        }
    }

    /// Invalide tous les watchpoints d'une frame (à la reprise de l'exécution,
    /// puisque les `FrameId` ne restent valides qu'entre deux arrêts).
    pub fn clear_frame(&mut self, frame_id: i64) {
        self.by_frame.remove(&frame_id);
    }

    pub fn clear_all(&mut self) {
        self.by_frame.clear();
    }

    /// Enregistre une nouvelle valeur observée pour `key` dans `frame_id` et
    /// retourne `true` si elle diffère de la dernière valeur connue
    /// (et que le watchpoint surveille les écritures).
    pub fn record(&mut self, frame_id: i64, key: &str, access: AccessKind, new: WatchedValue) -> bool {
        let Some(list) = self.by_frame.get_mut(&frame_id) else { return false };
        let Some(wp) = list.iter_mut().find(|w| w.key == key) else { return false };

        let triggers_on_write = matches!(wp.access, AccessKind::Write | AccessKind::ReadWrite);
        let access_matches = matches!(
            (wp.access, access),
            (AccessKind::Write, AccessKind::Write)
                | (AccessKind::Read, AccessKind::Read)
                | (AccessKind::ReadWrite, _)
        );

        let changed = match &wp.last {
            None => true,
            Some(old) => old != &new,
        };
        wp.last = Some(new);

        triggers_on_write && access_matches && changed
    }

    pub fn watchpoints_for(&self, frame_id: i64) -> &[Watchpoint] {
        self.by_frame.get(&frame_id).map_or(&[], |v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_always_triggers() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Write);
        let changed = st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(0)));
        assert!(changed);
    }

    #[test]
    fn unchanged_value_does_not_trigger() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Write);
        st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(5)));
        let changed = st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(5)));
        assert!(!changed);
    }

    #[test]
    fn changed_value_triggers() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Write);
        st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(5)));
        let changed = st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(6)));
        assert!(changed);
    }

    #[test]
    fn consecutive_eval_errors_do_not_trigger() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x.y", AccessKind::Write);
        st.record(1, "x.y", AccessKind::Write, WatchedValue::EvalError);
        let changed = st.record(1, "x.y", AccessKind::Write, WatchedValue::EvalError);
        assert!(!changed);
    }

    #[test]
    fn clear_frame_drops_all_watchpoints() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Write);
        st.clear_frame(1);
        assert!(st.watchpoints_for(1).is_empty());
    }

    #[test]
    fn read_only_watch_ignores_write_access() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Read);
        let changed = st.record(1, "x", AccessKind::Write, WatchedValue::Value(Value::Int(1)));
        assert!(!changed);
    }

    #[test]
    fn unwatch_removes_single_key() {
        let mut st = FrameWatchState::new();
        st.watch(1, "x", AccessKind::Write);
        st.watch(1, "y", AccessKind::Write);
        st.unwatch(1, "x");
        assert_eq!(st.watchpoints_for(1).len(), 1);
        assert_eq!(st.watchpoints_for(1)[0].key, "y");
    }
}
