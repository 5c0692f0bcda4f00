//! breakpoint.rs — Gestion des points d'arrêt (files/lines, conditions, logpoints, etc.)
//!
//! - `BreakpointManager` : ajout/màj/clear/list, résolution par fichier/ligne.
//! - `BreakpointRequest` → côté client (DAP) ; `BreakpointResolved` → côté VM.
//! - Support : conditions (expr string), hitCount (N), logpoints, fonctionnels.
//! - Remapping de ligne via hook `LineMapper` (ex: source map / debug info).
//!
//! Thread-safety : non-Send par défaut (stockage simple). Enrobez dans Arc<Mutex<_>> côté appelant si besoin.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::eval::EvalEnv;
use crate::resolver::{resolve, BreakpointMeta, ResolveAction};

pub type FileKey = String;     // chemin canonique (string)
pub type BreakpointId = u64;   // identifiant interne
pub type FuncName = String;
pub type ThreadId = i64;

/// Type de point d'arrêt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakpointKind {
    Line,       // fichier + ligne
    Function,   // nom de fonction
}

/// Requête (côté DAP/UI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointRequest {
    pub kind: BreakpointKind,
    pub source_path: Option<String>, // requis si Line
    pub line: Option<u32>,           // requis si Line
    pub function: Option<FuncName>,  // requis si Function

    /// Expression booléenne évaluée côté VM (ex: "x > 3 && y == 0").
    pub condition: Option<String>,
    /// Prédicat DAP `hitCondition` : `N`, `==N`, `>=N`, `%N`. Échec de parsing
    /// du côté du résolveur ⇒ fail-open (considéré comme rempli).
    pub hit_condition: Option<String>,
    /// Logpoint : n’arrête pas, log le message ; peut contenir {var}
    pub log_message: Option<String>,
    /// Activation
    pub enabled: bool,
    /// Contrainte de thread (optionnel)
    pub thread: Option<ThreadId>,
}

impl Default for BreakpointRequest {
    fn default() -> Self {
        Self {
            kind: BreakpointKind::Line,
            source_path: None,
            line: None,
            function: None,
            condition: None,
            hit_condition: None,
            log_message: None,
            enabled: true,
            thread: None,
        }
    }
}

/// État résolu (côté VM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointResolved {
    pub id: BreakpointId,
    pub kind: BreakpointKind,
    pub source_path: Option<FileKey>,
    pub line_effective: Option<u32>,
    pub function: Option<FuncName>,

    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    /// Compteur de hits monotone (incrémenté à chaque passage, jamais remis
    /// à zéro tant que le breakpoint existe).
    pub hit_count: u64,
    pub log_message: Option<String>,
    pub enabled: bool,
    pub thread: Option<ThreadId>,

    /// A été mappé (ligne transformée par LineMapper)
    pub mapped: bool,
    /// Vérifié (placé avec succès)
    pub verified: bool,
    /// Dernière ligne demandée (pour debug)
    pub requested_line: Option<u32>,
}

/// Hook de remapping (ex: source map : .vitte -> bytecode)
pub trait LineMapper {
    /// Retourne (ligne_effective, mapped?)
    fn map_line(&self, file: &FileKey, requested_line: u32) -> (u32, bool);
}

/// Implémentation no-op : identique.
pub struct NoMapper;
impl LineMapper for NoMapper {
    fn map_line(&self, _file: &FileKey, requested_line: u32) -> (u32, bool) {
        (requested_line, false)
    }
}

/// Gère les points d’arrêt par fichier et par fonction.
#[derive(Default)]
pub struct BreakpointManager<M: LineMapper = NoMapper> {
    next_id: BreakpointId,
    files: HashMap<FileKey, Vec<BreakpointResolved>>,
    funcs: HashMap<FuncName, Vec<BreakpointResolved>>,
    mapper: M,
}

impl<M: LineMapper> BreakpointManager<M> {
    pub fn with_mapper(mapper: M) -> Self {
        Self {
            next_id: 1,
            files: HashMap::new(),
            funcs: HashMap::new(),
            mapper,
        }
    }

    /// Canonicalise un chemin en clé stable.
    pub fn canonical_key<P: AsRef<Path>>(p: P) -> FileKey {
        // Ici on se contente de normaliser en String ; à toi d’ajouter
        // une vraie canonicalisation (std::fs::canonicalize) si nécessaire.
        p.as_ref().to_string_lossy().to_string()
    }

    /// Définit la *liste complète* des BPs pour un fichier (style DAP setBreakpoints).
    /// Retourne la liste résolue (verified, actual line).
    pub fn set_breakpoints_for_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        requests: &[BreakpointRequest],
    ) -> Vec<BreakpointResolved> {
        let key = Self::canonical_key(path);
        // Purge et remplace
        let mut resolved = Vec::with_capacity(requests.len());
        for req in requests {
            if req.kind != BreakpointKind::Line {
                continue; // ignore dans cette API
            }
            let line_req = req.line.unwrap_or(1);
            let (line_eff, mapped) = self.mapper.map_line(&key, line_req);

            let bp = BreakpointResolved {
                id: self.alloc_id(),
                kind: BreakpointKind::Line,
                source_path: Some(key.clone()),
                line_effective: Some(line_eff),
                function: None,

                condition: req.condition.clone(),
                hit_condition: req.hit_condition.clone(),
                hit_count: 0,
                log_message: req.log_message.clone(),
                enabled: req.enabled,
                thread: req.thread,

                mapped,
                verified: true,
                requested_line: Some(line_req),
            };
            resolved.push(bp);
        }
        self.files.insert(key, resolved.clone());
        resolved
    }

    /// Ajoute un breakpoint de fonction.
    pub fn add_function_breakpoint(&mut self, func: impl Into<FuncName>, req: &BreakpointRequest) -> BreakpointResolved {
        let fname = func.into();
        let bp = BreakpointResolved {
            id: self.alloc_id(),
            kind: BreakpointKind::Function,
            source_path: None,
            line_effective: None,
            function: Some(fname.clone()),

            condition: req.condition.clone(),
            hit_condition: req.hit_condition.clone(),
            hit_count: 0,
            log_message: req.log_message.clone(),
            enabled: req.enabled,
            thread: req.thread,

            mapped: false,
            verified: true,
            requested_line: None,
        };
        self.funcs.entry(fname).or_default().push(bp.clone());
        bp
    }

    /// Active/Désactive un breakpoint par id.
    pub fn set_enabled(&mut self, id: BreakpointId, enabled: bool) -> bool {
        self.visit_mut(id, |bp| bp.enabled = enabled)
    }

    /// Supprime un breakpoint par id.
    pub fn remove(&mut self, id: BreakpointId) -> bool {
        let mut removed = false;
        for (_k, v) in self.files.iter_mut() {
            let before = v.len();
            v.retain(|bp| bp.id != id);
            removed |= v.len() != before;
        }
        for (_k, v) in self.funcs.iter_mut() {
            let before = v.len();
            v.retain(|bp| bp.id != id);
            removed |= v.len() != before;
        }
        removed
    }

    /// Liste tous les breakpoints.
    pub fn list_all(&self) -> Vec<BreakpointResolved> {
        let mut out = Vec::new();
        for v in self.files.values() {
            out.extend(v.iter().cloned());
        }
        for v in self.funcs.values() {
            out.extend(v.iter().cloned());
        }
        out
    }

    /// Retourne les BPs d’un fichier (effectifs).
    pub fn list_for_file<P: AsRef<Path>>(&self, path: P) -> Vec<BreakpointResolved> {
        let key = Self::canonical_key(path);
        self.files.get(&key).cloned().unwrap_or_default()
    }

    /// Retourne les BPs d’une fonction.
    pub fn list_for_function(&self, func: &str) -> Vec<BreakpointResolved> {
        self.funcs.get(func).cloned().unwrap_or_default()
    }

    /// Décide si on doit s'arrêter à (file, line, thread). Délègue le calcul
    /// hit-count/condition/logpoint au résolveur (§4.2).
    /// - `env`: environnement d'évaluation pour la condition (None = aucune
    ///   variable accessible ; toute condition posée se résout alors en CONTINUE).
    /// - Retour:
    ///     - `BreakAction::Stop(id)` → pause VM
    ///     - `BreakAction::Log(id, msg)` → logpoint (ne pas pauser)
    ///     - `BreakAction::None` → continuer
    pub fn should_break(
        &mut self,
        file: &FileKey,
        line: u32,
        thread: Option<ThreadId>,
        env: Option<&dyn EvalEnv>,
    ) -> BreakAction {
        if let Some(list) = self.files.get_mut(file) {
            for bp in list.iter_mut().filter(|bp| bp.enabled) {
                if bp.line_effective == Some(line) && thread_match(bp.thread, thread) {
                    if let Some(act) = decide_action(bp, env) {
                        return act;
                    }
                }
            }
        }

        // Function breakpoints ne sont pas résolus par (file,line) ; c'est au callsite de décider.
        BreakAction::None
    }

    /// À appeler lorsqu'on entre dans une fonction ; renvoie une action éventuelle.
    pub fn hit_function(&mut self, func: &str, thread: Option<ThreadId>, env: Option<&dyn EvalEnv>) -> BreakAction {
        if let Some(list) = self.funcs.get_mut(func) {
            for bp in list.iter_mut().filter(|bp| bp.enabled) {
                if thread_match(bp.thread, thread) {
                    if let Some(act) = decide_action(bp, env) {
                        return act;
                    }
                }
            }
        }
        BreakAction::None
    }

    fn visit_mut<FN>(&mut self, id: BreakpointId, mut f: FN) -> bool
    where
        FN: FnMut(&mut BreakpointResolved),
    {
        for v in self.files.values_mut() {
            for bp in v.iter_mut() {
                if bp.id == id {
                    f(bp);
                    return true;
                }
            }
        }
        for v in self.funcs.values_mut() {
            for bp in v.iter_mut() {
                if bp.id == id {
                    f(bp);
                    return true;
                }
            }
        }
        false
    }

    fn alloc_id(&mut self) -> BreakpointId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Résultat d’une décision à un site potentiel d’arrêt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakAction {
    None,
    Stop(BreakpointId),
    Log(BreakpointId, String),
}

fn thread_match(bp_thread: Option<ThreadId>, cur: Option<ThreadId>) -> bool {
    match (bp_thread, cur) {
        (None, _) => true,
        (Some(b), Some(c)) => b == c,
        (Some(_), None) => false,
    }
}

/// Délègue la décision au résolveur (§4.2) : incrément du compteur,
/// prédicat de hit-count, condition, logpoint, dans cet ordre exact.
/// Retourne `None` quand ce breakpoint précis ne s'applique pas (pour
/// laisser la boucle appelante tenter d'autres candidats à la même ligne).
fn decide_action(bp: &mut BreakpointResolved, env: Option<&dyn EvalEnv>) -> Option<BreakAction> {
    let mut meta = BreakpointMeta {
        condition: bp.condition.clone(),
        hit_condition: bp.hit_condition.clone(),
        log_message: bp.log_message.clone(),
        hit_count: bp.hit_count,
    };

    let result = resolve(Some(&mut meta), env);
    bp.hit_count = meta.hit_count;

    match result.action {
        ResolveAction::Stop => Some(BreakAction::Stop(bp.id)),
        ResolveAction::Continue => result.rendered_log.map(|msg| BreakAction::Log(bp.id, msg)),
        ResolveAction::Skip => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Value;
    use std::collections::HashMap as Map;

    struct PlusOneMapper;
    impl LineMapper for PlusOneMapper {
        fn map_line(&self, _file: &FileKey, requested_line: u32) -> (u32, bool) {
            (requested_line + 1, true)
        }
    }

    struct MapEnv(Map<String, Value>);
    impl EvalEnv for MapEnv {
        fn get_var(&self, name: &str) -> Option<Value> {
            self.0.get(name).cloned()
        }
    }
    fn env(pairs: &[(&str, Value)]) -> MapEnv {
        MapEnv(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn set_and_hit_line_bp() {
        let mut mgr = BreakpointManager::with_mapper(NoMapper);
        let reqs = vec![BreakpointRequest {
            source_path: Some("a.vitte".into()),
            line: Some(10),
            ..Default::default()
        }];
        let res = mgr.set_breakpoints_for_file("a.vitte", &reqs);
        assert_eq!(res.len(), 1);
        let key = BreakpointManager::<NoMapper>::canonical_key("a.vitte");
        assert!(matches!(mgr.should_break(&key, 10, None, None), BreakAction::Stop(_)));
    }

    #[test]
    fn mapping_applied() {
        let mut mgr = BreakpointManager::with_mapper(PlusOneMapper);
        let reqs = vec![BreakpointRequest {
            source_path: Some("a.vitte".into()),
            line: Some(4),
            ..Default::default()
        }];
        let res = mgr.set_breakpoints_for_file("a.vitte", &reqs);
        assert_eq!(res[0].line_effective, Some(5));
    }

    #[test]
    fn hitcount_and_condition_and_log() {
        let mut mgr = BreakpointManager::with_mapper(NoMapper);
        let reqs = vec![BreakpointRequest {
            source_path: Some("a.vitte".into()),
            line: Some(3),
            hit_condition: Some("==3".into()), // n'arme qu'au 3e passage
            condition: Some("x>0".into()),
            log_message: Some("here".into()), // logpoint → pas d'arrêt
            ..Default::default()
        }];
        let _ = mgr.set_breakpoints_for_file("a.vitte", &reqs);
        let key = BreakpointManager::<NoMapper>::canonical_key("a.vitte");
        let e = env(&[("x", Value::Int(1))]);

        // 1er hit : hit-count pas encore satisfait (1 != 3)
        assert!(matches!(mgr.should_break(&key, 3, None, Some(&e)), BreakAction::None));
        // 2e hit : idem (2 != 3)
        assert!(matches!(mgr.should_break(&key, 3, None, Some(&e)), BreakAction::None));
        // 3e hit : hit-count satisfait, condition vraie → logpoint
        match mgr.should_break(&key, 3, None, Some(&e)) {
            BreakAction::Log(_, msg) => assert_eq!(msg, "here"),
            other => panic!("expected Log, got {other:?}"),
        }
    }

    #[test]
    fn condition_false_never_stops() {
        let mut mgr = BreakpointManager::with_mapper(NoMapper);
        let reqs = vec![BreakpointRequest {
            source_path: Some("a.vitte".into()),
            line: Some(3),
            condition: Some("x>0".into()),
            ..Default::default()
        }];
        let _ = mgr.set_breakpoints_for_file("a.vitte", &reqs);
        let key = BreakpointManager::<NoMapper>::canonical_key("a.vitte");
        let e = env(&[("x", Value::Int(0))]);
        assert!(matches!(mgr.should_break(&key, 3, None, Some(&e)), BreakAction::None));
    }

    #[test]
    fn function_bp_hit() {
        let mut mgr = BreakpointManager::with_mapper(NoMapper);
        let req = BreakpointRequest {
            kind: BreakpointKind::Function,
            function: Some("main".into()),
            ..Default::default()
        };
        let _bp = mgr.add_function_breakpoint("main", &req);
        assert!(matches!(mgr.hit_function("main", None, None), BreakAction::Stop(_)));
        assert!(matches!(mgr.hit_function("other", None, None), BreakAction::None));
    }

    #[test]
    fn enable_disable_remove() {
        let mut mgr = BreakpointManager::with_mapper(NoMapper);
        let reqs = vec![BreakpointRequest {
            source_path: Some("a.vitte".into()),
            line: Some(2),
            ..Default::default()
        }];
        let res = mgr.set_breakpoints_for_file("a.vitte", &reqs);
        let id = res[0].id;

        assert!(mgr.set_enabled(id, false));
        let key = BreakpointManager::<NoMapper>::canonical_key("a.vitte");
        assert!(matches!(mgr.should_break(&key, 2, None, None), BreakAction::None));

        assert!(mgr.set_enabled(id, true));
        assert!(matches!(mgr.should_break(&key, 2, None, None), BreakAction::Stop(_)));

        assert!(mgr.remove(id));
        assert!(matches!(mgr.should_break(&key, 2, None, None), BreakAction::None));
    }
}
