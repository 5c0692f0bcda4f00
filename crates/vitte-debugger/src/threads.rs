//! threads.rs — Suivi des threads et des frames (§4.8)
//!
//! Centralise ce qui était auparavant épars : enregistrement des threads,
//! ensemble des threads arrêtés, allocation d'ID de frame, et stockage de la
//! pile par thread. Les `FrameId` ne sont valides qu'entre un événement
//! `stopped` et la reprise suivante : `clear_frames` doit être appelée à
//! chaque `continue`/`step*`, et invalide à la fois la pile affichée
//! (`frames_by_thread`) et la table de résolution `frame_id_to_frame` utilisée
//! par `setVariable`/`evaluate` pour retrouver la frame réelle derrière un ID.
//!
//! Garde le même alias `ThreadId = i64` que `api.rs`/`hook.rs`/`breakpoint.rs`
//! pour éviter un remaniement en cascade de tout le crate existant ; voir
//! DESIGN.md pour la décision.

use std::collections::{HashMap, HashSet};

pub type ThreadId = i64;
pub type FrameId = i64;

/// Profondeur maximale de remontée de pile ; protège des cycles de frames
/// falsifiées (par ex. objets de test) ou de piles pathologiquement profondes.
pub const MAX_STACK_DEPTH: usize = 128;

/// Représentation DAP d'une frame de pile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub id: FrameId,
    pub name: String,
    pub line: u32,
    pub column: u32,
    pub source_name: String,
    pub source_path: String,
}

/// Contrat minimal qu'une frame d'exécution concrète doit satisfaire pour
/// être marchée par `build_stack_frames`. Défensif par construction : toute
/// frame qui ne répond plus (objet libéré, pont FFI cassé) interrompt
/// simplement la remontée au lieu de paniquer.
pub trait FrameLike: Send {
    fn identity(&self) -> usize;
    fn function_name(&self) -> String;
    fn source_path(&self) -> String;
    fn line(&self) -> u32;
    fn parent(&self) -> Option<Box<dyn FrameLike>>;

    /// `true` si cette frame appartient à la machinerie de coroutine/boucle
    /// d'événements (ex. `/asyncio/`, `/concurrent/futures/` dans son chemin
    /// source normalisé), pour le step-over asynchrone (§4.6).
    fn is_async_frame(&self) -> bool {
        false
    }
}

/// Gère l'enregistrement des threads, leur état arrêté/actif, et la pile
/// de frames associée.
#[derive(Default)]
pub struct ThreadTracker {
    names: HashMap<ThreadId, String>,
    stopped: HashSet<ThreadId>,
    frames_by_thread: HashMap<ThreadId, Vec<StackFrame>>,
    /// Résout un `FrameId` stocké vers la frame réelle, pour que
    /// `setVariable`/`evaluate` puissent agir sur une frame au-delà de sa
    /// simple représentation DAP (`StackFrame`). Invalidée avec
    /// `frames_by_thread` par `clear_frames`.
    frame_id_to_frame: HashMap<FrameId, Box<dyn FrameLike>>,
    next_frame_id: FrameId,
}

impl std::fmt::Debug for ThreadTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadTracker")
            .field("names", &self.names)
            .field("stopped", &self.stopped)
            .field("frames_by_thread", &self.frames_by_thread)
            .field("frame_id_to_frame_len", &self.frame_id_to_frame.len())
            .field("next_frame_id", &self.next_frame_id)
            .finish()
    }
}

impl ThreadTracker {
    pub fn new() -> Self {
        Self { next_frame_id: 1, ..Default::default() }
    }

    pub fn is_registered(&self, thread_id: ThreadId) -> bool {
        self.names.contains_key(&thread_id)
    }

    pub fn register_thread(&mut self, thread_id: ThreadId, name: impl Into<String>) {
        self.names.insert(thread_id, name.into());
    }

    pub fn thread_name(&self, thread_id: ThreadId) -> Option<&str> {
        self.names.get(&thread_id).map(String::as_str)
    }

    pub fn is_stopped(&self, thread_id: ThreadId) -> bool {
        self.stopped.contains(&thread_id)
    }

    pub fn mark_stopped(&mut self, thread_id: ThreadId) {
        self.stopped.insert(thread_id);
    }

    /// Marque un thread comme repris. Retourne `true` s'il était arrêté.
    pub fn mark_continued(&mut self, thread_id: ThreadId) -> bool {
        self.stopped.remove(&thread_id)
    }

    pub fn has_stopped_threads(&self) -> bool {
        !self.stopped.is_empty()
    }

    pub fn all_threads_continued(&self) -> bool {
        self.stopped.is_empty()
    }

    pub fn allocate_frame_id(&mut self) -> FrameId {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        id
    }

    /// Invalide toutes les frames (à appeler à chaque reprise d'exécution).
    pub fn clear_frames(&mut self) {
        self.frames_by_thread.clear();
        self.frame_id_to_frame.clear();
    }

    /// Enregistre la frame réelle derrière un `FrameId` déjà alloué.
    pub fn register_frame(&mut self, frame_id: FrameId, frame: Box<dyn FrameLike>) {
        self.frame_id_to_frame.insert(frame_id, frame);
    }

    /// Résout un `FrameId` vers la frame enregistrée, si elle est encore
    /// valide (entre le `stopped` qui l'a produite et la reprise suivante).
    pub fn get_frame(&self, frame_id: FrameId) -> Option<&dyn FrameLike> {
        self.frame_id_to_frame.get(&frame_id).map(|b| b.as_ref())
    }

    pub fn store_stack_frames(&mut self, thread_id: ThreadId, frames: Vec<StackFrame>) {
        self.frames_by_thread.insert(thread_id, frames);
    }

    pub fn stack_frames(&self, thread_id: ThreadId) -> &[StackFrame] {
        self.frames_by_thread.get(&thread_id).map_or(&[], |v| v.as_slice())
    }

    /// Reconstruit la pile DAP à partir d'une frame racine, avec détection
    /// de cycle par identité et plafond de profondeur.
    pub fn build_stack_frames(&mut self, root: Option<Box<dyn FrameLike>>) -> Vec<StackFrame> {
        let mut frames = Vec::new();
        let mut visited = HashSet::new();
        let mut depth = 0;
        let mut current = root;

        while let Some(frame) = current {
            if depth >= MAX_STACK_DEPTH {
                break;
            }
            let fid = frame.identity();
            if !visited.insert(fid) {
                break;
            }
            depth += 1;

            let frame_id = self.allocate_frame_id();
            let path = frame.source_path();
            let name = path.rsplit(['/', '\\']).next().unwrap_or(&path).to_string();

            frames.push(StackFrame {
                id: frame_id,
                name: frame.function_name(),
                line: frame.line(),
                column: 0,
                source_name: name,
                source_path: path,
            });

            let parent = frame.parent();
            self.frame_id_to_frame.insert(frame_id, frame);
            current = parent;
        }
        frames
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.stopped.clear();
        self.frames_by_thread.clear();
        self.frame_id_to_frame.clear();
        self.next_frame_id = 1;
    }
}
