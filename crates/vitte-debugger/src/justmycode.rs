//! justmycode.rs — Classification "code utilisateur" vs bibliothèque (§4.6)
//!
//! Porté depuis le classificateur historique : une frame est considérée
//! "bibliothèque" si son chemin source se trouve dans l'arbre de la
//! stdlib/des paquets installés de l'interpréteur hôte, dans un module de
//! bootstrap gelé, ou dans les internals du débogueur lui-même. Les
//! comparaisons sont insensibles à la casse et tolèrent les deux styles de
//! séparateur de chemin.
//!
//! Fournit également l'état "async-step-over" : un indicateur sticky posé
//! quand une frame de coroutine/boucle d'événements est franchie pendant un
//! `next`/`stepIn`, pour que l'arrêt suivant atterrisse dans du code
//! utilisateur plutôt que dans les internals de l'exécuteur async.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::threads::FrameLike;

/// Racines de bibliothèque découvertes une fois par process à partir des
/// répertoires ancêtres de l'exécutable courant, à l'image du
/// `_SYS_PREFIX_CACHE` mémoïsé au niveau module de l'implémentation d'origine.
static LIBRARY_ROOT_CACHE: OnceLock<HashSet<String>> = OnceLock::new();

fn normalize_root(path: &str) -> String {
    let mut n = path.replace('\\', "/").to_lowercase();
    if !n.ends_with('/') {
        n.push('/');
    }
    n
}

/// Répertoires ancêtres de `std::env::current_exe()`, normalisés. La racine
/// du système de fichiers elle-même est exclue : elle n'a pas de parent et la
/// retenir ferait considérer *tout* chemin absolu comme de la bibliothèque.
fn discovered_library_roots() -> &'static HashSet<String> {
    LIBRARY_ROOT_CACHE.get_or_init(|| {
        let mut roots = HashSet::new();
        if let Ok(exe) = std::env::current_exe() {
            for ancestor in exe.ancestors().skip(1) {
                if ancestor.parent().is_none() {
                    continue;
                }
                if let Some(s) = ancestor.to_str() {
                    roots.insert(normalize_root(s));
                }
            }
        }
        roots
    })
}

/// Racines de chemin considérées comme "bibliothèque" (stdlib, venv, site-packages
/// équivalent). Combine les racines fournies par l'appelant au lancement de la
/// session avec celles auto-découvertes via `discovered_library_roots`.
#[derive(Debug, Clone, Default)]
pub struct JustMyCodeConfig {
    pub enabled: bool,
    library_roots: Vec<String>,
}

impl JustMyCodeConfig {
    pub fn new(enabled: bool, library_roots: Vec<String>) -> Self {
        let mut roots: Vec<String> = library_roots.into_iter().map(|p| normalize_root(&p)).collect();
        roots.extend(discovered_library_roots().iter().cloned());
        Self { enabled, library_roots: roots }
    }

    /// Retourne `true` si `filename` doit être traité comme du code utilisateur.
    pub fn is_user_path(&self, filename: &str) -> bool {
        if !self.enabled {
            return true;
        }

        if filename.starts_with("<frozen ") || filename == "<frozen>" {
            return false;
        }

        let norm = filename.replace('\\', "/");
        let norm_lower = norm.to_lowercase();

        if norm_lower.contains("site-packages/") || norm_lower.contains("dist-packages/") {
            return false;
        }

        for root in &self.library_roots {
            if norm_lower.starts_with(root.as_str()) {
                return false;
            }
        }

        !norm.contains("/vitte-debugger/src/") && !norm.contains("/vitte-debugger/launcher/")
    }
}

/// État "async-step-over" : sticky jusqu'à ce que l'exécution revienne en
/// code utilisateur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsyncStepOverState {
    active: bool,
}

impl AsyncStepOverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(self) -> bool {
        self.active
    }

    pub fn set(&mut self, value: bool) {
        self.active = value;
    }

    pub fn clear(&mut self) {
        self.active = false;
    }
}

/// Sous-chaînes de chemin (normalisé, slash avant) marquant la machinerie de
/// coroutine/boucle d'événements.
pub const ASYNC_PATH_MARKERS: [&str; 2] = ["/asyncio/", "/concurrent/futures/"];

/// Classifie un chemin source comme appartenant à la machinerie async, par
/// scan de sous-chaînes sur le chemin normalisé (slash avant, insensible à
/// la casse).
pub fn is_async_path(source_path: &str) -> bool {
    let norm = source_path.replace('\\', "/").to_lowercase();
    ASYNC_PATH_MARKERS.iter().any(|marker| norm.contains(marker))
}

/// Classifie une frame comme machinerie async : priorité au marqueur natif
/// exposé par `FrameLike::is_async_frame` (ex. bytecode/ABI du runtime), puis
/// repli sur le classement par chemin source.
pub fn is_event_loop_frame(frame: &dyn FrameLike) -> bool {
    frame.is_async_frame() || is_async_path(&frame.source_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> JustMyCodeConfig {
        JustMyCodeConfig::new(true, vec!["/usr/lib/vitte/".into()])
    }

    #[test]
    fn disabled_treats_everything_as_user_code() {
        let c = JustMyCodeConfig::new(false, vec!["/usr/lib/vitte/".into()]);
        assert!(c.is_user_path("/usr/lib/vitte/std/io.vt"));
    }

    #[test]
    fn frozen_bootstrap_is_library() {
        assert!(!cfg().is_user_path("<frozen importlib._bootstrap>"));
    }

    #[test]
    fn site_packages_is_library() {
        assert!(!cfg().is_user_path("/home/u/venv/lib/site-packages/foo/mod.vt"));
    }

    #[test]
    fn stdlib_prefix_is_library_case_insensitive() {
        assert!(!cfg().is_user_path("/USR/LIB/VITTE/std/io.vt"));
    }

    #[test]
    fn debugger_internals_are_library() {
        assert!(!cfg().is_user_path("/repo/crates/vitte-debugger/src/debugger.rs"));
    }

    #[test]
    fn app_code_is_user() {
        assert!(cfg().is_user_path("/home/u/app/main.vt"));
    }

    #[test]
    fn windows_separators_normalised() {
        assert!(!cfg().is_user_path(r"/usr/lib/vitte\std\io.vt"));
    }

    #[test]
    fn filesystem_root_is_never_auto_discovered_as_a_library_root() {
        // Si la racine "/" était retenue comme racine découverte, tout chemin
        // absolu deviendrait "bibliothèque" — la découverte doit l'exclure.
        assert!(!discovered_library_roots().contains("/"));
        assert!(cfg().is_user_path("/home/u/app/main.vt"));
    }

    #[test]
    fn async_step_over_is_sticky_until_cleared() {
        let mut st = AsyncStepOverState::new();
        assert!(!st.is_active());
        st.set(true);
        assert!(st.is_active());
        st.clear();
        assert!(!st.is_active());
    }

    struct PathFrame {
        path: &'static str,
        async_marker: bool,
    }
    impl FrameLike for PathFrame {
        fn identity(&self) -> usize {
            self as *const _ as usize
        }
        fn function_name(&self) -> String {
            "frame".into()
        }
        fn source_path(&self) -> String {
            self.path.to_string()
        }
        fn line(&self) -> u32 {
            1
        }
        fn parent(&self) -> Option<Box<dyn FrameLike>> {
            None
        }
        fn is_async_frame(&self) -> bool {
            self.async_marker
        }
    }

    #[test]
    fn async_path_markers_are_detected() {
        assert!(is_async_path("/usr/lib/vitte/asyncio/tasks.vt"));
        assert!(is_async_path("/usr/lib/vitte/concurrent/futures/thread.vt"));
        assert!(!is_async_path("/home/u/app/main.vt"));
    }

    #[test]
    fn async_path_markers_are_case_and_separator_insensitive() {
        assert!(is_async_path(r"C:\vitte\ASYNCIO\tasks.vt"));
    }

    #[test]
    fn recognises_event_loop_frames_by_path() {
        let f = PathFrame { path: "/usr/lib/vitte/asyncio/base_events.vt", async_marker: false };
        assert!(is_event_loop_frame(&f));
        let user = PathFrame { path: "/home/u/app/main.vt", async_marker: false };
        assert!(!is_event_loop_frame(&user));
    }

    #[test]
    fn native_async_marker_takes_priority_over_path() {
        let f = PathFrame { path: "/home/u/app/main.vt", async_marker: true };
        assert!(is_event_loop_frame(&f));
    }
}
