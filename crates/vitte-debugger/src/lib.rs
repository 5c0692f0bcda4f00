//! vitte-debugger — moteur de débogage in-process pour le runtime Vitte
//!
//! Ce crate implémente le cœur du débogueur : backend de trace
//! (Settrace/Monitoring), résolution des points d'arrêt, data-watches,
//! machine d'états de step, suivi des threads/frames, gestion des variables
//! DAP-friendly, et dispatch de commandes. Le parsing/émission JSON du
//! protocole DAP lui-même, le lanceur de processus externe et le
//! pretty-printer restent hors de ce crate (voir `vitte-dap` pour
//! l'adaptateur DAP qui consomme celui-ci).
//!
//! Organisation :
//! - [`backend`]   : abstraction de trace (legacy `Settrace` vs `Monitoring`)
//! - [`resolver`]  : résolution condition/hit-count/logpoint d'un breakpoint
//! - [`watch`]     : data-watches (écriture/lecture) par frame
//! - [`exception`] : classification et info d'exception au point d'arrêt
//! - [`threads`]   : suivi des threads, allocation des frame IDs
//! - [`variables`] : allocation des `variablesReference`, formatage DAP
//! - [`justmycode`]: classification utilisateur/bibliothèque, async-step-over
//! - [`step`]      : machine d'états de step (granularité, stop-on-entry)
//! - [`source`]    : catalogue des sources (fichiers + synthétiques)
//! - [`debugger`]  : orchestrateur central, point d'entrée principal
//! - [`dispatch`]  : registre de commandes (feature `serde`)
//! - [`config`]    : configuration de lancement (feature `serde`)
//! - [`ipc`]       : transport binaire pour exposer le débogueur (feature `ipc`)
//!
//! `api.rs`/`hook.rs`/`state.rs`/`breakpoint.rs`/`eval.rs`/`policy.rs` restent
//! la façade générique pilotable par n'importe quelle VM (`VitteVm`) ;
//! [`debugger::CoreDebugger`] est le nouveau point d'entrée qui implémente
//! fidèlement l'algorithme de dispatch historique.

#![forbid(unsafe_code)]

pub mod api;
pub mod backend;
pub mod breakpoint;
pub mod debugger;
pub mod error;
pub mod eval;
pub mod exception;
pub mod hook;
pub mod justmycode;
pub mod policy;
pub mod resolver;
pub mod source;
pub mod state;
pub mod step;
pub mod threads;
pub mod variables;
pub mod watch;

#[cfg(feature = "serde")]
pub mod config;
#[cfg(feature = "serde")]
pub mod dispatch;

#[cfg(feature = "ipc")]
pub mod ipc;

pub use debugger::{CoreDebugger, SessionHooks, StopEvent};
pub use error::{DebugResult, DebuggerError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_debugger_constructs_with_default_backend() {
        let dbg = CoreDebugger::new(None, SessionHooks::default());
        assert!(!dbg.backend_statistics().backend_name.is_empty());
    }
}
