//! config.rs — Configuration de lancement d'une session de débogage (§6)
//!
//! Reprend les arguments de lancement issus du protocole DAP : champs nommés
//! en `camelCase` côté sérialisation pour correspondre tel quel aux arguments
//! envoyés par les clients DAP usuels.

#![cfg(feature = "serde")]

use serde::{Deserialize, Serialize};

/// Transport IPC choisi pour exposer le débogueur (si la feature `ipc` est active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpcTransport {
    None,
    Tcp,
    Pipe,
}

impl Default for IpcTransport {
    fn default() -> Self {
        Self::None
    }
}

/// Configuration d'une session de lancement (`launch` DAP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub ipc: IpcTransport,
    #[serde(default)]
    pub ipc_host: Option<String>,
    #[serde(default)]
    pub ipc_port: Option<u16>,
    #[serde(default)]
    pub ipc_binary: bool,
    #[serde(default = "default_true")]
    pub just_my_code: bool,
    #[serde(default)]
    pub stop_on_entry: bool,
}

fn default_true() -> bool {
    true
}

impl LaunchConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            ipc: IpcTransport::None,
            ipc_host: None,
            ipc_port: None,
            ipc_binary: false,
            just_my_code: true,
            stop_on_entry: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_launch_args() {
        let json = r#"{"program": "/app/main.vt"}"#;
        let cfg: LaunchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.program, "/app/main.vt");
        assert!(cfg.just_my_code);
        assert!(!cfg.stop_on_entry);
        assert_eq!(cfg.ipc, IpcTransport::None);
    }

    #[test]
    fn round_trips_camel_case_fields() {
        let mut cfg = LaunchConfig::new("/app/main.vt");
        cfg.ipc = IpcTransport::Tcp;
        cfg.ipc_port = Some(9229);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"ipcPort\":9229"));
        assert!(json.contains("\"justMyCode\":true"));
    }

    #[test]
    fn just_my_code_defaults_true_when_absent() {
        let json = r#"{"program": "a.vt", "justMyCode": false}"#;
        let cfg: LaunchConfig = serde_json::from_str(json).unwrap();
        assert!(!cfg.just_my_code);
    }
}
