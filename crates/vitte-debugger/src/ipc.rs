//! ipc.rs — Transport binaire pour exposer le débogueur lui-même (§6)
//!
//! Trame : 1 octet de version (toujours `1`), 4 octets de longueur en
//! big-endian, puis la charge utile JSON en UTF-8. Transport socket
//! (`ipc-tcp`, lié à `127.0.0.1` par défaut) ou tube Unix (`ipc-pipe`,
//! `#[cfg(unix)]` uniquement — il n'existe pas de crate de tube nommé
//! portable dans la table de dépendances de cet espace de travail ; TCP sur
//! boucle locale reste le repli portable).

#![cfg(feature = "ipc")]

use crate::error::{DebugResult, DebuggerError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub const FRAME_VERSION: u8 = 1;

/// Encode/décode la trame binaire `version | length | payload`.
pub struct FrameCodec;

impl FrameCodec {
    pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> DebugResult<()> {
        writer.write_u8(FRAME_VERSION)?;
        writer.write_u32::<BigEndian>(payload.len() as u32)?;
        writer.write_all(payload)?;
        Ok(())
    }

    pub fn read_frame<R: Read>(reader: &mut R) -> DebugResult<Vec<u8>> {
        let version = reader.read_u8()?;
        if version != FRAME_VERSION {
            return Err(DebuggerError::Protocol { message: format!("unsupported frame version {version}") });
        }
        let len = reader.read_u32::<BigEndian>()? as usize;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    #[cfg(feature = "serde")]
    pub fn write_json<W: Write>(writer: &mut W, value: &serde_json::Value) -> DebugResult<()> {
        let payload = serde_json::to_vec(value)?;
        Self::write_frame(writer, &payload)
    }

    #[cfg(feature = "serde")]
    pub fn read_json<R: Read>(reader: &mut R) -> DebugResult<serde_json::Value> {
        let payload = Self::read_frame(reader)?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

/// Adresse de bind pour le transport socket. `loopback()` est le défaut
/// recommandé ; toute autre adresse déclenche un avertissement de sécurité
/// à l'installation (la session expose alors le débogueur au-delà de la
/// machine locale).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddr {
    pub host: String,
    pub port: u16,
}

impl BindAddr {
    pub fn loopback(port: u16) -> Self {
        Self { host: "127.0.0.1".into(), port }
    }

    pub fn is_loopback(&self) -> bool {
        matches!(self.host.as_str(), "127.0.0.1" | "localhost" | "::1")
    }

    pub fn warn_if_not_loopback(&self) {
        if !self.is_loopback() {
            #[cfg(feature = "trace")]
            log::warn!(
                "SECURITY: debugger IPC bound to non-loopback address {}:{} — reachable from the network",
                self.host,
                self.port
            );
        }
    }
}

#[cfg(feature = "ipc-tcp")]
pub mod tcp {
    //! Transport socket via `tokio::net::TcpListener`.
    use super::BindAddr;
    use crate::error::DebugResult;
    use tokio::net::{TcpListener, TcpStream};

    pub async fn bind(addr: &BindAddr) -> DebugResult<TcpListener> {
        addr.warn_if_not_loopback();
        let listener = TcpListener::bind((addr.host.as_str(), addr.port)).await?;
        Ok(listener)
    }

    pub async fn accept(listener: &TcpListener) -> DebugResult<TcpStream> {
        let (stream, _peer) = listener.accept().await?;
        Ok(stream)
    }
}

#[cfg(all(feature = "ipc-pipe", unix))]
pub mod pipe {
    //! Transport tube via un socket de domaine Unix (pas de support Windows :
    //! voir DESIGN.md).
    use crate::error::DebugResult;
    use std::path::Path;
    use tokio::net::{UnixListener, UnixStream};

    pub fn bind(path: &Path) -> DebugResult<UnixListener> {
        let _ = std::fs::remove_file(path);
        Ok(UnixListener::bind(path)?)
    }

    pub async fn accept(listener: &UnixListener) -> DebugResult<UnixStream> {
        let (stream, _addr) = listener.accept().await?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_raw_frame() {
        let mut buf = Vec::new();
        FrameCodec::write_frame(&mut buf, b"hello").unwrap();
        let mut cursor = Cursor::new(buf);
        let payload = FrameCodec::read_frame(&mut cursor).unwrap();
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut buf = vec![2u8, 0, 0, 0, 0];
        let mut cursor = Cursor::new(&mut buf);
        let err = FrameCodec::read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, DebuggerError::Protocol { .. }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn round_trips_json_payload() {
        let mut buf = Vec::new();
        let value = serde_json::json!({"command": "continue", "threadId": 3});
        FrameCodec::write_json(&mut buf, &value).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = FrameCodec::read_json(&mut cursor).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn loopback_detection() {
        assert!(BindAddr::loopback(9229).is_loopback());
        assert!(!BindAddr { host: "0.0.0.0".into(), port: 9229 }.is_loopback());
    }
}
