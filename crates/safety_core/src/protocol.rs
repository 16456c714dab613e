//! Formato dos payloads publicados no broker.
//!
//! JSON compacto, sem espaços, com a ordem de campos fixa:
//!
//! ```text
//! alerta: {"device_id":"usuarioX","event":"panic"}
//! status: {"device_id":"usuarioX","status":"online"}
//! ```

use crate::types::AlertMessage;
use serde::Serialize;

/// Status anunciado após cada conexão bem-sucedida.
pub const STATUS_ONLINE: &str = "online";

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("device_id vazio")]
    EmptyDeviceId,
}

#[derive(Serialize)]
struct StatusMessage<'a> {
    device_id: &'a str,
    status: &'a str,
}

/// Codifica um [`AlertMessage`] para publicação.
pub fn encode_alert(message: &AlertMessage) -> Result<Vec<u8>, ProtocolError> {
    if message.device_id.is_empty() {
        return Err(ProtocolError::EmptyDeviceId);
    }
    serde_json::to_vec(message).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Codifica o anúncio de status do dispositivo.
pub fn encode_status(device_id: &str, status: &str) -> Result<Vec<u8>, ProtocolError> {
    if device_id.is_empty() {
        return Err(ProtocolError::EmptyDeviceId);
    }
    serde_json::to_vec(&StatusMessage { device_id, status })
        .map_err(|e| ProtocolError::Serialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
