//! Tipos do domínio: amostras do acelerômetro, nível do botão de pânico,
//! eventos de segurança e a mensagem de alerta publicada.
//!
//! Nenhum destes valores é persistido: uma [`Sample`] nasce e morre dentro
//! de um único tick do loop.

use serde::{Deserialize, Serialize};

/// Gravidade padrão (m/s²).
pub const STANDARD_GRAVITY: f32 = 9.81;

// ──────────────────────────────────────────────
// Amostra
// ──────────────────────────────────────────────

/// Aceleração instantânea nos três eixos (m/s²).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dispositivo parado, apenas a gravidade no eixo Z.
    pub fn at_rest() -> Self {
        Self::new(0.0, 0.0, STANDARD_GRAVITY)
    }

    /// Norma euclidiana `sqrt(x² + y² + z²)`.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ──────────────────────────────────────────────
// Botão de pânico
// ──────────────────────────────────────────────

/// Estado lógico do botão. O pino usa pull-up, então nível baixo = pressionado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLevel {
    Pressed,
    Released,
}

impl ControlLevel {
    /// Converte o nível elétrico bruto (`true` = alto).
    pub fn from_raw(raw_high: bool) -> Self {
        if raw_high {
            ControlLevel::Released
        } else {
            ControlLevel::Pressed
        }
    }
}

// ──────────────────────────────────────────────
// Eventos e mensagem
// ──────────────────────────────────────────────

/// Evento discreto de segurança. No máximo um por tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyEvent {
    Panic,
    Fall,
}

impl SafetyEvent {
    /// Rótulo usado nos logs de alerta.
    pub fn log_label(&self) -> &'static str {
        match self {
            SafetyEvent::Panic => "[ALERTA DE PÂNICO]",
            SafetyEvent::Fall => "[QUEDA DETECTADA]",
        }
    }
}

/// Payload publicado no tópico de alertas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub device_id: String,
    pub event: SafetyEvent,
}

impl AlertMessage {
    pub fn new(device_id: impl Into<String>, event: SafetyEvent) -> Self {
        Self {
            device_id: device_id.into(),
            event,
        }
    }
}

/// Ciclo de vida da conexão com o broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
