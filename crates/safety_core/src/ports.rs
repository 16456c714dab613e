//! Fronteiras com a plataforma: sensores, transporte pub/sub, buzzer e relógio.
//!
//! O núcleo só conhece estes traits. O driver do MPU6050, o WiFi e o
//! protocolo do broker ficam do lado de fora.

use crate::types::Sample;
use std::time::Duration;

/// Falha ao estabelecer o canal com o broker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Falha ao conectar: {reason}")]
pub struct ConnectError {
    pub reason: String,
}

impl ConnectError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// O transporte recusou a publicação com o canal nominalmente conectado.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Falha ao publicar: {reason}")]
pub struct PublishError {
    pub reason: String,
}

impl PublishError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Aquisição periódica do acelerômetro e do botão.
///
/// Após o bootstrap da plataforma as leituras nunca falham.
pub trait SignalSource {
    fn read_acceleration(&mut self) -> Sample;

    /// Nível elétrico bruto do pino do botão (`true` = alto).
    fn read_control_level(&mut self) -> bool;
}

/// Transporte pub/sub até o endpoint de monitoramento.
pub trait Channel {
    fn is_connected(&self) -> bool;

    fn connect(&mut self, client_id: &str) -> Result<(), ConnectError>;

    /// Processa tráfego de entrada e keepalive. Deve ser chamado a cada tick.
    fn service(&mut self);

    fn subscribe(&mut self, topic: &str);

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Feedback sonoro local.
pub trait Feedback {
    fn emit_tone(&mut self, frequency_hz: u32, duration: Duration);
}

/// Único ponto de suspensão do núcleo.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Relógio real: bloqueia a thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
