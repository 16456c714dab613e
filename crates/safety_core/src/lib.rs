//! # Safety Core
//!
//! Núcleo do dispositivo de detecção de quedas: amostragem periódica,
//! detecção de borda do botão de pânico, classificação de queda por
//! magnitude, beep local e publicação resiliente dos alertas.
//!
//! ## Módulos
//! - [`types`] – Amostra, nível do botão, eventos e mensagem de alerta
//! - [`detector`] – Debouncer por borda e classificador de queda
//! - [`ports`] – Traits da plataforma (sensores, canal, buzzer, relógio)
//! - [`protocol`] – Payload JSON publicado no broker
//! - [`dispatcher`] – Reconexão bloqueante e envio fire-and-forget
//! - [`event_loop`] – Orquestração tick a tick
//! - [`config`] – Configuração unificada via TOML

pub mod types;
pub mod detector;
pub mod ports;
pub mod protocol;
pub mod dispatcher;
pub mod event_loop;
pub mod config;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports convenientes
pub use types::{AlertMessage, ChannelState, ControlLevel, SafetyEvent, Sample};
pub use detector::{Debouncer, FallClassifier, FALL_THRESHOLD_MS2};
pub use dispatcher::{AlertDispatcher, DispatchError};
pub use event_loop::EventLoop;
pub use config::AppConfig;
