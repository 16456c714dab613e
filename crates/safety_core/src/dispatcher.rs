//! Despacho de alertas pelo canal pub/sub.
//!
//! Nenhum alerta é publicado com o canal desconectado: antes de cada envio
//! o dispatcher bloqueia reconectando, sem limite de tentativas, com espera
//! fixa entre elas. A publicação em si é fire-and-forget.

use crate::config::{
    DEFAULT_ALERT_TOPIC, DEFAULT_CLIENT_ID, DEFAULT_COMMAND_TOPIC, DEFAULT_COOLDOWN_MS,
    DEFAULT_DEVICE_ID, DEFAULT_RECONNECT_BACKOFF_MS,
};
use crate::ports::{Channel, Clock, PublishError};
use crate::protocol::{encode_alert, encode_status, ProtocolError, STATUS_ONLINE};
use crate::types::{AlertMessage, ChannelState, SafetyEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Erros de um despacho.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Alerta não codificado: {0}")]
    Encode(#[from] ProtocolError),

    #[error("Alerta não entregue ao transporte: {0}")]
    Publish(#[from] PublishError),
}

/// Parâmetros fixos do dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub device_id: String,
    pub client_id: String,
    pub alert_topic: String,
    pub command_topic: String,
    /// `Some` = anuncia "online" neste tópico após cada conexão
    pub status_topic: Option<String>,
    pub reconnect_backoff: Duration,
    pub cooldown: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.into(),
            client_id: DEFAULT_CLIENT_ID.into(),
            alert_topic: DEFAULT_ALERT_TOPIC.into(),
            command_topic: DEFAULT_COMMAND_TOPIC.into(),
            status_topic: None,
            reconnect_backoff: Duration::from_millis(DEFAULT_RECONNECT_BACKOFF_MS),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
        }
    }
}

/// Contadores do dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub published: u64,
    pub publish_failures: u64,
}

pub struct AlertDispatcher<C: Channel, K: Clock> {
    channel: C,
    clock: K,
    settings: DispatcherSettings,
    state: ChannelState,
    stats: DispatcherStats,
}

impl<C: Channel, K: Clock> AlertDispatcher<C, K> {
    pub fn new(channel: C, clock: K, settings: DispatcherSettings) -> Self {
        let state = if channel.is_connected() {
            ChannelState::Connected
        } else {
            ChannelState::Disconnected
        };
        Self {
            channel,
            clock,
            settings,
            state,
            stats: DispatcherStats::default(),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }

    /// Consulta o transporte e sincroniza o estado local.
    pub fn is_connected(&mut self) -> bool {
        let connected = self.channel.is_connected();
        if !connected && self.state == ChannelState::Connected {
            warn!("Conexão com o broker perdida");
            self.state = ChannelState::Disconnected;
        }
        connected
    }

    /// Bloqueia até o canal estar conectado.
    ///
    /// Retorna o número de tentativas que falharam (e de esperas feitas).
    pub fn ensure_connected(&mut self) -> u64 {
        let mut failures = 0;

        while !self.is_connected() {
            self.state = ChannelState::Connecting;
            self.stats.connect_attempts += 1;
            info!("Conectando ao broker como {}...", self.settings.client_id);

            let outcome = self.channel.connect(&self.settings.client_id);
            match outcome {
                Ok(()) if self.channel.is_connected() => {
                    info!("Conectado ao broker");
                    self.on_connected();
                    if self.channel.is_connected() {
                        self.state = ChannelState::Connected;
                    } else {
                        self.connect_failed(&mut failures, "conexão perdida logo após conectar");
                    }
                }
                Ok(()) => {
                    self.connect_failed(&mut failures, "transporte não reportou conexão");
                }
                Err(e) => {
                    self.connect_failed(&mut failures, &e.to_string());
                }
            }
        }

        self.state = ChannelState::Connected;
        failures
    }

    fn connect_failed(&mut self, failures: &mut u64, reason: &str) {
        self.state = ChannelState::Disconnected;
        self.stats.connect_failures += 1;
        *failures += 1;
        warn!(
            "{reason}. Tentando novamente em {} ms...",
            self.settings.reconnect_backoff.as_millis()
        );
        self.clock.sleep(self.settings.reconnect_backoff);
    }

    fn on_connected(&mut self) {
        self.channel.subscribe(&self.settings.command_topic);
        debug!("Assinado {}", self.settings.command_topic);

        if let Some(topic) = self.settings.status_topic.clone() {
            match self.announce_online(&topic) {
                Ok(()) => debug!("Status {STATUS_ONLINE} publicado em {topic}"),
                Err(e) => warn!("Status não anunciado: {e}"),
            }
        }
    }

    fn announce_online(&mut self, topic: &str) -> Result<(), DispatchError> {
        let payload = encode_status(&self.settings.device_id, STATUS_ONLINE)?;
        self.channel.publish(topic, &payload)?;
        Ok(())
    }

    /// Processa o tráfego de fundo do transporte.
    pub fn service(&mut self) {
        self.channel.service();
    }

    /// Publica o evento e aplica o cooldown.
    ///
    /// Reconecta antes se preciso. Falhas de publicação não são repetidas;
    /// o cooldown acontece em qualquer caso.
    pub fn dispatch(&mut self, event: SafetyEvent) -> Result<(), DispatchError> {
        self.ensure_connected();

        let result = self.publish(event);
        match &result {
            Ok(()) => self.stats.published += 1,
            Err(_) => self.stats.publish_failures += 1,
        }

        self.clock.sleep(self.settings.cooldown);
        result
    }

    fn publish(&mut self, event: SafetyEvent) -> Result<(), DispatchError> {
        let message = AlertMessage::new(self.settings.device_id.as_str(), event);
        let payload = encode_alert(&message)?;
        self.channel.publish(&self.settings.alert_topic, &payload)?;
        info!(
            "{} {}",
            event.log_label(),
            String::from_utf8_lossy(&payload)
        );
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
