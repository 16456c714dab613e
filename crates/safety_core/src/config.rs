//! Configuração unificada via TOML.
//!
//! Os valores padrão são as constantes de build do firmware; um
//! `config.toml` parcial só sobrescreve o que declara.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::detector::FALL_THRESHOLD_MS2;
use crate::dispatcher::DispatcherSettings;
use crate::event_loop::LoopSettings;

pub const DEFAULT_DEVICE_ID: &str = "usuarioX";
pub const DEFAULT_CLIENT_ID: &str = "esp32-client-ods3";
pub const DEFAULT_ALERT_TOPIC: &str = "ods3/fall/usuarioX/alert";
pub const DEFAULT_COMMAND_TOPIC: &str = "ods3/fall/usuarioX/cmd";
pub const DEFAULT_STATUS_TOPIC: &str = "ods3/fall/usuarioX/status";
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 50;
pub const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 2000;
pub const DEFAULT_COOLDOWN_MS: u64 = 1000;
pub const DEFAULT_TONE_FREQUENCY_HZ: u32 = 2000;
pub const DEFAULT_TONE_DURATION_MS: u64 = 200;

/// Erros ao gravar a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao gerar TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao gravar arquivo: {0}")]
    Io(#[from] std::io::Error),
}

/// Identidade do dispositivo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identificador enviado em todo alerta
    pub device_id: String,
    /// ID de cliente usado na conexão com o broker
    pub client_id: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.into(),
            client_id: DEFAULT_CLIENT_ID.into(),
        }
    }
}

/// Porta padrão do gateway local que faz a ponte até o broker.
pub const DEFAULT_GATEWAY_PORT: u16 = 7883;

/// Endereço do gateway local.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Intervalo de keepalive (segundos)
    pub keepalive_secs: f64,
    /// Timeout de conexão TCP (segundos)
    pub connect_timeout_secs: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_GATEWAY_PORT,
            keepalive_secs: 15.0,
            connect_timeout_secs: 5.0,
        }
    }
}

/// Tópicos pub/sub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub alert: String,
    /// Reservado para comandos remotos (assinado, sem consumidor)
    pub command: String,
    pub status: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            alert: DEFAULT_ALERT_TOPIC.into(),
            command: DEFAULT_COMMAND_TOPIC.into(),
            status: DEFAULT_STATUS_TOPIC.into(),
        }
    }
}

/// Detecção e amostragem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Limiar de magnitude para queda (m/s²)
    pub fall_threshold: f32,
    /// Período entre amostras (ms)
    pub sample_period_ms: u64,
    /// A cada quantos ticks loga o resumo (0 = nunca)
    pub stats_every_ticks: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fall_threshold: FALL_THRESHOLD_MS2,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            stats_every_ticks: 1200,
        }
    }
}

/// Reconexão e envio de alertas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Espera entre tentativas de conexão (ms)
    pub reconnect_backoff_ms: u64,
    /// Pausa após cada alerta (ms)
    pub cooldown_ms: u64,
    /// Publica "online" no tópico de status após conectar
    pub announce_status: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            announce_status: false,
        }
    }
}

/// Beep de confirmação local.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuzzerConfig {
    pub frequency_hz: u32,
    pub duration_ms: u64,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            duration_ms: DEFAULT_TONE_DURATION_MS,
        }
    }
}

/// Fonte de amostras gravadas (vazio = stdin).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub path: String,
}

/// Configuração raiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    pub detection: DetectionConfig,
    pub dispatch: DispatchConfig,
    pub buzzer: BuzzerConfig,
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml (ao lado do executável).
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.device.device_id.is_empty() {
            errors.push("device_id não pode ser vazio".into());
        }
        if self.device.client_id.is_empty() {
            errors.push("client_id não pode ser vazio".into());
        }
        if self.broker.host.is_empty() {
            errors.push("Host do broker não pode ser vazio".into());
        }
        if self.broker.port == 0 {
            errors.push("Porta do broker não pode ser 0".into());
        }
        if self.broker.keepalive_secs <= 0.0 {
            errors.push(format!("Keepalive inválido: {}", self.broker.keepalive_secs));
        }
        if self.broker.connect_timeout_secs <= 0.0 {
            errors.push(format!(
                "Timeout de conexão inválido: {}",
                self.broker.connect_timeout_secs
            ));
        }
        for (name, topic) in [
            ("alert", &self.topics.alert),
            ("command", &self.topics.command),
            ("status", &self.topics.status),
        ] {
            if topic.is_empty() || topic.contains(char::is_whitespace) {
                errors.push(format!("Tópico {name} inválido: {topic:?}"));
            }
        }
        let threshold = self.detection.fall_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            errors.push(format!(
                "Limiar de queda inválido: {}",
                self.detection.fall_threshold
            ));
        }
        if self.detection.sample_period_ms == 0 {
            errors.push("Período de amostragem não pode ser 0".into());
        }
        if self.dispatch.reconnect_backoff_ms == 0 {
            errors.push("Backoff de reconexão não pode ser 0".into());
        }

        errors
    }

    pub fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            device_id: self.device.device_id.clone(),
            client_id: self.device.client_id.clone(),
            alert_topic: self.topics.alert.clone(),
            command_topic: self.topics.command.clone(),
            status_topic: self
                .dispatch
                .announce_status
                .then(|| self.topics.status.clone()),
            reconnect_backoff: Duration::from_millis(self.dispatch.reconnect_backoff_ms),
            cooldown: Duration::from_millis(self.dispatch.cooldown_ms),
        }
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            sample_period: Duration::from_millis(self.detection.sample_period_ms),
            tone_frequency_hz: self.buzzer.frequency_hz,
            tone_duration: Duration::from_millis(self.buzzer.duration_ms),
            stats_every_ticks: self.detection.stats_every_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn defaults_match_firmware_constants() {
        let config = AppConfig::default();
        assert_eq!(config.device.device_id, "usuarioX");
        assert_eq!(config.topics.alert, "ods3/fall/usuarioX/alert");
        assert_eq!(config.topics.command, "ods3/fall/usuarioX/cmd");
        assert_eq!(config.detection.fall_threshold, 25.0);
        assert_eq!(config.broker.host, "127.0.0.1");
        assert_eq!(config.broker.port, DEFAULT_GATEWAY_PORT);

        let dispatch = config.dispatcher_settings();
        assert_eq!(dispatch.reconnect_backoff, Duration::from_millis(2000));
        assert_eq!(dispatch.cooldown, Duration::from_millis(1000));
        assert_eq!(dispatch.status_topic, None);

        let looping = config.loop_settings();
        assert_eq!(looping.sample_period, Duration::from_millis(50));
        assert_eq!(looping.tone_frequency_hz, 2000);
        assert_eq!(looping.tone_duration, Duration::from_millis(200));
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.device.device_id, parsed.device.device_id);
        assert_eq!(config.broker.port, parsed.broker.port);
        assert_eq!(config.dispatch.cooldown_ms, parsed.dispatch.cooldown_ms);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[device]
device_id = "quarto-12"

[dispatch]
announce_status = true
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.device.device_id, "quarto-12");
        // Outros campos devem ter valor padrão
        assert_eq!(config.device.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.detection.sample_period_ms, 50);
        assert_eq!(
            config.dispatcher_settings().status_topic.as_deref(),
            Some(DEFAULT_STATUS_TOPIC)
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut config = AppConfig::default();
        config.device.device_id.clear();
        config.topics.alert = "com espaço".into();
        config.detection.fall_threshold = f32::NAN;
        config.detection.sample_period_ms = 0;
        config.broker.port = 0;

        let errors = config.validate();
        assert_eq!(errors.len(), 5, "Erros: {:?}", errors);
    }
}
