//! # Safety Device
//!
//! Detecta quedas e acionamentos do botão de pânico e publica alertas
//! para o endpoint de monitoramento.
//!
//! ## Uso
//! ```bash
//! safety_device                           # amostras de stdin (ou [replay].path)
//! safety_device --replay amostras.txt     # amostras gravadas
//! ```

mod buzzer;
mod replay;
mod tcp_channel;

use buzzer::TerminalBuzzer;
use replay::ReplaySource;
use safety_core::config::AppConfig;
use safety_core::dispatcher::AlertDispatcher;
use safety_core::event_loop::EventLoop;
use safety_core::ports::SystemClock;
use safety_core::FallClassifier;
use tcp_channel::TcpChannel;
use tracing::{error, info, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(path) = replay_arg() {
        config.replay.path = path;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        std::process::exit(2);
    }

    // ── Sensores ──
    // Sem fonte de amostras não há o que monitorar: aborta antes do loop.
    let source = match ReplaySource::open(&config.replay.path) {
        Ok(source) => source,
        Err(e) => {
            error!("Falha ao inicializar sensores: {e}");
            std::process::exit(1);
        }
    };
    info!("Sensores inicializados");

    // ── Canal ──
    let channel = TcpChannel::new(&config.broker);
    let broker_addr = channel.addr().to_string();
    let dispatcher = AlertDispatcher::new(channel, SystemClock, config.dispatcher_settings());

    let mut event_loop = EventLoop::new(
        source,
        TerminalBuzzer::default(),
        FallClassifier::new(config.detection.fall_threshold),
        dispatcher,
        SystemClock,
        config.loop_settings(),
    );

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🛟 SAFETY DEVICE – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Dispositivo: {}", config.device.device_id);
    println!("  Broker:      {broker_addr}");
    println!("  Alertas:     {}", config.topics.alert);
    println!("  Limiar:      {:.1} m/s²", config.detection.fall_threshold);
    println!("  Amostragem:  {} ms", config.detection.sample_period_ms);
    println!("══════════════════════════════════════════════");
    println!();

    event_loop.run()
}

/// `--replay <caminho>` na linha de comando.
fn replay_arg() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--replay" {
            return args.next();
        }
    }
    None
}
