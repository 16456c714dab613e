//! Loop principal do dispositivo.
//!
//! Cada tick, em ordem fixa:
//! 1. garante conexão (bloqueante) e processa o tráfego do canal;
//! 2. lê uma amostra e o nível do botão e roda os dois classificadores;
//! 3. no máximo um alerta: pânico tem prioridade sobre queda;
//! 4. dorme o período de amostragem.
//!
//! O cooldown do alerta e o período do tick se somam.

use crate::config::{DEFAULT_SAMPLE_PERIOD_MS, DEFAULT_TONE_DURATION_MS, DEFAULT_TONE_FREQUENCY_HZ};
use crate::detector::{Debouncer, FallClassifier};
use crate::dispatcher::AlertDispatcher;
use crate::ports::{Channel, Clock, Feedback, SignalSource};
use crate::types::SafetyEvent;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Temporização e feedback do loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub sample_period: Duration,
    pub tone_frequency_hz: u32,
    pub tone_duration: Duration,
    /// 0 = sem resumo periódico
    pub stats_every_ticks: u64,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(DEFAULT_SAMPLE_PERIOD_MS),
            tone_frequency_hz: DEFAULT_TONE_FREQUENCY_HZ,
            tone_duration: Duration::from_millis(DEFAULT_TONE_DURATION_MS),
            stats_every_ticks: 0,
        }
    }
}

/// Contadores do loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub panic_alerts: u64,
    pub fall_alerts: u64,
    pub publish_failures: u64,
}

pub struct EventLoop<S, F, C, K>
where
    S: SignalSource,
    F: Feedback,
    C: Channel,
    K: Clock,
{
    source: S,
    feedback: F,
    debouncer: Debouncer,
    classifier: FallClassifier,
    dispatcher: AlertDispatcher<C, K>,
    clock: K,
    settings: LoopSettings,
    stats: LoopStats,
}

impl<S, F, C, K> EventLoop<S, F, C, K>
where
    S: SignalSource,
    F: Feedback,
    C: Channel,
    K: Clock,
{
    pub fn new(
        source: S,
        feedback: F,
        classifier: FallClassifier,
        dispatcher: AlertDispatcher<C, K>,
        clock: K,
        settings: LoopSettings,
    ) -> Self {
        Self {
            source,
            feedback,
            debouncer: Debouncer::new(),
            classifier,
            dispatcher,
            clock,
            settings,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn dispatcher(&self) -> &AlertDispatcher<C, K> {
        &self.dispatcher
    }

    /// Executa um tick completo. Retorna o evento despachado, se houve.
    pub fn tick(&mut self) -> Option<SafetyEvent> {
        // ── Conectividade ──
        if !self.dispatcher.is_connected() {
            self.dispatcher.ensure_connected();
        }
        self.dispatcher.service();

        // ── Amostragem ──
        let sample = self.source.read_acceleration();
        let raw_level = self.source.read_control_level();
        debug!(
            "Aceleração: X={:.2} Y={:.2} Z={:.2} | Magnitude={:.2} m/s²",
            sample.x,
            sample.y,
            sample.z,
            sample.magnitude()
        );

        let panic = self.debouncer.update(raw_level);
        let fall = self.classifier.classify(&sample);

        // ── Decisão ──
        let event = if panic {
            Some(SafetyEvent::Panic)
        } else if fall {
            Some(SafetyEvent::Fall)
        } else {
            None
        };

        if let Some(event) = event {
            self.alert(event);
        }

        self.stats.ticks += 1;
        self.log_stats();

        self.clock.sleep(self.settings.sample_period);
        event
    }

    fn alert(&mut self, event: SafetyEvent) {
        self.feedback
            .emit_tone(self.settings.tone_frequency_hz, self.settings.tone_duration);

        match event {
            SafetyEvent::Panic => self.stats.panic_alerts += 1,
            SafetyEvent::Fall => self.stats.fall_alerts += 1,
        }

        if let Err(e) = self.dispatcher.dispatch(event) {
            self.stats.publish_failures += 1;
            warn!("{} não enviado: {e}", event.log_label());
        }
    }

    fn log_stats(&self) {
        let every = self.settings.stats_every_ticks;
        if every == 0 || self.stats.ticks % every != 0 {
            return;
        }
        let link = self.dispatcher.stats();
        info!(
            "Ticks {} | Pânico {} | Queda {} | Falhas de envio {} | Reconexões {}/{}",
            self.stats.ticks,
            self.stats.panic_alerts,
            self.stats.fall_alerts,
            self.stats.publish_failures,
            link.connect_failures,
            link.connect_attempts
        );
    }

    /// Roda para sempre.
    pub fn run(&mut self) -> ! {
        info!("Loop iniciado ({} ms por amostra)", self.settings.sample_period.as_millis());
        loop {
            self.tick();
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
