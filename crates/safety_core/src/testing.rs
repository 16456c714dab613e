//! Dublês dos ports para os testes do núcleo.
//!
//! Cada dublê é um handle clonável sobre estado compartilhado: o teste
//! guarda um clone e entrega o outro ao componente.

use crate::ports::{Channel, Clock, ConnectError, Feedback, PublishError, SignalSource};
use crate::types::Sample;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

// ──────────────────────────────────────────────
// Relógio
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    sleeps: Rc<RefCell<Vec<Duration>>>,
}

impl FakeClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn count(&self, duration: Duration) -> usize {
        self.sleeps.borrow().iter().filter(|d| **d == duration).count()
    }

    pub fn clear(&self) {
        self.sleeps.borrow_mut().clear();
    }
}

impl Clock for FakeClock {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

// ──────────────────────────────────────────────
// Canal
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ChannelLog {
    pub connected: bool,
    pub connect_script: VecDeque<Result<(), ConnectError>>,
    pub publish_script: VecDeque<Result<(), PublishError>>,
    pub connect_calls: Vec<String>,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub published_while_disconnected: usize,
    pub service_calls: usize,
    /// Quantos `subscribe` ainda derrubam o link
    pub drops_on_subscribe: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedChannel {
    log: Rc<RefCell<ChannelLog>>,
}

impl ScriptedChannel {
    pub fn connected() -> Self {
        let channel = Self::default();
        channel.log.borrow_mut().connected = true;
        channel
    }

    /// Falha `failures` vezes antes de aceitar a conexão.
    pub fn failing(failures: usize) -> Self {
        let channel = Self::default();
        channel.script_connect_failures(failures);
        channel
    }

    pub fn script_connect_failures(&self, failures: usize) {
        let mut log = self.log.borrow_mut();
        for i in 0..failures {
            log.connect_script
                .push_back(Err(ConnectError::new(format!("rc=-2 (tentativa {})", i + 1))));
        }
    }

    pub fn script_drop_on_subscribe(&self, times: usize) {
        self.log.borrow_mut().drops_on_subscribe += times;
    }

    pub fn script_publish_failure(&self) {
        self.log
            .borrow_mut()
            .publish_script
            .push_back(Err(PublishError::new("buffer cheio")));
    }

    pub fn drop_connection(&self) {
        self.log.borrow_mut().connected = false;
    }

    pub fn log(&self) -> std::cell::Ref<'_, ChannelLog> {
        self.log.borrow()
    }

    pub fn payloads_on(&self, topic: &str) -> Vec<String> {
        self.log
            .borrow()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl Channel for ScriptedChannel {
    fn is_connected(&self) -> bool {
        self.log.borrow().connected
    }

    fn connect(&mut self, client_id: &str) -> Result<(), ConnectError> {
        let mut log = self.log.borrow_mut();
        log.connect_calls.push(client_id.to_string());
        let outcome = log.connect_script.pop_front().unwrap_or(Ok(()));
        log.connected = outcome.is_ok();
        outcome
    }

    fn service(&mut self) {
        self.log.borrow_mut().service_calls += 1;
    }

    fn subscribe(&mut self, topic: &str) {
        let mut log = self.log.borrow_mut();
        log.subscriptions.push(topic.to_string());
        if log.drops_on_subscribe > 0 {
            log.drops_on_subscribe -= 1;
            log.connected = false;
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let mut log = self.log.borrow_mut();
        if !log.connected {
            log.published_while_disconnected += 1;
        }
        let outcome = log.publish_script.pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            log.published.push((topic.to_string(), payload.to_vec()));
        }
        outcome
    }
}

// ──────────────────────────────────────────────
// Sensores
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SourceLog {
    pub pending: VecDeque<(Sample, bool)>,
    pub reads: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    log: Rc<RefCell<SourceLog>>,
}

impl ScriptedSource {
    /// Amostras `(magnitude no eixo Z, nível bruto do botão)`.
    pub fn from_steps(steps: &[(f32, bool)]) -> Self {
        let source = Self::default();
        source.log.borrow_mut().pending = steps
            .iter()
            .map(|&(z, level)| (Sample::new(0.0, 0.0, z), level))
            .collect();
        source
    }

    pub fn reads(&self) -> usize {
        self.log.borrow().reads
    }

    pub fn push(&self, sample: Sample, level: bool) {
        self.log.borrow_mut().pending.push_back((sample, level));
    }

    fn current(&self) -> (Sample, bool) {
        self.log
            .borrow()
            .pending
            .front()
            .copied()
            .unwrap_or((Sample::at_rest(), true))
    }
}

impl SignalSource for ScriptedSource {
    fn read_acceleration(&mut self) -> Sample {
        self.current().0
    }

    /// Consome o passo atual: o loop lê aceleração e depois o botão.
    fn read_control_level(&mut self) -> bool {
        let level = self.current().1;
        let mut log = self.log.borrow_mut();
        log.pending.pop_front();
        log.reads += 1;
        level
    }
}

// ──────────────────────────────────────────────
// Buzzer
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingBuzzer {
    tones: Rc<RefCell<Vec<(u32, Duration)>>>,
}

impl RecordingBuzzer {
    pub fn tones(&self) -> Vec<(u32, Duration)> {
        self.tones.borrow().clone()
    }
}

impl Feedback for RecordingBuzzer {
    fn emit_tone(&mut self, frequency_hz: u32, duration: Duration) {
        self.tones.borrow_mut().push((frequency_hz, duration));
    }
}
