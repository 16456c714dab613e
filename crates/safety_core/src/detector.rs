//! Classificadores do fluxo de amostras: borda do botão de pânico e
//! limiar de magnitude para queda.

use crate::types::{ControlLevel, Sample};

/// Limiar de queda (m/s²), ~2.5 G.
pub const FALL_THRESHOLD_MS2: f32 = 25.0;

/// Detector de borda de descida do botão.
///
/// Não há janela de debounce além do próprio período do tick: um repique
/// mecânico mais rápido que um tick não é filtrado.
#[derive(Debug, Clone)]
pub struct Debouncer {
    previous: ControlLevel,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self {
            previous: ControlLevel::Released,
        }
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recebe o nível bruto do pino (`true` = alto) e retorna `true` apenas
    /// no tick em que o botão passa de solto para pressionado.
    pub fn update(&mut self, raw_level: bool) -> bool {
        let current = ControlLevel::from_raw(raw_level);
        let edge = current == ControlLevel::Pressed && self.previous == ControlLevel::Released;
        self.previous = current;
        edge
    }

    pub fn previous(&self) -> ControlLevel {
        self.previous
    }
}

/// Classificador de queda por magnitude instantânea.
///
/// Uma única amostra acima do limiar basta; sem janela temporal nem
/// compensação de orientação.
#[derive(Debug, Clone, Copy)]
pub struct FallClassifier {
    threshold: f32,
}

impl Default for FallClassifier {
    fn default() -> Self {
        Self::new(FALL_THRESHOLD_MS2)
    }
}

impl FallClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// `true` sse a magnitude for estritamente maior que o limiar.
    pub fn classify(&self, sample: &Sample) -> bool {
        sample.magnitude() > self.threshold
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
