//! Fonte de sinais a partir de amostras gravadas.
//!
//! Uma linha por tick: `x y z nivel` (m/s² e nível bruto do botão,
//! `1` = alto/solto, `0` = baixo/pressionado). Linhas vazias e
//! comentários `#` são ignorados. Ao fim da entrada o dispositivo fica
//! parado com o botão solto.

use safety_core::ports::SignalSource;
use safety_core::types::Sample;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::{info, warn};

/// Falha ao abrir a fonte (equivalente a sensor não encontrado no boot).
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Não foi possível abrir {path}: {source}")]
    Open { path: String, source: io::Error },
}

pub struct ReplaySource {
    reader: Box<dyn BufRead>,
    level: bool,
    line_no: usize,
    exhausted: bool,
}

impl ReplaySource {
    /// Abre um arquivo de amostras; caminho vazio = stdin.
    pub fn open(path: &str) -> Result<Self, ReplayError> {
        if path.is_empty() {
            info!("Lendo amostras de stdin");
            return Ok(Self::from_reader(BufReader::new(io::stdin())));
        }

        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_string(),
            source,
        })?;
        info!("Lendo amostras de {path}");
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            level: true,
            line_no: 0,
            exhausted: false,
        }
    }

    fn next_step(&mut self) -> Option<(Sample, bool)> {
        let mut line = String::new();
        while !self.exhausted {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    info!("Fim das amostras após {} linhas; dispositivo em repouso", self.line_no);
                    self.exhausted = true;
                }
                Ok(_) => {
                    self.line_no += 1;
                    match parse_line(&line) {
                        Ok(Some(step)) => return Some(step),
                        Ok(None) => {}
                        Err(e) => warn!("Linha {} ignorada: {e}", self.line_no),
                    }
                }
                Err(e) => {
                    warn!("Erro ao ler amostras: {e}");
                    self.exhausted = true;
                }
            }
        }
        None
    }
}

impl SignalSource for ReplaySource {
    fn read_acceleration(&mut self) -> Sample {
        match self.next_step() {
            Some((sample, level)) => {
                self.level = level;
                sample
            }
            None => {
                self.level = true;
                Sample::at_rest()
            }
        }
    }

    fn read_control_level(&mut self) -> bool {
        self.level
    }
}

fn parse_line(line: &str) -> Result<Option<(Sample, bool)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [x, y, z, level] = fields.as_slice() else {
        return Err(format!("esperado 4 campos, encontrado {}", fields.len()));
    };

    let axis = |s: &str| {
        s.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("eixo inválido: {s:?}"))
    };
    let level = match *level {
        "1" => true,
        "0" => false,
        other => return Err(format!("nível inválido: {other:?}")),
    };

    Ok(Some((Sample::new(axis(*x)?, axis(*y)?, axis(*z)?), level)))
}
