//! Canal pub/sub sobre TCP para o gateway local.
//!
//! Protocolo em linhas de texto:
//!
//! ```text
//! → HELLO <client_id>
//! ← OK
//! → SUB <topic>
//! → PUB <topic> <payload>
//! → PING
//! ← PONG
//! ← MSG <topic> <payload>
//! ```
//!
//! Só há conexão depois do `OK` do gateway. Mensagens `MSG` recebidas são
//! apenas registradas: não há consumidor de comandos remotos.

use safety_core::config::BrokerConfig;
use safety_core::ports::{Channel, ConnectError, PublishError};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 512;
const HANDSHAKE_ACK: &str = "OK";
const MAX_HANDSHAKE_LINE: usize = 256;

pub struct TcpChannel {
    addr: String,
    connect_timeout: Duration,
    keepalive: Duration,
    stream: Option<TcpStream>,
    inbound: Vec<u8>,
    last_ping: Instant,
}

impl TcpChannel {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            addr: format!("{}:{}", config.host, config.port),
            connect_timeout: Duration::from_secs_f64(config.connect_timeout_secs),
            keepalive: Duration::from_secs_f64(config.keepalive_secs),
            stream: None,
            inbound: Vec::new(),
            last_ping: Instant::now(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn open(&self, client_id: &str) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in self.addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return self.handshake(stream, client_id),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(ErrorKind::AddrNotAvailable, "nenhum endereço resolvido")
        }))
    }

    /// Envia `HELLO` e espera o `OK` do gateway. O socket fica em modo
    /// bloqueante com timeout de escrita; só a drenagem é não bloqueante.
    fn handshake(&self, mut stream: TcpStream, client_id: &str) -> io::Result<TcpStream> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.connect_timeout))?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        writeln!(stream, "HELLO {client_id}")?;

        let reply = read_handshake_line(&mut stream)?;
        if reply != HANDSHAKE_ACK {
            return Err(io::Error::new(
                ErrorKind::ConnectionRefused,
                format!("handshake recusado: {reply:?}"),
            ));
        }

        stream.set_read_timeout(None)?;
        Ok(stream)
    }

    fn send_line(&mut self, line: &str) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(ErrorKind::NotConnected, "canal desconectado"));
        };
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        let result = stream.write_all(&frame);
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            warn!("Conexão com {} encerrada", self.addr);
        }
        self.inbound.clear();
    }

    fn drain_inbound(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        if let Err(e) = stream.set_nonblocking(true) {
            warn!("Erro ao configurar socket: {e}");
            self.disconnect();
            return;
        }

        let mut buf = [0u8; READ_CHUNK];
        let mut closed = loop {
            match stream.read(&mut buf) {
                Ok(0) => break true,
                Ok(n) => self.inbound.extend_from_slice(&buf[..n]),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break false,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Erro ao ler do gateway: {e}");
                    break true;
                }
            }
        };
        if !closed && stream.set_nonblocking(false).is_err() {
            closed = true;
        }

        while let Some(pos) = self.inbound.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.inbound.drain(..=pos).collect();
            handle_line(String::from_utf8_lossy(&line).trim_end());
        }

        if closed {
            self.disconnect();
        }
    }
}

/// Lê uma linha byte a byte para não consumir nada além do handshake.
fn read_handshake_line(stream: &mut TcpStream) -> io::Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "gateway fechou a conexão no handshake",
                ));
            }
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => {
                line.push(byte[0]);
                if line.len() > MAX_HANDSHAKE_LINE {
                    return Err(io::Error::new(
                        ErrorKind::InvalidData,
                        "resposta de handshake longa demais",
                    ));
                }
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(String::from_utf8_lossy(&line).trim_end().to_string())
}

fn handle_line(line: &str) {
    match line.split_once(' ') {
        Some(("MSG", rest)) => {
            let (topic, payload) = rest.split_once(' ').unwrap_or((rest, ""));
            debug!("Comando em {topic} ignorado: {payload}");
        }
        _ if line == "PONG" => {}
        _ => debug!("Linha desconhecida do gateway: {line:?}"),
    }
}

impl Channel for TcpChannel {
    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self, client_id: &str) -> Result<(), ConnectError> {
        self.disconnect();
        let stream = self
            .open(client_id)
            .map_err(|e| ConnectError::new(format!("{} ({e})", self.addr)))?;
        info!("Gateway {} conectado", self.addr);
        self.stream = Some(stream);
        self.last_ping = Instant::now();
        Ok(())
    }

    fn service(&mut self) {
        if self.stream.is_none() {
            return;
        }
        if self.last_ping.elapsed() >= self.keepalive {
            self.last_ping = Instant::now();
            if let Err(e) = self.send_line("PING") {
                warn!("Keepalive falhou: {e}");
                return;
            }
        }
        self.drain_inbound();
    }

    fn subscribe(&mut self, topic: &str) {
        if let Err(e) = self.send_line(&format!("SUB {topic}")) {
            warn!("Falha ao assinar {topic}: {e}");
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let payload = std::str::from_utf8(payload)
            .map_err(|e| PublishError::new(format!("payload não é UTF-8: {e}")))?;
        if payload.contains('\n') {
            return Err(PublishError::new("payload com quebra de linha"));
        }
        self.send_line(&format!("PUB {topic} {payload}"))
            .map_err(|e| PublishError::new(e.to_string()))
    }
}
