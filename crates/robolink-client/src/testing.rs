//! In-memory streams and dialers for unit tests.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use robolink_frame::encode;
use robolink_transport::{AgvStream, Dialer, Endpoint};

/// A stream whose clones share the same buffers.
#[derive(Clone, Default)]
pub(crate) struct ScriptedStream {
    inbound: Arc<Mutex<VecDeque<u8>>>,
    outbound: Arc<Mutex<Vec<u8>>>,
    read_error: Arc<Mutex<Option<ErrorKind>>>,
    fail_writes: bool,
    shut_down: Arc<AtomicBool>,
}

impl ScriptedStream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn push_inbound(&self, bytes: &[u8]) {
        self.inbound.lock().unwrap().extend(bytes.iter().copied());
    }

    pub(crate) fn fail_next_read(&self, kind: ErrorKind) {
        *self.read_error.lock().unwrap() = Some(kind);
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.outbound.lock().unwrap().clone()
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(kind) = self.read_error.lock().unwrap().take() {
            return Err(io::Error::from(kind));
        }
        let mut inbound = self.inbound.lock().unwrap();
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::from(ErrorKind::BrokenPipe));
        }
        self.outbound.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AgvStream for ScriptedStream {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Self> {
        Ok(self.clone())
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out scripted dial results in order, then refuses.
#[derive(Clone)]
pub(crate) struct ScriptedDialer {
    results: Arc<Mutex<VecDeque<Result<ScriptedStream, ErrorKind>>>>,
    dials: Arc<AtomicUsize>,
}

impl ScriptedDialer {
    pub(crate) fn new(results: Vec<Result<ScriptedStream, ErrorKind>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results.into())),
            dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

impl Dialer for ScriptedDialer {
    type Stream = ScriptedStream;

    fn dial(&mut self, _endpoint: &Endpoint, _timeout: Option<Duration>) -> io::Result<ScriptedStream> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        match self.results.lock().unwrap().pop_front() {
            Some(Ok(stream)) => Ok(stream),
            Some(Err(kind)) => Err(io::Error::from(kind)),
            None => Err(io::Error::from(ErrorKind::ConnectionRefused)),
        }
    }
}

/// Encode a reply frame the way the controller sends it.
pub(crate) fn reply_frame(message_type: u16, json: &str) -> Vec<u8> {
    encode(0, message_type, Some(json.as_bytes())).unwrap().to_vec()
}
