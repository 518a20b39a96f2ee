use std::{
    collections::HashMap,
    io::{Cursor, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    thread,
};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{
    codec::{IdSizes, JdwpReadable, JdwpReader, JdwpWritable, JdwpWriter},
    commands::{event::Composite, virtual_machine::IDSizes as IDSizesCmd, Command},
    enums::ErrorCode,
    Flags, PacketHeader, PacketMeta,
};

const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// Errors that can occur while talking to a target VM over a [`JdwpClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("io error talking to the target VM: {0}")]
    Io(#[from] std::io::Error),
    #[error("handshake with the target VM failed")]
    Handshake,
    #[error("target VM replied with an error: {0}")]
    Jdwp(ErrorCode),
    #[error("the connection's reader thread has shut down")]
    Disconnected,
}

struct RawReply {
    error: ErrorCode,
    body: Vec<u8>,
}

struct Shared {
    write_stream: Mutex<TcpStream>,
    last_id: AtomicU32,
    id_sizes: Mutex<IdSizes>,
    pending: Mutex<HashMap<u32, Sender<RawReply>>>,
}

/// A connection to a single target VM.
///
/// Writes are serialized through an internal mutex; a background thread owns
/// the read half of the socket and demultiplexes incoming packets: replies
/// are routed back to whichever [`send`](Self::send) call is waiting on that
/// request id, and `Composite` event packets (the target VM is free to push
/// these at any time, not just in response to a command) are pushed onto an
/// unbounded channel drained by [`receive_events`](Self::receive_events) —
/// this is what backs the event pump (§4.6 of the debug engine built on top).
pub struct JdwpClient {
    shared: Arc<Shared>,
    events_rx: Receiver<Composite>,
    reader: Option<thread::JoinHandle<()>>,
}

impl JdwpClient {
    /// Connects to a target VM, performs the handshake and negotiates id sizes.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<JdwpClient, ClientError> {
        let client = Self::attach(addr)?;
        let sizes = client.send(IDSizesCmd)?;
        *client.shared.id_sizes.lock().unwrap() = IdSizes {
            field_id_size: sizes.field_id_size as u8,
            method_id_size: sizes.method_id_size as u8,
            object_id_size: sizes.object_id_size as u8,
            reference_type_id_size: sizes.reference_type_id_size as u8,
            frame_id_size: sizes.frame_id_size as u8,
        };
        Ok(client)
    }

    /// Performs only the handshake, leaving [`IdSizes`] at the default of 8
    /// bytes everywhere. Most callers want [`connect`](Self::connect) instead,
    /// since every VM in the wild reports its real sizes via `IDSizes` right
    /// after, and decoding anything before that (including a `VMStart` event
    /// the target VM may push unprompted right after the handshake) uses the
    /// default anyway.
    pub fn attach<A: ToSocketAddrs>(addr: A) -> Result<JdwpClient, ClientError> {
        let mut stream = TcpStream::connect(addr)?;
        let mut handshake = *HANDSHAKE;
        stream.write_all(&handshake)?;
        stream.read_exact(&mut handshake)?;
        if &handshake != HANDSHAKE {
            return Err(ClientError::Handshake);
        }

        let read_stream = stream.try_clone()?;
        let shared = Arc::new(Shared {
            write_stream: Mutex::new(stream),
            last_id: AtomicU32::new(0),
            id_sizes: Mutex::new(IdSizes::default()),
            pending: Mutex::new(HashMap::new()),
        });

        let (events_tx, events_rx) = unbounded();
        let reader_shared = shared.clone();
        let reader = thread::spawn(move || read_loop(read_stream, reader_shared, events_tx));

        Ok(JdwpClient {
            shared,
            events_rx,
            reader: Some(reader),
        })
    }

    pub fn id_sizes(&self) -> IdSizes {
        *self.shared.id_sizes.lock().unwrap()
    }

    pub fn send<C: Command>(&self, command: C) -> Result<C::Output, ClientError> {
        let id = self.shared.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id_sizes = self.id_sizes();

        let mut data = Vec::new();
        command.write(&mut JdwpWriter::new(&mut data, id_sizes))?;

        let (tx, rx) = unbounded();
        self.shared.pending.lock().unwrap().insert(id, tx);

        {
            let mut stream = self.shared.write_stream.lock().unwrap();
            let header = PacketHeader {
                length: 11 + data.len() as u32,
                id,
                flags: Flags::Command,
                meta: PacketMeta::Command(C::ID),
            };
            header.write(&mut JdwpWriter::new(&mut *stream, id_sizes))?;
            stream.write_all(&data)?;
        }

        let reply = rx.recv().map_err(|_| ClientError::Disconnected)?;
        if !matches!(reply.error, ErrorCode::None) {
            return Err(ClientError::Jdwp(reply.error));
        }
        let mut cursor = JdwpReader::new(Cursor::new(reply.body), id_sizes);
        Ok(C::Output::read(&mut cursor)?)
    }

    /// Drains any `Composite` event packets that have arrived so far. Never
    /// blocks; the event pump is expected to call this in its own loop and
    /// sleep/park between calls if it comes back empty.
    pub fn receive_events(&self) -> Vec<Composite> {
        self.events_rx.try_iter().collect()
    }

    /// Blocks until at least one `Composite` is available, or the connection
    /// is torn down.
    pub fn recv_event(&self) -> Option<Composite> {
        self.events_rx.recv().ok()
    }

    /// Like [`recv_event`](Self::recv_event), but gives up after `timeout`.
    /// Used by one-shot startup waits that must not hang forever (e.g. the
    /// worker bootstrap).
    pub fn recv_event_timeout(&self, timeout: std::time::Duration) -> Option<Composite> {
        self.events_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for JdwpClient {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            // Closing the write half unblocks the reader's next `read_exact`.
            if let Ok(stream) = self.shared.write_stream.lock() {
                let _ = stream.shutdown(std::net::Shutdown::Both);
            }
            let _ = reader.join();
        }
    }
}

fn read_loop(mut stream: TcpStream, shared: Arc<Shared>, events_tx: Sender<Composite>) {
    loop {
        let header = {
            let id_sizes = *shared.id_sizes.lock().unwrap();
            let mut reader = JdwpReader::new(&mut stream, id_sizes);
            match PacketHeader::read(&mut reader) {
                Ok(header) => header,
                Err(err) => {
                    log::debug!("jdwp reader thread exiting: {err}");
                    return;
                }
            }
        };

        let len = match (header.length as usize).checked_sub(11) {
            Some(len) => len,
            None => {
                log::warn!("dropping malformed packet with length {}", header.length);
                continue;
            }
        };
        let mut body = vec![0; len];
        if let Err(err) = stream.read_exact(&mut body) {
            log::debug!("jdwp reader thread exiting: {err}");
            return;
        }

        match header.meta {
            PacketMeta::Command(cmd_id) if cmd_id == Composite::ID => {
                let id_sizes = *shared.id_sizes.lock().unwrap();
                let mut reader = JdwpReader::new(Cursor::new(body), id_sizes);
                match Composite::read(&mut reader) {
                    Ok(composite) => {
                        if events_tx.send(composite).is_err() {
                            return; // no one is listening anymore
                        }
                    }
                    Err(err) => log::warn!("failed to decode composite event: {err}"),
                }
            }
            PacketMeta::Command(cmd_id) => {
                log::warn!("dropping unsolicited command packet {cmd_id:?}");
            }
            PacketMeta::Reply(error) => {
                let sender = shared.pending.lock().unwrap().remove(&header.id);
                match sender {
                    Some(sender) => {
                        let _ = sender.send(RawReply { error, body });
                    }
                    None => log::warn!("dropping reply for unknown request id {}", header.id),
                }
            }
        }
    }
}
