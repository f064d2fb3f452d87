#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// In-process server speaking the SET/GET/DEL line protocol over a `HashMap`.
///
/// Values are stored exactly as they appear on the wire, so an empty value is
/// kept as `""` and echoed back as `VALUE ""`.
pub struct TestServer {
    addr: SocketAddr,
    store: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start() -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let store = Arc::new(Mutex::new(HashMap::new()));
        let commands = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let server = TestServer {
            addr,
            store: store.clone(),
            commands: commands.clone(),
            connections: connections.clone(),
        };

        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => continue,
                };
                connections.fetch_add(1, Ordering::SeqCst);
                let store = store.clone();
                let commands = commands.clone();
                thread::spawn(move || handle_connection(stream, store, commands));
            }
        });

        server
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command line received so far, without CRLF.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Number of accepted TCP connections.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn handle_connection(
    stream: TcpStream,
    store: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<Mutex<Vec<String>>>,
) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut writer = stream;
    while let Some(line) = read_line(&mut reader) {
        commands.lock().unwrap().push(line.clone());
        let response = execute(&line, &store);
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
        let _ = writer.write_all(b"\r\n");
        let _ = writer.flush();
    }
}

fn execute(line: &str, store: &Mutex<HashMap<String, String>>) -> String {
    let mut parts = line.splitn(3, ' ');
    let verb = parts.next().unwrap_or_default();
    let key = parts.next();
    let value = parts.next();
    let mut store = store.lock().unwrap();
    match (verb, key, value) {
        ("SET", Some(key), Some(value)) => {
            store.insert(key.to_owned(), value.to_owned());
            "OK".to_owned()
        }
        ("GET", Some(key), None) => match store.get(key) {
            Some(value) => format!("VALUE {}", value),
            None => "NOT_FOUND".to_owned(),
        },
        ("DEL", Some(key), None) => {
            store.remove(key);
            "OK".to_owned()
        }
        ("PING", None, None) => "PONG".to_owned(),
        _ => format!("ERROR Unknown command: {}", line),
    }
}

/// Reads one CRLF-terminated line, `None` on EOF or a read error.
fn read_line(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            if buf.ends_with(b"\r\n") {
                buf.truncate(buf.len() - 2);
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

/// What a scripted server does after reading one command line.
pub enum Step {
    /// Write these bytes verbatim; include the CRLF yourself.
    Reply(&'static [u8]),
    /// Write the first part, pause, then write the second part.
    Split(&'static [u8], &'static [u8]),
    /// Read the command but write nothing back.
    Silent,
    /// Close the connection without replying.
    Close,
}

/// Starts a server that plays one script per accepted connection.
///
/// Returns the address and a handle to all command lines received, in order.
pub fn scripted(scripts: Vec<Vec<Step>>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    thread::spawn(move || {
        for script in scripts {
            let (stream, _) = match listener.accept() {
                Ok(pair) => pair,
                Err(_) => return,
            };
            play(stream, script, &log);
        }
    });

    (addr, received)
}

fn play(stream: TcpStream, script: Vec<Step>, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut writer = stream;
    for step in script {
        let line = match read_line(&mut reader) {
            Some(line) => line,
            None => return,
        };
        log.lock().unwrap().push(line);
        match step {
            Step::Reply(bytes) => {
                let _ = writer.write_all(bytes);
                let _ = writer.flush();
            }
            Step::Split(first, second) => {
                let _ = writer.write_all(first);
                let _ = writer.flush();
                thread::sleep(Duration::from_millis(50));
                let _ = writer.write_all(second);
                let _ = writer.flush();
            }
            Step::Silent => {}
            Step::Close => return,
        }
    }
    // Hold the connection until the client hangs up.
    while read_line(&mut reader).is_some() {}
}

/// Starts a server that accepts connections but never reads from them.
///
/// The accepted sockets are kept open so the client's writes eventually
/// block once the socket buffers fill up.
pub fn never_reading() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    addr
}

/// An address on which nothing is listening.
pub fn closed_port_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr")
}
