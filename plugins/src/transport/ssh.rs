//! libssh2-backed transport. All libssh2 calls are blocking and run on the
//! blocking pool; channels on one session share its lock.

use std::io::Read;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;
use sshprobe_core::api::{
    CommandOutput, ConnectionDescriptor, ConnectionError, RemoteSession, RemoteTransport,
    TransportError,
};
use sshprobe_core::types::MAX_COMMAND_TIMEOUT_SECS;

pub struct Ssh2Transport {
    connect_timeout: Duration,
}

impl Ssh2Transport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl RemoteTransport for Ssh2Transport {
    fn name(&self) -> &str {
        "ssh2"
    }

    fn open_session(&self) -> Box<dyn RemoteSession> {
        Box::new(Ssh2Session {
            connect_timeout: self.connect_timeout,
            session: None,
            addr: String::new(),
        })
    }
}

pub struct Ssh2Session {
    connect_timeout: Duration,
    session: Option<Arc<Session>>,
    addr: String,
}

#[async_trait]
impl RemoteSession for Ssh2Session {
    async fn connect(&mut self, connection: &ConnectionDescriptor) -> Result<(), ConnectionError> {
        let conn = connection.clone();
        let timeout = self.connect_timeout;
        let session = tokio::task::spawn_blocking(move || open(&conn, timeout))
            .await
            .map_err(|e| ConnectionError::Join(e.to_string()))??;

        self.addr = connection.addr();
        self.session = Some(Arc::new(session));
        tracing::debug!(
            target: "sshprobe.ssh",
            addr = %self.addr,
            user = %connection.username,
            "session established"
        );
        Ok(())
    }

    // libssh2 timeouts are session-wide; per-command limits are enforced by
    // the executor.
    async fn exec(&self, command: &str, _timeout: Duration) -> Result<CommandOutput, TransportError> {
        let session = self.session.clone().ok_or(TransportError::NotConnected)?;
        let command = command.to_string();
        tokio::task::spawn_blocking(move || run(&session, &command))
            .await
            .map_err(|e| TransportError::Join(e.to_string()))?
    }

    async fn dispose(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let addr = std::mem::take(&mut self.addr);
        let closed = tokio::task::spawn_blocking(move || {
            session.disconnect(None, "sshprobe session closed", None)
        })
        .await;
        match closed {
            Ok(Ok(())) => tracing::debug!(target: "sshprobe.ssh", addr = %addr, "session closed"),
            Ok(Err(e)) => tracing::debug!(
                target: "sshprobe.ssh",
                addr = %addr,
                error = %e,
                "disconnect failed"
            ),
            Err(e) => tracing::warn!(
                target: "sshprobe.ssh",
                addr = %addr,
                error = %e,
                "disconnect task failed"
            ),
        }
    }
}

fn resolve(conn: &ConnectionDescriptor) -> Result<SocketAddr, ConnectionError> {
    let tcp_err = |message: String| ConnectionError::Tcp {
        addr: conn.addr(),
        message,
    };
    (conn.host.as_str(), conn.port)
        .to_socket_addrs()
        .map_err(|e| tcp_err(e.to_string()))?
        .next()
        .ok_or_else(|| tcp_err("host resolved to no addresses".into()))
}

fn key_path(raw: &std::path::Path) -> PathBuf {
    let text = raw.to_string_lossy();
    PathBuf::from(shellexpand::tilde(text.as_ref()).into_owned())
}

fn open(conn: &ConnectionDescriptor, timeout: Duration) -> Result<Session, ConnectionError> {
    let addr = resolve(conn)?;
    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| ConnectionError::Tcp {
        addr: conn.addr(),
        message: e.to_string(),
    })?;

    let mut session = Session::new().map_err(|e| ConnectionError::Handshake(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(MAX_COMMAND_TIMEOUT_SECS * 1000);
    session
        .handshake()
        .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

    let auth_err = |message: String| ConnectionError::Auth {
        username: conn.username.clone(),
        message,
    };
    match (&conn.password, &conn.key_file) {
        (Some(password), _) if !password.is_empty() => session
            .userauth_password(&conn.username, password)
            .map_err(|e| auth_err(e.to_string()))?,
        (_, Some(key)) => session
            .userauth_pubkey_file(&conn.username, None, &key_path(key), None)
            .map_err(|e| auth_err(e.to_string()))?,
        _ => return Err(auth_err("no credential supplied".into())),
    }
    if !session.authenticated() {
        return Err(auth_err("server did not accept the credential".into()));
    }
    Ok(session)
}

fn run(session: &Session, command: &str) -> Result<CommandOutput, TransportError> {
    let channel_err = |e: ssh2::Error| TransportError::Channel(e.to_string());
    let io_err = |e: std::io::Error| TransportError::Channel(e.to_string());

    let mut channel = session.channel_session().map_err(channel_err)?;
    channel.exec(command).map_err(channel_err)?;

    let mut stdout = Vec::new();
    channel.read_to_end(&mut stdout).map_err(io_err)?;
    let mut stderr = Vec::new();
    channel.stderr().read_to_end(&mut stderr).map_err(io_err)?;
    channel.wait_close().map_err(channel_err)?;

    Ok(CommandOutput {
        exit_code: channel.exit_status().ok(),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}
