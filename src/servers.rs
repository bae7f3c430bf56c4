//! External tool-server processes.
//!
//! Servers are launched as child processes speaking over stdio.  The chat
//! core only stores the resulting [`ServerHandle`]s; it never talks to them.
//!
//! Every connection is acquired through a [`ConnectionStack`], which releases
//! connections in the reverse of the order they were acquired.  Release
//! happens on [`ConnectionStack::close`] for the orderly path and in `Drop`
//! for early returns, errors and cancellation.

use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::observability::{SERVER_LAUNCH_ERRORS, SERVERS_CLOSED, SERVERS_LAUNCHED};

/// How long a server gets to exit after its stdin is closed before it is killed.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Identifier under which the document server is registered.
pub const DOCUMENT_SERVER_ID: &str = "doc_client";

/// Script run by the document server.
pub const DOCUMENT_SERVER_SCRIPT: &str = "mcp_server.py";

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    /// Program to run.
    pub command: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl ServerCommand {
    /// Creates a command.
    pub fn new(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The document server: `uv run mcp_server.py` when `use_uv`, otherwise
    /// `python mcp_server.py`.
    pub fn document_server(use_uv: bool) -> Self {
        if use_uv {
            Self::new("uv", ["run", DOCUMENT_SERVER_SCRIPT])
        } else {
            Self::new("python", [DOCUMENT_SERVER_SCRIPT])
        }
    }

    /// An extra server script, always run through `uv run`.
    pub fn script(path: impl Into<String>) -> Self {
        Self::new("uv", ["run".to_string(), path.into()])
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Identifier for the `index`th extra server script.
pub fn script_server_id(index: usize, script: &str) -> String {
    format!("client_{index}_{script}")
}

/// A launched server process.
#[derive(Debug)]
pub struct ServerConnection {
    id: String,
    command: ServerCommand,
    child: Mutex<Option<Child>>,
}

/// Shared, opaque reference to a launched server.
pub type ServerHandle = Arc<ServerConnection>;

impl ServerConnection {
    /// Launches `command`.  Must be called from within a tokio runtime.
    pub fn launch(id: impl Into<String>, command: ServerCommand) -> Result<Self> {
        let id = id.into();
        let child = Command::new(&command.command)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                SERVER_LAUNCH_ERRORS.click();
                Error::io(format!("failed to launch server {id} ({command})"), err)
            })?;
        SERVERS_LAUNCHED.click();
        Ok(Self {
            id,
            command,
            child: Mutex::new(Some(child)),
        })
    }

    /// The identifier this server was registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The command that launched this server.
    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    /// OS process id, while the server is running.
    pub fn pid(&self) -> Option<u32> {
        self.child
            .try_lock()
            .ok()
            .and_then(|child| child.as_ref().and_then(Child::id))
    }

    /// True until the connection has been released.
    pub fn is_open(&self) -> bool {
        self.child
            .try_lock()
            .map(|child| child.is_some())
            .unwrap_or(true)
    }

    /// Releases the server: closes its stdin, waits briefly for it to exit,
    /// then kills it.  Closing an already closed connection is a no-op.
    pub async fn close(&self) -> Result<()> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };
        SERVERS_CLOSED.click();
        drop(child.stdin.take());
        let waited = tokio::time::timeout(CLOSE_GRACE, child.wait()).await;
        match waited {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(Error::io(format!("failed to reap server {}", self.id), err)),
            Err(_) => child
                .kill()
                .await
                .map_err(|err| Error::io(format!("failed to kill server {}", self.id), err)),
        }
    }

    /// Best-effort synchronous release for use from `Drop`.
    fn kill_now(&self) {
        if let Ok(mut guard) = self.child.try_lock() {
            if let Some(mut child) = guard.take() {
                SERVERS_CLOSED.click();
                let _ = child.start_kill();
            }
        }
    }
}

/// Scoped owner of every server connection a session acquires.
#[derive(Debug, Default)]
pub struct ConnectionStack {
    connections: Vec<ServerHandle>,
}

impl ConnectionStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a server and pushes it onto the stack.
    ///
    /// On failure nothing is pushed; connections acquired earlier stay owned
    /// by the stack and are released with it.
    pub fn enter(&mut self, id: impl Into<String>, command: ServerCommand) -> Result<ServerHandle> {
        let handle = Arc::new(ServerConnection::launch(id, command)?);
        self.connections.push(Arc::clone(&handle));
        Ok(handle)
    }

    /// Launches every `(id, command)` in order.
    ///
    /// If one fails to launch, the servers already running are closed in
    /// reverse order and the launch error is returned.  Failures while
    /// closing are dropped so they cannot mask it.
    pub async fn launch_all<I>(servers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, ServerCommand)>,
    {
        let mut stack = Self::new();
        for (id, command) in servers {
            if let Err(err) = stack.enter(id, command) {
                let _ = stack.close().await;
                return Err(err);
            }
        }
        Ok(stack)
    }

    /// Every acquired connection keyed by id.
    pub fn handles(&self) -> BTreeMap<String, ServerHandle> {
        self.connections
            .iter()
            .map(|handle| (handle.id().to_string(), Arc::clone(handle)))
            .collect()
    }

    /// Ids in acquisition order.
    pub fn ids(&self) -> Vec<&str> {
        self.connections.iter().map(|handle| handle.id()).collect()
    }

    /// Returns the number of acquired connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if nothing has been acquired.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Releases every connection, most recently acquired first.
    ///
    /// All connections are released even if some fail; the first failure is
    /// returned.
    pub async fn close(mut self) -> Result<()> {
        let mut first_error = None;
        while let Some(handle) = self.connections.pop() {
            if let Err(err) = handle.close().await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for ConnectionStack {
    fn drop(&mut self) {
        while let Some(handle) = self.connections.pop() {
            handle.kill_now();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "relaychat-{}-{}-{}",
            name,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    /// A server that exits once stdin closes and then appends `label` to `log`.
    fn logging_server(label: &str, log: &PathBuf) -> ServerCommand {
        ServerCommand::new(
            "sh",
            [
                "-c".to_string(),
                format!("cat >/dev/null; echo {label} >> '{}'", log.display()),
            ],
        )
    }

    #[test]
    fn document_server_command() {
        assert_eq!(
            ServerCommand::document_server(false),
            ServerCommand::new("python", ["mcp_server.py"])
        );
        assert_eq!(
            ServerCommand::document_server(true),
            ServerCommand::new("uv", ["run", "mcp_server.py"])
        );
        assert_eq!(
            ServerCommand::script("weather.py").to_string(),
            "uv run weather.py"
        );
        assert_eq!(script_server_id(0, "weather.py"), "client_0_weather.py");
    }

    #[tokio::test]
    async fn close_releases_in_reverse_order() {
        let log = scratch_file("reverse");
        let mut stack = ConnectionStack::new();
        let first = stack.enter("first", logging_server("first", &log)).unwrap();
        let second = stack.enter("second", logging_server("second", &log)).unwrap();
        let third = stack.enter("third", logging_server("third", &log)).unwrap();
        assert_eq!(stack.ids(), vec!["first", "second", "third"]);
        assert!(first.is_open() && second.is_open() && third.is_open());

        stack.close().await.unwrap();

        assert!(!first.is_open() && !second.is_open() && !third.is_open());
        let order = fs::read_to_string(&log).unwrap();
        assert_eq!(order, "third\nsecond\nfirst\n");
        let _ = fs::remove_file(&log);
    }

    #[tokio::test]
    async fn handles_are_keyed_by_id() {
        let mut stack = ConnectionStack::new();
        stack.enter(DOCUMENT_SERVER_ID, ServerCommand::new("cat", Vec::<String>::new())).unwrap();
        stack.enter("client_0_extra.py", ServerCommand::new("cat", Vec::<String>::new())).unwrap();

        let handles = stack.handles();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[DOCUMENT_SERVER_ID].command().command, "cat");
        assert!(handles["client_0_extra.py"].pid().is_some());

        stack.close().await.unwrap();
        assert!(!handles[DOCUMENT_SERVER_ID].is_open());
        assert!(handles[DOCUMENT_SERVER_ID].pid().is_none());
    }

    #[tokio::test]
    async fn failed_launch_keeps_earlier_connections() {
        let mut stack = ConnectionStack::new();
        let kept = stack.enter("kept", ServerCommand::new("cat", Vec::<String>::new())).unwrap();
        let err = stack
            .enter(
                "missing",
                ServerCommand::new("relaychat-no-such-program", Vec::<String>::new()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(stack.ids(), vec!["kept"]);

        drop(stack);
        assert!(!kept.is_open());
    }

    #[tokio::test]
    async fn launch_all_reports_launch_error_and_unwinds() {
        let log = scratch_file("unwind");
        let servers = vec![
            ("first".to_string(), logging_server("first", &log)),
            ("second".to_string(), logging_server("second", &log)),
            (
                "missing".to_string(),
                ServerCommand::new("relaychat-no-such-program", Vec::<String>::new()),
            ),
        ];
        let err = ConnectionStack::launch_all(servers).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("missing"));

        let order = fs::read_to_string(&log).unwrap();
        assert_eq!(order, "second\nfirst\n");
        let _ = fs::remove_file(&log);
    }

    #[tokio::test]
    async fn launch_all_keeps_order() {
        let stack = ConnectionStack::launch_all(vec![
            ("a".to_string(), ServerCommand::new("cat", Vec::<String>::new())),
            ("b".to_string(), ServerCommand::new("cat", Vec::<String>::new())),
        ])
        .await
        .unwrap();
        assert_eq!(stack.ids(), vec!["a", "b"]);
        stack.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let connection =
            ServerConnection::launch("once", ServerCommand::new("cat", Vec::<String>::new()))
                .unwrap();
        connection.close().await.unwrap();
        connection.close().await.unwrap();
        assert!(!connection.is_open());
    }

    #[tokio::test]
    async fn stubborn_server_is_killed() {
        let connection = ServerConnection::launch(
            "stubborn",
            ServerCommand::new("sh", ["-c", "sleep 30"]),
        )
        .unwrap();
        let started = std::time::Instant::now();
        connection.close().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!connection.is_open());
    }
}
