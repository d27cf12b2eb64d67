#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sshprobe_core::api::{
    CandidateCommand, Category, CommandOutput, ConnectionDescriptor, ConnectionError,
    RemoteSession, RemoteTransport, RiskAssessment, RiskAssessmentError, RiskLevel, RiskScorer,
    TransportError,
};

pub const UPTIME_OUT: &str =
    " 10:14:01 up 12 days,  3:02,  2 users,  load average: 0.52, 0.58, 0.59\n";

/// Linux-looking canned output for the catalog commands.
pub fn linux_outputs() -> HashMap<String, CommandOutput> {
    let ok = |s: &str| CommandOutput {
        exit_code: Some(0),
        stdout: s.to_string(),
        stderr: String::new(),
    };
    let mut m = HashMap::new();
    m.insert(
        "uname -a".into(),
        ok("Linux web-01 5.15.0-91-generic #101-Ubuntu SMP x86_64 GNU/Linux\n"),
    );
    m.insert("hostname".into(), ok("web-01\n"));
    m.insert("uptime".into(), ok(UPTIME_OUT));
    m.insert(
        "free -m".into(),
        ok("       total  used  free shared buff/cache available\nMem:   16000 15000   500   10   500   700\n"),
    );
    m.insert(
        "cat /proc/meminfo".into(),
        ok("MemTotal: 16000000 kB\nMemFree: 500000 kB\nMemAvailable: 700000 kB\n"),
    );
    m.insert(
        "vmstat -s".into(),
        ok("16000000 K total memory\n15000000 K used memory\n500000 K free memory\n"),
    );
    m.insert(
        "df -h".into(),
        ok("Filesystem Size Used Avail Use% Mounted on\n/dev/sda1 50G 25G 25G 50% /\n"),
    );
    m.insert("nproc".into(), ok("4\n"));
    m
}

#[derive(Default)]
pub struct MockState {
    pub delay: Duration,
    pub fail_connect: bool,
    /// Every command exits 1.
    pub fail_exec: bool,
    pub panic_on: Option<String>,
    pub outputs: HashMap<String, CommandOutput>,
    pub opened: AtomicUsize,
    pub connected: AtomicUsize,
    pub disposed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub executed: Mutex<Vec<String>>,
}

impl MockState {
    pub fn linux() -> Self {
        Self {
            outputs: linux_outputs(),
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

pub struct MockTransport(pub Arc<MockState>);

impl MockTransport {
    pub fn new(state: MockState) -> (Arc<Self>, Arc<MockState>) {
        let state = Arc::new(state);
        (Arc::new(Self(state.clone())), state)
    }
}

impl RemoteTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn open_session(&self) -> Box<dyn RemoteSession> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(MockSession(self.0.clone()))
    }
}

struct MockSession(Arc<MockState>);

#[async_trait]
impl RemoteSession for MockSession {
    async fn connect(&mut self, c: &ConnectionDescriptor) -> Result<(), ConnectionError> {
        if self.0.fail_connect {
            return Err(ConnectionError::Auth {
                username: c.username.clone(),
                message: "permission denied".into(),
            });
        }
        self.0.connected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exec(&self, command: &str, _timeout: Duration) -> Result<CommandOutput, TransportError> {
        if self.0.panic_on.as_deref() == Some(command) {
            panic!("mock transport exploded on {command}");
        }
        self.0.executed.lock().unwrap().push(command.to_string());
        let now = self.0.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.0.delay).await;
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.0.fail_exec {
            return Ok(CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "command not found".into(),
            });
        }
        Ok(self.0.outputs.get(command).cloned().unwrap_or(CommandOutput {
            exit_code: Some(0),
            stdout: "ok\n".into(),
            stderr: String::new(),
        }))
    }

    async fn dispose(&mut self) {
        self.0.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Returns a fixed score and counts calls.
pub struct CountingScorer {
    pub score: f32,
    pub calls: AtomicUsize,
}

impl CountingScorer {
    pub fn new(score: f32) -> Arc<Self> {
        Arc::new(Self {
            score,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RiskScorer for CountingScorer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn assess(&self, _c: &CandidateCommand) -> Result<RiskAssessment, RiskAssessmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RiskAssessment {
            score: self.score,
            reasoning: "canned".into(),
            concerns: vec![],
        })
    }
}

/// Always fails.
pub struct ThrowingScorer;

#[async_trait]
impl RiskScorer for ThrowingScorer {
    fn name(&self) -> &str {
        "throwing"
    }

    async fn assess(&self, _c: &CandidateCommand) -> Result<RiskAssessment, RiskAssessmentError> {
        Err(RiskAssessmentError::Transport(anyhow::anyhow!("scorer exploded")))
    }
}

pub fn candidate(cmd: &str, category: Category, risk: RiskLevel) -> CandidateCommand {
    CandidateCommand::new(cmd, "test", category, risk)
}

pub fn password_conn() -> ConnectionDescriptor {
    ConnectionDescriptor::with_password("10.0.0.5", "ops", "secret")
}
