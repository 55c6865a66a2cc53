//! Test Fixtures

use super::{MockEngine, MockHost, MockTransfer, MockTransport};
use shellrunner::terminal::BufferConsole;
use shellrunner::{Config, Runner, SessionContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Defaults with fast timeouts
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.remote.connect_attempts = 3;
    config.remote.connect_timeout_secs = 1;
    config.remote.password_cue_timeout_ms = 200;
    config.display.width = Some(40);
    config
}

/// Write a script file into `dir`
pub fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write script");
    path
}

/// A runner over mocks, with handles to inspect them
pub struct TestRig {
    pub dir: TempDir,
    pub runner: Runner,
    pub session: SessionContext,
    pub console: Arc<BufferConsole>,
    pub engine: MockEngine,
    pub transport: MockTransport,
    pub transfer: MockTransfer,
}

impl TestRig {
    pub fn new() -> Self {
        Self::with_host(MockHost::default())
    }

    pub fn with_host(host: MockHost) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let engine = MockEngine::new(dir.path());
        Self::build(dir, engine, host)
    }

    pub fn with_engine(configure: impl FnOnce(MockEngine) -> MockEngine) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let engine = configure(MockEngine::new(dir.path()));
        Self::build(dir, engine, MockHost::default())
    }

    fn build(dir: TempDir, engine: MockEngine, host: MockHost) -> Self {
        let console = Arc::new(BufferConsole::new(40));
        let transport = MockTransport::new(host);
        let transfer = MockTransfer::default();
        let runner = Runner::with_components(
            test_config(),
            console.clone(),
            Box::new(engine.clone()),
            Box::new(transport.clone()),
            Box::new(transfer.clone()),
        );
        let session = runner.new_session();
        Self {
            dir,
            runner,
            session,
            console,
            engine,
            transport,
            transfer,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn script(&self, name: &str, contents: &str) -> PathBuf {
        write_script(self.dir.path(), name, contents)
    }

    /// Run one interactive line
    pub fn line(&mut self, text: &str) -> bool {
        self.runner.run_line(&mut self.session, text).can_continue
    }

    pub fn lines(&self) -> Vec<String> {
        self.console.lines()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.console.contains(needle)
    }
}
