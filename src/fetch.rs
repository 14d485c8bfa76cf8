use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub const BASH_HISTORY: &str = ".bash_history";
pub const ZSH_HISTORY: &str = ".zsh_history";

const REMOTE_COMMAND: &str = "cat $HOME/.bash_history";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{host}: {message}")]
    Remote { host: String, message: String },
    #[error("{host}: failed to run {program}: {source}")]
    Spawn {
        host: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("cannot read {}: {source}", .path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw text of the invoking user's own history files.
pub struct LocalHistory {
    pub bash: Vec<u8>,
    pub zsh: Vec<u8>,
}

/// Where raw history text comes from.
pub trait Fetcher: Send + Sync + 'static {
    /// Bash history of one remote host.
    fn fetch(&self, host: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Bash and zsh history of the local user. Any unreadable file is fatal.
    fn fetch_local(&self) -> impl Future<Output = Result<LocalHistory, CollectError>> + Send;
}

/// Runs `<program> <host> 'cat $HOME/.bash_history'` for remote hosts and
/// reads the history files under `home` for the local case.
pub struct Shell {
    program: String,
    home: PathBuf,
}

impl Shell {
    pub fn new(program: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            home: home.into(),
        }
    }
}

impl Fetcher for Shell {
    async fn fetch(&self, host: &str) -> Result<Vec<u8>, FetchError> {
        let out = Command::new(&self.program)
            .arg(host)
            .arg(REMOTE_COMMAND)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                host: host.to_string(),
                program: self.program.clone(),
                source,
            })?;
        if out.status.success() {
            return Ok(out.stdout);
        }
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            match out.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            stderr
        };
        Err(FetchError::Remote {
            host: host.to_string(),
            message,
        })
    }

    async fn fetch_local(&self) -> Result<LocalHistory, CollectError> {
        let bash = read_history(&self.home.join(BASH_HISTORY)).await?;
        let zsh = read_history(&self.home.join(ZSH_HISTORY)).await?;
        Ok(LocalHistory { bash, zsh })
    }
}

async fn read_history(path: &Path) -> Result<Vec<u8>, CollectError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| CollectError::LocalRead {
            path: path.to_path_buf(),
            source,
        })
}
