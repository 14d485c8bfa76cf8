use crate::fetch::{CollectError, Fetcher};
use crate::models::{Dialect, Entry, TimeRange};
use crate::parser;
use crate::report::{Reporter, Sink};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Remote fetches allowed in flight at once.
pub const MAX_IN_FLIGHT: usize = 5;

pub const LOCAL_HOST: &str = "localhost";

const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct Collector<F, S> {
    fetcher: Arc<F>,
    sink: Arc<S>,
    verbose: bool,
}

impl<F: Fetcher, S: Sink> Collector<F, S> {
    pub fn new(fetcher: Arc<F>, sink: Arc<S>, verbose: bool) -> Self {
        Self {
            fetcher,
            sink,
            verbose,
        }
    }

    /// Gather every entry inside `range` from `hosts`, or from the local
    /// history files when `hosts` is empty. The result is unordered.
    ///
    /// A failing host is reported and skipped; only an unreadable local
    /// history file is an error.
    pub async fn collect(
        &self,
        hosts: &[String],
        range: &TimeRange,
    ) -> Result<Vec<Entry>, CollectError> {
        if hosts.is_empty() {
            return self.collect_local(range).await;
        }

        let (reporter, drain) = Reporter::spawn(Arc::clone(&self.sink), self.verbose);
        reporter.banner(banner(hosts, range)).await;

        let permits = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
        let mut tasks = JoinSet::new();
        for host in hosts {
            let host = host.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let permits = Arc::clone(&permits);
            let reporter = reporter.clone();
            let range = *range;
            tasks.spawn(async move {
                let fetched = {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return Vec::new();
                    };
                    reporter.debug(format!("fetching {host}")).await;
                    fetcher.fetch(&host).await
                };
                match fetched {
                    Ok(raw) => {
                        let entries = parser::parse(Dialect::Bash, &raw, &host, &range);
                        reporter
                            .debug(format!("{host}: {} entries", entries.len()))
                            .await;
                        entries
                    }
                    Err(e) => {
                        reporter.error(e.to_string()).await;
                        Vec::new()
                    }
                }
            });
        }

        let mut merged = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entries) => merged.extend(entries),
                Err(e) => reporter.error(format!("fetch task failed: {e}")).await,
            }
        }
        reporter
            .info(format!("{} entries from {} hosts", merged.len(), hosts.len()))
            .await;

        drop(reporter);
        drain.await.ok();
        Ok(merged)
    }

    async fn collect_local(&self, range: &TimeRange) -> Result<Vec<Entry>, CollectError> {
        let local = self.fetcher.fetch_local().await?;
        let mut entries = parser::parse(Dialect::Bash, &local.bash, LOCAL_HOST, range);
        entries.extend(parser::parse(Dialect::Zsh, &local.zsh, LOCAL_HOST, range));
        Ok(entries)
    }
}

fn banner(hosts: &[String], range: &TimeRange) -> Vec<String> {
    vec![
        format!("hosts:  {}", hosts.join(", ")),
        format!(
            "window: {} .. {}",
            range.start.format(WINDOW_FORMAT),
            range.finish.format(WINDOW_FORMAT)
        ),
    ]
}
