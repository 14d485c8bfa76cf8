use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// One command execution recovered from a history file.
///
/// Field order matters: the derived `Ord` compares `time`, then `host`,
/// then `cmd`, which is the order the merged stream is printed in.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Entry {
    pub time: DateTime<Utc>,
    pub host: String,
    pub cmd: String,
}

impl Entry {
    /// A non-positive or unrepresentable epoch falls back to the current time.
    pub fn new(host: impl Into<String>, epoch: i64, cmd: &str) -> Self {
        let time = if epoch > 0 {
            Utc.timestamp_opt(epoch, 0).single().unwrap_or_else(Utc::now)
        } else {
            Utc::now()
        };
        Self {
            time,
            host: host.into(),
            cmd: cmd.trim().to_string(),
        }
    }

    pub fn local_time(&self) -> DateTime<Local> {
        self.time.with_timezone(&Local)
    }
}

/// Collection window. Both bounds are inclusive when filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Local>,
    pub finish: DateTime<Local>,
}

impl TimeRange {
    pub fn new(start: DateTime<Local>, finish: DateTime<Local>) -> Self {
        Self { start, finish }
    }

    /// Local midnight of `day` through local midnight of the following day.
    pub fn day(day: NaiveDate) -> Self {
        let next = day.checked_add_days(Days::new(1)).unwrap_or(day);
        Self::new(local_midnight(day), local_midnight(next))
    }

    pub fn today() -> Self {
        Self::day(Local::now().date_naive())
    }

    /// The `days` days before today plus today itself.
    pub fn last_days(days: u64) -> Self {
        let today = Local::now().date_naive();
        let first = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        let end = Self::day(today);
        Self::new(local_midnight(first), end.finish)
    }

    /// Inclusive on both ends, so an entry stamped exactly at the next
    /// midnight still belongs to the previous day's window.
    pub fn contains_epoch(&self, epoch: i64) -> bool {
        self.start.timestamp() <= epoch && epoch <= self.finish.timestamp()
    }
}

fn local_midnight(day: NaiveDate) -> DateTime<Local> {
    let Some(naive) = day.and_hms_opt(0, 0, 0) else {
        return Local::now();
    };
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// On-disk history flavour. Chosen by the source file, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `#<epoch>` marker line followed by the command line.
    Bash,
    /// `: <epoch>:<elapsed>;<command>` on a single line.
    Zsh,
}
