use crate::models::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static FORCE_NO_COLOR: AtomicBool = AtomicBool::new(false);
static COLOR: OnceLock<bool> = OnceLock::new();

pub(crate) fn disable_color() {
    FORCE_NO_COLOR.store(true, Ordering::Relaxed);
}

pub(crate) fn use_color() -> bool {
    if FORCE_NO_COLOR.load(Ordering::Relaxed) {
        return false;
    }
    *COLOR.get_or_init(|| std::env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout))
}

pub(crate) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_esc = false;
    for ch in s.chars() {
        if in_esc {
            if ch == 'm' {
                in_esc = false;
            }
        } else if ch == '\x1b' {
            in_esc = true;
        } else {
            out.push(ch);
        }
    }
    out
}

macro_rules! cprintln {
    () => { println!() };
    ($($arg:tt)*) => {{
        let s = format!($($arg)*);
        if $crate::fmt::use_color() {
            println!("{s}");
        } else {
            println!("{}", $crate::fmt::strip_ansi(&s));
        }
    }};
}
pub(crate) use cprintln;

macro_rules! ceprintln {
    () => { eprintln!() };
    ($($arg:tt)*) => {{
        let s = format!($($arg)*);
        if $crate::fmt::use_color() {
            eprintln!("{s}");
        } else {
            eprintln!("{}", $crate::fmt::strip_ansi(&s));
        }
    }};
}
pub(crate) use ceprintln;

pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const BLUE: &str = "\x1b[34m";
pub(crate) const MAGENTA: &str = "\x1b[35m";
pub(crate) const CYAN: &str = "\x1b[36m";

const PALETTE: &[&str] = &[GREEN, YELLOW, BLUE, MAGENTA, CYAN, RED];

pub const DEFAULT_FORMAT: &str = "{ctime} {chost} {ccmd}";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-host color, assigned in the order hosts were requested.
#[derive(Default)]
pub struct HostColors {
    colors: HashMap<String, &'static str>,
}

impl HostColors {
    pub fn assign(hosts: &[String]) -> Self {
        let mut colors = HashMap::new();
        for host in hosts {
            let next = PALETTE[colors.len() % PALETTE.len()];
            colors.entry(host.clone()).or_insert(next);
        }
        Self { colors }
    }

    pub fn get(&self, host: &str) -> Option<&'static str> {
        self.colors.get(host).copied()
    }
}

/// Fill `template` for one entry. Slots: `{host}`, `{chost}`, `{time}`,
/// `{ctime}`, `{cmd}`, `{ccmd}`. Anything else in braces is kept as written,
/// and substituted text is never scanned again.
pub fn render(template: &str, entry: &Entry, colors: &HostColors) -> String {
    let time = entry.local_time().format(TIME_FORMAT).to_string();
    let host_color = colors.get(&entry.host).unwrap_or("");

    let mut out = String::with_capacity(template.len() + entry.cmd.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match &after[..close] {
            "host" => out.push_str(&entry.host),
            "chost" => out.push_str(&format!("{host_color}{}{RESET}", entry.host)),
            "time" => out.push_str(&time),
            "ctime" => out.push_str(&format!("{DIM}{time}{RESET}")),
            "cmd" => out.push_str(&entry.cmd),
            "ccmd" => out.push_str(&format!("{BOLD}{}{RESET}", entry.cmd)),
            _ => {
                out.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
