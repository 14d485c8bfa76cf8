use crate::config::{self, Settings};
use crate::fetch::{BASH_HISTORY, ZSH_HISTORY};
use crate::fmt::{cprintln, BOLD, CYAN, DIM, GREEN, RED, RESET};
use std::path::{Path, PathBuf};

pub fn run(home: &Path, settings: &Settings) {
    cprintln!();
    cprintln!("{DIM}── mhist doctor ────────────────────────────────{RESET}");
    cprintln!();

    let mut pass = 0;
    let mut fail = 0;

    check_transport(&settings.ssh, &mut pass, &mut fail);
    check_history(&home.join(BASH_HISTORY), &mut pass, &mut fail);
    check_history(&home.join(ZSH_HISTORY), &mut pass, &mut fail);
    check_config(home, &mut pass);

    cprintln!();
    cprintln!(
        "  {BOLD}{pass}{RESET} passed  {}{fail}{} failed",
        if fail > 0 { RED } else { DIM },
        RESET
    );
    cprintln!();
}

fn check_transport(program: &str, pass: &mut u32, fail: &mut u32) {
    match find_program(program) {
        Some(path) => ok(&format!("transport found ({})", path.display()), pass),
        None => err(&format!("transport '{program}' not found on PATH"), fail),
    }
}

fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

fn check_history(path: &Path, pass: &mut u32, fail: &mut u32) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            ok(&format!("~/{name} readable ({})", fmt_size(meta.len())), pass)
        }
        Ok(_) => err(&format!("~/{name} is not a regular file"), fail),
        Err(e) => err(&format!("~/{name}: {e}"), fail),
    }
}

fn check_config(home: &Path, pass: &mut u32) {
    let path = config::config_path(home);
    if !path.exists() {
        cprintln!("  {DIM}-{RESET}  no config file ({})", path.display());
        return;
    }

    let cfg = config::load_config(&path);
    if cfg.is_empty() {
        cprintln!("  {DIM}-{RESET}  config file empty");
        return;
    }

    let mut keys: Vec<&str> = cfg.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    ok(&format!("config loaded ({})", keys.join(", ")), pass);
    for key in keys {
        if !config::KNOWN_KEYS.contains(&key) {
            cprintln!("  {CYAN}i{RESET}  unknown config key: {key}");
        }
    }
}

fn fmt_size(size: u64) -> String {
    if size >= 1_048_576 {
        format!("{:.1}MB", size as f64 / 1_048_576.0)
    } else if size >= 1024 {
        format!("{}KB", size / 1024)
    } else {
        format!("{size}B")
    }
}

fn ok(msg: &str, pass: &mut u32) {
    cprintln!("  {GREEN}✓{RESET}  {msg}");
    *pass += 1;
}

fn err(msg: &str, fail: &mut u32) {
    cprintln!("  {RED}✗{RESET}  {msg}");
    *fail += 1;
}
