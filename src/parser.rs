use crate::models::{Dialect, Entry, TimeRange};
use regex::Regex;
use std::sync::OnceLock;

static BASH_STAMP: OnceLock<Regex> = OnceLock::new();
static ZSH_LINE: OnceLock<Regex> = OnceLock::new();

fn bash_stamp() -> &'static Regex {
    BASH_STAMP.get_or_init(|| Regex::new(r"^#(\d+)$").expect("bash marker pattern"))
}

fn zsh_line() -> &'static Regex {
    ZSH_LINE.get_or_init(|| Regex::new(r"^\D*(\d+)[^;]*;(.*)$").expect("zsh line pattern"))
}

/// Parse one raw history document into the entries that fall inside `range`.
///
/// Never fails: lines that do not fit the dialect are skipped. Invalid UTF-8
/// is replaced with U+FFFD before matching.
pub fn parse(dialect: Dialect, raw: &[u8], host: &str, range: &TimeRange) -> Vec<Entry> {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    match dialect {
        Dialect::Bash => parse_bash(&lines, host, range),
        Dialect::Zsh => parse_zsh(&lines, host, range),
    }
}

fn parse_bash(lines: &[&str], host: &str, range: &TimeRange) -> Vec<Entry> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(epoch) = bash_stamp()
            .captures(line)
            .and_then(|c| c[1].parse::<i64>().ok())
        else {
            continue;
        };
        // a marker on the last line has no command to attach to
        let Some(cmd) = lines.get(i + 1) else {
            continue;
        };
        if range.contains_epoch(epoch) {
            out.push(Entry::new(host, epoch, cmd));
        }
    }
    out
}

fn parse_zsh(lines: &[&str], host: &str, range: &TimeRange) -> Vec<Entry> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = zsh_line().captures(line)?;
            let epoch = caps[1].parse::<i64>().ok()?;
            range
                .contains_epoch(epoch)
                .then(|| Entry::new(host, epoch, &caps[2]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn window(start: i64, finish: i64) -> TimeRange {
        TimeRange::new(
            Local.timestamp_opt(start, 0).unwrap(),
            Local.timestamp_opt(finish, 0).unwrap(),
        )
    }

    fn keys(entries: &[Entry]) -> Vec<(i64, &str, &str)> {
        entries
            .iter()
            .map(|e| (e.time.timestamp(), e.host.as_str(), e.cmd.as_str()))
            .collect()
    }

    fn bash_doc(pairs: &[(i64, &str)]) -> String {
        pairs
            .iter()
            .map(|(t, c)| format!("#{t}\n{c}\n"))
            .collect()
    }

    fn zsh_doc(pairs: &[(i64, &str)]) -> String {
        pairs
            .iter()
            .map(|(t, c)| format!(": {t}:0;{c}\n"))
            .collect()
    }

    #[test]
    fn bash_recovers_pairs_in_encounter_order() {
        let pairs = [
            (1_700_000_300, "git status"),
            (1_700_000_100, "cd /srv"),
            (1_700_000_200, "ls -la"),
        ];
        let doc = bash_doc(&pairs);
        let out = parse(Dialect::Bash, doc.as_bytes(), "web1", &window(0, 2_000_000_000));
        assert_eq!(
            keys(&out),
            vec![
                (1_700_000_300, "web1", "git status"),
                (1_700_000_100, "web1", "cd /srv"),
                (1_700_000_200, "web1", "ls -la"),
            ]
        );
    }

    #[test]
    fn bash_skips_lines_without_marker() {
        let doc = "ls\n#1700000000\nuptime\nwhoami\npwd\n#1700000010\n  df -h  \n";
        let out = parse(Dialect::Bash, doc.as_bytes(), "h", &window(0, 2_000_000_000));
        assert_eq!(
            keys(&out),
            vec![(1_700_000_000, "h", "uptime"), (1_700_000_010, "h", "df -h")]
        );
    }

    #[test]
    fn bash_dangling_marker_yields_nothing() {
        let doc = "#1700000000\nuptime\n#1700000050\n";
        let out = parse(Dialect::Bash, doc.as_bytes(), "h", &window(0, 2_000_000_000));
        assert_eq!(keys(&out), vec![(1_700_000_000, "h", "uptime")]);
    }

    #[test]
    fn bash_marker_must_be_only_digits() {
        let doc = "#1700000000 extra\nnope\n# 1700000000\nnope\n#17000x\nnope\n";
        let out = parse(Dialect::Bash, doc.as_bytes(), "h", &window(0, 2_000_000_000));
        assert!(out.is_empty());
    }

    #[test]
    fn zsh_recovers_pairs() {
        let pairs = [(1_700_000_000, "make test"), (1_700_000_500, "echo a;b")];
        let doc = zsh_doc(&pairs);
        let out = parse(Dialect::Zsh, doc.as_bytes(), "localhost", &window(0, 2_000_000_000));
        assert_eq!(
            keys(&out),
            vec![
                (1_700_000_000, "localhost", "make test"),
                (1_700_000_500, "localhost", "echo a;b"),
            ]
        );
    }

    #[test]
    fn zsh_skips_lines_without_shape() {
        let doc = "plain command\n: 1700000000:0;ok\nno digits; here\n\n";
        let out = parse(Dialect::Zsh, doc.as_bytes(), "h", &window(0, 2_000_000_000));
        assert_eq!(keys(&out), vec![(1_700_000_000, "h", "ok")]);
    }

    #[test]
    fn window_keeps_boundaries_and_drops_outside() {
        let pairs = [
            (99, "before"),
            (100, "at-start"),
            (150, "inside"),
            (200, "at-finish"),
            (201, "after"),
        ];
        let range = window(100, 200);
        for (dialect, doc) in [
            (Dialect::Bash, bash_doc(&pairs)),
            (Dialect::Zsh, zsh_doc(&pairs)),
        ] {
            let out = parse(dialect, doc.as_bytes(), "h", &range);
            let cmds: Vec<&str> = out.iter().map(|e| e.cmd.as_str()).collect();
            assert_eq!(cmds, vec!["at-start", "inside", "at-finish"], "{dialect:?}");
        }
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let mut doc = b"#1700000000\necho ".to_vec();
        doc.extend_from_slice(&[0xff, 0xfe]);
        doc.extend_from_slice(b"\n");
        let out = parse(Dialect::Bash, &doc, "h", &window(0, 2_000_000_000));
        assert_eq!(out.len(), 1);
        assert!(out[0].cmd.starts_with("echo "));
        assert!(out[0].cmd.contains('\u{FFFD}'));
    }

    #[test]
    fn empty_and_garbage_input_yield_nothing() {
        let range = window(0, 2_000_000_000);
        assert!(parse(Dialect::Bash, b"", "h", &range).is_empty());
        assert!(parse(Dialect::Zsh, b"", "h", &range).is_empty());
        assert!(parse(Dialect::Bash, b"\x00\x01garbage\n\n", "h", &range).is_empty());
        assert!(parse(Dialect::Zsh, b"garbage\n", "h", &range).is_empty());
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let doc = "#1700000000\r\nuptime\r\n";
        let out = parse(Dialect::Bash, doc.as_bytes(), "h", &window(0, 2_000_000_000));
        assert_eq!(keys(&out), vec![(1_700_000_000, "h", "uptime")]);
    }
}
