use crate::collector::Collector;
use crate::fetch::{CollectError, Fetcher};
use crate::models::TimeRange;
use crate::report::Sink;

/// Hosts the local user has ssh'd into during `range`, oldest first, each
/// listed once.
pub async fn discover<F: Fetcher, S: Sink>(
    collector: &Collector<F, S>,
    range: &TimeRange,
) -> Result<Vec<String>, CollectError> {
    let mut entries = collector.collect(&[], range).await?;
    entries.sort();

    let mut hosts: Vec<String> = Vec::new();
    for target in entries.iter().filter_map(|e| ssh_target(&e.cmd)) {
        if !hosts.iter().any(|h| h == target) {
            hosts.push(target.to_string());
        }
    }
    Ok(hosts)
}

/// Destination of an `ssh ...` command line, if it has one.
///
/// Tokens after `ssh` are walked left to right: the first bare word is the
/// host; `-x=y` / `--key=value` and `-v...` stand alone; any other option
/// consumes the token after it as its value.
pub fn ssh_target(cmd: &str) -> Option<&str> {
    let mut tokens = cmd.split_whitespace();
    if tokens.next()? != "ssh" {
        return None;
    }
    while let Some(token) = tokens.next() {
        if !token.starts_with('-') {
            return Some(token);
        }
        if token.contains('=') || token.starts_with("-v") {
            continue;
        }
        tokens.next();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::tests::{wide, Stub};
    use crate::report::Captured;
    use std::sync::Arc;

    #[test]
    fn target_after_verbose_and_inline_option() {
        assert_eq!(
            ssh_target("ssh -v -oStrictHostKeyChecking=no myhost.example.com"),
            Some("myhost.example.com")
        );
    }

    #[test]
    fn target_after_long_option() {
        assert_eq!(ssh_target("ssh --option=value otherhost"), Some("otherhost"));
    }

    #[test]
    fn option_with_separate_value_is_skipped_as_a_pair() {
        assert_eq!(ssh_target("ssh -p 2222 thirdhost"), Some("thirdhost"));
        assert_eq!(
            ssh_target("ssh -i ~/.ssh/id_ed25519 -p 22 deploy@web1 uptime"),
            Some("deploy@web1")
        );
    }

    #[test]
    fn no_bare_token_means_no_host() {
        assert_eq!(ssh_target("ssh -v"), None);
        assert_eq!(ssh_target("ssh"), None);
        assert_eq!(ssh_target("ssh -p 2222"), None);
    }

    #[test]
    fn only_plain_ssh_commands_count() {
        assert_eq!(ssh_target("sshfs host:/srv /mnt"), None);
        assert_eq!(ssh_target("git push"), None);
        assert_eq!(ssh_target(""), None);
        assert_eq!(ssh_target("  ssh   spaced  "), Some("spaced"));
    }

    #[tokio::test]
    async fn discover_dedupes_in_time_order() {
        let bash = "#1700000030\nssh web2\n#1700000010\nssh -p 2200 web1\n#1700000040\nls\n";
        let zsh = concat!(
            ": 1700000020:0;ssh web2\n",
            ": 1700000050:0;ssh -v db1 uptime\n",
            ": 1700000060:0;ssh web1\n",
        );
        let stub = Stub {
            local: Some((bash.to_string(), zsh.to_string())),
            ..Stub::default()
        };
        let collector = Collector::new(Arc::new(stub), Arc::new(Captured::default()), false);

        let hosts = discover(&collector, &wide()).await.expect("discover");

        assert_eq!(hosts, vec!["web1", "web2", "db1"]);
    }

    #[tokio::test]
    async fn discover_without_ssh_history_is_empty() {
        let stub = Stub {
            local: Some(("#1700000000\nls\n".to_string(), String::new())),
            ..Stub::default()
        };
        let collector = Collector::new(Arc::new(stub), Arc::new(Captured::default()), false);
        assert!(discover(&collector, &wide()).await.expect("discover").is_empty());
    }

    #[tokio::test]
    async fn discover_propagates_local_read_failure() {
        let collector = Collector::new(
            Arc::new(Stub::default()),
            Arc::new(Captured::default()),
            false,
        );
        assert!(discover(&collector, &wide()).await.is_err());
    }
}
