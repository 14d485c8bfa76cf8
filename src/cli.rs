use anyhow::{bail, Result};
use chrono::{Days, Local, Months, NaiveDate};

#[derive(Default, Debug, PartialEq)]
pub struct Options {
    pub date: Option<String>,
    pub format: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub json: bool,
    pub discover: bool,
    pub doctor: bool,
    pub help: bool,
    pub version: bool,
    pub hosts: Vec<String>,
}

pub fn print_help() {
    println!("mhist {}", env!("CARGO_PKG_VERSION"));
    println!("Merge shell history from many hosts into one time-ordered stream.\n");
    print_usage();
    print_options();
}

fn print_usage() {
    println!("USAGE:");
    println!("  mhist [OPTIONS] [HOST...]");
    println!();
    println!("  With no HOST, hosts are taken from `ssh <host>` lines in your local");
    println!("  ~/.bash_history and ~/.zsh_history.\n");
}

fn print_options() {
    println!("OPTIONS:");
    println!("  -d, --date <expr>   Day to show (today, yesterday, 7d, 2w, 1m, YYYY-MM-DD)");
    println!("  -v, --verbose       Print a banner and per-host progress on stderr");
    println!("      --no-color      Disable colored output (also respects NO_COLOR env)");
    println!("      --format <tpl>  Output template (default: {{ctime}} {{chost}} {{ccmd}})");
    println!("                      slots: {{host}} {{chost}} {{time}} {{ctime}} {{cmd}} {{ccmd}}");
    println!("      --json          One JSON object per entry");
    println!("      --discover      Print the resolved host list and exit");
    println!("      --doctor        Check transport, history files and config");
    println!("  -h, --help          Show this message");
    println!("  -V, --version       Show version\n");
    println!("ENVIRONMENT:");
    println!("  MHIST_SSH            Transport program (default: ssh)");
    println!("  MHIST_FORMAT         Output template");
    println!("  MHIST_DISCOVER_DAYS  Days of local history scanned for hosts (default: 30)");
    println!("  MHIST_CONFIG         Config file (default: ~/.mhist/config)");
}

pub fn parse_args(args: &[String]) -> Result<Options> {
    let mut out = Options::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f, Some(v.to_string())),
            _ => (arg, None),
        };
        match flag {
            "-d" | "--date" | "--format" => {
                let value = match inline {
                    Some(v) => v,
                    None => {
                        i += 1;
                        match args.get(i) {
                            Some(v) => v.clone(),
                            None => bail!("{flag} requires a value"),
                        }
                    }
                };
                if flag == "--format" {
                    out.format = Some(value);
                } else {
                    out.date = Some(value);
                }
            }
            "-v" | "--verbose" => out.verbose = true,
            "--no-color" => out.no_color = true,
            "--json" => out.json = true,
            "--discover" => out.discover = true,
            "--doctor" => out.doctor = true,
            "-h" | "--help" => out.help = true,
            "-V" | "--version" => out.version = true,
            other if other.starts_with('-') && other.len() > 1 => {
                bail!("unknown option '{arg}'");
            }
            _ => out.hosts.push(arg.to_string()),
        }
        i += 1;
    }
    Ok(out)
}

/// Resolve a day expression against today's local date.
pub fn parse_date(expr: &str) -> Result<NaiveDate> {
    parse_date_from(expr, Local::now().date_naive())
}

fn parse_date_from(expr: &str, today: NaiveDate) -> Result<NaiveDate> {
    let expr = expr.trim();
    let parsed = match expr {
        "today" => Some(today),
        "yesterday" => today.checked_sub_days(Days::new(1)),
        s if s.ends_with('d') => parse_duration_days(s, today),
        s if s.ends_with('w') => parse_duration_weeks(s, today),
        s if s.ends_with('m') => parse_duration_months(s, today),
        s => ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(s, f).ok()),
    };
    match parsed {
        Some(d) => Ok(d),
        None => bail!("invalid date '{expr}'"),
    }
}

fn parse_duration_days(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let n = s.trim_end_matches('d').parse::<u64>().ok()?;
    today.checked_sub_days(Days::new(n))
}

fn parse_duration_weeks(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let n = s.trim_end_matches('w').parse::<u64>().ok()?;
    today.checked_sub_days(Days::new(n.checked_mul(7)?))
}

fn parse_duration_months(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let n = s.trim_end_matches('m').parse::<u32>().ok()?;
    today.checked_sub_months(Months::new(n))
}
