use std::collections::HashMap;
use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3005;
pub const DEFAULT_PROGRAM: &str = "python";
pub const DEFAULT_SCRIPT: &str = "main.py";

/// Process-wide settings, read once at startup and never mutated.
#[derive(Clone, Debug)]
pub struct Config {
    /// Destination number passed to the call script. `None` when unset or empty.
    pub call_to: Option<String>,
    pub bind_address: SocketAddr,
    pub program: String,
    /// Script handed to `program` as its first argument, if any.
    pub script: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    /// Adds `exit_code` to success bodies.
    pub report_exit_code: bool,
}

impl Config {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(&utf8_vars(std::env::vars_os()))
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let host = non_empty("CALL_API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip = host
            .parse::<IpAddr>()
            .with_context(|| format!("CALL_API_HOST must be an IP address, got {:?}", host))?;
        let port = match non_empty("CALL_API_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("CALL_API_PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        // An explicitly empty CALL_SCRIPT runs the program without a script.
        let script = match vars.get("CALL_SCRIPT") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_SCRIPT.to_string()),
        };

        Ok(Self {
            // Passed through verbatim; only an empty value counts as missing.
            call_to: vars.get("CALL_TO").filter(|v| !v.is_empty()).cloned(),
            bind_address: SocketAddr::new(ip, port),
            program: non_empty("CALL_PROGRAM").unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            script,
            working_dir: non_empty("CALL_WORKDIR").map(PathBuf::from),
            api_key: non_empty("CALL_API_KEY"),
            report_exit_code: non_empty("CALL_REPORT_EXIT_CODE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }
}

/// Keeps the variables that are valid UTF-8. Unrelated variables with other
/// encodings are skipped rather than aborting startup.
fn utf8_vars<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_original_deployment() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.call_to, None);
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3005");
        assert_eq!(config.program, "python");
        assert_eq!(config.script.as_deref(), Some("main.py"));
        assert!(config.working_dir.is_none());
        assert!(config.api_key.is_none());
        assert!(!config.report_exit_code);
    }

    #[test]
    fn empty_destination_is_treated_as_missing() {
        let config = Config::from_vars(&vars(&[("CALL_TO", "")])).unwrap();
        assert_eq!(config.call_to, None);
    }

    #[test]
    fn destination_is_kept_verbatim() {
        let config = Config::from_vars(&vars(&[("CALL_TO", "   ")])).unwrap();
        assert_eq!(config.call_to.as_deref(), Some("   "));

        let config = Config::from_vars(&vars(&[("CALL_TO", " +15551234567 ")])).unwrap();
        assert_eq!(config.call_to.as_deref(), Some(" +15551234567 "));
    }

    #[test]
    fn ipv6_host_binds_bracketed() {
        let config = Config::from_vars(&vars(&[("CALL_API_HOST", "::")])).unwrap();
        assert_eq!(config.bind_address.to_string(), "[::]:3005");
        assert!(config.bind_address.is_ipv6());
    }

    #[test]
    fn hostname_is_rejected() {
        let err = Config::from_vars(&vars(&[("CALL_API_HOST", "example.com")])).unwrap_err();
        assert!(err.to_string().contains("CALL_API_HOST"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let env = vec![
            (OsString::from("CALL_TO"), OsString::from("+15551234567")),
            (OsString::from("UNRELATED"), OsString::from_vec(b"\xff\xfe".to_vec())),
            (OsString::from_vec(b"BAD\xffKEY".to_vec()), OsString::from("x")),
        ];

        let map = utf8_vars(env);
        assert_eq!(map.len(), 1);

        let config = Config::from_vars(&map).unwrap();
        assert_eq!(config.call_to.as_deref(), Some("+15551234567"));
    }

    #[test]
    fn destination_is_not_format_checked() {
        let config = Config::from_vars(&vars(&[("CALL_TO", "not-a-number")])).unwrap();
        assert_eq!(config.call_to.as_deref(), Some("not-a-number"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_vars(&vars(&[
            ("CALL_TO", "+15551234567"),
            ("CALL_API_HOST", "127.0.0.1"),
            ("CALL_API_PORT", "8080"),
            ("CALL_PROGRAM", "/usr/bin/python3"),
            ("CALL_SCRIPT", "dialer.py"),
            ("CALL_WORKDIR", "/srv/caller"),
            ("CALL_API_KEY", "secret"),
            ("CALL_REPORT_EXIT_CODE", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.call_to.as_deref(), Some("+15551234567"));
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.program, "/usr/bin/python3");
        assert_eq!(config.script.as_deref(), Some("dialer.py"));
        assert_eq!(config.working_dir, Some(PathBuf::from("/srv/caller")));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(config.report_exit_code);
    }

    #[test]
    fn empty_script_runs_program_directly() {
        let config = Config::from_vars(&vars(&[("CALL_SCRIPT", "")])).unwrap();
        assert_eq!(config.script, None);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_vars(&vars(&[("CALL_API_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("CALL_API_PORT"));
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("On"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("maybe"));
    }
}
