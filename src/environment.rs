use crate::consts::backend::{LOCAL_CHECKER_URL, LOCAL_SIMULATOR_URL};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Where the checker and simulator services run.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub enum Environment {
    /// Both services on this machine, on their default ports.
    #[default]
    Local,
    /// Both services behind one base URL.
    Custom(String),
}

impl Environment {
    /// URL of the safety checker (`/process`, `/updates`, `/status`, `/complete`).
    pub fn checker_url(&self) -> String {
        match self {
            Environment::Local => LOCAL_CHECKER_URL.to_string(),
            Environment::Custom(url) => url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the GAL synthesiser and simulator (`/process`, `/simulate`).
    pub fn simulator_url(&self) -> String {
        match self {
            Environment::Local => LOCAL_SIMULATOR_URL.to_string(),
            Environment::Custom(url) => url.trim_end_matches('/').to_string(),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("local") {
            return Ok(Environment::Local);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Environment::Custom(s.to_string()));
        }
        Err(format!("expected `local` or an http(s) URL, got `{}`", s))
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Custom(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_environment() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!(
            "https://reach.example.org/".parse::<Environment>().unwrap().checker_url(),
            "https://reach.example.org"
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_local_ports() {
        let env = Environment::Local;
        assert!(env.checker_url().ends_with(":7050"));
        assert!(env.simulator_url().ends_with(":5000"));
    }
}
