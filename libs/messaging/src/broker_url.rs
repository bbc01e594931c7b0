//! Broker endpoint parsing.

use crate::MessagingError;

const DEFAULT_PORT: u16 = 61613;
const DEFAULT_TLS_PORT: u16 = 61614;

/// A parsed `scheme://[login[:passcode]@]host[:port]` broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUrl {
    scheme: String,
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub login: Option<String>,
    pub passcode: Option<String>,
}

impl BrokerUrl {
    pub fn parse(url: &str) -> Result<Self, MessagingError> {
        let invalid = |reason: &str| MessagingError::InvalidBrokerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = url
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme"))?;
        let tls = match scheme.to_ascii_lowercase().as_str() {
            "tcp" | "stomp" => false,
            "ssl" | "tls" | "stomp+ssl" => true,
            _ => return Err(invalid("unsupported scheme")),
        };

        // Credentials end up in CONNECT headers, which are line delimited.
        if rest.chars().any(char::is_control) {
            return Err(invalid("control characters in URL"));
        }

        // Anything after the authority is meaningless to STOMP.
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();

        let (credentials, host_port) = match authority.rsplit_once('@') {
            Some((credentials, host_port)) => (Some(credentials), host_port),
            None => (None, authority),
        };
        let (login, passcode) = match credentials {
            Some(credentials) => match credentials.split_once(':') {
                Some((login, passcode)) => (Some(login.to_string()), Some(passcode.to_string())),
                None => (Some(credentials.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = split_host_port(host_port).map_err(|reason| invalid(&reason))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = port.unwrap_or(if tls { DEFAULT_TLS_PORT } else { DEFAULT_PORT });

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host,
            port,
            tls,
            login,
            passcode,
        })
    }

    /// The URL with any passcode masked, safe for logs and errors.
    pub fn redacted(&self) -> String {
        let credentials = match (&self.login, &self.passcode) {
            (Some(login), Some(_)) => format!("{login}:***@"),
            (Some(login), None) => format!("{login}@"),
            _ => String::new(),
        };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}://{}{}:{}", self.scheme, credentials, host, self.port)
    }
}

impl std::fmt::Display for BrokerUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl std::str::FromStr for BrokerUrl {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn split_host_port(host_port: &str) -> Result<(String, Option<u16>), String> {
    // Bracketed IPv6 literal: [::1]:61613
    if let Some(rest) = host_port.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| "unterminated IPv6 literal".to_string())?;
        let port = match after.strip_prefix(':') {
            Some(port) => Some(parse_port(port)?),
            None if after.is_empty() => None,
            None => return Err(format!("unexpected characters after host: {after}")),
        };
        return Ok((host.to_string(), port));
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) => Ok((host.to_string(), Some(parse_port(port)?))),
        None => Ok((host_port.to_string(), None)),
    }
}

fn parse_port(port: &str) -> Result<u16, String> {
    port.parse::<u16>().map_err(|_| format!("invalid port: {port}"))
}
