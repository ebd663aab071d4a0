//! Neighbor-table query strategies

use std::net::IpAddr;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ResolveError;

/// Platform families with distinct neighbor-table tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `arp -a <ip>`
    Windows,
    /// Linux and other POSIX systems: `arp -n <ip>`
    Linux,
    /// macOS and the BSDs: `arp -n <ip>`
    Bsd,
}

impl Platform {
    /// Classify a platform identifier such as `std::env::consts::OS`
    ///
    /// Returns `None` for platforms without a known query.
    pub fn from_identifier(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();

        // "darwin" contains "win", so the Apple/BSD family is checked first
        if ["mac", "darwin", "bsd"].iter().any(|s| id.contains(s))
            || matches!(id.as_str(), "ios" | "dragonfly")
        {
            Some(Platform::Bsd)
        } else if id.contains("win") {
            Some(Platform::Windows)
        } else if ["nux", "nix", "aix"].iter().any(|s| id.contains(s)) || id == "android" {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    /// The platform this binary was built for
    pub fn current() -> Option<Self> {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Lookup tool and the arguments preceding the IP
    fn query(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Platform::Windows => ("arp", &["-a"]),
            Platform::Linux | Platform::Bsd => ("arp", &["-n"]),
        }
    }
}

/// Capability to dump the neighbor-table entry for one address
#[async_trait]
pub trait NeighborTable: Send + Sync {
    /// Raw text describing `ip`'s neighbor entry, in whatever form the host prints it
    async fn lookup(&self, ip: IpAddr) -> Result<String, ResolveError>;
}

/// Neighbor table read by running an external program
///
/// The IP is appended as the final argument. Output on stderr is appended
/// to stdout, since some `arp` builds report entries there.
#[derive(Debug, Clone)]
pub struct CommandNeighborTable {
    program: String,
    args: Vec<String>,
}

impl CommandNeighborTable {
    /// Create a table backed by an arbitrary program
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The standard `arp` invocation for a platform
    pub fn for_platform(platform: Platform) -> Self {
        let (program, args) = platform.query();
        Self::new(program, args.iter().copied())
    }

    /// Program that will be executed
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl NeighborTable for CommandNeighborTable {
    async fn lookup(&self, ip: IpAddr) -> Result<String, ResolveError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(ip.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A caller timeout or an aborted request drops this future; the
            // child must not outlive it.
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ResolveError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await?;

        tracing::trace!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            self.program,
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        // stderr follows stdout rather than interleaving; `arp` writes
        // entries to stdout and only diagnostics to stderr.
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_families() {
        assert_eq!(Platform::from_identifier("windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_identifier("Windows 10"), Some(Platform::Windows));
        assert_eq!(Platform::from_identifier("linux"), Some(Platform::Linux));
        assert_eq!(Platform::from_identifier("AIX"), Some(Platform::Linux));
        assert_eq!(Platform::from_identifier("macos"), Some(Platform::Bsd));
        assert_eq!(Platform::from_identifier("Mac OS X"), Some(Platform::Bsd));
        assert_eq!(Platform::from_identifier("darwin"), Some(Platform::Bsd));
        assert_eq!(Platform::from_identifier("freebsd"), Some(Platform::Bsd));
        assert_eq!(Platform::from_identifier("openbsd"), Some(Platform::Bsd));
    }

    #[test]
    fn test_unsupported_platforms() {
        assert_eq!(Platform::from_identifier("solaris"), None);
        assert_eq!(Platform::from_identifier("wasi"), None);
        assert_eq!(Platform::from_identifier(""), None);
    }

    #[test]
    fn test_platform_query_syntax() {
        let win = CommandNeighborTable::for_platform(Platform::Windows);
        assert_eq!(win.program(), "arp");
        assert_eq!(win.args, vec!["-a"]);

        let linux = CommandNeighborTable::for_platform(Platform::Linux);
        assert_eq!(linux.args, vec!["-n"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_passes_ip_and_merges_stderr() {
        let table = CommandNeighborTable::new(
            "sh",
            ["-c", "echo \"query $0\"; echo 'from stderr' >&2"],
        );
        let output = table.lookup("10.1.2.3".parse().unwrap()).await.unwrap();
        assert!(output.contains("query 10.1.2.3"));
        assert!(output.contains("from stderr"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let table = CommandNeighborTable::new("castpair-no-such-arp-binary", Vec::<String>::new());
        let err = table.lookup("10.1.2.3".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Spawn { .. }));
    }
}
