// ── In-job notifications ──
//
// A job running on a landing zone can push a short text message to the
// machine's agent, which forwards it to the job owner. The agent address
// is injected into the job environment.

use std::net::IpAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::CoreError;

pub const ENV_LZ_IPV4: &str = "GALILEO_LZ_IPV4";
pub const ENV_LZ_PORT: &str = "GALILEO_LZ_PORT";

/// Sends notifications to the landing-zone agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzNotifier {
    addr: IpAddr,
    port: u16,
}

impl LzNotifier {
    pub fn new(addr: IpAddr, port: u16) -> Self {
        Self { addr, port }
    }

    /// Read the agent address from `GALILEO_LZ_IPV4` and `GALILEO_LZ_PORT`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(env: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ip = require(&env, ENV_LZ_IPV4)?;
        let port = require(&env, ENV_LZ_PORT)?;

        let addr = ip.trim().parse().map_err(|e| CoreError::Config {
            message: format!("{ENV_LZ_IPV4} is not an IP address ({ip:?}): {e}"),
        })?;
        let port = port.trim().parse().map_err(|e| CoreError::Config {
            message: format!("{ENV_LZ_PORT} is not a port number ({port:?}): {e}"),
        })?;
        Ok(Self { addr, port })
    }

    /// Connect, write `message` as UTF-8, and close.
    pub async fn send(&self, message: &str) -> Result<(), CoreError> {
        let target = (self.addr, self.port);
        let mut stream = TcpStream::connect(target)
            .await
            .map_err(|e| CoreError::ConnectionFailed {
                url: format!("{}:{}", self.addr, self.port),
                reason: e.to_string(),
            })?;
        stream.write_all(message.as_bytes()).await?;
        stream.shutdown().await?;
        debug!(bytes = message.len(), "notification sent");
        Ok(())
    }
}

fn require<F>(env: &F, key: &str) -> Result<String, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CoreError::Config {
            message: format!("Missing {key} in environment"),
        })
}
