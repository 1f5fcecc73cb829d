/* This file is part of the Caption Relay project
*
*  Copyright (C) 2025 mini_bomba
*  
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::{fmt::Display, ops::RangeInclusive};

use anyhow::{anyhow, Context};
use reqwest::Url;

use crate::{constants::*, state::ProxyConfig};

/// A single proxy the extraction engine should route through
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    url: Url,
}

impl ProxyEndpoint {
    pub fn parse(url: &str) -> anyhow::Result<ProxyEndpoint> {
        let url = Url::parse(url).context("Failed to parse the proxy URL")?;
        if url.host_str().is_none() {
            return Err(anyhow!("Proxy URL has no host"));
        }
        Ok(ProxyEndpoint { url })
    }

    /// Build an `http://` endpoint, percent-encoding the credentials
    pub fn with_credentials(host: &str, port: u16, user: &str, pass: &str) -> anyhow::Result<ProxyEndpoint> {
        let mut url = Url::parse(&format!("http://{host}:{port}")).with_context(|| format!("Invalid proxy host {host}"))?;
        url.set_username(user).map_err(|()| anyhow!("Proxy URL cannot carry credentials"))?;
        url.set_password(Some(pass)).map_err(|()| anyhow!("Proxy URL cannot carry credentials"))?;
        Ok(ProxyEndpoint { url })
    }

    /// Full URL, including the credentials
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// `host:port`, safe to log
    pub fn redacted(&self) -> String {
        match (self.url.host_str(), self.url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            _ => "<unknown>".to_owned(),
        }
    }
}

// never print credentials, not even in debug output
impl std::fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProxyEndpoint").field(&self.redacted()).finish()
    }
}

pub enum ProxySelector {
    Disabled,
    Fixed(ProxyEndpoint),
    /// A gateway handing out a different exit address per port
    Rotating {
        host: String,
        user: String,
        pass: String,
        ports: RangeInclusive<u16>,
    },
}

impl ProxySelector {
    /// Resolve the proxy mode.
    ///
    /// `PROXY_URL` wins, then a full set of `PROXY_HOST`/`PROXY_PORT`/`PROXY_USER`/`PROXY_PASS`,
    /// then the rotating pool from the config file. Empty variables count as unset.
    pub fn from_config(config: &ProxyConfig, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<ProxySelector> {
        let var = |name: &str| env(name).filter(|v| !v.is_empty());

        if let Some(url) = var(PROXY_URL_VAR) {
            let endpoint = ProxyEndpoint::parse(&url).with_context(|| format!("Invalid {PROXY_URL_VAR}"))?;
            return Ok(ProxySelector::Fixed(endpoint));
        }
        if let (Some(host), Some(port), Some(user), Some(pass)) = (var(PROXY_HOST_VAR), var(PROXY_PORT_VAR), var(PROXY_USER_VAR), var(PROXY_PASS_VAR)) {
            let port: u16 = port.trim().parse().with_context(|| format!("Invalid {PROXY_PORT_VAR}: {port}"))?;
            let endpoint = ProxyEndpoint::with_credentials(&host, port, &user, &pass)?;
            return Ok(ProxySelector::Fixed(endpoint));
        }
        if let Some(ref rotating) = config.rotating {
            // fail at startup rather than on the first request
            ProxyEndpoint::with_credentials(&rotating.host, rotating.port_start, &rotating.user, &rotating.pass)
                .context("Invalid rotating proxy configuration")?;
            return Ok(ProxySelector::Rotating {
                host: rotating.host.clone(),
                user: rotating.user.clone(),
                pass: rotating.pass.clone(),
                ports: rotating.port_start..=rotating.port_end,
            });
        }
        Ok(ProxySelector::Disabled)
    }

    pub fn from_env(config: &ProxyConfig) -> anyhow::Result<ProxySelector> {
        Self::from_config(config, |name| std::env::var(name).ok())
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ProxySelector::Disabled)
    }

    /// Pick the proxy for the next engine call
    pub fn select(&self) -> anyhow::Result<Option<ProxyEndpoint>> {
        match self {
            ProxySelector::Disabled => Ok(None),
            ProxySelector::Fixed(endpoint) => Ok(Some(endpoint.clone())),
            ProxySelector::Rotating { host, user, pass, ports } => {
                let port = random_port(ports)?;
                ProxyEndpoint::with_credentials(host, port, user, pass).map(Some)
            },
        }
    }
}

impl Display for ProxySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxySelector::Disabled => write!(f, "disabled"),
            ProxySelector::Fixed(endpoint) => write!(f, "fixed ({})", endpoint.redacted()),
            ProxySelector::Rotating { host, ports, .. } => write!(f, "rotating ({host}:{}-{})", ports.start(), ports.end()),
        }
    }
}

fn random_port(ports: &RangeInclusive<u16>) -> anyhow::Result<u16> {
    let (start, end) = (*ports.start(), *ports.end());
    if start >= end {
        return Ok(start);
    }
    let mut buffer = [0u8; 8];
    getrandom::fill(&mut buffer).map_err(|e| anyhow!("Failed to get random bytes: {e}"))?;
    let span = u64::from(end - start) + 1;
    let offset = u64::from_le_bytes(buffer) % span;
    // offset < span <= u16::MAX + 1, so this always fits
    Ok(start + u16::try_from(offset).context("Random port offset out of range")?)
}
