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

use std::path::PathBuf;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PROXY_PORTS, USER_AGENT};

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen: ListenConfig,
    pub extractor: ExtractorConfig,
    pub proxy: ProxyConfig,
    pub cookies: CookieConfig,
    pub enable_timings_header: bool,
    #[serde(skip)]
    pub startup_timestamp: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            extractor: ExtractorConfig::default(),
            proxy: ProxyConfig::default(),
            cookies: CookieConfig::default(),
            enable_timings_header: false,
            startup_timestamp: Utc::now(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listen.tcp.is_none() && self.listen.unix.is_none() {
            bail!("Invalid configuration - no tcp port or unix socket path specified");
        }
        if let Some(ref rotating) = self.proxy.rotating {
            if rotating.port_start > rotating.port_end {
                bail!("Invalid configuration - proxy.rotating.port_start ({}) is greater than port_end ({})", rotating.port_start, rotating.port_end);
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ListenConfig {
    pub tcp: Option<(String, u16)>,
    pub unix: Option<String>,
    pub unix_mode: Option<u32>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            tcp: Some(("0.0.0.0".to_owned(), 8000)),
            unix: None,
            unix_mode: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub ytdlp_path: PathBuf,
    pub user_agent: String,
    /// Pass `--verbose` to yt-dlp instead of silencing it
    pub verbose: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            user_agent: USER_AGENT.to_owned(),
            verbose: true,
        }
    }
}

/// Proxy settings from the config file.
///
/// The `PROXY_*` environment variables take precedence over anything set here.
#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    pub rotating: Option<RotatingProxyConfig>,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct RotatingProxyConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    #[serde(default = "default_port_start")]
    pub port_start: u16,
    #[serde(default = "default_port_end")]
    pub port_end: u16,
}

fn default_port_start() -> u16 {
    *DEFAULT_PROXY_PORTS.start()
}

fn default_port_end() -> u16 {
    *DEFAULT_PROXY_PORTS.end()
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Checked in order, the first existing file is used
    pub candidates: Vec<PathBuf>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            candidates: vec![PathBuf::from("cookies.txt"), PathBuf::from("/app/cookies.txt")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let serialized = toml::to_string(&AppConfig::default()).unwrap();
        let cfg: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg.listen.tcp, Some(("0.0.0.0".to_owned(), 8000)));
        assert_eq!(cfg.extractor.ytdlp_path, PathBuf::from("yt-dlp"));
        assert!(cfg.proxy.rotating.is_none());
        assert_eq!(cfg.cookies.candidates.len(), 2);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_partial_config() {
        let cfg: AppConfig = toml::from_str(r#"
            enable_timings_header = true

            [proxy.rotating]
            host = "gw.example.net"
            user = "u"
            pass = "p"
        "#).unwrap();
        assert!(cfg.enable_timings_header);
        assert_eq!(cfg.extractor.user_agent, USER_AGENT);
        let rotating = cfg.proxy.rotating.as_ref().unwrap();
        assert_eq!((rotating.port_start, rotating.port_end), (10001, 10010));
        cfg.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut cfg = AppConfig::default();
        cfg.listen.tcp = None;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.proxy.rotating = Some(RotatingProxyConfig {
            host: "gw.example.net".to_owned(),
            user: "u".to_owned(),
            pass: "p".to_owned(),
            port_start: 20,
            port_end: 10,
        });
        assert!(cfg.validate().is_err());
    }
}
