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

use std::{fs::{File, Permissions, set_permissions}, io::{Read, Write, self}, os::unix::prelude::PermissionsExt, sync::Arc};
use actix_web::{HttpServer, App, web, middleware::{Logger, NormalizePath}};
use anyhow::Context;
use env_logger::Env;
use log::{info, warn};

mod cache;
mod constants;
mod cookies;
mod middleware;
mod pipeline;
mod proxy;
mod routes;
mod source;
mod state;
mod utils;
mod video_id;
mod ytdlp;
use constants::CONFIG_PATH;
use state::AppConfig;


#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config: web::Data<AppConfig> = web::Data::new(match File::open(CONFIG_PATH) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents).with_context(|| format!("Failed to read {CONFIG_PATH}"))?;
            let cfg: AppConfig = toml::from_str(&contents).with_context(|| format!("Failed to deserialize contents of {CONFIG_PATH}"))?;
            cfg.validate()?;
            cfg
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let cfg = AppConfig::default();
            let serialized = toml::to_string(&cfg).context("Failed to serialize default AppConfig as TOML")?;
            let mut file = File::options().write(true).create_new(true).open(CONFIG_PATH).with_context(|| format!("Failed to create {CONFIG_PATH}"))?;
            write!(file, "{serialized}").with_context(|| format!("Failed to write serialized default AppConfig to {CONFIG_PATH}"))?;
            info!("Wrote the default configuration to {CONFIG_PATH}");
            cfg
        },
        Err(e) => {
            return Err(e).context(format!("Failed to open {CONFIG_PATH}"));
        }
    });
    info!("Caption Relay v{} starting", built_info::PKG_VERSION);

    let proxies = proxy::ProxySelector::from_env(&config.proxy).context("Failed to set up the proxy")?;
    info!("Proxy: {proxies}");
    let cookies = cookies::CookieSource::probe(&config.cookies.candidates);
    match cookies.path() {
        Some(path) if proxies.is_enabled() => info!("Cookies found at {}, but they won't be used while a proxy is enabled", path.display()),
        Some(path) => info!("Cookies found at {}", path.display()),
        None => warn!("No cookie file found, requests will be anonymous"),
    }
    let ytdlp = ytdlp::YtDlp::new(config.extractor.ytdlp_path.clone()).await;
    info!("Using yt-dlp {} ({})", source::CaptionSource::version(&ytdlp), config.extractor.ytdlp_path.display());

    let service = web::Data::new(
        pipeline::TranscriptService::new(Arc::new(ytdlp), proxies, cookies, &config.extractor)
            .context("Failed to set up the transcript service")?
    );

    let mut server = {
        let config = config.clone();
        HttpServer::new(move || {
            App::new()
                .wrap(middleware::Timings)
                .wrap(Logger::default())
                .wrap(NormalizePath::trim())
                .app_data(config.clone())
                .app_data(service.clone())
                .configure(routes::configure)
        })
    };
    if let Some((ref ip, port)) = config.listen.tcp {
        let ip_str = ip.as_str();
        server = server.bind((ip_str, port)).with_context(|| format!("Failed to bind to tcp port {ip_str}:{port}"))?;
        info!("Listening on {ip_str}:{port}");
    };
    if let Some(ref path) = config.listen.unix {
        let path_str = path.as_str();
        server = server.bind_uds(path_str).with_context(|| format!("Failed to bind to unix socket {path_str}"))?;
        if let Some(mode) = config.listen.unix_mode {
            let perms = Permissions::from_mode(mode);
            set_permissions(path_str, perms).with_context(|| format!("Failed to change mode of unix socket {path_str} to {mode}"))?;
        }
        info!("Listening on {path_str}");
    };
    server.run()
    .await
    .context("Error while running the server")
}

mod built_info {
    // Contents generated by buildscript, using built
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
