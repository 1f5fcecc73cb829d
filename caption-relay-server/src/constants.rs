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
use std::ops::RangeInclusive;

pub const CONFIG_PATH: &str = "config.toml";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// residential proxy gateways hand out a different exit IP per port
pub const DEFAULT_PROXY_PORTS: RangeInclusive<u16> = 10001..=10010;

pub const PROXY_URL_VAR: &str = "PROXY_URL";
pub const PROXY_HOST_VAR: &str = "PROXY_HOST";
pub const PROXY_PORT_VAR: &str = "PROXY_PORT";
pub const PROXY_USER_VAR: &str = "PROXY_USER";
pub const PROXY_PASS_VAR: &str = "PROXY_PASS";

pub const INVALID_URL_MSG: &str = "Invalid YouTube URL";
pub const NO_CAPTIONS_MSG: &str = "No captions available for this video.";
pub const NO_DOCUMENT_URL_MSG: &str = "Could not find subtitle URL";
