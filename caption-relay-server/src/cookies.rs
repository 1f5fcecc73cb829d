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

use std::{fmt::Display, path::{Path, PathBuf}};

/// Result of the one-time lookup for a cookie jar, fixed for the lifetime of the process
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieSource {
    path: Option<PathBuf>,
}

impl CookieSource {
    /// Take the first candidate that exists and is a regular file
    pub fn probe<P: AsRef<Path>>(candidates: &[P]) -> CookieSource {
        CookieSource {
            path: candidates.iter()
                .map(AsRef::<Path>::as_ref)
                .find(|p| p.is_file())
                .map(Path::to_path_buf),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }
}

impl Display for CookieSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path {
            Some(ref path) => write!(f, "Cookies: Found at {}", path.display()),
            None => write!(f, "Cookies: NOT FOUND"),
        }
    }
}
