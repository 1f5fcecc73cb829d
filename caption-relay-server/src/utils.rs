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
use std::fmt::{Debug, Display};

use actix_web::{http::{header::{HeaderMap, TryIntoHeaderPair}, StatusCode}, HttpResponse, ResponseError};
use caption_relay_api::ErrorResponse;

use crate::pipeline::{ErrorKind, PipelineError};


pub enum Error {
    Anyhow(anyhow::Error, StatusCode),
    Detail(String, StatusCode),
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Anyhow(ref err, _) => Debug::fmt(err, f),
            Error::Detail(ref detail, status) => f.debug_tuple("Error::Detail").field(detail).field(status).finish(),
        }
    }
}
impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Anyhow(ref err, _) => write!(f, "{err:#}"),
            Error::Detail(ref detail, _) => write!(f, "{detail}"),
        }
    }
}
impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value, StatusCode::INTERNAL_SERVER_ERROR)
    }
}
impl From<PipelineError> for Error {
    fn from(value: PipelineError) -> Self {
        let status = match value.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Error::Detail(value.detail, status)
    }
}
impl std::error::Error for Error {}
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        let (Error::Anyhow(_, status) | Error::Detail(_, status)) = self;
        *status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

impl Error {
    pub fn set_status(self, status: StatusCode) -> Self {
        match self {
            Error::Anyhow(err, _) => Error::Anyhow(err, status),
            Error::Detail(detail, _) => Error::Detail(detail, status),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait HeaderMapExt {
    fn append_header<H: TryIntoHeaderPair>(&mut self, header: H) -> std::result::Result<(), H::Error>;
}

impl HeaderMapExt for HeaderMap {
    fn append_header<H: TryIntoHeaderPair>(&mut self, header: H) -> std::result::Result<(), H::Error> {
        let (name, value) = header.try_into_pair()?;
        self.append(name, value);
        Ok(())
    }
}
