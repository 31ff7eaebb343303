//! Request method plus the strategy that produces the request body.

use url::form_urlencoded;

use crate::error::SocketError;
use crate::http::HttpMethod;
use crate::socket::Socket;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// No body; any parameters already live in the URL query.
    Query { method: HttpMethod },
    /// `application/x-www-form-urlencoded` fields, in the given order.
    Form {
        method: HttpMethod,
        fields: Vec<(String, String)>,
    },
    /// An opaque body with an explicit content type.
    Raw {
        method: HttpMethod,
        content_type: String,
        body: Vec<u8>,
    },
}

impl Encoding {
    pub fn get() -> Self {
        Encoding::Query {
            method: HttpMethod::Get,
        }
    }

    pub fn head() -> Self {
        Encoding::Query {
            method: HttpMethod::Head,
        }
    }

    pub fn delete() -> Self {
        Encoding::Query {
            method: HttpMethod::Delete,
        }
    }

    /// A form POST.
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Encoding::Form {
            method: HttpMethod::Post,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn raw(method: HttpMethod, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Encoding::Raw {
            method,
            content_type: content_type.to_string(),
            body: body.into(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Encoding::Query { method }
            | Encoding::Form { method, .. }
            | Encoding::Raw { method, .. } => *method,
        }
    }

    pub fn body(&self) -> Vec<u8> {
        match self {
            Encoding::Query { .. } => Vec::new(),
            Encoding::Form { fields, .. } => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish()
                .into_bytes(),
            Encoding::Raw { body, .. } => body.clone(),
        }
    }

    /// Header lines describing the body, without line terminators.
    pub fn header_lines(&self) -> Vec<String> {
        let content_type = match self {
            Encoding::Query { .. } => return Vec::new(),
            Encoding::Form { .. } => FORM_CONTENT_TYPE,
            Encoding::Raw { content_type, .. } => content_type.as_str(),
        };
        vec![
            format!("Content-Length: {}", self.body().len()),
            format!("Content-Type: {content_type}"),
        ]
    }

    pub fn write_headers_to(&self, socket: &mut Socket) -> Result<(), SocketError> {
        for line in self.header_lines() {
            socket.write(format!("{line}\r\n").as_bytes())?;
        }
        Ok(())
    }

    pub fn write_to(&self, socket: &mut Socket) -> Result<(), SocketError> {
        let body = self.body();
        if body.is_empty() {
            return Ok(());
        }
        socket.write(&body)
    }
}
