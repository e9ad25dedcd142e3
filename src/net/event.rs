use std::{
    fmt,
    io::{self, Read},
};

use http::{Method, StatusCode};

use crate::{
    error::{AdapterError, HandlerError},
    net::response::{Response, ResponseWriter},
};

/// An invocation as delivered by the hosting runtime. Only HTTP-triggered
/// events can be served by the handlers.
#[derive(Debug)]
pub enum InboundEvent {
    Http(HttpEvent),
    Other { kind: String },
}

impl InboundEvent {
    pub fn other(kind: impl Into<String>) -> Self {
        InboundEvent::Other { kind: kind.into() }
    }

    /// Narrows the event to its HTTP request.
    pub fn http(self) -> Result<HttpEvent, AdapterError> {
        match self {
            InboundEvent::Http(event) => Ok(event),
            InboundEvent::Other { kind } => Err(AdapterError { kind }),
        }
    }
}

impl From<HttpEvent> for InboundEvent {
    fn from(event: HttpEvent) -> Self {
        InboundEvent::Http(event)
    }
}

/// Request body stream. Dropping it closes the underlying reader.
pub struct Body {
    inner: Box<dyn Read + Send>,
}

impl Body {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Body { inner: Box::new(reader) }
    }

    pub fn empty() -> Self {
        Body::new(io::empty())
    }

    /// A body whose first read fails with `err`, for transports that could not
    /// receive the payload.
    pub fn failed(err: io::Error) -> Self {
        Body::new(FailedRead(Some(err)))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body")
    }
}

struct FailedRead(Option<io::Error>);

impl Read for FailedRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(self.0.take().unwrap_or_else(|| io::Error::other("request body unavailable")))
    }
}

/// Decoded query string, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn parse(raw: &str) -> Self {
        Query(url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
    }

    /// First value of `name`. A present but empty parameter is returned as
    /// an empty string.
    pub fn get(&self, name: &'static str) -> Result<&str, HandlerError> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or(HandlerError::MissingQuery(name))
    }
}

/// HTTP request (method, path, query, body) plus the response surface the
/// handler writes to.
#[derive(Debug)]
pub struct HttpEvent {
    method: Method,
    path: String,
    query: Query,
    body: Option<Body>,
    response: ResponseWriter,
}

impl HttpEvent {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        HttpEvent {
            method,
            path: path.into(),
            query: Query::default(),
            body: None,
            response: ResponseWriter::new(),
        }
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = Query::parse(raw);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Moves the body stream out of the request. Later calls get an empty body.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_else(Body::empty)
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    pub fn finish(self, status: StatusCode) -> Response {
        self.response.finish(status)
    }
}
