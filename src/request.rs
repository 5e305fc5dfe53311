// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request representation consumed by binding
//!
//! The transport layer owns parsing of HTTP and multipart payloads; binding
//! only needs the already-split pieces collected in a [`RequestContext`].
//! The body and form are read lazily and buffered once per request.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::error::RequestError;
use crate::model::Culture;
use crate::services::{ServiceCollection, ServiceProvider};

const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Asynchronous source of the request body
#[async_trait]
pub trait BodyReader: Send + Sync {
    /// Read the entire body
    async fn read_to_end(&self) -> Result<Vec<u8>, RequestError>;
}

/// Body held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBody(Vec<u8>);

impl MemoryBody {
    /// Create a body from bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

#[async_trait]
impl BodyReader for MemoryBody {
    async fn read_to_end(&self) -> Result<Vec<u8>, RequestError> {
        Ok(self.0.clone())
    }
}

/// One uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormFile {
    /// Form field name
    pub name: String,
    /// Original file name
    pub file_name: String,
    /// Declared content type
    pub content_type: String,
    /// File content
    pub content: Vec<u8>,
}

impl FormFile {
    /// Create a file part
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Content length in bytes
    pub fn length(&self) -> usize {
        self.content.len()
    }

    /// JSON summary of the file without its content
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "fileName": self.file_name,
            "contentType": self.content_type,
            "length": self.length(),
        })
    }
}

/// Parsed form fields and files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormCollection {
    fields: IndexMap<String, Vec<String>>,
    files: Vec<FormFile>,
}

impl FormCollection {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `application/x-www-form-urlencoded` content
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            form.append(name.into_owned(), value.into_owned());
        }
        form
    }

    /// Add a field value, keeping earlier values of the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// Builder form of [`append`](Self::append)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// Add a file
    pub fn with_file(mut self, file: FormFile) -> Self {
        self.files.push(file);
        self
    }

    /// Field values in submission order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.fields.iter()
    }

    /// Values of one field
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// All files in submission order
    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    /// Files submitted under a field name, compared case-insensitively
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormFile> + 'a {
        self.files
            .iter()
            .filter(move |file| file.name.eq_ignore_ascii_case(name))
    }

    /// Whether the form has neither fields nor files
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// JSON view of the fields and file summaries
    pub fn to_json(&self) -> Value {
        let fields: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, values)| (name.clone(), Value::from(values.clone())))
            .collect();
        serde_json::json!({
            "fields": fields,
            "files": self.files.iter().map(FormFile::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Request headers with case-insensitive names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, Vec<String>>,
}

impl Headers {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// All values of a header
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }
}

/// The data of one request available to binding
pub struct RequestContext {
    query: Vec<(String, String)>,
    route_values: IndexMap<String, String>,
    headers: Headers,
    content_type: Option<String>,
    body_reader: Option<Arc<dyn BodyReader>>,
    preset_form: Option<FormCollection>,
    body: OnceCell<Vec<u8>>,
    form: OnceCell<FormCollection>,
    services: Arc<dyn ServiceProvider>,
    cancellation_token: CancellationToken,
    culture: Culture,
}

impl RequestContext {
    /// Start building a request
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Query string pairs in order
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Route values
    pub fn route_values(&self) -> &IndexMap<String, String> {
        &self.route_values
    }

    /// Request headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Content type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|content_type| {
            content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Full content type header
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether the content type carries form data
    pub fn has_form_content_type(&self) -> bool {
        matches!(
            self.media_type().as_deref(),
            Some(FORM_URL_ENCODED) | Some(MULTIPART_FORM_DATA)
        )
    }

    /// Request services
    pub fn services(&self) -> &dyn ServiceProvider {
        self.services.as_ref()
    }

    /// Token cancelled when the request is aborted
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Culture of the request
    pub fn culture(&self) -> &Culture {
        &self.culture
    }

    /// Read and buffer the body; later calls return the buffer
    pub async fn read_body(&self) -> Result<&[u8], RequestError> {
        let body = self
            .body
            .get_or_try_init(|| async {
                match &self.body_reader {
                    Some(reader) => reader.read_to_end().await,
                    None => Ok(Vec::new()),
                }
            })
            .await?;
        Ok(body.as_slice())
    }

    /// Read and buffer the form
    ///
    /// A request without a form content type yields an empty form.
    /// Multipart payloads must be supplied pre-parsed by the transport.
    pub async fn read_form(&self) -> Result<&FormCollection, RequestError> {
        self.form
            .get_or_try_init(|| async {
                if let Some(form) = &self.preset_form {
                    return Ok(form.clone());
                }

                match self.media_type().as_deref() {
                    Some(FORM_URL_ENCODED) => {
                        let body = self.read_body().await?;
                        Ok(FormCollection::from_urlencoded(body))
                    }
                    Some(MULTIPART_FORM_DATA) => Err(RequestError::form_read(
                        "multipart content was not parsed by the transport",
                    )),
                    _ => Ok(FormCollection::new()),
                }
            })
            .await
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("query", &self.query)
            .field("route_values", &self.route_values)
            .field("headers", &self.headers)
            .field("content_type", &self.content_type)
            .field("culture", &self.culture.name())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestContext`]
#[derive(Default)]
pub struct RequestContextBuilder {
    query: Vec<(String, String)>,
    route_values: IndexMap<String, String>,
    headers: Headers,
    content_type: Option<String>,
    body_reader: Option<Arc<dyn BodyReader>>,
    preset_form: Option<FormCollection>,
    services: Option<Arc<dyn ServiceProvider>>,
    cancellation_token: Option<CancellationToken>,
    culture: Option<Culture>,
}

impl RequestContextBuilder {
    /// Add a query pair
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Parse a raw query string, with or without the leading `?`
    pub fn query_string(mut self, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.query.push((name.into_owned(), value.into_owned()));
        }
        self
    }

    /// Add a route value
    pub fn route_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(name.into(), value.into());
        self
    }

    /// Add a header value
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.clone());
        }
        self.headers.append(name, value);
        self
    }

    /// Set the content type
    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    /// Use an in-memory body
    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        self.body_reader(MemoryBody::new(body))
    }

    /// Use a custom body reader
    pub fn body_reader(mut self, reader: impl BodyReader + 'static) -> Self {
        self.body_reader = Some(Arc::new(reader));
        self
    }

    /// Supply an already parsed form, typically multipart
    pub fn form(mut self, form: FormCollection) -> Self {
        if self.content_type.is_none() {
            self = self.content_type(MULTIPART_FORM_DATA);
        }
        self.preset_form = Some(form);
        self
    }

    /// Set the request services
    pub fn services(mut self, services: Arc<dyn ServiceProvider>) -> Self {
        self.services = Some(services);
        self
    }

    /// Set the cancellation token
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Set the request culture
    pub fn culture(mut self, culture: Culture) -> Self {
        self.culture = Some(culture);
        self
    }

    /// Build the request
    pub fn build(self) -> RequestContext {
        RequestContext {
            query: self.query,
            route_values: self.route_values,
            headers: self.headers,
            content_type: self.content_type,
            body_reader: self.body_reader,
            preset_form: self.preset_form,
            body: OnceCell::new(),
            form: OnceCell::new(),
            services: self
                .services
                .unwrap_or_else(|| Arc::new(ServiceCollection::new())),
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            culture: self.culture.unwrap_or_default(),
        }
    }
}
