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

//! Asynchronous value provider factories

use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::sync::Arc;

use super::ValueProvider;
use super::jquery::JQueryFormValueProvider;
use super::source::SourceValueProvider;
use crate::error::RequestError;
use crate::request::RequestContext;

/// Creates a value provider for a request
///
/// Returning `Ok(None)` means the request carries no data for this factory.
#[async_trait]
pub trait ValueProviderFactory: Send + Sync + fmt::Debug {
    /// Create the provider, reading request data as needed
    async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, RequestError>;
}

/// Form fields; the form is read once and converted with the request culture
#[derive(Debug, Clone, Copy, Default)]
pub struct FormValueProviderFactory;

#[async_trait]
impl ValueProviderFactory for FormValueProviderFactory {
    async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, RequestError> {
        if !request.has_form_content_type() {
            return Ok(None);
        }

        let form = request.read_form().await?;
        debug!("Creating form value provider with {} files", form.files().len());
        Ok(Some(Arc::new(SourceValueProvider::form(
            form,
            request.culture().clone(),
        ))))
    }
}

/// Route values, converted with the invariant culture
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteValueProviderFactory;

#[async_trait]
impl ValueProviderFactory for RouteValueProviderFactory {
    async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, RequestError> {
        Ok(Some(Arc::new(SourceValueProvider::route(request))))
    }
}

/// Query string values, converted with the invariant culture
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStringValueProviderFactory;

#[async_trait]
impl ValueProviderFactory for QueryStringValueProviderFactory {
    async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, RequestError> {
        if request.query().is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(SourceValueProvider::query(request))))
    }
}

/// Form fields posted in jQuery bracket notation
#[derive(Debug, Clone, Copy, Default)]
pub struct JQueryFormValueProviderFactory;

#[async_trait]
impl ValueProviderFactory for JQueryFormValueProviderFactory {
    async fn create_value_provider(
        &self,
        request: &RequestContext,
    ) -> Result<Option<Arc<dyn ValueProvider>>, RequestError> {
        if !request.has_form_content_type() {
            return Ok(None);
        }

        let form = request.read_form().await?;
        Ok(Some(Arc::new(JQueryFormValueProvider::new(
            form,
            request.culture().clone(),
        ))))
    }
}

/// Factories in priority order: form, route, query string, jQuery form
pub fn create_standard_value_provider_factories() -> Vec<Arc<dyn ValueProviderFactory>> {
    vec![
        Arc::new(FormValueProviderFactory),
        Arc::new(RouteValueProviderFactory),
        Arc::new(QueryStringValueProviderFactory),
        Arc::new(JQueryFormValueProviderFactory),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Culture;

    #[tokio::test]
    async fn test_form_factory_requires_form_content() {
        let request = RequestContext::builder().query("a", "1").build();
        let provider = FormValueProviderFactory
            .create_value_provider(&request)
            .await
            .unwrap();
        assert!(provider.is_none());

        let provider = QueryStringValueProviderFactory
            .create_value_provider(&request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(provider.get_value("a").first_value(), Some("1"));
    }

    #[tokio::test]
    async fn test_form_factory_uses_request_culture() {
        let german = Culture::from_name("de-DE").unwrap();
        let request = RequestContext::builder()
            .content_type("application/x-www-form-urlencoded")
            .body("price=1%2C5")
            .culture(german.clone())
            .build();

        let provider = FormValueProviderFactory
            .create_value_provider(&request)
            .await
            .unwrap()
            .unwrap();
        let value = provider.get_value("price");
        assert_eq!(value.first_value(), Some("1,5"));
        assert_eq!(value.culture(), Some(&german));
    }

    #[tokio::test]
    async fn test_form_read_error_propagates() {
        let request = RequestContext::builder()
            .content_type("multipart/form-data; boundary=x")
            .build();
        let result = JQueryFormValueProviderFactory
            .create_value_provider(&request)
            .await;
        assert!(matches!(result, Err(RequestError::FormRead { .. })));
    }

    #[test]
    fn test_standard_factory_order() {
        let names: Vec<String> = create_standard_value_provider_factories()
            .iter()
            .map(|factory| format!("{factory:?}"))
            .collect();
        assert_eq!(
            names,
            vec![
                "FormValueProviderFactory",
                "RouteValueProviderFactory",
                "QueryStringValueProviderFactory",
                "JQueryFormValueProviderFactory",
            ]
        );
    }
}
