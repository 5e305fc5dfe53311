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

//! Provider resolution, recursion and value provider filtering

use async_trait::async_trait;
use model_binding::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

mod utils;
use utils::{engine, engine_with, fixture_metadata, init_logging};

#[derive(Debug)]
struct ConstantBinder(&'static str);

#[async_trait]
impl ModelBinder for ConstantBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        context.set_result(ModelBindingResult::Success(ModelValue::from(self.0)));
        Ok(())
    }
}

#[derive(Debug)]
struct ConstantProvider(&'static str);

impl ModelBinderProvider for ConstantProvider {
    fn get_binder(
        &self,
        _context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        Ok(ProviderOutcome::binder(ConstantBinder(self.0)))
    }
}

async fn bind_with_providers(providers: Vec<Arc<dyn ModelBinderProvider>>) -> Option<ModelValue> {
    init_logging();
    let engine = ModelBindingEngine::builder().providers(providers).build();
    let request = RequestContext::builder().build();
    let bound = engine
        .bind_arguments(&request, &[ParameterDescriptor::new("value", ModelType::string())])
        .await
        .unwrap();
    bound.get("value").cloned()
}

#[tokio::test]
async fn test_first_matching_provider_wins() {
    let a: Arc<dyn ModelBinderProvider> = Arc::new(ConstantProvider("A"));
    let b: Arc<dyn ModelBinderProvider> = Arc::new(ConstantProvider("B"));

    assert_eq!(
        bind_with_providers(vec![a.clone(), b.clone()]).await,
        Some(ModelValue::from("A"))
    );
    assert_eq!(
        bind_with_providers(vec![b, a]).await,
        Some(ModelValue::from("B"))
    );
}

#[tokio::test]
async fn test_no_provider_leaves_parameter_unbound() {
    assert_eq!(bind_with_providers(Vec::new()).await, None);
}

#[tokio::test]
async fn test_self_referential_type_binds_and_terminates() {
    let request = RequestContext::builder()
        .query_string("node.Value=1&node.Next.Value=2&node.Children[0].Value=3")
        .build();
    let bound = engine()
        .bind_arguments(&request, &[ParameterDescriptor::new("node", ModelType::complex("Node"))])
        .await
        .unwrap();

    let node = bound.get("node").and_then(ModelValue::as_object).unwrap();
    assert_eq!(node.get("Value"), Some(&ModelValue::Integer(1)));

    let next = node.get("Next").and_then(ModelValue::as_object).unwrap();
    assert_eq!(next.get("Value"), Some(&ModelValue::Integer(2)));
    assert_eq!(next.get("Next"), Some(&ModelValue::Null));

    let children = node.get("Children").and_then(ModelValue::as_list).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0].as_object().and_then(|child| child.get("Value")),
        Some(&ModelValue::Integer(3))
    );
}

#[tokio::test]
async fn test_recursion_depth_is_bounded() {
    let engine = engine_with(BindingOptions {
        max_model_binding_recursion_depth: 3,
        ..BindingOptions::default()
    });
    let request = RequestContext::builder()
        .query("node.Next.Next.Next.Value", "4")
        .build();
    let error = engine
        .bind_arguments(&request, &[ParameterDescriptor::new("node", ModelType::complex("Node"))])
        .await
        .expect_err("the chain is deeper than allowed");
    assert!(matches!(
        error,
        BindingError::RecursionDepthExceeded { max_depth: 3, .. }
    ));
}

#[tokio::test]
async fn test_value_providers_are_filtered_by_binding_source() {
    let request = RequestContext::builder()
        .route_value("id", "7")
        .query("id", "9")
        .build();
    let parameter = |source: Option<BindingSource>| {
        let info = match source {
            Some(source) => BindingInfo::default().with_source(source),
            None => BindingInfo::default(),
        };
        [ParameterDescriptor::new("id", ModelType::int32()).with_binding_info(info)]
    };

    let engine = engine();
    for (source, expected) in [
        (Some(BindingSource::Query), 9),
        (Some(BindingSource::Path), 7),
        // Route values come before the query string.
        (None, 7),
    ] {
        let bound = engine
            .bind_arguments(&request, &parameter(source.clone()))
            .await
            .unwrap();
        assert_eq!(
            bound.get("id"),
            Some(&ModelValue::Integer(expected)),
            "source {source:?}"
        );
    }

    let bound = engine
        .bind_arguments(&request, &parameter(Some(BindingSource::Form)))
        .await
        .unwrap();
    assert_eq!(bound.get("id"), None);
}

#[tokio::test]
async fn test_property_sources_narrow_nested_binds() {
    let metadata = fixture_metadata().with_complex_type(
        ComplexTypeDefinition::new("Lookup")
            .property(PropertyDefinition::new("Id", ModelType::int32()).from_route())
            .property(PropertyDefinition::new("Term", ModelType::string()).from_query()),
    );
    let engine = ModelBindingEngine::builder()
        .metadata_provider(Arc::new(metadata))
        .build();
    let request = RequestContext::builder()
        .route_value("Id", "7")
        .query_string("Id=9&Term=rust")
        .build();

    let bound = engine
        .bind_arguments(&request, &[ParameterDescriptor::new("lookup", ModelType::complex("Lookup"))])
        .await
        .unwrap();
    let lookup = bound.get("lookup").and_then(ModelValue::as_object).unwrap();
    assert_eq!(lookup.get("Id"), Some(&ModelValue::Integer(7)));
    assert_eq!(lookup.get("Term"), Some(&ModelValue::from("rust")));
}

#[tokio::test]
async fn test_binder_type_override_through_engine() {
    let binder_types = BinderTypeRegistry::new();
    binder_types.register_binder("constant", Arc::new(ConstantBinder("fixed")));
    let engine = ModelBindingEngine::builder()
        .binder_types(binder_types)
        .build();
    let request = RequestContext::builder().query("value", "ignored").build();
    let parameters = [ParameterDescriptor::new("value", ModelType::string())
        .with_binding_info(BindingInfo::default().with_binder_type("constant"))];

    let bound = engine.bind_arguments(&request, &parameters).await.unwrap();
    assert_eq!(bound.get("value"), Some(&ModelValue::from("fixed")));

    let unknown = [ParameterDescriptor::new("value", ModelType::string())
        .with_binding_info(BindingInfo::default().with_binder_type("missing"))];
    let error = engine
        .bind_arguments(&request, &unknown)
        .await
        .expect_err("unknown binder names fail on first use");
    assert_eq!(error, BindingError::unknown_binder_type("missing"));
}
