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

//! Uploaded file binder

use async_trait::async_trait;
use log::debug;

use crate::error::BindingResult;
use crate::model::{ModelType, ModelValue};
use crate::registry::{
    ModelBinder, ModelBinderProvider, ModelBinderProviderContext, ModelBindingContext,
    ModelBindingResult, ProviderOutcome,
};
use crate::request::FormFile;

/// Shape of the bound files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFileShape {
    /// One `FormFile`
    Single,
    /// A `FormFileCollection`
    Collection,
    /// An array or list of `FormFile`
    List,
}

/// Copies the uploaded files submitted under the model name
#[derive(Debug, Clone, Copy)]
pub struct FormFileModelBinder {
    shape: FormFileShape,
}

impl FormFileModelBinder {
    /// Create a binder producing the given shape
    pub fn new(shape: FormFileShape) -> Self {
        Self { shape }
    }

    fn field_name(context: &ModelBindingContext<'_>) -> String {
        if context.is_top_level() {
            context
                .binder_model_name()
                .unwrap_or(context.field_name())
                .to_string()
        } else {
            context.model_name().to_string()
        }
    }
}

#[async_trait]
impl ModelBinder for FormFileModelBinder {
    async fn bind_model(&self, context: &mut ModelBindingContext<'_>) -> BindingResult<()> {
        let request = context.request();
        let name = Self::field_name(context);

        let mut files: Vec<FormFile> = Vec::new();
        if request.has_form_content_type() {
            let form = request.read_form().await?;
            files.extend(
                form.files_named(&name)
                    // Browsers post an empty part for an untouched file input.
                    .filter(|file| !(file.length() == 0 && file.file_name.is_empty()))
                    .cloned(),
            );
        }

        let model = match self.shape {
            FormFileShape::Single => match files.into_iter().next() {
                Some(file) => ModelValue::File(file),
                None => {
                    debug!("Found no file for model '{name}'");
                    return Ok(());
                }
            },
            FormFileShape::Collection => ModelValue::Files(files),
            FormFileShape::List => ModelValue::List(files.into_iter().map(ModelValue::File).collect()),
        };

        let key = context.model_name().to_string();
        context.validation_state().suppress_validation(&key);
        context.set_result(ModelBindingResult::Success(model));
        Ok(())
    }
}

/// Supplies [`FormFileModelBinder`] for file-typed models
#[derive(Debug, Clone, Copy, Default)]
pub struct FormFileModelBinderProvider;

impl ModelBinderProvider for FormFileModelBinderProvider {
    fn get_binder(
        &self,
        context: &mut ModelBinderProviderContext<'_>,
    ) -> BindingResult<ProviderOutcome> {
        let shape = match context.metadata().model_type().underlying_or_model_type() {
            ModelType::FormFile => FormFileShape::Single,
            ModelType::FormFileCollection => FormFileShape::Collection,
            other @ (ModelType::Array(_) | ModelType::List(_))
                if other.is_collection_of(&ModelType::FormFile) =>
            {
                FormFileShape::List
            }
            _ => return Ok(ProviderOutcome::Declined),
        };
        Ok(ProviderOutcome::binder(FormFileModelBinder::new(shape)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DefaultModelMetadataProvider;
    use crate::registry::binders::test_support::Harness;
    use crate::request::{FormCollection, RequestContext};
    use pretty_assertions::assert_eq;

    fn upload_request() -> RequestContext {
        RequestContext::builder()
            .form(
                FormCollection::new()
                    .with_file(FormFile::new("avatar", "me.png", "image/png", b"png".to_vec()))
                    .with_file(FormFile::new("docs", "a.txt", "text/plain", b"a".to_vec()))
                    .with_file(FormFile::new("docs", "b.txt", "text/plain", b"b".to_vec()))
                    .with_file(FormFile::new("docs", "", "application/octet-stream", Vec::new())),
            )
            .build()
    }

    #[tokio::test]
    async fn test_single_file() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let bound = harness
            .bind(&upload_request(), ModelType::FormFile, "avatar")
            .await;
        let Some(ModelBindingResult::Success(ModelValue::File(file))) = bound.result else {
            panic!("expected a bound file, got {:?}", bound.result);
        };
        assert_eq!(file.file_name, "me.png");
        assert!(bound.validation_state.is_suppressed("avatar"));

        let missing = harness
            .bind(&upload_request(), ModelType::FormFile, "photo")
            .await;
        assert_eq!(missing.result, None);
    }

    #[tokio::test]
    async fn test_repeated_names_bind_several_files() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let bound = harness
            .bind(&upload_request(), ModelType::FormFileCollection, "docs")
            .await;
        let Some(ModelBindingResult::Success(ModelValue::Files(files))) = bound.result else {
            panic!("expected bound files, got {:?}", bound.result);
        };
        let names: Vec<&str> = files.iter().map(|file| file.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let list = harness
            .bind(
                &upload_request(),
                ModelType::list(ModelType::FormFile),
                "docs",
            )
            .await;
        let model = list.result.and_then(ModelBindingResult::into_model).unwrap();
        assert_eq!(model.as_list().map(<[ModelValue]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_no_form_gives_empty_collection() {
        let harness = Harness::new(DefaultModelMetadataProvider::new());
        let request = RequestContext::builder().build();
        let bound = harness
            .bind(&request, ModelType::FormFileCollection, "docs")
            .await;
        assert_eq!(
            bound.result,
            Some(ModelBindingResult::Success(ModelValue::Files(Vec::new())))
        );
    }
}
