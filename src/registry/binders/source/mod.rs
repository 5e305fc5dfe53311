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

//! Binders reading a specific part of the request rather than the value
//! providers: headers, services, body, files, the raw form, the
//! cancellation token, plus the binder-type override

mod binder_type;
mod body;
mod cancellation_token;
mod form_collection;
mod form_file;
mod header;
mod services;

pub use binder_type::{
    BinderActivator, BinderTypeModelBinder, BinderTypeModelBinderProvider, BinderTypeRegistry,
};
pub use body::{BodyModelBinder, BodyModelBinderProvider};
pub use cancellation_token::{CancellationTokenModelBinder, CancellationTokenModelBinderProvider};
pub use form_collection::{FormCollectionModelBinder, FormCollectionModelBinderProvider};
pub use form_file::{FormFileModelBinder, FormFileModelBinderProvider, FormFileShape};
pub use header::{HeaderModelBinder, HeaderModelBinderProvider};
pub use services::{ServicesModelBinder, ServicesModelBinderProvider};
