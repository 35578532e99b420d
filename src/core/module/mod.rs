// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]

/// Auth module coordinator and builder.
pub mod coordinator;
/// Capability flags and optional capability references.
pub mod descriptor;
/// JSON query routes.
pub mod services;

pub use coordinator::{AuthModule, AuthModuleBuilder, ModuleError};
pub use descriptor::{ModuleCapabilities, ModuleDescriptor};
