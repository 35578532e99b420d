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

/// Ante validation pipeline and its stages.
pub mod ante;
/// The auth module: params, keeper, genesis, migrations.
pub mod auth;
/// Consensus parameter assembly.
pub mod consensus;
/// Module coordinator and capability descriptor.
pub mod module;
/// Signature verification and sign bytes.
pub mod security;
/// Persistent and staged key-value state.
pub mod state;
/// Deterministic types and canonical encoding.
pub mod types;
/// Version migration registry and upgrade runner.
pub mod upgrade;
