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

//! The auth module: accounts, params, genesis and store migrations.

/// Genesis state and the genesis contract of the module store.
pub mod genesis;
/// Account keeper over the module store.
pub mod keeper;
/// Store migrations 1→2 … 4→5.
pub mod migrations;
/// Module parameters.
pub mod params;
/// Randomized genesis for simulation.
pub mod simulation;

/// Module name, also the store prefix and the versioning-table key.
pub const MODULE_NAME: &str = "auth";

/// Current consensus version of the module store layout.
pub const CONSENSUS_VERSION: u64 = 5;
