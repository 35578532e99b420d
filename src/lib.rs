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
#![warn(missing_docs)]

//! Amunchain module kit - the integration protocol between a pluggable
//! state-machine module and its host runtime.
//!
//! This repository provides:
//! - An ordered ante validation pipeline deciding transaction accept/reject before state mutation
//! - A version migration registry walking a module's store one version at a time, committed atomically
//! - An all-or-nothing consensus parameter assembler
//! - The auth module coordinator binding the three to genesis, services and simulation hooks
//! - Monitoring via Prometheus metrics and structured logging

/// Node configuration (TOML).
pub mod config;
/// Core protocol primitives (types, ante pipeline, upgrades, consensus params, state).
pub mod core;
/// Observability (metrics, logging setup).
pub mod monitoring;
