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

//! Ante validation: an ordered list of stages deciding accept/reject for a
//! transaction before it can touch state.

/// Per-transaction execution context and gas meter.
pub mod context;
/// Stage contract and the ordered pipeline.
pub mod pipeline;
/// Signature verification stage (runs after the standard seven).
pub mod sigverify;
/// The standard stages, in pipeline order.
pub mod stages;

pub use context::{AnteContext, BlockEnv, ExecMode, GasInfo, GasMeter, SignerMeta};
pub use pipeline::{AnteError, AntePipeline, AnteStage, StageError};
