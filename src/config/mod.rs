// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod settings;
mod topology;


pub use loader::{load_and_validate_topology, load_topology, parse_topology};
pub use registry::{TaskConstructor, TaskRegistry};
pub use settings::TaskSettings;
pub use topology::{FanOutPolicy, NodeSpec, ObserverDelivery, PipelineOptions, PipelineTopology};
