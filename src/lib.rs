/*
 * Topology - Container Service Topology Builder
 * Copyright (C) 2025 Topology Authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::doc_markdown)]

//! Topology builder core library
//!
//! Declares a container-service infrastructure topology (imported
//! network, cluster, task definitions, services, DNS service discovery,
//! public load balancer) as a typed resource graph and synthesizes it
//! into a template for an external deployment engine. No cloud I/O
//! happens here; creation, diffing, and reconciliation are the engine's
//! job.

pub mod config;
pub mod error;
pub mod graph;
pub mod naming;
pub mod topology;

// Re-export commonly used types
pub use config::TopologyConfig;
pub use error::{Error, Result};
pub use graph::{DeletionPolicy, Resource, ResourceGraph};
pub use naming::{generate_id, IdRegistry};
pub use topology::{Topology, TopologyBuilder};
