//! Shared log sink.
//!
//! One retention-bounded log group per topology. Every container logs
//! through the same `awslogs` driver pointed at it, with a common stream
//! prefix.

use serde_json::{json, Value};
use tracing::debug;

use crate::config::LoggingConfig;
use crate::error::Result;
use crate::graph::{reference, DeletionPolicy, Resource, ResourceGraph};

const LOG_GROUP_ID: &str = "LogGroup";

/// The topology's single log destination.
#[derive(Debug, Clone)]
pub struct LogSink {
    logical_id: String,
    stream_prefix: String,
}

impl LogSink {
    /// Declare the log group. Retention is bounded and the group is
    /// removed on teardown rather than retained.
    pub fn declare(graph: &mut ResourceGraph, config: &LoggingConfig) -> Result<Self> {
        debug!(group = %config.group_name, retention_days = config.retention_days, "declaring log group");
        graph.add(
            LOG_GROUP_ID,
            Resource::new(
                "AWS::Logs::LogGroup",
                json!({
                    "LogGroupName": config.group_name,
                    "RetentionInDays": config.retention_days,
                }),
            )
            .with_deletion_policy(DeletionPolicy::Delete),
        )?;
        Ok(Self {
            logical_id: LOG_GROUP_ID.to_string(),
            stream_prefix: config.stream_prefix.clone(),
        })
    }

    /// Log configuration attached to every container definition.
    #[must_use]
    pub fn driver(&self) -> Value {
        json!({
            "LogDriver": "awslogs",
            "Options": {
                "awslogs-group": reference(&self.logical_id),
                "awslogs-region": reference("AWS::Region"),
                "awslogs-stream-prefix": self.stream_prefix,
            }
        })
    }
}
