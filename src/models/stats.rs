// IngestStats Model
// Aggregate slot accounting shown on the dashboard

use serde::{Deserialize, Serialize};

/// Point-in-time summary of ingest capacity and throughput
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Streams currently holding a slot (pending or ingesting)
    pub active_streams: u32,

    /// Remaining slots, never below zero
    pub available_slots: u32,

    /// Hard ceiling on concurrently active streams
    pub max_concurrent_streams: u32,

    /// All streams registered this session
    pub total_streams: u32,

    /// Gauge reported by the server; never computed locally
    pub websocket_connections: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_wire_format() {
        let stats = IngestStats {
            active_streams: 2,
            available_slots: 3,
            max_concurrent_streams: 5,
            total_streams: 7,
            websocket_connections: 1,
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["activeStreams"], 2);
        assert_eq!(value["availableSlots"], 3);
        assert_eq!(value["maxConcurrentStreams"], 5);
        assert_eq!(value["totalStreams"], 7);
        assert_eq!(value["websocketConnections"], 1);
    }
}
