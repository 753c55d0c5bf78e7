//! Input aggregation for a node about to execute.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::graph::{NodeId, WorkflowGraph};

/// Reserved target-handle name whose values accumulate into a list.
///
/// Multiple parents can feed the same `images` handle; each completed
/// parent contributes its extracted value (arrays are spliced in).
pub const IMAGES_HANDLE: &str = "images";

/// Extracts the value an edge carries out of a parent's outputs.
///
/// Fixed precedence: `outputs.output`, else `outputs.text`, else
/// `outputs.url`, else the whole outputs value. Null fields fall
/// through.
pub fn extract_output(outputs: &Value) -> Value {
    if let Value::Object(map) = outputs {
        for key in ["output", "text", "url"] {
            if let Some(value) = map.get(key) {
                if !value.is_null() {
                    return value.clone();
                }
            }
        }
    }
    outputs.clone()
}

/// Builds the input object for a node about to execute.
///
/// Layered shallow merge: run-level initial inputs, then the node's
/// static config, then one entry per incoming edge whose parent output
/// is known. Edges are visited in definition order, so repeated writers
/// of the same field overwrite deterministically (last writer wins).
/// Pure function of its arguments.
pub fn aggregate_inputs(
    graph: &WorkflowGraph,
    node_id: NodeId,
    run_inputs: &Value,
    parent_outputs: &HashMap<NodeId, Value>,
) -> Map<String, Value> {
    let mut input = Map::new();

    if let Value::Object(map) = run_inputs {
        for (key, value) in map {
            input.insert(key.clone(), value.clone());
        }
    }

    if let Some(node) = graph.node(node_id) {
        for (key, value) in node.kind.config_json() {
            input.insert(key, value);
        }
    }

    for edge in graph.edges_into(node_id) {
        let Some(outputs) = parent_outputs.get(&edge.source) else {
            continue;
        };
        let extracted = extract_output(outputs);

        match edge.target_handle.as_deref() {
            Some(IMAGES_HANDLE) => {
                let slot = input
                    .entry(IMAGES_HANDLE.to_owned())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                if let Value::Array(list) = slot {
                    match extracted {
                        Value::Array(values) => list.extend(values),
                        value => list.push(value),
                    }
                }
            }
            Some(handle) => {
                input.insert(handle.to_owned(), extracted);
            }
            None => {
                // Untyped connection: merge the parent's whole outputs.
                if let Value::Object(map) = outputs {
                    for (key, value) in map {
                        input.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }

    input
}
