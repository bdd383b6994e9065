//! Pure functions that resolve a node's input values from a [`CanvasSnapshot`].
//!
//! None of these functions mutate the snapshot or talk to storage directly
//! (except the two `*_buffer`/`*_mime_type` helpers, which take an injected
//! [`ObjectStorage`] the same way the teacher's Pregel loop takes a
//! checkpoint saver). Everything here is safe to call concurrently from
//! multiple scheduler tasks against the same borrowed snapshot.

use crate::canvas::{CanvasSnapshot, DataType, FileData, Handle, HandleDirection, OutputItem, OutputValue};
use crate::error::{EngineError, Result};
use crate::storage::ObjectStorage;

/// The result produced on the source node feeding `source_handle_id`, if the
/// node has run (or, for transient node types, if its task has completed).
fn source_output_item(
    snapshot: &CanvasSnapshot,
    source_node_id: &str,
    source_handle_id: &str,
) -> Result<Option<OutputItem>> {
    let source_node = snapshot
        .node(source_node_id)
        .ok_or_else(|| EngineError::MissingSourceNode {
            node_id: source_node_id.to_string(),
        })?;

    let result = if source_node.template.is_transient {
        snapshot
            .tasks
            .get(source_node_id)
            .and_then(|task| task.result.as_ref())
    } else {
        source_node.result.as_ref()
    };

    let Some(result) = result else {
        return Ok(None);
    };
    let Some(output) = result.selected_output() else {
        return Ok(None);
    };

    let item = output
        .items
        .iter()
        .find(|item| item.output_handle_id.as_deref() == Some(source_handle_id))
        .or_else(|| {
            // A node with exactly one output handle is allowed to omit the
            // handle tag on its items.
            if output.items.len() == 1 {
                output.items.first()
            } else {
                None
            }
        })
        .cloned();

    Ok(item)
}

/// Filters narrowing which input handle(s) [`get_input_value`] considers.
/// Either field left `None` matches every handle on that axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputMatcher<'a> {
    pub data_type: Option<DataType>,
    pub label: Option<&'a str>,
}

fn matches_handle(handle: &Handle, matcher: &InputMatcher) -> bool {
    matcher
        .data_type
        .map_or(true, |dt| handle.data_types.contains(&dt))
        && matcher
            .label
            .map_or(true, |l| handle.label.as_deref() == Some(l))
}

/// Resolve the value feeding whichever input handle on `node_id` matches
/// `matcher`.
///
/// When more than one input handle matches (or one matching handle has more
/// than one incoming edge), candidates are sorted by the target handle's
/// declared `order` and the first wins; a warning is logged for the tie.
/// [`get_input_values_by_type`] collects every matching edge by design and
/// stays silent.
pub fn get_input_value(
    snapshot: &CanvasSnapshot,
    node_id: &str,
    required: bool,
    matcher: InputMatcher,
) -> Result<Option<OutputValue>> {
    let mut matching_handles: Vec<&Handle> = snapshot
        .handles
        .iter()
        .filter(|h| h.node_id == node_id && h.direction == HandleDirection::Input)
        .filter(|h| matches_handle(h, &matcher))
        .collect();
    matching_handles.sort_by_key(|h| h.order);

    let mut candidates: Vec<(&Handle, &crate::canvas::Edge)> = matching_handles
        .iter()
        .flat_map(|handle| {
            snapshot
                .incoming_edges(node_id)
                .filter(move |e| e.target_handle_id == handle.id)
                .map(move |e| (*handle, e))
        })
        .collect();
    candidates.sort_by_key(|(handle, _)| handle.order);

    if candidates.len() > 1 {
        tracing::warn!(
            node_id,
            candidates = candidates.len(),
            "multiple edges target matching input handles; using the lowest order"
        );
    }

    let Some((handle, edge)) = candidates.first() else {
        return if required {
            Err(EngineError::missing_required_input(
                node_id,
                matching_handles.first().map(|h| h.id.clone()),
            ))
        } else {
            Ok(None)
        };
    };

    let item = source_output_item(snapshot, &edge.source, &edge.source_handle_id)?;

    match item {
        Some(item) => Ok(Some(item.data)),
        None if handle.required || required => {
            Err(EngineError::empty_required_input(node_id, &edge.source))
        }
        None => Ok(None),
    }
}

/// Resolve the value feeding exactly `handle`, ignoring its siblings.
///
/// Used by [`get_all_input_values_with_handle`], which already knows which
/// handle it wants and must not let a same-typed sibling handle steal the
/// edge via [`get_input_value`]'s matcher-based search.
fn resolve_handle_value(
    snapshot: &CanvasSnapshot,
    node_id: &str,
    handle: &Handle,
) -> Result<Option<OutputValue>> {
    let edges: Vec<_> = snapshot
        .incoming_edges(node_id)
        .filter(|e| e.target_handle_id == handle.id)
        .collect();

    if edges.len() > 1 {
        tracing::warn!(
            node_id,
            handle_id = %handle.id,
            candidates = edges.len(),
            "multiple edges target the same input handle; using the first"
        );
    }

    let Some(edge) = edges.first() else {
        return if handle.required {
            Err(EngineError::missing_required_input(
                node_id,
                Some(handle.id.clone()),
            ))
        } else {
            Ok(None)
        };
    };

    let item = source_output_item(snapshot, &edge.source, &edge.source_handle_id)?;

    match item {
        Some(item) => Ok(Some(item.data)),
        None if handle.required => Err(EngineError::empty_required_input(node_id, &edge.source)),
        None => Ok(None),
    }
}

/// Resolve every value of `data_type` (optionally narrowed by `label`)
/// feeding any input handle on `node_id`, in target-handle `order`.
///
/// Unlike [`get_input_value`], this intentionally gathers all matching
/// edges rather than picking one, so it never needs to warn about ties. One
/// entry is returned per matching edge, in handle order; an edge whose
/// source has produced no output yields `None` rather than being dropped,
/// so positional correspondence with the handle list is preserved.
pub fn get_input_values_by_type(
    snapshot: &CanvasSnapshot,
    node_id: &str,
    data_type: DataType,
    label: Option<&str>,
) -> Result<Vec<Option<OutputValue>>> {
    let mut handles: Vec<&Handle> = snapshot
        .handles
        .iter()
        .filter(|h| h.node_id == node_id && h.direction == HandleDirection::Input)
        .filter(|h| h.data_types.contains(&data_type))
        .filter(|h| label.map_or(true, |l| h.label.as_deref() == Some(l)))
        .collect();
    handles.sort_by_key(|h| h.order);

    let mut values = Vec::new();

    for handle in handles {
        for edge in snapshot
            .incoming_edges(node_id)
            .filter(|e| e.target_handle_id == handle.id)
        {
            let item = source_output_item(snapshot, &edge.source, &edge.source_handle_id)?;
            match item {
                Some(item) => values.push(Some(item.data)),
                None if handle.required => {
                    return Err(EngineError::empty_required_input(node_id, &edge.source))
                }
                None => values.push(None),
            }
        }
    }

    Ok(values)
}

/// All output handles declared on `node_id`, in their declared order.
pub fn get_all_output_handles<'a>(snapshot: &'a CanvasSnapshot, node_id: &str) -> Vec<&'a Handle> {
    let mut handles: Vec<_> = snapshot
        .handles
        .iter()
        .filter(|h| h.node_id == node_id && h.direction == HandleDirection::Output)
        .collect();
    handles.sort_by_key(|h| h.order);
    handles
}

/// Every input handle on `node_id` paired with its resolved value, in
/// declared order. Required-but-unsatisfied handles surface as an error the
/// same way [`get_input_value`] does.
pub fn get_all_input_values_with_handle<'a>(
    snapshot: &'a CanvasSnapshot,
    node_id: &str,
) -> Result<Vec<(&'a Handle, Option<OutputValue>)>> {
    let mut handles: Vec<_> = snapshot
        .handles
        .iter()
        .filter(|h| h.node_id == node_id && h.direction == HandleDirection::Input)
        .collect();
    handles.sort_by_key(|h| h.order);

    handles
        .into_iter()
        .map(|handle| {
            let value = resolve_handle_value(snapshot, node_id, handle)?;
            Ok((handle, value))
        })
        .collect()
}

/// Fetch the raw bytes behind a [`FileData`] reference.
pub async fn load_media_buffer(storage: &dyn ObjectStorage, file: &FileData) -> Result<Vec<u8>> {
    match file {
        FileData::Entity { bucket, key, .. } => storage.load_buffer(bucket, key).await,
        FileData::Transient { temp_key, .. } => storage.load_buffer("transient", temp_key).await,
    }
}

/// Resolve a [`FileData`]'s MIME type, preferring the value stamped on the
/// reference itself and falling back to a storage lookup.
pub async fn get_file_data_mime_type(
    storage: &dyn ObjectStorage,
    file: &FileData,
) -> Result<Option<String>> {
    if let Some(mime) = file.mime_type() {
        return Ok(Some(mime.to_string()));
    }
    match file {
        FileData::Entity { bucket, key, .. } => storage.mime_type(bucket, key).await,
        FileData::Transient { temp_key, .. } => storage.mime_type("transient", temp_key).await,
    }
}
