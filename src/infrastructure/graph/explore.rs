//! Reachability expansion from a root state.

use crate::domain::game::Game;
use crate::infrastructure::graph::{Graph, VertexId};
use crate::infrastructure::persistence::{ForwardRetrogradeProgress, SaveParameters};
use rustc_hash::FxHashSet;

/// Expands the whole component reachable from `root`.
///
/// Every expanded vertex ends up with its full outgoing edge set; edges to
/// already-expanded states are added without re-expanding them. A non-zero
/// `max_depth` bounds each expansion burst: deeper successors park in the
/// frontier and the loop picks them back up, so the depth limits the work
/// stack, not the result.
pub fn explore_component(
    graph: &mut Graph,
    root: &Game,
    max_depth: usize,
    mut save: Option<&mut SaveParameters>,
) -> VertexId {
    let root_id = graph.insert(root);

    let mut expanded: FxHashSet<VertexId> = FxHashSet::default();
    let mut frontier: FxHashSet<VertexId> = FxHashSet::from_iter([root_id]);

    if let Some(parameters) = save.as_deref_mut() {
        parameters.start_timers();
    }

    while let Some(&burst_root) = frontier.iter().next() {
        let mut stack: Vec<(VertexId, usize)> = vec![(burst_root, 0)];

        while let Some((id, depth)) = stack.pop() {
            if !expanded.insert(id) {
                continue;
            }
            frontier.remove(&id);

            graph.expand_vertex(id);

            for edge_index in 0..graph.vertex(id).edges.len() {
                let target = graph.vertex(id).edges[edge_index].target;
                if expanded.contains(&target) {
                    continue;
                }

                if max_depth == 0 || depth + 1 <= max_depth {
                    stack.push((target, depth + 1));
                } else {
                    frontier.insert(target);
                }
            }

            if let Some(parameters) = save.as_deref_mut() {
                if parameters.should_save() {
                    parameters.save(graph, &ForwardRetrogradeProgress::default());
                }
            }
        }
    }

    root_id
}
