//! Retrograde analysis: propagate Win/Lose/Draw backwards from terminal
//! vertices, marking one optimal edge per settled vertex.

use crate::domain::models::Quality;
use crate::infrastructure::graph::{Graph, VertexId};
use rustc_hash::FxHashSet;

/// Incremental step for one edge whose target has just been settled to
/// `target_quality`. The source must still be unlabelled and the edge not
/// yet analysed.
///
/// - A losing target makes the source a Win through this edge.
/// - A winning target rules the edge out; on the last unanalysed edge the
///   source becomes Lose, unless some other edge reaches a Draw, which the
///   source escapes into.
/// - A drawn target settles nothing until the last unanalysed edge, where
///   the source becomes Draw through it.
pub fn retrograde_analyse_edge(
    graph: &mut Graph,
    source: VertexId,
    target_quality: Quality,
    edge_index: usize,
) {
    debug_assert!(graph.vertex(source).quality.is_none());
    debug_assert!(graph.vertex(source).edges[edge_index].optimal.is_none());

    let this_move = graph.vertex(source).edges[edge_index].mv;
    let last_unanalysed = graph
        .vertex(source)
        .edges
        .iter()
        .all(|edge| edge.mv == this_move || edge.optimal.is_some());

    match target_quality {
        Quality::Lose => {
            let vertex = graph.vertex_mut(source);
            for edge in &mut vertex.edges {
                edge.optimal = Some(false);
            }
            vertex.edges[edge_index].optimal = Some(true);
            vertex.quality = Some(Quality::Win);
        }

        Quality::Win => {
            if !last_unanalysed {
                graph.vertex_mut(source).edges[edge_index].optimal = Some(false);
                return;
            }

            let draw_move = graph
                .vertex(source)
                .edges
                .iter()
                .filter(|edge| edge.mv != this_move)
                .find(|edge| graph.vertex(edge.target).quality == Some(Quality::Draw))
                .map(|edge| edge.mv);

            let vertex = graph.vertex_mut(source);
            if let Some(draw_move) = draw_move {
                vertex.edges[edge_index].optimal = Some(false);
                vertex.set_optimal_move(&draw_move);
                vertex.quality = Some(Quality::Draw);
            } else {
                vertex.set_optimal_move(&this_move);
                vertex.quality = Some(Quality::Lose);
            }
        }

        Quality::Draw => {
            if last_unanalysed {
                let vertex = graph.vertex_mut(source);
                vertex.set_optimal_move(&this_move);
                vertex.quality = Some(Quality::Draw);
            }
        }
    }
}

/// Full-graph analysis: sweep until a pass settles nothing new, then assign
/// draws to the closed unlabelled remainder.
pub fn retrograde_analyse(graph: &mut Graph) {
    let mut unlabelled_expanded: FxHashSet<VertexId> = FxHashSet::default();

    loop {
        let mut edge_labelled = false;

        for id in graph.vertex_ids() {
            if graph.vertex(id).quality.is_some() {
                continue;
            }
            if !graph.vertex(id).edges.is_empty() {
                unlabelled_expanded.insert(id);
            }

            for edge_index in 0..graph.vertex(id).edges.len() {
                let edge = &graph.vertex(id).edges[edge_index];
                if edge.optimal.is_some() {
                    continue;
                }

                let Some(target_quality) = graph.vertex(edge.target).quality else {
                    continue;
                };

                retrograde_analyse_edge(graph, id, target_quality, edge_index);
                edge_labelled |= graph.vertex(id).edges[edge_index].optimal.is_some();

                if graph.vertex(id).quality.is_some() {
                    unlabelled_expanded.remove(&id);
                    break;
                }
            }
        }

        if !edge_labelled {
            break;
        }
    }

    assign_draws(graph, unlabelled_expanded);
}

/// Labels Draw on every unlabelled vertex whose successors all stay inside
/// the drawn region: iteratively drop vertices with an unexpanded or
/// outside unlabelled successor, then each survivor draws through any
/// edge back into the region.
fn assign_draws(graph: &mut Graph, mut candidates: FxHashSet<VertexId>) {
    loop {
        let mut dropped = Vec::new();

        for &id in &candidates {
            if graph.vertex(id).quality.is_some() {
                dropped.push(id);
                continue;
            }

            for edge in &graph.vertex(id).edges {
                let target = graph.vertex(edge.target);
                if target.quality.is_none()
                    && (target.edges.is_empty() || !candidates.contains(&edge.target))
                {
                    dropped.push(id);
                    break;
                }
            }
        }

        if dropped.is_empty() {
            break;
        }
        for id in dropped {
            candidates.remove(&id);
        }
    }

    let survivors: Vec<VertexId> = candidates.iter().copied().collect();
    for id in survivors {
        let draw_move = graph
            .vertex(id)
            .edges
            .iter()
            .find(|edge| {
                graph.vertex(edge.target).quality == Some(Quality::Draw)
                    || candidates.contains(&edge.target)
            })
            .map(|edge| edge.mv)
            .expect("draw-region vertex has no edge back into the region");

        let vertex = graph.vertex_mut(id);
        vertex.set_optimal_move(&draw_move);
        vertex.quality = Some(Quality::Draw);
    }
}
