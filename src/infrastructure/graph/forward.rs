//! Forward retrograde analysis: depth-first expansion interleaved with
//! per-edge labelling, stopping as soon as the root's quality is known.

use crate::domain::game::Game;
use crate::error::Error;
use crate::infrastructure::graph::retrograde::{retrograde_analyse, retrograde_analyse_edge};
use crate::infrastructure::graph::{Graph, VertexId};
use crate::infrastructure::persistence::{ForwardRetrogradeProgress, SaveParameters};
use rustc_hash::FxHashSet;

struct Frame {
    id: VertexId,
    next_edge: usize,
    expanded: bool,
}

impl Frame {
    fn new(id: VertexId) -> Frame {
        Frame {
            id,
            next_edge: 0,
            expanded: false,
        }
    }
}

/// Solves the root with the interleaved strategy. Vertices left unlabelled
/// by the early exit stay pending; if the root itself is still open after
/// the expansion, one global pass settles the remainder.
pub fn forward_retrograde(graph: &mut Graph, root: &Game, mut save: Option<&mut SaveParameters>) -> VertexId {
    let root_id = graph.insert(root);
    if graph.vertex(root_id).quality.is_some() {
        return root_id;
    }

    if let Some(parameters) = save.as_deref_mut() {
        parameters.start_timers();
    }

    let mut stack = vec![Frame::new(root_id)];
    let mut expanding: FxHashSet<VertexId> = FxHashSet::from_iter([root_id]);

    run(graph, &mut stack, &mut expanding, &mut save);

    if graph.vertex(root_id).quality.is_none() {
        retrograde_analyse(graph);
    }

    root_id
}

/// Continues a run restored from a snapshot: the frame stack is rebuilt
/// from the saved call stack and the expanded set.
pub fn resume_forward_retrograde(
    graph: &mut Graph,
    progress: &ForwardRetrogradeProgress,
    mut save: Option<&mut SaveParameters>,
) -> Result<Option<VertexId>, Error> {
    let mut expanding: FxHashSet<VertexId> = FxHashSet::default();
    for serialization in &progress.expanded {
        let game = Game::from_serialization(*serialization)?;
        let id = graph.get(&game).ok_or_else(|| {
            Error::MalformedInput(format!("expanded vertex {serialization} is not in the graph"))
        })?;
        expanding.insert(id);
    }

    let mut stack = Vec::new();
    for serialization in &progress.call_stack {
        let game = Game::from_serialization(*serialization)?;
        let id = graph.get(&game).ok_or_else(|| {
            Error::MalformedInput(format!("call stack vertex {serialization} is not in the graph"))
        })?;
        expanding.insert(id);
        stack.push(Frame {
            id,
            next_edge: 0,
            expanded: !graph.vertex(id).edges.is_empty(),
        });
    }

    let root_id = stack.first().map(|frame| frame.id);

    if let Some(parameters) = save.as_deref_mut() {
        parameters.start_timers();
    }

    run(graph, &mut stack, &mut expanding, &mut save);

    match root_id {
        Some(id) if graph.vertex(id).quality.is_some() => {}
        _ => retrograde_analyse(graph),
    }

    Ok(root_id)
}

fn run(
    graph: &mut Graph,
    stack: &mut Vec<Frame>,
    expanding: &mut FxHashSet<VertexId>,
    save: &mut Option<&mut SaveParameters>,
) {
    enum Step {
        Pop,
        Push(VertexId),
    }

    while !stack.is_empty() {
        let top = stack.len() - 1;
        let id = stack[top].id;

        if graph.vertex(id).quality.is_some() {
            stack.pop();
            continue;
        }

        if !stack[top].expanded {
            stack[top].expanded = true;
            graph.expand_vertex(id);
        }

        let mut step = Step::Pop;

        while stack[top].next_edge < graph.vertex(id).edges.len() {
            let edge_index = stack[top].next_edge;
            let edge = &graph.vertex(id).edges[edge_index];
            let (target, optimal) = (edge.target, edge.optimal);

            if let Some(target_quality) = graph.vertex(target).quality {
                if optimal.is_none() {
                    retrograde_analyse_edge(graph, id, target_quality, edge_index);
                }
                stack[top].next_edge += 1;

                if graph.vertex(id).quality.is_some() {
                    break;
                }
            } else if !expanding.contains(&target) {
                expanding.insert(target);
                step = Step::Push(target);
                break;
            } else {
                // Cycle back into a vertex already on the expansion path.
                stack[top].next_edge += 1;
            }

            if let Some(parameters) = save.as_deref_mut() {
                if parameters.should_save() {
                    let progress = snapshot_progress(graph, stack, expanding);
                    parameters.save(graph, &progress);
                }
            }
        }

        match step {
            Step::Push(target) => stack.push(Frame::new(target)),
            Step::Pop => {
                // Either settled or exhausted; a pending vertex waits for
                // the global pass.
                stack.pop();
            }
        }
    }
}

fn snapshot_progress(
    graph: &Graph,
    stack: &[Frame],
    expanding: &FxHashSet<VertexId>,
) -> ForwardRetrogradeProgress {
    let mut unlabelled_edges = Vec::new();
    for &id in expanding {
        for edge in &graph.vertex(id).edges {
            if edge.optimal.is_none() {
                unlabelled_edges.push((
                    graph.vertex(id).serialization,
                    graph.vertex(edge.target).serialization,
                ));
            }
        }
    }

    ForwardRetrogradeProgress {
        call_stack: stack
            .iter()
            .map(|frame| graph.vertex(frame.id).serialization)
            .collect(),
        expanded: expanding
            .iter()
            .map(|id| graph.vertex(*id).serialization)
            .collect(),
        unlabelled_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Card;
    use crate::domain::game::CARD_COUNT;
    use crate::domain::models::Quality;
    use crate::infrastructure::graph::explore::explore_component;

    #[test]
    fn labels_the_micro_board_roots() {
        let root = Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]);
        let mut graph = Graph::new();
        let root_id = forward_retrograde(&mut graph, &root, None);
        assert_eq!(graph.vertex(root_id).quality, Some(Quality::Win));

        let root = Game::with_cards(2, 3, [Card::Boar; CARD_COUNT]);
        let mut graph = Graph::new();
        let root_id = forward_retrograde(&mut graph, &root, None);
        assert_eq!(graph.vertex(root_id).quality, Some(Quality::Lose));
    }

    #[test]
    fn agrees_with_the_component_solve() {
        let root = Game::with_cards(2, 3, [Card::Boar; CARD_COUNT]);

        let mut component = Graph::new();
        let component_root = explore_component(&mut component, &root, 0, None);
        retrograde_analyse(&mut component);

        let mut forward = Graph::new();
        let forward_root = forward_retrograde(&mut forward, &root, None);

        assert_eq!(
            component.vertex(component_root).quality,
            forward.vertex(forward_root).quality
        );
    }

    #[test]
    fn terminal_root_returns_immediately() {
        let root = Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]);
        let capture = crate::domain::models::Move {
            pawn_id: 1,
            card: Card::Boar,
            offset_id: 1,
        };
        let finished = root.successor(capture).unwrap();

        let mut graph = Graph::new();
        let root_id = forward_retrograde(&mut graph, &finished, None);

        assert_eq!(graph.vertex(root_id).quality, Some(Quality::Lose));
        assert_eq!(graph.vertex_count(), 1);
        assert!(graph.vertex(root_id).edges.is_empty());
    }
}
