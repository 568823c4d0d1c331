//! Dispersed-frontier exploration: bounded-depth worker tasks explore
//! private subgraphs in parallel while the coordinator owns the shared
//! graph and frontier, merging task results as they complete.

use crate::domain::game::Game;
use crate::domain::models::Move;
use crate::infrastructure::graph::retrograde::retrograde_analyse;
use crate::infrastructure::graph::{Graph, VertexId};
use crate::infrastructure::symmetry;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::mpsc;

/// A state a worker expanded, with the moves it found; the coordinator
/// replays the moves against the shared graph.
struct TaskVertex {
    game: Game,
    moves: Vec<Move>,
}

/// What one worker brings home: its expanded states and the states parked
/// at its depth limit.
struct TaskOutput {
    vertices: Vec<TaskVertex>,
    frontier: Vec<Game>,
}

/// Builds the full component reachable from `root` with up to
/// `max_thread_count` parallel tasks, each exploring `depth` plies from a
/// frontier state, then labels the graph with a global retrograde pass.
///
/// Workers never read the shared graph; duplicated work between tasks is
/// collapsed when the coordinator merges their private maps.
pub fn dispersed_frontier(
    graph: &mut Graph,
    root: &Game,
    depth: usize,
    max_thread_count: usize,
) -> VertexId {
    assert!(depth > 0, "dispersed frontier depth cannot be zero");
    assert!(max_thread_count > 0, "dispersed frontier needs a worker");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_thread_count)
        .build()
        .expect("failed to build the worker pool");

    let use_symmetries = graph.use_symmetries();
    let (sender, receiver) = mpsc::channel::<TaskOutput>();

    let mut frontier: FxHashMap<u128, Game> = FxHashMap::default();
    frontier.insert(symmetry::canonical_bits(root, use_symmetries), root.clone());

    let mut in_flight = 0usize;

    while !frontier.is_empty() || in_flight > 0 {
        // Merge whatever has already finished.
        while let Ok(output) = receiver.try_recv() {
            in_flight -= 1;
            finish_task(graph, &mut frontier, output);
        }

        let Some(&key) = frontier.keys().next() else {
            // Nothing to hand out; block for the next completion.
            if in_flight > 0 {
                let output = receiver.recv().expect("worker pool disconnected");
                in_flight -= 1;
                finish_task(graph, &mut frontier, output);
            }
            continue;
        };

        if in_flight >= max_thread_count {
            let output = receiver.recv().expect("worker pool disconnected");
            in_flight -= 1;
            finish_task(graph, &mut frontier, output);
            continue;
        }

        let game = frontier.remove(&key).expect("frontier key just observed");
        let task_sender = sender.clone();
        in_flight += 1;
        pool.spawn(move || {
            let output = explore_task(game, depth, use_symmetries);
            // The coordinator outlives the pool; a send failure means it
            // has already torn the channel down.
            let _ = task_sender.send(output);
        });
    }

    retrograde_analyse(graph);

    graph.get(root).expect("root vanished from its own component")
}

/// Bounded depth-first expansion against task-private maps only.
fn explore_task(root: Game, depth_limit: usize, use_symmetries: bool) -> TaskOutput {
    let mut vertices: Vec<TaskVertex> = Vec::new();
    let mut seen: FxHashSet<u128> = FxHashSet::default();
    let mut frontier: FxHashMap<u128, Game> = FxHashMap::default();

    let mut stack: Vec<(Game, usize)> = vec![(root, 0)];

    while let Some((game, depth)) = stack.pop() {
        let key = symmetry::canonical_bits(&game, use_symmetries);

        if depth >= depth_limit {
            if !seen.contains(&key) {
                frontier.entry(key).or_insert(game);
            }
            continue;
        }

        if !seen.insert(key) {
            continue;
        }
        frontier.remove(&key);

        let moves: Vec<Move> = game.valid_moves().to_vec();
        for mv in &moves {
            let next = game
                .successor(*mv)
                .expect("generated move rejected by its own state");
            let next_key = symmetry::canonical_bits(&next, use_symmetries);
            if !seen.contains(&next_key) {
                stack.push((next, depth + 1));
            }
        }

        vertices.push(TaskVertex { game, moves });
    }

    TaskOutput {
        vertices,
        frontier: frontier.into_values().collect(),
    }
}

/// Folds one task's private results into the shared graph, then reconciles
/// the shared frontier: a parked state stays on the frontier only while it
/// has neither edges nor a quality.
fn finish_task(graph: &mut Graph, frontier: &mut FxHashMap<u128, Game>, output: TaskOutput) {
    for task_vertex in output.vertices {
        let id = graph.insert(&task_vertex.game);

        for mv in task_vertex.moves {
            let next = task_vertex
                .game
                .successor(mv)
                .expect("generated move rejected by its own state");
            let next_id = graph.insert(&next);
            graph.add_edge(id, next_id, mv);
        }
    }

    for game in output.frontier {
        let key = symmetry::canonical_bits(&game, graph.use_symmetries());
        let expanded = match graph.get(&game) {
            Some(id) => {
                let vertex = graph.vertex(id);
                vertex.quality.is_some() || !vertex.edges.is_empty()
            }
            None => false,
        };

        if expanded {
            frontier.remove(&key);
        } else {
            frontier.insert(key, game);
        }
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
    fn matches_the_serial_exploration() {
        let root = Game::with_cards(2, 3, [Card::Boar; CARD_COUNT]);

        let mut serial = Graph::new();
        let serial_root = explore_component(&mut serial, &root, 0, None);
        retrograde_analyse(&mut serial);

        let mut parallel = Graph::new();
        let parallel_root = dispersed_frontier(&mut parallel, &root, 3, 4);

        assert_eq!(parallel.vertex_count(), serial.vertex_count());
        assert_eq!(parallel.edge_count(), serial.edge_count());
        assert_eq!(
            parallel.vertex(parallel_root).quality,
            serial.vertex(serial_root).quality
        );
    }

    #[test]
    fn single_worker_still_terminates() {
        let root = Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]);
        let mut graph = Graph::new();
        let root_id = dispersed_frontier(&mut graph, &root, 1, 1);

        assert_eq!(graph.vertex(root_id).quality, Some(Quality::Win));
    }
}
