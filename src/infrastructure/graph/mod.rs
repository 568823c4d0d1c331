pub mod dispersed;
pub mod explore;
pub mod forward;
pub mod io;
pub mod retrograde;

use crate::domain::game::Game;
use crate::domain::models::{Move, Quality};
use crate::error::Error;
use crate::infrastructure::serialization::GameSerialization;
use crate::infrastructure::symmetry;
use rustc_hash::FxHashMap;

/// Index of a vertex in the graph's arena. Vertices are never removed, so
/// ids stay valid for the graph's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(u32);

impl VertexId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A state transition. Source and target are arena indices; `optimal`
/// distinguishes "the chosen move" (true), "ruled out" (false) and "not yet
/// analysed" (None).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub source: VertexId,
    pub target: VertexId,
    pub mv: Move,
    pub optimal: Option<bool>,
}

impl Edge {
    pub fn is_optimal(&self) -> bool {
        self.optimal == Some(true)
    }
}

/// A reachable state: its packed form, its quality once the analysis has
/// settled it, and the outgoing edges in discovery order.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub serialization: GameSerialization,
    pub quality: Option<Quality>,
    pub edges: Vec<Edge>,
}

impl Vertex {
    /// A terminal state is born `Lose`: the side to move has already lost.
    pub fn from_game(game: &Game) -> Vertex {
        Vertex {
            serialization: game.serialize(),
            quality: game.is_finished().map(|_| Quality::Lose),
            edges: Vec::new(),
        }
    }

    pub fn new(serialization: GameSerialization, quality: Option<Quality>) -> Vertex {
        Vertex {
            serialization,
            quality,
            edges: Vec::new(),
        }
    }

    pub fn get_edge(&self, mv: &Move) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.mv == *mv)
    }

    pub fn optimal_move(&self) -> Option<Move> {
        self.edges.iter().find(|edge| edge.is_optimal()).map(|edge| edge.mv)
    }

    /// Marks the edge carrying `mv` as the optimal move; every other edge
    /// that already has a verdict is ruled out. Unanalysed edges keep their
    /// None.
    pub fn set_optimal_move(&mut self, mv: &Move) {
        for edge in &mut self.edges {
            let is_optimal = edge.mv == *mv;
            if edge.optimal.is_some() || is_optimal {
                edge.optimal = Some(is_optimal);
            }
        }
    }
}

/// The reachable-state graph: an arena of vertices plus a map from the
/// canonical key of a state to its arena index. With symmetries enabled
/// (the default) a state and its turn-reflection share one vertex.
pub struct Graph {
    vertices: Vec<Vertex>,
    index: FxHashMap<u128, VertexId>,
    use_symmetries: bool,
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            vertices: Vec::new(),
            index: FxHashMap::default(),
            use_symmetries: true,
        }
    }

    /// Testing aid: key states by raw identity instead of the symmetry
    /// class.
    pub fn with_raw_keys() -> Graph {
        Graph {
            use_symmetries: false,
            ..Graph::new()
        }
    }

    pub fn use_symmetries(&self) -> bool {
        self.use_symmetries
    }

    pub fn get(&self, game: &Game) -> Option<VertexId> {
        let key = symmetry::canonical_bits(game, self.use_symmetries);
        self.index.get(&key).copied()
    }

    /// Looks the state up, inserting a fresh vertex when it is new.
    pub fn insert(&mut self, game: &Game) -> VertexId {
        let key = symmetry::canonical_bits(game, self.use_symmetries);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex::from_game(game));
        self.index.insert(key, id);
        id
    }

    /// Insertion path for import and snapshot loading, where the quality
    /// comes from the file rather than the terminal rule.
    pub(crate) fn insert_serialized(
        &mut self,
        serialization: GameSerialization,
        quality: Option<Quality>,
    ) -> Result<VertexId, Error> {
        let game = Game::from_serialization(serialization)?;
        let key = symmetry::canonical_bits(&game, self.use_symmetries);
        if let Some(id) = self.index.get(&key) {
            return Ok(*id);
        }

        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex::new(serialization, quality));
        self.index.insert(key, id);
        Ok(id)
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + use<> {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|vertex| vertex.edges.len()).sum()
    }

    /// Appends an edge unless the source already carries one for the same
    /// move; returns whether an edge was added.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId, mv: Move) -> bool {
        if self.vertex(source).get_edge(&mv).is_some() {
            return false;
        }
        self.vertex_mut(source).edges.push(Edge {
            source,
            target,
            mv,
            optimal: None,
        });
        true
    }

    /// The edge from `source` whose target carries `serialization`, if any.
    pub fn edge_to(&self, source: VertexId, serialization: GameSerialization) -> Option<&Edge> {
        self.vertex(source)
            .edges
            .iter()
            .find(|edge| self.vertex(edge.target).serialization == serialization)
    }

    /// Rebuilds the state behind a vertex. The graph only stores encodings
    /// it produced itself, so a decode failure is a corrupted graph.
    pub(crate) fn state(&self, id: VertexId) -> Game {
        Game::from_serialization(self.vertex(id).serialization)
            .expect("graph vertex holds an undecodable serialization")
    }

    /// Generates all successor edges of a vertex (deduplicated by move),
    /// inserting target vertices as needed.
    pub(crate) fn expand_vertex(&mut self, id: VertexId) {
        let game = self.state(id);
        for mv in game.valid_moves().to_vec() {
            let next = game
                .successor(mv)
                .expect("generated move rejected by its own state");
            let next_id = self.insert(&next);
            self.add_edge(id, next_id, mv);
        }
    }
}

impl Graph {
    /// See [`explore::explore_component`].
    pub fn explore_component(
        &mut self,
        root: &Game,
        max_depth: usize,
        save: Option<&mut crate::infrastructure::persistence::SaveParameters>,
    ) -> VertexId {
        explore::explore_component(self, root, max_depth, save)
    }

    /// See [`retrograde::retrograde_analyse`].
    pub fn retrograde_analyse(&mut self) {
        retrograde::retrograde_analyse(self)
    }

    /// See [`forward::forward_retrograde`].
    pub fn forward_retrograde(
        &mut self,
        root: &Game,
        save: Option<&mut crate::infrastructure::persistence::SaveParameters>,
    ) -> VertexId {
        forward::forward_retrograde(self, root, save)
    }

    /// See [`dispersed::dispersed_frontier`].
    pub fn dispersed_frontier(
        &mut self,
        root: &Game,
        depth: usize,
        max_thread_count: usize,
    ) -> VertexId {
        dispersed::dispersed_frontier(self, root, depth, max_thread_count)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

#[cfg(test)]
impl Graph {
    /// Appends a vertex without touching the canonical index; for synthetic
    /// graphs whose serializations are not decodable states.
    pub(crate) fn push_vertex_for_tests(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        id
    }
}
