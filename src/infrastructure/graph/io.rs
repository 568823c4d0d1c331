//! Text form of a labelled graph: a nodes CSV (`Id, Quality, image`) and an
//! edges CSV (`Source, Target, Pawn, Card, Offset, Optimal`). Import skips
//! malformed lines with a warning; an edge whose endpoints are missing is
//! dropped the same way.

use crate::domain::card::Card;
use crate::domain::game::Game;
use crate::domain::models::Quality;
use crate::error::Error;
use crate::infrastructure::graph::Graph;
use crate::infrastructure::serialization::GameSerialization;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

impl Graph {
    pub fn export(&self, nodes_path: &Path, edges_path: &Path) -> Result<(), Error> {
        let mut nodes = BufWriter::new(File::create(nodes_path)?);
        let mut edges = BufWriter::new(File::create(edges_path)?);

        writeln!(nodes, "Id, Quality, image")?;
        writeln!(edges, "Source, Target, Pawn, Card, Offset, Optimal")?;

        for vertex in self.vertices() {
            let id = vertex.serialization.to_base64();
            let quality = vertex
                .quality
                .map(|quality| quality.to_string())
                .unwrap_or_else(|| "Unknown".to_string());

            writeln!(nodes, "{id},{quality},{id}.bmp")?;

            for edge in &vertex.edges {
                let target = self.vertex(edge.target).serialization.to_base64();
                writeln!(
                    edges,
                    "{id},{target},{},{},{},{}",
                    edge.mv.pawn_id,
                    edge.mv.card.index(),
                    edge.mv.offset_id,
                    edge.is_optimal()
                )?;
            }
        }

        nodes.flush()?;
        edges.flush()?;

        log::info!("exported nodes: {}", nodes_path.display());
        log::info!("exported edges: {}", edges_path.display());
        Ok(())
    }

    pub fn import(nodes_path: &Path, edges_path: &Path) -> Result<Graph, Error> {
        let mut graph = Graph::new();

        for line in BufReader::new(File::open(nodes_path)?).lines() {
            let line = line?;
            if line.is_empty() || line.starts_with("Id,") {
                continue;
            }

            if let Err(warning) = import_node(&mut graph, &line) {
                log::warn!("skipping node line \"{line}\": {warning}");
            }
        }

        for line in BufReader::new(File::open(edges_path)?).lines() {
            let line = line?;
            if line.is_empty() || line.starts_with("Source,") {
                continue;
            }

            if let Err(warning) = import_edge(&mut graph, &line) {
                log::warn!("skipping edge line \"{line}\": {warning}");
            }
        }

        Ok(graph)
    }
}

fn import_node(graph: &mut Graph, line: &str) -> Result<(), String> {
    let mut fields = line.split(',');
    let serialization = fields.next().ok_or("missing serialization")?;
    let quality = fields.next().ok_or("missing quality")?;

    let serialization =
        GameSerialization::from_base64(serialization).map_err(|error| error.to_string())?;

    let quality = match quality {
        "Unknown" => None,
        other => Some(
            other
                .parse::<Quality>()
                .map_err(|_| format!("unknown quality \"{other}\""))?,
        ),
    };

    graph
        .insert_serialized(serialization, quality)
        .map_err(|error| error.to_string())?;
    Ok(())
}

fn import_edge(graph: &mut Graph, line: &str) -> Result<(), String> {
    let fields: Vec<&str> = line.split(',').collect();
    let [source, target, pawn_id, card, offset_id, optimal] = fields.as_slice() else {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    };

    let source = lookup(graph, source)?;
    let target = lookup(graph, target)?;

    let pawn_id: usize = pawn_id.parse().map_err(|_| format!("invalid pawn id \"{pawn_id}\""))?;
    let offset_id: usize = offset_id
        .parse()
        .map_err(|_| format!("invalid offset id \"{offset_id}\""))?;
    let card_index: usize = card.parse().map_err(|_| format!("invalid card \"{card}\""))?;
    let card = Card::from_index(card_index).ok_or(format!("invalid card index {card_index}"))?;

    let optimal = match *optimal {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    };

    let mv = crate::domain::models::Move {
        pawn_id,
        card,
        offset_id,
    };
    if graph.add_edge(source, target, mv) {
        let edge = graph
            .vertex_mut(source)
            .edges
            .last_mut()
            .expect("edge was just appended");
        edge.optimal = optimal;
    }

    Ok(())
}

fn lookup(
    graph: &Graph,
    serialization: &str,
) -> Result<crate::infrastructure::graph::VertexId, String> {
    let serialization =
        GameSerialization::from_base64(serialization).map_err(|error| error.to_string())?;
    let game = Game::from_serialization(serialization).map_err(|error| error.to_string())?;
    graph
        .get(&game)
        .ok_or_else(|| format!("undefined vertex \"{}\"", serialization.to_base64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Card;
    use crate::domain::game::CARD_COUNT;
    use crate::infrastructure::graph::explore::explore_component;
    use crate::infrastructure::graph::retrograde::retrograde_analyse;
    use std::path::PathBuf;

    fn temp_paths(label: &str) -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir();
        (
            base.join(format!("onitama_{label}_nodes.csv")),
            base.join(format!("onitama_{label}_edges.csv")),
        )
    }

    #[test]
    fn exported_graphs_import_unchanged() {
        let root = Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]);
        let mut graph = Graph::new();
        explore_component(&mut graph, &root, 0, None);
        retrograde_analyse(&mut graph);

        let (nodes_path, edges_path) = temp_paths("roundtrip");
        graph.export(&nodes_path, &edges_path).unwrap();
        let imported = Graph::import(&nodes_path, &edges_path).unwrap();

        assert_eq!(imported.vertex_count(), graph.vertex_count());
        assert_eq!(imported.edge_count(), graph.edge_count());

        for id in graph.vertex_ids() {
            let vertex = graph.vertex(id);
            let game = Game::from_serialization(vertex.serialization).unwrap();
            let imported_id = imported.get(&game).expect("vertex survived the round trip");
            let imported_vertex = imported.vertex(imported_id);

            assert_eq!(imported_vertex.quality, vertex.quality);
            assert_eq!(imported_vertex.edges.len(), vertex.edges.len());
            for edge in &vertex.edges {
                let twin = imported_vertex
                    .get_edge(&edge.mv)
                    .expect("edge survived the round trip");
                assert_eq!(twin.optimal.unwrap_or(false), edge.is_optimal());
            }
        }

        std::fs::remove_file(nodes_path).ok();
        std::fs::remove_file(edges_path).ok();
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (nodes_path, edges_path) = temp_paths("malformed");

        let root = Game::with_cards(2, 2, [Card::Boar; CARD_COUNT]);
        let serialization = root.serialize().to_base64();

        std::fs::write(
            &nodes_path,
            format!(
                "Id, Quality, image\n\
                 not base64!,Win,x.bmp\n\
                 {serialization},Win,{serialization}.bmp\n"
            ),
        )
        .unwrap();
        std::fs::write(
            &edges_path,
            format!(
                "Source, Target, Pawn, Card, Offset, Optimal\n\
                 {serialization},AAAA,0,0,0,true\n\
                 {serialization},{serialization}\n"
            ),
        )
        .unwrap();

        let graph = Graph::import(&nodes_path, &edges_path).unwrap();
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.edge_count(), 0);

        std::fs::remove_file(nodes_path).ok();
        std::fs::remove_file(edges_path).ok();
    }
}
