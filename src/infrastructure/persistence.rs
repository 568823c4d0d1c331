//! Binary snapshot of an in-progress forward-retrograde run.
//!
//! Little-endian throughout. Sections in order: the call stack, the
//! expanded-vertex set, the unlabelled edges, then every vertex with its
//! quality and edge records. Serializations are written as
//! `SERIALIZATION_BYTES` bytes, MSB-first within each byte.

use crate::domain::card::Card;
use crate::domain::models::{Move, Quality};
use crate::error::Error;
use crate::infrastructure::graph::{Graph, VertexId};
use crate::infrastructure::serialization::{GameSerialization, SERIALIZATION_BYTES};
use crate::infrastructure::stopwatch::Stopwatch;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a suspended forward-retrograde run stood: the expansion stack
/// (outermost first), the vertices whose successors exist, and the edges
/// still awaiting a verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardRetrogradeProgress {
    pub call_stack: Vec<GameSerialization>,
    pub expanded: Vec<GameSerialization>,
    pub unlabelled_edges: Vec<(GameSerialization, GameSerialization)>,
}

/// Periodic-save settings shared by the long-running strategies. The timer
/// pauses while a snapshot is written so the next save does not re-fire
/// immediately.
#[derive(Debug)]
pub struct SaveParameters {
    pub path: PathBuf,
    pub interval: Duration,
    save_timer: Stopwatch,
    runtime_timer: Stopwatch,
}

impl SaveParameters {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> SaveParameters {
        SaveParameters {
            path: path.into(),
            interval,
            save_timer: Stopwatch::new(false),
            runtime_timer: Stopwatch::new(false),
        }
    }

    pub fn start_timers(&mut self) {
        self.save_timer.reset(false);
        self.runtime_timer.play();
    }

    pub fn runtime(&self) -> Duration {
        self.runtime_timer.elapsed()
    }

    pub fn should_save(&self) -> bool {
        !self.interval.is_zero() && self.save_timer.elapsed() >= self.interval
    }

    /// Writes a snapshot; a failed write is reported and the computation
    /// carries on with the partial file left in place.
    pub fn save(&mut self, graph: &Graph, progress: &ForwardRetrogradeProgress) {
        self.save_timer.pause();
        self.runtime_timer.pause();

        log::info!("saving state graph to {}", self.path.display());
        if let Err(error) = graph.save_forward_retrograde(&self.path, progress) {
            log::error!("failed to save {}: {error}", self.path.display());
        }

        self.save_timer.reset(false);
        self.runtime_timer.play();
    }
}

impl Graph {
    /// Snapshots the graph together with the run's progress record.
    pub fn save_forward_retrograde(
        &self,
        path: &Path,
        progress: &ForwardRetrogradeProgress,
    ) -> Result<(), Error> {
        let mut stream = BufWriter::new(File::create(path)?);

        write_u64(&mut stream, progress.call_stack.len() as u64)?;
        for serialization in &progress.call_stack {
            write_serialization(&mut stream, *serialization)?;
        }

        write_u64(&mut stream, progress.expanded.len() as u64)?;
        for serialization in &progress.expanded {
            write_serialization(&mut stream, *serialization)?;
        }

        write_u64(&mut stream, progress.unlabelled_edges.len() as u64)?;
        for (source, target) in &progress.unlabelled_edges {
            write_serialization(&mut stream, *source)?;
            write_serialization(&mut stream, *target)?;
        }

        write_u64(&mut stream, self.vertex_count() as u64)?;
        for vertex in self.vertices() {
            write_serialization(&mut stream, vertex.serialization)?;
            write_quality(&mut stream, vertex.quality)?;

            write_u64(&mut stream, vertex.edges.len() as u64)?;
            for edge in &vertex.edges {
                write_serialization(&mut stream, self.vertex(edge.target).serialization)?;
                write_move(&mut stream, &edge.mv)?;
                write_optional_bool(&mut stream, edge.optimal)?;
            }
        }

        stream.flush()?;
        Ok(())
    }

    /// Reloads a snapshot. Unresolvable references make the whole load
    /// fail; no partial graph is returned.
    pub fn load_forward_retrograde(
        path: &Path,
    ) -> Result<(Graph, ForwardRetrogradeProgress), Error> {
        let mut stream = BufReader::new(File::open(path)?);
        let mut progress = ForwardRetrogradeProgress::default();

        let call_stack_depth = read_u64(&mut stream)?;
        for _ in 0..call_stack_depth {
            progress.call_stack.push(read_serialization(&mut stream)?);
        }

        let expanded_count = read_u64(&mut stream)?;
        for _ in 0..expanded_count {
            progress.expanded.push(read_serialization(&mut stream)?);
        }

        let unlabelled_count = read_u64(&mut stream)?;
        for _ in 0..unlabelled_count {
            let source = read_serialization(&mut stream)?;
            let target = read_serialization(&mut stream)?;
            progress.unlabelled_edges.push((source, target));
        }

        struct EdgeRecord {
            target: GameSerialization,
            mv: Move,
            optimal: Option<bool>,
        }

        let mut graph = Graph::new();
        let mut by_serialization: FxHashMap<GameSerialization, VertexId> = FxHashMap::default();
        let mut edge_records: Vec<(VertexId, Vec<EdgeRecord>)> = Vec::new();

        let vertex_count = read_u64(&mut stream)?;
        for _ in 0..vertex_count {
            let serialization = read_serialization(&mut stream)?;
            let quality = read_quality(&mut stream)?;
            let id = graph.insert_serialized(serialization, quality)?;
            by_serialization.insert(serialization, id);

            let edge_count = read_u64(&mut stream)?;
            let mut records = Vec::new();
            for _ in 0..edge_count {
                records.push(EdgeRecord {
                    target: read_serialization(&mut stream)?,
                    mv: read_move(&mut stream)?,
                    optimal: read_optional_bool(&mut stream)?,
                });
            }
            edge_records.push((id, records));
        }

        for (source, records) in edge_records {
            for record in records {
                let target = *by_serialization.get(&record.target).ok_or_else(|| {
                    Error::MalformedInput(format!("edge target {} is not a vertex", record.target))
                })?;
                if graph.add_edge(source, target, record.mv) {
                    let edge = graph
                        .vertex_mut(source)
                        .edges
                        .last_mut()
                        .expect("edge was just appended");
                    edge.optimal = record.optimal;
                }
            }
        }

        // Every progress entry must resolve against the loaded graph.
        for serialization in progress.call_stack.iter().chain(&progress.expanded) {
            if !by_serialization.contains_key(serialization) {
                return Err(Error::MalformedInput(format!(
                    "progress references unknown vertex {serialization}"
                )));
            }
        }
        for (source, target) in &progress.unlabelled_edges {
            let id = by_serialization.get(source).ok_or_else(|| {
                Error::MalformedInput(format!("progress references unknown vertex {source}"))
            })?;
            if graph.edge_to(*id, *target).is_none() {
                return Err(Error::MalformedInput(format!(
                    "progress references unknown edge {source} -> {target}"
                )));
            }
        }

        Ok((graph, progress))
    }
}

fn write_u64<W: Write>(stream: &mut W, value: u64) -> Result<(), Error> {
    stream.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn read_u64<R: Read>(stream: &mut R) -> Result<u64, Error> {
    let mut bytes = [0u8; 8];
    stream.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

fn write_serialization<W: Write>(
    stream: &mut W,
    serialization: GameSerialization,
) -> Result<(), Error> {
    stream.write_all(&serialization.to_bytes())?;
    Ok(())
}

fn read_serialization<R: Read>(stream: &mut R) -> Result<GameSerialization, Error> {
    let mut bytes = [0u8; SERIALIZATION_BYTES];
    stream.read_exact(&mut bytes)?;
    Ok(GameSerialization::from_bytes(&bytes))
}

fn write_quality<W: Write>(stream: &mut W, quality: Option<Quality>) -> Result<(), Error> {
    let byte = match quality {
        None => 0u8,
        Some(Quality::Win) => 1,
        Some(Quality::Draw) => 2,
        Some(Quality::Lose) => 3,
    };
    stream.write_all(&[byte])?;
    Ok(())
}

fn read_quality<R: Read>(stream: &mut R) -> Result<Option<Quality>, Error> {
    let mut byte = [0u8; 1];
    stream.read_exact(&mut byte)?;
    match byte[0] {
        0 => Ok(None),
        1 => Ok(Some(Quality::Win)),
        2 => Ok(Some(Quality::Draw)),
        3 => Ok(Some(Quality::Lose)),
        other => Err(Error::MalformedInput(format!("invalid quality byte {other:#04x}"))),
    }
}

fn write_move<W: Write>(stream: &mut W, mv: &Move) -> Result<(), Error> {
    write_u64(stream, mv.pawn_id as u64)?;
    write_u64(stream, mv.card.index() as u64)?;
    write_u64(stream, mv.offset_id as u64)
}

fn read_move<R: Read>(stream: &mut R) -> Result<Move, Error> {
    let pawn_id = read_u64(stream)? as usize;
    let card_index = read_u64(stream)? as usize;
    let offset_id = read_u64(stream)? as usize;

    let card = Card::from_index(card_index)
        .ok_or_else(|| Error::MalformedInput(format!("invalid card index {card_index}")))?;

    Ok(Move {
        pawn_id,
        card,
        offset_id,
    })
}

fn write_optional_bool<W: Write>(stream: &mut W, value: Option<bool>) -> Result<(), Error> {
    let byte = match value {
        None => 0xFFu8,
        Some(false) => 0x00,
        Some(true) => 0x01,
    };
    stream.write_all(&[byte])?;
    Ok(())
}

fn read_optional_bool<R: Read>(stream: &mut R) -> Result<Option<bool>, Error> {
    let mut byte = [0u8; 1];
    stream.read_exact(&mut byte)?;
    match byte[0] {
        0xFF => Ok(None),
        0x00 => Ok(Some(false)),
        0x01 => Ok(Some(true)),
        other => Err(Error::MalformedInput(format!(
            "invalid optional bool {other:#04x}"
        ))),
    }
}
