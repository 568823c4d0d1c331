use crate::config::SolverConfig;
use crate::domain::game::Game;
use crate::domain::models::Quality;
use crate::error::Error;
use crate::infrastructure::graph::forward::resume_forward_retrograde;
use crate::infrastructure::graph::{Graph, VertexId};
use crate::infrastructure::persistence::{ForwardRetrogradeProgress, SaveParameters};
use std::time::Instant;

/// How to build and label the reachable graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Expand the full component, then run the global retrograde pass.
    Component { max_depth: usize },
    /// Interleave expansion and labelling; stop once the root is settled.
    ForwardRetrograde,
    /// Parallel bounded-depth exploration, then the global pass.
    DispersedFrontier { depth: usize, threads: usize },
}

impl Strategy {
    pub fn from_config(config: &SolverConfig) -> Result<Strategy, Error> {
        match config.strategy.kind.as_str() {
            "component" => Ok(Strategy::Component {
                max_depth: config.strategy.max_depth,
            }),
            "forward-retrograde" => Ok(Strategy::ForwardRetrograde),
            "dispersed-frontier" => Ok(Strategy::DispersedFrontier {
                depth: config.strategy.task_depth,
                threads: config.compute.concurrency,
            }),
            other => Err(Error::MalformedInput(format!(
                "unknown strategy \"{other}\""
            ))),
        }
    }
}

/// Driver: runs a strategy against a graph and reports the root's value.
pub struct Solver {
    pub strategy: Strategy,
    pub save: Option<SaveParameters>,
}

impl Solver {
    pub fn new(strategy: Strategy) -> Solver {
        Solver {
            strategy,
            save: None,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Result<Solver, Error> {
        let strategy = Strategy::from_config(config)?;
        let save = config
            .save
            .path
            .as_ref()
            .map(|path| SaveParameters::new(path, config.save_interval()));

        Ok(Solver { strategy, save })
    }

    pub fn with_save(mut self, save: SaveParameters) -> Solver {
        self.save = Some(save);
        self
    }

    /// Builds the graph for `root` and returns its quality, if the
    /// strategy settled it.
    pub fn solve(&mut self, graph: &mut Graph, root: &Game) -> Option<Quality> {
        let start = Instant::now();

        let root_id = match self.strategy {
            Strategy::Component { max_depth } => {
                let root_id = graph.explore_component(root, max_depth, self.save.as_mut());
                graph.retrograde_analyse();
                root_id
            }
            Strategy::ForwardRetrograde => graph.forward_retrograde(root, self.save.as_mut()),
            Strategy::DispersedFrontier { depth, threads } => {
                graph.dispersed_frontier(root, depth, threads)
            }
        };

        self.report(graph, start, Some(root_id));
        graph.vertex(root_id).quality
    }

    /// Continues a forward-retrograde run restored from a snapshot.
    pub fn resume(
        &mut self,
        graph: &mut Graph,
        progress: &ForwardRetrogradeProgress,
    ) -> Result<Option<Quality>, Error> {
        let start = Instant::now();
        let root_id = resume_forward_retrograde(graph, progress, self.save.as_mut())?;

        self.report(graph, start, root_id);
        Ok(root_id.and_then(|id| graph.vertex(id).quality))
    }

    fn report(&self, graph: &Graph, start: Instant, root_id: Option<VertexId>) {
        let outcome = root_id
            .and_then(|id| graph.vertex(id).quality)
            .map(|quality| quality.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        log::info!(
            "run time: {}s; analysed {} nodes and {} edges; root: {outcome}",
            start.elapsed().as_secs(),
            graph.vertex_count(),
            graph.edge_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Card;
    use crate::domain::game::CARD_COUNT;

    fn micro_root() -> Game {
        Game::with_cards(2, 2, [Card::Boar; CARD_COUNT])
    }

    #[test]
    fn every_strategy_settles_the_micro_board() {
        for strategy in [
            Strategy::Component { max_depth: 0 },
            Strategy::ForwardRetrograde,
            Strategy::DispersedFrontier {
                depth: 2,
                threads: 2,
            },
        ] {
            let mut graph = Graph::new();
            let quality = Solver::new(strategy.clone()).solve(&mut graph, &micro_root());
            assert_eq!(quality, Some(Quality::Win), "{strategy:?}");
        }
    }

    #[test]
    fn strategies_come_from_the_config() {
        let mut config = SolverConfig::default();
        assert_eq!(
            Strategy::from_config(&config).unwrap(),
            Strategy::ForwardRetrograde
        );

        config.strategy.kind = "dispersed-frontier".to_string();
        config.strategy.task_depth = 3;
        config.compute.concurrency = 5;
        assert_eq!(
            Strategy::from_config(&config).unwrap(),
            Strategy::DispersedFrontier {
                depth: 3,
                threads: 5
            }
        );

        config.strategy.kind = "minimax".to_string();
        assert!(Strategy::from_config(&config).is_err());
    }
}
