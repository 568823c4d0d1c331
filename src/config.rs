use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Solver settings, loaded from `Solver.toml` with `ONITAMA_*` environment
/// overrides on top; defaults cover everything else.
#[derive(Debug, Deserialize, Clone)]
pub struct SolverConfig {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    #[serde(default)]
    pub save: SaveConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    /// "component", "forward-retrograde" or "dispersed-frontier".
    pub kind: String,
    /// Expansion burst depth for the component strategy; 0 means
    /// unbounded.
    pub max_depth: usize,
    /// Per-task depth for the dispersed frontier.
    pub task_depth: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComputeConfig {
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveConfig {
    pub path: Option<PathBuf>,
    pub interval_secs: u64,
}

impl SolverConfig {
    pub fn load() -> Self {
        let config_path = "Solver.toml";
        let mut config = if Path::new(config_path).exists() {
            match fs::read_to_string(config_path)
                .map_err(|error| error.to_string())
                .and_then(|contents| toml::from_str(&contents).map_err(|error| error.to_string()))
            {
                Ok(config) => config,
                Err(error) => {
                    log::warn!("failed to load {config_path}: {error}; using defaults");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.merge_env();

        log::info!(
            "solver configuration: strategy {} (max depth {}, task depth {}), {} threads",
            config.strategy.kind,
            config.strategy.max_depth,
            config.strategy.task_depth,
            config.compute.concurrency
        );
        if let Some(path) = &config.save.path {
            log::info!(
                "intermediate saves: {} every {}s",
                path.display(),
                config.save.interval_secs
            );
        }

        config
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save.interval_secs)
    }

    fn merge_env(&mut self) {
        if let Ok(value) = std::env::var("ONITAMA_STRATEGY") {
            self.strategy.kind = value;
        }
        if let Ok(value) = std::env::var("ONITAMA_MAX_DEPTH") {
            if let Ok(parsed) = value.parse() {
                self.strategy.max_depth = parsed;
            }
        }
        if let Ok(value) = std::env::var("ONITAMA_TASK_DEPTH") {
            if let Ok(parsed) = value.parse() {
                self.strategy.task_depth = parsed;
            }
        }
        if let Ok(value) = std::env::var("ONITAMA_CONCURRENCY") {
            if let Ok(parsed) = value.parse() {
                self.compute.concurrency = parsed;
            }
        }
        if let Ok(value) = std::env::var("ONITAMA_SAVE_PATH") {
            self.save.path = Some(PathBuf::from(value));
        }
        if let Ok(value) = std::env::var("ONITAMA_SAVE_INTERVAL") {
            if let Ok(parsed) = value.parse() {
                self.save.interval_secs = parsed;
            }
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            compute: ComputeConfig::default(),
            save: SaveConfig::default(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: "forward-retrograde".to_string(),
            max_depth: 0,
            task_depth: 4,
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval_secs: 0,
        }
    }
}
