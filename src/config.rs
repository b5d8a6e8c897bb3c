use std::{fs, str::FromStr};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Bfs,
    Dfs,
    Walk,
}

impl Default for CrawlMode {
    fn default() -> Self {
        CrawlMode::Bfs
    }
}

impl FromStr for CrawlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bfs" => Ok(CrawlMode::Bfs),
            "dfs" => Ok(CrawlMode::Dfs),
            "walk" => Ok(CrawlMode::Walk),
            other => Err(format!("unknown mode {other}, expected bfs|dfs|walk")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub mode: CrawlMode,
    pub seeds: Vec<i64>,
    /// 0 = unbounded.
    pub max_depth: u32,
    /// Percent chance in [0,100] to abandon the frontier before an expansion.
    /// Only meaningful for unbounded exploration.
    pub restart_probability: u8,
    /// Upper bound on expansions for unattended runs; 0 = unlimited.
    pub step_limit: usize,
    /// Throttling sleep after each expansion, milliseconds.
    pub pace_ms: u64,
    /// Explicit RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            mode: CrawlMode::Bfs,
            seeds: Vec::new(),
            max_depth: 0,
            restart_probability: 0,
            step_limit: 0,
            pace_ms: 0,
            rng_seed: None,
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.seeds.is_empty() {
            return Err("at least one seed node id is required".to_string());
        }
        if self.restart_probability > 100 {
            return Err("restart probability must be in 0..=100".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// GEXF output path; enables the analytic backend.
    pub gexf: Option<String>,
    /// host:port of the streamed-message backend.
    pub stream: Option<String>,
    /// host:port of the vertex RPC backend.
    pub rpc: Option<String>,
    /// Path of a second durable store to mirror into.
    pub mirror_db: Option<String>,
    /// Wipe the mirrors before starting.
    pub clear: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub path_file: String,
    pub rel_type: String,
    /// Throttling sleep between nodes within one path, milliseconds.
    pub node_pace_ms: u64,
    /// Throttling sleep between paths, milliseconds.
    pub path_pace_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            path_file: String::new(),
            rel_type: "leads_to".to_string(),
            node_pace_ms: 0,
            path_pace_ms: 0,
        }
    }
}

/// Full command-line surface, loaded once before the core starts. A JSON
/// config file may seed every field; flags override file values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub command: String,
    pub database: String,
    pub crawl: CrawlConfig,
    pub backends: BackendConfig,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut config = AppConfig {
            command: "status".to_string(),
            database: "memory".to_string(),
            ..AppConfig::default()
        };
        // A config file is applied first so later flags win.
        let mut iter = args.iter().skip(1);
        if let Some(pos) = args.iter().position(|a| *a == "--config") {
            let path = args
                .get(pos + 1)
                .ok_or_else(|| "--config requires a value".to_string())?;
            let raw = fs::read_to_string(path).map_err(|e| format!("config {path}: {e}"))?;
            config = serde_json::from_str(&raw).map_err(|e| format!("config {path}: {e}"))?;
            if config.command.is_empty() {
                config.command = "status".to_string();
            }
            if config.database.is_empty() {
                config.database = "memory".to_string();
            }
        }
        while let Some(arg) = iter.next() {
            match *arg {
                "--config" => {
                    iter.next();
                }
                "--db" | "--database" => {
                    config.database = required(&mut iter, "--db")?;
                }
                "--mode" => {
                    config.crawl.mode = required(&mut iter, "--mode")?.parse()?;
                }
                "--seed" => {
                    for part in required(&mut iter, "--seed")?.split(',') {
                        let id = part
                            .trim()
                            .parse::<i64>()
                            .map_err(|_| format!("--seed: {part} is not a node id"))?;
                        config.crawl.seeds.push(id);
                    }
                }
                "--max-depth" => {
                    config.crawl.max_depth = parse_flag(&mut iter, "--max-depth")?;
                }
                "--restart" => {
                    config.crawl.restart_probability = parse_flag(&mut iter, "--restart")?;
                }
                "--step-limit" => {
                    config.crawl.step_limit = parse_flag(&mut iter, "--step-limit")?;
                }
                "--pace-ms" => {
                    config.crawl.pace_ms = parse_flag(&mut iter, "--pace-ms")?;
                }
                "--rng-seed" => {
                    config.crawl.rng_seed = Some(parse_flag(&mut iter, "--rng-seed")?);
                }
                "--gexf" => {
                    config.backends.gexf = Some(required(&mut iter, "--gexf")?);
                }
                "--stream" => {
                    config.backends.stream = Some(required(&mut iter, "--stream")?);
                }
                "--rpc" => {
                    config.backends.rpc = Some(required(&mut iter, "--rpc")?);
                }
                "--mirror-db" => {
                    config.backends.mirror_db = Some(required(&mut iter, "--mirror-db")?);
                }
                "--clear" => {
                    config.backends.clear = true;
                }
                "--paths" => {
                    config.import.path_file = required(&mut iter, "--paths")?;
                }
                "--rel-type" => {
                    config.import.rel_type = required(&mut iter, "--rel-type")?;
                }
                "--node-pace-ms" => {
                    config.import.node_pace_ms = parse_flag(&mut iter, "--node-pace-ms")?;
                }
                "--path-pace-ms" => {
                    config.import.path_pace_ms = parse_flag(&mut iter, "--path-pace-ms")?;
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag {other}"));
                }
                _ => {
                    config.command = arg.to_string();
                }
            }
        }
        Ok(config)
    }

    pub fn help() -> &'static str {
        "Usage: graphcrawl [crawl|import|status] [options]\n\
         \n\
         Common:\n\
           --db memory|PATH       durable store (default memory)\n\
           --config PATH          JSON config file, flags override it\n\
         Crawl:\n\
           --mode bfs|dfs|walk    exploration mode (default bfs)\n\
           --seed ID[,ID...]      seed node ids (repeatable)\n\
           --max-depth N          depth bound, 0 = unbounded\n\
           --restart N            restart probability 0-100\n\
           --step-limit N         stop after N expansions, 0 = unlimited\n\
           --pace-ms N            sleep between expansions\n\
           --rng-seed N           fixed RNG seed\n\
         Import:\n\
           --paths PATH           path file to import\n\
           --rel-type NAME        chain relationship type (default leads_to)\n\
           --node-pace-ms N       sleep between nodes in a path\n\
           --path-pace-ms N       sleep between paths\n\
         Backends:\n\
           --gexf PATH            write analytic graph to a GEXF file\n\
           --stream HOST:PORT     streamed-message backend\n\
           --rpc HOST:PORT        vertex RPC backend\n\
           --mirror-db PATH       second durable store\n\
           --clear                wipe mirrors before starting\n"
    }
}

fn required<'a, I>(iter: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item = &'a &'a str>,
{
    iter.next()
        .map(|s| s.to_string())
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_flag<'a, I, T>(iter: &mut I, flag: &str) -> Result<T, String>
where
    I: Iterator<Item = &'a &'a str>,
    T: FromStr,
{
    let raw = required(iter, flag)?;
    raw.parse()
        .map_err(|_| format!("{flag}: invalid value {raw}"))
}
