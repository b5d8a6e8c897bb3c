use std::{env, net::TcpStream, process};

use tracing::warn;
use tracing_subscriber::EnvFilter;

use graphcrawl::{
    AppConfig, CrawlSession, FanoutDispatcher, GraphCrawlError, GraphStore, SqliteStore,
    backends::{AnalyticBackend, LineRpc, StoreMirror, StreamMirror, VertexRpcMirror},
    config::BackendConfig,
    paths::import_path_file,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", AppConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match AppConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    let store = match open_store(&config.database) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    if let Err(err) = run_command(store, &config) {
        eprintln!("command failed: {err}");
        process::exit(1);
    }
}

fn open_store(database: &str) -> Result<SqliteStore, GraphCrawlError> {
    if database == "memory" {
        SqliteStore::open_in_memory()
    } else {
        SqliteStore::open(database)
    }
}

fn run_command(store: SqliteStore, config: &AppConfig) -> Result<(), GraphCrawlError> {
    match config.command.as_str() {
        "crawl" => run_crawl(store, config),
        "import" => run_import(store, config),
        "status" => run_status(&store),
        other => Err(GraphCrawlError::invalid_input(format!(
            "unknown command {other}, expected crawl|import|status"
        ))),
    }
}

fn run_crawl(store: SqliteStore, config: &AppConfig) -> Result<(), GraphCrawlError> {
    let mut dispatcher = build_dispatcher(&config.backends);
    if config.backends.clear {
        dispatcher.clear_all();
    }
    let mut session = CrawlSession::new(store, dispatcher, config.crawl.clone())?;
    let outcome = session.run()?;
    println!(
        "crawl done: {:?}, steps={}, epochs={}",
        outcome.termination, outcome.steps, outcome.epochs
    );
    print_report(&session.report());
    Ok(())
}

fn run_import(store: SqliteStore, config: &AppConfig) -> Result<(), GraphCrawlError> {
    if config.import.path_file.is_empty() {
        return Err(GraphCrawlError::invalid_input(
            "import requires --paths FILE",
        ));
    }
    let mut dispatcher = build_dispatcher(&config.backends);
    if config.backends.clear {
        dispatcher.clear_all();
    }
    let stats = import_path_file(&store, &mut dispatcher, &config.import)?;
    dispatcher.finish_all();
    println!(
        "import done: paths={}, nodes created={}/{}, edges created={}/{}",
        stats.paths,
        stats.nodes_created,
        stats.nodes_resolved,
        stats.edges_created,
        stats.edges_resolved
    );
    print_report(&dispatcher.report());
    Ok(())
}

fn run_status(store: &SqliteStore) -> Result<(), GraphCrawlError> {
    let nodes = store.estimate_node_count()?;
    let edges = store.estimate_edge_count()?;
    println!("nodes={nodes} edges={edges}");
    Ok(())
}

/// A mirror that fails to come up is logged and skipped; the run continues
/// with the backends that did connect.
fn build_dispatcher(backends: &BackendConfig) -> FanoutDispatcher {
    let mut dispatcher = FanoutDispatcher::new();
    if let Some(path) = &backends.gexf {
        dispatcher.add_backend(Box::new(AnalyticBackend::new(path.clone())));
    }
    if let Some(addr) = &backends.stream {
        match TcpStream::connect(addr) {
            Ok(stream) => dispatcher.add_backend(Box::new(StreamMirror::new(stream))),
            Err(err) => warn!(addr = addr.as_str(), error = %err, "stream backend skipped"),
        }
    }
    if let Some(addr) = &backends.rpc {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                dispatcher.add_backend(Box::new(VertexRpcMirror::new(LineRpc::new(stream))));
            }
            Err(err) => warn!(addr = addr.as_str(), error = %err, "rpc backend skipped"),
        }
    }
    if let Some(path) = &backends.mirror_db {
        match SqliteStore::open(path) {
            Ok(store) => dispatcher.add_backend(Box::new(StoreMirror::new(store))),
            Err(err) => warn!(path = path.as_str(), error = %err, "mirror store skipped"),
        }
    }
    dispatcher
}

fn print_report(report: &graphcrawl::ReplicationReport) {
    for backend in &report.backends {
        println!(
            "backend {}: nodes={} edges={} failures={}",
            backend.name, backend.nodes_written, backend.edges_written, backend.failures
        );
    }
}
