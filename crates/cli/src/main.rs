//! ConceptGraph CLI
//!
//! A command-line interface for building a concept graph from documents
//! and asking questions against it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conceptgraph_agents::{
    extract_keywords, BuildReport, GraphBuilder, LlmClient, ProgressObserver, QaEngine,
};
use conceptgraph_core::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_DOCUMENT_MB};
use conceptgraph_core::{clean_text, AnswerResult, TextChunker};
use conceptgraph_db::{init_memory, init_persistent, Repository};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// ConceptGraph - question answering over a knowledge graph of your documents
#[derive(Parser)]
#[command(name = "conceptgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to ~/.conceptgraph/data)
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    /// Use in-memory database (for testing)
    #[arg(long, global = true)]
    memory: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest text files into the graph
    Ingest {
        /// Paths to text files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Words per chunk
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Normalise whitespace and strip unusual symbols first
        #[arg(long)]
        clean: bool,
    },

    /// Ask a question
    Ask {
        question: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest questions based on the most important concepts
    Suggest,

    /// Show the search terms extracted from a question
    Keywords { question: String },

    /// Export the graph or summarise it
    Graph {
        /// Print every node and edge as JSON
        #[arg(long)]
        json: bool,

        /// Concepts listed in the summary
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show database statistics
    Stats,

    /// Remove every concept, chunk and relation
    Reset,

    /// Delete the local database (fresh start)
    ResetDb,

    /// Interactive mode
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging (stderr keeps stdout clean for --json)
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Commands that never touch the database
    match &cli.command {
        Commands::Keywords { question } => {
            for keyword in extract_keywords(question) {
                println!("{}", keyword);
            }
            return Ok(());
        }
        Commands::ResetDb => {
            let path = resolve_db_path(cli.db_path.clone())?;
            if path.exists() {
                std::fs::remove_dir_all(&path)
                    .with_context(|| format!("Failed to remove db at {}", path.display()))?;
                println!("✓ Removed database at {}", path.display());
            } else {
                println!("Database not found at {}, nothing to remove", path.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let db = if cli.memory {
        info!("Using in-memory database");
        init_memory().await?
    } else {
        let db_path = resolve_db_path(cli.db_path.clone())?;

        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Using database at: {}", db_path.display());
        init_persistent(&db_path).await?
    };

    let repo = Repository::new(db);
    let llm = LlmClient::default_local();

    // Extraction cannot proceed without the model; answering degrades gracefully
    if matches!(cli.command, Commands::Ingest { .. }) {
        let llm_ok = llm.health().await.unwrap_or(false);
        if !llm_ok {
            eprintln!("Error: language model is not reachable.");
            eprintln!("  LLM: {}", llm.base_url());
            anyhow::bail!("Language model unavailable");
        }
    }

    match cli.command {
        Commands::Ingest {
            paths,
            chunk_size,
            clean,
        } => {
            cmd_ingest(repo, llm, paths, chunk_size, clean).await?;
        }
        Commands::Ask { question, json } => {
            cmd_ask(repo, llm, question, json).await?;
        }
        Commands::Suggest => {
            cmd_suggest(repo, llm).await?;
        }
        Commands::Graph { json, limit } => {
            cmd_graph(repo, json, limit).await?;
        }
        Commands::Stats => {
            cmd_stats(repo).await?;
        }
        Commands::Reset => {
            repo.clear_graph().await?;
            println!("✓ Graph cleared");
        }
        Commands::Interactive => {
            cmd_interactive(repo, llm).await?;
        }
        Commands::Keywords { .. } | Commands::ResetDb => {
            // Handled before database init.
        }
    }

    Ok(())
}

fn resolve_db_path(db_path: Option<PathBuf>) -> Result<PathBuf> {
    match db_path {
        Some(path) => Ok(path),
        None => {
            let mut path = dirs::home_dir().context("Could not find home directory")?;
            path.push(".conceptgraph");
            path.push("data");
            Ok(path)
        }
    }
}

fn qa_engine(repo: Repository, llm: LlmClient) -> QaEngine {
    QaEngine::new(Arc::new(repo), Arc::new(llm))
}

/// Prints one line per processed chunk
struct CliProgress {
    source: String,
}

impl ProgressObserver for CliProgress {
    fn on_chunk_started(&mut self, index: usize, total: usize) {
        eprint!("\r  {}: chunk {}/{}", self.source, index + 1, total);
    }

    fn on_complete(&mut self, _report: &BuildReport) {
        eprintln!();
    }
}

async fn cmd_ingest(
    repo: Repository,
    llm: LlmClient,
    paths: Vec<PathBuf>,
    chunk_size: usize,
    clean: bool,
) -> Result<()> {
    let builder = GraphBuilder::new(repo, Arc::new(llm));
    let mut total = BuildReport::default();

    for path in paths {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        TextChunker::validate_size(&content, DEFAULT_MAX_DOCUMENT_MB)
            .with_context(|| format!("Cannot ingest {}", path.display()))?;

        let content = if clean { clean_text(&content) } else { content };
        let source = source_name(&path);
        let chunker = TextChunker::new(chunk_size).with_id_prefix(chunk_id_prefix(&path));
        let chunks = chunker.chunk(&content, &source);

        if chunks.is_empty() {
            println!("• {}: no usable text, skipped", source);
            continue;
        }

        let mut progress = CliProgress {
            source: source.clone(),
        };
        let report = builder.build(&chunks, &mut progress).await?;
        println!(
            "✓ {}: {} chunks, {} concepts, {} relations",
            source, report.chunks_processed, report.concepts_upserted, report.relations_created
        );

        total.chunks_processed += report.chunks_processed;
        total.concepts_upserted += report.concepts_upserted;
        total.relations_created += report.relations_created;
        total.extraction_failures += report.extraction_failures;
    }

    println!("\n✓ Ingestion complete:");
    println!("  • Chunks processed: {}", total.chunks_processed);
    println!("  • Concepts upserted: {}", total.concepts_upserted);
    println!("  • Relations created: {}", total.relations_created);
    if total.extraction_failures > 0 {
        println!("  • Chunks without extraction: {}", total.extraction_failures);
    }

    Ok(())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Chunk id prefix, unique per absolute file path
fn chunk_id_prefix(path: &Path) -> String {
    let full = std::fs::canonicalize(path)
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf());
    format!("{}_chunk", full.display())
}

async fn cmd_ask(repo: Repository, llm: LlmClient, question: String, json: bool) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("Question cannot be empty");
    }

    let engine = qa_engine(repo, llm);
    let result = engine.answer_question(&question).await;

    if json {
        println!("{}", result.to_json_pretty()?);
    } else {
        print_answer(&result);
    }

    Ok(())
}

fn print_answer(result: &AnswerResult) {
    println!("{}", result.answer);
    println!();
    println!("Confidence: {:.2}", result.confidence);

    if !result.graph_highlights.is_empty() {
        println!("Concepts: {}", result.graph_highlights.join(", "));
    }

    if !result.context_sources.is_empty() {
        println!("Sources:");
        for passage in &result.context_sources {
            let preview: String = passage.text.chars().take(80).collect();
            println!(
                "  • {} (chunk {}) - {}{}",
                passage.source,
                passage.chunk_index,
                preview,
                if passage.text.chars().count() > 80 { "..." } else { "" }
            );
        }
    }
}

async fn cmd_suggest(repo: Repository, llm: LlmClient) -> Result<()> {
    let engine = qa_engine(repo, llm);
    for suggestion in engine.suggest_questions().await? {
        println!("• {}", suggestion);
    }
    Ok(())
}

async fn cmd_graph(repo: Repository, json: bool, limit: usize) -> Result<()> {
    let snapshot = repo.graph_snapshot().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let stats = snapshot.stats();
    println!("Graph:");
    println!("  • Concepts: {}", stats.total_nodes);
    println!("  • Relations: {}", stats.total_edges);
    println!("  • Concept types: {}", stats.distinct_types());
    for (concept_type, count) in &stats.type_counts {
        println!("      {}: {}", concept_type, count);
    }
    println!("  • Average importance: {:.2}", stats.average_importance);

    let top = repo.top_concepts_by_importance(limit).await?;
    if !top.is_empty() {
        println!("\nTop concepts:");
        for concept in top {
            println!(
                "  • {} [{}] importance {:.2}, {} mentions",
                concept.name, concept.concept_type, concept.importance, concept.mentions_count
            );
        }
    }

    Ok(())
}

async fn cmd_stats(repo: Repository) -> Result<()> {
    let stats = repo.get_stats().await?;

    println!("Database Statistics:");
    println!("  • Concepts: {}", stats.concept_count);
    println!("  • Chunks: {}", stats.chunk_count);
    println!("  • Relations: {}", stats.relation_count);
    println!("  • Mentions: {}", stats.mention_count);

    Ok(())
}

async fn cmd_interactive(repo: Repository, llm: LlmClient) -> Result<()> {
    let engine = qa_engine(repo.clone(), llm);

    println!("ConceptGraph - Interactive Mode");
    println!("Commands: ask, suggest, stats, help, quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("conceptgraph> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let (cmd, arg) = match line.trim().split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line.trim(), ""),
        };

        match cmd {
            "" => continue,

            "ask" | "a" => {
                if arg.is_empty() {
                    println!("Usage: ask <question>");
                    continue;
                }
                let result = engine.answer_question(arg).await;
                print_answer(&result);
            }

            "suggest" | "s" => match engine.suggest_questions().await {
                Ok(suggestions) => {
                    for suggestion in suggestions {
                        println!("• {}", suggestion);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },

            "stats" => match repo.get_stats().await {
                Ok(s) => println!(
                    "Concepts: {}, Chunks: {}, Relations: {}",
                    s.concept_count, s.chunk_count, s.relation_count
                ),
                Err(e) => println!("Error: {}", e),
            },

            "help" | "h" | "?" => {
                println!("Commands:");
                println!("  ask <question>   - Answer a question from the graph");
                println!("  suggest          - Suggest questions");
                println!("  stats            - Show statistics");
                println!("  quit             - Exit");
            }

            "quit" | "q" | "exit" => {
                println!("Goodbye!");
                break;
            }

            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", cmd);
            }
        }

        println!();
    }

    Ok(())
}
