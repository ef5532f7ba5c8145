use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use chunkloom::config::Config;
use chunkloom::core::orchestrator::{execute_query, QueryStructureDto, TopicQueryDto};
use chunkloom::ingest;
use chunkloom::store::MemoryStore;

#[derive(Parser)]
#[command(
    name = "chunkloom",
    about = "Local-first corpus reduction — packs the most relevant passages of a document collection into size-bounded super chunks for pasting into an external chat model",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a document to the library (.md, .txt, .text, .rst)
    Add {
        /// Path to the document file
        path: PathBuf,
    },
    /// Reindex an already-added document (rebuilds its chunk set and index)
    Reindex {
        /// Path to the document file
        path: PathBuf,
    },
    /// Ask one or more questions across the indexed documents
    Query {
        /// Question to ask (repeat --topic for more than one)
        #[arg(short, long = "topic")]
        topics: Vec<String>,
        /// Document ids to search (default: every indexed document)
        #[arg(short, long)]
        document: Vec<i64>,
        /// Named collection to search instead of explicit --document ids
        #[arg(long)]
        collection: Option<i64>,
        /// Account tier: standard or large
        #[arg(long, default_value = "standard")]
        tier: String,
        /// Spatial filter applied to every topic: auto, concentrated, or spread
        #[arg(long, default_value = "auto")]
        spatial: String,
        /// Keep at most N super chunks per topic's primary section
        #[arg(long)]
        limit_super_chunks: bool,
        /// Max super chunks retained per topic when --limit-super-chunks is set
        #[arg(long, default_value_t = 3)]
        max_super_chunks_per_topic: usize,
        /// Write each super chunk to superchunk-{n}.txt under this directory
        /// instead of printing to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List all indexed documents
    List,
    /// Delete an indexed document by id
    Delete {
        /// Document id to delete (as shown in `chunkloom list`)
        id: i64,
    },
    /// Show index statistics
    Stats,
}

fn store_path() -> Result<PathBuf> {
    let home = dirs_home()?;
    Ok(home.join(".chunkloom").join("store.json"))
}

fn dirs_home() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")
}

#[derive(serde::Serialize, serde::Deserialize, Default)]
struct Snapshot {
    documents: Vec<chunkloom::types::Document>,
    chunks: Vec<chunkloom::types::Chunk>,
    indices: Vec<(i64, chunkloom::types::CoOccurrenceIndex)>,
}

async fn load_store() -> Result<MemoryStore> {
    let store = MemoryStore::new();
    let path = store_path()?;
    if !path.exists() {
        return Ok(store);
    }
    let raw = std::fs::read_to_string(&path).context("failed to read store snapshot")?;
    let snapshot: Snapshot = serde_json::from_str(&raw).context("corrupt store snapshot")?;
    for doc in snapshot.documents {
        store.put_document(doc).await;
    }
    store.put_chunks(snapshot.chunks).await;
    for (doc_id, index) in snapshot.indices {
        store.add_vectors(doc_id, index).await;
    }
    Ok(store)
}

async fn save_store(store: &MemoryStore) -> Result<()> {
    let path = store_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create ~/.chunkloom")?;
    }

    let documents = store.list_documents().await;
    let mut chunks = Vec::new();
    let mut indices = Vec::new();
    for doc in &documents {
        chunks.extend(store.get_chunks_by_document(doc.id).await);
        if let Some(index) = store.get_vectors(doc.id).await {
            indices.push((doc.id, index));
        }
    }

    let snapshot = Snapshot { documents, chunks, indices };
    let raw = serde_json::to_string_pretty(&snapshot).context("failed to serialize store")?;
    std::fs::write(&path, raw).context("failed to write store snapshot")?;
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("CHUNKLOOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Add { path } => cmd_add(&path).await,
        Commands::Reindex { path } => cmd_reindex(&path).await,
        Commands::Query {
            topics,
            document,
            collection,
            tier,
            spatial,
            limit_super_chunks,
            max_super_chunks_per_topic,
            out,
        } => {
            cmd_query(
                topics,
                document,
                collection,
                &tier,
                &spatial,
                limit_super_chunks,
                max_super_chunks_per_topic,
                out.as_deref(),
            )
            .await
        }
        Commands::List => cmd_list().await,
        Commands::Delete { id } => cmd_delete(id).await,
        Commands::Stats => cmd_stats().await,
    }
}

async fn cmd_add(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let store = load_store().await?;
    let config = Config::from_env();
    let chunks = ingest::ingest_file(path, &store, &config).await?;
    save_store(&store).await?;

    println!("\nSuccessfully indexed {chunks} chunks from {}", path.display());
    Ok(())
}

async fn cmd_reindex(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let store = load_store().await?;
    let doc_id = ingest::document_id_for(path);
    let removed = store.delete_document(doc_id).await;

    let config = Config::from_env();
    let chunks = ingest::ingest_file(path, &store, &config).await?;
    save_store(&store).await?;

    println!(
        "\nReindexed {}: removed {removed} old chunks, indexed {chunks} new chunks",
        path.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_query(
    topics: Vec<String>,
    document_ids: Vec<i64>,
    collection: Option<i64>,
    tier: &str,
    spatial: &str,
    limit_super_chunks: bool,
    max_super_chunks_per_topic: usize,
    out: Option<&Path>,
) -> Result<()> {
    if topics.is_empty() {
        anyhow::bail!("at least one --topic is required");
    }

    let store = load_store().await?;

    let (source_type, document_ids, collection_id) = if let Some(collection_id) = collection {
        ("collection".to_string(), Vec::new(), Some(collection_id))
    } else {
        let document_ids = if document_ids.is_empty() {
            store.list_documents().await.into_iter().map(|d| d.id).collect()
        } else {
            document_ids
        };
        if document_ids.is_empty() {
            println!("No documents indexed. Add one with: chunkloom add <path>");
            return Ok(());
        }
        ("documents".to_string(), document_ids, None)
    };

    let tier_enum = chunkloom::config::Tier::parse(tier)
        .with_context(|| format!("unknown account tier: {tier}"))?;

    let query = QueryStructureDto {
        version: "2.3".to_string(),
        account_tier: tier.to_string(),
        max_chars_per_super_chunk: tier_enum.super_chunk_size(),
        source_type,
        document_ids,
        collection_id,
        topics: topics
            .into_iter()
            .map(|question| TopicQueryDto {
                topic_id: None,
                question,
                spatial_category: spatial.to_string(),
            })
            .collect(),
        limit_super_chunks,
        max_super_chunks_per_topic,
    };

    let config = Config::from_env();
    let result = execute_query(&query, &store, &config, chrono::Utc::now(), None, None)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    match out {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("failed to create --out directory")?;
            for (i, sc) in result.super_chunks.iter().enumerate() {
                let path = dir.join(format!("superchunk-{}.txt", i + 1));
                std::fs::write(&path, &sc.content)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            println!("Wrote {} super chunk(s) to {}", result.super_chunks.len(), dir.display());
        }
        None => {
            for (i, sc) in result.super_chunks.iter().enumerate() {
                println!("{}", sc.content);
                if i + 1 < result.super_chunks.len() {
                    println!();
                }
            }
        }
    }

    Ok(())
}

async fn cmd_list() -> Result<()> {
    let store = load_store().await?;
    let documents = store.list_documents().await;

    if documents.is_empty() {
        println!("No documents indexed. Add one with: chunkloom add <path>");
        return Ok(());
    }

    println!("Indexed documents:\n");
    for doc in &documents {
        let chunks = store.chunk_count(doc.id).await;
        println!("  {:<10} {}  ({chunks} chunks)", doc.id, doc.name);
    }
    println!("\n  Total: {} document(s)", documents.len());
    Ok(())
}

async fn cmd_delete(id: i64) -> Result<()> {
    let store = load_store().await?;
    let deleted = store.delete_document(id).await;
    save_store(&store).await?;

    if deleted > 0 {
        println!("Deleted {deleted} chunks for document {id}");
    } else {
        println!("No chunks found for document {id}");
        println!("Use `chunkloom list` to see indexed documents.");
    }
    Ok(())
}

async fn cmd_stats() -> Result<()> {
    let store = load_store().await?;
    let (documents, chunks, vocabulary) = store.stats().await;

    if documents > 0 {
        println!("Chunkloom Stats");
        println!("  Documents:  {documents}");
        println!("  Chunks:     {chunks}");
        println!("  Vocabulary: {vocabulary} distinct terms");
    } else {
        println!("No documents indexed. Add one with: chunkloom add <path>");
    }
    Ok(())
}
