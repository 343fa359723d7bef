//! `dsal` command-line tool: exercises create/open/pwrite/pread/resize/
//! delete against an in-process backend.

use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use dsal::{BackendRegistry, DataStore, ObjectId};
use dsal_config::Config;

#[derive(Parser)]
#[command(name = "dsal")]
#[command(about = "Data store abstraction layer CLI", long_about = None)]
struct Cli {
    /// Backend type to dispatch to (resolved from the registry by exact name)
    #[arg(short, long, default_value = "memory")]
    backend: String,

    /// Block size the backend enforces
    #[arg(long, default_value = "4096")]
    bsize: u32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a new object ID and create the backing object
    Create,
    /// Write a file (or stdin) into an object at a given offset
    Put {
        oid: String,
        offset: u64,
        file: String,
    },
    /// Read `count` bytes from an object at a given offset into a file (or stdout)
    Get {
        oid: String,
        offset: u64,
        count: u64,
        file: String,
    },
    /// Resize an object
    Resize {
        oid: String,
        old_size: u64,
        new_size: u64,
    },
    /// Delete an object
    Rm { oid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut registry = BackendRegistry::new();
    registry.register("memory", || Arc::new(dsal_memstore::MemBackend::new()));

    let cfg = Config::parse(&format!(
        "[dstore]\ntype = {}\nbsize = {}\n",
        cli.backend, cli.bsize
    ));

    let store = DataStore::init(&registry, &cfg, 0)
        .await
        .context("failed to initialize dstore")?;

    info!(backend = cli.backend.as_str(), "dstore initialized");

    match cli.command {
        Commands::Create => {
            let oid = store
                .obj_get_new_id()
                .await
                .context("failed to allocate object id")?;
            store
                .obj_create(None, oid)
                .await
                .context("failed to create object")?;
            println!("{}", oid);
        }
        Commands::Put { oid, offset, file } => {
            let oid = parse_oid(&oid)?;
            let handle = store.obj_open(oid).await.context("failed to open object")?;
            let data = read_input(&file).context("failed to read input")?;
            let bs = store.get_bsize(oid).await.context("failed to get block size")?;
            dsal::facade::pwrite(&handle, offset, &data, bs)
                .await
                .context("failed to write object")?;
            handle.close().await.context("failed to close object")?;
            debug!(bytes = data.len(), oid = %oid, "wrote object");
        }
        Commands::Get {
            oid,
            offset,
            count,
            file,
        } => {
            let oid = parse_oid(&oid)?;
            let handle = store.obj_open(oid).await.context("failed to open object")?;
            let bs = store.get_bsize(oid).await.context("failed to get block size")?;
            let mut buf = vec![0u8; count as usize];
            dsal::facade::pread(&handle, offset, &mut buf, bs)
                .await
                .context("failed to read object")?;
            handle.close().await.context("failed to close object")?;
            write_output(&file, &buf).context("failed to write output")?;
        }
        Commands::Resize {
            oid,
            old_size,
            new_size,
        } => {
            let oid = parse_oid(&oid)?;
            let handle = store.obj_open(oid).await.context("failed to open object")?;
            let bs = store.get_bsize(oid).await.context("failed to get block size")?;
            dsal::facade::resize(&handle, old_size, new_size, bs)
                .await
                .context("failed to resize object")?;
            handle.close().await.context("failed to close object")?;
        }
        Commands::Rm { oid } => {
            let oid = parse_oid(&oid)?;
            store
                .obj_delete(None, oid)
                .await
                .context("failed to delete object")?;
        }
    }

    store.fini().await.context("failed to finalize dstore")?;

    Ok(())
}

fn parse_oid(s: &str) -> Result<ObjectId> {
    if s.len() != 32 {
        anyhow::bail!("object id must be 32 hex digits, got {}", s.len());
    }
    let hi = u64::from_str_radix(&s[0..16], 16).context("invalid object id")?;
    let lo = u64::from_str_radix(&s[16..32], 16).context("invalid object id")?;
    Ok(ObjectId::from_parts(hi, lo))
}

fn read_input(file: &str) -> Result<Vec<u8>> {
    if file == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read(file).with_context(|| format!("failed to read file: {file}"))
    }
}

fn write_output(file: &str, data: &[u8]) -> Result<()> {
    if file == "-" {
        io::stdout()
            .write_all(data)
            .context("failed to write to stdout")?;
        io::stdout().flush().context("failed to flush stdout")
    } else {
        std::fs::write(file, data).with_context(|| format!("failed to write file: {file}"))
    }
}
