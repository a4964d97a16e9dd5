use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use rlog::ingest::read_log_file;
use rlog::FieldTree;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .rlog file to decode
    file: PathBuf,

    /// Print the serialized registry as JSON instead of the field tree
    #[arg(long)]
    json: bool,

    /// Include synthetic array item fields in the tree
    #[arg(long)]
    array_items: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let log = read_log_file(&args.file)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    let (min, max) = log.get_timestamp_range();
    info!(
        "decoded {} fields spanning {min:.3}s to {max:.3}s",
        log.get_field_count()
    );

    if args.json {
        let serialized = serde_json::to_string_pretty(&log.to_serialized())
            .context("failed to serialize registry")?;
        println!("{serialized}");
    } else {
        print_tree(&log.get_field_tree(args.array_items), 0);
    }

    Ok(())
}

fn print_tree(node: &FieldTree, depth: usize) {
    for (name, child) in &node.children {
        if child.children.is_empty() {
            println!("{:indent$}{name}", "", indent = depth * 2);
        } else {
            println!("{:indent$}{name}/", "", indent = depth * 2);
            print_tree(child, depth + 1);
        }
    }
}
