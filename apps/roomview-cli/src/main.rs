use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use roomview_assets::{FsSource, ImportedNode, import_gltf};
use roomview_render::{DebugTextRenderer, FixedSurface};
use roomview_tools::SceneInspector;
use roomview_viewer::{SceneComposer, ViewerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomview-cli", about = "CLI tool for the room viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Summarize a glTF or GLB file
    Inspect {
        /// Path to the asset
        file: PathBuf,
    },
    /// Compose the room scene headlessly and print one frame
    Compose {
        /// Directory holding `assets/`; overrides the config
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Viewer config file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seconds to wait for room loads
        #[arg(long, default_value = "30")]
        timeout: u64,
        /// Also print the full node hierarchy
        #[arg(long)]
        tree: bool,
    },
}

fn print_node(node: &ImportedNode, depth: usize) {
    let p = node.transform.position;
    println!(
        "{:indent$}{} pos=({:.2}, {:.2}, {:.2}) primitives={}",
        "",
        node.name.as_deref().unwrap_or("-"),
        p.x,
        p.y,
        p.z,
        node.primitives.len(),
        indent = depth * 2
    );
    for primitive in &node.primitives {
        println!(
            "{:indent$}- {} vertices={} triangles={} side={:?}",
            "",
            primitive.material.name,
            primitive.mesh.vertex_count(),
            primitive.mesh.triangle_count(),
            primitive.material.side,
            indent = depth * 2 + 2
        );
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("roomview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", roomview_scene::crate_info());
            println!("assets: {}", roomview_assets::crate_info());
            println!("render: {}", roomview_render::crate_info());
            println!("viewer: {}", roomview_viewer::crate_info());
            println!("tools: {}", roomview_tools::crate_info());
        }
        Commands::Inspect { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let imported = import_gltf(&bytes)?;
            println!(
                "Asset {} scene={:?} nodes={} primitives={}",
                imported.id,
                imported.name,
                imported.node_count(),
                imported.primitive_count()
            );
            for node in &imported.nodes {
                print_node(node, 1);
            }
        }
        Commands::Compose {
            assets,
            config,
            timeout,
            tree,
        } => {
            let mut config = match &config {
                Some(path) => ViewerConfig::from_yaml_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ViewerConfig::default(),
            };
            if let Some(assets) = assets {
                config.asset_root = assets;
            }

            tracing::info!(
                asset_root = %config.asset_root.display(),
                rooms = config.rooms.len(),
                "composing"
            );
            let source = Arc::new(FsSource::new(&config.asset_root));
            let mut composer = SceneComposer::initialize(
                DebugTextRenderer::new(),
                FixedSurface::new(800, 600),
                source,
                &config,
            )?;
            if !composer.wait_for_loads(Duration::from_secs(timeout)) {
                bail!("room loads did not finish within {timeout}s");
            }
            let status = composer.load_status();

            composer.resize();
            print!("{}", composer.advance(0.0));

            let scene = composer.scene();
            println!("{}", SceneInspector::summary(scene));
            println!(
                "Loads: requested={} loaded={} failed={}",
                status.requested, status.loaded, status.failed
            );
            println!("Stencil table:");
            for entry in SceneInspector::stencil_table(scene) {
                println!("  {entry}");
            }
            let unread = SceneInspector::unread_refs(scene);
            if !unread.is_empty() {
                println!("Refs written but never tested: {unread:?}");
            }
            if tree {
                print!("{}", SceneInspector::tree(scene));
            }
        }
    }

    Ok(())
}
