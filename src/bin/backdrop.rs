use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite an image as a backdrop and write the visible surface as a PNG.
    Frame(FrameArgs),
    /// Print the resolved layout mode and placement as JSON.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Backdrop options JSON (layout, filters, scheduler).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Container width in pixels.
    #[arg(long)]
    width: u32,

    /// Container height in pixels.
    #[arg(long)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Backdrop options JSON (layout, filters, scheduler).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Container width in pixels.
    #[arg(long)]
    width: u32,

    /// Container height in pixels.
    #[arg(long)]
    height: u32,

    /// Source width in pixels.
    #[arg(long)]
    source_width: u32,

    /// Source height in pixels.
    #[arg(long)]
    source_height: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<backdrop::BackdropOpts> {
    match path {
        Some(p) => Ok(backdrop::BackdropOpts::from_json_file(p)?),
        None => Ok(backdrop::BackdropOpts::default()),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let opts = read_opts(args.config.as_deref())?;
    let container = backdrop::Size::new(args.width, args.height);
    let still = backdrop::StillImage::open(&args.in_path)?;

    let host = backdrop::OffscreenHost::new(container);
    let mut bd = backdrop::Backdrop::new(host, opts)?;
    bd.render(backdrop::SourceObject::Image(still), backdrop::HostTime(0))?;

    let surface = bd
        .host()
        .presented()
        .context("backdrop produced no frame")?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        surface.data(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    bd.teardown();
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let opts = read_opts(args.config.as_deref())?;
    let mode = opts.render.layout.resolve()?;
    let placement = backdrop::Placement::resolve(
        mode,
        backdrop::Size::new(args.width, args.height),
        backdrop::Size::new(args.source_width, args.source_height),
    );

    let out = serde_json::json!({
        "mode": mode,
        "placement": placement,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
