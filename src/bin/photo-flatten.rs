use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use photo_flatten::{
    Configurable, EditProfile, Editor, EditorConfig, ExportFilters, ImageHandoff,
};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "photo-flatten", version, about = "Flatten an image with an edit profile")]
struct Cli {
    /// Input image.
    input: PathBuf,

    /// Edit profile JSON (adjustments, geometry, texts).
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file, or a directory to write `<fileStem>.<ext>` into.
    #[arg(long)]
    out: Option<PathBuf>,

    /// MIME type to export as. Defaults to the one guessed from the input path.
    #[arg(long)]
    mime: Option<String>,

    /// Bake only brightness, contrast and saturation.
    #[arg(long, default_value_t = false)]
    tone_only: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_json(&read_text(path)?)
            .with_context(|| format!("parse config '{}'", path.display()))?,
        None => EditorConfig::default(),
    };
    if cli.tone_only {
        config = config.with_export_filters(ExportFilters::ToneOnly);
    }

    let mime_type = match cli.mime.clone() {
        Some(mime) => mime,
        None => image::ImageFormat::from_path(&cli.input)
            .map(|f| f.to_mime_type().to_string())
            .with_context(|| format!("cannot guess image type of '{}'", cli.input.display()))?,
    };
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("read input '{}'", cli.input.display()))?;

    let mut editor = Editor::from_handoff(Some(ImageHandoff::new(bytes, mime_type)), config)?;
    let Some(session) = editor.session_mut() else {
        anyhow::bail!("'{}' is not an image", cli.input.display());
    };

    if let Some(path) = &cli.profile {
        let profile = EditProfile::from_json(&read_text(path)?)
            .with_context(|| format!("parse profile '{}'", path.display()))?;
        session.apply_profile(&profile);
    }

    let Some(exported) = editor.export()? else {
        anyhow::bail!("nothing to export");
    };

    let out = match cli.out {
        Some(path) if path.is_dir() => path.join(&exported.file_name),
        Some(path) => path,
        None => PathBuf::from(&exported.file_name),
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out, &exported.bytes)
        .with_context(|| format!("write '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {})",
        out.display(),
        exported.width,
        exported.height,
        exported.mime_type
    );
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}
