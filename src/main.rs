//! hoverlay 命令行入口

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hoverlay::env::{core::LogLevel, generate_env_docs, EnvVar};
use hoverlay::overlay::{
    Granularity, MonospaceLayout, OverlayContext, SegmentLocator, TriggerController,
    UnicodeSegmenter,
};
use hoverlay::parsers::html::{html_to_dom, serialize_document};
use hoverlay::settings::{LanguagePair, Modifier, TriggerMode};
use hoverlay::translation::config::constants::SUPPORTED_LANGUAGES;
use hoverlay::translation::{
    availability_status, ConfigManager, DomBanner, GlossaryEngine, NoticeSink, OverlayConfig,
    StatusLevel, TranslationEngine, TranslationError,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "hoverlay", version, about = "Hover-triggered in-place translation overlays")]
struct Cli {
    /// Configuration file (TOML or JSON); defaults to the standard search paths
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the word or sentence under a point of the monospace layout
    Locate {
        file: PathBuf,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(short, long, default_value = "word")]
        granularity: Granularity,
        /// Source language used for segmentation
        #[arg(long)]
        lang: Option<String>,
    },
    /// Trigger one translation at a point and print the resulting document
    Overlay {
        file: PathBuf,
        #[arg(short, long)]
        glossary: Option<PathBuf>,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(short, long)]
        mode: Option<TriggerMode>,
        /// Modifier keys held during the trigger (modifier mode)
        #[arg(long = "hold", value_delimiter = ',')]
        hold: Vec<Modifier>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
    },
    /// Show the availability status of a language pair
    Status {
        #[arg(short, long)]
        glossary: Option<PathBuf>,
        #[arg(long, default_value = "es")]
        source: String,
        #[arg(long, default_value = "en")]
        target: String,
    },
    /// List the supported languages
    Languages,
    /// Write an example configuration file
    InitConfig { path: PathBuf },
}

fn init_tracing() {
    let fallback = LogLevel::get().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> CliResult<OverlayConfig> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(&path.to_string_lossy())?,
        None => ConfigManager::new()?,
    };
    Ok(manager.into_config())
}

fn load_engine(
    glossary: Option<&Path>,
    config: &OverlayConfig,
) -> CliResult<Option<Rc<GlossaryEngine>>> {
    let path = glossary
        .map(Path::to_path_buf)
        .or_else(|| config.glossary_path.as_ref().map(PathBuf::from));
    match path {
        Some(path) => Ok(Some(Rc::new(GlossaryEngine::from_path(path)?))),
        None => Ok(None),
    }
}

fn read_document(file: &Path) -> CliResult<markup5ever_rcdom::RcDom> {
    let data = fs::read(file)?;
    Ok(html_to_dom(&data, "utf-8")?)
}

fn locate(
    file: &Path,
    x: f64,
    y: f64,
    granularity: Granularity,
    lang: &str,
    config: &OverlayConfig,
) -> CliResult<()> {
    let dom = read_document(file)?;
    let locator = SegmentLocator::new(
        Rc::new(MonospaceLayout::new(dom.document.clone())),
        Rc::new(UnicodeSegmenter),
        &config.marker_class,
        &config.banner_class,
    );

    match granularity {
        Granularity::Word => match locator.locate_word(x, y, lang) {
            Some(word) => println!("word {:?} [{}, {})", word.text, word.start, word.end),
            None => println!("(none)"),
        },
        Granularity::Sentence => match locator.locate_sentence(x, y, lang) {
            Some(sentence) => {
                println!(
                    "sentence {:?} [{}, {})",
                    sentence.text, sentence.start, sentence.end
                );
                for span in &sentence.spans {
                    let text = hoverlay::parsers::html::get_text(&span.node).unwrap_or_default();
                    println!(
                        "  span {:?} [{}, {})",
                        &text[span.local_start..span.local_end],
                        span.local_start,
                        span.local_end
                    );
                }
            }
            None => println!("(none)"),
        },
    }
    Ok(())
}

struct OverlayArgs {
    x: f64,
    y: f64,
    mode: Option<TriggerMode>,
    hold: Vec<Modifier>,
    source: Option<String>,
    target: Option<String>,
}

async fn overlay(
    file: &Path,
    engine: Rc<GlossaryEngine>,
    config: OverlayConfig,
    args: OverlayArgs,
) -> CliResult<()> {
    let dom = read_document(file)?;

    let mut settings = config.settings.clone();
    if let Some(mode) = args.mode {
        settings.trigger_mode = mode;
    }
    if let Some(source) = args.source {
        settings.source_lang = source;
    }
    if let Some(target) = args.target {
        settings.target_lang = target;
    }

    let banner = Rc::new(DomBanner::new(&dom.document, &config.banner_class));
    let context = OverlayContext::init(config, settings, engine, banner.clone());
    let controller = TriggerController::new(
        context,
        Rc::new(MonospaceLayout::new(dom.document.clone())),
        Rc::new(UnicodeSegmenter),
    );

    for key in args.hold {
        controller.key_down(key).await;
    }
    controller.evaluate(args.x, args.y).await;

    match controller.active_text() {
        Some(text) => tracing::info!("已替换为 '{}'", text),
        None => tracing::info!("该位置没有触发替换"),
    }
    if let Some(notice) = banner.current() {
        eprintln!("{}", notice.message);
    }

    println!("{}", serialize_document(&dom.document)?);
    Ok(())
}

async fn status(engine: Option<Rc<GlossaryEngine>>, pair: LanguagePair) -> CliResult<()> {
    let engine = engine.map(|engine| engine as Rc<dyn TranslationEngine>);
    let status = availability_status(engine.as_deref(), &pair).await;
    let level = match status.level {
        StatusLevel::Ok => "ok",
        StatusLevel::Warn => "warn",
        StatusLevel::Error => "error",
    };
    println!("[{}] {}: {}", level, pair, status.text);
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Locate {
            file,
            x,
            y,
            granularity,
            lang,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let lang = lang.unwrap_or_else(|| config.settings.source_lang.clone());
            locate(&file, x, y, granularity, &lang, &config)
        }
        Command::Overlay {
            file,
            glossary,
            x,
            y,
            mode,
            hold,
            source,
            target,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let engine = load_engine(glossary.as_deref(), &config)?.ok_or_else(|| {
                TranslationError::ConfigError("overlay requires --glossary".to_string())
            })?;
            let args = OverlayArgs {
                x,
                y,
                mode,
                hold,
                source,
                target,
            };
            overlay(&file, engine, config, args).await
        }
        Command::Status {
            glossary,
            source,
            target,
        } => {
            let config = match glossary {
                Some(_) => OverlayConfig::default(),
                None => load_config(cli.config.as_deref())?,
            };
            let engine = load_engine(glossary.as_deref(), &config)?;
            status(engine, LanguagePair::new(source, target)).await
        }
        Command::Languages => {
            for (code, name) in SUPPORTED_LANGUAGES {
                println!("{}\t{}", code, name);
            }
            Ok(())
        }
        Command::InitConfig { path } => {
            ConfigManager::generate_example_config(&path.to_string_lossy())?;
            println!("Wrote example configuration to {}", path.display());
            println!();
            print!("{}", generate_env_docs());
            Ok(())
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(cli))
}
