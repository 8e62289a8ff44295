use clap::Parser;
use genz_studio::{
    broker::console::read_stdin_line,
    logger::{self, LogLevel, LoggerConfig},
    AspectRatio, ConsoleBroker, GeminiClient, GenerationSettings, ImageSize, ImageStyle,
    RequestOutcome, Studio, StudioConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "genz-studio",
    version,
    about = "Generate stylised images from a text prompt with Gemini"
)]
struct Cli {
    /// Prompt to render. Reads prompts from stdin, one per line, when omitted.
    prompt: Option<String>,

    #[arg(long, default_value_t = ImageStyle::default())]
    style: ImageStyle,

    #[arg(long = "aspect-ratio", short = 'r', default_value_t = AspectRatio::default())]
    aspect_ratio: AspectRatio,

    /// Resolution tier, only used with --pro
    #[arg(long, default_value_t = ImageSize::default())]
    size: ImageSize,

    /// Use the pro model (asks for an API key if none is set)
    #[arg(long)]
    pro: bool,

    /// Directory for downloaded images [env: GENZ_OUTPUT_DIR]
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    #[arg(long)]
    json_logs: bool,

    /// Print the available styles, aspect ratios, and sizes
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let logger_config = if cli.json_logs {
        LoggerConfig::production()
    } else {
        LoggerConfig::new()
    };
    logger::init_with_config(logger_config.with_level(cli.log_level))?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    if cli.list {
        print_choices();
        return Ok(());
    }

    let mut config = StudioConfig::from_env();
    if let Some(out) = cli.out {
        config = config.with_output_dir(out);
    }
    logger::log_startup_info("GenZ Studio", env!("CARGO_PKG_VERSION"), &config);

    let mut client = GeminiClient::new(&config)?;
    if cli.pro {
        let broker = ConsoleBroker::new(client.keys().clone());
        client = client.with_broker(Arc::new(broker));
    } else if config.api_key.is_none() {
        log::warn!("⚠️  No API key in GEMINI_API_KEY, GOOGLE_API_KEY, or API_KEY");
    }

    let settings = GenerationSettings::new()
        .with_style(cli.style)
        .with_aspect_ratio(cli.aspect_ratio)
        .with_image_size(cli.size)
        .with_pro_mode(cli.pro);
    let mut studio = Studio::new(client.into_image_client()).with_settings(settings);

    let mut failures = 0usize;
    match cli.prompt {
        Some(prompt) => {
            if !run_prompt(&mut studio, prompt, &config.output_dir).await {
                failures += 1;
            }
        }
        None => loop {
            let Some(line) = read_stdin_line("prompt> ").await? else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                break;
            }
            if !run_prompt(&mut studio, line, &config.output_dir).await {
                failures += 1;
            }
        },
    }

    if failures > 0 {
        log::warn!("{} generation(s) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_prompt(studio: &mut Studio, prompt: String, output_dir: &Path) -> bool {
    studio.set_prompt(prompt);
    match studio.submit().await {
        RequestOutcome::Success(_) => match studio.download(output_dir).await {
            Ok(path) => {
                println!("{}", path.display());
                true
            }
            Err(e) => {
                eprintln!("{}", e);
                false
            }
        },
        RequestOutcome::Failure { message, .. } => {
            eprintln!("{}", message);
            false
        }
    }
}

fn print_choices() {
    println!("Styles:");
    for style in ImageStyle::ALL {
        println!("  {:<16} {}", style.slug(), style.label());
    }
    println!("Aspect ratios:");
    for ratio in AspectRatio::ALL {
        println!("  {}", ratio);
    }
    println!("Sizes (pro only):");
    for size in ImageSize::ALL {
        println!("  {}", size);
    }
}
