// Command line entry point. It plays the host: files on disk stand in for
// media items, and results are printed as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use webp_converter_lib::utils::detect_declared_type;
use webp_converter_lib::{
    column_status,
    convert_bulk,
    convert_single,
    handle_upload,
    AppState,
    BackendPreference,
    ConverterConfig,
    MediaLibrary,
    SourceDescriptor,
};

#[derive(Parser, Debug)]
#[command(name = "webp-converter", version, about = "Convert uploaded images to WebP next to the original")]
struct Cli {
    /// Parallel conversions in bulk mode
    #[arg(long, global = true, default_value_t = 4)]
    workers: usize,

    /// Which conversion backend to use
    #[arg(long, global = true, value_enum, default_value_t = BackendArg::Auto)]
    backend: BackendArg,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the upload hook on a file
    Upload {
        file: PathBuf,
        /// Declared MIME type; detected from content when omitted
        #[arg(long = "type")]
        declared_type: Option<String>,
    },
    /// Convert existing files on request
    Convert {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the media-list status of files
    Status {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Auto,
    Rich,
    Basic,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendPreference::Auto,
            BackendArg::Rich => BackendPreference::Rich,
            BackendArg::Basic => BackendPreference::Basic,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusLine {
    file: String,
    status: webp_converter_lib::MediaColumnStatus,
    label: &'static str,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Cannot serialize result")?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ConverterConfig {
        workers: cli.workers,
        backend: cli.backend.into(),
    };

    match cli.command {
        Command::Upload { file, declared_type } => {
            let state = AppState::new(config);
            let path = std::path::absolute(&file)
                .with_context(|| format!("Cannot resolve {}", file.display()))?;
            let declared_type = match declared_type {
                Some(declared_type) => declared_type,
                None => detect_declared_type(&path)?,
            };
            let path = path.to_string_lossy().into_owned();
            let url = format!("file://{path}");
            let upload = SourceDescriptor::new(path, declared_type, url);
            debug!("Upload: {:?}", upload);

            let stored = handle_upload(state.pipeline(), upload);
            print_json(&stored)?;
        }
        Command::Convert { files } => {
            let state = AppState::new(config);
            let (library, assets) = MediaLibrary::from_files(&files)?;

            if let [asset] = assets.as_slice() {
                let ack = convert_single(&state, &asset.0.to_string(), &library, &library).await;
                print_json(&ack)?;
                return Ok(());
            }

            let cancel = CancellationToken::new();
            let ctrl_c = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted, finishing running conversions");
                        cancel.cancel();
                    }
                })
            };

            let response = convert_bulk(&state, &assets, &library, &library, &cancel).await;
            ctrl_c.abort();
            print_json(&response)?;
        }
        Command::Status { files } => {
            let lines: Vec<StatusLine> = files
                .iter()
                .map(|file| {
                    let file = file.to_string_lossy().into_owned();
                    let status = column_status(&file);
                    StatusLine { label: status.label(), status, file }
                })
                .collect();
            print_json(&lines)?;
        }
    }

    info!("Done");
    Ok(())
}
