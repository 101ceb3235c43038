//! SealCalc CLI - build, preview and save seals from the terminal
//!
//! Commands: options, preview, save, seals, predict, upload, health
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 success, 1 failure, 2 selection rejected by the catalog

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sealcalc_core::{
    compositor::CANVAS_SIZE, Attribute, CatalogState, ClientConfig, PreviewOutcome, Session,
    SessionError,
};

#[derive(Parser)]
#[command(name = "sealcalc-cli")]
#[command(version = sealcalc_core::CLIENT_VERSION)]
#[command(about = "SealCalc CLI - seal builder client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, env = "SEALCALC_API_BASE")]
    api_base: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, env = "SEALCALC_TIMEOUT_SECS")]
    timeout: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the option catalog
    Options,

    /// Resolve the layered preview for a selection
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the composited preview as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Persist a selection
    Save {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// List saved seals, newest first
    Seals {
        #[arg(long, default_value_t = 50)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Ask the server to value a selection
    Predict {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Upload a PNG image to the server's local store
    Upload {
        /// Path of the PNG file
        file: PathBuf,
    },

    /// Check server health
    Health,
}

/// Attribute overrides; unset fields keep the catalog defaults.
#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    eyes: Option<i64>,

    #[arg(long)]
    mouth: Option<i64>,

    /// Hair style, 0 = none
    #[arg(long)]
    hair: Option<i64>,

    #[arg(long)]
    pattern: Option<i64>,

    #[arg(long)]
    base_color: Option<i64>,

    #[arg(long)]
    pattern_color: Option<i64>,
}

impl SelectionArgs {
    fn overrides(&self) -> Vec<(Attribute, i64)> {
        [
            (Attribute::Eyes, self.eyes),
            (Attribute::Mouth, self.mouth),
            (Attribute::Hair, self.hair),
            (Attribute::Pattern, self.pattern),
            (Attribute::BaseColor, self.base_color),
            (Attribute::PatternColor, self.pattern_color),
        ]
        .into_iter()
        .filter_map(|(attribute, value)| value.map(|v| (attribute, v)))
        .collect()
    }
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the catalog, apply overrides and validate. Exit code on failure.
async fn prepare_selection(session: &Session, args: &SelectionArgs) -> Result<(), ExitCode> {
    match session.load_catalog().await {
        CatalogState::Loaded(_) => {}
        other => {
            let reason = other.failure().unwrap_or("catalog unavailable").to_string();
            print_json(&json!({"success": false, "error": format!("Failed to load options: {}", reason)}));
            return Err(ExitCode::FAILURE);
        }
    }

    for (attribute, value) in args.overrides() {
        session.set_attribute(attribute, value);
    }

    match session.validate_selection() {
        Ok(result) if result.valid => Ok(()),
        Ok(result) => {
            print_json(&json!({"success": false, "validation": result}));
            Err(ExitCode::from(2))
        }
        Err(e) => {
            print_json(&json!({"success": false, "error": e.to_string()}));
            Err(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let api_base = cli.api_base.as_deref().unwrap_or_default();
    let config = match ClientConfig::from_values(api_base, cli.timeout.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            print_json(&json!({"success": false, "error": e.to_string()}));
            return ExitCode::FAILURE;
        }
    };

    let session = Session::connect(config);

    match cli.command {
        Commands::Options => match session.load_catalog().await {
            CatalogState::Loaded(catalog) => {
                print_json(&json!(catalog));
                ExitCode::SUCCESS
            }
            other => {
                let reason = other.failure().unwrap_or("catalog unavailable").to_string();
                print_json(&json!({"success": false, "error": reason}));
                ExitCode::FAILURE
            }
        },

        Commands::Preview { selection, svg } => {
            if let Err(code) = prepare_selection(&session, &selection).await {
                return code;
            }

            match session.resolve_preview().await {
                PreviewOutcome::Applied(preview) => {
                    let composition = session.composition();
                    if let Some(path) = svg {
                        if let Err(e) = composition.write_svg(&path, CANVAS_SIZE) {
                            print_json(&json!({"success": false, "error": format!("Failed to write {}: {}", path.display(), e)}));
                            return ExitCode::FAILURE;
                        }
                    }
                    print_json(&json!({
                        "success": true,
                        "selection": session.selection(),
                        "preview": preview,
                        "composition": composition,
                    }));
                    ExitCode::SUCCESS
                }
                PreviewOutcome::Superseded => {
                    print_json(&json!({"success": false, "error": "preview superseded"}));
                    ExitCode::FAILURE
                }
                PreviewOutcome::Failed(e) => {
                    print_json(&json!({"success": false, "error": e.to_string()}));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Save { selection } => {
            if let Err(code) = prepare_selection(&session, &selection).await {
                return code;
            }

            match session.save_seal().await {
                Ok(id) => {
                    print_json(&json!({"success": true, "id": id}));
                    ExitCode::SUCCESS
                }
                Err(e @ SessionError::SaveFailed(_)) => {
                    print_json(&json!({"success": false, "error": "Save failed", "detail": e.to_string()}));
                    ExitCode::FAILURE
                }
                Err(e) => {
                    print_json(&json!({"success": false, "error": e.to_string()}));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Seals { limit, offset } => match session.api().list_seals(limit, offset).await {
            Ok(seals) => {
                print_json(&json!(seals));
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_json(&json!({"success": false, "error": e.to_string()}));
                ExitCode::FAILURE
            }
        },

        Commands::Predict { selection } => {
            if let Err(code) = prepare_selection(&session, &selection).await {
                return code;
            }

            match session.predict_value().await {
                Ok(value) => {
                    print_json(&json!({
                        "success": true,
                        "selection": session.selection(),
                        "predicted_value": value,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&json!({"success": false, "error": e.to_string()}));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Upload { file } => {
            let data = match std::fs::read(&file) {
                Ok(data) => data,
                Err(e) => {
                    print_json(&json!({"success": false, "error": format!("Failed to read {}: {}", file.display(), e)}));
                    return ExitCode::FAILURE;
                }
            };
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.png".to_string());

            match session.api().upload_png(&file_name, data).await {
                Ok(image_path) => {
                    print_json(&json!({"success": true, "image_path": image_path}));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&json!({"success": false, "error": e.to_string()}));
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Health => match session.api().health().await {
            Ok(ok) => {
                print_json(&json!({"ok": ok}));
                if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
            }
            Err(e) => {
                print_json(&json!({"ok": false, "error": e.to_string()}));
                ExitCode::FAILURE
            }
        },
    }
}
