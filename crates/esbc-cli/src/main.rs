//! `esbc`: CLI du format esbc
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `esbc_cli` (lib).

#![forbid(unsafe_code)]

use std::{io, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use esbc_compiler::CompilerOptions;

use esbc_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "esbc", version, about = "esbc : encoder, décoder, désassembler et exécuter des programmes esbc", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Args)]
struct EncodeFlags {
    /// Chaînes littérales en ligne (STR) au lieu d'une table en tête
    #[arg(long)]
    inline_strings: bool,
    /// Échouer au premier construct repris par défaut
    #[arg(long)]
    deny_warnings: bool,
    /// Encoder aussi les corps qui ressemblent à de la prose
    #[arg(long)]
    keep_prose: bool,
}

impl EncodeFlags {
    fn options(&self) -> CompilerOptions {
        CompilerOptions {
            string_table: !self.inline_strings,
            deny_warnings: self.deny_warnings,
            skip_prose: !self.keep_prose,
        }
    }
}

#[derive(Debug, Args)]
struct ToolchainFlags {
    /// Compilateur natif
    #[arg(long, env = "ESBC_ESC", default_value = cli::toolchain::DEFAULT_ESC)]
    esc: PathBuf,
    /// Délai de compilation (secondes)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    compile_timeout: u64,
    /// Délai d'exécution (secondes)
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    run_timeout: u64,
}

impl ToolchainFlags {
    fn toolchain(self) -> cli::EscToolchain {
        cli::EscToolchain {
            esc: self.esc,
            compile_timeout: Duration::from_secs(self.compile_timeout),
            run_timeout: Duration::from_secs(self.run_timeout),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encoder une description JSON en bytecode (hex)
    Encode {
        /// JSON, @fichier, ou - pour stdin
        json: String,
        #[command(flatten)]
        flags: EncodeFlags,
    },

    /// Décoder un bytecode (hex) en source lisible
    Decode {
        /// Hex, @fichier, ou - pour stdin
        hex: String,
    },

    /// Lister les opcodes d'un bytecode (hex)
    Disasm {
        /// Hex, @fichier, ou - pour stdin
        hex: String,
    },

    /// Encoder, décoder, puis compiler et exécuter le source avec `esc`
    #[command(group(ArgGroup::new("program").required(true).args(["json", "hex"])))]
    Run {
        /// JSON, @fichier, ou - pour stdin
        json: Option<String>,
        /// Partir d'un bytecode (hex) au lieu d'une description
        #[arg(long)]
        hex: Option<String>,
        #[command(flatten)]
        flags: EncodeFlags,
        #[command(flatten)]
        toolchain: ToolchainFlags,
    },

    /// Comme `run`, rapport JSON {hex, bytes, source, status, output}
    Pipeline {
        /// JSON, @fichier, ou - pour stdin
        json: String,
        #[command(flatten)]
        flags: EncodeFlags,
        #[command(flatten)]
        toolchain: ToolchainFlags,
    },

    /// Générer les complétions shell
    Completions {
        /// Shell cible
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()));
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = (verbose, quiet);
    }
}

fn init_color(choice: ColorChoice) {
    // owo-colors détecte le TTY ; on ne fait que forcer via l'environnement.
    match choice {
        ColorChoice::Auto => {},
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        },
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        },
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> Result<()> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    use cli::{Command as C, DecodeTask, DisasmTask, EncodeTask, Input, PipelineTask, ProgramInput, RunTask};

    let mut toolchain = cli::EscToolchain::default();
    let command = match opt.cmd {
        Command::Encode { json, flags } => C::Encode(EncodeTask { input: Input::from_arg(&json), options: flags.options() }),
        Command::Decode { hex } => C::Decode(DecodeTask { input: Input::from_arg(&hex) }),
        Command::Disasm { hex } => C::Disasm(DisasmTask { input: Input::from_arg(&hex) }),
        Command::Run { json, hex, flags, toolchain: tc } => {
            toolchain = tc.toolchain();
            let program = match (hex, json) {
                (Some(hex), _) => ProgramInput::Hex(Input::from_arg(&hex)),
                (None, Some(json)) => ProgramInput::Json(Input::from_arg(&json)),
                (None, None) => anyhow::bail!("`run` attend une description JSON ou --hex"),
            };
            C::Run(RunTask { program, options: flags.options() })
        },
        Command::Pipeline { json, flags, toolchain: tc } => {
            toolchain = tc.toolchain();
            C::Pipeline(PipelineTask { input: Input::from_arg(&json), options: flags.options() })
        },
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Opt::command(), "esbc", &mut io::stdout());
            return Ok(());
        },
    };

    let mut stdout = io::stdout().lock();
    let code = cli::execute(command, &toolchain, &mut stdout).context("échec d'exécution de la commande")?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
