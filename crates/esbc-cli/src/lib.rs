//! esbc-cli: bibliothèque interne du binaire `esbc`
//!
//! Le binaire ne fait que parser ses arguments ; tout le reste passe par
//! [`execute`], qui écrit sur un `Write` fourni et délègue la chaîne native à
//! un [`NativeToolchain`] :
//! - `encode`   : description JSON → hex
//! - `decode`   : hex → source lisible
//! - `disasm`   : hex → listing d'opcodes
//! - `run`      : JSON (ou hex) → octets → source → `esc` → sortie du programme
//! - `pipeline` : idem, rapport JSON
//!
//! Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles.

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod toolchain;

use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use esbc_compiler::{Compiler, CompilerOptions, EncodeError, ProgramSpec, Severity};
use esbc_core::Bytecode;
use log::debug;
use serde::Serialize;

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

pub use toolchain::{
    compile_and_run, CompileOutcome, EscToolchain, NativeToolchain, Outcome, RunOutcome,
};

/// Caractères hex montrés par `run` avant troncature.
pub const HEX_PREVIEW: usize = 80;

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau (le parsing CLI reste dans main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Description JSON → hex.
    Encode(EncodeTask),
    /// Hex → source.
    Decode(DecodeTask),
    /// Hex → listing d'opcodes.
    Disasm(DisasmTask),
    /// Encode/décode, puis compile et exécute le source.
    Run(RunTask),
    /// Comme `Run`, avec un rapport JSON.
    Pipeline(PipelineTask),
}

#[derive(Clone, Debug, Default)]
pub struct EncodeTask {
    pub input: Input,
    pub options: CompilerOptions,
}

#[derive(Clone, Debug, Default)]
pub struct DecodeTask {
    pub input: Input,
}

#[derive(Clone, Debug, Default)]
pub struct DisasmTask {
    pub input: Input,
}

#[derive(Clone, Debug)]
pub struct RunTask {
    pub program: ProgramInput,
    pub options: CompilerOptions,
}

#[derive(Clone, Debug, Default)]
pub struct PipelineTask {
    pub input: Input,
    pub options: CompilerOptions,
}

/// Programme de `run` : description JSON, ou flux déjà encodé.
#[derive(Clone, Debug)]
pub enum ProgramInput {
    Json(Input),
    Hex(Input),
}

/// Entrée texte : argument brut, fichier (`@chemin`) ou stdin (`-`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Inline(String),
    Path(PathBuf),
    Stdin,
}

impl Default for Input {
    fn default() -> Self { Self::Stdin }
}

impl Input {
    /// Interprète un argument de ligne de commande.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else if let Some(path) = arg.strip_prefix('@') {
            Self::Path(PathBuf::from(path))
        } else {
            Self::Inline(arg.to_owned())
        }
    }

    /// Lit le texte.
    pub fn read(&self) -> Result<String> {
        match self {
            Self::Inline(s) => Ok(s.clone()),
            Self::Path(p) => fs::read_to_string(p).with_context(|| format!("lecture: {}", p.display())),
            Self::Stdin => {
                let mut s = String::new();
                io::stdin().read_to_string(&mut s).context("lecture de stdin")?;
                Ok(s)
            },
        }
    }
}

/// Rapport de `pipeline` (clés dans cet ordre).
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PipelineReport {
    pub hex: String,
    pub bytes: usize,
    pub source: String,
    pub status: &'static str,
    pub output: String,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Code de sortie quand `run`/`pipeline` ont produit leur rapport mais que
/// le programme n'a pas tourné jusqu'au bout (`COMPILE_FAIL`, `TIMEOUT`, `ERROR`).
pub const EXIT_NOT_OK: i32 = 2;

/// Exécute une commande ; la sortie principale va dans `out`, les lignes de
/// statut sur stderr. Retourne un code de sortie : 0, ou [`EXIT_NOT_OK`].
pub fn execute(cmd: Command, toolchain: &dyn NativeToolchain, out: &mut dyn Write) -> Result<i32> {
    let outcome = match cmd {
        Command::Encode(t) => encode_entry(t, out).map(|()| None)?,
        Command::Decode(t) => decode_entry(&t, out).map(|()| None)?,
        Command::Disasm(t) => disasm_entry(&t, out).map(|()| None)?,
        Command::Run(t) => Some(run_entry(t, toolchain, out)?),
        Command::Pipeline(t) => Some(pipeline_entry(t, toolchain, out)?),
    };
    out.flush()?;
    Ok(match outcome {
        Some(o) if !o.is_ok() => EXIT_NOT_OK,
        _ => 0,
    })
}

fn encode_entry(task: EncodeTask, out: &mut dyn Write) -> Result<()> {
    let json = task.input.read().context("lecture de la description JSON")?;
    let bc = encode_with(&json, task.options)?;
    writeln!(out, "{}", bc.to_hex())?;
    status_ok("ENCODE", &format!("{} bytes", bc.len()));
    Ok(())
}

fn decode_entry(task: &DecodeTask, out: &mut dyn Write) -> Result<()> {
    let bc = read_hex(&task.input)?;
    let source = esbc_decompiler::decompile(bc.as_bytes()).context("échec de décodage")?;
    out.write_all(source.as_bytes())?;
    Ok(())
}

fn disasm_entry(task: &DisasmTask, out: &mut dyn Write) -> Result<()> {
    let bc = read_hex(&task.input)?;
    let text = esbc_core::disasm::listing(bc.as_bytes()).context("échec de désassemblage")?;
    out.write_all(text.as_bytes())?;
    status_ok("DISASM", &format!("{} bytes", bc.len()));
    Ok(())
}

fn run_entry(task: RunTask, toolchain: &dyn NativeToolchain, out: &mut dyn Write) -> Result<Outcome> {
    let bc = match task.program {
        ProgramInput::Json(input) => {
            let json = input.read().context("lecture de la description JSON")?;
            encode_with(&json, task.options)?
        },
        ProgramInput::Hex(input) => read_hex(&input)?,
    };
    let source = esbc_decompiler::decompile(bc.as_bytes()).context("échec de décodage")?;

    let hex = bc.to_hex();
    let more = if hex.len() > HEX_PREVIEW { "..." } else { "" };
    writeln!(out, "--- bytecodes: {} bytes, hex: {}{more}", bc.len(), hex.get(..HEX_PREVIEW).unwrap_or(&hex))?;
    writeln!(out, "--- source ---")?;
    writeln!(out, "{source}")?;
    writeln!(out, "--- compile+run ---")?;
    out.flush()?;

    let outcome = compile_and_run(toolchain, &source);
    writeln!(out, "{outcome}")?;
    report_outcome(&outcome);
    Ok(outcome)
}

fn pipeline_entry(task: PipelineTask, toolchain: &dyn NativeToolchain, out: &mut dyn Write) -> Result<Outcome> {
    let json = task.input.read().context("lecture de la description JSON")?;
    let bc = encode_with(&json, task.options)?;
    let source = esbc_decompiler::decompile(bc.as_bytes()).context("échec de décodage")?;
    let outcome = compile_and_run(toolchain, &source);
    report_outcome(&outcome);

    let report = PipelineReport {
        hex: bc.to_hex(),
        bytes: bc.len(),
        status: outcome.status(),
        output: outcome.detail().to_owned(),
        source,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(outcome)
}

/// JSON → octets ; les diagnostics refusés sont listés avant l'erreur.
fn encode_with(json: &str, options: CompilerOptions) -> Result<Bytecode> {
    let spec = ProgramSpec::from_json(json)?;
    let mut compiler = Compiler::new(options);
    match compiler.encode(&spec) {
        Ok(bc) => {
            let diags = compiler.take_diagnostics();
            let warnings = diags.iter().filter(|d| d.severity == Severity::Warning).count();
            if warnings > 0 {
                status_info("WARN", &format!("{warnings} construct(s) encoded with a fallback"));
            }
            debug!("{} diagnostic(s), {} bytes", diags.len(), bc.len());
            Ok(bc)
        },
        Err(EncodeError::Denied { diagnostics }) => {
            for d in &diagnostics {
                status_fail("DENIED", &d.to_string());
            }
            Err(EncodeError::Denied { diagnostics }.into())
        },
        Err(e) => Err(e).context("échec d'encodage"),
    }
}

fn read_hex(input: &Input) -> Result<Bytecode> {
    let text = input.read().context("lecture du flux hex")?;
    Bytecode::from_hex(text.trim()).context("hex invalide")
}

fn report_outcome(outcome: &Outcome) {
    if outcome.is_ok() {
        status_ok("RUN", outcome.status());
    } else {
        status_fail(outcome.status(), outcome.detail());
    }
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

fn status_info(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.blue().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

fn status_fail(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.red().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, path::Path};

    /// Chaîne factice : mémorise le source reçu, répond ce qu'on lui dit.
    struct FakeToolchain {
        compile: CompileOutcome,
        stdout: &'static str,
        seen: RefCell<Vec<String>>,
    }

    impl FakeToolchain {
        fn printing(stdout: &'static str) -> Self {
            Self { compile: CompileOutcome::Ok, stdout, seen: RefCell::default() }
        }
    }

    impl NativeToolchain for FakeToolchain {
        fn compile(&self, source: &str, _out: &Path) -> CompileOutcome {
            self.seen.borrow_mut().push(source.to_owned());
            self.compile.clone()
        }
        fn run(&self, _binary: &Path, _args: &[String]) -> RunOutcome { RunOutcome::Ok { stdout: self.stdout.to_owned() } }
    }

    const SUM_JSON: &str = r#"{"main_body": "print(17 + 25)"}"#;

    fn exec(cmd: Command, tc: &FakeToolchain) -> Result<String> { exec_with_code(cmd, tc).map(|(_, out)| out) }

    fn exec_with_code(cmd: Command, tc: &FakeToolchain) -> Result<(i32, String)> {
        let mut out = Vec::new();
        let code = execute(cmd, tc, &mut out)?;
        Ok((code, String::from_utf8(out)?))
    }

    #[test]
    fn encode_prints_hex() -> Result<()> {
        let tc = FakeToolchain::printing("");
        let cmd = Command::Encode(EncodeTask { input: Input::from_arg(SUM_JSON), options: CompilerOptions::default() });
        assert_eq!(exec(cmd, &tc)?, "01ff0030507011701903\n");
        Ok(())
    }

    #[test]
    fn decode_prints_source() -> Result<()> {
        let tc = FakeToolchain::printing("");
        let input = Input::from_arg("02000140700172000301ff00107001700c30750001740303");
        assert_eq!(
            exec(Command::Decode(DecodeTask { input }), &tc)?,
            "f0(n) = product(1..=n)\n\nfn main() {\n  for i := 1..=12 {\n    print(f0(i))\n  }\n}\n"
        );
        Ok(())
    }

    #[test]
    fn disasm_lists_opcodes() -> Result<()> {
        let tc = FakeToolchain::printing("");
        let text = exec(Command::Disasm(DisasmTask { input: Input::from_arg("01ff0030507011701903") }), &tc)?;
        assert!(text.contains("PRINT"));
        assert!(text.lines().last().is_some_and(|l| l.ends_with("END")));
        Ok(())
    }

    #[test]
    fn run_report_layout() -> Result<()> {
        let tc = FakeToolchain::printing("42\n");
        let cmd = Command::Run(RunTask {
            program: ProgramInput::Json(Input::from_arg(SUM_JSON)),
            options: CompilerOptions::default(),
        });
        assert_eq!(
            exec(cmd, &tc)?,
            "--- bytecodes: 10 bytes, hex: 01ff0030507011701903\n\
             --- source ---\n\
             fn main() {\n  print(17 + 25)\n}\n\n\
             --- compile+run ---\n\
             42\n"
        );
        assert_eq!(*tc.seen.borrow(), vec!["fn main() {\n  print(17 + 25)\n}\n".to_owned()]);
        Ok(())
    }

    #[test]
    fn run_from_hex_truncates_long_streams() -> Result<()> {
        let hex = format!("01ff00{}03", "307001".repeat(20));
        let tc = FakeToolchain::printing("");
        let cmd = Command::Run(RunTask { program: ProgramInput::Hex(Input::Inline(hex.clone())), options: CompilerOptions::default() });
        let text = exec(cmd, &tc)?;
        let first = text.lines().next().unwrap_or_default();
        assert_eq!(first, format!("--- bytecodes: 64 bytes, hex: {}...", &hex[..80]));
        Ok(())
    }

    #[test]
    fn run_reports_compile_failure() -> Result<()> {
        let tc = FakeToolchain {
            compile: CompileOutcome::Fail { first_line: "error: nope".into() },
            stdout: "",
            seen: RefCell::default(),
        };
        let cmd = Command::Run(RunTask {
            program: ProgramInput::Json(Input::from_arg(SUM_JSON)),
            options: CompilerOptions::default(),
        });
        let (code, text) = exec_with_code(cmd, &tc)?;
        assert!(text.ends_with("--- compile+run ---\nCOMPILE_FAIL: error: nope\n"));
        assert_eq!(code, EXIT_NOT_OK);
        Ok(())
    }

    #[test]
    fn exit_code_follows_the_outcome() -> Result<()> {
        let pipeline = || Command::Pipeline(PipelineTask { input: Input::from_arg(SUM_JSON), options: CompilerOptions::default() });
        assert_eq!(exec_with_code(pipeline(), &FakeToolchain::printing("42\n"))?.0, 0);

        let failing = FakeToolchain { compile: CompileOutcome::Fail { first_line: "x".into() }, stdout: "", seen: RefCell::default() };
        let (code, text) = exec_with_code(pipeline(), &failing)?;
        assert_eq!(code, EXIT_NOT_OK);
        assert!(text.contains("\"status\": \"COMPILE_FAIL\""), "{text}");

        let encode = Command::Encode(EncodeTask { input: Input::from_arg(SUM_JSON), options: CompilerOptions::default() });
        assert_eq!(exec_with_code(encode, &failing)?.0, 0);
        Ok(())
    }

    #[test]
    fn pipeline_report() -> Result<()> {
        let tc = FakeToolchain::printing(" 42 \n");
        let cmd = Command::Pipeline(PipelineTask { input: Input::from_arg(SUM_JSON), options: CompilerOptions::default() });
        let v: serde_json::Value = serde_json::from_str(&exec(cmd, &tc)?)?;
        assert_eq!(v["hex"], "01ff0030507011701903");
        assert_eq!(v["bytes"], 10);
        assert_eq!(v["source"], "fn main() {\n  print(17 + 25)\n}\n");
        assert_eq!(v["status"], "OK");
        assert_eq!(v["output"], "42");
        Ok(())
    }

    #[test]
    fn denied_warnings_fail_the_command() {
        let tc = FakeToolchain::printing("");
        let options = CompilerOptions { deny_warnings: true, ..CompilerOptions::default() };
        let cmd = Command::Encode(EncodeTask { input: Input::from_arg(r#"{"main_body": "print(ghost)"}"#), options });
        let err = exec(cmd, &tc).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("denied"), "{err}");
    }

    #[test]
    fn bad_hex_is_reported() {
        let tc = FakeToolchain::printing("");
        assert!(exec(Command::Decode(DecodeTask { input: Input::from_arg("zz") }), &tc).is_err());
    }

    #[test]
    fn input_kinds() -> Result<()> {
        assert_eq!(Input::from_arg("-"), Input::Stdin);
        assert_eq!(Input::from_arg("@prog.json"), Input::Path(PathBuf::from("prog.json")));
        assert_eq!(Input::from_arg("{}"), Input::Inline("{}".into()));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prog.json");
        fs::write(&path, SUM_JSON)?;
        assert_eq!(Input::Path(path).read()?, SUM_JSON);
        Ok(())
    }
}
