//! Chaîne native en aval : `esc` compile le source décodé, puis le binaire
//! produit est exécuté. Chaque processus a son délai ; au-delà il est tué.
//!
//! Le trait [`NativeToolchain`] isole les processus : les tests du CLI
//! branchent une implémentation factice, le binaire branche [`EscToolchain`].

use std::{
    fmt, fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};

/// Exécutable `esc` par défaut (relatif au répertoire courant)
pub const DEFAULT_ESC: &str = "./esc";
/// Délai de compilation par défaut
pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(30);
/// Délai d'exécution par défaut
pub const RUN_TIMEOUT: Duration = Duration::from_secs(10);

const POLL: Duration = Duration::from_millis(10);
const DRAIN: Duration = Duration::from_millis(100);

// ───────────────────────────── Issues ─────────────────────────────

/// Issue de la compilation native.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Binaire produit
    Ok,
    /// Code de sortie non nul ; première ligne de stderr (ou `unknown`)
    Fail {
        /// Première ligne de diagnostic
        first_line: String,
    },
    /// Délai dépassé, processus tué
    Timeout,
    /// Impossible de lancer le compilateur
    Error {
        /// Détail
        message: String,
    },
}

/// Issue de l'exécution du binaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Terminé (quel que soit le code de sortie)
    Ok {
        /// Sortie standard brute
        stdout: String,
    },
    /// Délai dépassé, processus tué
    Timeout,
    /// Impossible de lancer le binaire
    Error {
        /// Détail
        message: String,
    },
}

/// Issue de compile+run, telle qu'affichée par `run` et `pipeline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sortie du programme (sans blancs de bord)
    Ok {
        /// Sortie standard
        stdout: String,
    },
    /// `esc` a refusé le source
    CompileFail {
        /// Première ligne de stderr
        first_line: String,
    },
    /// Compilation ou exécution trop longue
    Timeout,
    /// Erreur système
    Error {
        /// Détail
        message: String,
    },
}

impl Outcome {
    /// Mot de statut : `OK`, `COMPILE_FAIL`, `TIMEOUT`, `ERROR`.
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "OK",
            Self::CompileFail { .. } => "COMPILE_FAIL",
            Self::Timeout => "TIMEOUT",
            Self::Error { .. } => "ERROR",
        }
    }

    /// Sortie du programme, ou détail de l'échec (vide pour `TIMEOUT`).
    pub fn detail(&self) -> &str {
        match self {
            Self::Ok { stdout } => stdout,
            Self::CompileFail { first_line } => first_line,
            Self::Timeout => "",
            Self::Error { message } => message,
        }
    }

    /// `true` si le programme a tourné jusqu'au bout.
    pub const fn is_ok(&self) -> bool { matches!(self, Self::Ok { .. }) }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { stdout } => f.write_str(stdout),
            other => write!(f, "{}: {}", other.status(), other.detail()),
        }
    }
}

// ───────────────────────────── Trait ─────────────────────────────

/// Compilateur + exécuteur natifs.
pub trait NativeToolchain {
    /// Compile `source` vers l'exécutable `out`.
    fn compile(&self, source: &str, out: &Path) -> CompileOutcome;
    /// Exécute `binary` avec `args`.
    fn run(&self, binary: &Path, args: &[String]) -> RunOutcome;
}

/// Compile puis exécute `source` dans un répertoire temporaire (supprimé
/// au retour).
pub fn compile_and_run(toolchain: &dyn NativeToolchain, source: &str) -> Outcome {
    let dir = match tempfile::Builder::new().prefix("esbc-").tempdir() {
        Ok(dir) => dir,
        Err(e) => return Outcome::Error { message: format!("temporary directory: {e}") },
    };
    let bin = dir.path().join("prog");

    match toolchain.compile(source, &bin) {
        CompileOutcome::Ok => {},
        CompileOutcome::Fail { first_line } => return Outcome::CompileFail { first_line },
        CompileOutcome::Timeout => return Outcome::Timeout,
        CompileOutcome::Error { message } => return Outcome::Error { message },
    }
    match toolchain.run(&bin, &[]) {
        RunOutcome::Ok { stdout } => Outcome::Ok { stdout: stdout.trim().to_owned() },
        RunOutcome::Timeout => Outcome::Timeout,
        RunOutcome::Error { message } => Outcome::Error { message },
    }
}

// ───────────────────────────── esc ─────────────────────────────

/// Chaîne réelle : `esc <src.es> -o <bin>`, puis `<bin>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscToolchain {
    /// Chemin de `esc`
    pub esc: PathBuf,
    /// Délai de compilation
    pub compile_timeout: Duration,
    /// Délai d'exécution
    pub run_timeout: Duration,
}

impl Default for EscToolchain {
    fn default() -> Self {
        Self { esc: PathBuf::from(DEFAULT_ESC), compile_timeout: COMPILE_TIMEOUT, run_timeout: RUN_TIMEOUT }
    }
}

impl EscToolchain {
    /// `esc` donné, délais par défaut.
    pub fn new(esc: impl Into<PathBuf>) -> Self { Self { esc: esc.into(), ..Self::default() } }
}

impl NativeToolchain for EscToolchain {
    fn compile(&self, source: &str, out: &Path) -> CompileOutcome {
        let src = out.with_extension("es");
        if let Err(e) = fs::write(&src, source) {
            return CompileOutcome::Error { message: format!("{}: {e}", src.display()) };
        }
        let mut cmd = Command::new(&self.esc);
        cmd.arg(&src).arg("-o").arg(out);
        debug!("compile: {} {} -o {}", self.esc.display(), src.display(), out.display());

        match run_captured(&mut cmd, self.compile_timeout) {
            Ok(Some(c)) if c.status.success() => CompileOutcome::Ok,
            Ok(Some(c)) => CompileOutcome::Fail { first_line: first_line(&c.stderr) },
            Ok(None) => CompileOutcome::Timeout,
            Err(e) => CompileOutcome::Error { message: format!("{}: {e}", self.esc.display()) },
        }
    }

    fn run(&self, binary: &Path, args: &[String]) -> RunOutcome {
        let mut cmd = Command::new(binary);
        cmd.args(args);
        match run_captured(&mut cmd, self.run_timeout) {
            Ok(Some(c)) => RunOutcome::Ok { stdout: String::from_utf8_lossy(&c.stdout).into_owned() },
            Ok(None) => RunOutcome::Timeout,
            Err(e) => RunOutcome::Error { message: format!("{}: {e}", binary.display()) },
        }
    }
}

/// Première ligne non vide de stderr, `unknown` si stderr est vide.
fn first_line(stderr: &[u8]) -> String {
    if stderr.is_empty() {
        return "unknown".to_owned();
    }
    String::from_utf8_lossy(stderr).trim().lines().next().unwrap_or_default().to_owned()
}

// ───────────────────────────── Processus avec délai ─────────────────────────────

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Lance `cmd`, capture ses sorties ; `Ok(None)` si `timeout` est dépassé
/// (le processus est alors tué).
fn run_captured(cmd: &mut Command, timeout: Duration) -> io::Result<Option<Captured>> {
    let mut child = cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;

    // lecteurs séparés : un tube plein bloquerait l'enfant
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(Captured {
                status,
                stdout: stdout.recv().unwrap_or_default(),
                stderr: stderr.recv().unwrap_or_default(),
            }));
        }
        if Instant::now() >= deadline {
            warn!("{:?} killed after {} s", cmd.get_program(), timeout.as_secs_f32());
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout.recv_timeout(DRAIN);
            let _ = stderr.recv_timeout(DRAIN);
            return Ok(None);
        }
        thread::sleep(POLL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}
