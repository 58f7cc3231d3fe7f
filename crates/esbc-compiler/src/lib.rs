// src/lib.rs
//! esbc compiler : description JSON → flux d'octets esbc
//!
//! - Entrée : [`ProgramSpec`] (JSON, ou texte relu par [`ProgramSpec::from_source`])
//! - Sortie : [`Bytecode`] (table de chaînes en tête, puis `DEF`/`DEFX` par fonction)
//! - Diagnostics : warnings collectés (et journalisés via `log`) pour chaque
//!   construction reprise par défaut ; les dépassements de capacité du format
//!   sont des erreurs dures ([`EncodeError`])
//! - Passes : enregistrement des identifiants, texte → AST, puis émission
//!   (trait [`Emitter`])
//!
//! API principale :
//! ```rust
//! use esbc_compiler::{Compiler, CompilerOptions, ProgramSpec};
//!
//! let spec = ProgramSpec::main_only("print(17 + 25)");
//! let mut c = Compiler::new(CompilerOptions::default());
//! let bc = c.encode(&spec)?;
//! assert_eq!(bc.to_hex(), "01ff0030507011701903");
//! # Ok::<(), esbc_compiler::EncodeError>(())
//! ```

#![deny(missing_docs)]

use core::fmt;

use esbc_ast::{Body, FuncId, Function, Program};
use esbc_core::{TableError, FUNC_MAIN, MAX_FUNC_ID, MAX_NESTING};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

pub use esbc_core::Bytecode;

/// Heuristiques prose / expression unique.
pub mod classify;
/// Émission octets.
pub mod emit;
/// Scan du texte source (chaînes et profondeur).
pub mod scan;
/// Description d'entrée.
pub mod spec;

mod expr;
mod stmt;

pub use emit::{ByteEmitter, Emitter};
pub use spec::{FunctionSpec, ProgramSpec};

/// Fonctions de bibliothèque : jamais enregistrées ni encodées.
pub const BUILTINS: [&str; 8] = ["printf", "print", "malloc", "free", "exit", "strlen", "strcmp", "sprintf"];

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options de l'encodeur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Chaînes littérales en table (`SREF`) ; sinon en ligne (`STR`)
    pub string_table: bool,
    /// Warnings → erreur ([`EncodeError::Denied`])
    pub deny_warnings: bool,
    /// Ignorer les corps qui ressemblent à de la prose
    pub skip_prose: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self { Self { string_table: true, deny_warnings: false, skip_prose: true } }
}

// ─────────────────────────────────────────────────────────────────────────────
/* Diagnostics */
// ─────────────────────────────────────────────────────────────────────────────

/// Gravité d'un diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Info (fonction ignorée, …)
    Info,
    /// Alerte : l'encodeur a repris une construction par défaut
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
        })
    }
}

/// Un diagnostic (gravité, message, fonction concernée)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Gravité
    pub severity: Severity,
    /// Message humain
    pub message: String,
    /// Nom source de la fonction en cours, si applicable
    pub function: Option<String>,
}

impl Diagnostic {
    /// Construit un warning
    pub fn warn(msg: impl Into<String>, function: Option<&str>) -> Self {
        Self { severity: Severity::Warning, message: msg.into(), function: function.map(str::to_owned) }
    }
    /// Construit une info
    pub fn info(msg: impl Into<String>, function: Option<&str>) -> Self {
        Self { severity: Severity::Info, message: msg.into(), function: function.map(str::to_owned) }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(func) => write!(f, "{} in `{func}`: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Erreur d'encodage
#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON d'entrée invalide
    #[error("invalid program description: {0}")]
    Json(#[from] serde_json::Error),
    /// Texte source illisible ([`ProgramSpec::from_source`])
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Offset (octets) dans le texte
        offset: usize,
        /// Détail
        message: String,
    },
    /// Plus de 255 chaînes distinctes
    #[error("string table full: at most 255 distinct strings")]
    TooManyStrings,
    /// Chaîne de plus de 255 octets
    #[error("string literal of {len} bytes exceeds 255")]
    StringTooLong {
        /// Longueur en octets
        len: usize,
    },
    /// Identifiant de fonction au-delà de 254
    #[error("too many functions: no id left for `{name}` (ids stop at 254)")]
    TooManyFunctions {
        /// Fonction sans identifiant
        name: String,
    },
    /// Plus de 256 locaux dans une fonction
    #[error("function `{function}` uses more than 256 locals")]
    TooManyLocals {
        /// Fonction concernée
        function: String,
    },
    /// Plus de 255 paramètres
    #[error("function `{function}` declares {count} parameters (max 255)")]
    TooManyParams {
        /// Fonction concernée
        function: String,
        /// Nombre déclaré
        count: usize,
    },
    /// Plus de 255 arguments
    #[error("call to `{callee}` passes {count} arguments (max 255)")]
    TooManyArgs {
        /// Fonction appelée
        callee: String,
        /// Nombre d'arguments
        count: usize,
    },
    /// Imbrication au-delà de `MAX_NESTING` (parenthèses, blocs, chaînes `el if`)
    #[error("function `{function}` nests deeper than {max} levels")]
    TooDeep {
        /// Fonction concernée
        function: String,
        /// Profondeur maximale
        max: usize,
    },
    /// `deny_warnings` et au moins un warning
    #[error("{} warning(s) denied", .diagnostics.len())]
    Denied {
        /// Diagnostics accumulés
        diagnostics: Vec<Diagnostic>,
    },
}

impl From<TableError> for EncodeError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::Full => Self::TooManyStrings,
            TableError::TooLong { len } => Self::StringTooLong { len },
        }
    }
}

/// Alias résultat de l'encodeur
pub type EncodeResult<T> = core::result::Result<T, EncodeError>;

// ─────────────────────────────────────────────────────────────────────────────
/* Table des fonctions */
// ─────────────────────────────────────────────────────────────────────────────

/// Noms de fonctions → identifiants, dans l'ordre d'enregistrement.
#[derive(Debug, Default, Clone)]
pub struct FuncTable {
    ids: IndexMap<String, FuncId>,
}

impl FuncTable {
    /// Table vide
    pub fn new() -> Self { Self::default() }

    /// Identifiant d'un nom, en l'allouant si besoin (`main` → `FUNC_MAIN`).
    pub fn register(&mut self, name: &str) -> EncodeResult<FuncId> {
        if name == "main" {
            return Ok(FUNC_MAIN);
        }
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id = u8::try_from(self.ids.len())
            .ok()
            .filter(|&id| id <= MAX_FUNC_ID)
            .ok_or_else(|| EncodeError::TooManyFunctions { name: name.to_owned() })?;
        self.ids.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Identifiant d'un nom déjà enregistré.
    pub fn get(&self, name: &str) -> Option<FuncId> {
        if name == "main" {
            return Some(FUNC_MAIN);
        }
        self.ids.get(name).copied()
    }

    /// Nombre d'identifiants alloués.
    pub fn len(&self) -> usize { self.ids.len() }

    /// Aucun identifiant ?
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

// ─────────────────────────────────────────────────────────────────────────────
/* Contexte */
// ─────────────────────────────────────────────────────────────────────────────

/// Contexte mutable d'une fonction en cours de compilation
pub(crate) struct Ctx<'a> {
    pub diags: &'a mut Vec<Diagnostic>,
    pub funcs: &'a mut FuncTable,
    /// Nom source de la fonction (diagnostics)
    pub function: &'a str,
    pub params: Vec<String>,
    /// Locaux par ordre de première déclaration
    pub locals: IndexMap<String, u8>,
    /// Variables de boucle, la plus externe en premier
    pub loops: SmallVec<[String; 4]>,
    /// Blocs, chaînes et expressions en cours de compilation
    pub nesting: usize,
}

impl<'a> Ctx<'a> {
    fn new(diags: &'a mut Vec<Diagnostic>, funcs: &'a mut FuncTable, function: &'a str, params: Vec<String>) -> Self {
        Self { diags, funcs, function, params, locals: IndexMap::new(), loops: SmallVec::new(), nesting: 0 }
    }

    pub(crate) fn warn(&mut self, msg: impl Into<String>) {
        let d = Diagnostic::warn(msg, Some(self.function));
        warn!("{d}");
        self.diags.push(d);
    }

    /// Entre dans un niveau d'imbrication ; le retour se fait par [`Ctx::leave`].
    pub(crate) fn enter(&mut self) -> EncodeResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(EncodeError::TooDeep { function: self.function.to_owned(), max: MAX_NESTING });
        }
        self.nesting += 1;
        Ok(())
    }

    pub(crate) fn leave<T>(&mut self, out: EncodeResult<T>) -> EncodeResult<T> {
        self.nesting -= 1;
        out
    }

    /// Slot d'un local, alloué à la première déclaration.
    pub(crate) fn declare(&mut self, name: &str) -> EncodeResult<u8> {
        if let Some(&slot) = self.locals.get(name) {
            return Ok(slot);
        }
        let slot = u8::try_from(self.locals.len())
            .map_err(|_| EncodeError::TooManyLocals { function: self.function.to_owned() })?;
        self.locals.insert(name.to_owned(), slot);
        Ok(slot)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
/* Compiler façade */
// ─────────────────────────────────────────────────────────────────────────────

/// L'encodeur esbc : orchestre enregistrement, compilation et émission
#[derive(Debug, Default)]
pub struct Compiler {
    /// Options
    pub options: CompilerOptions,
    diags: Vec<Diagnostic>,
}

impl Compiler {
    /// Crée un encodeur
    pub fn new(options: CompilerOptions) -> Self { Self { options, diags: Vec::new() } }

    /// Description → AST.
    ///
    /// 1) enregistre un identifiant par fonction déclarée (hors `BUILTINS`),
    ///    dans l'ordre de déclaration, y compris pour les corps ignorés ;
    /// 2) compile chaque fonction à sa position ;
    /// 3) sans `main` déclarée, un `main_body` non vide devient un `DEF` final.
    pub fn compile(&mut self, spec: &ProgramSpec) -> EncodeResult<Program> {
        self.diags.clear();
        let mut funcs = FuncTable::new();

        for f in &spec.functions {
            if BUILTINS.contains(&f.name.as_str()) {
                continue;
            }
            if f.name != "main" && funcs.get(&f.name).is_some() {
                self.push(Diagnostic::warn(format!("duplicate definition of `{}`", f.name), Some(&f.name)));
            }
            funcs.register(&f.name)?;
        }
        debug!("registered {} function id(s)", funcs.len());

        let mut program = Program::default();
        for f in &spec.functions {
            if BUILTINS.contains(&f.name.as_str()) {
                self.push(Diagnostic::info(format!("builtin `{}` is not encoded", f.name), Some(&f.name)));
                continue;
            }
            if self.options.skip_prose && classify::is_prose(&f.body) {
                self.push(Diagnostic::info("body looks like prose; function skipped", Some(&f.name)));
                continue;
            }
            program.functions.push(self.function(&mut funcs, f)?);
        }

        let has_main = spec.functions.iter().any(FunctionSpec::is_main);
        if !has_main && !spec.main_body.trim().is_empty() {
            let mut ctx = Ctx::new(&mut self.diags, &mut funcs, "main", Vec::new());
            let body = ctx.block(&scan::normalize_branches(scan::strip_braces(&spec.main_body)))?;
            program.functions.push(Function { id: FUNC_MAIN, params: 0, body: Body::Block(body) });
        }
        Ok(program)
    }

    fn function(&mut self, funcs: &mut FuncTable, f: &FunctionSpec) -> EncodeResult<Function> {
        let params: Vec<String> = f.param_names().into_iter().map(str::to_owned).collect();
        let nparams = u8::try_from(params.len())
            .map_err(|_| EncodeError::TooManyParams { function: f.name.clone(), count: params.len() })?;
        let id = funcs.register(&f.name)?;
        let mut ctx = Ctx::new(&mut self.diags, funcs, &f.name, params);

        let body = f.body.trim();
        let body = if !f.is_main() && classify::is_oneliner(body) {
            Body::Expr(ctx.expr(body)?)
        } else {
            Body::Block(ctx.block(&scan::normalize_branches(scan::strip_braces(body)))?)
        };
        Ok(Function { id, params: nparams, body })
    }

    /// Description → flux d'octets.
    pub fn encode(&mut self, spec: &ProgramSpec) -> EncodeResult<Bytecode> {
        let program = self.compile(spec)?;

        let warnings = self.diags.iter().filter(|d| d.severity == Severity::Warning).count();
        if self.options.deny_warnings && warnings > 0 {
            return Err(EncodeError::Denied { diagnostics: core::mem::take(&mut self.diags) });
        }

        let bc = ByteEmitter::new(!self.options.string_table).emit(&program)?;
        info!("encoded {} function(s) into {} bytes ({warnings} warning(s))", program.functions.len(), bc.len());
        Ok(bc)
    }

    /// Récupère et vide les diagnostics accumulés
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> { core::mem::take(&mut self.diags) }

    fn push(&mut self, d: Diagnostic) {
        match d.severity {
            Severity::Warning => warn!("{d}"),
            Severity::Info => info!("{d}"),
        }
        self.diags.push(d);
    }
}

/// Encode avec les options par défaut.
pub fn encode(spec: &ProgramSpec) -> EncodeResult<Bytecode> { Compiler::default().encode(spec) }

/// Lit une description JSON et l'encode.
pub fn encode_json(json: &str) -> EncodeResult<Bytecode> { encode(&ProgramSpec::from_json(json)?) }
