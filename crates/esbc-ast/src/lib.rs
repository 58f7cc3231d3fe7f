// src/lib.rs
//! esbc AST
//!
//! Ce crate définit l'arbre intermédiaire entre le texte et le flux d'octets :
//! l'encodeur le construit depuis le texte puis l'émet, le décodeur le
//! reconstruit depuis les octets puis le rend en texte.
//!
//! - Les variables n'ont pas de nom : paramètres, locaux et variables de boucle
//!   sont des positions (le format ne conserve aucun identifiant)
//! - Les chaînes `if`/`el if`/`el` sont une structure récursive (`IfChain`)
//! - Les opérateurs binaires portent leur précédence et leur opcode
//!
//! # Features
//! - `serde` : permet la sérialisation/désérialisation de l'arbre
//!
//! # Exemple
//! ```rust
//! use esbc_ast::{BinOp, Expr};
//!
//! let e = Expr::binary(BinOp::Add, Expr::Int(17), Expr::Int(25));
//! assert_eq!(e.precedence(), Some(4));
//! ```

#![deny(missing_docs)]

use esbc_core::{Format, Op, FUNC_MAIN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifiant de fonction (`FUNC_MAIN` pour le point d'entrée).
pub type FuncId = u8;

// ─── Opérateurs ───

/// Opérateurs binaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinOp {
    /// Groupes d'opérateurs, du moins prioritaire au plus prioritaire.
    ///
    /// Dans un groupe, les symboles de deux caractères précèdent leurs préfixes
    /// d'un caractère (`<=` avant `<`).
    pub const GROUPS: [&'static [Self]; 5] = [
        &[Self::Or],
        &[Self::And],
        &[Self::Eq, Self::Ne, Self::Le, Self::Ge, Self::Lt, Self::Gt],
        &[Self::Add, Self::Sub],
        &[Self::Mul, Self::Div, Self::Mod],
    ];

    /// Symbole source.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Précédence (plus grand = lie plus fort). Tous sont associatifs à gauche.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Mod => 5,
        }
    }

    /// Opcode correspondant.
    pub const fn op(self) -> Op {
        match self {
            Self::Add => Op::Add,
            Self::Sub => Op::Sub,
            Self::Mul => Op::Mul,
            Self::Div => Op::Div,
            Self::Mod => Op::Mod,
            Self::Eq => Op::Eq,
            Self::Ne => Op::Ne,
            Self::Lt => Op::Lt,
            Self::Le => Op::Le,
            Self::Gt => Op::Gt,
            Self::Ge => Op::Ge,
            Self::And => Op::And,
            Self::Or => Op::Or,
        }
    }

    /// Opérateur d'un opcode binaire.
    pub const fn from_op(op: Op) -> Option<Self> {
        Some(match op {
            Op::Add => Self::Add,
            Op::Sub => Self::Sub,
            Op::Mul => Self::Mul,
            Op::Div => Self::Div,
            Op::Mod => Self::Mod,
            Op::Eq => Self::Eq,
            Op::Ne => Self::Ne,
            Op::Lt => Self::Lt,
            Op::Le => Self::Le,
            Op::Gt => Self::Gt,
            Op::Ge => Self::Ge,
            Op::And => Self::And,
            Op::Or => Self::Or,
            _ => return None,
        })
    }
}

/// Agrégats sur un intervalle inclusif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregate {
    /// `product(a..=b)`
    Product,
    /// `sum(a..=b)`
    Sum,
}

impl Aggregate {
    /// Nom d'appel source.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Sum => "sum",
        }
    }

    /// Opcode correspondant.
    pub const fn op(self) -> Op {
        match self {
            Self::Product => Op::Prod,
            Self::Sum => Op::Sum,
        }
    }

    /// Reconnaît un nom d'appel.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "product" => Some(Self::Product),
            "sum" => Some(Self::Sum),
            _ => None,
        }
    }
}

// ─── Expressions ───

/// Expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// Entier (`INT` si 0..=255, sinon `INT16`).
    Int(i16),
    /// Chaîne littérale (table de chaînes ou en ligne).
    Str(String),
    /// Paramètre positionnel.
    Param(u8),
    /// Local par slot.
    Local(u8),
    /// Variable de boucle, `up` niveaux au-dessus de la boucle la plus interne.
    LoopVar {
        /// 0 = boucle courante.
        up: u8,
    },
    /// Opération binaire.
    Binary {
        /// Opérateur.
        op: BinOp,
        /// Opérande gauche.
        lhs: Box<Expr>,
        /// Opérande droit.
        rhs: Box<Expr>,
    },
    /// `cond ? then : otherwise`
    Ternary {
        /// Condition.
        cond: Box<Expr>,
        /// Valeur si vrai.
        then: Box<Expr>,
        /// Valeur si faux.
        otherwise: Box<Expr>,
    },
    /// Appel d'une fonction déclarée (ou de `main`).
    Call {
        /// Cible.
        func: FuncId,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `product`/`sum` sur `start..=end`.
    Aggregate {
        /// Agrégat.
        kind: Aggregate,
        /// Borne basse.
        start: Box<Expr>,
        /// Borne haute (incluse).
        end: Box<Expr>,
    },
    /// `print(x)`
    Print(Box<Expr>),
    /// `printf(fmt, args…)`
    Printf {
        /// Sélecteur de format.
        format: Format,
        /// Arguments.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Construit une opération binaire.
    pub fn binary(op: BinOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    /// Construit un ternaire.
    pub fn ternary(cond: Self, then: Self, otherwise: Self) -> Self {
        Self::Ternary { cond: Box::new(cond), then: Box::new(then), otherwise: Box::new(otherwise) }
    }

    /// Construit un agrégat.
    pub fn aggregate(kind: Aggregate, start: Self, end: Self) -> Self {
        Self::Aggregate { kind, start: Box::new(start), end: Box::new(end) }
    }

    /// Précédence du nœud : `Some(0)` pour un ternaire, celle de l'opérateur
    /// pour un binaire, `None` pour un atome.
    pub const fn precedence(&self) -> Option<u8> {
        match self {
            Self::Ternary { .. } => Some(0),
            Self::Binary { op, .. } => Some(op.precedence()),
            _ => None,
        }
    }
}

// ─── Instructions ───

/// Instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stmt {
    /// `for v := start..=end { body }`
    For {
        /// Borne basse.
        start: Expr,
        /// Borne haute (incluse).
        end: Expr,
        /// Corps.
        body: Vec<Stmt>,
    },
    /// `while cond { body }`
    While {
        /// Condition.
        cond: Expr,
        /// Corps.
        body: Vec<Stmt>,
    },
    /// `if … el if … el …`
    If(IfChain),
    /// `return expr`
    Return(Expr),
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `x := value`
    Declare {
        /// Slot local.
        slot: u8,
        /// Valeur initiale.
        value: Expr,
    },
    /// `x = value`
    Assign {
        /// Slot local.
        slot: u8,
        /// Valeur.
        value: Expr,
    },
    /// `x += value`
    AddAssign {
        /// Slot local.
        slot: u8,
        /// Incrément.
        value: Expr,
    },
    /// Expression évaluée pour ses effets (`print(…)`, appel…).
    Expr(Expr),
}

/// Une branche `if` et sa suite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IfChain {
    /// Condition.
    pub cond: Expr,
    /// Corps si vrai.
    pub then: Vec<Stmt>,
    /// Suite de la chaîne.
    pub otherwise: Else,
}

/// Suite d'une branche `if`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Else {
    /// Pas de branche alternative.
    #[default]
    None,
    /// `el if …` : la chaîne continue.
    Chain(Box<IfChain>),
    /// `el { … }` : la chaîne se termine.
    Block(Vec<Stmt>),
}

impl IfChain {
    /// Nombre de conditions de la chaîne (`if` + `el if`).
    pub fn arms(&self) -> usize {
        let mut n = 1;
        let mut cur = self;
        while let Else::Chain(next) = &cur.otherwise {
            n += 1;
            cur = next;
        }
        n
    }

    /// Vrai si la chaîne se termine par un `el { … }`.
    pub fn has_final_else(&self) -> bool {
        let mut cur = self;
        loop {
            match &cur.otherwise {
                Else::None => return false,
                Else::Block(_) => return true,
                Else::Chain(next) => cur = next,
            }
        }
    }
}

// ─── Fonctions / programme ───

/// Corps de fonction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Body {
    /// Une seule expression (`DEFX`).
    Expr(Expr),
    /// Un bloc d'instructions (`DEF`).
    Block(Vec<Stmt>),
}

/// Fonction encodée.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    /// Identifiant (`FUNC_MAIN` pour `main`).
    pub id: FuncId,
    /// Nombre de paramètres.
    pub params: u8,
    /// Corps.
    pub body: Body,
}

impl Function {
    /// Vrai pour le point d'entrée.
    pub const fn is_main(&self) -> bool { self.id == FUNC_MAIN }
}

/// Programme : fonctions dans l'ordre du flux.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    /// Fonctions, `main` comprise.
    pub functions: Vec<Function>,
}

impl Program {
    /// Fonction par identifiant.
    pub fn function(&self, id: FuncId) -> Option<&Function> { self.functions.iter().find(|f| f.id == id) }

    /// Point d'entrée, s'il est présent.
    pub fn main(&self) -> Option<&Function> { self.function(FUNC_MAIN) }
}
