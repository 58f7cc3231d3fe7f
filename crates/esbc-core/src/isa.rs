//! Opcode table and operand shapes.
//!
//! Every instruction starts with one opcode byte and the opcode alone decides
//! how many bytes follow, so a reader never needs lookahead to stay in sync.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Function id reserved for the entry function (`main`).
pub const FUNC_MAIN: u8 = 0xFF;

/// Highest id an ordinary (non-entry) function may receive.
pub const MAX_FUNC_ID: u8 = FUNC_MAIN - 1;

/// Longest string a single length byte can describe.
pub const MAX_STR_LEN: usize = u8::MAX as usize;

/// Largest number of entries in the string-table header.
pub const MAX_STRINGS: usize = u8::MAX as usize;

/// Deepest statement/expression nesting a reader or writer will follow.
pub const MAX_NESTING: usize = 256;

/// Opcodes of the esbc instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Op {
    /// String-table header: `count:u8` then `count × (len:u8, bytes)`.
    StrTab = 0x00,
    /// Statement-bodied function: `fid:u8 nparams:u8`, statements, `END`.
    Def = 0x01,
    /// Expression-bodied function: `fid:u8 nparams:u8`, expression, `END`.
    DefX = 0x02,
    /// Block terminator.
    End = 0x03,

    /// `start end` expressions, body, `END`.
    For = 0x10,
    /// `cond` expression, body, `END`.
    While = 0x11,
    /// `cond` expression, body, then `END` or `ELSE …`.
    If = 0x12,
    /// Alternate branch marker inside an `IF`.
    Else = 0x13,

    /// Return the following expression.
    Ret = 0x20,
    /// Leave the innermost loop.
    Brk = 0x21,
    /// Next iteration of the innermost loop.
    Cont = 0x22,

    /// Print one expression.
    Print = 0x30,
    /// `fmt:u8 argc:u8`, then `argc` expressions.
    Printf = 0x31,

    /// Product over an inclusive range: `start end`.
    Prod = 0x40,
    /// Sum over an inclusive range: `start end`.
    Sum = 0x41,

    /// `+`
    Add = 0x50,
    /// `-`
    Sub = 0x51,
    /// `*`
    Mul = 0x52,
    /// `/`
    Div = 0x53,
    /// `%`
    Mod = 0x54,

    /// `==`
    Eq = 0x60,
    /// `!=`
    Ne = 0x61,
    /// `<`
    Lt = 0x62,
    /// `<=`
    Le = 0x63,
    /// `>`
    Gt = 0x64,
    /// `>=`
    Ge = 0x65,
    /// `&&`
    And = 0x66,
    /// `||`
    Or = 0x67,

    /// Small literal `val:u8`.
    Int = 0x70,
    /// Wide literal `val:i16` big-endian.
    Int16 = 0x71,
    /// Parameter reference `idx:u8`.
    Param = 0x72,
    /// Local reference `slot:u8`.
    Local = 0x73,
    /// Innermost loop variable (no operand).
    LVar = 0x74,
    /// `fid:u8 argc:u8`, then `argc` expressions.
    Call = 0x75,
    /// Declare local: `slot:u8`, expression.
    Decl = 0x76,
    /// Assign local: `slot:u8`, expression.
    Asgn = 0x77,
    /// Add-assign local: `slot:u8`, expression.
    AAdd = 0x78,
    /// `cond then else` expressions.
    Tern = 0x79,
    /// Inline string: `len:u8`, bytes.
    Str = 0x7A,
    /// String-table reference `id:u8`.
    SRef = 0x7B,
    /// Outer loop variable `up:u8` levels above the innermost loop.
    LVarUp = 0x7C,
}

/// Immediate operands carried by an opcode, before any nested expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Nothing inline.
    None,
    /// One byte.
    U8,
    /// Two bytes (id + count, or format + count).
    U8U8,
    /// Big-endian i16.
    I16,
    /// Length byte followed by that many bytes.
    Str8,
    /// The string-table header.
    Table,
}

impl Op {
    /// Every opcode, in byte order.
    pub const ALL: [Self; 41] = [
        Self::StrTab,
        Self::Def,
        Self::DefX,
        Self::End,
        Self::For,
        Self::While,
        Self::If,
        Self::Else,
        Self::Ret,
        Self::Brk,
        Self::Cont,
        Self::Print,
        Self::Printf,
        Self::Prod,
        Self::Sum,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::And,
        Self::Or,
        Self::Int,
        Self::Int16,
        Self::Param,
        Self::Local,
        Self::LVar,
        Self::Call,
        Self::Decl,
        Self::Asgn,
        Self::AAdd,
        Self::Tern,
        Self::Str,
        Self::SRef,
        Self::LVarUp,
    ];

    /// Opcode byte.
    pub const fn byte(self) -> u8 { self as u8 }

    /// Decodes an opcode byte.
    pub const fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x00 => Self::StrTab,
            0x01 => Self::Def,
            0x02 => Self::DefX,
            0x03 => Self::End,
            0x10 => Self::For,
            0x11 => Self::While,
            0x12 => Self::If,
            0x13 => Self::Else,
            0x20 => Self::Ret,
            0x21 => Self::Brk,
            0x22 => Self::Cont,
            0x30 => Self::Print,
            0x31 => Self::Printf,
            0x40 => Self::Prod,
            0x41 => Self::Sum,
            0x50 => Self::Add,
            0x51 => Self::Sub,
            0x52 => Self::Mul,
            0x53 => Self::Div,
            0x54 => Self::Mod,
            0x60 => Self::Eq,
            0x61 => Self::Ne,
            0x62 => Self::Lt,
            0x63 => Self::Le,
            0x64 => Self::Gt,
            0x65 => Self::Ge,
            0x66 => Self::And,
            0x67 => Self::Or,
            0x70 => Self::Int,
            0x71 => Self::Int16,
            0x72 => Self::Param,
            0x73 => Self::Local,
            0x74 => Self::LVar,
            0x75 => Self::Call,
            0x76 => Self::Decl,
            0x77 => Self::Asgn,
            0x78 => Self::AAdd,
            0x79 => Self::Tern,
            0x7A => Self::Str,
            0x7B => Self::SRef,
            0x7C => Self::LVarUp,
            _ => return None,
        })
    }

    /// Upper-case mnemonic used by listings.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::StrTab => "STRTAB",
            Self::Def => "DEF",
            Self::DefX => "DEFX",
            Self::End => "END",
            Self::For => "FOR",
            Self::While => "WHILE",
            Self::If => "IF",
            Self::Else => "ELSE",
            Self::Ret => "RET",
            Self::Brk => "BRK",
            Self::Cont => "CONT",
            Self::Print => "PRINT",
            Self::Printf => "PRINTF",
            Self::Prod => "PROD",
            Self::Sum => "SUM",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Int => "INT",
            Self::Int16 => "INT16",
            Self::Param => "PARAM",
            Self::Local => "LOCAL",
            Self::LVar => "LVAR",
            Self::Call => "CALL",
            Self::Decl => "DECL",
            Self::Asgn => "ASGN",
            Self::AAdd => "AADD",
            Self::Tern => "TERN",
            Self::Str => "STR",
            Self::SRef => "SREF",
            Self::LVarUp => "LVAR_UP",
        }
    }

    /// Inline operands following the opcode byte.
    pub const fn shape(self) -> Shape {
        match self {
            Self::StrTab => Shape::Table,
            Self::Def | Self::DefX | Self::Call | Self::Printf => Shape::U8U8,
            Self::Int
            | Self::Param
            | Self::Local
            | Self::Decl
            | Self::Asgn
            | Self::AAdd
            | Self::SRef
            | Self::LVarUp => Shape::U8,
            Self::Int16 => Shape::I16,
            Self::Str => Shape::Str8,
            _ => Shape::None,
        }
    }

    /// Opens a block that is closed by `END`.
    pub const fn opens_block(self) -> bool {
        matches!(self, Self::Def | Self::DefX | Self::For | Self::While | Self::If)
    }

    /// Binary operator opcodes (two nested expressions).
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Mod
                | Self::Eq
                | Self::Ne
                | Self::Lt
                | Self::Le
                | Self::Gt
                | Self::Ge
                | Self::And
                | Self::Or
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.mnemonic()) }
}

impl From<Op> for u8 {
    fn from(op: Op) -> Self { op.byte() }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(b: u8) -> Result<Self, Self::Error> { Self::from_byte(b).ok_or(b) }
}

/* ─────────────────────────── Formats printf ─────────────────────────── */

/// Format selectors understood by `PRINTF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Format {
    /// `"%s\n"`
    StrNl = 0,
    /// `"%d\n"`
    IntNl = 1,
    /// `"%f\n"`
    FltNl = 2,
}

impl Format {
    /// Selector byte.
    pub const fn id(self) -> u8 { self as u8 }

    /// Decodes a selector byte.
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::StrNl),
            1 => Some(Self::IntNl),
            2 => Some(Self::FltNl),
            _ => None,
        }
    }

    /// Source spelling, with the newline written as the two characters `\n`.
    pub const fn literal(self) -> &'static str {
        match self {
            Self::StrNl => "%s\\n",
            Self::IntNl => "%d\\n",
            Self::FltNl => "%f\\n",
        }
    }

    /// Recognizes a format string, escaped (`%d\n` as text) or with a real newline.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "%s\\n" | "%s\n" => Some(Self::StrNl),
            "%d\\n" | "%d\n" => Some(Self::IntNl),
            "%f\\n" | "%f\n" => Some(Self::FltNl),
            _ => None,
        }
    }
}
