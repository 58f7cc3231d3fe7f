//! esbc decompiler : flux d'octets → texte source lisible
//!
//! - [`decode`] : octets → [`Program`] (lecture stricte, erreurs datées)
//! - [`render`] : [`Program`] → texte (noms synthétiques, parenthèses minimales)
//! - [`decompile`] / [`decompile_hex`] : les deux à la suite
//!
//! ```rust
//! let src = esbc_decompiler::decompile_hex("01ff0030507011701903")?;
//! assert_eq!(src, "fn main() {\n  print(17 + 25)\n}\n");
//! # Ok::<(), esbc_core::DecodeError>(())
//! ```

#![deny(missing_docs)]

/// Lecture du flux.
pub mod decode;
/// Noms synthétiques.
pub mod names;
/// Rendu texte.
pub mod render;

use esbc_ast::Program;
use esbc_core::{Bytecode, DecodeResult};
use log::debug;

pub use decode::Decoder;
pub use esbc_core::DecodeError;

/// Octets → AST.
pub fn decode(bytes: &[u8]) -> DecodeResult<Program> {
    let program = Decoder::new(bytes)?.program()?;
    debug!("decoded {} function(s) from {} bytes", program.functions.len(), bytes.len());
    Ok(program)
}

/// AST → texte.
pub fn render(program: &Program) -> String { render::program(program) }

/// Octets → texte.
pub fn decompile(bytes: &[u8]) -> DecodeResult<String> { Ok(render(&decode(bytes)?)) }

/// Hex → texte.
pub fn decompile_hex(hex: &str) -> DecodeResult<String> { decompile(Bytecode::from_hex(hex)?.as_bytes()) }
