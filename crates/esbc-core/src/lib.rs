//! esbc-core: format binaire partagé par l'encodeur et le décodeur
//!
//! Fournit :
//! - la table des opcodes (`Op`), leurs formes d'opérandes (`Shape`) et les
//!   sélecteurs de format `PRINTF` (`Format`)
//! - les constantes du format (`FUNC_MAIN`, limites des opérandes u8)
//! - IO mémoire : `ByteWriter`, `ByteReader` (i16 big-endian)
//! - la table de chaînes dédupliquée (`StringTable`) et son en-tête
//! - le conteneur `Bytecode` (hex ⇄ octets)
//! - un listing linéaire des opcodes (`disasm::listing`)
//! - Erreurs `DecodeError` + alias `DecodeResult<T>`
//!
//! Features :
//! - `serde` : (dé)sérialisation de `Op`, `Format` et `Bytecode` (en hex)

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Opcodes, formes d'opérandes, constantes.
pub mod isa;
/// Lecture / écriture séquentielle.
pub mod io;
/// Table de chaînes.
pub mod strtab;
/// Conteneur d'octets + hex.
pub mod bytecode;
/// Listing textuel linéaire.
pub mod disasm;

mod error;

pub use bytecode::Bytecode;
pub use error::{DecodeError, DecodeResult};
pub use io::{ByteReader, ByteWriter};
pub use isa::{Format, Op, Shape, FUNC_MAIN, MAX_FUNC_ID, MAX_NESTING, MAX_STRINGS, MAX_STR_LEN};
pub use strtab::{StringTable, TableError};

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        ByteReader, ByteWriter, Bytecode, DecodeError, DecodeResult, Format, Op, StringTable,
        FUNC_MAIN,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
