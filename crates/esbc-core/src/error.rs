//! Erreurs de lecture d'un flux esbc.
//!
//! Toutes les variantes portent l'offset fautif : un flux malformé n'est
//! jamais « deviné », il est rejeté à l'octet près.

use thiserror::Error;

/// Alias résultat pour la lecture de flux.
pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

/// Échec de décodage (flux tronqué, opcode inconnu ou mal placé, référence invalide).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fin de flux alors que des octets étaient attendus.
    #[error("unexpected end of bytecode at offset {offset}: {needed} more byte(s) needed")]
    UnexpectedEof {
        /// Offset de lecture.
        offset: usize,
        /// Octets manquants.
        needed: usize,
    },

    /// Octet qui n'est pas un opcode connu.
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode {
        /// Offset de l'octet.
        offset: usize,
        /// Valeur lue.
        byte: u8,
    },

    /// Opcode connu mais interdit à cette position.
    #[error("unexpected opcode 0x{byte:02x} at offset {offset} in {context} context")]
    UnexpectedOpcode {
        /// Offset de l'octet.
        offset: usize,
        /// Valeur lue.
        byte: u8,
        /// Contexte de lecture (`expression`, `statement`, `top-level`, …).
        context: &'static str,
    },

    /// Référence à une entrée absente de la table de chaînes.
    #[error("string reference {id} at offset {offset} out of range (table has {len} entries)")]
    StringOutOfRange {
        /// Offset de l'opcode `SREF`.
        offset: usize,
        /// Index demandé.
        id: u8,
        /// Taille de la table.
        len: usize,
    },

    /// Chaîne non UTF-8.
    #[error("invalid utf-8 string at offset {offset}")]
    InvalidUtf8 {
        /// Offset du premier octet de la chaîne.
        offset: usize,
    },

    /// Sélecteur de format `PRINTF` inconnu.
    #[error("unknown printf format {id} at offset {offset}")]
    UnknownFormat {
        /// Offset de l'octet de format.
        offset: usize,
        /// Sélecteur lu.
        id: u8,
    },

    /// Variable de boucle référencée hors de toute boucle (ou trop haut).
    #[error("loop variable {up} level(s) up at offset {offset}, but loop depth is {depth}")]
    LoopVarOutsideLoop {
        /// Offset de l'opcode.
        offset: usize,
        /// Niveaux au-dessus de la boucle courante.
        up: u8,
        /// Profondeur de boucles active.
        depth: usize,
    },

    /// Imbrication au-delà de `MAX_NESTING`.
    #[error("nesting deeper than {max} levels at offset {offset}")]
    TooDeep {
        /// Offset de l'opcode refusé.
        offset: usize,
        /// Profondeur maximale.
        max: usize,
    },

    /// Texte hexadécimal invalide.
    #[error("invalid hex input: {0}")]
    InvalidHex(String),
}

impl DecodeError {
    /// Offset de l'erreur, si elle en porte un.
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { offset, .. }
            | Self::UnknownOpcode { offset, .. }
            | Self::UnexpectedOpcode { offset, .. }
            | Self::StringOutOfRange { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::UnknownFormat { offset, .. }
            | Self::LoopVarOutsideLoop { offset, .. }
            | Self::TooDeep { offset, .. } => Some(*offset),
            Self::InvalidHex(_) => None,
        }
    }
}

impl From<hex::FromHexError> for DecodeError {
    fn from(e: hex::FromHexError) -> Self { Self::InvalidHex(e.to_string()) }
}
