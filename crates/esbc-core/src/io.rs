//! Lecture / écriture séquentielle d'octets.
//!
//! Les entiers larges sont big-endian (`INT16`), via `byteorder`.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::{isa::Op, DecodeError, DecodeResult};

/* ─────────────────────────── Byte Writer ─────────────────────────── */

/// Buffer d'écriture (croît automatiquement).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    pub const fn new() -> Self { Self { buf: Vec::new() } }
    /// Accès en lecture au contenu.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Récupère le buffer (consomme).
    pub fn into_vec(self) -> Vec<u8> { self.buf }
    /// Nombre d'octets écrits.
    pub fn len(&self) -> usize { self.buf.len() }
    /// Vrai si rien n'a été écrit.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    /// Écrit un opcode.
    pub fn write_op(&mut self, op: Op) { self.buf.push(op.byte()); }
    /// Écrit un octet brut.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Écrit un opcode suivi d'un octet.
    pub fn write_op_u8(&mut self, op: Op, v: u8) {
        self.write_op(op);
        self.write_u8(v);
    }
    /// Écrit un i16 big-endian.
    pub fn write_i16_be(&mut self, v: i16) {
        // Vec<u8> en écriture ne peut pas échouer.
        let _ = self.buf.write_i16::<BigEndian>(v);
    }
    /// Écrit `len:u8` puis les octets ; l'appelant garantit `bytes.len() <= 255`.
    pub fn write_str8(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= crate::MAX_STR_LEN);
        self.buf.push(u8::try_from(bytes.len()).unwrap_or(u8::MAX));
        self.buf.extend_from_slice(&bytes[..bytes.len().min(crate::MAX_STR_LEN)]);
    }
    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }
    /// Ajoute le contenu d'un autre writer.
    pub fn append(&mut self, other: &Self) { self.buf.extend_from_slice(&other.buf); }
}

/* ─────────────────────────── Byte Reader ─────────────────────────── */

/// Curseur en avant sur un slice d'octets ; jamais de retour arrière.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur.
    pub const fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Offset courant.
    pub const fn offset(&self) -> usize { self.off }
    /// Taille restante.
    pub const fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }
    /// Vrai si tout a été lu.
    pub const fn is_at_end(&self) -> bool { self.remaining() == 0 }

    /// Octet courant sans avancer.
    pub fn peek_u8(&self) -> Option<u8> { self.data.get(self.off).copied() }

    /// Lit `n` octets (ou erreur si EOF).
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof { offset: self.off, needed: n - self.remaining() });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un octet.
    pub fn read_u8(&mut self) -> DecodeResult<u8> { Ok(self.read_bytes(1)?[0]) }

    /// Lit un i16 big-endian.
    pub fn read_i16_be(&mut self) -> DecodeResult<i16> {
        let b = self.read_bytes(2)?;
        Ok(BigEndian::read_i16(b))
    }

    /// Lit `len:u8` puis la chaîne UTF-8 correspondante.
    pub fn read_str8(&mut self) -> DecodeResult<&'a str> {
        let len = usize::from(self.read_u8()?);
        let at = self.off;
        let bytes = self.read_bytes(len)?;
        core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset: at })
    }

    /// Lit un opcode ; un octet inconnu est une erreur.
    pub fn read_op(&mut self) -> DecodeResult<Op> {
        let at = self.off;
        let b = self.read_u8()?;
        Op::from_byte(b).ok_or(DecodeError::UnknownOpcode { offset: at, byte: b })
    }

    /// Opcode courant sans avancer (`None` en fin de flux ou si l'octet est inconnu).
    pub fn peek_op(&self) -> Option<Op> { self.peek_u8().and_then(Op::from_byte) }
}
