//! Aides partagées par les tests d'intégration esbc.
//!
//! Un aller-retour = octets → texte décompilé → [`ProgramSpec::from_source`]
//! → octets. Après un aller-retour le flux ne bouge plus.

use std::error::Error;

use esbc_compiler::ProgramSpec;
use esbc_core::{ByteReader, Bytecode, StringTable};

/// Résultat des tests (erreurs d'encodage et de décodage confondues).
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Encode avec les options par défaut.
pub fn encode(spec: &ProgramSpec) -> TestResult<Bytecode> { Ok(esbc_compiler::encode(spec)?) }

/// Décompile puis ré-encode.
pub fn reencode(bytes: &[u8]) -> TestResult<Bytecode> {
    let text = esbc_decompiler::decompile(bytes)?;
    encode(&ProgramSpec::from_source(&text)?)
}

/// Les trois flux d'un double aller-retour : original, après un tour, après deux.
pub fn round_trips(spec: &ProgramSpec) -> TestResult<[Bytecode; 3]> {
    let b1 = encode(spec)?;
    let b2 = reencode(b1.as_bytes())?;
    let b3 = reencode(b2.as_bytes())?;
    Ok([b1, b2, b3])
}

/// Nombre d'entrées de la table de chaînes d'un flux.
pub fn string_count(bytes: &[u8]) -> TestResult<usize> {
    Ok(StringTable::read_header(&mut ByteReader::new(bytes))?.len())
}
