//! The JSON trace format: a decoded function body plus frame seeds.
//!
//! A trace is what an external decoder would hand the engine — one
//! straight-line instruction path with the constant pool, symbol table,
//! and seed types needed to analyze it.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use bytehint_core::{EffectTable, FrameState, IsaVersion, Literal, MapResolver, TypeValue};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trace {
    /// Target instruction-set version, e.g. `"3.12"`.
    pub isa: String,
    #[serde(default)]
    pub consts: Vec<Literal>,
    #[serde(default)]
    pub names: Vec<String>,
    /// Seed types for the local slots; `null` marks a slot unset.
    #[serde(default)]
    pub locals: Vec<Option<TypeValue>>,
    #[serde(default)]
    pub cells: Vec<TypeValue>,
    /// Global symbol types, looked up by the name resolver.
    #[serde(default)]
    pub globals: HashMap<String, TypeValue>,
    /// Decoded instructions as `[mnemonic, argument]` pairs.
    pub code: Vec<(String, u32)>,
}

impl Trace {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed trace")
    }

    pub fn version(&self) -> Result<IsaVersion> {
        self.isa
            .parse::<IsaVersion>()
            .map_err(|err| anyhow::anyhow!(err))
    }

    pub fn seed_frame(&self) -> FrameState {
        FrameState::new()
            .with_locals(self.locals.clone())
            .with_cells(self.cells.clone())
            .with_consts(self.consts.clone())
            .with_names(self.names.clone())
            .with_resolver(Arc::new(MapResolver::from(self.globals.clone())))
    }
}

/// Drive the effect table over the trace's single path and read the final
/// stack top as the inferred result type.
pub fn infer(trace: &Trace) -> Result<TypeValue> {
    let table = EffectTable::for_version(trace.version()?);
    let mut frame = trace.seed_frame();

    for (pc, (mnemonic, arg)) in trace.code.iter().enumerate() {
        tracing::trace!(pc, mnemonic = mnemonic.as_str(), arg, "applying");
        table
            .apply_named(&mut frame, mnemonic, *arg)
            .with_context(|| format!("instruction {pc}: {mnemonic} {arg}"))?;
    }

    Ok(frame.top().cloned().unwrap_or(TypeValue::NONE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_infers_a_minimal_trace() {
        let trace = Trace::from_json(
            r#"{
                "isa": "3.12",
                "consts": [{"int": 1}],
                "locals": [{"Primitive": "int"}],
                "code": [["LOAD_FAST", 0], ["LOAD_CONST", 0], ["BINARY_OP", 0]]
            }"#,
        )
        .unwrap();
        assert_eq!(infer(&trace).unwrap(), TypeValue::INT);
    }

    #[test]
    fn globals_feed_the_resolver() {
        let trace = Trace::from_json(
            r#"{
                "isa": "3.10",
                "names": ["scale"],
                "globals": {"scale": {"Primitive": "float"}},
                "locals": [{"Primitive": "int"}],
                "code": [["LOAD_GLOBAL", 0], ["LOAD_FAST", 0], ["BINARY_MULTIPLY", 0]]
            }"#,
        )
        .unwrap();
        assert_eq!(infer(&trace).unwrap(), TypeValue::FLOAT);
    }

    #[test]
    fn empty_code_infers_none() {
        let trace = Trace::from_json(r#"{"isa": "3.13", "code": []}"#).unwrap();
        assert_eq!(infer(&trace).unwrap(), TypeValue::NONE);
    }

    #[test]
    fn underflow_is_reported_with_the_offending_pc() {
        let trace = Trace::from_json(r#"{"isa": "3.13", "code": [["POP_TOP", 0]]}"#).unwrap();
        let err = infer(&trace).unwrap_err();
        assert!(err.to_string().contains("instruction 0"));
    }

    #[test]
    fn unknown_isa_is_rejected() {
        let trace = Trace::from_json(r#"{"isa": "2.7", "code": []}"#).unwrap();
        assert!(infer(&trace).is_err());
    }
}
