//! Lightweight Turtle-surface validator and URN reference extractor.
//!
//! Not an RDF parser. Works on the lexical surface of the document:
//! `@prefix` declarations, `<urn:...>` IRIs and `prefix:Local` names.
//! String literals and whole-line comments are blanked out first so text
//! inside descriptions never counts as a reference.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::HubError;
use crate::ports::{DependencyExtractor, ModelValidator, ParsedModel, Result};
use crate::types::{ModelType, ModelUrn};

/// Namespaces owned by the meta-model itself. References into them are
/// vocabulary, not dependencies.
pub const META_MODEL_NAMESPACES: [&str; 2] = ["org.eclipse.esmf.samm", "io.openmanufacturing"];

/// Modules a meta-model namespace may expose (`{namespace}:{module}:{version}#`).
const META_MODEL_MODULES: [&str; 4] = ["meta-model", "characteristic", "entity", "unit"];

static STRING_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"""(?:[^"\\]|\\.|"[^"]|""[^"])*"""|"(?:[^"\\\n]|\\.)*""#).unwrap()
});

static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*#.*$").unwrap());

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@prefix\s+([A-Za-z][\w.-]*)?:\s*<([^>]*)>\s*\.").unwrap()
});

static URN_IRI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(urn:[^>\s]*)>").unwrap());

static PREFIXED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(\[;,])([A-Za-z][\w.-]*)?:([A-Za-z_][\w-]*)").unwrap()
});

static PACKAGE_IRI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^urn:(samm|bamm):([^#\s]+):(\d+(?:\.\d+)*)#$").unwrap()
});

pub fn is_meta_model_namespace(namespace: &str) -> bool {
    META_MODEL_NAMESPACES
        .iter()
        .any(|ns| namespace == *ns || namespace.starts_with(&format!("{ns}:")))
}

// ── Validator ─────────────────────────────────────────────────

/// Structural checks on Turtle model content.
///
/// Rejects blank content, malformed URNs, package IRIs of a foreign
/// dialect, unknown meta-model modules and documents that define no
/// model element. Every failure is reported under `validationError`.
#[derive(Debug, Default, Clone)]
pub struct TurtleModelValidator;

impl TurtleModelValidator {
    pub fn new() -> Self {
        Self
    }

    fn check(&self, model_type: ModelType, raw: &str) -> std::result::Result<ParsedModel, String> {
        if raw.trim().is_empty() {
            return Err("Model content must not be empty.".into());
        }

        let without_strings = STRING_LITERAL_RE.replace_all(raw, "\"\"");
        let body = LINE_COMMENT_RE.replace_all(&without_strings, "");

        let mut prefixes: BTreeMap<String, String> = BTreeMap::new();
        for cap in PREFIX_RE.captures_iter(&body) {
            let name = cap.get(1).map_or("", |m| m.as_str()).to_string();
            let iri = cap[2].to_string();
            if iri.starts_with("urn:") {
                check_package_iri(model_type, &iri)?;
            }
            prefixes.insert(name, iri);
        }

        let mut urn_tokens = Vec::new();
        for cap in URN_IRI_RE.captures_iter(&body) {
            let iri = &cap[1];
            if iri.ends_with('#') {
                check_package_iri(model_type, iri)?;
                continue;
            }
            let urn = ModelUrn::parse(iri).map_err(|_| format!("Invalid URN '{iri}'."))?;
            check_scheme(model_type, &urn)?;
            urn_tokens.push(urn);
        }

        for cap in PREFIXED_NAME_RE.captures_iter(&body) {
            let prefix = cap.get(1).map_or("", |m| m.as_str());
            let Some(base) = prefixes.get(prefix) else {
                return Err(format!("Undeclared prefix '{prefix}:'."));
            };
            // xsd:, rdf: and other non-urn vocabularies
            if !base.starts_with("urn:") {
                continue;
            }
            let expanded = format!("{base}{}", &cap[2]);
            let urn = ModelUrn::parse(&expanded)
                .map_err(|_| format!("Invalid URN '{expanded}'."))?;
            urn_tokens.push(urn);
        }

        let defines_element = urn_tokens
            .iter()
            .any(|u| !is_meta_model_namespace(u.namespace()));
        if !defines_element {
            return Err("Model content does not define any model element.".into());
        }

        Ok(ParsedModel {
            model_type,
            content: raw.to_string(),
            urn_tokens,
        })
    }
}

fn check_package_iri(model_type: ModelType, iri: &str) -> std::result::Result<(), String> {
    let cap = PACKAGE_IRI_RE
        .captures(iri)
        .ok_or_else(|| format!("Invalid namespace IRI '{iri}'."))?;
    if &cap[1] != model_type.urn_scheme() {
        return Err(format!(
            "Namespace IRI '{iri}' does not belong to a {model_type} model."
        ));
    }
    let namespace = &cap[2];
    if is_meta_model_namespace(namespace) {
        let module = namespace.rsplit_once(':').map(|(_, m)| m);
        if !module.is_some_and(|m| META_MODEL_MODULES.contains(&m)) {
            return Err(format!("Unknown meta-model namespace '{iri}'."));
        }
    }
    Ok(())
}

fn check_scheme(model_type: ModelType, urn: &ModelUrn) -> std::result::Result<(), String> {
    if urn.model_type() == model_type {
        Ok(())
    } else {
        Err(format!("URN '{urn}' does not belong to a {model_type} model."))
    }
}

#[async_trait]
impl ModelValidator for TurtleModelValidator {
    async fn validate(&self, model_type: ModelType, raw: &str) -> Result<ParsedModel> {
        self.check(model_type, raw).map_err(HubError::validation)
    }
}

// ── Extractor ─────────────────────────────────────────────────

/// Collects references to other models from the URN tokens of a parsed
/// model, skipping meta-model vocabulary and the model's own package.
#[derive(Debug, Default, Clone)]
pub struct UrnReferenceExtractor;

impl UrnReferenceExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DependencyExtractor for UrnReferenceExtractor {
    fn extract_references(&self, own: &ModelUrn, model: &ParsedModel) -> BTreeSet<ModelUrn> {
        model
            .urn_tokens
            .iter()
            .filter(|u| !is_meta_model_namespace(u.namespace()))
            .filter(|u| u.package_prefix() != own.package_prefix())
            .cloned()
            .collect()
    }
}
