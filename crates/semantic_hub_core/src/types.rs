//! Core domain types for the semantic hub.
//! Pure value types. No sqlx, no store dependencies.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HubError;

// ── Lifecycle status ──────────────────────────────────────────

/// Governance stage of a model. Gates mutability and deletability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    Draft,
    Released,
    Standardized,
    Deprecated,
}

impl ModelStatus {
    pub const ALL: [ModelStatus; 4] = [
        Self::Draft,
        Self::Released,
        Self::Standardized,
        Self::Deprecated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Released => "RELEASED",
            Self::Standardized => "STANDARDIZED",
            Self::Deprecated => "DEPRECATED",
        }
    }

    /// Case-insensitive parse; returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "RELEASED" => Some(Self::Released),
            "STANDARDIZED" => Some(Self::Standardized),
            "DEPRECATED" => Some(Self::Deprecated),
            _ => None,
        }
    }

    /// Whether `content` may change while the model sits in this status.
    pub fn is_content_mutable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Statuses that publish a model to consumers. Entering one of these
    /// requires every direct dependency to have left DRAFT.
    pub fn is_release_grade(&self) -> bool {
        matches!(self, Self::Released | Self::Standardized)
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Model dialect ─────────────────────────────────────────────

/// Schema dialect of a model. Read by the validator and extractor only;
/// lifecycle rules are identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelType {
    Samm,
    Bamm,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Samm => "SAMM",
            Self::Bamm => "BAMM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SAMM" => Some(Self::Samm),
            "BAMM" => Some(Self::Bamm),
            _ => None,
        }
    }

    /// URN scheme used by models of this dialect (`urn:{scheme}:...`).
    pub fn urn_scheme(&self) -> &'static str {
        match self {
            Self::Samm => "samm",
            Self::Bamm => "bamm",
        }
    }

    pub fn from_urn_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "samm" => Some(Self::Samm),
            "bamm" => Some(Self::Bamm),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── URN ───────────────────────────────────────────────────────

/// Model identifier: `urn:{scheme}:{namespace}:{version}#{name}`.
///
/// Ordering is byte-lexicographic over the full string, so
/// `..._10:1.0.0#Movement` sorts before `..._2:1.0.0#Movement`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelUrn {
    raw: String,
    // Byte offsets into `raw`: end of scheme, end of namespace, position of '#'.
    scheme_end: usize,
    namespace_end: usize,
    hash_pos: usize,
}

impl ModelUrn {
    pub fn parse(s: &str) -> Result<Self, HubError> {
        let invalid = |why: &str| HubError::InvalidInput(format!("invalid model URN '{s}': {why}"));

        let rest = s.strip_prefix("urn:").ok_or_else(|| invalid("missing 'urn:' prefix"))?;
        let (scheme, _) = rest
            .split_once(':')
            .ok_or_else(|| invalid("missing scheme"))?;
        if ModelType::from_urn_scheme(scheme).is_none() {
            return Err(invalid("scheme must be 'samm' or 'bamm'"));
        }
        let hash_pos = s.find('#').ok_or_else(|| invalid("missing '#'"))?;
        let name = &s[hash_pos + 1..];
        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(invalid("local name must be non-empty alphanumeric"));
        }

        let scheme_end = "urn:".len() + scheme.len();
        let package = &s[scheme_end + 1..hash_pos];
        let (namespace, version) = package
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing version"))?;
        if namespace.is_empty() || namespace.contains(char::is_whitespace) {
            return Err(invalid("namespace must be non-empty"));
        }
        if !is_version(version) {
            return Err(invalid("version must be dotted numeric (e.g. 1.0.0)"));
        }

        Ok(Self {
            raw: s.to_string(),
            scheme_end,
            namespace_end: scheme_end + 1 + namespace.len(),
            hash_pos,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.raw["urn:".len()..self.scheme_end]
    }

    pub fn namespace(&self) -> &str {
        &self.raw[self.scheme_end + 1..self.namespace_end]
    }

    pub fn version(&self) -> &str {
        &self.raw[self.namespace_end + 1..self.hash_pos]
    }

    pub fn name(&self) -> &str {
        &self.raw[self.hash_pos + 1..]
    }

    /// `urn:{scheme}:{namespace}:{version}#`, the package this model lives in.
    pub fn package_prefix(&self) -> &str {
        &self.raw[..=self.hash_pos]
    }

    /// Dialect implied by the URN scheme.
    pub fn model_type(&self) -> ModelType {
        // Scheme was validated in `parse`.
        ModelType::from_urn_scheme(self.scheme()).unwrap_or(ModelType::Samm)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_version(v: &str) -> bool {
    !v.is_empty()
        && v.split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

impl TryFrom<String> for ModelUrn {
    type Error = HubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelUrn> for String {
    fn from(urn: ModelUrn) -> Self {
        urn.raw
    }
}

impl std::str::FromStr for ModelUrn {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ModelUrn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::fmt::Debug for ModelUrn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModelUrn").field(&self.raw).finish()
    }
}

// ── Model record ──────────────────────────────────────────────

/// A stored model, one per URN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub urn: ModelUrn,
    pub content: String,
    pub status: ModelStatus,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    /// Stored models `content` references, by name or through one of their
    /// package's elements. Never contains `urn`.
    pub dependencies: BTreeSet<ModelUrn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Write counter used for compare-and-swap; 1 on creation.
    pub revision: u64,
}

impl ModelRecord {
    pub fn version(&self) -> &str {
        self.urn.version()
    }

    pub fn name(&self) -> &str {
        self.urn.name()
    }
}

// ── Requests ──────────────────────────────────────────────────

/// Input for `LifecycleEngine::create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModel {
    pub urn: ModelUrn,
    pub content: String,
    pub model_type: ModelType,
    pub status: ModelStatus,
}

/// Input for `LifecycleEngine::update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateModel {
    pub urn: ModelUrn,
    pub content: String,
    /// `None` keeps the stored dialect.
    pub model_type: Option<ModelType>,
    pub status: ModelStatus,
    /// PUT semantics: store the supplied content even on a promotion out of a
    /// frozen status. When false, a frozen model keeps its stored content.
    pub full_replace: bool,
}

/// Input for `LifecycleEngine::save`: create when absent, else update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveModel {
    pub urn: ModelUrn,
    pub content: String,
    pub model_type: ModelType,
    pub status: ModelStatus,
}

/// A model with its references expanded into one self-contained blob,
/// as consumed by artifact generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedModel {
    pub urn: ModelUrn,
    pub status: ModelStatus,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub content: String,
    /// Models whose content was inlined, root first, in discovery order.
    pub included: Vec<ModelUrn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_parts() {
        let urn = ModelUrn::parse("urn:samm:org.eclipse.tractusx.valid.save:2.0.0#Movement").unwrap();
        assert_eq!(urn.scheme(), "samm");
        assert_eq!(urn.namespace(), "org.eclipse.tractusx.valid.save");
        assert_eq!(urn.version(), "2.0.0");
        assert_eq!(urn.name(), "Movement");
        assert_eq!(
            urn.package_prefix(),
            "urn:samm:org.eclipse.tractusx.valid.save:2.0.0#"
        );
        assert_eq!(urn.model_type(), ModelType::Samm);
    }

    #[test]
    fn urn_rejects_malformed() {
        for bad in [
            "samm:org.example:1.0.0#A",
            "urn:foo:org.example:1.0.0#A",
            "urn:samm:org.example:1.0.0#",
            "urn:samm:org.example:1.0.0",
            "urn:samm:org.example:one#A",
            "urn:samm::1.0.0#A",
        ] {
            let err = ModelUrn::parse(bad).unwrap_err();
            assert!(matches!(err, HubError::InvalidInput(_)), "{bad} -> {err:?}");
        }
    }

    #[test]
    fn urn_orders_lexicographically() {
        let ten = ModelUrn::parse("urn:samm:org.example.list_10:1.0.0#Movement").unwrap();
        let two = ModelUrn::parse("urn:samm:org.example.list_2:1.0.0#Movement").unwrap();
        assert!(ten < two);
    }

    #[test]
    fn urn_debug_shows_only_the_urn() {
        let urn = ModelUrn::parse("urn:samm:org.example:1.0.0#Thing").unwrap();
        assert_eq!(
            format!("{urn:?}"),
            "ModelUrn(\"urn:samm:org.example:1.0.0#Thing\")"
        );
    }

    #[test]
    fn urn_serde_is_a_plain_string() {
        let urn = ModelUrn::parse("urn:bamm:org.example:1.0.0#Thing").unwrap();
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, "\"urn:bamm:org.example:1.0.0#Thing\"");
        let back: ModelUrn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, urn);
        assert!(serde_json::from_str::<ModelUrn>("\"not-a-urn\"").is_err());
    }

    #[test]
    fn status_names_round_trip() {
        for s in ModelStatus::ALL {
            assert_eq!(ModelStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ModelStatus::parse("released"), Some(ModelStatus::Released));
        assert_eq!(ModelStatus::parse("ACTIVE"), None);
        assert_eq!(
            serde_json::to_string(&ModelStatus::Standardized).unwrap(),
            "\"STANDARDIZED\""
        );
    }

    #[test]
    fn only_draft_is_content_mutable() {
        assert!(ModelStatus::Draft.is_content_mutable());
        assert!(!ModelStatus::Released.is_content_mutable());
        assert!(!ModelStatus::Standardized.is_content_mutable());
        assert!(!ModelStatus::Deprecated.is_content_mutable());
    }

    #[test]
    fn model_type_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ModelType::Bamm).unwrap(), "\"BAMM\"");
        assert_eq!(ModelType::parse("samm"), Some(ModelType::Samm));
    }
}
