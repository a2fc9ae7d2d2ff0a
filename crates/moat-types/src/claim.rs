//! Claims and their rule-based scoring outcomes.
//!
//! Claims arrive from upstream transcript extraction; a [`ScoredClaim`] adds the
//! confidence and rule tags assigned by the scoring phase. Both are validated
//! on construction and have no setters.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{MoatError, Result, error::ensure_unit};

/// Category of an extracted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// A claimed durable competitive advantage.
    CompetitiveAdvantage,
    /// A claim linking an advantage to a growth (CAGR) narrative.
    CagrConnection,
    /// A plain factual statement.
    FactualClaim,
}

impl ClaimType {
    /// Wire name used in serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CompetitiveAdvantage => "competitive_advantage",
            Self::CagrConnection => "cagr_connection",
            Self::FactualClaim => "factual_claim",
        }
    }
}

/// Rules that mark a claim as structurally corroborated.
///
/// These are the only rules that change a claim's aggregation weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructuralRule {
    /// Rule 6: structural advantage.
    AdvantageRule6,
    /// Rule 11: industry structure match.
    IndustryMatchRule11,
}

impl StructuralRule {
    /// Minimum aggregation weight granted by this rule.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        match self {
            Self::AdvantageRule6 => 1.5,
            Self::IndustryMatchRule11 => 2.0,
        }
    }

    /// Numeric rule identifier.
    #[must_use]
    pub const fn number(&self) -> u16 {
        match self {
            Self::AdvantageRule6 => 6,
            Self::IndustryMatchRule11 => 11,
        }
    }
}

/// A rule identifier applied during claim scoring, serialized as `rule_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AppliedRule {
    /// A rule that carries structural aggregation weight.
    Structural(StructuralRule),
    /// Any other scoring rule, kept for audit output.
    Other(u16),
}

impl AppliedRule {
    /// Numeric rule identifier.
    #[must_use]
    pub const fn number(&self) -> u16 {
        match self {
            Self::Structural(rule) => rule.number(),
            Self::Other(n) => *n,
        }
    }

    /// The structural rule, if this is one.
    #[must_use]
    pub const fn structural(&self) -> Option<StructuralRule> {
        match self {
            Self::Structural(rule) => Some(*rule),
            Self::Other(_) => None,
        }
    }
}

impl From<u16> for AppliedRule {
    fn from(n: u16) -> Self {
        match n {
            6 => Self::Structural(StructuralRule::AdvantageRule6),
            11 => Self::Structural(StructuralRule::IndustryMatchRule11),
            other => Self::Other(other),
        }
    }
}

impl FromStr for AppliedRule {
    type Err = MoatError;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix("rule_")
            .and_then(|n| n.parse::<u16>().ok())
            .map(Self::from)
            .ok_or_else(|| MoatError::InvalidRule(s.to_string()))
    }
}

impl TryFrom<String> for AppliedRule {
    type Error = MoatError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AppliedRule> for String {
    fn from(rule: AppliedRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for AppliedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule_{}", self.number())
    }
}

/// The set of rules the scoring phase applied to a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    applied_rules: BTreeSet<AppliedRule>,
}

impl RuleEvaluation {
    /// Create an evaluation from applied rules.
    pub fn new(rules: impl IntoIterator<Item = AppliedRule>) -> Self {
        Self {
            applied_rules: rules.into_iter().collect(),
        }
    }

    /// Parse `rule_<n>` tags, failing on the first malformed one.
    pub fn from_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let applied_rules = tags
            .into_iter()
            .map(|tag| tag.as_ref().parse())
            .collect::<Result<_>>()?;
        Ok(Self { applied_rules })
    }

    /// Applied rules in ascending rule order.
    pub const fn applied_rules(&self) -> &BTreeSet<AppliedRule> {
        &self.applied_rules
    }

    /// Whether any structural rule applies.
    pub fn is_structural(&self) -> bool {
        self.applied_rules.iter().any(|r| r.structural().is_some())
    }

    /// Largest structural weight among the applied rules.
    ///
    /// Structural weights never add up: rule 6 and rule 11 together yield the
    /// rule 11 weight.
    pub fn structural_weight(&self) -> Option<f64> {
        self.applied_rules
            .iter()
            .filter_map(AppliedRule::structural)
            .map(|rule| rule.weight())
            .reduce(f64::max)
    }
}

/// An assertion about a company extracted from a transcript or filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClaimRecord")]
pub struct Claim {
    claim: String,
    evidence: String,
    claim_type: ClaimType,
}

#[derive(Deserialize)]
struct ClaimRecord {
    claim: String,
    #[serde(default)]
    evidence: String,
    claim_type: ClaimType,
}

impl TryFrom<ClaimRecord> for Claim {
    type Error = MoatError;

    fn try_from(record: ClaimRecord) -> Result<Self> {
        Self::new(record.claim, record.evidence, record.claim_type)
    }
}

impl Claim {
    /// Create a claim. The claim text must not be blank.
    pub fn new(
        claim: impl Into<String>,
        evidence: impl Into<String>,
        claim_type: ClaimType,
    ) -> Result<Self> {
        let claim = claim.into();
        if claim.trim().is_empty() {
            return Err(MoatError::EmptyField("claim"));
        }
        Ok(Self {
            claim,
            evidence: evidence.into(),
            claim_type,
        })
    }

    /// The claim text.
    pub fn claim(&self) -> &str {
        &self.claim
    }

    /// Supporting evidence.
    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    /// The claim category.
    pub const fn claim_type(&self) -> ClaimType {
        self.claim_type
    }
}

/// A single audited confidence adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AdjustmentRecord")]
pub struct Adjustment {
    source: String,
    adjustment: f64,
    reasoning: String,
}

#[derive(Deserialize)]
struct AdjustmentRecord {
    source: String,
    adjustment: f64,
    #[serde(default)]
    reasoning: String,
}

impl TryFrom<AdjustmentRecord> for Adjustment {
    type Error = MoatError;

    fn try_from(record: AdjustmentRecord) -> Result<Self> {
        Self::new(record.source, record.adjustment, record.reasoning)
    }
}

impl Adjustment {
    /// Create an adjustment; `adjustment` must lie within `[-1, 1]`.
    pub fn new(
        source: impl Into<String>,
        adjustment: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self> {
        let source = source.into();
        if !(adjustment.is_finite() && (-1.0..=1.0).contains(&adjustment)) {
            return Err(MoatError::InvalidAdjustment {
                source_name: source,
                value: adjustment,
            });
        }
        Ok(Self {
            source,
            adjustment,
            reasoning: reasoning.into(),
        })
    }

    /// Which rule or reviewer produced the adjustment.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Signed confidence delta.
    pub const fn adjustment(&self) -> f64 {
        self.adjustment
    }

    /// Free-text justification.
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }
}

/// A claim together with its rule-evaluation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoredClaimRecord")]
pub struct ScoredClaim {
    claim: Claim,
    final_confidence: f64,
    rule_evaluation: RuleEvaluation,
    adjustments: Vec<Adjustment>,
}

#[derive(Deserialize)]
struct ScoredClaimRecord {
    claim: Claim,
    final_confidence: f64,
    #[serde(default)]
    rule_evaluation: RuleEvaluation,
    #[serde(default)]
    adjustments: Vec<Adjustment>,
}

impl TryFrom<ScoredClaimRecord> for ScoredClaim {
    type Error = MoatError;

    fn try_from(record: ScoredClaimRecord) -> Result<Self> {
        Self::new(record.claim, record.final_confidence, record.rule_evaluation)
            .map(|scored| scored.with_adjustments(record.adjustments))
    }
}

impl ScoredClaim {
    /// Create a scored claim; `final_confidence` must lie within `[0, 1]`.
    pub fn new(claim: Claim, final_confidence: f64, rule_evaluation: RuleEvaluation) -> Result<Self> {
        let final_confidence = ensure_unit("final_confidence", final_confidence)?;
        Ok(Self {
            claim,
            final_confidence,
            rule_evaluation,
            adjustments: Vec::new(),
        })
    }

    /// Attach the ordered adjustment trail.
    #[must_use]
    pub fn with_adjustments(mut self, adjustments: Vec<Adjustment>) -> Self {
        self.adjustments = adjustments;
        self
    }

    /// The underlying claim.
    pub const fn claim(&self) -> &Claim {
        &self.claim
    }

    /// Shorthand for the claim category.
    pub const fn claim_type(&self) -> ClaimType {
        self.claim.claim_type()
    }

    /// Confidence after rule-based adjustment.
    pub const fn final_confidence(&self) -> f64 {
        self.final_confidence
    }

    /// Rules applied by the scoring phase.
    pub const fn rule_evaluation(&self) -> &RuleEvaluation {
        &self.rule_evaluation
    }

    /// Audit trail of confidence adjustments.
    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }
}
