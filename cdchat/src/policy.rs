//! Dispatch policy: decides whether an utterance must be answered by an
//! operation, needs a clarification, or only gets general guidance.
//!
//! Screening for sensitive values always runs first. Anything it finds is
//! never extracted as a lookup reference.
//!
//! ```rust
//! use cdchat::{Classification, DispatchPolicy, KeywordDispatchPolicy};
//! use cdtooling::builtin_operations;
//!
//! let policy = KeywordDispatchPolicy::new().expect("patterns compile");
//! let operations: Vec<_> = builtin_operations().iter().map(|op| op.definition()).collect();
//!
//! match policy.classify("status of grievance GRV-2024-001", &operations) {
//!     Classification::Matched(targets) => {
//!         assert_eq!(targets[0].operation, "grievance-status");
//!         assert_eq!(targets[0].reference, "GRV-2024-001");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//!
//! assert!(!policy.screen("my aadhaar is 1234 5678 9012").is_empty());
//! ```

use std::ops::Range;

use cdcommon::Domain;
use cdprovider::ToolDefinition;
use regex::Regex;

use crate::{ChatError, ClassifiedAs};

const REDACTED: &str = "[redacted]";
const MIN_REFERENCE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensitiveKind {
    IdentityNumber,
    TaxIdNumber,
    TravelDocumentNumber,
    OneTimeCode,
    FinancialDetails,
}

impl SensitiveKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IdentityNumber => "Aadhaar number",
            Self::TaxIdNumber => "PAN",
            Self::TravelDocumentNumber => "passport number",
            Self::OneTimeCode => "OTP",
            Self::FinancialDetails => "bank or card details",
        }
    }

    /// The service whose portal the citizen should use instead.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            Self::IdentityNumber => Some(Domain::Identity),
            Self::TaxIdNumber => Some(Domain::TaxId),
            Self::TravelDocumentNumber => Some(Domain::TravelDocument),
            Self::OneTimeCode | Self::FinancialDetails => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveFinding {
    pub kind: SensitiveKind,
    pub span: Range<usize>,
}

/// One operation the turn must invoke, with the argument to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    pub domain: Domain,
    pub operation: String,
    pub input_key: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A status question with a reference for each target.
    Matched(Vec<DispatchTarget>),
    /// A status question about `Domain` that carries no reference.
    Incomplete(Domain),
    /// Equally strong matches for several domains.
    Ambiguous(Vec<Domain>),
    /// No operation applies; `topic` is the service mentioned, if any.
    Unmatched { topic: Option<Domain> },
}

impl Classification {
    pub fn classified_as(&self) -> ClassifiedAs {
        match self {
            Self::Matched(_) => ClassifiedAs::Matched,
            Self::Incomplete(_) => ClassifiedAs::Incomplete,
            Self::Ambiguous(_) => ClassifiedAs::Ambiguous,
            Self::Unmatched { .. } => ClassifiedAs::Unmatched,
        }
    }
}

pub trait DispatchPolicy: Send + Sync {
    /// Every sensitive value in `utterance`, ordered by position.
    fn screen(&self, utterance: &str) -> Vec<SensitiveFinding>;

    fn classify(&self, utterance: &str, operations: &[ToolDefinition]) -> Classification;
}

/// Replaces every finding with a placeholder.
pub fn redact(text: &str, findings: &[SensitiveFinding]) -> String {
    let mut spans: Vec<Range<usize>> = findings.iter().map(|finding| finding.span.clone()).collect();
    spans.sort_by_key(|span| span.start);

    let mut redacted = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.end <= cursor {
            continue;
        }
        let start = span.start.max(cursor);
        redacted.push_str(&text[cursor..start]);
        redacted.push_str(REDACTED);
        cursor = span.end;
    }
    redacted.push_str(&text[cursor..]);
    redacted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Strength {
    General = 1,
    Specific = 2,
}

#[derive(Debug)]
struct DomainKeywords {
    domain: Domain,
    specific: Regex,
    general: Regex,
}

impl DomainKeywords {
    fn new(domain: Domain, specific: &[&str], general: &[&str]) -> Result<Self, ChatError> {
        Ok(Self {
            domain,
            specific: keyword_pattern(specific)?,
            general: keyword_pattern(general)?,
        })
    }

    /// Strongest keyword class present and where it first appears.
    fn strongest(&self, utterance: &str) -> Option<(Strength, usize)> {
        if let Some(found) = self.specific.find(utterance) {
            return Some((Strength::Specific, found.start()));
        }

        self.general
            .find(utterance)
            .map(|found| (Strength::General, found.start()))
    }
}

fn keyword_pattern(keywords: &[&str]) -> Result<Regex, ChatError> {
    let alternatives: Vec<String> = keywords.iter().map(|keyword| regex::escape(keyword)).collect();
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?)
}

/// Keyword and pattern based policy over the four built-in domains.
#[derive(Debug)]
pub struct KeywordDispatchPolicy {
    sensitive: Vec<(SensitiveKind, Regex)>,
    domains: Vec<DomainKeywords>,
    status_intent: Regex,
    reference: Regex,
    date: Regex,
}

impl KeywordDispatchPolicy {
    pub fn new() -> Result<Self, ChatError> {
        let sensitive = vec![
            (
                SensitiveKind::IdentityNumber,
                Regex::new(r"\b\d{4}[ -]?\d{4}[ -]?\d{4}\b")?,
            ),
            (
                SensitiveKind::TaxIdNumber,
                Regex::new(r"(?i)\b[a-z]{5}\d{4}[a-z]\b")?,
            ),
            (
                SensitiveKind::TravelDocumentNumber,
                Regex::new(r"(?i)\b[a-z]\d{7}\b")?,
            ),
            (
                SensitiveKind::OneTimeCode,
                Regex::new(
                    r"(?i)\b(?:otp|one[- ]time (?:password|code|pin)|verification code)\b[\s:=#-]*(?:is\s*)?[\s:=#-]*\d{4,8}\b",
                )?,
            ),
            (
                SensitiveKind::FinancialDetails,
                Regex::new(r"\b(?:\d[ -]?){12,18}\d\b")?,
            ),
            (
                SensitiveKind::FinancialDetails,
                Regex::new(
                    r"(?i)\b(?:account\s+(?:number|no)|a/c|ifsc|cvv|upi\s+(?:id|pin)|card\s+number)\b[.\s:=#-]*(?:is\s*)?[\s:=#-]*[a-z0-9@._-]*\d[a-z0-9@._-]*",
                )?,
            ),
        ];

        let domains = vec![
            DomainKeywords::new(
                Domain::Identity,
                &["aadhaar", "aadhar", "uidai"],
                &["identity", "id card", "enrolment", "enrollment"],
            )?,
            DomainKeywords::new(
                Domain::TaxId,
                &["pan", "pan card", "permanent account number"],
                &["tax", "income tax", "e-filing"],
            )?,
            DomainKeywords::new(
                Domain::TravelDocument,
                &["passport", "passport seva"],
                &["travel", "travel document"],
            )?,
            DomainKeywords::new(
                Domain::Grievance,
                &["grievance", "grievances", "cpgrams", "pgportal"],
                &["complaint", "complaints"],
            )?,
        ];

        Ok(Self {
            sensitive,
            domains,
            status_intent: Regex::new(
                r"(?i)\b(?:status|track|tracking|check|progress|pending|update|updates|where is|approved|dispatched|resolved)\b",
            )?,
            reference: Regex::new(r"\b[A-Za-z0-9]+(?:[-/][A-Za-z0-9]+)*\b")?,
            date: Regex::new(r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{4})$")?,
        })
    }

    /// Reference-looking tokens that are neither sensitive values nor dates.
    fn references<'u>(
        &self,
        utterance: &'u str,
        findings: &[SensitiveFinding],
    ) -> Vec<(usize, &'u str)> {
        self.reference
            .find_iter(utterance)
            .filter(|found| found.as_str().len() >= MIN_REFERENCE_LEN)
            .filter(|found| found.as_str().bytes().any(|byte| byte.is_ascii_digit()))
            .filter(|found| !self.date.is_match(found.as_str()))
            .filter(|found| {
                !findings
                    .iter()
                    .any(|finding| finding.span.start < found.end() && found.start() < finding.span.end)
            })
            .map(|found| (found.start(), found.as_str()))
            .collect()
    }

    /// Domains at the strongest keyword level, in order of first mention.
    fn strongest_domains(&self, utterance: &str) -> Vec<Domain> {
        let mentions: Vec<(Domain, Strength, usize)> = self
            .domains
            .iter()
            .filter_map(|keywords| {
                keywords
                    .strongest(utterance)
                    .map(|(strength, position)| (keywords.domain, strength, position))
            })
            .collect();

        let Some(top) = mentions.iter().map(|(_, strength, _)| *strength).max() else {
            return Vec::new();
        };

        let mut strongest: Vec<(Domain, usize)> = mentions
            .into_iter()
            .filter(|(_, strength, _)| *strength == top)
            .map(|(domain, _, position)| (domain, position))
            .collect();
        strongest.sort_by_key(|(_, position)| *position);
        strongest.into_iter().map(|(domain, _)| domain).collect()
    }
}

impl DispatchPolicy for KeywordDispatchPolicy {
    fn screen(&self, utterance: &str) -> Vec<SensitiveFinding> {
        let mut findings: Vec<SensitiveFinding> = self
            .sensitive
            .iter()
            .flat_map(|(kind, pattern)| {
                pattern.find_iter(utterance).map(|found| SensitiveFinding {
                    kind: *kind,
                    span: found.range(),
                })
            })
            .collect();

        // A card number also contains a 12-digit run; report it once.
        let financial: Vec<Range<usize>> = findings
            .iter()
            .filter(|finding| finding.kind == SensitiveKind::FinancialDetails)
            .map(|finding| finding.span.clone())
            .collect();
        findings.retain(|finding| {
            finding.kind == SensitiveKind::FinancialDetails
                || !financial
                    .iter()
                    .any(|span| span.start <= finding.span.start && finding.span.end <= span.end)
        });

        findings.sort_by_key(|finding| (finding.span.start, finding.kind));
        findings.dedup();
        findings
    }

    fn classify(&self, utterance: &str, operations: &[ToolDefinition]) -> Classification {
        let findings = self.screen(utterance);
        let references = self.references(utterance, &findings);
        let operation_for = |domain: Domain| {
            let mut candidates: Vec<&ToolDefinition> = operations
                .iter()
                .filter(|definition| definition.domain == domain)
                .collect();
            candidates.sort_by(|left, right| left.name.cmp(&right.name));
            candidates.into_iter().next()
        };
        let dispatchable = |domain: &Domain| operation_for(*domain).is_some();

        let strongest = self.strongest_domains(utterance);
        if strongest.is_empty() {
            if references.is_empty() {
                return Classification::Unmatched { topic: None };
            }

            let candidates: Vec<Domain> = Domain::ALL.into_iter().filter(dispatchable).collect();
            return match candidates.as_slice() {
                [] => Classification::Unmatched { topic: None },
                [only] => Classification::Matched(targets(*only, &references, operation_for)),
                _ => Classification::Ambiguous(candidates),
            };
        }

        let candidates: Vec<Domain> = strongest.iter().copied().filter(dispatchable).collect();
        match candidates.as_slice() {
            [] => Classification::Unmatched {
                topic: strongest.first().copied(),
            },
            [domain] => {
                if !references.is_empty() {
                    Classification::Matched(targets(*domain, &references, operation_for))
                } else if self.status_intent.is_match(utterance) {
                    Classification::Incomplete(*domain)
                } else {
                    Classification::Unmatched {
                        topic: Some(*domain),
                    }
                }
            }
            _ if references.len() == candidates.len() => {
                // One reference per mentioned service, paired in order of appearance.
                let paired = candidates
                    .iter()
                    .zip(references.iter())
                    .flat_map(|(domain, reference)| {
                        targets(*domain, std::slice::from_ref(reference), operation_for)
                    })
                    .collect();
                Classification::Matched(paired)
            }
            _ => Classification::Ambiguous(candidates),
        }
    }
}

fn targets<'d, F>(domain: Domain, references: &[(usize, &str)], operation_for: F) -> Vec<DispatchTarget>
where
    F: Fn(Domain) -> Option<&'d ToolDefinition>,
{
    let Some(definition) = operation_for(domain) else {
        return Vec::new();
    };

    references
        .iter()
        .map(|(_, reference)| DispatchTarget {
            domain,
            operation: definition.name.clone(),
            input_key: definition.input_key.clone(),
            reference: (*reference).to_string(),
        })
        .collect()
}
