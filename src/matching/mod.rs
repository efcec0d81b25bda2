//! Defendant identity matching.
//!
//! Resolves a party described by an external submitter against the
//! defendants of a case. Keys are tried in strict priority order and the
//! first applicable key decides:
//!
//! 1. Arrest-summons number (ASN). Compared with an individual's ASN, or with
//!    an organisation's prosecuting-authority reference. No fallback when an
//!    ASN is present.
//! 2. CPS defendant id. Exact equality, falling back to personal details
//!    (individuals) or organisation name (legal entities).
//!
//! Matches are accumulated over every candidate. One match is `Matched`;
//! several are `Ambiguous`, carrying the first candidate in input order with
//! `multiple_matched` set so downstream review can pick it up.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::correlation::CaseHandle;
use crate::model::{CaseDefendant, DefendantDetails, ExternalParty, PersonDetails};

/// Which key produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchBasis {
    ArrestSummonsNumber,
    CpsDefendantId,
    OrganisationName,
    PersonalDetails,
}

/// A resolved reference to a case defendant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendantIdentity {
    pub defendant_id: Uuid,
    pub case_id: Option<Uuid>,
    pub basis: MatchBasis,
    pub multiple_matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOutcome {
    Unmatched,
    Matched(DefendantIdentity),
    Ambiguous(DefendantIdentity),
}

impl MatchOutcome {
    /// The identity chosen, for matched and ambiguous outcomes.
    pub fn identity(&self) -> Option<&DefendantIdentity> {
        match self {
            MatchOutcome::Unmatched => None,
            MatchOutcome::Matched(identity) | MatchOutcome::Ambiguous(identity) => Some(identity),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.identity().is_some()
    }
}

/// Outcome for one submitted party, as carried on outcome events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyMatch {
    pub external_id: Option<String>,
    pub label: String,
    pub outcome: MatchOutcome,
}

impl PartyMatch {
    pub fn new(party: &ExternalParty, outcome: MatchOutcome) -> Self {
        Self {
            external_id: party.external_id.clone(),
            label: party.label(),
            outcome,
        }
    }

    pub fn unmatched(party: &ExternalParty) -> Self {
        Self::new(party, MatchOutcome::Unmatched)
    }
}

/// Stateless matcher implementing the priority policy above.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMatcher;

impl IdentityMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Match `party` against every defendant of one case.
    pub fn match_party(
        &self,
        party: &ExternalParty,
        case_id: Option<Uuid>,
        defendants: &[CaseDefendant],
    ) -> MatchOutcome {
        self.settle(
            defendants
                .iter()
                .filter_map(|d| match_basis(party, d).map(|basis| (d.id, case_id, basis))),
        )
    }

    /// Match `party` against every defendant of several candidate cases.
    ///
    /// Used when the submitter names an application rather than a case; the
    /// same ambiguity policy applies across cases.
    pub fn match_across_cases(&self, party: &ExternalParty, cases: &[CaseHandle]) -> MatchOutcome {
        self.settle(cases.iter().flat_map(|case| {
            case.defendants.iter().filter_map(move |d| {
                match_basis(party, d).map(|basis| (d.id, Some(case.case_id), basis))
            })
        }))
    }

    fn settle(&self, mut hits: impl Iterator<Item = (Uuid, Option<Uuid>, MatchBasis)>) -> MatchOutcome {
        let Some((defendant_id, case_id, basis)) = hits.next() else {
            return MatchOutcome::Unmatched;
        };
        let multiple_matched = hits.next().is_some();
        let identity = DefendantIdentity {
            defendant_id,
            case_id,
            basis,
            multiple_matched,
        };
        if multiple_matched {
            MatchOutcome::Ambiguous(identity)
        } else {
            MatchOutcome::Matched(identity)
        }
    }
}

/// Decide whether `party` identifies `defendant`, and by which key.
fn match_basis(party: &ExternalParty, defendant: &CaseDefendant) -> Option<MatchBasis> {
    if let Some(asn) = present(&party.asn) {
        let candidate = match &defendant.details {
            DefendantDetails::Individual(person) => person.arrest_summons_number.as_deref(),
            DefendantDetails::Organisation { .. } => {
                defendant.prosecution_authority_reference.as_deref()
            }
        };
        return (candidate == Some(asn)).then_some(MatchBasis::ArrestSummonsNumber);
    }

    if let Some(cps_defendant_id) = present(&party.cps_defendant_id) {
        if defendant.cps_defendant_id.as_deref() == Some(cps_defendant_id) {
            return Some(MatchBasis::CpsDefendantId);
        }
        return match &defendant.details {
            DefendantDetails::Individual(person) => {
                personal_details_equal(party, person).then_some(MatchBasis::PersonalDetails)
            }
            DefendantDetails::Organisation { name } => {
                organisation_name_equal(party, name.as_deref())
                    .then_some(MatchBasis::OrganisationName)
            }
        };
    }

    None
}

/// Names compared case-sensitively; absent dates of birth on both sides are
/// equal. A party without a last name never matches on details.
fn personal_details_equal(party: &ExternalParty, person: &PersonDetails) -> bool {
    if present(&party.last_name).is_none() {
        return false;
    }
    party.first_name == person.first_name
        && party.middle_name == person.middle_name
        && party.last_name == person.last_name
        && party.date_of_birth == person.date_of_birth
}

fn organisation_name_equal(party: &ExternalParty, name: Option<&str>) -> bool {
    match (present(&party.organisation_name), name) {
        (Some(submitted), Some(known)) => submitted == known,
        _ => false,
    }
}

/// Blank identifiers count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
