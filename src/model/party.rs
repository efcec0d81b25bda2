//! Defendants as the case knows them, and parties as submitters describe them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A defendant or respondent as described by the submitting party.
///
/// Every field is optional; missing data degrades matching to "unmatched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalParty {
    /// Submitter's own identifier for the party, used in correlation pairs.
    pub external_id: Option<String>,
    /// Arrest-summons number.
    pub asn: Option<String>,
    pub cps_defendant_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub organisation_name: Option<String>,
}

impl ExternalParty {
    /// Label used in logs and problem values.
    pub fn label(&self) -> String {
        if let Some(id) = &self.external_id {
            return id.clone();
        }
        if let Some(name) = &self.organisation_name {
            return name.clone();
        }
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Personal details of an individual defendant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonDetails {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub arrest_summons_number: Option<String>,
}

/// Individual or legal-entity details of a case defendant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefendantDetails {
    Individual(PersonDetails),
    #[serde(rename_all = "camelCase")]
    Organisation { name: Option<String> },
}

/// A defendant on a known prosecution case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDefendant {
    pub id: Uuid,
    #[serde(default)]
    pub cps_defendant_id: Option<String>,
    #[serde(default)]
    pub prosecution_authority_reference: Option<String>,
    pub details: DefendantDetails,
}

impl CaseDefendant {
    pub fn individual(id: Uuid, details: PersonDetails) -> Self {
        Self {
            id,
            cps_defendant_id: None,
            prosecution_authority_reference: None,
            details: DefendantDetails::Individual(details),
        }
    }

    pub fn organisation(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            cps_defendant_id: None,
            prosecution_authority_reference: None,
            details: DefendantDetails::Organisation {
                name: Some(name.into()),
            },
        }
    }

    pub fn with_cps_defendant_id(mut self, cps_defendant_id: impl Into<String>) -> Self {
        self.cps_defendant_id = Some(cps_defendant_id.into());
        self
    }

    pub fn with_prosecution_authority_reference(mut self, reference: impl Into<String>) -> Self {
        self.prosecution_authority_reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_label_prefers_external_id() {
        let party = ExternalParty {
            external_id: Some("D1".to_string()),
            first_name: Some("Ann".to_string()),
            ..Default::default()
        };
        assert_eq!(party.label(), "D1");
    }

    #[test]
    fn test_party_label_falls_back_to_names() {
        let party = ExternalParty {
            first_name: Some("Ann".to_string()),
            last_name: Some("Smith".to_string()),
            ..Default::default()
        };
        assert_eq!(party.label(), "Ann Smith");
    }

    #[test]
    fn test_defendant_details_wire_shape() {
        let defendant = CaseDefendant::organisation(Uuid::nil(), "Acme Ltd");
        let json = serde_json::to_value(&defendant).unwrap();
        assert_eq!(json["details"]["type"], "ORGANISATION");
        assert_eq!(json["details"]["name"], "Acme Ltd");
    }
}
