//! Fixed value sets stored as plain strings in the record store.
//!
//! The store keeps the Finnish labels; the Rust variants use English names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CrmError;

/// Sales stage of a customer on the kanban board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CustomerStatus {
    #[default]
    #[serde(rename = "Uusi")]
    New,
    #[serde(rename = "Tarjous")]
    Quote,
    #[serde(rename = "Kauppa")]
    Deal,
    #[serde(rename = "Hävisi")]
    Lost,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 4] = [Self::New, Self::Quote, Self::Deal, Self::Lost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "Uusi",
            Self::Quote => "Tarjous",
            Self::Deal => "Kauppa",
            Self::Lost => "Hävisi",
        }
    }

    /// Case-insensitive match against the canonical labels.
    pub fn from_loose(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == wanted)
    }

    /// Customers still being worked on (counted in the open pipeline).
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::Quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "A-ryhmä")]
    A,
    #[serde(rename = "B-ryhmä")]
    B,
    #[serde(rename = "C-ryhmä")]
    C,
    #[serde(rename = "Passiivinen")]
    Passive,
    #[serde(rename = "Potentiaalinen")]
    Potential,
}

impl Segment {
    pub const ALL: [Segment; 5] = [Self::A, Self::B, Self::C, Self::Passive, Self::Potential];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A-ryhmä",
            Self::B => "B-ryhmä",
            Self::C => "C-ryhmä",
            Self::Passive => "Passiivinen",
            Self::Potential => "Potentiaalinen",
        }
    }
}

/// Channel a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSource {
    #[serde(rename = "Kylmäsoitto")]
    ColdCall,
    #[serde(rename = "Suositus")]
    Referral,
    #[serde(rename = "Verkkosivut")]
    Website,
    #[serde(rename = "Messut")]
    TradeFair,
    #[serde(rename = "YTJ")]
    BusinessRegistry,
    #[serde(rename = "Muu")]
    Other,
    #[serde(rename = "Tuntematon")]
    Unknown,
}

impl LeadSource {
    pub const ALL: [LeadSource; 7] = [
        Self::ColdCall,
        Self::Referral,
        Self::Website,
        Self::TradeFair,
        Self::BusinessRegistry,
        Self::Other,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColdCall => "Kylmäsoitto",
            Self::Referral => "Suositus",
            Self::Website => "Verkkosivut",
            Self::TradeFair => "Messut",
            Self::BusinessRegistry => "YTJ",
            Self::Other => "Muu",
            Self::Unknown => "Tuntematon",
        }
    }
}

/// Pipeline stage of a project/deal, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Uusi")]
    New,
    #[serde(rename = "Yhteydenotto")]
    Contacted,
    #[serde(rename = "Tarjous")]
    Quote,
    #[serde(rename = "Neuvottelu")]
    Negotiation,
    #[serde(rename = "Voitettu")]
    Won,
    #[serde(rename = "Hävinnyt")]
    Lost,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        Self::New,
        Self::Contacted,
        Self::Quote,
        Self::Negotiation,
        Self::Won,
        Self::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "Uusi",
            Self::Contacted => "Yhteydenotto",
            Self::Quote => "Tarjous",
            Self::Negotiation => "Neuvottelu",
            Self::Won => "Voitettu",
            Self::Lost => "Hävinnyt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "Puhelu")]
    Call,
    #[serde(rename = "Sähköposti")]
    Email,
    #[serde(rename = "Muistiinpano")]
    Note,
    #[serde(rename = "Tapaaminen")]
    Meeting,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [Self::Call, Self::Email, Self::Note, Self::Meeting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "Puhelu",
            Self::Email => "Sähköposti",
            Self::Note => "Muistiinpano",
            Self::Meeting => "Tapaaminen",
        }
    }
}

// FromStr/Display are identical for every value set: exact match on the
// stored label.
macro_rules! impl_label_traits {
    ($($ty:ident => $kind:literal),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = CrmError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::ALL
                        .into_iter()
                        .find(|v| v.as_str() == s)
                        .ok_or_else(|| CrmError::invalid($kind, s))
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_label_traits!(
    CustomerStatus => "customer status",
    Segment => "segment",
    LeadSource => "lead source",
    ProjectStatus => "project status",
    ActivityType => "activity type",
);
