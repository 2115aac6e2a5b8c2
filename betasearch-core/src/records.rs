//! Route record payload carried through indexing and returned by queries.

use serde::{Deserialize, Serialize};

use crate::corpus::RouteId;

/// One climbing route as it appears in the curated OpenBeta export.
/// `description` holds the raw paragraph lines that feed the corpus;
/// `parent_loc` is `(longitude, latitude)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "route_ID")]
    pub route_id: RouteId,
    pub route_name: String,
    #[serde(default)]
    pub type_string: String,
    #[serde(rename = "YDS", default)]
    pub yds: Option<String>,
    #[serde(rename = "Vermin", default)]
    pub vermin: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub parent_sector: Option<String>,
    #[serde(default)]
    pub parent_loc: Option<(f64, f64)>,
}

impl RouteRecord {
    /// Grade string joining whichever of YDS and Vermin are present,
    /// e.g. "5.10a V2" or just "V4".
    pub fn grade(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(yds) = &self.yds {
            parts.push(yds);
        }
        if let Some(vermin) = &self.vermin {
            parts.push(vermin);
        }
        parts.join(" ")
    }

    /// Description lines joined into one block of text.
    pub fn description_text(&self) -> String {
        self.description.join(" ")
    }
}
