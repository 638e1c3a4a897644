//! Wire types shared with the downstream collaborators, plus error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Profile returned by the user profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub preferences: Vec<String>,
}

/// A catalog or trending entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub category: String,
}

impl Product {
    pub fn new(id: u32, name: &str, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
        }
    }
}

/// Body of the catalog read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
}

/// Body of the trending read endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingList {
    pub trending: Vec<Product>,
}

/// A downstream collaborator, by the name used in URLs and annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dependency {
    UserProfile,
    ProductCatalog,
    Trending,
}

impl Dependency {
    pub const ALL: [Dependency; 3] = [
        Dependency::UserProfile,
        Dependency::ProductCatalog,
        Dependency::Trending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::UserProfile => "user-profile",
            Dependency::ProductCatalog => "product-catalog",
            Dependency::Trending => "trending",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dependency {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dependency::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Behavior injected into a collaborator for failure testing.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Normal = 0,
    Slow = 1,
    Fail = 2,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Normal => "normal",
            Behavior::Slow => "slow",
            Behavior::Fail => "fail",
        }
    }
}

impl From<u8> for Behavior {
    fn from(val: u8) -> Self {
        match val {
            1 => Behavior::Slow,
            2 => Behavior::Fail,
            _ => Behavior::Normal,
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Behavior::Normal),
            "slow" => Ok(Behavior::Slow),
            "fail" => Ok(Behavior::Fail),
            other => Err(UnknownName(other.to_string())),
        }
    }
}

/// A name that matched no known dependency or behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized name '{0}'")]
pub struct UnknownName(pub String);

/// Errors from calls to downstream collaborators.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The HTTP client itself could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, transport, or body decoding failure.
    #[error("request to {dependency} failed: {source}")]
    Request {
        dependency: Dependency,
        #[source]
        source: reqwest::Error,
    },

    /// The collaborator answered with a non-success status.
    #[error("{dependency} responded with status {status}")]
    Status { dependency: Dependency, status: u16 },

    /// A configured base URL could not be joined with an endpoint path.
    #[error("invalid URL for {dependency}: {reason}")]
    InvalidUrl { dependency: Dependency, reason: String },
}
