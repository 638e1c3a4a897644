//! Response shapes produced by the fallback composition policy.

use serde::Serialize;

use crate::downstream::{Dependency, Product};

/// One variant per composition branch, tagged with `mode` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Recommendations {
    /// Neither circuit open.
    ///
    /// A failed call whose breaker stayed closed still lands here: the
    /// profile falls back to default preferences, the catalog to an empty
    /// list, and no annotation is attached.
    Normal {
        user_id: String,
        preferences: Vec<String>,
        recommendations: Vec<Product>,
    },
    /// Profile circuit open; default preferences applied to the catalog.
    ProfileFallback {
        user_id: String,
        preferences: Vec<String>,
        recommendations: Vec<Product>,
        fallback_triggered_for: String,
    },
    /// Catalog circuit open; trending substituted for the catalog.
    CatalogFallback {
        user_id: String,
        preferences: Vec<String>,
        trending: Vec<Product>,
        fallback_triggered_for: String,
    },
    /// Both circuits open; trending only.
    Degraded {
        user_id: String,
        trending: Vec<Product>,
        message: String,
        fallback_triggered_for: String,
    },
}

impl Recommendations {
    pub fn normal(user_id: &str, preferences: Vec<String>, recommendations: Vec<Product>) -> Self {
        Recommendations::Normal {
            user_id: user_id.to_string(),
            preferences,
            recommendations,
        }
    }

    pub fn profile_fallback(
        user_id: &str,
        preferences: Vec<String>,
        recommendations: Vec<Product>,
    ) -> Self {
        Recommendations::ProfileFallback {
            user_id: user_id.to_string(),
            preferences,
            recommendations,
            fallback_triggered_for: annotation(&[Dependency::UserProfile]),
        }
    }

    pub fn catalog_fallback(user_id: &str, preferences: Vec<String>, trending: Vec<Product>) -> Self {
        Recommendations::CatalogFallback {
            user_id: user_id.to_string(),
            preferences,
            trending,
            fallback_triggered_for: annotation(&[Dependency::ProductCatalog]),
        }
    }

    pub fn degraded(user_id: &str, trending: Vec<Product>) -> Self {
        Recommendations::Degraded {
            user_id: user_id.to_string(),
            trending,
            message: "Personalized recommendations are temporarily unavailable".to_string(),
            fallback_triggered_for: annotation(&[Dependency::UserProfile, Dependency::ProductCatalog]),
        }
    }

    /// Dependencies named in the fallback annotation, if any.
    pub fn fallback_triggered_for(&self) -> Option<&str> {
        match self {
            Recommendations::Normal { .. } => None,
            Recommendations::ProfileFallback { fallback_triggered_for, .. }
            | Recommendations::CatalogFallback { fallback_triggered_for, .. }
            | Recommendations::Degraded { fallback_triggered_for, .. } => Some(fallback_triggered_for.as_str()),
        }
    }
}

fn annotation(dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .map(Dependency::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Catalog products whose category is one of `preferences`, in catalog order.
pub fn recommend(preferences: &[String], products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| preferences.iter().any(|pref| pref == &p.category))
        .cloned()
        .collect()
}
