//! Cache key conventions for the portfolio entities.
//!
//! ## Key Format
//!
//! `{entity}:{discriminator}`, e.g. `hero_sections:alice` or
//! `users:4f2c…`. The discriminator is a route name or user id.
//!
//! The coordinator itself treats keys as opaque strings; these builders
//! exist so action handlers cannot drift apart on the spelling of a
//! key. Two reads that should observe the same record must produce the
//! identical key string; the cache has no way to detect a mismatch.

use std::fmt;

/// Typed cache key for a portfolio entity scoped to one discriminator.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    entity: &'static str,
    discriminator: String,
}

impl CacheKey {
    fn new(entity: &'static str, discriminator: impl Into<String>) -> Self {
        Self {
            entity,
            discriminator: discriminator.into(),
        }
    }

    /// Hero section for a public route.
    pub fn hero_sections(route_name: impl Into<String>) -> Self {
        Self::new("hero_sections", route_name)
    }

    /// Project list for a public route.
    pub fn projects(route_name: impl Into<String>) -> Self {
        Self::new("projects", route_name)
    }

    /// Work-experience list for a public route.
    pub fn work_experiences(route_name: impl Into<String>) -> Self {
        Self::new("work_experiences", route_name)
    }

    /// Layout style settings for a public route.
    pub fn layout_styles(route_name: impl Into<String>) -> Self {
        Self::new("layout_styles", route_name)
    }

    /// User record by user id.
    pub fn users(user_id: impl Into<String>) -> Self {
        Self::new("users", user_id)
    }

    pub fn entity(&self) -> &str {
        self.entity
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.discriminator)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(CacheKey::hero_sections("alice").to_string(), "hero_sections:alice");
        assert_eq!(CacheKey::projects("alice").to_string(), "projects:alice");
        assert_eq!(
            CacheKey::work_experiences("bob").to_string(),
            "work_experiences:bob"
        );
        assert_eq!(CacheKey::layout_styles("bob").to_string(), "layout_styles:bob");
        assert_eq!(CacheKey::users("u-123").to_string(), "users:u-123");
    }

    #[test]
    fn test_same_record_same_key() {
        assert_eq!(CacheKey::projects("alice"), CacheKey::projects("alice"));
        assert_ne!(CacheKey::projects("alice"), CacheKey::projects("bob"));
        assert_ne!(
            CacheKey::projects("alice"),
            CacheKey::hero_sections("alice")
        );
    }

    #[test]
    fn test_accessors() {
        let key = CacheKey::users("u-42");
        assert_eq!(key.entity(), "users");
        assert_eq!(key.discriminator(), "u-42");
        let s: String = key.into();
        assert_eq!(s, "users:u-42");
    }
}
