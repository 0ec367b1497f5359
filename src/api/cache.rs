//! Caching implementations for admin API types.

use sha2::{Digest, Sha256};

use crate::cache::{Cacheable, QueryKey};

use super::types::{
  Category, Order, OrderStatus, OrderSummary, Profile, Supplier, SupplierStatus, User, UserSummary,
  VerificationRequest, VerificationStatus,
};

/// Cache key of the singleton profile entity.
pub const PROFILE_CACHE_KEY: &str = "self";

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Profile {
  fn cache_key(&self) -> String {
    // One profile per session
    PROFILE_CACHE_KEY.to_string()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "profile"
  }
}

impl Cacheable for UserSummary {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "user_summary"
  }
}

impl Cacheable for User {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "user"
  }
}

impl Cacheable for Supplier {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "supplier"
  }
}

impl Cacheable for Category {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "category"
  }
}

impl Cacheable for OrderSummary {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "order_summary"
  }
}

impl Cacheable for Order {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    Some(&self.updated_at)
  }

  fn entity_type() -> &'static str {
    "order"
  }
}

impl Cacheable for VerificationRequest {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn updated_at(&self) -> Option<&str> {
    self.reviewed_at.as_deref()
  }

  fn entity_type() -> &'static str {
    "verification"
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for admin API list calls.
#[derive(Clone, Debug)]
pub enum AdminQueryKey {
  /// Customer list, paginated, optionally filtered by a search term
  Users { page: u32, search: Option<String> },
  /// Supplier list, optionally filtered by status
  Suppliers { status: Option<SupplierStatus> },
  /// Full category tree
  Categories,
  /// Order list, paginated, optionally filtered by status
  Orders {
    status: Option<OrderStatus>,
    page: u32,
  },
  /// Verification request list, optionally filtered by status
  Verifications {
    status: Option<VerificationStatus>,
  },
}

impl QueryKey for AdminQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Users { page, search } => {
        format!(
          "users:{}:{}",
          page,
          search.as_deref().map(normalize_search).unwrap_or_default()
        )
      }
      Self::Suppliers { status } => {
        format!("suppliers:{}", status.map(|s| s.as_str()).unwrap_or(""))
      }
      Self::Categories => "categories".to_string(),
      Self::Orders { status, page } => {
        format!(
          "orders:{}:{}",
          status.map(|s| s.as_str()).unwrap_or(""),
          page
        )
      }
      Self::Verifications { status } => {
        format!("verifications:{}", status.map(|s| s.as_str()).unwrap_or(""))
      }
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::Users { page, search } => match search {
        Some(term) => format!("users page {} matching '{}'", page, term),
        None => format!("users page {}", page),
      },
      Self::Suppliers { status } => match status {
        Some(s) => format!("{} suppliers", s.as_str()),
        None => "all suppliers".to_string(),
      },
      Self::Categories => "categories".to_string(),
      Self::Orders { status, page } => match status {
        Some(s) => format!("{} orders page {}", s.as_str(), page),
        None => format!("orders page {}", page),
      },
      Self::Verifications { status } => match status {
        Some(s) => format!("{} verifications", s.as_str()),
        None => "all verifications".to_string(),
      },
    }
  }
}

/// Normalize a search term for consistent hashing.
/// Trims whitespace and lowercases for case-insensitive matching.
fn normalize_search(term: &str) -> String {
  term.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_search_normalization_collapses_case_and_whitespace() {
    let a = AdminQueryKey::Users {
      page: 1,
      search: Some("  Selin ".to_string()),
    };
    let b = AdminQueryKey::Users {
      page: 1,
      search: Some("selin".to_string()),
    };
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_distinct_queries_hash_apart() {
    let page1 = AdminQueryKey::Orders {
      status: Some(OrderStatus::Pending),
      page: 1,
    };
    let page2 = AdminQueryKey::Orders {
      status: Some(OrderStatus::Pending),
      page: 2,
    };
    let unfiltered = AdminQueryKey::Orders {
      status: None,
      page: 1,
    };

    assert_ne!(page1.cache_hash(), page2.cache_hash());
    assert_ne!(page1.cache_hash(), unfiltered.cache_hash());
  }

  #[test]
  fn test_hash_is_stable_hex() {
    let key = AdminQueryKey::Categories;
    let hash = key.cache_hash();
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, key.cache_hash());
  }
}
