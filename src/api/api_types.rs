//! Serde types matching the admin REST API's wire format.
//!
//! These are separate from domain types to allow clean deserialization of
//! the camelCase payloads while keeping domain types focused on application
//! needs. They also serialize, because the in-memory backend answers with
//! the same shapes the real backend produces.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{
  Category, NotificationPreferences, Order, OrderItem, OrderStatus, OrderSummary, Paged, PartyRef,
  Profile, Role, Supplier, SupplierStatus, User, UserStatus, UserSummary, VerificationRequest,
  VerificationStatus,
};

// ============================================================================
// Response envelopes
// ============================================================================

/// Every successful response wraps its payload in a `data` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope {
  pub data: serde_json::Value,
}

/// Error body shape for failed responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: String,
  /// Field name to reasons, present on validation failures
  #[serde(default)]
  pub errors: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiPaged<T> {
  #[serde(default)]
  pub items: Vec<T>,
  #[serde(default)]
  pub page: u32,
  #[serde(default)]
  pub per_page: u32,
  #[serde(default)]
  pub total: u64,
}

impl<T> ApiPaged<T> {
  pub fn into_paged<U>(self) -> Paged<U>
  where
    T: Into<U>,
  {
    Paged {
      items: self.items.into_iter().map(Into::into).collect(),
      page: self.page,
      per_page: self.per_page,
      total: self.total,
    }
  }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPreferences {
  #[serde(default)]
  pub email_alerts: bool,
  #[serde(default)]
  pub order_updates: bool,
  #[serde(default)]
  pub weekly_digest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Role,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
  pub preferences: ApiPreferences,
  #[serde(default)]
  pub updated_at: String,
}

/// Body of a profile update request. Absent fields are not sent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
  pub id: String,
  pub name: String,
  pub email: String,
  pub status: UserStatus,
  #[serde(default)]
  pub orders_count: u32,
  #[serde(default)]
  pub total_spent_cents: i64,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

// ============================================================================
// Suppliers, categories
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSupplier {
  pub id: String,
  pub company_name: String,
  pub contact_email: String,
  pub status: SupplierStatus,
  #[serde(default)]
  pub rating: f32,
  #[serde(default)]
  pub products_count: u32,
  #[serde(default)]
  pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
  pub id: String,
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub parent_id: Option<String>,
  #[serde(default)]
  pub products_count: u32,
  #[serde(default)]
  pub updated_at: String,
}

/// Body of a category creation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategoryDraft {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_id: Option<String>,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPartyRef {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrderItem {
  pub product_id: String,
  pub product_name: String,
  pub quantity: u32,
  pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
  pub id: String,
  pub customer: ApiPartyRef,
  pub supplier: ApiPartyRef,
  #[serde(default)]
  pub items: Vec<ApiOrderItem>,
  #[serde(default)]
  pub total_cents: i64,
  pub status: OrderStatus,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

// ============================================================================
// Verifications
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVerification {
  pub id: String,
  pub supplier: ApiPartyRef,
  #[serde(default)]
  pub documents: Vec<String>,
  pub status: VerificationStatus,
  #[serde(default)]
  pub reviewer_note: Option<String>,
  #[serde(default)]
  pub submitted_at: String,
  #[serde(default)]
  pub reviewed_at: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiPreferences> for NotificationPreferences {
  fn from(p: ApiPreferences) -> Self {
    NotificationPreferences {
      email_alerts: p.email_alerts,
      order_updates: p.order_updates,
      weekly_digest: p.weekly_digest,
    }
  }
}

impl From<ApiProfile> for Profile {
  fn from(p: ApiProfile) -> Self {
    Profile {
      id: p.id,
      name: p.name,
      email: p.email,
      role: p.role,
      phone: p.phone,
      avatar_url: p.avatar_url,
      preferences: p.preferences.into(),
      updated_at: p.updated_at,
    }
  }
}

impl ApiUser {
  pub fn into_summary(self) -> UserSummary {
    UserSummary {
      id: self.id,
      name: self.name,
      email: self.email,
      status: self.status,
      orders_count: self.orders_count,
      updated_at: self.updated_at,
    }
  }

  pub fn into_full(self) -> User {
    User {
      id: self.id,
      name: self.name,
      email: self.email,
      status: self.status,
      orders_count: self.orders_count,
      total_spent_cents: self.total_spent_cents,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

impl From<ApiUser> for UserSummary {
  fn from(u: ApiUser) -> Self {
    u.into_summary()
  }
}

impl From<ApiSupplier> for Supplier {
  fn from(s: ApiSupplier) -> Self {
    Supplier {
      id: s.id,
      company_name: s.company_name,
      contact_email: s.contact_email,
      status: s.status,
      rating: s.rating,
      products_count: s.products_count,
      updated_at: s.updated_at,
    }
  }
}

impl From<ApiCategory> for Category {
  fn from(c: ApiCategory) -> Self {
    Category {
      id: c.id,
      name: c.name,
      slug: c.slug,
      parent_id: c.parent_id,
      products_count: c.products_count,
      updated_at: c.updated_at,
    }
  }
}

impl From<ApiPartyRef> for PartyRef {
  fn from(p: ApiPartyRef) -> Self {
    PartyRef {
      id: p.id,
      name: p.name,
    }
  }
}

impl From<ApiOrderItem> for OrderItem {
  fn from(i: ApiOrderItem) -> Self {
    OrderItem {
      product_id: i.product_id,
      product_name: i.product_name,
      quantity: i.quantity,
      unit_price_cents: i.unit_price_cents,
    }
  }
}

impl ApiOrder {
  pub fn into_summary(self) -> OrderSummary {
    OrderSummary {
      id: self.id,
      customer_name: self.customer.name,
      supplier_name: self.supplier.name,
      total_cents: self.total_cents,
      status: self.status,
      updated_at: self.updated_at,
    }
  }

  pub fn into_full(self) -> Order {
    Order {
      id: self.id,
      customer: self.customer.into(),
      supplier: self.supplier.into(),
      items: self.items.into_iter().map(Into::into).collect(),
      total_cents: self.total_cents,
      status: self.status,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

impl From<ApiOrder> for OrderSummary {
  fn from(o: ApiOrder) -> Self {
    o.into_summary()
  }
}

impl From<ApiVerification> for VerificationRequest {
  fn from(v: ApiVerification) -> Self {
    VerificationRequest {
      id: v.id,
      supplier: v.supplier.into(),
      documents: v.documents,
      status: v.status,
      reviewer_note: v.reviewer_note,
      submitted_at: v.submitted_at,
      reviewed_at: v.reviewed_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_profile_deserializes_camel_case() {
    let profile: ApiProfile = serde_json::from_value(json!({
      "id": "adm-1",
      "name": "Amira Haddad",
      "email": "amira@example.test",
      "role": "admin",
      "avatarUrl": "https://cdn.example.test/amira.png",
      "preferences": {
        "emailAlerts": true,
        "orderUpdates": false,
        "weeklyDigest": true
      },
      "updatedAt": "2026-07-01T09:30:00Z"
    }))
    .expect("deserialize");

    let domain: Profile = profile.into();
    assert_eq!(domain.role, Role::Admin);
    assert_eq!(
      domain.avatar_url.as_deref(),
      Some("https://cdn.example.test/amira.png")
    );
    assert!(domain.preferences.email_alerts);
    assert!(!domain.preferences.order_updates);
  }

  #[test]
  fn test_order_flattens_party_names_for_summaries() {
    let order: ApiOrder = serde_json::from_value(json!({
      "id": "o-1001",
      "customer": { "id": "u1", "name": "Selin Aydin" },
      "supplier": { "id": "s1", "name": "Atlas Trading" },
      "totalCents": 12900,
      "status": "paid",
      "updatedAt": "2026-07-02T10:00:00Z"
    }))
    .expect("deserialize");

    let summary = order.into_summary();
    assert_eq!(summary.customer_name, "Selin Aydin");
    assert_eq!(summary.supplier_name, "Atlas Trading");
    assert_eq!(summary.status, OrderStatus::Paid);
  }

  #[test]
  fn test_profile_update_omits_absent_fields() {
    let body = serde_json::to_value(ApiProfileUpdate {
      name: Some("New Name".to_string()),
      phone: None,
      avatar_url: None,
    })
    .unwrap();

    assert_eq!(body, json!({ "name": "New Name" }));
  }

  #[test]
  fn test_paged_envelope() {
    let page: ApiPaged<ApiUser> = serde_json::from_value(json!({
      "items": [{
        "id": "u1",
        "name": "Selin Aydin",
        "email": "selin@example.test",
        "status": "active",
        "ordersCount": 4
      }],
      "page": 2,
      "perPage": 20,
      "total": 37
    }))
    .expect("deserialize");

    let paged: Paged<UserSummary> = page.into_paged();
    assert_eq!(paged.page, 2);
    assert_eq!(paged.total, 37);
    assert_eq!(paged.items[0].status, UserStatus::Active);
  }
}
