//! Domain types for the marketplace admin console.
//!
//! Status-like fields are closed enums rather than strings, each dispatched
//! through a single exhaustive table (`label`, `tone`), so a new variant
//! fails to compile until every consumer handles it.

use serde::{Deserialize, Serialize};

/// Visual tone a status maps to. The display surface decides colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Neutral,
  Positive,
  Caution,
  Negative,
}

// ============================================================================
// Status enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
  Active,
  Suspended,
}

impl UserStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      UserStatus::Active => "active",
      UserStatus::Suspended => "suspended",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      UserStatus::Active => "Active",
      UserStatus::Suspended => "Suspended",
    }
  }

  pub fn tone(self) -> Tone {
    match self {
      UserStatus::Active => Tone::Positive,
      UserStatus::Suspended => Tone::Negative,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierStatus {
  Pending,
  Approved,
  Suspended,
}

impl SupplierStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      SupplierStatus::Pending => "pending",
      SupplierStatus::Approved => "approved",
      SupplierStatus::Suspended => "suspended",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SupplierStatus::Pending => "Pending",
      SupplierStatus::Approved => "Approved",
      SupplierStatus::Suspended => "Suspended",
    }
  }

  pub fn tone(self) -> Tone {
    match self {
      SupplierStatus::Pending => Tone::Caution,
      SupplierStatus::Approved => Tone::Positive,
      SupplierStatus::Suspended => Tone::Negative,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Paid => "Paid",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
      OrderStatus::Refunded => "Refunded",
    }
  }

  pub fn tone(self) -> Tone {
    match self {
      OrderStatus::Pending => Tone::Caution,
      OrderStatus::Paid | OrderStatus::Shipped => Tone::Neutral,
      OrderStatus::Delivered => Tone::Positive,
      OrderStatus::Cancelled | OrderStatus::Refunded => Tone::Negative,
    }
  }

  /// Terminal orders accept no further status changes.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
  Pending,
  Approved,
  Rejected,
}

impl VerificationStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      VerificationStatus::Pending => "pending",
      VerificationStatus::Approved => "approved",
      VerificationStatus::Rejected => "rejected",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      VerificationStatus::Pending => "Pending",
      VerificationStatus::Approved => "Approved",
      VerificationStatus::Rejected => "Rejected",
    }
  }

  pub fn tone(self) -> Tone {
    match self {
      VerificationStatus::Pending => Tone::Caution,
      VerificationStatus::Approved => Tone::Positive,
      VerificationStatus::Rejected => Tone::Negative,
    }
  }
}

/// Outcome of reviewing a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
  Approve,
  Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Manager,
  Support,
}

impl Role {
  pub fn label(self) -> &'static str {
    match self {
      Role::Admin => "Administrator",
      Role::Manager => "Manager",
      Role::Support => "Support",
    }
  }
}

/// A single notification preference toggle on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
  EmailAlerts,
  OrderUpdates,
  WeeklyDigest,
}

impl Preference {
  /// Wire name of the preference field.
  pub fn as_str(self) -> &'static str {
    match self {
      Preference::EmailAlerts => "emailAlerts",
      Preference::OrderUpdates => "orderUpdates",
      Preference::WeeklyDigest => "weeklyDigest",
    }
  }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
  pub email_alerts: bool,
  pub order_updates: bool,
  pub weekly_digest: bool,
}

/// The signed-in administrator's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Role,
  pub phone: Option<String>,
  pub avatar_url: Option<String>,
  pub preferences: NotificationPreferences,
  pub updated_at: String,
}

/// Partial profile update. Absent fields are left unchanged by the server;
/// the server response is authoritative for the whole object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
  pub name: Option<String>,
  pub phone: Option<String>,
  pub avatar_url: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

/// Summary of a customer for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
  pub id: String,
  pub name: String,
  pub email: String,
  pub status: UserStatus,
  pub orders_count: u32,
  pub updated_at: String,
}

/// Full customer details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
  pub status: UserStatus,
  pub orders_count: u32,
  pub total_spent_cents: i64,
  pub created_at: String,
  pub updated_at: String,
}

// ============================================================================
// Suppliers, categories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
  pub id: String,
  pub company_name: String,
  pub contact_email: String,
  pub status: SupplierStatus,
  pub rating: f32,
  pub products_count: u32,
  pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: String,
  pub name: String,
  pub slug: String,
  pub parent_id: Option<String>,
  pub products_count: u32,
  pub updated_at: String,
}

/// Input for creating a category. The server assigns the id and derives the
/// slug when none is given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
  pub name: String,
  pub slug: Option<String>,
  pub parent_id: Option<String>,
}

// ============================================================================
// Orders
// ============================================================================

/// Reference to a customer or supplier on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyRef {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id: String,
  pub product_name: String,
  pub quantity: u32,
  pub unit_price_cents: i64,
}

/// Summary of an order for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
  pub id: String,
  pub customer_name: String,
  pub supplier_name: String,
  pub total_cents: i64,
  pub status: OrderStatus,
  pub updated_at: String,
}

/// Full order details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: String,
  pub customer: PartyRef,
  pub supplier: PartyRef,
  pub items: Vec<OrderItem>,
  pub total_cents: i64,
  pub status: OrderStatus,
  pub created_at: String,
  pub updated_at: String,
}

// ============================================================================
// Verifications
// ============================================================================

/// Supplier identity verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
  pub id: String,
  pub supplier: PartyRef,
  /// Names of submitted documents; the files themselves stay server-side
  pub documents: Vec<String>,
  pub status: VerificationStatus,
  pub reviewer_note: Option<String>,
  pub submitted_at: String,
  pub reviewed_at: Option<String>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Page of results with the backend's paging metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub per_page: u32,
  pub total: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_wire_names_match_serde() {
    // as_str is used in cache keys and request bodies; keep it in lockstep
    // with the serde representation.
    for status in [
      OrderStatus::Pending,
      OrderStatus::Paid,
      OrderStatus::Shipped,
      OrderStatus::Delivered,
      OrderStatus::Cancelled,
      OrderStatus::Refunded,
    ] {
      let wire = serde_json::to_value(status).unwrap();
      assert_eq!(wire, serde_json::Value::String(status.as_str().to_string()));
    }
  }

  #[test]
  fn test_terminal_orders() {
    assert!(OrderStatus::Delivered.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());
    assert!(OrderStatus::Refunded.is_terminal());
    assert!(!OrderStatus::Pending.is_terminal());
    assert!(!OrderStatus::Paid.is_terminal());
    assert!(!OrderStatus::Shipped.is_terminal());
  }
}
