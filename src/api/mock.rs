//! In-memory backend for local development and tests.
//!
//! Serves the same routes and wire shapes as the real admin API from seeded
//! data behind the [`Transport`] trait, so the rest of the data layer cannot
//! tell the difference. Owned and injected explicitly; there is no ambient
//! singleton. Tests additionally get a request counter and one-shot failure
//! injection.

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};

use super::api_types::{
  ApiCategory, ApiOrder, ApiOrderItem, ApiPartyRef, ApiPreferences, ApiProfile, ApiSupplier,
  ApiUser, ApiVerification,
};
use super::transport::Transport;
use super::types::{OrderStatus, Role, SupplierStatus, UserStatus, VerificationStatus};

const DEFAULT_PER_PAGE: u32 = 20;

/// Transport serving seeded data from memory.
pub struct MemoryTransport {
  state: Mutex<MockDb>,
  requests: AtomicU32,
  fail_next: Mutex<Option<Error>>,
}

struct MockDb {
  profile: ApiProfile,
  users: Vec<ApiUser>,
  suppliers: Vec<ApiSupplier>,
  categories: Vec<ApiCategory>,
  orders: Vec<ApiOrder>,
  verifications: Vec<ApiVerification>,
  next_category_id: u32,
}

impl MemoryTransport {
  /// A backend populated with a small, plausible marketplace.
  pub fn seeded() -> Self {
    Self {
      state: Mutex::new(MockDb::seeded()),
      requests: AtomicU32::new(0),
      fail_next: Mutex::new(None),
    }
  }

  /// Number of requests handled so far, including injected failures.
  pub fn request_count(&self) -> u32 {
    self.requests.load(Ordering::SeqCst)
  }

  /// Make the next request fail with the given error.
  pub fn fail_next(&self, error: Error) {
    *self
      .fail_next
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(error);
  }

  fn handle(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
    self.requests.fetch_add(1, Ordering::SeqCst);

    let injected = self
      .fail_next
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner)
      .take();
    if let Some(err) = injected {
      return Err(err);
    }

    let (route, query) = match path.split_once('?') {
      Some((r, q)) => (r, Some(q)),
      None => (path, None),
    };
    let segments: Vec<&str> = route
      .trim_matches('/')
      .split('/')
      .filter(|s| !s.is_empty())
      .collect();

    let mut db = self
      .state
      .lock()
      .map_err(|e| Error::Unknown(format!("mock state lock poisoned: {}", e)))?;

    match (method, segments.as_slice()) {
      ("GET", ["profile"]) => to_value(&db.profile),
      ("PUT", ["profile"]) => db.update_profile(&body),
      ("PUT", ["profile", "preferences"]) => db.update_preference(&body),

      ("GET", ["users"]) => db.list_users(query),
      ("GET", ["users", id]) => to_value(db.user(id)?),
      ("PUT", ["users", id, "status"]) => db.set_user_status(id, &body),

      ("GET", ["suppliers"]) => db.list_suppliers(query),
      ("GET", ["suppliers", id]) => to_value(db.supplier(id)?),
      ("PUT", ["suppliers", id, "status"]) => db.set_supplier_status(id, &body),

      ("GET", ["categories"]) => to_value(&db.categories),
      ("POST", ["categories"]) => db.create_category(&body),
      ("DELETE", ["categories", id]) => db.delete_category(id),

      ("GET", ["orders"]) => db.list_orders(query),
      ("GET", ["orders", id]) => to_value(db.order(id)?),
      ("PUT", ["orders", id, "status"]) => db.set_order_status(id, &body),

      ("GET", ["verifications"]) => db.list_verifications(query),
      ("PUT", ["verifications", id, "review"]) => db.review_verification(id, &body),

      _ => Err(Error::NotFound {
        resource: format!("{} /{}", method, route.trim_matches('/')),
      }),
    }
  }
}

impl Transport for MemoryTransport {
  fn get(&self, path: &str) -> BoxFuture<'_, Result<Value>> {
    let result = self.handle("GET", path, None);
    Box::pin(async move { result })
  }

  fn post(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>> {
    let result = self.handle("POST", path, Some(body));
    Box::pin(async move { result })
  }

  fn put(&self, path: &str, body: Value) -> BoxFuture<'_, Result<Value>> {
    let result = self.handle("PUT", path, Some(body));
    Box::pin(async move { result })
  }

  fn delete(&self, path: &str) -> BoxFuture<'_, Result<Value>> {
    let result = self.handle("DELETE", path, None);
    Box::pin(async move { result })
  }
}

// ============================================================================
// Route handlers
// ============================================================================

impl MockDb {
  fn update_profile(&mut self, body: &Option<Value>) -> Result<Value> {
    if let Some(name) = body_str(body, "name") {
      if name.trim().is_empty() {
        return Err(validation("name", "must not be empty"));
      }
      self.profile.name = name;
    }
    if let Some(phone) = body_str(body, "phone") {
      self.profile.phone = Some(phone);
    }
    if let Some(avatar_url) = body_str(body, "avatarUrl") {
      self.profile.avatar_url = Some(avatar_url);
    }
    self.profile.updated_at = now();
    // The full object is authoritative, including fields the caller omitted
    to_value(&self.profile)
  }

  fn update_preference(&mut self, body: &Option<Value>) -> Result<Value> {
    let key = body_str(body, "key").ok_or_else(|| validation("key", "is required"))?;
    let enabled = body
      .as_ref()
      .and_then(|b| b.get("enabled"))
      .and_then(Value::as_bool)
      .ok_or_else(|| validation("enabled", "must be a boolean"))?;

    match key.as_str() {
      "emailAlerts" => self.profile.preferences.email_alerts = enabled,
      "orderUpdates" => self.profile.preferences.order_updates = enabled,
      "weeklyDigest" => self.profile.preferences.weekly_digest = enabled,
      other => return Err(validation("key", &format!("unknown preference '{}'", other))),
    }
    self.profile.updated_at = now();
    to_value(&self.profile.preferences)
  }

  fn user(&self, id: &str) -> Result<&ApiUser> {
    self
      .users
      .iter()
      .find(|u| u.id == id)
      .ok_or_else(|| not_found("user", id))
  }

  fn list_users(&self, query: Option<&str>) -> Result<Value> {
    let search = query_param(query, "search").map(|s| s.to_lowercase());
    let matches: Vec<&ApiUser> = self
      .users
      .iter()
      .filter(|u| match &search {
        Some(term) => {
          u.name.to_lowercase().contains(term) || u.email.to_lowercase().contains(term)
        }
        None => true,
      })
      .collect();
    paged(&matches, query)
  }

  fn set_user_status(&mut self, id: &str, body: &Option<Value>) -> Result<Value> {
    let status: UserStatus = body_status(body)?;
    let user = self
      .users
      .iter_mut()
      .find(|u| u.id == id)
      .ok_or_else(|| not_found("user", id))?;
    user.status = status;
    user.updated_at = now();
    to_value(user)
  }

  fn supplier(&self, id: &str) -> Result<&ApiSupplier> {
    self
      .suppliers
      .iter()
      .find(|s| s.id == id)
      .ok_or_else(|| not_found("supplier", id))
  }

  fn list_suppliers(&self, query: Option<&str>) -> Result<Value> {
    let status = query_status::<SupplierStatus>(query)?;
    let matches: Vec<&ApiSupplier> = self
      .suppliers
      .iter()
      .filter(|s| status.map(|wanted| s.status == wanted).unwrap_or(true))
      .collect();
    to_value(&matches)
  }

  fn set_supplier_status(&mut self, id: &str, body: &Option<Value>) -> Result<Value> {
    let status: SupplierStatus = body_status(body)?;
    let supplier = self
      .suppliers
      .iter_mut()
      .find(|s| s.id == id)
      .ok_or_else(|| not_found("supplier", id))?;
    supplier.status = status;
    supplier.updated_at = now();
    to_value(supplier)
  }

  fn create_category(&mut self, body: &Option<Value>) -> Result<Value> {
    let name = body_str(body, "name")
      .filter(|n| !n.trim().is_empty())
      .ok_or_else(|| validation("name", "must not be empty"))?;
    let slug = body_str(body, "slug").unwrap_or_else(|| slugify(&name));
    let parent_id = body_str(body, "parentId");

    if let Some(parent) = &parent_id {
      if !self.categories.iter().any(|c| &c.id == parent) {
        return Err(validation("parentId", "parent category does not exist"));
      }
    }

    let category = ApiCategory {
      id: format!("c{}", self.next_category_id),
      name,
      slug,
      parent_id,
      products_count: 0,
      updated_at: now(),
    };
    self.next_category_id += 1;
    self.categories.push(category.clone());
    to_value(&category)
  }

  fn delete_category(&mut self, id: &str) -> Result<Value> {
    if !self.categories.iter().any(|c| c.id == id) {
      return Err(not_found("category", id));
    }
    if self
      .categories
      .iter()
      .any(|c| c.parent_id.as_deref() == Some(id))
    {
      return Err(validation("id", "category still has subcategories"));
    }
    self.categories.retain(|c| c.id != id);
    Ok(Value::Null)
  }

  fn order(&self, id: &str) -> Result<&ApiOrder> {
    self
      .orders
      .iter()
      .find(|o| o.id == id)
      .ok_or_else(|| not_found("order", id))
  }

  fn list_orders(&self, query: Option<&str>) -> Result<Value> {
    let status = query_status::<OrderStatus>(query)?;
    let matches: Vec<&ApiOrder> = self
      .orders
      .iter()
      .filter(|o| status.map(|wanted| o.status == wanted).unwrap_or(true))
      .collect();
    paged(&matches, query)
  }

  fn set_order_status(&mut self, id: &str, body: &Option<Value>) -> Result<Value> {
    let status: OrderStatus = body_status(body)?;
    let order = self
      .orders
      .iter_mut()
      .find(|o| o.id == id)
      .ok_or_else(|| not_found("order", id))?;

    if order.status.is_terminal() {
      return Err(validation(
        "status",
        &format!("no transitions from {}", order.status.label()),
      ));
    }

    order.status = status;
    order.updated_at = now();
    to_value(order)
  }

  fn list_verifications(&self, query: Option<&str>) -> Result<Value> {
    let status = query_status::<VerificationStatus>(query)?;
    let matches: Vec<&ApiVerification> = self
      .verifications
      .iter()
      .filter(|v| status.map(|wanted| v.status == wanted).unwrap_or(true))
      .collect();
    to_value(&matches)
  }

  fn review_verification(&mut self, id: &str, body: &Option<Value>) -> Result<Value> {
    let decision = body_str(body, "decision").ok_or_else(|| validation("decision", "is required"))?;
    let status = match decision.as_str() {
      "approve" => VerificationStatus::Approved,
      "reject" => VerificationStatus::Rejected,
      other => return Err(validation("decision", &format!("unknown decision '{}'", other))),
    };

    let verification = self
      .verifications
      .iter_mut()
      .find(|v| v.id == id)
      .ok_or_else(|| not_found("verification", id))?;

    if verification.status != VerificationStatus::Pending {
      return Err(validation("id", "verification was already reviewed"));
    }

    verification.status = status;
    verification.reviewer_note = body_str(body, "note");
    verification.reviewed_at = Some(now());
    to_value(verification)
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
  Ok(serde_json::to_value(value)?)
}

fn now() -> String {
  Utc::now().to_rfc3339()
}

fn not_found(kind: &str, id: &str) -> Error {
  Error::NotFound {
    resource: format!("{} {}", kind, id),
  }
}

fn validation(field: &str, reason: &str) -> Error {
  let mut fields = HashMap::new();
  fields.insert(field.to_string(), vec![reason.to_string()]);
  Error::Validation {
    message: format!("{} {}", field, reason),
    fields,
  }
}

fn body_str(body: &Option<Value>, field: &str) -> Option<String> {
  body
    .as_ref()
    .and_then(|b| b.get(field))
    .and_then(Value::as_str)
    .map(String::from)
}

fn body_status<T: serde::de::DeserializeOwned>(body: &Option<Value>) -> Result<T> {
  let raw = body
    .as_ref()
    .and_then(|b| b.get("status"))
    .cloned()
    .ok_or_else(|| validation("status", "is required"))?;
  serde_json::from_value(raw).map_err(|_| validation("status", "is not a known status"))
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
  let query = query?;
  url::form_urlencoded::parse(query.as_bytes())
    .find(|(key, _)| key == name)
    .map(|(_, value)| value.into_owned())
}

fn query_status<T: serde::de::DeserializeOwned>(query: Option<&str>) -> Result<Option<T>> {
  match query_param(query, "status") {
    Some(raw) => serde_json::from_value(Value::String(raw))
      .map(Some)
      .map_err(|_| validation("status", "is not a known status")),
    None => Ok(None),
  }
}

fn paged<T: serde::Serialize>(matches: &[T], query: Option<&str>) -> Result<Value> {
  let page: u32 = query_param(query, "page")
    .and_then(|p| p.parse().ok())
    .filter(|p| *p >= 1)
    .unwrap_or(1);
  let per_page: u32 = query_param(query, "perPage")
    .and_then(|p| p.parse().ok())
    .filter(|p| *p >= 1)
    .unwrap_or(DEFAULT_PER_PAGE);

  let start = ((page - 1) * per_page) as usize;
  let items: Vec<&T> = matches.iter().skip(start).take(per_page as usize).collect();

  Ok(json!({
    "items": serde_json::to_value(items)?,
    "page": page,
    "perPage": per_page,
    "total": matches.len() as u64,
  }))
}

fn slugify(name: &str) -> String {
  name
    .to_lowercase()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
    .collect::<String>()
    .split('-')
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

// ============================================================================
// Seed data
// ============================================================================

impl MockDb {
  fn seeded() -> Self {
    let party = |id: &str, name: &str| ApiPartyRef {
      id: id.to_string(),
      name: name.to_string(),
    };

    Self {
      profile: ApiProfile {
        id: "adm-1".to_string(),
        name: "Amira Haddad".to_string(),
        email: "amira@souk.test".to_string(),
        role: Role::Admin,
        phone: None,
        avatar_url: None,
        preferences: ApiPreferences {
          email_alerts: true,
          order_updates: true,
          weekly_digest: false,
        },
        updated_at: "2026-07-01T09:30:00Z".to_string(),
      },
      users: vec![
        ApiUser {
          id: "u1".to_string(),
          name: "Selin Aydin".to_string(),
          email: "selin@example.test".to_string(),
          status: UserStatus::Active,
          orders_count: 4,
          total_spent_cents: 48_200,
          created_at: "2025-11-03T12:00:00Z".to_string(),
          updated_at: "2026-06-21T08:15:00Z".to_string(),
        },
        ApiUser {
          id: "u2".to_string(),
          name: "Karim Mansour".to_string(),
          email: "karim@example.test".to_string(),
          status: UserStatus::Active,
          orders_count: 1,
          total_spent_cents: 5_900,
          created_at: "2026-02-14T16:40:00Z".to_string(),
          updated_at: "2026-05-02T11:00:00Z".to_string(),
        },
        ApiUser {
          id: "u3".to_string(),
          name: "Dana Haddad".to_string(),
          email: "dana@example.test".to_string(),
          status: UserStatus::Suspended,
          orders_count: 0,
          total_spent_cents: 0,
          created_at: "2026-04-30T09:00:00Z".to_string(),
          updated_at: "2026-05-10T14:20:00Z".to_string(),
        },
      ],
      suppliers: vec![
        ApiSupplier {
          id: "s1".to_string(),
          company_name: "Atlas Trading".to_string(),
          contact_email: "hello@atlastrading.test".to_string(),
          status: SupplierStatus::Approved,
          rating: 4.6,
          products_count: 128,
          updated_at: "2026-06-01T10:00:00Z".to_string(),
        },
        ApiSupplier {
          id: "s2".to_string(),
          company_name: "Cedar Goods".to_string(),
          contact_email: "contact@cedargoods.test".to_string(),
          status: SupplierStatus::Pending,
          rating: 0.0,
          products_count: 0,
          updated_at: "2026-07-12T13:30:00Z".to_string(),
        },
        ApiSupplier {
          id: "s3".to_string(),
          company_name: "Dune Outfitters".to_string(),
          contact_email: "team@duneoutfitters.test".to_string(),
          status: SupplierStatus::Suspended,
          rating: 3.1,
          products_count: 42,
          updated_at: "2026-03-28T09:45:00Z".to_string(),
        },
      ],
      categories: vec![
        ApiCategory {
          id: "c1".to_string(),
          name: "Home & Kitchen".to_string(),
          slug: "home-kitchen".to_string(),
          parent_id: None,
          products_count: 310,
          updated_at: "2026-01-10T08:00:00Z".to_string(),
        },
        ApiCategory {
          id: "c2".to_string(),
          name: "Cookware".to_string(),
          slug: "cookware".to_string(),
          parent_id: Some("c1".to_string()),
          products_count: 85,
          updated_at: "2026-01-10T08:00:00Z".to_string(),
        },
        ApiCategory {
          id: "c3".to_string(),
          name: "Electronics".to_string(),
          slug: "electronics".to_string(),
          parent_id: None,
          products_count: 204,
          updated_at: "2026-02-02T12:00:00Z".to_string(),
        },
      ],
      orders: vec![
        ApiOrder {
          id: "o-1001".to_string(),
          customer: party("u1", "Selin Aydin"),
          supplier: party("s1", "Atlas Trading"),
          items: vec![
            ApiOrderItem {
              product_id: "p-11".to_string(),
              product_name: "Cast Iron Skillet".to_string(),
              quantity: 1,
              unit_price_cents: 8_900,
            },
            ApiOrderItem {
              product_id: "p-23".to_string(),
              product_name: "Olive Wood Spatula".to_string(),
              quantity: 2,
              unit_price_cents: 2_000,
            },
          ],
          total_cents: 12_900,
          status: OrderStatus::Paid,
          created_at: "2026-07-02T09:10:00Z".to_string(),
          updated_at: "2026-07-02T10:00:00Z".to_string(),
        },
        ApiOrder {
          id: "o-1002".to_string(),
          customer: party("u2", "Karim Mansour"),
          supplier: party("s1", "Atlas Trading"),
          items: vec![ApiOrderItem {
            product_id: "p-07".to_string(),
            product_name: "Ceramic Tagine".to_string(),
            quantity: 1,
            unit_price_cents: 5_900,
          }],
          total_cents: 5_900,
          status: OrderStatus::Pending,
          created_at: "2026-07-20T15:00:00Z".to_string(),
          updated_at: "2026-07-20T15:00:00Z".to_string(),
        },
        ApiOrder {
          id: "o-1003".to_string(),
          customer: party("u1", "Selin Aydin"),
          supplier: party("s3", "Dune Outfitters"),
          items: vec![ApiOrderItem {
            product_id: "p-88".to_string(),
            product_name: "Canvas Duffel".to_string(),
            quantity: 1,
            unit_price_cents: 14_500,
          }],
          total_cents: 14_500,
          status: OrderStatus::Delivered,
          created_at: "2026-05-11T10:30:00Z".to_string(),
          updated_at: "2026-05-18T17:05:00Z".to_string(),
        },
      ],
      verifications: vec![
        ApiVerification {
          id: "v1".to_string(),
          supplier: party("s2", "Cedar Goods"),
          documents: vec!["trade-license.pdf".to_string(), "owner-id.png".to_string()],
          status: VerificationStatus::Pending,
          reviewer_note: None,
          submitted_at: "2026-07-12T13:30:00Z".to_string(),
          reviewed_at: None,
        },
        ApiVerification {
          id: "v2".to_string(),
          supplier: party("s3", "Dune Outfitters"),
          documents: vec!["trade-license.pdf".to_string()],
          status: VerificationStatus::Rejected,
          reviewer_note: Some("License expired in 2025.".to_string()),
          submitted_at: "2026-03-20T09:00:00Z".to_string(),
          reviewed_at: Some("2026-03-22T11:10:00Z".to_string()),
        },
      ],
      next_category_id: 4,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ErrorKind;

  #[tokio::test]
  async fn test_profile_roundtrip() {
    let backend = MemoryTransport::seeded();

    let profile = backend.get("profile").await.unwrap();
    assert_eq!(profile["name"], "Amira Haddad");

    let updated = backend
      .put("profile", json!({ "name": "Amira H." }))
      .await
      .unwrap();
    // Full object comes back, untouched fields included
    assert_eq!(updated["name"], "Amira H.");
    assert_eq!(updated["email"], "amira@souk.test");
  }

  #[tokio::test]
  async fn test_users_search_and_paging() {
    let backend = MemoryTransport::seeded();

    let page = backend.get("users?search=haddad").await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], "u3");

    let page = backend.get("users?page=2&perPage=2").await.unwrap();
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["total"], 3);
  }

  #[tokio::test]
  async fn test_order_transition_and_terminal_rejection() {
    let backend = MemoryTransport::seeded();

    let order = backend
      .put("orders/o-1002/status", json!({ "status": "paid" }))
      .await
      .unwrap();
    assert_eq!(order["status"], "paid");

    let err = backend
      .put("orders/o-1003/status", json!({ "status": "refunded" }))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
  }

  #[tokio::test]
  async fn test_category_with_children_cannot_be_deleted() {
    let backend = MemoryTransport::seeded();

    let err = backend.delete("categories/c1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    backend.delete("categories/c2").await.unwrap();
    backend.delete("categories/c1").await.unwrap();
  }

  #[tokio::test]
  async fn test_unknown_route_is_not_found() {
    let backend = MemoryTransport::seeded();
    let err = backend.get("reports/weekly").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn test_fail_next_is_consumed_once() {
    let backend = MemoryTransport::seeded();
    backend.fail_next(Error::Server {
      status: 500,
      message: "boom".to_string(),
    });

    assert!(backend.get("profile").await.is_err());
    assert!(backend.get("profile").await.is_ok());
    assert_eq!(backend.request_count(), 2);
  }

  #[tokio::test]
  async fn test_verification_review_is_single_shot() {
    let backend = MemoryTransport::seeded();

    let reviewed = backend
      .put(
        "verifications/v1/review",
        json!({ "decision": "approve", "note": "Documents check out." }),
      )
      .await
      .unwrap();
    assert_eq!(reviewed["status"], "approved");
    assert!(reviewed["reviewedAt"].is_string());

    let err = backend
      .put("verifications/v1/review", json!({ "decision": "reject" }))
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
  }
}
