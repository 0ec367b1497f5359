//! Typed admin API client.
//!
//! Thin wrapper over a [`Transport`]: builds paths, sends wire DTOs, decodes
//! responses into domain types. No caching and no notifications; see
//! [`super::cached_client::CachedClient`] for the layer page components use.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

use super::api_types::{
  ApiCategory, ApiCategoryDraft, ApiOrder, ApiPaged, ApiPreferences, ApiProfile, ApiProfileUpdate,
  ApiSupplier, ApiUser, ApiVerification,
};
use super::transport::{HttpTransport, Transport};
use super::types::{
  Category, CategoryDraft, NotificationPreferences, Order, OrderStatus, OrderSummary, Paged,
  Preference, Profile, ProfileUpdate, Supplier, SupplierStatus, User, UserStatus, UserSummary,
  VerificationDecision, VerificationRequest, VerificationStatus,
};

/// Admin API client over an injectable transport.
#[derive(Clone)]
pub struct ApiClient {
  transport: Arc<dyn Transport>,
}

impl ApiClient {
  /// Create a client over HTTP, taking the token from the environment.
  pub fn new(config: &Config) -> Result<Self> {
    let transport = HttpTransport::new(&config.api, Config::api_token())?;
    Ok(Self::with_transport(Arc::new(transport)))
  }

  /// Create a client over any transport (e.g. the in-memory backend).
  pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let value = self.transport.get(path).await?;
    Ok(serde_json::from_value(value)?)
  }

  async fn put<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
    let value = self.transport.put(path, body).await?;
    Ok(serde_json::from_value(value)?)
  }

  async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
    let value = self.transport.post(path, body).await?;
    Ok(serde_json::from_value(value)?)
  }

  // ==========================================================================
  // Profile
  // ==========================================================================

  pub async fn profile(&self) -> Result<Profile> {
    Ok(self.get::<ApiProfile>("profile").await?.into())
  }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
    let body = serde_json::to_value(ApiProfileUpdate {
      name: update.name.clone(),
      phone: update.phone.clone(),
      avatar_url: update.avatar_url.clone(),
    })?;
    Ok(self.put::<ApiProfile>("profile", body).await?.into())
  }

  pub async fn set_notification_preference(
    &self,
    preference: Preference,
    enabled: bool,
  ) -> Result<NotificationPreferences> {
    let body = json!({ "key": preference.as_str(), "enabled": enabled });
    Ok(
      self
        .put::<ApiPreferences>("profile/preferences", body)
        .await?
        .into(),
    )
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  pub async fn list_users(&self, page: u32, search: Option<&str>) -> Result<Paged<UserSummary>> {
    let mut path = format!("users?page={}", page);
    if let Some(term) = search {
      path.push_str("&search=");
      path.extend(url::form_urlencoded::byte_serialize(term.as_bytes()));
    }
    Ok(self.get::<ApiPaged<ApiUser>>(&path).await?.into_paged())
  }

  pub async fn get_user(&self, id: &str) -> Result<User> {
    Ok(
      self
        .get::<ApiUser>(&format!("users/{}", id))
        .await?
        .into_full(),
    )
  }

  pub async fn set_user_status(&self, id: &str, status: UserStatus) -> Result<User> {
    let body = json!({ "status": status.as_str() });
    Ok(
      self
        .put::<ApiUser>(&format!("users/{}/status", id), body)
        .await?
        .into_full(),
    )
  }

  // ==========================================================================
  // Suppliers
  // ==========================================================================

  pub async fn list_suppliers(&self, status: Option<SupplierStatus>) -> Result<Vec<Supplier>> {
    let path = match status {
      Some(s) => format!("suppliers?status={}", s.as_str()),
      None => "suppliers".to_string(),
    };
    let suppliers: Vec<ApiSupplier> = self.get(&path).await?;
    Ok(suppliers.into_iter().map(Into::into).collect())
  }

  pub async fn get_supplier(&self, id: &str) -> Result<Supplier> {
    Ok(
      self
        .get::<ApiSupplier>(&format!("suppliers/{}", id))
        .await?
        .into(),
    )
  }

  pub async fn set_supplier_status(&self, id: &str, status: SupplierStatus) -> Result<Supplier> {
    let body = json!({ "status": status.as_str() });
    Ok(
      self
        .put::<ApiSupplier>(&format!("suppliers/{}/status", id), body)
        .await?
        .into(),
    )
  }

  // ==========================================================================
  // Categories
  // ==========================================================================

  pub async fn list_categories(&self) -> Result<Vec<Category>> {
    let categories: Vec<ApiCategory> = self.get("categories").await?;
    Ok(categories.into_iter().map(Into::into).collect())
  }

  pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
    let body = serde_json::to_value(ApiCategoryDraft {
      name: draft.name.clone(),
      slug: draft.slug.clone(),
      parent_id: draft.parent_id.clone(),
    })?;
    Ok(self.post::<ApiCategory>("categories", body).await?.into())
  }

  pub async fn delete_category(&self, id: &str) -> Result<()> {
    self
      .transport
      .delete(&format!("categories/{}", id))
      .await?;
    Ok(())
  }

  // ==========================================================================
  // Orders
  // ==========================================================================

  pub async fn list_orders(
    &self,
    status: Option<OrderStatus>,
    page: u32,
  ) -> Result<Paged<OrderSummary>> {
    let path = match status {
      Some(s) => format!("orders?status={}&page={}", s.as_str(), page),
      None => format!("orders?page={}", page),
    };
    Ok(self.get::<ApiPaged<ApiOrder>>(&path).await?.into_paged())
  }

  pub async fn get_order(&self, id: &str) -> Result<Order> {
    Ok(
      self
        .get::<ApiOrder>(&format!("orders/{}", id))
        .await?
        .into_full(),
    )
  }

  pub async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
    let body = json!({ "status": status.as_str() });
    Ok(
      self
        .put::<ApiOrder>(&format!("orders/{}/status", id), body)
        .await?
        .into_full(),
    )
  }

  // ==========================================================================
  // Verifications
  // ==========================================================================

  pub async fn list_verifications(
    &self,
    status: Option<VerificationStatus>,
  ) -> Result<Vec<VerificationRequest>> {
    let path = match status {
      Some(s) => format!("verifications?status={}", s.as_str()),
      None => "verifications".to_string(),
    };
    let verifications: Vec<ApiVerification> = self.get(&path).await?;
    Ok(verifications.into_iter().map(Into::into).collect())
  }

  pub async fn review_verification(
    &self,
    id: &str,
    decision: VerificationDecision,
    note: Option<&str>,
  ) -> Result<VerificationRequest> {
    let mut body = json!({
      "decision": match decision {
        VerificationDecision::Approve => "approve",
        VerificationDecision::Reject => "reject",
      }
    });
    if let Some(note) = note {
      body["note"] = json!(note);
    }
    Ok(
      self
        .put::<ApiVerification>(&format!("verifications/{}/review", id), body)
        .await?
        .into(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MemoryTransport;
  use crate::error::ErrorKind;
  use pretty_assertions::assert_eq;

  fn client() -> ApiClient {
    ApiClient::with_transport(Arc::new(MemoryTransport::seeded()))
  }

  #[tokio::test]
  async fn test_profile_decodes_to_domain() {
    let profile = client().profile().await.unwrap();
    assert_eq!(profile.id, "adm-1");
    assert_eq!(profile.name, "Amira Haddad");
    assert!(profile.preferences.email_alerts);
  }

  #[tokio::test]
  async fn test_list_users_with_search() {
    let page = client().list_users(1, Some("haddad")).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Dana Haddad");
    assert_eq!(page.items[0].status, UserStatus::Suspended);
  }

  #[tokio::test]
  async fn test_search_terms_with_spaces_survive_encoding() {
    let page = client().list_users(1, Some("dana haddad")).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, "u3");
  }

  #[tokio::test]
  async fn test_update_profile_returns_authoritative_object() {
    let api = client();
    let updated = api
      .update_profile(&ProfileUpdate {
        name: Some("Amira H.".to_string()),
        ..Default::default()
      })
      .await
      .unwrap();

    // Fields the caller never sent come back from the server
    assert_eq!(updated.name, "Amira H.");
    assert_eq!(updated.email, "amira@souk.test");
  }

  #[tokio::test]
  async fn test_validation_error_surfaces_field_map() {
    let err = client()
      .update_profile(&ProfileUpdate {
        name: Some("   ".to_string()),
        ..Default::default()
      })
      .await
      .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.validation_fields().unwrap().contains_key("name"));
  }

  #[tokio::test]
  async fn test_order_status_mutation() {
    let api = client();
    let order = api
      .set_order_status("o-1002", OrderStatus::Paid)
      .await
      .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.customer.name, "Karim Mansour");
  }

  #[tokio::test]
  async fn test_verification_review_with_note() {
    let api = client();
    let reviewed = api
      .review_verification("v1", VerificationDecision::Reject, Some("Blurry scan."))
      .await
      .unwrap();
    assert_eq!(reviewed.status, VerificationStatus::Rejected);
    assert_eq!(reviewed.reviewer_note.as_deref(), Some("Blurry scan."));
  }

  #[tokio::test]
  async fn test_category_create_derives_slug() {
    let api = client();
    let category = api
      .create_category(&CategoryDraft {
        name: "Outdoor & Garden".to_string(),
        ..Default::default()
      })
      .await
      .unwrap();
    assert_eq!(category.slug, "outdoor-garden");
    assert_eq!(category.parent_id, None);
  }
}
