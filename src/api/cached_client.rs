//! Cached admin client that wraps [`ApiClient`] with TTL caching and
//! user-facing notifications.
//!
//! Reads serve fresh cached values without a network call and refetch
//! otherwise. Mutations replace the cached entity with the server's response
//! (the server is authoritative, never a merge of the caller's input),
//! invalidate the affected list queries, and emit a success notification.
//! Every failure emits exactly one error notification and is returned to the
//! caller; nothing is swallowed.

use std::future::Future;

use crate::cache::{CacheLayer, CacheResult, Cacheable, Storage};
use crate::config::Config;
use crate::error::Result;
use crate::notify::Notifier;

use super::cache::{AdminQueryKey, PROFILE_CACHE_KEY};
use super::client::ApiClient;
use super::types::{
  Category, CategoryDraft, NotificationPreferences, Order, OrderStatus, OrderSummary, Preference,
  Profile, ProfileUpdate, Supplier, SupplierStatus, User, UserStatus, UserSummary,
  VerificationDecision, VerificationRequest, VerificationStatus,
};

/// Admin client with transparent caching and notification side effects.
#[derive(Clone)]
pub struct CachedClient {
  api: ApiClient,
  cache: CacheLayer<Storage>,
  notifier: Notifier,
}

impl CachedClient {
  /// Build a client from configuration: HTTP transport, storage backend and
  /// TTL per the config, notifications to the given sink.
  pub fn new(config: &Config, notifier: Notifier) -> Result<Self> {
    let api = ApiClient::new(config)?;
    let storage = Storage::from_config(&config.cache)?;
    let cache = CacheLayer::new(storage)
      .with_ttl(config.cache_ttl())
      .with_dedup_inflight(config.cache.dedup_inflight);
    let notifier = notifier.with_default_duration(config.notifications.default_duration_ms);

    Ok(Self::with_parts(api, cache, notifier))
  }

  /// Assemble a client from explicit parts. Tests inject the in-memory
  /// transport and sink here.
  pub fn with_parts(api: ApiClient, cache: CacheLayer<Storage>, notifier: Notifier) -> Self {
    Self {
      api,
      cache,
      notifier,
    }
  }

  /// Unwrap a read result, emitting the error notification on failure.
  fn report_read<T>(&self, result: Result<CacheResult<T>>) -> Result<T> {
    match result {
      Ok(r) => Ok(r.data),
      Err(e) => {
        self.notifier.error(e.user_message());
        Err(e)
      }
    }
  }

  /// Run a mutation: on success store the server's object wholesale, drop
  /// the affected list caches, and emit a success notification. On failure
  /// emit the error notification and return the error.
  async fn mutate<T, Fut>(
    &self,
    op: Fut,
    invalidate_lists: &[&'static str],
    success: impl Into<String>,
  ) -> Result<T>
  where
    T: Cacheable,
    Fut: Future<Output = Result<T>>,
  {
    match op.await {
      Ok(value) => {
        self.cache.store(&value)?;
        for entity_type in invalidate_lists {
          self.cache.invalidate_lists(entity_type)?;
        }
        self.notifier.success(success);
        Ok(value)
      }
      Err(e) => {
        self.notifier.error(e.user_message());
        Err(e)
      }
    }
  }

  // ==========================================================================
  // Profile
  // ==========================================================================

  /// Fetch the administrator profile. With `force == false` a fresh cached
  /// copy is returned without a network call.
  pub async fn profile(&self, force: bool) -> Result<Profile> {
    let result = self
      .cache
      .fetch_one(PROFILE_CACHE_KEY, force, || {
        let api = self.api.clone();
        async move { api.profile().await }
      })
      .await;
    self.report_read(result)
  }

  /// Update the profile. The cached profile becomes exactly the
  /// server-returned object, even where the server omits fields present in
  /// the input.
  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
    self
      .mutate(self.api.update_profile(update), &[], "Profile saved.")
      .await
  }

  /// Toggle a single notification preference. On success only the
  /// preferences sub-field of the cached profile is rewritten; the rest of
  /// the cached object is untouched.
  pub async fn set_notification_preference(
    &self,
    preference: Preference,
    enabled: bool,
  ) -> Result<NotificationPreferences> {
    match self.api.set_notification_preference(preference, enabled).await {
      Ok(preferences) => {
        if let Some(mut profile) = self.cache.peek::<Profile>(PROFILE_CACHE_KEY)? {
          profile.preferences = preferences;
          self.cache.store(&profile)?;
        }
        self.notifier.success("Notification preferences updated.");
        Ok(preferences)
      }
      Err(e) => {
        self.notifier.error(e.user_message());
        Err(e)
      }
    }
  }

  // ==========================================================================
  // Users
  // ==========================================================================

  pub async fn users(
    &self,
    page: u32,
    search: Option<&str>,
    force: bool,
  ) -> Result<Vec<UserSummary>> {
    let key = AdminQueryKey::Users {
      page,
      search: search.map(String::from),
    };
    let result = self
      .cache
      .fetch_list(&key, force, || {
        let api = self.api.clone();
        let search = search.map(String::from);
        async move { Ok(api.list_users(page, search.as_deref()).await?.items) }
      })
      .await;
    self.report_read(result)
  }

  pub async fn user(&self, id: &str, force: bool) -> Result<User> {
    let result = self
      .cache
      .fetch_one(id, force, || {
        let api = self.api.clone();
        let id = id.to_string();
        async move { api.get_user(&id).await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn set_user_status(&self, id: &str, status: UserStatus) -> Result<User> {
    let message = match status {
      UserStatus::Active => "User activated.",
      UserStatus::Suspended => "User suspended.",
    };
    self
      .mutate(
        self.api.set_user_status(id, status),
        &["user_summary"],
        message,
      )
      .await
  }

  // ==========================================================================
  // Suppliers
  // ==========================================================================

  pub async fn suppliers(
    &self,
    status: Option<SupplierStatus>,
    force: bool,
  ) -> Result<Vec<Supplier>> {
    let key = AdminQueryKey::Suppliers { status };
    let result = self
      .cache
      .fetch_list(&key, force, || {
        let api = self.api.clone();
        async move { api.list_suppliers(status).await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn supplier(&self, id: &str, force: bool) -> Result<Supplier> {
    let result = self
      .cache
      .fetch_one(id, force, || {
        let api = self.api.clone();
        let id = id.to_string();
        async move { api.get_supplier(&id).await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn set_supplier_status(&self, id: &str, status: SupplierStatus) -> Result<Supplier> {
    let message = match status {
      SupplierStatus::Pending => "Supplier moved back to review.",
      SupplierStatus::Approved => "Supplier approved.",
      SupplierStatus::Suspended => "Supplier suspended.",
    };
    self
      .mutate(
        self.api.set_supplier_status(id, status),
        &["supplier"],
        message,
      )
      .await
  }

  // ==========================================================================
  // Categories
  // ==========================================================================

  pub async fn categories(&self, force: bool) -> Result<Vec<Category>> {
    let result = self
      .cache
      .fetch_list(&AdminQueryKey::Categories, force, || {
        let api = self.api.clone();
        async move { api.list_categories().await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
    self
      .mutate(
        self.api.create_category(draft),
        &["category"],
        "Category created.",
      )
      .await
  }

  pub async fn delete_category(&self, id: &str) -> Result<()> {
    match self.api.delete_category(id).await {
      Ok(()) => {
        self.cache.invalidate_entity::<Category>(id)?;
        self.cache.invalidate_lists("category")?;
        self.notifier.success("Category deleted.");
        Ok(())
      }
      Err(e) => {
        self.notifier.error(e.user_message());
        Err(e)
      }
    }
  }

  // ==========================================================================
  // Orders
  // ==========================================================================

  pub async fn orders(
    &self,
    status: Option<OrderStatus>,
    page: u32,
    force: bool,
  ) -> Result<Vec<OrderSummary>> {
    let key = AdminQueryKey::Orders { status, page };
    let result = self
      .cache
      .fetch_list(&key, force, || {
        let api = self.api.clone();
        async move { Ok(api.list_orders(status, page).await?.items) }
      })
      .await;
    self.report_read(result)
  }

  pub async fn order(&self, id: &str, force: bool) -> Result<Order> {
    let result = self
      .cache
      .fetch_one(id, force, || {
        let api = self.api.clone();
        let id = id.to_string();
        async move { api.get_order(&id).await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<Order> {
    self
      .mutate(
        self.api.set_order_status(id, status),
        &["order_summary"],
        format!("Order {} marked {}.", id, status.label()),
      )
      .await
  }

  // ==========================================================================
  // Verifications
  // ==========================================================================

  pub async fn verifications(
    &self,
    status: Option<VerificationStatus>,
    force: bool,
  ) -> Result<Vec<VerificationRequest>> {
    let key = AdminQueryKey::Verifications { status };
    let result = self
      .cache
      .fetch_list(&key, force, || {
        let api = self.api.clone();
        async move { api.list_verifications(status).await }
      })
      .await;
    self.report_read(result)
  }

  pub async fn review_verification(
    &self,
    id: &str,
    decision: VerificationDecision,
    note: Option<&str>,
  ) -> Result<VerificationRequest> {
    let message = match decision {
      VerificationDecision::Approve => "Verification approved.",
      VerificationDecision::Reject => "Verification rejected.",
    };
    self
      .mutate(
        self.api.review_verification(id, decision, note),
        &["verification"],
        message,
      )
      .await
  }
}
