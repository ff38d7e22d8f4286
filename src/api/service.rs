use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::IgnoredAny;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::stores::auth::AuthStore;

use super::client::{ApiRequest, HttpClient};
use super::types::*;

/// Typed operations of the portal backend.
///
/// Patient-facing calls (serial check, warranty status, self-registration,
/// product lookup) go through the public path; everything else needs a
/// session and returns `Ok(None)` once the session cannot be refreshed.
#[derive(Clone)]
pub struct ApiService {
    http: HttpClient,
    auth: Arc<AuthStore>,
}

impl ApiService {
    pub fn new(config: ClientConfig, auth: Arc<AuthStore>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            auth,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> &Arc<AuthStore> {
        &self.auth
    }

    // ── Auth ────────────────────────────────────────────────────────────

    /// Log in. Only a 200 counts as success; any other status is `false`.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<bool> {
        let req = ApiRequest::post("/api/v1/auth/login").json(credentials)?;
        let status = self.http.raw_status(req).await?;
        if status != StatusCode::OK {
            log::warn!("Login for {} rejected: {}", credentials.username, status);
        }
        Ok(status == StatusCode::OK)
    }

    /// Log out and drop every session artifact held locally, even when the
    /// logout call itself fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .http
            .authed_request::<IgnoredAny>(ApiRequest::post("/api/v1/auth/logout"))
            .await;

        self.http.cookies().clear_csrf();
        self.auth.logout();
        log::info!("Logged out");

        result.map(|_| ())
    }

    pub async fn get_me(&self) -> Result<Option<MeResponse>> {
        self.http.authed_request(ApiRequest::get("/api/v1/auth/me")).await
    }

    /// Load the current session into the auth store. Returns whether a
    /// session is active.
    pub async fn restore_session(&self) -> Result<bool> {
        match self.get_me().await {
            Ok(Some(me)) => {
                self.auth.set_login(me.user, &me.expires_at)?;
                Ok(true)
            }
            Ok(None) => {
                self.auth.logout();
                Ok(false)
            }
            Err(e) => {
                self.auth.logout();
                Err(e)
            }
        }
    }

    // ── Products ────────────────────────────────────────────────────────

    pub async fn get_products(&self, query: &ListQuery) -> Result<Option<Page<Product>>> {
        let req = ApiRequest::get("/api/v1/products/manage").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn get_products_all(&self) -> Result<Option<DataResponse<Vec<Product>>>> {
        self.http
            .authed_request(ApiRequest::get("/api/v1/products/all"))
            .await
    }

    pub async fn get_product_by_condition(&self, condition: &ProductCondition) -> Result<Product> {
        let req = ApiRequest::get("/api/v1/product").query_pairs(condition.to_pairs());
        self.http.request(req).await
    }

    pub async fn create_product(&self, data: &CreateProductRequest) -> Result<Option<Product>> {
        let req = ApiRequest::post("/api/v1/products").json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        data: &UpdateProductRequest,
    ) -> Result<Option<Product>> {
        let req = ApiRequest::put(format!("/api/v1/products/{}", id)).json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<Option<()>> {
        self.delete(format!("/api/v1/products/{}", id)).await
    }

    pub async fn get_product_metadata(
        &self,
        query: &ListQuery,
    ) -> Result<DataResponse<Vec<String>>> {
        let req = ApiRequest::get("/api/v1/products-metadata").query_pairs(query.to_pairs());
        self.http.request(req).await
    }

    pub async fn get_product_metadata_all(
        &self,
    ) -> Result<Option<DataResponse<Vec<ProductMetadataEntry>>>> {
        self.http
            .authed_request(ApiRequest::get("/api/v1/products/metadata-all"))
            .await
    }

    // ── Users ───────────────────────────────────────────────────────────

    pub async fn get_users(&self, query: &ListQuery) -> Result<Option<Page<User>>> {
        let req = ApiRequest::get("/api/v1/users").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn create_user(&self, data: &CreateUserRequest) -> Result<Option<User>> {
        let req = ApiRequest::post("/api/v1/users").json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn update_user(&self, id: &str, data: &UpdateUserRequest) -> Result<Option<User>> {
        let req = ApiRequest::put(format!("/api/v1/users/{}", id)).json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<Option<()>> {
        self.delete(format!("/api/v1/users/{}", id)).await
    }

    // ── Audit ───────────────────────────────────────────────────────────

    pub async fn get_audit_logs(&self, query: &ListQuery) -> Result<Option<Page<AuditLog>>> {
        let req = ApiRequest::get("/api/v1/audit").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn get_audit_log_by_id(&self, id: &str) -> Result<Option<AuditLog>> {
        self.http
            .authed_request(ApiRequest::get(format!("/api/v1/audit/{}", id)))
            .await
    }

    // ── Warranty ────────────────────────────────────────────────────────

    pub async fn batch_create_warranty(
        &self,
        data: &BatchCreateWarrantyRequest,
    ) -> Result<Option<BatchCreateWarrantyResponse>> {
        let req = ApiRequest::post("/api/v1/warranty/batch-create").json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn check_warranty_status(&self, id: &str) -> Result<WarrantyStatusResponse> {
        self.http
            .request(ApiRequest::get(format!("/api/v1/warranty/{}/status", id)))
            .await
    }

    /// Submit a patient registration.
    pub async fn fill_warranty(
        &self,
        id: &str,
        data: &WarrantyRegistration,
    ) -> Result<WarrantyInfo> {
        let req = ApiRequest::put(format!("/api/v1/warranty/{}/register", id)).json(data)?;
        self.http.request(req).await
    }

    pub async fn search_warranty(&self, query: &ListQuery) -> Result<Option<Page<WarrantyInfo>>> {
        let req = ApiRequest::get("/api/v1/warranty/search").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn get_warranty_by_id(&self, id: &str) -> Result<Option<WarrantyInfo>> {
        self.http
            .authed_request(ApiRequest::get(format!("/api/v1/warranty/{}", id)))
            .await
    }

    pub async fn update_warranty(
        &self,
        id: &str,
        data: &WarrantyUpdateRequest,
    ) -> Result<Option<WarrantyInfo>> {
        let req = ApiRequest::put(format!("/api/v1/warranty/{}", id)).json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn resend_confirmation_email(&self, id: &str) -> Result<Option<MessageResponse>> {
        self.http
            .authed_request(ApiRequest::post(format!(
                "/api/v1/warranty/{}/resend-email",
                id
            )))
            .await
    }

    /// Check whether `serial_number` can be used for the warranty `warranty_id`.
    pub async fn check_serial_number(
        &self,
        serial_number: &str,
        warranty_id: &str,
    ) -> Result<SerialNumberCheckResponse> {
        let req = ApiRequest::get("/api/v1/warranty/check-serial")
            .query("serial_number", serial_number)
            .query("warranty_id", warranty_id);
        self.http.request(req).await
    }

    pub async fn delete_warranty(&self, id: &str) -> Result<Option<()>> {
        self.delete(format!("/api/v1/warranty/{}", id)).await
    }

    // ── Serials ─────────────────────────────────────────────────────────

    pub async fn get_serials(&self, query: &ListQuery) -> Result<Option<Page<Serial>>> {
        let req = ApiRequest::get("/api/v1/serials").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn get_serial_by_id(&self, id: &str) -> Result<Option<SerialDetailResponse>> {
        self.http
            .authed_request(ApiRequest::get(format!("/api/v1/serials/{}", id)))
            .await
    }

    pub async fn get_serial_by_serial_number(&self, serial_number: &str) -> Result<Option<Serial>> {
        let req = ApiRequest::get("/api/v1/serials/by-serial-number")
            .query("serial_number", serial_number);
        self.http.authed_request(req).await
    }

    pub async fn create_serial(&self, data: &SerialCreateRequest) -> Result<Option<Serial>> {
        let req = ApiRequest::post("/api/v1/serials").json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn update_serial(
        &self,
        id: &str,
        data: &SerialUpdateRequest,
    ) -> Result<Option<Serial>> {
        let req = ApiRequest::put(format!("/api/v1/serials/{}", id)).json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn delete_serial(&self, id: &str) -> Result<Option<()>> {
        self.delete(format!("/api/v1/serials/{}", id)).await
    }

    pub async fn bulk_create_serials(
        &self,
        data: &SerialBulkImportRequest,
    ) -> Result<Option<SerialBulkImportResponse>> {
        let req = ApiRequest::post("/api/v1/serials/bulk").json(data)?;
        self.http.authed_request(req).await
    }

    pub async fn check_serial_exists(
        &self,
        serial_number: &str,
    ) -> Result<Option<SerialExistsResponse>> {
        let req = ApiRequest::get("/api/v1/serials/check-exists")
            .query("serial_number", serial_number);
        self.http.authed_request(req).await
    }

    pub async fn get_serials_with_product(
        &self,
        query: &ListQuery,
    ) -> Result<Option<Page<SerialDetailResponse>>> {
        let req = ApiRequest::get("/api/v1/serials/with-product").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    pub async fn get_serial_stats(&self) -> Result<Option<SerialStatsResponse>> {
        self.http
            .authed_request(ApiRequest::get("/api/v1/serials/stats"))
            .await
    }

    pub async fn list_serials_used_by_warranty(
        &self,
        query: &ListQuery,
    ) -> Result<Option<Page<Serial>>> {
        let req =
            ApiRequest::get("/api/v1/serials/used-by-warranty").query_pairs(query.to_pairs());
        self.http.authed_request(req).await
    }

    async fn delete(&self, endpoint: String) -> Result<Option<()>> {
        let deleted = self
            .http
            .authed_request::<IgnoredAny>(ApiRequest::delete(endpoint))
            .await?;
        Ok(deleted.map(|_| ()))
    }
}
