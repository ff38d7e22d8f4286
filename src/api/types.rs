use serde::{Deserialize, Serialize};

// ── Auth types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    Readonly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    #[serde(default)]
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
    pub expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ── Pagination ──────────────────────────────────────────────────────────────

/// Paginated listing. The backend names the item list after the resource
/// (`products`, `users`, ...); all of them land in `items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(
        alias = "products",
        alias = "users",
        alias = "serials",
        alias = "audit_logs",
        alias = "warranties"
    )]
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Query parameters for listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.filters.push((key.to_string(), value.to_string()));
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 2);
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// `{ "data": ... }` envelope used by a few endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ── Product types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub model_number: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub size: String,
    pub warranty_years: i32,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadataEntry {
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub model_number: String,
    pub size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub model_number: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub size: String,
    pub warranty_years: i32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Exact-match product lookup conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCondition {
    pub brand: String,
    pub product_type: String,
    pub model_number: Option<String>,
    pub size: String,
}

impl ProductCondition {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("brand".to_string(), self.brand.clone()),
            ("type".to_string(), self.product_type.clone()),
        ];
        if let Some(model_number) = &self.model_number {
            pairs.push(("model_number".to_string(), model_number.clone()));
        }
        pairs.push(("size".to_string(), self.size.clone()));
        pairs
    }
}

/// Back-office product filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilters {
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub model_number: String,
    pub size: String,
    pub active: String,
}

impl ProductFilters {
    /// The lookup condition, once brand, type, model and size are all chosen.
    pub fn condition(&self) -> Option<ProductCondition> {
        let complete = [&self.brand, &self.product_type, &self.model_number, &self.size]
            .iter()
            .all(|v| !v.is_empty());
        complete.then(|| ProductCondition {
            brand: self.brand.clone(),
            product_type: self.product_type.clone(),
            model_number: Some(self.model_number.clone()),
            size: self.size.clone(),
        })
    }
}

/// Patient-facing filter selection; the product type is `category-subcategory`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProductFilters {
    pub brand: String,
    pub category: String,
    pub subcategory: String,
    pub size: String,
}

impl PatientProductFilters {
    pub fn condition(&self) -> Option<ProductCondition> {
        let complete = !self.category.is_empty()
            && !self.subcategory.is_empty()
            && !self.size.is_empty();
        complete.then(|| ProductCondition {
            brand: self.brand.clone(),
            product_type: format!("{}-{}", self.category, self.subcategory),
            model_number: None,
            size: self.size.clone(),
        })
    }
}

// ── Audit types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<String>,
    #[serde(default)]
    pub old_values: serde_json::Value,
    #[serde(default)]
    pub new_values: serde_json::Value,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: String,
    pub username: String,
    pub email: String,
}

// ── Serial types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Serial {
    pub id: String,
    pub serial_number: String,
    pub full_serial_number: String,
    pub product_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDetailResponse {
    pub id: String,
    pub serial_number: String,
    pub full_serial_number: String,
    pub product_id: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialImportItem {
    pub product_id: String,
    pub serial_number: String,
    pub full_serial_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialBulkImportRequest {
    pub serials: Vec<SerialImportItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialImportErrorItem {
    pub index: i64,
    pub product_id: String,
    pub serial_number: String,
    pub full_serial_number: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialBulkImportResponse {
    pub success_count: i64,
    pub failed_count: i64,
    #[serde(default)]
    pub failed_items: Vec<SerialImportErrorItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialCreateRequest {
    pub serial_number: String,
    pub full_serial_number: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerialUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialStatsResponse {
    pub total_serials: i64,
    pub assigned_serials: i64,
    pub unassigned_serials: i64,
    pub total_products: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialExistsResponse {
    pub exists: bool,
}

// ── Warranty types ──────────────────────────────────────────────────────────

/// Patient-submitted registration draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyRegistration {
    pub product_id: String,
    pub product_serial_number: String,
    /// Second implant serial (bilateral surgery); omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_serial_number_2: Option<String>,
    pub patient_name: String,
    /// Whether `patient_id` is a domestic identity number.
    pub is_local_identity: bool,
    pub patient_id: String,
    pub patient_birth_date: String,
    pub patient_phone: String,
    pub patient_email: String,
    pub hospital_name: String,
    pub doctor_name: String,
    pub surgery_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarrantyStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantyInfo {
    pub id: String,
    pub product_id: String,
    pub product_serial_number: String,
    #[serde(default)]
    pub product_serial_number_2: Option<String>,
    pub patient_name: String,
    pub patient_id: String,
    pub patient_birth_date: String,
    pub patient_phone: String,
    pub patient_email: String,
    pub hospital_name: String,
    pub doctor_name: String,
    pub surgery_date: String,
    pub warranty_start_date: String,
    pub warranty_end_date: String,
    #[serde(default)]
    pub confirmation_email_sent: Option<bool>,
    #[serde(default)]
    pub email_sent_at: Option<String>,
    pub status: WarrantyStatus,
    pub created_at: String,
    pub updated_at: String,
    pub model_number: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub size: String,
    pub warranty_years: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Back-office warranty edit; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarrantyUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_serial_number_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surgery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WarrantyStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialNumberCheckResponse {
    pub exists: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyStatusResponse {
    pub can_edit: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCreateWarrantyRequest {
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCreateWarrantyResponse {
    pub count: u32,
    pub ids: Vec<String>,
}
