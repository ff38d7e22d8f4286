//! Patient warranty registration form.
//!
//! The form is an explicit [`RegistrationState`] value with a handful of
//! synchronous transitions (field edits, serial format classification,
//! validation). [`RegistrationStore`] wraps it in an observable cell and runs
//! the asynchronous parts (product lookup, serial verification, submission)
//! against a [`RegistrationBackend`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::api::types::{
    PatientProductFilters, Product, ProductCondition, ProductFilters, SerialNumberCheckResponse,
    WarrantyInfo, WarrantyRegistration, WarrantyStatusResponse,
};
use crate::api::ApiService;
use crate::error::{Error, Result};
use crate::utils::serial::is_valid_serial_format;

use super::notifications::NotificationQueue;
use super::observable::Observable;

pub const DEFAULT_BRAND: &str = "Mentor";

pub const SERIAL_FORMAT_ERROR: &str =
    "Invalid serial number format, expected 1234567-123 (7 digits-3 digits)";
pub const SERIAL_UNUSABLE_ERROR: &str =
    "Unusable serial number, please contact your surgical clinic.";
pub const SERIAL_REQUIRED_ERROR: &str = "Product serial number is required";
pub const SERIALS_MUST_DIFFER_ERROR: &str = "The two serial numbers must be different";
pub const FORM_ERROR: &str = "Please correct the errors in the form";
pub const REGISTER_SUCCESS_MESSAGE: &str =
    "Warranty registered successfully! A confirmation email will be sent to your inbox.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    ProductId,
    ProductSerialNumber,
    ProductSerialNumber2,
    PatientName,
    PatientId,
    PatientBirthDate,
    PatientPhone,
    PatientEmail,
    HospitalName,
    DoctorName,
    SurgeryDate,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::ProductId => "product_id",
            FormField::ProductSerialNumber => "product_serial_number",
            FormField::ProductSerialNumber2 => "product_serial_number_2",
            FormField::PatientName => "patient_name",
            FormField::PatientId => "patient_id",
            FormField::PatientBirthDate => "patient_birth_date",
            FormField::PatientPhone => "patient_phone",
            FormField::PatientEmail => "patient_email",
            FormField::HospitalName => "hospital_name",
            FormField::DoctorName => "doctor_name",
            FormField::SurgeryDate => "surgery_date",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient fields that must be filled in, with their error messages.
const REQUIRED_FIELDS: [(FormField, &str); 7] = [
    (FormField::PatientName, "Patient name is required"),
    (FormField::PatientId, "Identity number is required"),
    (FormField::PatientBirthDate, "Date of birth is required"),
    (FormField::PatientPhone, "Phone number is required"),
    (FormField::PatientEmail, "Email is required"),
    (FormField::HospitalName, "Hospital is required"),
    (FormField::DoctorName, "Surgeon is required"),
];

/// Which of the two serial number inputs an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialSlot {
    First,
    Second,
}

/// Verification state of one serial number input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SerialCheck {
    #[default]
    Empty,
    FormatInvalid(String),
    Checking,
    /// The backend accepted the serial for this warranty.
    Available,
    /// The backend rejected the serial; it cannot be registered.
    Unusable(String),
}

impl SerialCheck {
    pub fn is_checking(&self) -> bool {
        matches!(self, SerialCheck::Checking)
    }

    pub fn exists(&self) -> bool {
        matches!(self, SerialCheck::Unusable(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SerialCheck::FormatInvalid(msg) | SerialCheck::Unusable(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Local classification of a serial number input, before any backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialFormat {
    Empty,
    Invalid,
    NeedsCheck,
}

pub fn classify_serial(value: &str) -> SerialFormat {
    if value.trim().is_empty() {
        SerialFormat::Empty
    } else if !is_valid_serial_format(value) {
        SerialFormat::Invalid
    } else {
        SerialFormat::NeedsCheck
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationState {
    pub form_data: WarrantyRegistration,
    pub selected_brand: String,
    pub filters: ProductFilters,
    pub patient_filters: PatientProductFilters,
    pub is_loading: bool,
    pub error: Option<String>,
    pub validation_errors: BTreeMap<FormField, String>,
    pub serial1: SerialCheck,
    pub serial2: SerialCheck,
    pub status_check_result: Option<WarrantyStatusResponse>,
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationState {
    pub fn new() -> Self {
        Self::starting_on(Utc::now().date_naive())
    }

    /// Initial state with the default dates derived from `today`: birth date
    /// eighteen years back, surgery date today.
    pub fn starting_on(today: NaiveDate) -> Self {
        let birth_date = today - Duration::days(18 * 365);
        Self {
            form_data: WarrantyRegistration {
                product_id: String::new(),
                product_serial_number: String::new(),
                product_serial_number_2: None,
                patient_name: String::new(),
                is_local_identity: true,
                patient_id: String::new(),
                patient_birth_date: birth_date.format("%Y-%m-%d").to_string(),
                patient_phone: String::new(),
                patient_email: String::new(),
                hospital_name: String::new(),
                doctor_name: String::new(),
                surgery_date: today.format("%Y-%m-%d").to_string(),
            },
            selected_brand: DEFAULT_BRAND.to_string(),
            filters: ProductFilters {
                brand: DEFAULT_BRAND.to_string(),
                ..ProductFilters::default()
            },
            patient_filters: PatientProductFilters {
                brand: DEFAULT_BRAND.to_string(),
                ..PatientProductFilters::default()
            },
            is_loading: false,
            error: None,
            validation_errors: BTreeMap::new(),
            serial1: SerialCheck::Empty,
            serial2: SerialCheck::Empty,
            status_check_result: None,
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        let data = &self.form_data;
        match field {
            FormField::ProductId => &data.product_id,
            FormField::ProductSerialNumber => &data.product_serial_number,
            FormField::ProductSerialNumber2 => {
                data.product_serial_number_2.as_deref().unwrap_or("")
            }
            FormField::PatientName => &data.patient_name,
            FormField::PatientId => &data.patient_id,
            FormField::PatientBirthDate => &data.patient_birth_date,
            FormField::PatientPhone => &data.patient_phone,
            FormField::PatientEmail => &data.patient_email,
            FormField::HospitalName => &data.hospital_name,
            FormField::DoctorName => &data.doctor_name,
            FormField::SurgeryDate => &data.surgery_date,
        }
    }

    /// Replace one field and clear that field's validation error.
    pub fn update_field(&mut self, field: FormField, value: String) {
        let data = &mut self.form_data;
        match field {
            FormField::ProductId => data.product_id = value,
            FormField::ProductSerialNumber => data.product_serial_number = value,
            FormField::ProductSerialNumber2 => data.product_serial_number_2 = Some(value),
            FormField::PatientName => data.patient_name = value,
            FormField::PatientId => data.patient_id = value,
            FormField::PatientBirthDate => data.patient_birth_date = value,
            FormField::PatientPhone => data.patient_phone = value,
            FormField::PatientEmail => data.patient_email = value,
            FormField::HospitalName => data.hospital_name = value,
            FormField::DoctorName => data.doctor_name = value,
            FormField::SurgeryDate => data.surgery_date = value,
        }
        self.validation_errors.remove(&field);
    }

    pub fn serial(&self, slot: SerialSlot) -> &SerialCheck {
        match slot {
            SerialSlot::First => &self.serial1,
            SerialSlot::Second => &self.serial2,
        }
    }

    pub fn set_serial(&mut self, slot: SerialSlot, check: SerialCheck) {
        match slot {
            SerialSlot::First => self.serial1 = check,
            SerialSlot::Second => self.serial2 = check,
        }
    }

    /// Field-keyed validation errors for the current draft. Empty means the
    /// draft may be submitted.
    pub fn validate(&self) -> BTreeMap<FormField, String> {
        let mut errors = BTreeMap::new();
        let data = &self.form_data;

        if data.product_serial_number.trim().is_empty() {
            errors.insert(
                FormField::ProductSerialNumber,
                SERIAL_REQUIRED_ERROR.to_string(),
            );
        } else if let Some(msg) = self.serial1.error() {
            errors.insert(FormField::ProductSerialNumber, msg.to_string());
        }

        for (field, message) in REQUIRED_FIELDS {
            if self.field(field).trim().is_empty() {
                errors.insert(field, message.to_string());
            }
        }

        let second = self.field(FormField::ProductSerialNumber2);
        if !second.is_empty() {
            if second == data.product_serial_number {
                errors.insert(
                    FormField::ProductSerialNumber2,
                    SERIALS_MUST_DIFFER_ERROR.to_string(),
                );
            } else if let Some(msg) = self.serial2.error() {
                errors.insert(FormField::ProductSerialNumber2, msg.to_string());
            }
        }

        errors
    }

    /// Advisory gate for the submit button. `submit_form` validates again.
    pub fn can_submit(&self) -> bool {
        let filled = std::iter::once(FormField::ProductSerialNumber)
            .chain(REQUIRED_FIELDS.iter().map(|(field, _)| *field))
            .all(|field| !self.field(field).trim().is_empty());
        let serials_ok = [&self.serial1, &self.serial2]
            .iter()
            .all(|check| !check.exists() && check.error().is_none());

        !self.is_loading && filled && serials_ok
    }

    /// The draft as sent to the backend; a blank second serial is dropped.
    pub fn submission_payload(&self) -> WarrantyRegistration {
        let mut payload = self.form_data.clone();
        if payload
            .product_serial_number_2
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            payload.product_serial_number_2 = None;
        }
        payload
    }
}

/// Backend calls the registration form depends on.
pub trait RegistrationBackend: Send + Sync {
    fn find_product(
        &self,
        condition: &ProductCondition,
    ) -> impl Future<Output = Result<Product>> + Send;

    fn check_serial(
        &self,
        serial_number: &str,
        warranty_id: &str,
    ) -> impl Future<Output = Result<SerialNumberCheckResponse>> + Send;

    fn register_warranty(
        &self,
        warranty_id: &str,
        data: &WarrantyRegistration,
    ) -> impl Future<Output = Result<WarrantyInfo>> + Send;

    fn warranty_status(
        &self,
        warranty_id: &str,
    ) -> impl Future<Output = Result<WarrantyStatusResponse>> + Send;
}

impl RegistrationBackend for ApiService {
    async fn find_product(&self, condition: &ProductCondition) -> Result<Product> {
        self.get_product_by_condition(condition).await
    }

    async fn check_serial(
        &self,
        serial_number: &str,
        warranty_id: &str,
    ) -> Result<SerialNumberCheckResponse> {
        self.check_serial_number(serial_number, warranty_id).await
    }

    async fn register_warranty(
        &self,
        warranty_id: &str,
        data: &WarrantyRegistration,
    ) -> Result<WarrantyInfo> {
        self.fill_warranty(warranty_id, data).await
    }

    async fn warranty_status(&self, warranty_id: &str) -> Result<WarrantyStatusResponse> {
        self.check_warranty_status(warranty_id).await
    }
}

/// Data loaded for the registration page of one warranty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPage {
    pub warranty_id: String,
    pub status_check_result: Option<WarrantyStatusResponse>,
    pub status_error: Option<String>,
}

/// Fetch the warranty status for the registration page. A failing status
/// check is reported in `status_error` rather than as an error.
pub async fn load_registration_page<B: RegistrationBackend>(
    backend: &B,
    warranty_id: &str,
) -> Result<RegistrationPage> {
    if warranty_id.is_empty() {
        return Err(Error::Request("Warranty ID not found".to_string()));
    }

    let (status_check_result, status_error) = match backend.warranty_status(warranty_id).await {
        Ok(status) => (Some(status), None),
        Err(e) => (
            None,
            Some(format!("Error checking warranty status: {}", e.message())),
        ),
    };

    Ok(RegistrationPage {
        warranty_id: warranty_id.to_string(),
        status_check_result,
        status_error,
    })
}

pub struct RegistrationStore<B> {
    backend: Arc<B>,
    notifications: Arc<NotificationQueue>,
    state: Observable<RegistrationState>,
}

impl<B: RegistrationBackend> RegistrationStore<B> {
    pub fn new(backend: Arc<B>, notifications: Arc<NotificationQueue>) -> Self {
        Self {
            backend,
            notifications,
            state: Observable::new(RegistrationState::new()),
        }
    }

    pub fn state(&self) -> RegistrationState {
        self.state.get()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<RegistrationState> {
        self.state.subscribe()
    }

    pub fn can_submit(&self) -> bool {
        self.state.with(RegistrationState::can_submit)
    }

    pub fn initialize(&self, page: &RegistrationPage) {
        self.state.update(|s| {
            s.status_check_result = page.status_check_result.clone();
            s.error = page.status_error.clone();
        });
    }

    pub fn update_field(&self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|s| s.update_field(field, value));
    }

    pub fn set_local_identity(&self, is_local_identity: bool) {
        self.state
            .update(|s| s.form_data.is_local_identity = is_local_identity);
    }

    /// Replace the back-office filters and, once complete, resolve them to a
    /// product. A lookup miss leaves the current `product_id` untouched.
    pub async fn update_filters(&self, filters: ProductFilters) {
        let condition = filters.condition();
        self.state.update(|s| s.filters = filters);
        if let Some(condition) = condition {
            self.select_product(&condition).await;
        }
    }

    /// Patient-facing variant of [`update_filters`](Self::update_filters).
    pub async fn update_patient_filters(&self, filters: PatientProductFilters) {
        let condition = filters.condition();
        self.state.update(|s| s.patient_filters = filters);
        if let Some(condition) = condition {
            self.select_product(&condition).await;
        }
    }

    async fn select_product(&self, condition: &ProductCondition) {
        match self.backend.find_product(condition).await {
            Ok(product) => {
                log::debug!("Filters resolved to product {}", product.id);
                self.state.update(|s| s.form_data.product_id = product.id);
            }
            Err(e) => log::warn!("Product lookup failed for {:?}: {}", condition, e),
        }
    }

    /// Verify one serial number input. Format problems are reported locally;
    /// only well-formed serials reach the backend.
    pub async fn check_serial_number(&self, value: &str, warranty_id: &str, slot: SerialSlot) {
        match classify_serial(value) {
            SerialFormat::Empty => {
                self.state.update(|s| s.set_serial(slot, SerialCheck::Empty));
                return;
            }
            SerialFormat::Invalid => {
                self.state.update(|s| {
                    s.set_serial(slot, SerialCheck::FormatInvalid(SERIAL_FORMAT_ERROR.to_string()))
                });
                return;
            }
            SerialFormat::NeedsCheck => {}
        }

        self.state.update(|s| s.set_serial(slot, SerialCheck::Checking));

        let check = match self.backend.check_serial(value, warranty_id).await {
            Ok(_) => SerialCheck::Available,
            Err(e) => {
                log::warn!("Serial number check failed for {}: {}", value, e);
                SerialCheck::Unusable(SERIAL_UNUSABLE_ERROR.to_string())
            }
        };
        self.state.update(|s| s.set_serial(slot, check));
    }

    /// Validate and submit the draft. Returns whether the registration went
    /// through; on validation errors no request is made.
    pub async fn submit_form(&self, warranty_id: &str) -> bool {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
            s.validation_errors.clear();
        });

        let snapshot = self.state.get();
        let errors = snapshot.validate();
        if !errors.is_empty() {
            log::debug!("Registration blocked by {} validation errors", errors.len());
            self.state.update(|s| {
                s.is_loading = false;
                s.error = Some(FORM_ERROR.to_string());
                s.validation_errors = errors;
            });
            return false;
        }

        let payload = snapshot.submission_payload();
        match self.backend.register_warranty(warranty_id, &payload).await {
            Ok(info) => {
                log::info!("Warranty {} registered", info.id);
                self.notifications.success(REGISTER_SUCCESS_MESSAGE, None);
                self.state.update(|s| {
                    s.is_loading = false;
                    if let Some(status) = s.status_check_result.as_mut() {
                        status.can_edit = false;
                    }
                });
                true
            }
            Err(e) => {
                let message = e.message();
                self.notifications
                    .error(format!("Registration failed: {}", message), None);
                self.state.update(|s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                false
            }
        }
    }

    pub fn reset(&self) {
        self.state.set(RegistrationState::new());
    }
}
