pub mod auth;
pub mod notifications;
pub mod observable;
pub mod registration;

pub use auth::{AuthState, AuthStore};
pub use notifications::{Notification, NotificationQueue, NotificationType};
pub use observable::Observable;
pub use registration::{
    load_registration_page, FormField, RegistrationBackend, RegistrationPage, RegistrationState,
    RegistrationStore, SerialCheck, SerialSlot,
};
