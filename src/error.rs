use thiserror::Error;

#[derive(Error, Debug)]
pub enum LarderError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data in {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Storage unit '{0}' already exists")]
    UnitExists(String),

    #[error("Storage unit '{0}' not found")]
    UnitNotFound(String),

    #[error("Item '{item}' not found in '{unit}'")]
    ItemNotFound { unit: String, item: String },

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Expiration date {0} is in the past")]
    ExpirationInPast(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("All sample storage units already exist")]
    AllSampleUnitsExist,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User '{0}' does not exist")]
    UnknownUser(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("User '{0}' already exists")]
    UserExists(String),

    #[error("The main admin account cannot be removed")]
    ProtectedUser,

    #[error("Login required: pass --user and set LARDER_PASSWORD")]
    LoginRequired,

    #[error("This command requires the admin role")]
    AdminRequired,

    #[error("Failed to parse users file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write users file: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to parse notification settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Failed to write notification settings: {0}")]
    Serialize(#[source] serde_yml::Error),

    #[error("Notifications are not configured (run `larder notify configure`)")]
    NotConfigured,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unknown notification channel '{0}'")]
    UnknownChannel(String),

    #[error("Webhook delivery failed: {0}")]
    WebhookSend(String),

    #[error("No notification channel accepted the message")]
    AllSinksFailed,
}

pub type Result<T> = std::result::Result<T, LarderError>;
