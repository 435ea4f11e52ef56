pub mod properties;
pub mod settings;

pub use properties::{
    create_shared_property_store, PropertyStore, SharedPropertyStore, Transaction,
    ACCESS_TOKEN_KEY, CLIENT_ID_KEY, CLIENT_SECRET_KEY, PANEL_PASSWORD_KEY, PANEL_USER_KEY,
};
pub use settings::Settings;
