use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{auth::AuthGate, store::EntityStore, wizard::BookingWizard};

/// Shared application state. All mutation happens through the mutexes; the
/// data itself lives only as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<EntityStore>>,
    pub auth: AuthGate,
    /// One wizard per visitor, keyed by the booking-session cookie.
    pub wizards: Arc<Mutex<HashMap<String, BookingWizard>>>,
}

impl AppState {
    pub fn new(store: EntityStore, auth: AuthGate) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            auth,
            wizards: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
