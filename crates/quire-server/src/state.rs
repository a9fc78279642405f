use std::sync::Arc;

use quire_gate::AccessGateway;
use quire_store::PublicationStore;

use crate::auth::AuthProvider;
use crate::session::SessionRegistry;

/// Shared handles every request handler receives.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PublicationStore>,
    pub gateway: AccessGateway,
    pub sessions: Arc<SessionRegistry>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(
        store: Arc<PublicationStore>,
        gateway: AccessGateway,
        sessions: Arc<SessionRegistry>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            store,
            gateway,
            sessions,
            auth,
        }
    }
}
