//! Connected storefront plus its saved session.

use pupuk_client::{ClientConfig, Storefront};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::SessionStore;

#[derive(Debug, Clone)]
pub struct AppState {
    storefront: Storefront,
    sessions: SessionStore,
}

impl AppState {
    /// Builds the client and puts the saved session cookie back in its jar.
    pub fn connect(config: ClientConfig, sessions: SessionStore) -> ApiResult<Self> {
        let storefront = Storefront::new(config)?;

        if let Some(header) = sessions.load()? {
            storefront.api().restore_cookies(&header);
            debug!(path = ?sessions.path(), "Session restored");
        }

        Ok(AppState {
            storefront,
            sessions,
        })
    }

    pub fn storefront(&self) -> &Storefront {
        &self.storefront
    }

    /// Writes whatever the jar holds now, so the next run stays signed in.
    pub fn persist_session(&self) -> ApiResult<()> {
        match self.storefront.api().cookie_header() {
            Some(header) => self.sessions.save(&header),
            None => self.sessions.clear(),
        }
    }

    pub fn forget_session(&self) -> ApiResult<()> {
        self.sessions.clear()?;
        info!("Saved session removed");
        Ok(())
    }
}
