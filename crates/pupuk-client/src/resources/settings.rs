//! # Settings
//!
//! Company profile, PPN and the storefront logo. Checkout reads the PPN
//! configuration from here too.

use std::sync::Arc;

use pupuk_core::validation::{validate_company_info, validate_ppn_rate_bps};
use pupuk_core::{CompanyInfo, PpnConfig, ValidationError};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

/// Largest logo the backend accepts.
pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

/// `GET /config/logo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoConfig {
    #[serde(default, alias = "logoUrl")]
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl SettingsApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        SettingsApi { api, cache }
    }

    // =========================================================================
    // Company Info
    // =========================================================================

    pub async fn company_info(&self) -> ClientResult<CompanyInfo> {
        self.cache
            .fetch(keys::COMPANY_INFO, || self.api.get("/company-info"))
            .await
    }

    pub async fn update_company_info(&self, info: &CompanyInfo) -> ClientResult<CompanyInfo> {
        validate_company_info(info)?;
        let saved: CompanyInfo = self.api.put("/company-info", info).await?;
        self.cache.set(keys::COMPANY_INFO, &saved).await?;
        info!(name = %saved.name, "Company info updated");
        Ok(saved)
    }

    // =========================================================================
    // PPN
    // =========================================================================

    pub async fn ppn(&self) -> ClientResult<PpnConfig> {
        self.cache.fetch(keys::PPN, || self.api.get("/ppn")).await
    }

    pub async fn update_ppn(&self, config: &PpnConfig) -> ClientResult<PpnConfig> {
        validate_ppn_rate_bps(config.rate_bps)?;
        let saved: PpnConfig = self.api.put("/ppn", config).await?;
        self.cache.set(keys::PPN, &saved).await?;
        info!(rate_bps = saved.rate_bps, active = saved.is_active, "PPN updated");
        Ok(saved)
    }

    // =========================================================================
    // Logo
    // =========================================================================

    pub async fn logo(&self) -> ClientResult<LogoConfig> {
        self.cache.fetch(keys::LOGO, || self.api.get("/config/logo")).await
    }

    /// Uploads a new logo as the multipart field `logo`.
    pub async fn upload_logo(&self, file_name: &str, bytes: Vec<u8>) -> ClientResult<LogoConfig> {
        if bytes.is_empty() {
            return Err(ValidationError::Required {
                field: "logo".to_string(),
            }
            .into());
        }
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(ValidationError::InvalidFormat {
                field: "logo".to_string(),
                reason: format!("file is larger than {} MB", MAX_LOGO_BYTES / (1024 * 1024)),
            }
            .into());
        }
        let mime = logo_mime(file_name).ok_or_else(|| ValidationError::InvalidFormat {
            field: "logo".to_string(),
            reason: "expected a PNG, JPEG, SVG or WebP image".to_string(),
        })?;

        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("logo", part);

        let saved: LogoConfig = self.api.put_multipart("/config/logo", form).await?;
        self.cache.set(keys::LOGO, &saved).await?;
        info!(file_name, size, "Logo uploaded");
        Ok(saved)
    }
}

fn logo_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::test_server;
    use axum::extract::Multipart;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn settings_api(router: Router) -> SettingsApi {
        let base = test_server::spawn(router).await;
        let api = ApiClient::new(&ClientConfig::with_base_url(base)).unwrap();
        SettingsApi::new(api, Arc::new(QueryCache::new(Duration::from_secs(60))))
    }

    #[test]
    fn test_logo_mime() {
        assert_eq!(logo_mime("logo.PNG"), Some("image/png"));
        assert_eq!(logo_mime("brand.jpeg"), Some("image/jpeg"));
        assert_eq!(logo_mime("logo.gif"), None);
        assert_eq!(logo_mime("logo"), None);
    }

    #[tokio::test]
    async fn test_update_ppn_refreshes_cache_without_refetch() {
        let gets = Arc::new(AtomicUsize::new(0));
        let counter = gets.clone();
        let router = Router::new().route(
            "/api/ppn",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "rateBps": 1100, "isActive": true }))
                }
            })
            .put(|Json(body): Json<Value>| async move { Json(json!({ "data": body })) }),
        );
        let settings = settings_api(router).await;

        assert_eq!(settings.ppn().await.unwrap().rate_bps, 1100);

        let saved = settings
            .update_ppn(&PpnConfig {
                rate_bps: 1200,
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(saved.rate_bps, 1200);
        assert_eq!(settings.ppn().await.unwrap().rate_bps, 1200);
        assert_eq!(gets.load(Ordering::SeqCst), 1);

        let err = settings
            .update_ppn(&PpnConfig {
                rate_bps: 10_001,
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(_)));
    }

    #[tokio::test]
    async fn test_company_info_validation() {
        let settings = settings_api(Router::new()).await;
        let info = CompanyInfo {
            name: "CV Pupuk Subur".to_string(),
            email: "bukan-email".to_string(),
            ..CompanyInfo::default()
        };
        let err = settings.update_company_info(&info).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(_)));
    }

    #[tokio::test]
    async fn test_upload_logo_multipart() {
        let router = Router::new().route(
            "/api/config/logo",
            get(|| async { Json(json!({ "logoUrl": null })) }).put(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("logo"));
                assert_eq!(field.file_name(), Some("logo.png"));
                assert_eq!(field.content_type(), Some("image/png"));
                let bytes = field.bytes().await.unwrap();
                assert_eq!(bytes.len(), 4);
                Json(json!({ "logoUrl": "/uploads/logo.png" }))
            }),
        );
        let settings = settings_api(router).await;

        assert_eq!(settings.logo().await.unwrap(), LogoConfig::default());

        let saved = settings
            .upload_logo("logo.png", vec![0x89, b'P', b'N', b'G'])
            .await
            .unwrap();
        assert_eq!(saved.url.as_deref(), Some("/uploads/logo.png"));
        assert_eq!(settings.logo().await.unwrap(), saved);

        let err = settings.upload_logo("logo.gif", vec![1]).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(_)));
    }
}
