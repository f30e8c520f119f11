//! The admin REST API as seen by the controllers.
//!
//! `AdminApi` is the seam; `HttpAdminApi` talks to the real service with
//! reqwest. Every request carries the raw token in `Authorization` (an empty
//! header when no token is configured) and list reads bypass caches.

use async_trait::async_trait;
use cnc_common::{
    AdminUser, EntityId, RemoveAdminRequest, Resource, SetAdminRequest, Setting,
    SpindleSettingsResponse, User,
};
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{AdminConfig, AdminError, AdminResult, CsvFile};

#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list<R: Resource>(&self) -> AdminResult<Vec<R>>;
    async fn get<R: Resource>(&self, id: EntityId) -> AdminResult<R>;
    async fn create<R: Resource>(&self, payload: &R::Payload) -> AdminResult<()>;
    async fn update<R: Resource>(&self, id: EntityId, payload: &R::Payload) -> AdminResult<()>;
    async fn delete<R: Resource>(&self, id: EntityId) -> AdminResult<()>;

    /// Settings of one spindle as returned by the server, unfiltered.
    async fn settings_for_spindle(&self, spindle_id: EntityId) -> AdminResult<Vec<Setting>>;
    async fn upload_settings_csv(&self, spindle_id: EntityId, file: &CsvFile) -> AdminResult<()>;
    /// Delete the spindle and every setting that references it.
    async fn delete_spindle_settings(&self, spindle_id: EntityId) -> AdminResult<()>;

    async fn list_admins(&self) -> AdminResult<Vec<AdminUser>>;
    async fn set_admin(&self, request: &SetAdminRequest) -> AdminResult<()>;
    async fn remove_admin(&self, request: &RemoveAdminRequest) -> AdminResult<()>;
    async fn list_users(&self) -> AdminResult<Vec<User>>;
}

#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAdminApi {
    /// Fails with `MissingConfig` when no admin base URL is configured.
    pub fn new(config: &AdminConfig) -> AdminResult<Self> {
        let base_url = config
            .admin_base_url
            .clone()
            .ok_or_else(|| AdminError::MissingConfig("Missing admin base URL in configuration".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, self.token.as_deref().unwrap_or(""))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AdminResult<T> {
        let response = send(self.request(Method::GET, path).header(CACHE_CONTROL, "no-store")).await?;
        response.json::<T>().await.map_err(|e| AdminError::Decode(e.to_string()))
    }
}

/// Send and turn any non-2xx status into `AdminError::Http` carrying the raw
/// response text.
pub(crate) async fn send(builder: RequestBuilder) -> AdminResult<Response> {
    let response = builder.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    warn!("{} returned {}", url, status.as_u16());
    Err(AdminError::Http {
        status: status.as_u16(),
        body,
    })
}

fn collection_path<R: Resource>() -> String {
    format!("/admin/cnc/{}", R::COLLECTION)
}

fn item_path<R: Resource>(id: EntityId) -> String {
    format!("/admin/cnc/{}/{}", R::COLLECTION, id)
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn list<R: Resource>(&self) -> AdminResult<Vec<R>> {
        self.get_json(&collection_path::<R>()).await
    }

    async fn get<R: Resource>(&self, id: EntityId) -> AdminResult<R> {
        self.get_json(&item_path::<R>(id)).await
    }

    async fn create<R: Resource>(&self, payload: &R::Payload) -> AdminResult<()> {
        send(self.request(Method::POST, &collection_path::<R>()).json(payload)).await?;
        Ok(())
    }

    async fn update<R: Resource>(&self, id: EntityId, payload: &R::Payload) -> AdminResult<()> {
        send(self.request(Method::PUT, &item_path::<R>(id)).json(payload)).await?;
        Ok(())
    }

    async fn delete<R: Resource>(&self, id: EntityId) -> AdminResult<()> {
        send(self.request(Method::DELETE, &item_path::<R>(id))).await?;
        Ok(())
    }

    async fn settings_for_spindle(&self, spindle_id: EntityId) -> AdminResult<Vec<Setting>> {
        let body: serde_json::Value = self
            .get_json(&format!("/admin/cnc/settings/spindle/{}", spindle_id))
            .await?;
        let response = SpindleSettingsResponse::from_body(body)
            .map_err(|e| AdminError::Decode(e.to_string()))?;
        Ok(response.settings)
    }

    async fn upload_settings_csv(&self, spindle_id: EntityId, file: &CsvFile) -> AdminResult<()> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.upload_mime())?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("spindle_id", spindle_id.to_string());
        send(self.request(Method::POST, "/admin/cnc/settings/upload").multipart(form)).await?;
        Ok(())
    }

    async fn delete_spindle_settings(&self, spindle_id: EntityId) -> AdminResult<()> {
        let path = format!("/admin/cnc/settings/delete/spindle/{}", spindle_id);
        send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn list_admins(&self) -> AdminResult<Vec<AdminUser>> {
        self.get_json("/admin/admins").await
    }

    async fn set_admin(&self, request: &SetAdminRequest) -> AdminResult<()> {
        send(self.request(Method::POST, "/admin/set-admin").json(request)).await?;
        Ok(())
    }

    async fn remove_admin(&self, request: &RemoveAdminRequest) -> AdminResult<()> {
        send(self.request(Method::POST, "/admin/remove-admin").json(request)).await?;
        Ok(())
    }

    async fn list_users(&self) -> AdminResult<Vec<User>> {
        self.get_json("/api/users").await
    }
}
