//! Reqwest-backed client for the ESO P2 proposal service.
//!
//! Calls are blocking and unauthenticated failures surface as
//! [`SyncError::Service`]. Versions returned by the service are carried
//! back to the caller for optimistic update checking.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::templates::Params;

use super::{ItemId, ItemKind, ItemRecord, ObTarget, ProposalService, RunRecord};

/// Production P2 endpoint.
pub const PRODUCTION_URL: &str = "https://www.eso.org/cop/api/v1";
/// Demo/tutorial P2 endpoint.
pub const DEMO_URL: &str = "https://www.eso.org/copdemo/api/v1";

// Credentials of the shared tutorial account on the demo server.
const DEMO_USER: &str = "52052";
const DEMO_PASSWORD: &str = "tutorial";

/// Blocking HTTP client for the proposal service.
pub struct P2Client {
    http: Client,
    base_url: String,
    token: String,
}

impl P2Client {
    /// Authenticate against the given endpoint.
    pub fn login(base_url: &str, username: &str, password: &str) -> Result<Self, SyncError> {
        let http = Client::new();
        let response = http
            .post(format!("{}/login", base_url))
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(service_err)?
            .error_for_status()
            .map_err(service_err)?;
        #[derive(Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let login: LoginResponse = response.json().map_err(service_err)?;
        Ok(P2Client {
            http,
            base_url: base_url.to_string(),
            token: login.access_token,
        })
    }

    /// Connect to the demo server with the shared tutorial account.
    pub fn demo() -> Result<Self, SyncError> {
        Self::login(DEMO_URL, DEMO_USER, DEMO_PASSWORD)
    }

    fn get(&self, path: &str) -> Result<Value, SyncError> {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .map_err(service_err)?
            .error_for_status()
            .map_err(service_err)?
            .json()
            .map_err(service_err)
    }

    fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<Value, SyncError> {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(service_err)?
            .error_for_status()
            .map_err(service_err)?
            .json()
            .map_err(service_err)
    }

    fn create_item(
        &self,
        container_id: ItemId,
        name: &str,
        item_type: &str,
    ) -> Result<ItemRecord, SyncError> {
        let body = json!({ "itemType": item_type, "name": name });
        let created = self.send_json(
            reqwest::Method::POST,
            &format!("/containers/{}/items", container_id),
            &body,
        )?;
        item_record(&created)
            .ok_or_else(|| SyncError::Service(format!("malformed create response for '{}'", name)))
    }
}

impl ProposalService for P2Client {
    fn list_runs(&self) -> Result<Vec<RunRecord>, SyncError> {
        #[derive(Deserialize)]
        struct RunsResponse {
            runs: Vec<RunDto>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RunDto {
            prog_id: String,
            container_id: ItemId,
        }
        let value = self.get("/runs")?;
        let response: RunsResponse = serde_json::from_value(value).map_err(service_err)?;
        Ok(response
            .runs
            .into_iter()
            .map(|r| RunRecord {
                prog_id: r.prog_id,
                container_id: r.container_id,
            })
            .collect())
    }

    fn find_item(
        &self,
        container_id: ItemId,
        name: &str,
        kind: Option<ItemKind>,
    ) -> Result<Option<ItemRecord>, SyncError> {
        let value = self.get(&format!("/containers/{}/items", container_id))?;
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for item in &items {
            let Some(record) = item_record(item) else {
                continue;
            };
            if record.name == name && kind.map_or(true, |k| record.kind == k) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn create_folder(&self, container_id: ItemId, name: &str) -> Result<ItemRecord, SyncError> {
        self.create_item(container_id, name, "Folder")
    }

    fn create_concatenation(
        &self,
        container_id: ItemId,
        name: &str,
    ) -> Result<ItemRecord, SyncError> {
        self.create_item(container_id, name, "Concatenation")
    }

    fn create_ob(&self, container_id: ItemId, name: &str) -> Result<ItemRecord, SyncError> {
        self.create_item(container_id, name, "OB")
    }

    fn set_ob_target(&self, ob_id: ItemId, target: &ObTarget) -> Result<(), SyncError> {
        let body = json!({
            "name": target.name,
            "ra": target.ra,
            "dec": target.dec,
            "properMotionRa": target.pm_ra,
            "properMotionDec": target.pm_dec,
        });
        self.send_json(reqwest::Method::PUT, &format!("/obsBlocks/{}/target", ob_id), &body)?;
        Ok(())
    }

    fn create_template(
        &self,
        ob_id: ItemId,
        template_name: &str,
    ) -> Result<(ItemId, i64), SyncError> {
        let body = json!({ "templateName": template_name });
        let created = self.send_json(
            reqwest::Method::POST,
            &format!("/obsBlocks/{}/templates", ob_id),
            &body,
        )?;
        let template_id = created
            .get("templateId")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                SyncError::Service(format!("malformed template response for '{}'", template_name))
            })?;
        let version = version_field(&created, template_name)?;
        Ok((template_id, version))
    }

    fn set_template_params(
        &self,
        ob_id: ItemId,
        template_id: ItemId,
        params: &Params,
        version: i64,
    ) -> Result<i64, SyncError> {
        let parameters: Vec<Value> = params
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        let body = json!({ "parameters": parameters, "version": version });
        let updated = self.send_json(
            reqwest::Method::PUT,
            &format!("/obsBlocks/{}/templates/{}", ob_id, template_id),
            &body,
        )?;
        version_field(&updated, &format!("template {}", template_id))
    }
}

// Versions drive the optimistic update checking; a response without one
// is malformed, not version zero.
fn version_field(response: &Value, what: &str) -> Result<i64, SyncError> {
    response
        .get("version")
        .and_then(Value::as_i64)
        .ok_or_else(|| SyncError::Service(format!("no version in response for '{}'", what)))
}

fn item_record(item: &Value) -> Option<ItemRecord> {
    let id = item
        .get("containerId")
        .or_else(|| item.get("obId"))
        .or_else(|| item.get("id"))
        .and_then(Value::as_i64)?;
    let name = item.get("name").and_then(Value::as_str)?.to_string();
    let kind = match item.get("itemType").and_then(Value::as_str)? {
        "Folder" => ItemKind::Folder,
        "Concatenation" => ItemKind::Concatenation,
        _ => ItemKind::Ob,
    };
    Some(ItemRecord { id, name, kind })
}

fn service_err(err: impl std::fmt::Display) -> SyncError {
    SyncError::Service(err.to_string())
}
