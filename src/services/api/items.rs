use super::http::{ApiError, Payload, Request, RequestClient};
use crate::ui::{DashboardItem, InitProgram, ItemInit};
use serde::Deserialize;
use tracing::{debug, error, warn};

/// One entry of the dashboard item list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub key: Option<String>,
    pub src: String,
    #[serde(default)]
    pub init: Option<String>,
}

impl From<ItemDescriptor> for DashboardItem {
    fn from(descriptor: ItemDescriptor) -> Self {
        let key = descriptor
            .key
            .and_then(|key| shortcut_key(&descriptor.id, &key));
        let mut item = DashboardItem::new(descriptor.id, descriptor.title, descriptor.src);
        item.key = key;
        item.init = descriptor.init.map(ItemInit::Source);
        item
    }
}

/// A shortcut is a single character; anything longer is dropped.
fn shortcut_key(id: &str, key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Some(key),
        (None, _) => None,
        (Some(_), Some(_)) => {
            warn!(item = id, key, "shortcut must be a single character, ignoring it");
            None
        }
    }
}

pub async fn fetch_item_list<C>(client: &C, path: &str) -> Result<Vec<ItemDescriptor>, ApiError>
where
    C: RequestClient + ?Sized,
{
    match client.request(&Request::json(path)).await? {
        Payload::Json(value) => serde_json::from_value(value.clone()).map_err(|source| {
            ApiError::Deserialize {
                source,
                body: value.to_string(),
            }
        }),
        Payload::Markup(body) => serde_json::from_str(&body)
            .map_err(|source| ApiError::Deserialize { source, body }),
    }
}

/// Fetches the item list, then every item's content and init script in list
/// order. Per-item failures are logged and leave the item without content
/// (or without init); only a failed list fetch is an error.
pub async fn load_items<C>(client: &C, list_path: &str) -> Result<Vec<DashboardItem>, ApiError>
where
    C: RequestClient + ?Sized,
{
    let descriptors = fetch_item_list(client, list_path).await?;
    let mut items = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let mut item = DashboardItem::from(descriptor);

        match client.request(&Request::markup(item.src.clone()).refreshed()).await {
            Ok(payload) => item.data = payload.into_markup(),
            Err(err) => error!(
                src = %item.src,
                status = ?err.status(),
                error = %err,
                "failed to load dashboard item"
            ),
        }

        if let Some(ItemInit::Source(src)) = item.init.take() {
            item.init = load_init(client, &src).await.map(ItemInit::Loaded);
        }

        debug!(item = %item.id, bytes = item.data.len(), "dashboard item loaded");
        items.push(item);
    }

    Ok(items)
}

async fn load_init<C>(client: &C, src: &str) -> Option<InitProgram>
where
    C: RequestClient + ?Sized,
{
    let payload = match client.request(&Request::script(src).refreshed()).await {
        Ok(payload) => payload,
        Err(err) => {
            error!(src, status = ?err.status(), error = %err, "failed to load init script");
            return None;
        }
    };

    match InitProgram::from_payload(payload) {
        Ok(program) => Some(program),
        Err(err) => {
            error!(src, error = %err, "failed to decode init script");
            None
        }
    }
}
