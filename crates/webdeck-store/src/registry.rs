//! App catalog: CRUD over registered app definitions.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

use webdeck_common::{AppId, AppItem, ValidationError};

/// Partial update applied by [`AppRegistry::edit`]. Absent fields are
/// left untouched; `icon: Some(None)` clears the icon.
#[derive(Debug, Clone, Default)]
pub struct AppPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon: Option<Option<String>>,
}

impl AppPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// The catalog of registered apps. Ids are unique; URLs were validated
/// as absolute at registration time.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: Vec<AppItem>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a catalog from a persisted snapshot.
    pub fn from_apps(apps: Vec<AppItem>) -> Self {
        Self { apps }
    }

    /// Register a new app. The URL must parse as an absolute URL; a
    /// blank or missing name defaults to the URL's hostname (or the
    /// whole URL string for host-less schemes).
    pub fn add(
        &mut self,
        name: Option<&str>,
        url: &str,
        icon: Option<String>,
        now_ms: i64,
    ) -> Result<AppId, ValidationError> {
        let parsed = parse_absolute(url)?;
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => parsed
                .host_str()
                .map(str::to_string)
                .unwrap_or_else(|| parsed.to_string()),
        };

        let id = AppId::new();
        debug!(id = %id, name = %name, "app registered");
        self.apps.push(AppItem {
            id: id.clone(),
            name,
            url: parsed.to_string(),
            icon,
            last_opened: now_ms,
        });
        Ok(id)
    }

    /// Apply a partial patch. Unknown ids are a no-op. A patched URL is
    /// validated like at registration; an invalid one is rejected.
    pub fn edit(&mut self, id: &AppId, patch: AppPatch) -> Result<(), ValidationError> {
        let new_url = match &patch.url {
            Some(u) => Some(parse_absolute(u)?.to_string()),
            None => None,
        };
        if let Some(app) = self.apps.iter_mut().find(|a| &a.id == id) {
            if let Some(name) = patch.name {
                app.name = name;
            }
            if let Some(url) = new_url {
                app.url = url;
            }
            if let Some(icon) = patch.icon {
                app.icon = icon;
            }
        }
        Ok(())
    }

    /// Refresh an app's `last_opened` timestamp.
    pub fn touch(&mut self, id: &AppId, now_ms: i64) {
        if let Some(app) = self.apps.iter_mut().find(|a| &a.id == id) {
            app.last_opened = now_ms;
        }
    }

    /// Remove an app. Returns whether it existed. The caller is
    /// responsible for cascading the removal into the session state.
    pub fn delete(&mut self, id: &AppId) -> bool {
        let before = self.apps.len();
        self.apps.retain(|a| &a.id != id);
        before != self.apps.len()
    }

    pub fn get(&self, id: &AppId) -> Option<&AppItem> {
        self.apps.iter().find(|a| &a.id == id)
    }

    pub fn contains(&self, id: &AppId) -> bool {
        self.get(id).is_some()
    }

    pub fn apps(&self) -> &[AppItem] {
        &self.apps
    }

    pub fn apps_by_id(&self) -> HashMap<AppId, &AppItem> {
        self.apps.iter().map(|a| (a.id.clone(), a)).collect()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub(crate) fn into_apps(self) -> Vec<AppItem> {
        self.apps
    }
}

fn parse_absolute(url: &str) -> Result<Url, ValidationError> {
    match Url::parse(url.trim()) {
        Ok(u) => Ok(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Err(ValidationError::RelativeUrl(url.to_string()))
        }
        Err(e) => Err(ValidationError::InvalidUrl(format!("{url}: {e}"))),
    }
}
