use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::transport::error::{Error, PlatformError};
use crate::transport::Channel;
use crate::u2f::U2fApi;

/// Global name the API object is published under.
pub const GLOBAL_NAME: &str = "u2f";

/// Members defined by the installed object. Fields of a previous binding with
/// these names are replaced, everything else is carried over.
pub const API_MEMBERS: &[&str] = &[
    "register",
    "sign",
    "isSafari",
    "getApiVersion",
    "extensionVersion",
    "extensionBuild",
    "_pending",
];

/// The published API object, together with custom fields inherited from
/// whatever the page had bound under the same name.
pub struct U2fObject<C: Channel> {
    api: Arc<U2fApi<C>>,
    fields: Map<String, Value>,
}

impl<C: Channel> U2fObject<C> {
    pub fn api(&self) -> &Arc<U2fApi<C>> {
        &self.api
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

pub enum Binding<'a, C: Channel> {
    Value(&'a Value),
    U2f(&'a Arc<U2fObject<C>>),
}

/// Page global scope. Once installed, the U2F binding is read-only: it can be
/// read through [`Namespace::get`] but not replaced.
pub struct Namespace<C: Channel> {
    values: HashMap<String, Value>,
    installed: Option<Arc<U2fObject<C>>>,
}

impl<C: Channel> Default for Namespace<C> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            installed: None,
        }
    }
}

impl<C: Channel> Namespace<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Binding<'_, C>> {
        match &self.installed {
            Some(object) if name == GLOBAL_NAME => Some(Binding::U2f(object)),
            _ => self.values.get(name).map(Binding::Value),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        if name == GLOBAL_NAME && self.installed.is_some() {
            warn!(%name, "Refusing to replace installed binding");
            return Err(Error::Platform(PlatformError::ReadOnlyBinding));
        }
        self.values.insert(String::from(name), value);
        Ok(())
    }

    pub fn u2f(&self) -> Option<Arc<U2fObject<C>>> {
        self.installed.clone()
    }

    /// Publishes `api` under [`GLOBAL_NAME`], extending any previous object
    /// binding in place. Installing twice keeps the first object.
    pub fn install(&mut self, api: Arc<U2fApi<C>>) -> Arc<U2fObject<C>> {
        if let Some(object) = &self.installed {
            debug!("U2F binding already installed");
            return Arc::clone(object);
        }

        let mut fields = match self.values.remove(GLOBAL_NAME) {
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                warn!(previous = %other, "Discarding non-object binding");
                Map::new()
            }
            None => Map::new(),
        };
        for member in API_MEMBERS {
            if fields.remove(*member).is_some() {
                debug!(%member, "Previous binding field replaced by API member");
            }
        }

        info!(
            version = %api.extension_version(),
            build = %api.extension_build(),
            kept = fields.len(),
            "Installed U2F binding"
        );
        let object = Arc::new(U2fObject { api, fields });
        self.installed = Some(Arc::clone(&object));
        object
    }
}
