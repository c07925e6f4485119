//! Administrative commands and startup registration

use crate::error::{AdapterError, Result};
use crate::info::{self, SETS_COMMAND, UDF_LIST_COMMAND};
use crate::store::{Language, RecordStore};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// DBSIZE: records in the configured namespace/set across all nodes
    ///
    /// Sums the object count every node reports in its `sets` info.
    pub fn dbsize(&self) -> Result<u64> {
        let nodes = self.store.nodes();
        if nodes.is_empty() {
            return Err(AdapterError::StoreUnavailable("cluster has no nodes".to_string()));
        }

        let policy = self.info_policy();
        let mut total = 0;
        for node in &nodes {
            let response = self.store.info(&policy, node, SETS_COMMAND)?;
            total += info::set_object_count(&response, self.mapper.namespace(), self.mapper.set());
        }
        Ok(total)
    }

    /// PING
    pub fn ping(&self) -> Result<String> {
        if self.store.is_connected() {
            Ok("PONG".to_string())
        } else {
            Err(AdapterError::StoreUnavailable("no connection to cluster".to_string()))
        }
    }

    /// ECHO
    pub fn echo(&self, message: &str) -> String {
        message.to_string()
    }

    /// Register the procedure module unless a node already lists it
    ///
    /// Returns `true` when the module was uploaded by this call. Runs once,
    /// from the constructor; any failure is reported as `Registration`.
    pub(super) fn register_module_if_absent(&self) -> Result<bool> {
        let module = &self.config.module;
        let policy = self.info_policy();

        let node = self
            .store
            .nodes()
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::Registration("cluster has no nodes".to_string()))?;

        let listing = self
            .store
            .info(&policy, &node, UDF_LIST_COMMAND)
            .map_err(|e| AdapterError::Registration(format!("cannot list modules: {}", e)))?;

        if info::module_registered(&listing, &module.filename) {
            tracing::debug!("Procedure module {} already registered", module.filename);
            return Ok(false);
        }

        let source = module.load_source()?;
        self.store
            .register_module(&policy, &source, &module.filename, Language::Lua)
            .map_err(|e| AdapterError::Registration(format!("cannot register {}: {}", module.filename, e)))?;

        tracing::info!("Registered procedure module {}", module.filename);
        Ok(true)
    }
}
