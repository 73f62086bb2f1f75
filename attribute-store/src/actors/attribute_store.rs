//! AttributeStoreActor - repository view of item attributes using ractor
//!
//! The actor owns two copies of the item map:
//!
//! - the working view, which `SetAttribute` / `DelAttribute` mutate and
//!   `GetAttribute` reads
//! - the committed snapshot, which `Commit` replaces with the working view
//!
//! Every message is handled to completion before the next one, so callers see
//! a strictly ordered history of attribute changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use ractor::Actor;
//!
//! let (store_ref, _handle) = Actor::spawn(
//!     None,
//!     AttributeStoreActor,
//!     AttributeStoreArguments::Empty,
//! ).await?;
//!
//! let path = AttributePath::new("//userdata/alice", "displayName")?;
//! set_attribute(&store_ref, path.clone(), json!("Alicia")).await??;
//! let version = commit(&store_ref).await??;
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use shared_types::AttributePath;

/// Attributes of one item, keyed by attribute name
pub type ItemAttributes = BTreeMap<String, Value>;

/// All items, keyed by repository path
pub type ItemMap = BTreeMap<String, ItemAttributes>;

/// Actor that owns the attribute repository view
#[derive(Debug, Default)]
pub struct AttributeStoreActor;

/// Arguments for spawning AttributeStoreActor
#[derive(Debug, Clone)]
pub enum AttributeStoreArguments {
    /// Start with no items
    Empty,
    /// Start with the given items, already committed
    Seeded(ItemMap),
}

/// State for AttributeStoreActor
pub struct AttributeStoreState {
    view: ItemMap,
    committed: ItemMap,
    version: u64,
}

// ============================================================================
// Messages
// ============================================================================

/// Messages handled by AttributeStoreActor
#[derive(Debug)]
pub enum AttributeStoreMsg {
    /// Read an attribute from the working view
    GetAttribute {
        path: AttributePath,
        reply: RpcReplyPort<Result<Value, StoreError>>,
    },
    /// Set an attribute in the working view
    SetAttribute {
        path: AttributePath,
        value: Value,
        reply: RpcReplyPort<Result<(), StoreError>>,
    },
    /// Remove an attribute from the working view
    DelAttribute {
        path: AttributePath,
        reply: RpcReplyPort<Result<(), StoreError>>,
    },
    /// Promote the working view to the committed snapshot
    Commit {
        reply: RpcReplyPort<Result<u64, StoreError>>,
    },
    /// Read an attribute from the committed snapshot
    GetCommitted {
        path: AttributePath,
        reply: RpcReplyPort<Option<Value>>,
    },
}

#[async_trait]
impl Actor for AttributeStoreActor {
    type Msg = AttributeStoreMsg;
    type State = AttributeStoreState;
    type Arguments = AttributeStoreArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            "AttributeStoreActor starting"
        );

        let items = match args {
            AttributeStoreArguments::Empty => ItemMap::new(),
            AttributeStoreArguments::Seeded(items) => {
                tracing::info!(item_count = items.len(), "Seeding attribute store");
                items
            }
        };

        Ok(AttributeStoreState {
            view: items.clone(),
            committed: items,
            version: 0,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            AttributeStoreMsg::GetAttribute { path, reply } => {
                let _ = reply.send(self.handle_get(&path, state));
            }
            AttributeStoreMsg::SetAttribute { path, value, reply } => {
                let _ = reply.send(self.handle_set(path, value, state));
            }
            AttributeStoreMsg::DelAttribute { path, reply } => {
                let _ = reply.send(self.handle_del(&path, state));
            }
            AttributeStoreMsg::Commit { reply } => {
                let _ = reply.send(self.handle_commit(state));
            }
            AttributeStoreMsg::GetCommitted { path, reply } => {
                let value = state
                    .committed
                    .get(&path.item)
                    .and_then(|attrs| attrs.get(&path.attribute))
                    .cloned();
                let _ = reply.send(value);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        _state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            "AttributeStoreActor stopped"
        );
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in AttributeStoreActor
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No item at path {0}")]
    ItemNotFound(String),

    #[error("Item {item} has no attribute {attribute}")]
    AttributeNotFound { item: String, attribute: String },

    #[error("Invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },
}

// ============================================================================
// Message Handlers
// ============================================================================

impl AttributeStoreActor {
    fn handle_get(
        &self,
        path: &AttributePath,
        state: &AttributeStoreState,
    ) -> Result<Value, StoreError> {
        let attrs = state
            .view
            .get(&path.item)
            .ok_or_else(|| StoreError::ItemNotFound(path.item.clone()))?;
        attrs
            .get(&path.attribute)
            .cloned()
            .ok_or_else(|| StoreError::AttributeNotFound {
                item: path.item.clone(),
                attribute: path.attribute.clone(),
            })
    }

    fn handle_set(
        &self,
        path: AttributePath,
        value: Value,
        state: &mut AttributeStoreState,
    ) -> Result<(), StoreError> {
        if value.is_null() {
            return Err(StoreError::InvalidValue {
                path: path.to_string(),
                reason: "attribute values must not be null".to_string(),
            });
        }
        let attrs = state
            .view
            .get_mut(&path.item)
            .ok_or_else(|| StoreError::ItemNotFound(path.item.clone()))?;

        tracing::debug!(item = %path.item, attribute = %path.attribute, "Setting attribute");
        attrs.insert(path.attribute, value);
        Ok(())
    }

    fn handle_del(
        &self,
        path: &AttributePath,
        state: &mut AttributeStoreState,
    ) -> Result<(), StoreError> {
        let attrs = state
            .view
            .get_mut(&path.item)
            .ok_or_else(|| StoreError::ItemNotFound(path.item.clone()))?;

        match attrs.remove(&path.attribute) {
            Some(_) => {
                tracing::debug!(item = %path.item, attribute = %path.attribute, "Deleted attribute");
                Ok(())
            }
            None => Err(StoreError::AttributeNotFound {
                item: path.item.clone(),
                attribute: path.attribute.clone(),
            }),
        }
    }

    fn handle_commit(&self, state: &mut AttributeStoreState) -> Result<u64, StoreError> {
        if state.view != state.committed {
            state.committed = state.view.clone();
            state.version += 1;
            tracing::info!(version = state.version, "Committed attribute view");
        } else {
            tracing::debug!(version = state.version, "Commit with no pending changes");
        }
        Ok(state.version)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convenience function to read an attribute
pub async fn get_attribute(
    store: &ActorRef<AttributeStoreMsg>,
    path: AttributePath,
) -> Result<Result<Value, StoreError>, ractor::RactorErr<AttributeStoreMsg>> {
    ractor::call!(store, |reply| AttributeStoreMsg::GetAttribute { path, reply })
}

/// Convenience function to set an attribute
pub async fn set_attribute(
    store: &ActorRef<AttributeStoreMsg>,
    path: AttributePath,
    value: Value,
) -> Result<Result<(), StoreError>, ractor::RactorErr<AttributeStoreMsg>> {
    ractor::call!(store, |reply| AttributeStoreMsg::SetAttribute {
        path,
        value,
        reply,
    })
}

/// Convenience function to delete an attribute
pub async fn del_attribute(
    store: &ActorRef<AttributeStoreMsg>,
    path: AttributePath,
) -> Result<Result<(), StoreError>, ractor::RactorErr<AttributeStoreMsg>> {
    ractor::call!(store, |reply| AttributeStoreMsg::DelAttribute { path, reply })
}

/// Convenience function to commit the working view
pub async fn commit(
    store: &ActorRef<AttributeStoreMsg>,
) -> Result<Result<u64, StoreError>, ractor::RactorErr<AttributeStoreMsg>> {
    ractor::call!(store, |reply| AttributeStoreMsg::Commit { reply })
}

/// Convenience function to read an attribute from the committed snapshot
pub async fn get_committed(
    store: &ActorRef<AttributeStoreMsg>,
    path: AttributePath,
) -> Result<Option<Value>, ractor::RactorErr<AttributeStoreMsg>> {
    ractor::call!(store, |reply| AttributeStoreMsg::GetCommitted { path, reply })
}

// ============================================================================
// Tests
// ============================================================================
