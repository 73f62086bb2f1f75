//! Actors owned by the attribute store

pub mod attribute_store;

pub use attribute_store::{
    AttributeStoreActor, AttributeStoreArguments, AttributeStoreMsg, ItemAttributes, ItemMap,
    StoreError,
};
