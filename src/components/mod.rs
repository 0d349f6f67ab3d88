// Polymorphic page-component attachment.
//
// A page component wraps one piece of content (hero, text block, image,
// document). The reference is a `{componentable_type, componentable_id}` pair
// resolved through a type -> source lookup table; the tree engine only checks
// that the reference resolves when a component is published.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentableType {
    Hero,
    TextContent,
    Image,
    Document,
}

impl ComponentableType {
    pub const ALL: [ComponentableType; 4] = [
        ComponentableType::Hero,
        ComponentableType::TextContent,
        ComponentableType::Image,
        ComponentableType::Document,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentableType::Hero => "hero",
            ComponentableType::TextContent => "text_content",
            ComponentableType::Image => "image",
            ComponentableType::Document => "document",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Table holding the content rows of this type
    pub fn table_name(self) -> &'static str {
        match self {
            ComponentableType::Hero => "heroes",
            ComponentableType::TextContent => "text_contents",
            ComponentableType::Image => "images",
            ComponentableType::Document => "documents",
        }
    }
}

impl fmt::Display for ComponentableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference from a page component to the content it places on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Componentable {
    #[serde(rename = "componentable_type")]
    pub kind: ComponentableType,
    #[serde(rename = "componentable_id")]
    pub id: Uuid,
}

impl Componentable {
    pub fn new(kind: ComponentableType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Something that can tell whether a content row exists
#[async_trait]
pub trait ComponentSource: Send + Sync {
    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

/// In-process source, used by the memory backend and tests
#[derive(Debug, Default)]
pub struct MemoryComponentSource {
    ids: RwLock<HashSet<Uuid>>,
}

impl MemoryComponentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: Uuid) {
        self.ids.write().await.insert(id);
    }

    pub async fn remove(&self, id: Uuid) {
        self.ids.write().await.remove(&id);
    }
}

#[async_trait]
impl ComponentSource for MemoryComponentSource {
    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.ids.read().await.contains(&id))
    }
}

/// Lookup table from componentable type to the source that resolves it
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    sources: HashMap<ComponentableType, Arc<dyn ComponentSource>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: ComponentableType, source: Arc<dyn ComponentSource>) -> Self {
        self.sources.insert(kind, source);
        self
    }

    /// Registry where every type is backed by its own empty memory source.
    /// The returned map gives callers a handle to seed content.
    pub fn in_memory() -> (Self, HashMap<ComponentableType, Arc<MemoryComponentSource>>) {
        let mut registry = Self::new();
        let mut handles = HashMap::new();
        for kind in ComponentableType::ALL {
            let source = Arc::new(MemoryComponentSource::new());
            registry = registry.register(kind, source.clone());
            handles.insert(kind, source);
        }
        (registry, handles)
    }

    /// Whether the reference points at existing content.
    /// Types without a registered source never resolve.
    pub async fn resolve(&self, componentable: &Componentable) -> Result<bool, DatabaseError> {
        match self.sources.get(&componentable.kind) {
            Some(source) => source.exists(componentable.id).await,
            None => {
                tracing::warn!("No component source registered for type '{}'", componentable.kind);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_type_and_id_pair() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(Componentable::new(ComponentableType::TextContent, id)).unwrap();
        assert_eq!(value["componentable_type"], "text_content");
        assert_eq!(value["componentable_id"], id.to_string());
    }

    #[test]
    fn parses_type_names() {
        assert_eq!(ComponentableType::parse("hero"), Some(ComponentableType::Hero));
        assert_eq!(ComponentableType::parse("Hero"), None);
    }

    #[tokio::test]
    async fn resolves_through_registered_source() {
        let (registry, handles) = ComponentRegistry::in_memory();
        let id = Uuid::new_v4();
        let hero = Componentable::new(ComponentableType::Hero, id);

        assert!(!registry.resolve(&hero).await.unwrap());
        handles[&ComponentableType::Hero].insert(id).await;
        assert!(registry.resolve(&hero).await.unwrap());

        // Same id under another type does not resolve
        let image = Componentable::new(ComponentableType::Image, id);
        assert!(!registry.resolve(&image).await.unwrap());
    }

    #[tokio::test]
    async fn unregistered_type_never_resolves() {
        let registry = ComponentRegistry::new();
        let doc = Componentable::new(ComponentableType::Document, Uuid::new_v4());
        assert!(!registry.resolve(&doc).await.unwrap());
    }
}
