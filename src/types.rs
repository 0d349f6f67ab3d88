/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds that participate in a hierarchy.
/// A node only ever references nodes of its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Page,
    PageComponent,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Category, EntityKind::Page, EntityKind::PageComponent];

    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Category => "categories",
            EntityKind::Page => "pages",
            EntityKind::PageComponent => "page_components",
        }
    }

    /// Collection segment used in `/api/:kind` routes
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Category => "categories",
            EntityKind::Page => "pages",
            EntityKind::PageComponent => "page-components",
        }
    }

    pub fn from_path(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path_segment() == segment)
    }

    /// Whether a published node may go back to draft
    pub fn allows_unpublish(self) -> bool {
        match self {
            EntityKind::Category => false,
            EntityKind::Page | EntityKind::PageComponent => true,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Category => "category",
            EntityKind::Page => "page",
            EntityKind::PageComponent => "page component",
        };
        f.write_str(name)
    }
}

/// Tree mutations, used to label log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Reparent,
    AssignPosition,
    Reorder,
    Delete,
    Duplicate,
    Publish,
    Unpublish,
}
