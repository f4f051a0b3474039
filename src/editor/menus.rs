//! Context menu tree for node creation and editor actions

use crate::graph::NodeKind;

/// What activating a menu entry triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CreateNode(NodeKind),
    ExecuteFlow,
    ResetView,
    ChooseLayout,
}

/// One entry in the surface's command menu, keyed by (category, label).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub category: &'static str,
    pub label: &'static str,
    pub action: MenuAction,
}

const fn create(category: &'static str, kind: NodeKind) -> MenuEntry {
    MenuEntry {
        category,
        label: kind.name(),
        action: MenuAction::CreateNode(kind),
    }
}

/// The fixed menu tree registered with the rendering surface.
static MENU: [MenuEntry; 25] = [
    create("Action Nodes", NodeKind::Action),
    create("Action Nodes", NodeKind::Call),
    create("Action Nodes", NodeKind::ForEach),
    create("Action Nodes", NodeKind::Aggregate),
    create("Action Nodes", NodeKind::ExceptionHandler),
    create("Action Nodes", NodeKind::Return),
    create("Data Nodes", NodeKind::DataSource),
    create("Data Nodes", NodeKind::Constant),
    create("Data Nodes", NodeKind::CollectionDataSource),
    create("Data Nodes", NodeKind::ObjectDataSource),
    create("Data Nodes", NodeKind::KeyValue),
    create("Data Nodes", NodeKind::ParameterInput),
    create("Data Nodes", NodeKind::ParameterDataSource),
    create("Data Nodes", NodeKind::Store),
    create("Data Nodes", NodeKind::GetProperty),
    create("Data Nodes", NodeKind::TypeQuery),
    create("Logic Nodes", NodeKind::Decision),
    create("Logic Nodes", NodeKind::NotNull),
    create("Logic Nodes", NodeKind::Not),
    create("Logic Nodes", NodeKind::Or),
    create("Logic Nodes", NodeKind::And),
    create("Logic Nodes", NodeKind::ScriptCondition),
    MenuEntry {
        category: "Actions",
        label: "Execute Flow",
        action: MenuAction::ExecuteFlow,
    },
    MenuEntry {
        category: "Actions",
        label: "Reset View",
        action: MenuAction::ResetView,
    },
    MenuEntry {
        category: "Actions",
        label: "Select & Apply Layout",
        action: MenuAction::ChooseLayout,
    },
];

/// The complete menu tree.
pub fn menu_entries() -> &'static [MenuEntry] {
    &MENU
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_node_kind_is_creatable() {
        for kind in NodeKind::ALL {
            let count = menu_entries()
                .iter()
                .filter(|entry| entry.action == MenuAction::CreateNode(*kind))
                .count();
            assert_eq!(count, 1, "{:?} should appear exactly once", kind);
        }
    }

    #[test]
    fn test_categories() {
        let categories: std::collections::BTreeSet<&str> =
            menu_entries().iter().map(|entry| entry.category).collect();
        assert_eq!(
            categories.into_iter().collect::<Vec<_>>(),
            vec!["Action Nodes", "Actions", "Data Nodes", "Logic Nodes"]
        );
    }
}
