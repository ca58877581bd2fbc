//! Two-level product categories.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::CategoryId;

/// A category row. Main categories have no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub sort_order: i32,
}

impl Category {
    #[must_use]
    pub const fn is_main(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A main category with its sub categories.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// The category hierarchy as shown in navigation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
}

impl CategoryTree {
    /// Group sub categories under their main categories.
    ///
    /// Both levels are ordered by `sort_order`, then name. Categories whose
    /// parent is missing or is itself a sub category are dropped.
    #[must_use]
    pub fn build(categories: Vec<Category>) -> Self {
        let (mut mains, subs): (Vec<_>, Vec<_>) =
            categories.into_iter().partition(Category::is_main);
        mains.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));

        let mut by_parent: HashMap<CategoryId, Vec<Category>> = HashMap::new();
        for sub in subs {
            if let Some(parent) = sub.parent_id {
                by_parent.entry(parent).or_default().push(sub);
            }
        }

        let roots = mains
            .into_iter()
            .map(|category| {
                let mut children = by_parent.remove(&category.id).unwrap_or_default();
                children.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));
                CategoryNode { category, children }
            })
            .collect();

        Self { roots }
    }

    #[must_use]
    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Look up any category in the tree.
    #[must_use]
    pub fn find(&self, id: CategoryId) -> Option<&Category> {
        self.roots.iter().find_map(|node| {
            if node.category.id == id {
                Some(&node.category)
            } else {
                node.children.iter().find(|c| c.id == id)
            }
        })
    }

    /// The category itself plus, for a main category, all of its sub
    /// categories. Empty when the category is not in the tree.
    #[must_use]
    pub fn with_descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        for node in &self.roots {
            if node.category.id == id {
                return std::iter::once(id)
                    .chain(node.children.iter().map(|c| c.id))
                    .collect();
            }
            if node.children.iter().any(|c| c.id == id) {
                return vec![id];
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i32, parent: Option<i32>, name: &str, sort_order: i32) -> Category {
        Category {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: name.to_owned(),
            sort_order,
        }
    }

    fn sample() -> Vec<Category> {
        vec![
            category(5, Some(1), "Sediment", 2),
            category(1, None, "Filters", 1),
            category(2, None, "Purifiers", 0),
            category(6, Some(1), "Carbon", 1),
            category(7, Some(2), "Countertop", 0),
            category(8, Some(99), "Orphan", 0),
            category(9, Some(5), "Too deep", 0),
        ]
    }

    #[test]
    fn test_build_orders_mains_and_children() {
        let tree = CategoryTree::build(sample());
        let names: Vec<_> = tree.roots().iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, ["Purifiers", "Filters"]);

        let filters = &tree.roots()[1];
        let children: Vec<_> = filters.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, ["Carbon", "Sediment"]);
    }

    #[test]
    fn test_build_drops_orphans_and_third_level() {
        let tree = CategoryTree::build(sample());
        assert!(tree.find(CategoryId::new(8)).is_none());
        assert!(tree.find(CategoryId::new(9)).is_none());
    }

    #[test]
    fn test_ties_sort_by_name() {
        let tree = CategoryTree::build(vec![
            category(1, None, "Parts", 0),
            category(2, None, "Bidets", 0),
        ]);
        assert_eq!(tree.roots()[0].category.name, "Bidets");
    }

    #[test]
    fn test_with_descendants() {
        let tree = CategoryTree::build(sample());
        assert_eq!(
            tree.with_descendants(CategoryId::new(1)),
            vec![CategoryId::new(1), CategoryId::new(6), CategoryId::new(5)]
        );
        assert_eq!(
            tree.with_descendants(CategoryId::new(7)),
            vec![CategoryId::new(7)]
        );
        assert!(tree.with_descendants(CategoryId::new(42)).is_empty());
    }

    #[test]
    fn test_serializes_as_nested_list() {
        let tree = CategoryTree::build(vec![
            category(1, None, "Filters", 0),
            category(2, Some(1), "Carbon", 0),
        ]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["name"], "Filters");
        assert_eq!(json[0]["children"][0]["name"], "Carbon");
        assert_eq!(json[0]["children"][0]["parent_id"], 1);
    }
}
