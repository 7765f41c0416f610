//! Product resolution policy for order writes.
//!
//! Order lines arrive carrying a product reference with denormalized
//! supplier and category display names. The store resolves each
//! reference against its product table before inserting the line:
//! a missing product is created from the incoming values, and an
//! existing product whose stored supplier or category name differs
//! from the incoming one has that reference overwritten in place.
//!
//! Overwriting shared reference rows from order-line input is a
//! deliberate policy inherited from the system's contract: forgiving
//! client input wins over strict referential integrity. The decision
//! of what to mutate is made here, in one pure function, so both
//! store implementations apply identical semantics.

use domain::{ProductId, ProductRef};

/// Joined view of a stored product row with its supplier and
/// category display names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub category_id: i64,
    pub category_name: String,
}

/// Mutations a store must apply so an incoming product reference
/// resolves to a persisted row.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    /// No product row exists: create supplier, category, and product
    /// rows from the incoming reference as given.
    Create,

    /// The stored supplier display name differs from the incoming one:
    /// upsert the incoming supplier and repoint the product at it.
    SetSupplier { id: i64, name: String },

    /// The stored category display name differs from the incoming one:
    /// upsert the incoming category and repoint the product at it.
    SetCategory { id: i64, name: String },
}

/// Decides what a store must do for one incoming product reference.
///
/// The stored product's own name is never touched once the row
/// exists; only its supplier and category references follow the
/// incoming values.
pub fn resolve(existing: Option<&ProductRecord>, incoming: &ProductRef) -> Vec<ProductAction> {
    let Some(record) = existing else {
        return vec![ProductAction::Create];
    };

    let mut actions = Vec::new();

    if record.supplier_name != incoming.supplier_name {
        actions.push(ProductAction::SetSupplier {
            id: incoming.supplier_id,
            name: incoming.supplier_name.clone(),
        });
    }

    if record.category_name != incoming.category_name {
        actions.push(ProductAction::SetCategory {
            id: incoming.category_id,
            name: incoming.category_name.clone(),
        });
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(supplier: &str, category: &str) -> ProductRef {
        ProductRef {
            id: ProductId::new(7),
            name: "Uncle Bob's Organic Dried Pears".to_string(),
            supplier_id: 3,
            supplier_name: supplier.to_string(),
            category_id: 7,
            category_name: category.to_string(),
        }
    }

    fn stored(supplier: &str, category: &str) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(7),
            name: "Uncle Bob's Organic Dried Pears".to_string(),
            supplier_id: 3,
            supplier_name: supplier.to_string(),
            category_id: 7,
            category_name: category.to_string(),
        }
    }

    #[test]
    fn missing_product_is_created() {
        let actions = resolve(None, &incoming("Grandma Kelly's", "Produce"));
        assert_eq!(actions, vec![ProductAction::Create]);
    }

    #[test]
    fn matching_record_needs_no_action() {
        let record = stored("Grandma Kelly's", "Produce");
        let actions = resolve(Some(&record), &incoming("Grandma Kelly's", "Produce"));
        assert!(actions.is_empty());
    }

    #[test]
    fn differing_supplier_name_is_overwritten() {
        let record = stored("Grandma Kelly's", "Produce");
        let actions = resolve(Some(&record), &incoming("Kelly Homestead", "Produce"));
        assert_eq!(
            actions,
            vec![ProductAction::SetSupplier {
                id: 3,
                name: "Kelly Homestead".to_string(),
            }]
        );
    }

    #[test]
    fn differing_category_name_is_overwritten() {
        let record = stored("Grandma Kelly's", "Produce");
        let actions = resolve(Some(&record), &incoming("Grandma Kelly's", "Dried Goods"));
        assert_eq!(
            actions,
            vec![ProductAction::SetCategory {
                id: 7,
                name: "Dried Goods".to_string(),
            }]
        );
    }

    #[test]
    fn both_names_differing_yields_both_actions() {
        let record = stored("A", "B");
        let actions = resolve(Some(&record), &incoming("C", "D"));
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], ProductAction::SetSupplier { .. }));
        assert!(matches!(actions[1], ProductAction::SetCategory { .. }));
    }

    #[test]
    fn write_oriented_input_with_empty_names_overwrites_stored_names() {
        // Brief write input has no display names; the policy still
        // treats the empty string as the incoming value.
        let record = stored("Grandma Kelly's", "Produce");
        let bare = ProductRef::by_id(7);
        let actions = resolve(Some(&record), &bare);
        assert_eq!(actions.len(), 2);
    }
}
