//! Domain <-> storage entity mapping contract.
//!
//! # Invariants
//! - Both directions are total over values the repository passes in and
//!   free of side effects.
//! - `map_from_entity(map_to_entity(d))` is equivalent to `d` on every
//!   field the mapper covers.

use crate::model::entity::TableEntity;

/// Bidirectional, pure conversion between a domain type and a row.
pub trait EntityMapper {
    type Domain;

    fn map_to_entity(&self, domain: &Self::Domain) -> TableEntity;

    fn map_from_entity(&self, entity: TableEntity) -> Self::Domain;
}

/// Mapper assembled from two closures.
pub struct FnMapper<D, ToFn, FromFn>
where
    ToFn: Fn(&D) -> TableEntity,
    FromFn: Fn(TableEntity) -> D,
{
    to_entity: ToFn,
    from_entity: FromFn,
    _domain: std::marker::PhantomData<fn() -> D>,
}

impl<D, ToFn, FromFn> FnMapper<D, ToFn, FromFn>
where
    ToFn: Fn(&D) -> TableEntity,
    FromFn: Fn(TableEntity) -> D,
{
    pub fn new(to_entity: ToFn, from_entity: FromFn) -> Self {
        Self {
            to_entity,
            from_entity,
            _domain: std::marker::PhantomData,
        }
    }
}

impl<D, ToFn, FromFn> EntityMapper for FnMapper<D, ToFn, FromFn>
where
    ToFn: Fn(&D) -> TableEntity,
    FromFn: Fn(TableEntity) -> D,
{
    type Domain = D;

    fn map_to_entity(&self, domain: &D) -> TableEntity {
        (self.to_entity)(domain)
    }

    fn map_from_entity(&self, entity: TableEntity) -> D {
        (self.from_entity)(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityMapper, FnMapper};
    use crate::model::entity::TableEntity;
    use crate::model::key::EntityKey;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: u32,
        label: String,
    }

    #[test]
    fn closure_mapper_round_trips() {
        let mapper = FnMapper::new(
            |tag: &Tag| {
                TableEntity::new(EntityKey::new("tags", tag.id.to_string()).unwrap())
                    .with("label", tag.label.as_str())
            },
            |entity: TableEntity| Tag {
                id: entity.key.row_key().parse().unwrap_or_default(),
                label: entity.get_str("label").unwrap_or_default().to_string(),
            },
        );

        let tag = Tag {
            id: 7,
            label: "urgent".to_string(),
        };
        assert_eq!(mapper.map_from_entity(mapper.map_to_entity(&tag)), tag);
    }
}
