//! Entity trait: identity + continuity across saves.

/// Persistent record with a store-assigned identity.
///
/// A record whose `id()` is `None` has never been saved.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy
        + Eq
        + Ord
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + From<i64>
        + Into<i64>
        + Send
        + Sync
        + 'static;

    /// Collection (table) the records live in.
    const COLLECTION: &'static str;

    /// Returns the entity identifier, if assigned.
    fn id(&self) -> Option<Self::Id>;

    /// Sets the identifier (done by the store on insert).
    fn set_id(&mut self, id: Self::Id);
}

/// Implements [`Entity`] for a struct with an `id: Option<Id>` field.
#[macro_export]
macro_rules! impl_entity {
    ($t:ty, $id:ty, $collection:literal) => {
        impl $crate::Entity for $t {
            type Id = $id;
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> Option<Self::Id> {
                self.id
            }

            fn set_id(&mut self, id: Self::Id) {
                self.id = Some(id);
            }
        }
    };
}
