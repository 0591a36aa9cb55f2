//! Insertion-ordered registry of heterogeneous scope resources.
//!
//! The container is exclusively owned by its scope: the operation adds
//! resources through `&mut` access during setup, children read through
//! `&` access, and the cleanup sweep drains it during teardown. It is
//! not thread-safe by contract - callers serialize access through the
//! borrow rules.

use std::any::Any;

/// Capability for resources that must be released at scope teardown.
///
/// Release is best-effort: a failure is collected by the cleanup sweep
/// and does not prevent other members from being released.
#[cfg_attr(test, mockall::automock)]
pub trait Disposable: Send {
    /// Releases whatever the resource holds.
    fn release(&mut self) -> anyhow::Result<()>;
}

/// A container member. Whether it exposes the disposal capability is
/// fixed at insertion time, so teardown never inspects types.
trait Member: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn is_disposable(&self) -> bool;
    fn as_disposable_mut(&mut self) -> Option<&mut dyn Disposable>;
}

/// An opaque member with no release step.
struct Opaque<T>(T);

impl<T: Any + Send + Sync> Member for Opaque<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn is_disposable(&self) -> bool {
        false
    }

    fn as_disposable_mut(&mut self) -> Option<&mut dyn Disposable> {
        None
    }
}

/// A member that must be released during the cleanup sweep.
struct Releasable<T>(T);

impl<T: Disposable + Any + Send + Sync> Member for Releasable<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn is_disposable(&self) -> bool {
        true
    }

    fn as_disposable_mut(&mut self) -> Option<&mut dyn Disposable> {
        Some(&mut self.0)
    }
}

/// One container entry with the member's type name captured for
/// diagnostics.
pub(crate) struct Slot {
    type_name: &'static str,
    member: Box<dyn Member>,
}

impl Slot {
    /// The type name of the stored member.
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The member's disposal capability, if it has one.
    pub(crate) fn as_disposable_mut(&mut self) -> Option<&mut dyn Disposable> {
        self.member.as_disposable_mut()
    }
}

/// A mutable, insertion-ordered registry of heterogeneous objects.
#[derive(Default)]
pub struct ObjectContainer {
    slots: Vec<Slot>,
}

impl ObjectContainer {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an opaque resource. No uniqueness constraint; O(1).
    pub fn add<T: Any + Send + Sync>(&mut self, resource: T) {
        self.slots.push(Slot {
            type_name: std::any::type_name::<T>(),
            member: Box::new(Opaque(resource)),
        });
    }

    /// Appends a resource exposing the disposal capability.
    pub fn add_disposable<T: Disposable + Any + Send + Sync>(&mut self, resource: T) {
        self.slots.push(Slot {
            type_name: std::any::type_name::<T>(),
            member: Box::new(Releasable(resource)),
        });
    }

    /// Iterates over current members in insertion order.
    ///
    /// The sequence is lazy, finite, and restartable.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Any> {
        self.slots.iter().map(|slot| slot.member.as_any())
    }

    /// Returns the first member of type `T`, if any.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.iter().find_map(|member| member.downcast_ref::<T>())
    }

    /// Returns all members of type `T` in insertion order.
    #[must_use]
    pub fn get_all<T: Any>(&self) -> Vec<&T> {
        self.iter()
            .filter_map(|member| member.downcast_ref::<T>())
            .collect()
    }

    /// Returns true if the container holds a member of type `T`.
    #[must_use]
    pub fn contains<T: Any>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of members exposing the disposal capability.
    #[must_use]
    pub fn disposable_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.member.is_disposable())
            .count()
    }

    /// Returns the type names of all members in insertion order.
    #[must_use]
    pub fn member_types(&self) -> Vec<&'static str> {
        self.slots.iter().map(|slot| slot.type_name).collect()
    }

    /// Removes all members. Idempotent.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Mutable access to the slots, for the cleanup sweep.
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }
}

impl std::fmt::Debug for ObjectContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContainer")
            .field("len", &self.len())
            .field("members", &self.member_types())
            .finish()
    }
}
