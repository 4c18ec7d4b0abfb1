//! Object arena for a single run.
//!
//! Every object the program creates lives here until the VM is dropped.
//! Variables and evaluation stack slots hold [`Handle`]s, so assigning
//! through a handle updates every place that refers to it.

use crate::value::Object;

/// A handle to a heap-allocated object.
/// This acts as an index into the Heap's object storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub usize);

#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, obj: Object) -> Handle {
        self.objects.push(obj);
        Handle(self.objects.len() - 1)
    }

    pub fn alloc_integer(&mut self, n: i64) -> Handle {
        self.alloc(Object::Integer(n))
    }

    /// Panics if `handle` was issued by another heap.
    pub fn get(&self, handle: Handle) -> &Object {
        &self.objects[handle.0]
    }

    /// Overwrite the object behind `handle` in place
    pub fn set(&mut self, handle: Handle, obj: Object) {
        self.objects[handle.0] = obj;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
