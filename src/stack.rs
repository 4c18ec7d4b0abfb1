//! The evaluation stack behind SMIL's push, pop and clear.
//!
//! Capacity grows in fixed chunks and is never released during a run;
//! clearing only resets the top index.

use crate::error::ErrorKind;

pub const STACK_CHUNK: usize = 16;

pub struct Stack<T> {
    slots: Vec<Option<T>>,
    top: usize,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots[..self.top].iter().flatten())
            .finish()
    }
}

impl<T: Clone> Stack<T> {
    pub fn new() -> Self {
        Self {
            slots: vec![None; STACK_CHUNK],
            top: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.top == self.slots.len() {
            self.slots.resize(self.top + STACK_CHUNK, None);
        }
        self.slots[self.top] = Some(value);
        self.top += 1;
    }

    pub fn pop(&mut self) -> Result<T, ErrorKind> {
        if self.top == 0 {
            return Err(ErrorKind::StackUnderflow);
        }
        self.top -= 1;
        self.slots[self.top].clone().ok_or(ErrorKind::StackUnderflow)
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Clone> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
